//! Property tests over random walks: determinism, prefix replay and the
//! zone lifecycle rules.

use breaker_blocks::prelude::*;
use proptest::prelude::*;

/// Random walk with independent wicks
fn walk() -> impl Strategy<Value = Vec<Candle>> {
    prop::collection::vec((-3.0f64..3.0, -3.0f64..3.0, 0.0f64..2.0, 0.0f64..2.0), 1..220).prop_map(
        |steps| {
            let mut price = 100.0;
            steps
                .into_iter()
                .enumerate()
                .map(|(i, (gap, body, up, down))| {
                    let open = price + gap * 0.25;
                    let close = open + body;
                    price = close;
                    Candle::new(open, open.max(close) + up, open.min(close) - down, close)
                        .with_timestamp(i as i64 * 60_000)
                })
                .collect()
        },
    )
}

fn settings_strategy() -> impl Strategy<Value = Settings> {
    (1.0f64..6.0, any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(lookback, body, merge, persist, inside)| {
            Settings::normalize(&SettingsInput {
                pivot_lookback: Some(lookback),
                zone_from_body_only: Some(body),
                merge_second_candle: Some(merge),
                persist_until_first_break: Some(persist),
                only_inside_premium_discount: Some(inside),
                ..Default::default()
            })
        },
    )
}

fn is_formation(key: SignalKey) -> bool {
    matches!(key, SignalKey::BullishBreaker | SignalKey::BearishBreaker)
}

/// Which zone a key belongs to: bullish keys come first in wire order
fn is_bullish_side(key: SignalKey) -> bool {
    key.index() <= SignalKey::BullishMitigated.index()
}

fn is_take_profit(key: SignalKey) -> bool {
    matches!(
        key,
        SignalKey::LongTp1
            | SignalKey::LongTp2
            | SignalKey::LongTp3
            | SignalKey::ShortTp1
            | SignalKey::ShortTp2
            | SignalKey::ShortTp3
    )
}

proptest! {
    #[test]
    fn settings_are_always_bounded(
        lookback in prop::option::of(any::<f64>()),
        rr in prop::option::of(any::<f64>()),
    ) {
        let s = Settings::normalize(&SettingsInput {
            pivot_lookback: lookback,
            rr1: rr,
            rr2: rr,
            rr3: rr,
            ..Default::default()
        });
        prop_assert!((1..=10).contains(&s.pivot_lookback.get()));
        for v in s.risk_rewards() {
            prop_assert!((0.2..=100.0).contains(&v));
        }
    }

    #[test]
    fn output_shape_matches_input(candles in walk(), settings in settings_strategy()) {
        let engine = EngineBuilder::new().build().unwrap();
        let overlay = engine.compute(&candles, &settings);

        prop_assert_eq!(overlay.series.len(), candles.len());
        prop_assert_eq!(overlay.series.tp3.len(), candles.len());
        prop_assert_eq!(overlay.signals_by_bar.len(), candles.len());

        let counts = overlay.snapshot().event_counts;
        prop_assert_eq!(counts.total(), overlay.events.len());

        for event in &overlay.events {
            prop_assert!(event.bar_index < candles.len());
            prop_assert!(overlay.signals_by_bar[event.bar_index][event.key]);
            prop_assert_eq!(event.direction, event.key.direction());
            prop_assert!(event.price.is_finite());
        }
        prop_assert!(overlay.events.windows(2).all(|w| w[0].bar_index <= w[1].bar_index));
    }

    #[test]
    fn compute_is_deterministic(candles in walk(), settings in settings_strategy()) {
        let engine = EngineBuilder::new().build().unwrap();
        let a = engine.compute(&candles, &settings);
        let b = engine.compute(&candles, &settings);
        prop_assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prefix_replays_full_history(
        candles in walk(),
        settings in settings_strategy(),
        cut in 0.0f64..1.0,
    ) {
        let engine = EngineBuilder::new().build().unwrap();
        let n = ((candles.len() as f64 * cut) as usize).max(1);
        let full = engine.compute(&candles, &settings);
        let prefix = engine.compute(&candles[..n], &settings);

        let expected: Vec<SignalEvent> = full
            .events
            .iter()
            .filter(|e| e.bar_index < n)
            .copied()
            .collect();
        prop_assert_eq!(&prefix.events, &expected);
        prop_assert_eq!(&prefix.series.zone_top[..], &full.series.zone_top[..n]);
        prop_assert_eq!(&prefix.series.tp1[..], &full.series.tp1[..n]);
        prop_assert_eq!(&prefix.signals_by_bar[..], &full.signals_by_bar[..n]);
    }

    #[test]
    fn zone_lifecycle_rules(candles in walk(), settings in settings_strategy()) {
        let engine = EngineBuilder::new().build().unwrap();
        let overlay = engine.compute(&candles, &settings);

        // state since the last formation
        let mut bullish_zone: Option<bool> = None;
        let mut mitigated_at: Option<usize> = None;
        let mut armed = false;
        let mut hits = EventCounts::default();

        for event in &overlay.events {
            if is_formation(event.key) {
                bullish_zone = Some(is_bullish_side(event.key));
                mitigated_at = None;
                armed = false;
                hits = EventCounts::default();
                continue;
            }
            // every other event comes from the zone formed last
            prop_assert_eq!(bullish_zone, Some(is_bullish_side(event.key)));
            if let Some(bar) = mitigated_at {
                // only same-bar line breaks may follow a mitigation
                prop_assert_eq!(event.bar_index, bar);
            }
            match event.key {
                SignalKey::BullishMitigated | SignalKey::BearishMitigated => {
                    prop_assert!(mitigated_at.is_none());
                    mitigated_at = Some(event.bar_index);
                }
                SignalKey::LongScalp | SignalKey::ShortScalp => armed = true,
                SignalKey::LongScalpCancelled | SignalKey::ShortScalpCancelled => armed = false,
                key if is_take_profit(key) => {
                    prop_assert!(armed, "take-profit without an armed scalp");
                    hits[key] += 1;
                    prop_assert_eq!(hits[key], 1);
                }
                _ => {}
            }
        }

        let final_direction = bullish_zone.map_or(0, |up| if up { 1 } else { -1 });
        prop_assert_eq!(overlay.final_zone().direction(), final_direction);

        if let Some(zone) = overlay.final_zone().zone() {
            prop_assert!(zone.top >= zone.bottom);
            prop_assert!(zone.bottom <= zone.mid && zone.mid <= zone.top);
            prop_assert!(zone.origin.0 <= zone.origin.1);
            prop_assert!(zone.origin.1 < zone.formed_at);
        }
    }

    #[test]
    fn take_profit_disabled_never_fires(candles in walk()) {
        let settings = Settings::normalize(&SettingsInput {
            pivot_lookback: Some(2.0),
            take_profit_enabled: Some(false),
            ..Default::default()
        });
        let overlay = EngineBuilder::new().build().unwrap().compute(&candles, &settings);
        prop_assert!(overlay.events.iter().all(|e| !is_take_profit(e.key)));
        prop_assert!(overlay.series.tp1.iter().all(Option::is_none));
    }
}
