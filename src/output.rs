//! Overlay and Snapshot assembly
//!
//! [`Overlay`] carries full per-bar plot series plus the event log; [`Snapshot`]
//! is the cheap digest of the final bar that pollers read.

use serde::Serialize;

use crate::{
    settings::{Colors, Settings},
    structure::{ActiveZone, EventCounts, PassOutput, SignalEvent, SignalFlags, SignalKey},
};

// ============================================================
// SERIES
// ============================================================

/// Per-bar plot values; `None` where hidden or not applicable
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub zone_top: Vec<Option<f64>>,
    pub zone_bottom: Vec<Option<f64>>,
    pub zone_mid: Vec<Option<f64>>,
    pub swing_line1: Vec<Option<f64>>,
    pub swing_line2: Vec<Option<f64>>,
    /// First premium/discount line
    pub premium_line: Vec<Option<f64>>,
    /// Second premium/discount line
    pub discount_line: Vec<Option<f64>>,
    pub tp1: Vec<Option<f64>>,
    pub tp2: Vec<Option<f64>>,
    pub tp3: Vec<Option<f64>>,
}

impl Series {
    pub fn with_capacity(len: usize) -> Self {
        Self {
            zone_top: Vec::with_capacity(len),
            zone_bottom: Vec::with_capacity(len),
            zone_mid: Vec::with_capacity(len),
            swing_line1: Vec::with_capacity(len),
            swing_line2: Vec::with_capacity(len),
            premium_line: Vec::with_capacity(len),
            discount_line: Vec::with_capacity(len),
            tp1: Vec::with_capacity(len),
            tp2: Vec::with_capacity(len),
            tp3: Vec::with_capacity(len),
        }
    }

    pub fn len(&self) -> usize {
        self.zone_top.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zone_top.is_empty()
    }

    /// Append the plot values for the state at the close of a bar.
    pub fn record(&mut self, zone: &ActiveZone, settings: &Settings) {
        let live = zone.zone().filter(|z| !z.mitigated);

        self.zone_top.push(live.map(|z| z.top));
        self.zone_bottom.push(live.map(|z| z.bottom));
        self.zone_mid.push(live.map(|z| z.mid));

        // Swing lines are always tracked and still break; the toggle only hides them.
        let swing = |n: usize| {
            live.filter(|_| settings.show_swing_lines)
                .map(|z| z.swing_lines[n])
                .filter(|l| !l.broken)
                .map(|l| l.price)
        };
        self.swing_line1.push(swing(0));
        self.swing_line2.push(swing(1));

        let pd = |n: usize| {
            live.filter(|_| settings.show_premium_discount_lines)
                .and_then(|z| z.pd_lines[n])
                .filter(|l| !l.broken)
                .map(|l| l.price)
        };
        self.premium_line.push(pd(0));
        self.discount_line.push(pd(1));

        let tp = |n: usize| {
            live.filter(|z| settings.take_profit_enabled && z.scalp_armed)
                .map(|z| z.take_profits[n])
                .filter(|tp| !tp.hit)
                .map(|tp| tp.price)
        };
        self.tp1.push(tp(0));
        self.tp2.push(tp(1));
        self.tp3.push(tp(2));
    }
}

// ============================================================
// ZONE STATE
// ============================================================

/// Flat, serializable view of the final zone
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneSnapshot {
    /// `+1` bullish, `-1` bearish, `0` none
    pub direction: i8,
    pub broken: bool,
    pub mitigated: bool,
    pub scalp_armed: bool,
    pub top: Option<f64>,
    pub bottom: Option<f64>,
    pub mid: Option<f64>,
    pub origin_start: Option<usize>,
    pub origin_end: Option<usize>,
    pub line1: Option<f64>,
    pub line1_broken: bool,
    pub line2: Option<f64>,
    pub line2_broken: bool,
    pub pd1: Option<f64>,
    pub pd1_broken: bool,
    pub pd2: Option<f64>,
    pub pd2_broken: bool,
    pub tp1: Option<f64>,
    pub tp1_hit: bool,
    pub tp2: Option<f64>,
    pub tp2_hit: bool,
    pub tp3: Option<f64>,
    pub tp3_hit: bool,
}

impl From<&ActiveZone> for ZoneSnapshot {
    fn from(active: &ActiveZone) -> Self {
        let Some(z) = active.zone() else {
            return Self::default();
        };
        let [line1, line2] = z.swing_lines;
        let [pd1, pd2] = z.pd_lines;
        let [tp1, tp2, tp3] = z.take_profits;

        Self {
            direction: active.direction(),
            broken: z.broken,
            mitigated: z.mitigated,
            scalp_armed: z.scalp_armed,
            top: Some(z.top),
            bottom: Some(z.bottom),
            mid: Some(z.mid),
            origin_start: Some(z.origin.0),
            origin_end: Some(z.origin.1),
            line1: Some(line1.price),
            line1_broken: line1.broken,
            line2: Some(line2.price),
            line2_broken: line2.broken,
            pd1: pd1.map(|l| l.price),
            pd1_broken: pd1.is_some_and(|l| l.broken),
            pd2: pd2.map(|l| l.price),
            pd2_broken: pd2.is_some_and(|l| l.broken),
            tp1: Some(tp1.price),
            tp1_hit: tp1.hit,
            tp2: Some(tp2.price),
            tp2_hit: tp2.hit,
            tp3: Some(tp3.price),
            tp3_hit: tp3.hit,
        }
    }
}

// ============================================================
// OVERLAY / SNAPSHOT
// ============================================================

/// Full result of one engine pass
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overlay {
    /// Fewer bars than the confidence threshold
    pub data_gap: bool,
    pub settings: Settings,
    pub series: Series,
    pub events: Vec<SignalEvent>,
    pub signals_by_bar: Vec<SignalFlags>,
    pub last_signal_keys: Vec<SignalKey>,
    pub final_zone_state: ZoneSnapshot,
    pub colors: Colors,
    #[serde(skip)]
    zone: ActiveZone,
}

impl Overlay {
    pub(crate) fn assemble(data_gap: bool, settings: &Settings, pass: PassOutput) -> Self {
        let last_signal_keys = pass
            .signals_by_bar
            .last()
            .map(SignalFlags::active_keys)
            .unwrap_or_default();

        Self {
            data_gap,
            settings: settings.clone(),
            series: pass.series,
            events: pass.events,
            signals_by_bar: pass.signals_by_bar,
            last_signal_keys,
            final_zone_state: ZoneSnapshot::from(&pass.zone),
            colors: settings.colors.clone(),
            zone: pass.zone,
        }
    }

    /// The zone as it stood after the last bar
    pub fn final_zone(&self) -> &ActiveZone {
        &self.zone
    }

    /// Events fired on one bar, in emission order
    pub fn events_at(&self, bar_index: usize) -> impl Iterator<Item = &SignalEvent> {
        self.events.iter().filter(move |e| e.bar_index == bar_index)
    }

    pub fn count(&self, key: SignalKey) -> usize {
        self.events.iter().filter(|e| e.key == key).count()
    }

    /// Reduce to the polling digest
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            data_gap: self.data_gap,
            zone: self.final_zone_state.clone(),
            signals: self.signals_by_bar.last().copied().unwrap_or_default(),
            last_signal_keys: self.last_signal_keys.clone(),
            event_counts: EventCounts::from_events(&self.events),
        }
    }
}

/// Final zone, final bar's signals and per-key event counts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub data_gap: bool,
    #[serde(flatten)]
    pub zone: ZoneSnapshot,
    pub signals: SignalFlags,
    pub last_signal_keys: Vec<SignalKey>,
    pub event_counts: EventCounts,
}

impl From<&Overlay> for Snapshot {
    fn from(overlay: &Overlay) -> Self {
        overlay.snapshot()
    }
}
