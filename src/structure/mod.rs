//! Market-structure scan: pivots, structural breaks and the breaker zone
//!
//! One forward pass over a normalized series. Per bar:
//!
//! 1. Test bar `i - 1` as a fractal pivot (bar `i` is its confirmation bar).
//! 2. Step the zone that existed before this bar.
//! 3. Evaluate bullish, then bearish, structural breaks (recent bars only).
//! 4. Record plot values for the bar.

pub mod breaks;
pub mod helpers;
pub mod pivots;
pub mod signals;
pub mod zone;

// Re-export the building blocks for convenience
pub use breaks::{evaluate, BreakLatch, StructuralBreak, SwingChain};
pub use helpers::Bias;
pub use pivots::{is_pivot_high, is_pivot_low, Pivot, PivotHistory, PivotKind};
pub use signals::{EventCounts, SignalEvent, SignalFlags, SignalKey, SignalLog, SignalMap};
pub use zone::{ActiveZone, BreakerZone, Line, TakeProfit};

use tracing::debug;

use crate::{output::Series, settings::Settings, Candle};

/// Everything the assembler needs from one pass
#[derive(Debug, Clone)]
pub struct PassOutput {
  pub series: Series,
  pub events: Vec<SignalEvent>,
  pub signals_by_bar: Vec<SignalFlags>,
  pub zone: ActiveZone,
}

/// Replay the whole series once.
///
/// Structural breaks are only evaluated on the last `break_window` bars;
/// pivots are tracked over the full series regardless.
pub fn scan(candles: &[Candle], settings: &Settings, break_window: usize) -> PassOutput {
  let len = candles.len();
  let lookback = settings.pivot_lookback.get();
  let window_start = len.saturating_sub(break_window);

  let mut history = PivotHistory::new();
  let mut latch = BreakLatch::None;
  let mut zone = ActiveZone::None;
  let mut log = SignalLog::with_bars(len);
  let mut series = Series::with_capacity(len);

  for (i, candle) in candles.iter().enumerate() {
    if i >= 1 {
      history.observe(candles, i - 1, lookback);
    }

    zone.step(candle, i, settings, &mut log);

    if i >= window_start {
      for bias in [Bias::Bullish, Bias::Bearish] {
        let Some(brk) = evaluate(
          candles,
          i,
          &history,
          latch,
          bias,
          settings.only_inside_premium_discount,
        ) else {
          continue;
        };

        latch = BreakLatch::from(bias);
        debug!(bias = ?bias, bar = i, level = brk.chain.d.price, "structural break");

        match BreakerZone::build(candles, &brk, settings) {
          Some(built) => {
            log.emit(i, candle, bias.signals().formed, bias.break_event_price(candle));
            zone = ActiveZone::new(bias, built);
          }
          None => debug!(bias = ?bias, bar = i, "no origin candle between C and D"),
        }
      }
    }

    series.record(&zone, settings);
  }

  PassOutput {
    series,
    events: log.events,
    signals_by_bar: log.by_bar,
    zone,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_flat_series_has_no_structure() {
    let candles: Vec<Candle> = (0..30).map(|_| Candle::new(10.0, 10.0, 10.0, 10.0)).collect();
    let pass = scan(&candles, &Settings::default(), crate::DEFAULT_BREAK_WINDOW);
    assert!(pass.events.is_empty());
    assert_eq!(pass.zone, ActiveZone::None);
    assert_eq!(pass.series.len(), 30);
    assert_eq!(pass.signals_by_bar.len(), 30);
  }

  #[test]
  fn test_single_candle() {
    let candles = vec![Candle::new(10.0, 11.0, 9.0, 10.5)];
    let pass = scan(&candles, &Settings::default(), crate::DEFAULT_BREAK_WINDOW);
    assert!(pass.events.is_empty());
    assert_eq!(pass.series.zone_top, vec![None]);
  }
}
