//! Candle normalization
//!
//! Drops rows with non-finite prices and orders the remainder by timestamp.
//! Rows without a timestamp sort as if stamped `0`; ties keep input order.

use tracing::debug;

use crate::{Candle, Lookback, OHLCVExt, OHLCV};

/// Series shorter than this are always flagged as a data gap
pub const DATA_GAP_MIN_BARS: usize = 80;
/// Bars of history wanted per bar of pivot lookback
pub const DATA_GAP_BARS_PER_LOOKBACK: usize = 8;

/// Filter and sort raw rows into an owned, chronological candle series.
pub fn normalize_candles<T: OHLCV>(rows: &[T]) -> Vec<Candle> {
    let mut candles: Vec<Candle> = rows
        .iter()
        .filter(|row| row.validate().is_ok())
        .map(Candle::from_ohlcv)
        .collect();

    let dropped = rows.len() - candles.len();
    if dropped > 0 {
        debug!(dropped, kept = candles.len(), "dropped non-finite candle rows");
    }

    // stable: equal timestamps keep their input order
    candles.sort_by_key(|c| c.timestamp.unwrap_or(0));
    candles
}

/// Minimum bar count below which results are low-confidence
#[inline]
pub fn data_gap_threshold(lookback: Lookback) -> usize {
    DATA_GAP_MIN_BARS.max(lookback.get() * DATA_GAP_BARS_PER_LOOKBACK)
}

#[inline]
pub fn has_data_gap(len: usize, lookback: Lookback) -> bool {
    len < data_gap_threshold(lookback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drops_non_finite_rows() {
        let rows = vec![
            Candle::new(1.0, 2.0, 0.5, 1.5),
            Candle::new(f64::NAN, 2.0, 0.5, 1.5),
            Candle::new(1.0, f64::INFINITY, 0.5, 1.5),
            Candle::new(1.0, 2.0, f64::NEG_INFINITY, 1.5),
            Candle::new(1.0, 2.0, 0.5, f64::NAN),
            Candle::new(2.0, 3.0, 1.5, 2.5),
        ];
        let out = normalize_candles(&rows);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].open, 1.0);
        assert_eq!(out[1].open, 2.0);
    }

    #[test]
    fn test_sorts_by_timestamp_stably() {
        let rows = vec![
            Candle::new(3.0, 3.0, 3.0, 3.0).with_timestamp(30),
            Candle::new(1.0, 1.0, 1.0, 1.0).with_timestamp(10),
            Candle::new(2.0, 2.0, 2.0, 2.0).with_timestamp(10),
            Candle::new(0.0, 0.0, 0.0, 0.0),
        ];
        let out = normalize_candles(&rows);
        let opens: Vec<f64> = out.iter().map(|c| c.open).collect();
        assert_eq!(opens, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(out[0].timestamp, None);
    }

    #[test]
    fn test_data_gap_threshold() {
        assert_eq!(data_gap_threshold(Lookback::new_const(1)), 80);
        assert_eq!(data_gap_threshold(Lookback::new_const(10)), 80);
        assert!(has_data_gap(79, Lookback::new_const(5)));
        assert!(!has_data_gap(80, Lookback::new_const(5)));
    }
}
