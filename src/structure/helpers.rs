//! Shared thresholds and price comparisons for the structure scan.
//!
//! Every bullish rule has a bearish mirror; [`Bias`] carries the orientation so
//! the pivot, zone and signal code is written once.

use super::{pivots::PivotKind, signals::SignalKey};
use crate::{OHLCVExt, OHLCV};

/// Pivot history keeps at most this many swings
pub const PIVOT_HISTORY_CAPACITY: usize = 50;
/// Floor for the zone height used as take-profit spread
pub const SPREAD_EPSILON: f64 = 1e-9;

#[inline]
pub fn midpoint(a: f64, b: f64) -> f64 {
    (a + b) / 2.0
}

/// `value` lies strictly inside the interval spanned by `a` and `b`
#[inline]
pub fn strictly_between(value: f64, a: f64, b: f64) -> bool {
    value > a.min(b) && value < a.max(b)
}

/// Zone edges contributed by one origin candle: `(top, bottom)`
#[inline]
pub fn candle_extremes<T: OHLCV>(bar: &T, body_only: bool) -> (f64, f64) {
    if body_only {
        (bar.body_top(), bar.body_bottom())
    } else {
        (bar.high(), bar.low())
    }
}

/// Orientation of a break or zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bias {
    Bullish,
    Bearish,
}

/// Signal keys emitted for one orientation
#[derive(Debug)]
pub struct BiasSignals {
    pub formed: SignalKey,
    pub armed: SignalKey,
    pub cancelled: SignalKey,
    pub mitigated: SignalKey,
    pub swing_break: [SignalKey; 2],
    pub pd_break: [SignalKey; 2],
    pub take_profit: [SignalKey; 3],
}

const BULLISH_SIGNALS: BiasSignals = BiasSignals {
    formed: SignalKey::BullishBreaker,
    armed: SignalKey::LongScalp,
    cancelled: SignalKey::LongScalpCancelled,
    mitigated: SignalKey::BullishMitigated,
    swing_break: [SignalKey::SwingLow1Break, SignalKey::SwingLow2Break],
    pd_break: [SignalKey::Premium1Break, SignalKey::Premium2Break],
    take_profit: [SignalKey::LongTp1, SignalKey::LongTp2, SignalKey::LongTp3],
};

const BEARISH_SIGNALS: BiasSignals = BiasSignals {
    formed: SignalKey::BearishBreaker,
    armed: SignalKey::ShortScalp,
    cancelled: SignalKey::ShortScalpCancelled,
    mitigated: SignalKey::BearishMitigated,
    swing_break: [SignalKey::SwingHigh1Break, SignalKey::SwingHigh2Break],
    pd_break: [SignalKey::Discount1Break, SignalKey::Discount2Break],
    take_profit: [SignalKey::ShortTp1, SignalKey::ShortTp2, SignalKey::ShortTp3],
};

impl Bias {
    /// `+1` for bullish, `-1` for bearish
    #[inline]
    pub fn sign(self) -> i8 {
        match self {
            Bias::Bullish => 1,
            Bias::Bearish => -1,
        }
    }

    /// `a` is further than `b` in the direction of this bias
    #[inline]
    pub fn exceeds(self, a: f64, b: f64) -> bool {
        match self {
            Bias::Bullish => a > b,
            Bias::Bearish => a < b,
        }
    }

    /// Kind of the pivot whose price must be closed through to confirm the break
    #[inline]
    pub fn break_pivot(self) -> PivotKind {
        match self {
            Bias::Bullish => PivotKind::High,
            Bias::Bearish => PivotKind::Low,
        }
    }

    /// Candle colour that can anchor a zone of this bias
    #[inline]
    pub fn is_origin_candle<T: OHLCV>(self, bar: &T) -> bool {
        match self {
            Bias::Bullish => bar.is_bullish(),
            Bias::Bearish => bar.is_bearish(),
        }
    }

    /// Bar extreme reaching toward take-profits (high for longs, low for shorts)
    #[inline]
    pub fn reach<T: OHLCV>(self, bar: &T) -> f64 {
        match self {
            Bias::Bullish => bar.high(),
            Bias::Bearish => bar.low(),
        }
    }

    /// Price reported on the break event (low for longs, high for shorts)
    #[inline]
    pub fn break_event_price<T: OHLCV>(self, bar: &T) -> f64 {
        match self {
            Bias::Bullish => bar.low(),
            Bias::Bearish => bar.high(),
        }
    }

    #[inline]
    pub fn signals(self) -> &'static BiasSignals {
        match self {
            Bias::Bullish => &BULLISH_SIGNALS,
            Bias::Bearish => &BEARISH_SIGNALS,
        }
    }
}
