//! # breaker-blocks - Breaker Block Market-Structure Engine
//!
//! Deterministic detection of breaker blocks over a chronological OHLC series:
//! fractal pivots, five-point structural breaks, zone mitigation, scalp
//! arming and take-profit tracking, all in one forward pass.
//!
//! ## Quick Start
//!
//! ```rust
//! use breaker_blocks::prelude::*;
//!
//! let candles = vec![
//!     Candle::new(100.0, 101.0, 99.0, 100.5).with_timestamp(1_700_000_000_000),
//!     Candle::new(100.5, 102.0, 100.0, 101.5).with_timestamp(1_700_000_060_000),
//! ];
//!
//! let engine = EngineBuilder::new().build().unwrap();
//! let settings = Settings::normalize(&SettingsInput::default());
//!
//! let overlay = engine.compute(&candles, &settings);
//! assert_eq!(overlay.series.zone_top.len(), candles.len());
//! assert!(overlay.data_gap);
//!
//! let snapshot = overlay.snapshot();
//! assert_eq!(snapshot.zone.direction, 0);
//! ```

pub mod candles;
pub mod output;
pub mod params;
pub mod settings;
pub mod structure;

pub mod prelude {
    pub use crate::{
        // Normalizers
        candles::{data_gap_threshold, normalize_candles},
        // Outputs
        output::{Overlay, Series, Snapshot, ZoneSnapshot},
        // Parameters
        params::{ParamMeta, ParamType, PARAM_META},
        settings::{Colors, ColorsInput, Settings, SettingsInput},
        // Structure
        structure::{
            ActiveZone, Bias, BreakLatch, BreakerZone, EventCounts, Pivot, PivotHistory,
            PivotKind, SignalEvent, SignalFlags, SignalKey, SignalMap,
        },
        // Parallel
        compute_parallel,
        // Engine
        BreakerEngine,
        // Errors
        BreakerError,
        // Types
        Candle,
        Direction,
        EngineBuilder,
        EngineConfig,
        Lookback,
        OHLCVExt,
        Result,
        RiskReward,
        ScanResult,
        OHLCV,
    };
}

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    output::{Overlay, Snapshot},
    settings::Settings,
};

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, BreakerError>;

/// Errors raised by the strict construction surfaces.
///
/// The engine itself is total: it never returns these while computing.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BreakerError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid OHLC at index {index}: {reason}")]
    InvalidOHLCV { index: usize, reason: &'static str },
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Pivot lookback in bars, always within `[1, 10]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Lookback(usize);

impl Lookback {
    /// Create a new Lookback, rejecting values outside `[1, 10]`
    pub fn new(value: usize) -> Result<Self> {
        params::PIVOT_LOOKBACK.validate(value as f64)?;
        Ok(Self(value))
    }

    /// Clamp any input into bounds; missing or non-finite input gives the default
    pub fn clamped(value: Option<f64>) -> Self {
        Self(params::PIVOT_LOOKBACK.clamp(value) as usize)
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for Lookback {
    fn default() -> Self {
        Self::clamped(None)
    }
}

impl Serialize for Lookback {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> Deserialize<'de> for Lookback {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Lookback::new(value).map_err(serde::de::Error::custom)
    }
}

/// Risk/reward multiple of a take-profit level, always within `[0.2, 100]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct RiskReward(f64);

impl RiskReward {
    /// Create a new RiskReward, rejecting values outside `[0.2, 100]`
    pub fn new(value: f64) -> Result<Self> {
        params::RR1.validate(value)?;
        Ok(Self(value))
    }

    /// Clamp against the bounds of `meta`, falling back to its default
    pub fn clamped(meta: &params::ParamMeta, value: Option<f64>) -> Self {
        Self(meta.clamp(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl Serialize for RiskReward {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> Deserialize<'de> for RiskReward {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        RiskReward::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLCV TRAITS
// ============================================================

/// Core OHLC data trait
pub trait OHLCV {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;

    fn volume(&self) -> Option<f64> {
        None
    }

    fn timestamp(&self) -> Option<i64> {
        None
    }
}

/// Extension trait with computed properties for OHLC data
pub trait OHLCVExt: OHLCV {
    #[inline]
    fn body_top(&self) -> f64 {
        self.open().max(self.close())
    }

    #[inline]
    fn body_bottom(&self) -> f64 {
        self.open().min(self.close())
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    #[inline]
    fn is_bullish(&self) -> bool {
        self.close() > self.open()
    }

    #[inline]
    fn is_bearish(&self) -> bool {
        self.close() < self.open()
    }

    /// Reject rows whose prices are NaN or infinite
    fn validate(&self) -> Result<()> {
        if self.open().is_nan()
            || self.high().is_nan()
            || self.low().is_nan()
            || self.close().is_nan()
        {
            return Err(BreakerError::InvalidOHLCV {
                index: 0,
                reason: "NaN in OHLC",
            });
        }
        if self.open().is_infinite()
            || self.high().is_infinite()
            || self.low().is_infinite()
            || self.close().is_infinite()
        {
            return Err(BreakerError::InvalidOHLCV {
                index: 0,
                reason: "Infinite value in OHLC",
            });
        }
        Ok(())
    }
}

impl<T: OHLCV> OHLCVExt for T {}

/// Owned candle row as consumed and produced by the normalizer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    #[serde(default)]
    pub timestamp: Option<i64>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<f64>,
}

impl Candle {
    pub fn new(open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp: None,
            open,
            high,
            low,
            close,
            volume: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Copy any OHLC row into an owned candle
    pub fn from_ohlcv<T: OHLCV + ?Sized>(bar: &T) -> Self {
        Self {
            timestamp: bar.timestamp(),
            open: bar.open(),
            high: bar.high(),
            low: bar.low(),
            close: bar.close(),
            volume: bar.volume(),
        }
    }
}

impl OHLCV for Candle {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> Option<f64> {
        self.volume
    }

    fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }
}

/// Direction tag attached to every signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Neutral,
}

impl Direction {
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Neutral => "neutral",
        }
    }
}

// ============================================================
// BREAKER ENGINE
// ============================================================

/// Structural breaks are only evaluated on the most recent this-many bars
pub const DEFAULT_BREAK_WINDOW: usize = 2000;

/// Engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub break_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            break_window: DEFAULT_BREAK_WINDOW,
        }
    }
}

/// Main breaker block engine. Stateless between calls.
#[derive(Debug, Clone, Default)]
pub struct BreakerEngine {
    config: EngineConfig,
}

impl BreakerEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Normalize `rows`, replay the full history and assemble the overlay.
    pub fn compute<T: OHLCV>(&self, rows: &[T], settings: &Settings) -> Overlay {
        let candles = candles::normalize_candles(rows);
        self.compute_normalized(&candles, settings)
    }

    /// Replay an already normalized series.
    pub fn compute_normalized(&self, candles: &[Candle], settings: &Settings) -> Overlay {
        let data_gap = candles::has_data_gap(candles.len(), settings.pivot_lookback);
        if data_gap {
            debug!(
                bars = candles.len(),
                threshold = candles::data_gap_threshold(settings.pivot_lookback),
                "series shorter than data gap threshold"
            );
        }

        let pass = structure::scan(candles, settings, self.config.break_window);

        debug!(
            bars = candles.len(),
            events = pass.events.len(),
            zone = pass.zone.direction(),
            "breaker pass complete"
        );

        Overlay::assemble(data_gap, settings, pass)
    }

    /// Compute and reduce straight to the polling digest.
    pub fn snapshot<T: OHLCV>(&self, rows: &[T], settings: &Settings) -> Snapshot {
        self.compute(rows, settings).snapshot()
    }
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for creating BreakerEngine instances
#[derive(Debug, Clone, Default)]
pub struct EngineBuilder {
    config: EngineConfig,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit structural-break evaluation to the most recent `bars` bars
    pub fn break_window(mut self, bars: usize) -> Self {
        self.config.break_window = bars;
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<BreakerEngine> {
        if self.config.break_window == 0 {
            return Err(BreakerError::InvalidConfig(
                "break_window must be at least one bar".to_string(),
            ));
        }
        Ok(BreakerEngine::new(self.config))
    }
}

// ============================================================
// PARALLEL SCANNING
// ============================================================

use rayon::prelude::*;

/// Result of computing a single instrument
#[derive(Debug)]
pub struct ScanResult {
    pub symbol: String,
    pub overlay: Overlay,
}

/// Compute many independent series on the rayon pool.
///
/// Results come back in input order.
pub fn compute_parallel<'a, T, I>(
    engine: &BreakerEngine,
    settings: &Settings,
    instruments: I,
) -> Vec<ScanResult>
where
    T: OHLCV + Sync + 'a,
    I: IntoParallelIterator<Item = (&'a str, &'a [T])>,
{
    instruments
        .into_par_iter()
        .map(|(symbol, bars)| ScanResult {
            symbol: symbol.to_string(),
            overlay: engine.compute(bars, settings),
        })
        .collect()
}

// ============================================================
// TESTS
// ============================================================
