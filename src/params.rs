//! Parameter metadata for the numeric breaker settings
//!
//! This module describes the bounds of every numeric setting, enabling:
//! - Clamping of sparse/untrusted input during settings normalization
//! - Strict validation for callers that want to reject bad values instead
//! - Automatic configuration UI generation
//!
//! # Example
//!
//! ```rust
//! use breaker_blocks::params::PARAM_META;
//!
//! for param in PARAM_META {
//!     println!("{}: {:?} in [{}, {}]", param.name, param.param_type, param.min, param.max);
//! }
//! ```

use crate::{BreakerError, Result};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
  /// Whole number; fractional input is truncated toward zero
  Integer,
  /// Real number
  Float,
}

/// Metadata for a single numeric setting
#[derive(Debug, Clone, Copy)]
pub struct ParamMeta {
  /// Wire name of the setting (e.g., "pivotLookback")
  pub name: &'static str,
  pub param_type: ParamType,
  pub default: f64,
  pub min: f64,
  pub max: f64,
  /// Human-readable description
  pub description: &'static str,
}

impl ParamMeta {
  pub const fn integer(
    name: &'static str,
    default: f64,
    min: f64,
    max: f64,
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Integer, default, min, max, description }
  }

  pub const fn float(
    name: &'static str,
    default: f64,
    min: f64,
    max: f64,
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Float, default, min, max, description }
  }

  /// Clamp a possibly-missing value into bounds.
  ///
  /// Missing and non-finite values fall back to the default. Never fails.
  pub fn clamp(&self, value: Option<f64>) -> f64 {
    let value = match value {
      Some(v) if v.is_finite() => v,
      _ => return self.default,
    };
    let value = match self.param_type {
      ParamType::Integer => value.trunc(),
      ParamType::Float => value,
    };
    value.clamp(self.min, self.max)
  }

  /// Validate a value for this parameter without clamping
  pub fn validate(&self, value: f64) -> Result<()> {
    if !value.is_finite() {
      return Err(BreakerError::InvalidValue("parameter cannot be NaN or infinite"));
    }
    if value < self.min || value > self.max {
      return Err(BreakerError::OutOfRange {
        field: self.name,
        value,
        min: self.min,
        max: self.max,
      });
    }
    if self.param_type == ParamType::Integer && value.fract() != 0.0 {
      return Err(BreakerError::InvalidValue("integer parameter has a fractional part"));
    }
    Ok(())
  }
}

// ============================================================
// SETTING BOUNDS
// ============================================================

pub const PIVOT_LOOKBACK: ParamMeta = ParamMeta::integer(
  "pivotLookback",
  5.0,
  1.0,
  10.0,
  "Bars on the left of a fractal candidate that it must exceed",
);

pub const RR1: ParamMeta =
  ParamMeta::float("rr1", 1.0, 0.2, 100.0, "Risk/reward multiple of the first take-profit");

pub const RR2: ParamMeta =
  ParamMeta::float("rr2", 2.0, 0.2, 100.0, "Risk/reward multiple of the second take-profit");

pub const RR3: ParamMeta =
  ParamMeta::float("rr3", 3.0, 0.2, 100.0, "Risk/reward multiple of the third take-profit");

/// All numeric settings, in wire order
pub const PARAM_META: &[ParamMeta] = &[PIVOT_LOOKBACK, RR1, RR2, RR3];

/// Look up a setting's metadata by wire name
pub fn param_meta(name: &str) -> Option<&'static ParamMeta> {
  PARAM_META.iter().find(|m| m.name == name)
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_clamp_missing_uses_default() {
    assert_eq!(PIVOT_LOOKBACK.clamp(None), 5.0);
    assert_eq!(RR2.clamp(None), 2.0);
  }

  #[test]
  fn test_clamp_non_finite_uses_default() {
    assert_eq!(RR1.clamp(Some(f64::NAN)), 1.0);
    assert_eq!(RR3.clamp(Some(f64::INFINITY)), 3.0);
    assert_eq!(PIVOT_LOOKBACK.clamp(Some(f64::NEG_INFINITY)), 5.0);
  }

  #[test]
  fn test_clamp_bounds() {
    assert_eq!(PIVOT_LOOKBACK.clamp(Some(0.0)), 1.0);
    assert_eq!(PIVOT_LOOKBACK.clamp(Some(-4.0)), 1.0);
    assert_eq!(PIVOT_LOOKBACK.clamp(Some(42.0)), 10.0);
    assert_eq!(RR1.clamp(Some(0.01)), 0.2);
    assert_eq!(RR1.clamp(Some(1e9)), 100.0);
    assert!((RR2.clamp(Some(2.5)) - 2.5).abs() < f64::EPSILON);
  }

  #[test]
  fn test_clamp_truncates_integers() {
    assert_eq!(PIVOT_LOOKBACK.clamp(Some(3.9)), 3.0);
    assert_eq!(PIVOT_LOOKBACK.clamp(Some(0.7)), 1.0);
  }

  #[test]
  fn test_validate() {
    assert!(PIVOT_LOOKBACK.validate(3.0).is_ok());
    assert!(PIVOT_LOOKBACK.validate(3.5).is_err());
    assert!(PIVOT_LOOKBACK.validate(11.0).is_err());
    assert!(RR1.validate(0.2).is_ok());
    assert!(RR1.validate(0.1).is_err());
    assert!(RR1.validate(f64::NAN).is_err());
  }

  #[test]
  fn test_lookup() {
    assert_eq!(param_meta("rr3").map(|m| m.default), Some(3.0));
    assert!(param_meta("missing").is_none());
    assert_eq!(PARAM_META.len(), 4);
  }
}
