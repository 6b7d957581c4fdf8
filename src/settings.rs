//! Settings normalization
//!
//! [`SettingsInput`] is the sparse object callers hand over (every field
//! optional, wrongly typed values ignored). [`Settings::normalize`] turns it into
//! a complete parameter set: numbers are clamped into their bounds and
//! absent fields take defaults. Normalization never fails.

use serde::{Deserialize, Serialize};

use crate::{params, Lookback, RiskReward};

// ============================================================
// RAW INPUT
// ============================================================

/// Sparse, untrusted settings as supplied by a settings resolver
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SettingsInput {
    #[serde(deserialize_with = "lenient::number")]
    pub pivot_lookback: Option<f64>,
    #[serde(deserialize_with = "lenient::boolean")]
    pub zone_from_body_only: Option<bool>,
    #[serde(deserialize_with = "lenient::boolean")]
    pub merge_second_candle: Option<bool>,
    #[serde(deserialize_with = "lenient::boolean")]
    pub persist_until_first_break: Option<bool>,
    #[serde(deserialize_with = "lenient::boolean")]
    pub only_inside_premium_discount: Option<bool>,
    #[serde(deserialize_with = "lenient::boolean")]
    pub show_swing_lines: Option<bool>,
    #[serde(deserialize_with = "lenient::boolean")]
    pub show_premium_discount_lines: Option<bool>,
    #[serde(deserialize_with = "lenient::boolean")]
    pub take_profit_enabled: Option<bool>,
    #[serde(deserialize_with = "lenient::number")]
    pub rr1: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub rr2: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub rr3: Option<f64>,
    pub colors: ColorsInput,
}

/// Display colors as supplied; blank strings count as absent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColorsInput {
    #[serde(deserialize_with = "lenient::string")]
    pub bullish_zone: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub bearish_zone: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub swing_line: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub premium_discount_line: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub take_profit_line: Option<String>,
}

// ============================================================
// NORMALIZED SETTINGS
// ============================================================

pub const DEFAULT_BULLISH_ZONE_COLOR: &str = "#089981";
pub const DEFAULT_BEARISH_ZONE_COLOR: &str = "#f23645";
pub const DEFAULT_SWING_LINE_COLOR: &str = "#787b86";
pub const DEFAULT_PREMIUM_DISCOUNT_LINE_COLOR: &str = "#2962ff";
pub const DEFAULT_TAKE_PROFIT_LINE_COLOR: &str = "#ff9800";

/// Display colors. No effect on detection; forwarded into the overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Colors {
    pub bullish_zone: String,
    pub bearish_zone: String,
    pub swing_line: String,
    pub premium_discount_line: String,
    pub take_profit_line: String,
}

impl Colors {
    pub fn normalize(input: &ColorsInput) -> Self {
        Self {
            bullish_zone: color_or(&input.bullish_zone, DEFAULT_BULLISH_ZONE_COLOR),
            bearish_zone: color_or(&input.bearish_zone, DEFAULT_BEARISH_ZONE_COLOR),
            swing_line: color_or(&input.swing_line, DEFAULT_SWING_LINE_COLOR),
            premium_discount_line: color_or(
                &input.premium_discount_line,
                DEFAULT_PREMIUM_DISCOUNT_LINE_COLOR,
            ),
            take_profit_line: color_or(&input.take_profit_line, DEFAULT_TAKE_PROFIT_LINE_COLOR),
        }
    }
}

impl Default for Colors {
    fn default() -> Self {
        Self::normalize(&ColorsInput::default())
    }
}

fn color_or(value: &Option<String>, default: &str) -> String {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}

/// Complete, bounded parameter set
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub pivot_lookback: Lookback,
    /// Zone edges from candle bodies instead of wicks
    pub zone_from_body_only: bool,
    /// Widen the zone with the candle preceding the origin candle when it has the same colour
    pub merge_second_candle: bool,
    /// Once the scalp is cancelled the zone never re-arms
    pub persist_until_first_break: bool,
    /// Only accept breaks whose E pivot sits inside the premium/discount array
    pub only_inside_premium_discount: bool,
    pub show_swing_lines: bool,
    pub show_premium_discount_lines: bool,
    pub take_profit_enabled: bool,
    pub rr1: RiskReward,
    pub rr2: RiskReward,
    pub rr3: RiskReward,
    pub colors: Colors,
}

impl Settings {
    /// Clamp and default a sparse input. Never fails.
    pub fn normalize(input: &SettingsInput) -> Self {
        Self {
            pivot_lookback: Lookback::clamped(input.pivot_lookback),
            zone_from_body_only: input.zone_from_body_only.unwrap_or(false),
            merge_second_candle: input.merge_second_candle.unwrap_or(false),
            persist_until_first_break: input.persist_until_first_break.unwrap_or(false),
            only_inside_premium_discount: input.only_inside_premium_discount.unwrap_or(false),
            show_swing_lines: input.show_swing_lines.unwrap_or(true),
            show_premium_discount_lines: input.show_premium_discount_lines.unwrap_or(true),
            take_profit_enabled: input.take_profit_enabled.unwrap_or(true),
            rr1: RiskReward::clamped(&params::RR1, input.rr1),
            rr2: RiskReward::clamped(&params::RR2, input.rr2),
            rr3: RiskReward::clamped(&params::RR3, input.rr3),
            colors: Colors::normalize(&input.colors),
        }
    }

    #[inline]
    pub fn risk_rewards(&self) -> [f64; 3] {
        [self.rr1.get(), self.rr2.get(), self.rr3.get()]
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::normalize(&SettingsInput::default())
    }
}

impl From<&SettingsInput> for Settings {
    fn from(input: &SettingsInput) -> Self {
        Self::normalize(input)
    }
}

// ============================================================
// LENIENT FIELD DESERIALIZERS
// ============================================================

/// Field deserializers that map wrongly typed values to `None` instead of failing.
mod lenient {
    use std::fmt;

    use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        d.deserialize_any(NumberVisitor)
    }

    pub fn boolean<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
        d.deserialize_any(BoolVisitor)
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        d.deserialize_any(StringVisitor)
    }

    /// Everything not handled by a visitor is drained and discarded.
    macro_rules! ignore_other_shapes {
        ($de:lifetime) => {
            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_seq<A: SeqAccess<$de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                Ok(None)
            }

            fn visit_map<A: MapAccess<$de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
                Ok(None)
            }
        };
    }

    struct NumberVisitor;

    impl<'de> Visitor<'de> for NumberVisitor {
        type Value = Option<f64>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a number")
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(NumberVisitor)
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(v.is_finite().then_some(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v as f64))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v as f64))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
        }

        fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
            Ok(None)
        }

        ignore_other_shapes!('de);
    }

    struct BoolVisitor;

    impl<'de> Visitor<'de> for BoolVisitor {
        type Value = Option<bool>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a boolean")
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(BoolVisitor)
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_f64<E: de::Error>(self, _: f64) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_i64<E: de::Error>(self, _: i64) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_u64<E: de::Error>(self, _: u64) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_str<E: de::Error>(self, _: &str) -> Result<Self::Value, E> {
            Ok(None)
        }

        ignore_other_shapes!('de);
    }

    struct StringVisitor;

    impl<'de> Visitor<'de> for StringVisitor {
        type Value = Option<String>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string")
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(StringVisitor)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_f64<E: de::Error>(self, _: f64) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_i64<E: de::Error>(self, _: i64) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_u64<E: de::Error>(self, _: u64) -> Result<Self::Value, E> {
            Ok(None)
        }

        ignore_other_shapes!('de);
    }
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.pivot_lookback.get(), 5);
        assert!(!s.zone_from_body_only);
        assert!(!s.merge_second_candle);
        assert!(!s.persist_until_first_break);
        assert!(!s.only_inside_premium_discount);
        assert!(s.show_swing_lines);
        assert!(s.show_premium_discount_lines);
        assert!(s.take_profit_enabled);
        assert_eq!(s.risk_rewards(), [1.0, 2.0, 3.0]);
        assert_eq!(s.colors.bullish_zone, DEFAULT_BULLISH_ZONE_COLOR);
    }

    #[test]
    fn test_clamps_out_of_range() {
        let input = SettingsInput {
            pivot_lookback: Some(0.0),
            rr1: Some(0.0),
            rr2: Some(500.0),
            rr3: Some(f64::NAN),
            ..Default::default()
        };
        let s = Settings::normalize(&input);
        assert_eq!(s.pivot_lookback.get(), 1);
        assert_eq!(s.rr1.get(), 0.2);
        assert_eq!(s.rr2.get(), 100.0);
        assert_eq!(s.rr3.get(), 3.0);
    }

    #[test]
    fn test_blank_colors_default() {
        let input = SettingsInput {
            colors: ColorsInput {
                bullish_zone: Some("   ".to_string()),
                bearish_zone: Some(" #000000 ".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let s = Settings::normalize(&input);
        assert_eq!(s.colors.bullish_zone, DEFAULT_BULLISH_ZONE_COLOR);
        assert_eq!(s.colors.bearish_zone, "#000000");
        assert_eq!(s.colors.take_profit_line, DEFAULT_TAKE_PROFIT_LINE_COLOR);
    }

    #[test]
    fn test_pass_through_bools() {
        let input = SettingsInput {
            zone_from_body_only: Some(true),
            persist_until_first_break: Some(true),
            take_profit_enabled: Some(false),
            ..Default::default()
        };
        let s: Settings = (&input).into();
        assert!(s.zone_from_body_only);
        assert!(s.persist_until_first_break);
        assert!(!s.take_profit_enabled);
    }
}
