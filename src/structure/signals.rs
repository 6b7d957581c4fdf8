//! Signal vocabulary, per-bar signal maps and the append-only event log.
//!
//! The wire keys, direction tags and labels are consumed downstream and must
//! stay exactly as listed here.

use std::ops::{Index, IndexMut};

use serde::{ser::SerializeMap, Serialize, Serializer};
use tracing::trace;

use crate::{Candle, Direction};

/// Macro to generate the SignalKey enum and its lookup tables without boilerplate
macro_rules! define_signal_keys {
  (
    $(
      $variant:ident => ($key:literal, $direction:ident, $label:literal)
    ),* $(,)?
  ) => {
    /// Every signal the engine can emit, in wire order
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub enum SignalKey {
      $($variant),*
    }

    impl SignalKey {
      pub const ALL: &'static [SignalKey] = &[$(SignalKey::$variant),*];
      pub const COUNT: usize = Self::ALL.len();

      /// Wire key
      #[inline]
      pub fn as_str(self) -> &'static str {
        match self {
          $(SignalKey::$variant => $key),*
        }
      }

      #[inline]
      pub fn direction(self) -> Direction {
        match self {
          $(SignalKey::$variant => Direction::$direction),*
        }
      }

      /// Display label
      #[inline]
      pub fn label(self) -> &'static str {
        match self {
          $(SignalKey::$variant => $label),*
        }
      }

      pub fn from_key(key: &str) -> Option<SignalKey> {
        match key {
          $($key => Some(SignalKey::$variant),)*
          _ => None,
        }
      }
    }
  };
}

define_signal_keys! {
  BullishBreaker => ("BBplus", Up, "+BB"),
  LongScalp => ("signUP", Up, "Long scalp"),
  LongScalpCancelled => ("cnclUP", Neutral, "Long scalp cancelled"),
  SwingLow1Break => ("LL1break", Down, "Swing low 1 broken"),
  SwingLow2Break => ("LL2break", Down, "Swing low 2 broken"),
  Premium1Break => ("SW1breakUP", Up, "Premium line 1 broken"),
  Premium2Break => ("SW2breakUP", Up, "Premium line 2 broken"),
  LongTp1 => ("tpUP1", Up, "Long TP1"),
  LongTp2 => ("tpUP2", Up, "Long TP2"),
  LongTp3 => ("tpUP3", Up, "Long TP3"),
  BullishMitigated => ("BB_endBl", Down, "+BB mitigated"),
  BearishBreaker => ("BB_min", Down, "-BB"),
  ShortScalp => ("signDN", Down, "Short scalp"),
  ShortScalpCancelled => ("cnclDN", Neutral, "Short scalp cancelled"),
  SwingHigh1Break => ("HH1break", Up, "Swing high 1 broken"),
  SwingHigh2Break => ("HH2break", Up, "Swing high 2 broken"),
  Discount1Break => ("SW1breakDN", Down, "Discount line 1 broken"),
  Discount2Break => ("SW2breakDN", Down, "Discount line 2 broken"),
  ShortTp1 => ("tpDN1", Down, "Short TP1"),
  ShortTp2 => ("tpDN2", Down, "Short TP2"),
  ShortTp3 => ("tpDN3", Down, "Short TP3"),
  BearishMitigated => ("BB_endBr", Up, "-BB mitigated"),
}

impl SignalKey {
  /// Position in the wire order
  #[inline]
  pub fn index(self) -> usize {
    self as usize
  }
}

impl std::fmt::Display for SignalKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl Serialize for SignalKey {
  fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(self.as_str())
  }
}

// ============================================================
// KEYED MAPS
// ============================================================

/// Fixed map from every [`SignalKey`] to a value, serialized as an object in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalMap<T>([T; SignalKey::COUNT]);

/// One bar's fired signals
pub type SignalFlags = SignalMap<bool>;
/// Events per key over a whole run
pub type EventCounts = SignalMap<usize>;

impl<T: Copy + Default> Default for SignalMap<T> {
  fn default() -> Self {
    Self([T::default(); SignalKey::COUNT])
  }
}

impl<T> SignalMap<T> {
  pub fn iter(&self) -> impl Iterator<Item = (SignalKey, &T)> {
    SignalKey::ALL.iter().copied().zip(self.0.iter())
  }
}

impl<T> Index<SignalKey> for SignalMap<T> {
  type Output = T;

  fn index(&self, key: SignalKey) -> &T {
    &self.0[key.index()]
  }
}

impl<T> IndexMut<SignalKey> for SignalMap<T> {
  fn index_mut(&mut self, key: SignalKey) -> &mut T {
    &mut self.0[key.index()]
  }
}

impl SignalFlags {
  /// Keys set on this bar, in wire order
  pub fn active_keys(&self) -> Vec<SignalKey> {
    self.iter().filter(|(_, on)| **on).map(|(k, _)| k).collect()
  }

  pub fn any(&self) -> bool {
    self.0.iter().any(|&on| on)
  }
}

impl EventCounts {
  pub fn from_events(events: &[SignalEvent]) -> Self {
    let mut counts = Self::default();
    for event in events {
      counts[event.key] += 1;
    }
    counts
  }

  pub fn total(&self) -> usize {
    self.0.iter().sum()
  }
}

impl<T: Serialize> Serialize for SignalMap<T> {
  fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
    let mut map = s.serialize_map(Some(SignalKey::COUNT))?;
    for (key, value) in self.iter() {
      map.serialize_entry(key.as_str(), value)?;
    }
    map.end()
  }
}

// ============================================================
// EVENTS
// ============================================================

/// One fired signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalEvent {
  pub bar_index: usize,
  pub timestamp: Option<i64>,
  pub key: SignalKey,
  pub direction: Direction,
  pub price: f64,
}

/// Append-only event log plus one flag map per bar
#[derive(Debug, Clone, Default)]
pub struct SignalLog {
  pub events: Vec<SignalEvent>,
  pub by_bar: Vec<SignalFlags>,
}

impl SignalLog {
  pub fn with_bars(len: usize) -> Self {
    Self {
      events: Vec::new(),
      by_bar: vec![SignalFlags::default(); len],
    }
  }

  pub fn emit(&mut self, bar_index: usize, candle: &Candle, key: SignalKey, price: f64) {
    trace!(bar = bar_index, key = key.as_str(), price, "signal");
    self.events.push(SignalEvent {
      bar_index,
      timestamp: candle.timestamp,
      key,
      direction: key.direction(),
      price,
    });
    if let Some(flags) = self.by_bar.get_mut(bar_index) {
      flags[key] = true;
    }
  }
}
