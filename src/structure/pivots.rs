//! Fractal pivot detection and the bounded, alternating pivot history.

use std::collections::VecDeque;

use super::helpers::PIVOT_HISTORY_CAPACITY;
use crate::OHLCV;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PivotKind {
  High,
  Low,
}

/// Confirmed swing high or low
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pivot {
  pub kind: PivotKind,
  pub bar_index: usize,
  pub price: f64,
}

impl Pivot {
  pub fn high(bar_index: usize, price: f64) -> Self {
    Self {
      kind: PivotKind::High,
      bar_index,
      price,
    }
  }

  pub fn low(bar_index: usize, price: f64) -> Self {
    Self {
      kind: PivotKind::Low,
      bar_index,
      price,
    }
  }

  /// `self` is a more extreme swing of the same kind than `other`
  #[inline]
  fn more_extreme_than(&self, other: &Pivot) -> bool {
    match self.kind {
      PivotKind::High => self.price > other.price,
      PivotKind::Low => self.price < other.price,
    }
  }
}

/// Bar `j` is a swing high: its high is strictly above every high in
/// `[j - lookback, j + 1]` other than its own. Needs one bar of look-ahead.
pub fn is_pivot_high<T: OHLCV>(bars: &[T], j: usize, lookback: usize) -> bool {
  if j < lookback || j + 1 >= bars.len() {
    return false;
  }
  let high = bars[j].high();
  (j - lookback..=j + 1)
    .filter(|&k| k != j)
    .all(|k| bars[k].high() < high)
}

/// Mirror of [`is_pivot_high`] on lows.
pub fn is_pivot_low<T: OHLCV>(bars: &[T], j: usize, lookback: usize) -> bool {
  if j < lookback || j + 1 >= bars.len() {
    return false;
  }
  let low = bars[j].low();
  (j - lookback..=j + 1)
    .filter(|&k| k != j)
    .all(|k| bars[k].low() > low)
}

/// Most recent swings, newest first, alternating high/low.
///
/// Offset `0` is the newest pivot. Consecutive swings of one kind collapse into
/// the most extreme; the oldest entries fall off past capacity.
#[derive(Debug, Clone)]
pub struct PivotHistory {
  entries: VecDeque<Pivot>,
  capacity: usize,
}

impl Default for PivotHistory {
  fn default() -> Self {
    Self::with_capacity(PIVOT_HISTORY_CAPACITY)
  }
}

impl PivotHistory {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      entries: VecDeque::with_capacity(capacity + 1),
      capacity,
    }
  }

  /// Insert a freshly confirmed pivot.
  ///
  /// Returns `true` when the history changed.
  pub fn push(&mut self, pivot: Pivot) -> bool {
    match self.entries.front_mut() {
      Some(latest) if latest.kind == pivot.kind => {
        if pivot.more_extreme_than(latest) {
          *latest = pivot;
          true
        } else {
          false
        }
      }
      _ => {
        self.entries.push_front(pivot);
        self.entries.truncate(self.capacity);
        true
      }
    }
  }

  #[inline]
  pub fn get(&self, offset: usize) -> Option<&Pivot> {
    self.entries.get(offset)
  }

  #[inline]
  pub fn latest(&self) -> Option<&Pivot> {
    self.entries.front()
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Pivot> {
    self.entries.iter()
  }

  /// Test candidate bar `j` on both sides and record what confirms.
  /// Highs are recorded before lows.
  pub fn observe<T: OHLCV>(&mut self, bars: &[T], j: usize, lookback: usize) {
    if is_pivot_high(bars, j, lookback) {
      self.push(Pivot::high(j, bars[j].high()));
    }
    if is_pivot_low(bars, j, lookback) {
      self.push(Pivot::low(j, bars[j].low()));
    }
  }
}
