//! Structural break evaluation over the five most recent chained swings.
//!
//! For a bullish break the chain is read around the reference swing high `D`:
//!
//! ```text
//!   offset   iH-1  iH   iH+1  iH+2  iH+3  iH+4
//!   swing     E    D     C     B     A    (older high)
//!   kind     low  high  low   high  low    high
//! ```
//!
//! The bearish chain is the same shape with highs and lows swapped.

use super::{
  helpers::{midpoint, Bias},
  pivots::{Pivot, PivotHistory, PivotKind},
};
use crate::{OHLCVExt, OHLCV};

/// Polarity of the last break that fired.
///
/// A break is only accepted when the latch does not already hold its polarity.
/// Survives zone mitigation; only an opposite break flips it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BreakLatch {
  #[default]
  None,
  Bullish,
  Bearish,
}

impl BreakLatch {
  #[inline]
  pub fn allows(self, bias: Bias) -> bool {
    self != BreakLatch::from(bias)
  }
}

impl From<Bias> for BreakLatch {
  fn from(bias: Bias) -> Self {
    match bias {
      Bias::Bullish => BreakLatch::Bullish,
      Bias::Bearish => BreakLatch::Bearish,
    }
  }
}

/// Swings read from the history around the reference pivot `d`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingChain {
  pub e: Pivot,
  pub d: Pivot,
  pub c: Pivot,
  pub b: Pivot,
  pub a: Pivot,
  /// Next swing of `d`'s kind beyond `b`, when the history reaches that far
  pub older: Option<Pivot>,
}

/// A confirmed break at `bar_index`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StructuralBreak {
  pub bias: Bias,
  pub bar_index: usize,
  pub chain: SwingChain,
}

/// History offset of the reference swing of `kind`: slot 2 if it holds that kind, else slot 1
#[inline]
pub fn reference_offset(history: &PivotHistory, kind: PivotKind) -> usize {
  if history.get(2).is_some_and(|p| p.kind == kind) {
    2
  } else {
    1
  }
}

pub fn swing_chain(history: &PivotHistory, bias: Bias) -> Option<SwingChain> {
  let kind = bias.break_pivot();
  let at = reference_offset(history, kind);
  let d = *history.get(at)?;
  if d.kind != kind {
    return None;
  }
  Some(SwingChain {
    e: *history.get(at - 1)?,
    d,
    c: *history.get(at + 1)?,
    b: *history.get(at + 2)?,
    a: *history.get(at + 3)?,
    older: history.get(at + 4).copied(),
  })
}

/// Test whether bar `index` confirms a break of polarity `bias`.
pub fn evaluate<T: OHLCV>(
  bars: &[T],
  index: usize,
  history: &PivotHistory,
  latch: BreakLatch,
  bias: Bias,
  inside_pd_only: bool,
) -> Option<StructuralBreak> {
  if !latch.allows(bias) {
    return None;
  }
  let chain = swing_chain(history, bias)?;
  let close = bars.get(index)?.close();

  if !bias.exceeds(close, chain.d.price) {
    return None;
  }
  // E must undercut C (bullish) / overshoot C (bearish)
  if !bias.exceeds(chain.c.price, chain.e.price) {
    return None;
  }
  if chain.c.bar_index == chain.d.bar_index {
    return None;
  }
  if inside_pd_only && !inside_premium_discount(bars, &chain, bias) {
    return None;
  }

  Some(StructuralBreak {
    bias,
    bar_index: index,
    chain,
  })
}

/// `A` is the extreme of the chain and `E` sits in the discount (bullish) or
/// premium (bearish) half of the array spanned by the bodies of `A`, `B`, `D`.
fn inside_premium_discount<T: OHLCV>(bars: &[T], chain: &SwingChain, bias: Bias) -> bool {
  let SwingChain { e, d, c, b, a, .. } = *chain;

  if !(bias.exceeds(c.price, a.price) && bias.exceeds(e.price, a.price)) {
    return false;
  }

  let (Some(a_bar), Some(b_bar), Some(d_bar)) = (
    bars.get(a.bar_index),
    bars.get(b.bar_index),
    bars.get(d.bar_index),
  ) else {
    return false;
  };

  let (low, high) = match bias {
    Bias::Bullish => (a_bar.body_bottom(), b_bar.body_top().max(d_bar.body_top())),
    Bias::Bearish => (b_bar.body_bottom().min(d_bar.body_bottom()), a_bar.body_top()),
  };

  bias.exceeds(midpoint(low, high), e.price)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::Candle;

  fn history(pivots: &[Pivot]) -> PivotHistory {
    // oldest first
    let mut h = PivotHistory::new();
    for p in pivots {
      h.push(*p);
    }
    h
  }

  fn flat_bars(n: usize) -> Vec<Candle> {
    (0..n).map(|_| Candle::new(100.0, 101.0, 99.0, 100.0)).collect()
  }

  #[test]
  fn test_latch() {
    assert!(BreakLatch::None.allows(Bias::Bullish));
    assert!(BreakLatch::None.allows(Bias::Bearish));
    assert!(!BreakLatch::Bullish.allows(Bias::Bullish));
    assert!(BreakLatch::Bullish.allows(Bias::Bearish));
    assert!(!BreakLatch::Bearish.allows(Bias::Bearish));
  }

  #[test]
  fn test_reference_offset() {
    let h = history(&[Pivot::low(1, 9.0), Pivot::high(2, 12.0), Pivot::low(3, 10.0)]);
    // slot 2 is the low at bar 1
    assert_eq!(reference_offset(&h, PivotKind::High), 1);
    assert_eq!(reference_offset(&h, PivotKind::Low), 2);
  }

  #[test]
  fn test_swing_chain_needs_five_swings() {
    let h = history(&[
      Pivot::high(2, 108.0),
      Pivot::low(3, 101.0),
      Pivot::high(4, 106.0),
      Pivot::low(5, 99.0),
    ]);
    assert!(swing_chain(&h, Bias::Bullish).is_none());
  }

  #[test]
  fn test_bullish_chain_layout() {
    let h = history(&[
      Pivot::low(1, 100.0),
      Pivot::high(2, 108.0),
      Pivot::low(3, 101.0),
      Pivot::high(4, 106.0),
      Pivot::low(5, 99.0),
    ]);
    let chain = swing_chain(&h, Bias::Bullish).unwrap();
    assert_eq!(chain.e, Pivot::low(5, 99.0));
    assert_eq!(chain.d, Pivot::high(4, 106.0));
    assert_eq!(chain.c, Pivot::low(3, 101.0));
    assert_eq!(chain.b, Pivot::high(2, 108.0));
    assert_eq!(chain.a, Pivot::low(1, 100.0));
    assert_eq!(chain.older, None);
  }

  #[test]
  fn test_evaluate_requires_close_through_d() {
    let h = history(&[
      Pivot::low(1, 100.0),
      Pivot::high(2, 108.0),
      Pivot::low(3, 101.0),
      Pivot::high(4, 106.0),
      Pivot::low(5, 99.0),
    ]);
    let mut bars = flat_bars(7);
    bars[6] = Candle::new(100.0, 106.5, 99.5, 105.9);
    assert!(evaluate(&bars, 6, &h, BreakLatch::None, Bias::Bullish, false).is_none());

    bars[6] = Candle::new(100.0, 108.0, 99.5, 107.5);
    let brk = evaluate(&bars, 6, &h, BreakLatch::None, Bias::Bullish, false).unwrap();
    assert_eq!(brk.bias, Bias::Bullish);
    assert_eq!(brk.bar_index, 6);

    assert!(evaluate(&bars, 6, &h, BreakLatch::Bullish, Bias::Bullish, false).is_none());
  }

  #[test]
  fn test_evaluate_requires_lower_low() {
    let h = history(&[
      Pivot::low(1, 100.0),
      Pivot::high(2, 108.0),
      Pivot::low(3, 99.0),
      Pivot::high(4, 106.0),
      Pivot::low(5, 101.0),
    ]);
    let mut bars = flat_bars(7);
    bars[6] = Candle::new(100.0, 108.0, 99.5, 107.5);
    assert!(evaluate(&bars, 6, &h, BreakLatch::None, Bias::Bullish, false).is_none());
  }
}
