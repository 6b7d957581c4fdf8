//! Breaker zone construction and the per-bar zone state machine.

use tracing::debug;

use super::{
  breaks::StructuralBreak,
  helpers::{candle_extremes, midpoint, strictly_between, Bias, SPREAD_EPSILON},
  signals::SignalLog,
};
use crate::{settings::Settings, Candle};

/// Reference price with a one-shot break flag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
  pub price: f64,
  pub broken: bool,
}

impl Line {
  pub fn new(price: f64) -> Self {
    Self {
      price,
      broken: false,
    }
  }
}

/// Take-profit level with a one-shot hit flag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TakeProfit {
  pub price: f64,
  pub hit: bool,
}

/// State of one breaker block instance
#[derive(Debug, Clone, PartialEq)]
pub struct BreakerZone {
  pub top: f64,
  pub bottom: f64,
  pub mid: f64,
  /// First and last bar of the origin candle(s)
  pub origin: (usize, usize),
  /// Bar whose close confirmed the break
  pub formed_at: usize,
  /// Scalp was cancelled; cleared again by a re-arm
  pub broken: bool,
  /// Terminal
  pub mitigated: bool,
  pub scalp_armed: bool,
  /// From the C and E swings
  pub swing_lines: [Line; 2],
  /// From older swings of the broken pivot's kind; absent when disabled
  pub pd_lines: [Option<Line>; 2],
  pub take_profits: [TakeProfit; 3],
}

impl BreakerZone {
  /// Carve a zone for a confirmed break.
  ///
  /// Scans back from `D` to `C` for the first candle of the break's colour.
  /// Returns `None` when that span holds no such candle.
  pub fn build(bars: &[Candle], brk: &StructuralBreak, settings: &Settings) -> Option<Self> {
    let bias = brk.bias;
    let chain = &brk.chain;
    let lo = chain.c.bar_index.min(chain.d.bar_index);
    let hi = chain.d.bar_index.max(chain.c.bar_index).min(bars.len().checked_sub(1)?);

    let found = (lo..=hi).rev().find(|&k| bias.is_origin_candle(&bars[k]))?;
    let (mut top, mut bottom) = candle_extremes(&bars[found], settings.zone_from_body_only);
    let mut start = found;

    if settings.merge_second_candle && found > 0 && bias.is_origin_candle(&bars[found - 1]) {
      let (prev_top, prev_bottom) =
        candle_extremes(&bars[found - 1], settings.zone_from_body_only);
      if prev_top > top || prev_bottom < bottom {
        start = found - 1;
      }
      top = top.max(prev_top);
      bottom = bottom.min(prev_bottom);
    }

    // Unlike the swing-line toggle, this one removes the lines and their breaks.
    let pd_lines = if settings.show_premium_discount_lines {
      [Some(Line::new(chain.b.price)), chain.older.map(|p| Line::new(p.price))]
    } else {
      [None, None]
    };

    let mut zone = Self {
      top,
      bottom,
      mid: midpoint(top, bottom),
      origin: (start, found),
      formed_at: brk.bar_index,
      broken: false,
      mitigated: false,
      scalp_armed: false,
      swing_lines: [Line::new(chain.c.price), Line::new(chain.e.price)],
      pd_lines,
      take_profits: [TakeProfit {
        price: 0.0,
        hit: false,
      }; 3],
    };
    zone.take_profits = zone.take_profit_levels(bias, settings);

    debug!(
      bias = ?bias,
      bar = brk.bar_index,
      top,
      bottom,
      origin_start = start,
      origin_end = found,
      "breaker zone formed"
    );

    Some(zone)
  }

  fn take_profit_levels(&self, bias: Bias, settings: &Settings) -> [TakeProfit; 3] {
    let spread = (self.top - self.bottom).max(SPREAD_EPSILON);
    let front = self.front(bias);
    settings.risk_rewards().map(|rr| TakeProfit {
      price: front + f64::from(bias.sign()) * spread * rr,
      hit: false,
    })
  }

  /// Edge facing the break direction (top for bullish)
  #[inline]
  pub fn front(&self, bias: Bias) -> f64 {
    match bias {
      Bias::Bullish => self.top,
      Bias::Bearish => self.bottom,
    }
  }

  /// Edge whose close-through mitigates the zone (bottom for bullish)
  #[inline]
  pub fn far(&self, bias: Bias) -> f64 {
    match bias {
      Bias::Bullish => self.bottom,
      Bias::Bearish => self.top,
    }
  }

  fn clear_take_profits(&mut self) {
    for tp in &mut self.take_profits {
      tp.hit = false;
    }
  }

  /// Advance the state machine by one bar.
  pub fn step(
    &mut self,
    bias: Bias,
    candle: &Candle,
    index: usize,
    settings: &Settings,
    log: &mut SignalLog,
  ) {
    if self.mitigated {
      return;
    }
    let keys = bias.signals();
    let front = self.front(bias);
    let far = self.far(bias);

    if bias.exceeds(far, candle.close) {
      self.mitigated = true;
      log.emit(index, candle, keys.mitigated, candle.close);
    } else if !self.broken {
      if self.scalp_armed && settings.take_profit_enabled {
        for (tp, key) in self.take_profits.iter_mut().zip(keys.take_profit) {
          if !tp.hit
            && bias.exceeds(tp.price, candle.open)
            && bias.exceeds(bias.reach(candle), tp.price)
          {
            tp.hit = true;
            log.emit(index, candle, key, tp.price);
          }
        }
      }

      if !self.scalp_armed
        && strictly_between(candle.open, self.mid, front)
        && bias.exceeds(candle.close, front)
      {
        self.scalp_armed = true;
        self.clear_take_profits();
        log.emit(index, candle, keys.armed, candle.close);
      }

      if strictly_between(candle.close, far, self.mid) {
        self.scalp_armed = false;
        self.broken = true;
        log.emit(index, candle, keys.cancelled, candle.close);
      }
    } else if !settings.persist_until_first_break && bias.exceeds(candle.close, front) {
      self.broken = false;
      self.scalp_armed = false;
      self.clear_take_profits();
      log.emit(index, candle, keys.formed, bias.break_event_price(candle));
    }

    for (line, key) in self.swing_lines.iter_mut().zip(keys.swing_break) {
      if !line.broken && bias.exceeds(line.price, candle.close) {
        line.broken = true;
        log.emit(index, candle, key, line.price);
      }
    }

    if index > self.origin.0 {
      for (slot, key) in self.pd_lines.iter_mut().zip(keys.pd_break) {
        if let Some(line) = slot {
          if !line.broken && bias.exceeds(candle.close, line.price) {
            line.broken = true;
            log.emit(index, candle, key, line.price);
          }
        }
      }
    }
  }
}

/// The single current zone. A new break of either polarity replaces it.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ActiveZone {
  #[default]
  None,
  Bullish(BreakerZone),
  Bearish(BreakerZone),
}

impl ActiveZone {
  pub fn new(bias: Bias, zone: BreakerZone) -> Self {
    match bias {
      Bias::Bullish => ActiveZone::Bullish(zone),
      Bias::Bearish => ActiveZone::Bearish(zone),
    }
  }

  pub fn bias(&self) -> Option<Bias> {
    match self {
      ActiveZone::None => None,
      ActiveZone::Bullish(_) => Some(Bias::Bullish),
      ActiveZone::Bearish(_) => Some(Bias::Bearish),
    }
  }

  pub fn zone(&self) -> Option<&BreakerZone> {
    match self {
      ActiveZone::None => None,
      ActiveZone::Bullish(z) | ActiveZone::Bearish(z) => Some(z),
    }
  }

  /// `+1`, `-1`, or `0` without a zone
  pub fn direction(&self) -> i8 {
    self.bias().map_or(0, Bias::sign)
  }

  /// Zone present and not yet mitigated
  pub fn is_live(&self) -> bool {
    self.zone().is_some_and(|z| !z.mitigated)
  }

  pub fn step(
    &mut self,
    candle: &Candle,
    index: usize,
    settings: &Settings,
    log: &mut SignalLog,
  ) {
    match self {
      ActiveZone::None => {}
      ActiveZone::Bullish(z) => z.step(Bias::Bullish, candle, index, settings, log),
      ActiveZone::Bearish(z) => z.step(Bias::Bearish, candle, index, settings, log),
    }
  }
}
