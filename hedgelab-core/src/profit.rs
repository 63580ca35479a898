//! Profit normalizer: resolves per-leg fields and leverage-adjusted profit.
//!
//! Resolution order per leg:
//! 1. The leg's own fields.
//! 2. The matching `oppositePositions` record, but only when the leg carries
//!    neither a profit percentage nor a profit count. A reported zero is a
//!    real value and is never overridden.
//! 3. The price delta against the open rate, when profit is still unknown.
//!
//! All percentages are percentage points (`50.0` is 50%). Comparisons made by
//! the rule ladder use `adjusted_profit_pct = raw_profit_pct * leverage`.

use serde::{Deserialize, Serialize};

use crate::config::DualDirectionConfig;
use crate::domain::{LegDiagnostics, OppositePosition, PositionLeg, PositionSnapshot, Side, StrategyParams};

/// Where a leg's profit percentage came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfitSource {
    /// Reported on the position leg.
    Snapshot,
    /// Taken from the `oppositePositions` fallback record.
    Fallback,
    /// Derived from current price against the open rate.
    PriceDelta,
    /// Nothing available; treated as zero.
    Missing,
}

impl std::fmt::Display for ProfitSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfitSource::Snapshot => write!(f, "snapshot"),
            ProfitSource::Fallback => write!(f, "fallback"),
            ProfitSource::PriceDelta => write!(f, "price_delta"),
            ProfitSource::Missing => write!(f, "missing"),
        }
    }
}

/// A leg after resolution. Every field is concrete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLeg {
    pub side: Side,
    /// Clamped to be non-negative.
    pub quantity: f64,
    pub open_rate: Option<f64>,
    pub profit_count: u32,
    pub add_count: u32,
    pub leverage: f64,
    pub raw_profit_pct: f64,
    pub adjusted_profit_pct: f64,
    pub profit_source: ProfitSource,
}

impl ResolvedLeg {
    pub fn is_held(&self) -> bool {
        self.quantity > 0.0
    }

    pub fn diagnostics(&self) -> LegDiagnostics {
        LegDiagnostics {
            quantity: self.quantity,
            open_rate: self.open_rate,
            profit_count: self.profit_count,
            profit_pct: self.adjusted_profit_pct,
            raw_profit_pct: self.raw_profit_pct,
            leverage: self.leverage,
            add_count: self.add_count,
            profit_source: self.profit_source.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPosition {
    pub long: ResolvedLeg,
    pub short: ResolvedLeg,
}

impl ResolvedPosition {
    pub fn both_held(&self) -> bool {
        self.long.is_held() && self.short.is_held()
    }

    pub fn both_empty(&self) -> bool {
        !self.long.is_held() && !self.short.is_held()
    }

    /// The side that is held when exactly one leg is.
    pub fn single_held_side(&self) -> Option<Side> {
        match (self.long.is_held(), self.short.is_held()) {
            (true, false) => Some(Side::Long),
            (false, true) => Some(Side::Short),
            _ => None,
        }
    }
}

/// Resolve both legs against the current price.
pub fn normalize(
    position: &PositionSnapshot,
    params: &StrategyParams,
    price: f64,
    config: &DualDirectionConfig,
) -> ResolvedPosition {
    ResolvedPosition {
        long: resolve_leg(Side::Long, &position.long, params, price, config),
        short: resolve_leg(Side::Short, &position.short, params, price, config),
    }
}

fn resolve_leg(
    side: Side,
    leg: &PositionLeg,
    params: &StrategyParams,
    price: f64,
    config: &DualDirectionConfig,
) -> ResolvedLeg {
    let quantity = leg.held_quantity();

    let fallback = if leg.lacks_profit_fields() {
        find_fallback(side, &params.opposite_positions)
    } else {
        None
    };

    let (profit_count, profit_pct, add_count, open_rate, leg_leverage, reported_source) =
        match fallback {
            Some(opp) => {
                log::info!(
                    side = side.as_str(),
                    profit_pct = opp.profit_pct.unwrap_or(0.0);
                    "leg carries no profit fields, using oppositePositions record"
                );
                (
                    opp.profit_count,
                    opp.profit_pct,
                    opp.add_count,
                    opp.open_rate,
                    opp.leverage.or(leg.leverage),
                    ProfitSource::Fallback,
                )
            }
            None => (
                leg.profit_count,
                leg.profit_pct,
                leg.add_count,
                leg.open_rate,
                leg.leverage,
                ProfitSource::Snapshot,
            ),
        };

    let (raw_profit_pct, profit_source) = match profit_pct.filter(|p| p.is_finite()) {
        Some(pct) => (pct, reported_source),
        None => match open_rate.filter(|r| *r > 0.0) {
            Some(open) if quantity > 0.0 => {
                let pct = price_delta_pct(side, open, price);
                log::warn!(
                    side = side.as_str(),
                    profit_pct = pct;
                    "no profit reported, derived from price delta"
                );
                (pct, ProfitSource::PriceDelta)
            }
            _ => (0.0, ProfitSource::Missing),
        },
    };

    let leverage = resolve_leverage(leg_leverage, params.leverage, config.default_leverage);

    log::debug!(
        side = side.as_str(),
        quantity = quantity,
        raw_profit_pct = raw_profit_pct,
        leverage = leverage;
        "leg resolved"
    );

    ResolvedLeg {
        side,
        quantity,
        open_rate,
        profit_count: profit_count.unwrap_or(0),
        add_count: add_count.unwrap_or(0),
        leverage,
        raw_profit_pct,
        adjusted_profit_pct: raw_profit_pct * leverage,
        profit_source,
    }
}

fn find_fallback(side: Side, records: &[OppositePosition]) -> Option<&OppositePosition> {
    let want_short = side == Side::Short;
    records.iter().find(|r| r.is_short == want_short)
}

/// Unlevered profit of a leg from the move between open and current price.
pub fn price_delta_pct(side: Side, open_rate: f64, price: f64) -> f64 {
    match side {
        Side::Long => (price - open_rate) / open_rate * 100.0,
        Side::Short => (open_rate - price) / open_rate * 100.0,
    }
}

fn resolve_leverage(leg: Option<f64>, requested: Option<f64>, default: f64) -> f64 {
    let usable = |v: &f64| v.is_finite() && *v > 0.0;
    leg.filter(usable)
        .or_else(|| requested.filter(usable))
        .unwrap_or(default)
}
