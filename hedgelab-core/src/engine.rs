//! Decision engine: fixed priority ladder, first matching rule wins.
//!
//! 1. Rebalance: exactly one leg held → open the missing leg (held back by cooldown)
//! 2. Close: both legs held and one leg's adjusted profit reaches the threshold
//! 3. Add: profit cycles on one leg finance an add on the losing other leg
//! 4. Initial open: both legs empty → open both
//! 5. Hold
//!
//! Rebalance sits above close. The two preconditions are disjoint (one leg
//! held vs. both held), so the order never changes an outcome; it records that
//! a one-sided hedge is the most urgent state to correct.

use serde::{Deserialize, Serialize};

use crate::config::DualDirectionConfig;
use crate::cooldown::CooldownStatus;
use crate::domain::{Side, Signal};
use crate::profit::{ResolvedLeg, ResolvedPosition};

pub const OPEN_RATIO: f64 = 0.5;
pub const CLOSE_RATIO: f64 = 1.0;

const OPEN_CONFIDENCE: f64 = 0.6;
const ADD_CONFIDENCE: f64 = 0.7;
const CLOSE_CONFIDENCE: f64 = 0.9;

/// Ladder rule that produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rule {
    Rebalance,
    /// Rebalance matched but a recent close holds it back.
    Cooldown,
    Close,
    Add,
    InitialOpen,
    Default,
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rule::Rebalance => write!(f, "rebalance"),
            Rule::Cooldown => write!(f, "cooldown"),
            Rule::Close => write!(f, "close"),
            Rule::Add => write!(f, "add"),
            Rule::InitialOpen => write!(f, "initial_open"),
            Rule::Default => write!(f, "default"),
        }
    }
}

impl Rule {
    /// `addPositionType` marker the backend uses to tell a rebalance open
    /// from an add when it updates the add counter.
    pub fn add_position_type(&self) -> Option<&'static str> {
        match self {
            Rule::Rebalance => Some("REBALANCE"),
            Rule::Add => Some("ADD"),
            _ => None,
        }
    }
}

/// Raw engine output before the result builder enforces invariants.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    pub rule: Rule,
    pub signal: Signal,
    pub position_ratio: f64,
    pub margin: Option<f64>,
    pub confidence: f64,
    pub reason: String,
    pub cooldown: Option<String>,
}

impl RuleOutcome {
    fn hold(rule: Rule, reason: String) -> Self {
        Self {
            rule,
            signal: Signal::Hold,
            position_ratio: 0.0,
            margin: None,
            confidence: 0.0,
            reason,
            cooldown: None,
        }
    }
}

/// Run the ladder over a resolved position.
pub fn evaluate(
    position: &ResolvedPosition,
    cooldown: &CooldownStatus,
    config: &DualDirectionConfig,
) -> RuleOutcome {
    rebalance(position, cooldown, config)
        .or_else(|| close(position, config))
        .or_else(|| add(position, cooldown, config))
        .or_else(|| initial_open(position, config))
        .unwrap_or_else(|| default_hold(position, config))
}

/// Rule 1: open the missing leg of a one-sided hedge.
pub fn rebalance(
    position: &ResolvedPosition,
    cooldown: &CooldownStatus,
    config: &DualDirectionConfig,
) -> Option<RuleOutcome> {
    let held = position.single_held_side()?;
    let missing = held.opposite();

    if let Some(note) = cooldown.describe() {
        let mut outcome = RuleOutcome::hold(
            Rule::Cooldown,
            format!("only {held} leg held, not reopening {missing}: {note}"),
        );
        outcome.cooldown = Some(note);
        return Some(outcome);
    }

    Some(RuleOutcome {
        rule: Rule::Rebalance,
        signal: Signal::opening(missing),
        position_ratio: OPEN_RATIO,
        margin: Some(config.open_margin),
        confidence: OPEN_CONFIDENCE,
        reason: format!("only {held} leg held, opening {missing} to restore the hedge"),
        cooldown: None,
    })
}

/// Rule 2: close a leg whose adjusted profit reached the threshold.
pub fn close(position: &ResolvedPosition, config: &DualDirectionConfig) -> Option<RuleOutcome> {
    if !position.both_held() {
        return None;
    }
    [&position.long, &position.short]
        .into_iter()
        .find(|leg| leg.adjusted_profit_pct >= config.close_threshold_pct)
        .map(|leg| RuleOutcome {
            rule: Rule::Close,
            signal: Signal::closing(leg.side),
            position_ratio: CLOSE_RATIO,
            margin: None,
            confidence: CLOSE_CONFIDENCE,
            reason: format!(
                "{} profit {:.2}% reached close threshold {:.2}%",
                leg.side, leg.adjusted_profit_pct, config.close_threshold_pct
            ),
            cooldown: None,
        })
}

/// Rule 3: long-driven add on the short leg, then short-driven add on the long leg.
pub fn add(
    position: &ResolvedPosition,
    cooldown: &CooldownStatus,
    config: &DualDirectionConfig,
) -> Option<RuleOutcome> {
    add_against(&position.long, &position.short, cooldown, config)
        .or_else(|| add_against(&position.short, &position.long, cooldown, config))
}

fn add_against(
    driver: &ResolvedLeg,
    target: &ResolvedLeg,
    cooldown: &CooldownStatus,
    config: &DualDirectionConfig,
) -> Option<RuleOutcome> {
    if !driver.is_held() || driver.profit_count < config.add_profit_cycles {
        return None;
    }
    // Zero cycles never funds an add.
    let max_add = driver.profit_count.checked_div(config.add_profit_cycles)?;

    let reason = if target.is_held() {
        if target.adjusted_profit_pct >= 0.0 || target.add_count >= max_add {
            return None;
        }
        format!(
            "{} profited {} times, {} losing {:.2}%, adding ({}/{max_add} used)",
            driver.side, driver.profit_count, target.side, target.adjusted_profit_pct, target.add_count
        )
    } else {
        if cooldown.is_active() {
            return None;
        }
        format!(
            "{} profited {} times, {} leg empty, opening it",
            driver.side, driver.profit_count, target.side
        )
    };

    Some(RuleOutcome {
        rule: Rule::Add,
        signal: Signal::opening(target.side),
        position_ratio: OPEN_RATIO,
        margin: Some(config.add_margin),
        confidence: ADD_CONFIDENCE,
        reason,
        cooldown: None,
    })
}

/// Rule 4: nothing held, open both legs.
pub fn initial_open(
    position: &ResolvedPosition,
    config: &DualDirectionConfig,
) -> Option<RuleOutcome> {
    if !position.both_empty() {
        return None;
    }
    Some(RuleOutcome {
        rule: Rule::InitialOpen,
        signal: Signal::DualOpen,
        position_ratio: OPEN_RATIO,
        margin: Some(config.open_margin),
        confidence: OPEN_CONFIDENCE,
        reason: format!(
            "no position, opening long and short ({} each)",
            config.open_margin
        ),
        cooldown: None,
    })
}

fn default_hold(position: &ResolvedPosition, config: &DualDirectionConfig) -> RuleOutcome {
    RuleOutcome::hold(
        Rule::Default,
        format!(
            "no rule matched: long {:.2}%, short {:.2}% (close at {:.2}%)",
            position.long.adjusted_profit_pct,
            position.short.adjusted_profit_pct,
            config.close_threshold_pct
        ),
    )
}

/// Side an outcome opens or adds to, if any.
pub fn target_side(outcome: &RuleOutcome) -> Option<Side> {
    match (outcome.signal, outcome.position_ratio < CLOSE_RATIO) {
        (Signal::Buy, true) => Some(Side::Long),
        (Signal::Sell, true) => Some(Side::Short),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profit::ProfitSource;

    fn leg(side: Side, quantity: f64, adjusted: f64, profit_count: u32, add_count: u32) -> ResolvedLeg {
        ResolvedLeg {
            side,
            quantity,
            open_rate: if quantity > 0.0 { Some(100.0) } else { None },
            profit_count,
            add_count,
            leverage: 50.0,
            raw_profit_pct: adjusted / 50.0,
            adjusted_profit_pct: adjusted,
            profit_source: ProfitSource::Snapshot,
        }
    }

    fn position(long: ResolvedLeg, short: ResolvedLeg) -> ResolvedPosition {
        ResolvedPosition { long, short }
    }

    fn active() -> CooldownStatus {
        CooldownStatus::Active {
            side: Some(Side::Short),
            elapsed_secs: 10.0,
            window_secs: 60,
        }
    }

    fn cfg() -> DualDirectionConfig {
        DualDirectionConfig::default()
    }

    #[test]
    fn test_rebalance_opens_missing_short() {
        let p = position(leg(Side::Long, 10.0, 500.0, 0, 0), leg(Side::Short, 0.0, 0.0, 0, 0));
        let out = evaluate(&p, &CooldownStatus::Clear, &cfg());
        assert_eq!(out.rule, Rule::Rebalance);
        assert_eq!(out.signal, Signal::Sell);
        assert_eq!(out.position_ratio, 0.5);
        assert_eq!(out.margin, Some(1.0));
        assert_eq!(out.confidence, 0.6);
    }

    #[test]
    fn test_rebalance_opens_missing_long() {
        let p = position(leg(Side::Long, 0.0, 0.0, 0, 0), leg(Side::Short, 3.0, -5.0, 0, 0));
        let out = evaluate(&p, &CooldownStatus::Clear, &cfg());
        assert_eq!(out.signal, Signal::Buy);
        assert_eq!(target_side(&out), Some(Side::Long));
    }

    #[test]
    fn test_cooldown_holds_rebalance() {
        let p = position(leg(Side::Long, 10.0, 0.0, 8, 0), leg(Side::Short, 0.0, 0.0, 0, 0));
        let out = evaluate(&p, &active(), &cfg());
        assert_eq!(out.rule, Rule::Cooldown);
        assert_eq!(out.signal, Signal::Hold);
        assert_eq!(out.confidence, 0.0);
        assert!(out.cooldown.is_some());
    }

    #[test]
    fn test_close_long_first() {
        let p = position(leg(Side::Long, 10.0, 60.0, 0, 0), leg(Side::Short, 10.0, 70.0, 0, 0));
        let out = evaluate(&p, &CooldownStatus::Clear, &cfg());
        assert_eq!(out.rule, Rule::Close);
        assert_eq!(out.signal, Signal::Sell);
        assert_eq!(out.position_ratio, 1.0);
        assert_eq!(out.margin, None);
        assert_eq!(out.confidence, 0.9);
    }

    #[test]
    fn test_close_short() {
        let p = position(leg(Side::Long, 10.0, -20.0, 0, 0), leg(Side::Short, 10.0, 50.0, 0, 0));
        let out = evaluate(&p, &CooldownStatus::Clear, &cfg());
        assert_eq!(out.signal, Signal::Buy);
        assert_eq!(out.position_ratio, 1.0);
    }

    #[test]
    fn test_close_not_suppressed_by_cooldown() {
        let p = position(leg(Side::Long, 10.0, 55.0, 0, 0), leg(Side::Short, 10.0, 0.0, 0, 0));
        let out = evaluate(&p, &active(), &cfg());
        assert_eq!(out.rule, Rule::Close);
    }

    #[test]
    fn test_add_to_losing_short() {
        let p = position(leg(Side::Long, 10.0, 10.0, 8, 0), leg(Side::Short, 5.0, -10.0, 0, 1));
        let out = evaluate(&p, &CooldownStatus::Clear, &cfg());
        assert_eq!(out.rule, Rule::Add);
        assert_eq!(out.signal, Signal::Sell);
        assert_eq!(out.margin, Some(0.5));
        assert_eq!(out.confidence, 0.7);
    }

    #[test]
    fn test_add_exhausted_holds() {
        let p = position(leg(Side::Long, 10.0, 10.0, 8, 0), leg(Side::Short, 5.0, -10.0, 0, 2));
        let out = evaluate(&p, &CooldownStatus::Clear, &cfg());
        assert_eq!(out.rule, Rule::Default);
        assert_eq!(out.signal, Signal::Hold);
    }

    #[test]
    fn test_add_requires_loss() {
        let p = position(leg(Side::Long, 10.0, 10.0, 4, 0), leg(Side::Short, 5.0, 0.0, 0, 0));
        assert!(add(&p, &CooldownStatus::Clear, &cfg()).is_none());
    }

    #[test]
    fn test_short_driven_add_to_long() {
        let p = position(leg(Side::Long, 5.0, -3.0, 0, 0), leg(Side::Short, 10.0, 5.0, 4, 0));
        let out = evaluate(&p, &CooldownStatus::Clear, &cfg());
        assert_eq!(out.rule, Rule::Add);
        assert_eq!(out.signal, Signal::Buy);
    }

    #[test]
    fn test_long_driver_without_match_falls_to_short_driver() {
        let p = position(leg(Side::Long, 5.0, -3.0, 4, 0), leg(Side::Short, 10.0, 5.0, 4, 0));
        let out = add(&p, &CooldownStatus::Clear, &cfg()).unwrap();
        assert_eq!(out.signal, Signal::Buy);
    }

    #[test]
    fn test_add_opens_empty_target_outside_cooldown() {
        let p = position(leg(Side::Long, 10.0, 5.0, 4, 0), leg(Side::Short, 0.0, 0.0, 0, 0));
        let out = add(&p, &CooldownStatus::Clear, &cfg()).unwrap();
        assert_eq!(out.signal, Signal::Sell);
        assert_eq!(out.margin, Some(0.5));
        assert!(add(&p, &active(), &cfg()).is_none());
    }

    #[test]
    fn test_initial_open() {
        let p = position(leg(Side::Long, 0.0, 0.0, 0, 0), leg(Side::Short, 0.0, 0.0, 0, 0));
        let out = evaluate(&p, &CooldownStatus::Clear, &cfg());
        assert_eq!(out.rule, Rule::InitialOpen);
        assert_eq!(out.signal, Signal::DualOpen);
        assert_eq!(out.position_ratio, 0.5);
        assert_eq!(out.margin, Some(1.0));
        assert_eq!(target_side(&out), None);
    }

    #[test]
    fn test_initial_open_ignores_cooldown() {
        let p = position(leg(Side::Long, 0.0, 0.0, 0, 0), leg(Side::Short, 0.0, 0.0, 0, 0));
        let out = evaluate(&p, &active(), &cfg());
        assert_eq!(out.signal, Signal::DualOpen);
    }

    #[test]
    fn test_zero_cycles_disables_add() {
        let config = DualDirectionConfig {
            add_profit_cycles: 0,
            ..Default::default()
        };
        let p = position(leg(Side::Long, 10.0, 10.0, 8, 0), leg(Side::Short, 5.0, -10.0, 0, 0));
        assert_eq!(add(&p, &CooldownStatus::Clear, &config), None);
        assert_eq!(evaluate(&p, &CooldownStatus::Clear, &config).rule, Rule::Default);
    }

    #[test]
    fn test_add_position_type_marks_rebalance_and_add() {
        assert_eq!(Rule::Rebalance.add_position_type(), Some("REBALANCE"));
        assert_eq!(Rule::Add.add_position_type(), Some("ADD"));
        assert_eq!(Rule::InitialOpen.add_position_type(), None);
        assert_eq!(Rule::Close.add_position_type(), None);
    }

    #[test]
    fn test_configured_threshold() {
        let config = DualDirectionConfig {
            close_threshold_pct: 20.0,
            ..Default::default()
        };
        let p = position(leg(Side::Long, 10.0, 25.0, 0, 0), leg(Side::Short, 10.0, -25.0, 0, 0));
        assert_eq!(evaluate(&p, &CooldownStatus::Clear, &config).rule, Rule::Close);
        assert_eq!(evaluate(&p, &CooldownStatus::Clear, &cfg()).rule, Rule::Default);
    }
}
