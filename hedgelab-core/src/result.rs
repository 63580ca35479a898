//! Result builder: turns a rule outcome into a `Decision` with diagnostics.
//!
//! Enforces the margin invariant: margin is present iff the signal opens or
//! adds (`signal != Hold && position_ratio < 1.0`). A missing margin is
//! back-filled (0.5 for single-side buys/sells, 1.0 for dual opens) and the
//! back-fill is flagged in metadata.

use crate::domain::{Decision, DecisionMetadata, Signal};
use crate::engine::{target_side, RuleOutcome};
use crate::guard::{GuardWarning, Rejection};
use crate::profit::ResolvedPosition;

pub const DEFAULT_SINGLE_SIDE_MARGIN: f64 = 0.5;
pub const DEFAULT_DUAL_OPEN_MARGIN: f64 = 1.0;

/// Per-call context shared by every decision built in that call.
#[derive(Debug, Clone, Default)]
pub struct BuildContext<'a> {
    pub strategy: &'a str,
    pub warnings: &'a [GuardWarning],
    pub fingerprint: Option<String>,
}

/// Build the decision for a snapshot that passed the guard.
pub fn build(outcome: RuleOutcome, resolved: &ResolvedPosition, ctx: &BuildContext<'_>) -> Decision {
    let position_ratio = outcome.position_ratio.clamp(0.0, 1.0);
    let confidence = outcome.confidence.clamp(0.0, 1.0);
    let needs_margin = !outcome.signal.is_hold() && position_ratio < 1.0;

    let mut margin_backfilled = false;
    let margin = match (needs_margin, outcome.margin) {
        (true, Some(m)) => Some(m),
        (true, None) => {
            let fill = match outcome.signal {
                Signal::DualOpen => DEFAULT_DUAL_OPEN_MARGIN,
                _ => DEFAULT_SINGLE_SIDE_MARGIN,
            };
            log::warn!(
                signal = outcome.signal.to_string().as_str(),
                side = target_side(&outcome).map_or("both", |s| s.as_str()),
                margin = fill;
                "open/add signal without margin, back-filling default"
            );
            margin_backfilled = true;
            Some(fill)
        }
        (false, Some(m)) => {
            log::warn!(margin = m; "dropping margin on hold or full close");
            None
        }
        (false, None) => None,
    };

    log::info!(
        signal = outcome.signal.to_string().as_str(),
        rule = outcome.rule.to_string().as_str(),
        position_ratio = position_ratio,
        margin = margin.unwrap_or(0.0),
        long_profit_pct = resolved.long.adjusted_profit_pct,
        short_profit_pct = resolved.short.adjusted_profit_pct;
        "{}",
        outcome.reason
    );

    let metadata = DecisionMetadata {
        reason: outcome.reason.clone(),
        strategy: Some(ctx.strategy.to_string()),
        rule: Some(outcome.rule.to_string()),
        add_position_type: outcome.rule.add_position_type().map(str::to_string),
        rejection: None,
        long: Some(resolved.long.diagnostics()),
        short: Some(resolved.short.diagnostics()),
        margin,
        margin_backfilled,
        cooldown: outcome.cooldown,
        warnings: warning_messages(ctx.warnings),
        input_fingerprint: ctx.fingerprint.clone(),
    };

    Decision {
        signal: outcome.signal,
        position_ratio,
        margin,
        confidence,
        reason: outcome.reason,
        metadata,
    }
}

/// Build the terminal hold for a snapshot the guard rejected.
pub fn rejected(rejection: &Rejection, ctx: &BuildContext<'_>) -> Decision {
    let mut decision = Decision::hold(rejection.message.clone());
    decision.metadata.strategy = Some(ctx.strategy.to_string());
    decision.metadata.rejection = Some(rejection.reason.to_string());
    decision.metadata.input_fingerprint = ctx.fingerprint.clone();
    decision
}

fn warning_messages(warnings: &[GuardWarning]) -> Vec<String> {
    warnings.iter().map(|w| w.message().to_string()).collect()
}
