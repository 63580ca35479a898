//! Decision output: one signal per cycle plus sizing and diagnostics.

use serde::{Deserialize, Serialize};

use super::position::Side;

/// Trading action for the cycle.
///
/// `Buy`/`Sell` are interpreted together with `position_ratio`: a ratio of
/// `1.0` closes the opposite leg entirely (sell closes a long, buy closes a
/// short), anything below opens or adds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    Hold,
    Buy,
    Sell,
    /// Open both legs at once.
    DualOpen,
}

impl Signal {
    pub fn is_hold(&self) -> bool {
        matches!(self, Signal::Hold)
    }

    /// Signal that opens or adds to the given side.
    pub fn opening(side: Side) -> Self {
        match side {
            Side::Long => Signal::Buy,
            Side::Short => Signal::Sell,
        }
    }

    /// Signal that fully closes the given side.
    pub fn closing(side: Side) -> Self {
        match side {
            Side::Long => Signal::Sell,
            Side::Short => Signal::Buy,
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Hold => write!(f, "HOLD"),
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
            Signal::DualOpen => write!(f, "DUAL_OPEN"),
        }
    }
}

/// Resolved per-leg values reported back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegDiagnostics {
    pub quantity: f64,
    pub open_rate: Option<f64>,
    pub profit_count: u32,
    /// Leverage-adjusted profit percentage.
    pub profit_pct: f64,
    pub raw_profit_pct: f64,
    pub leverage: f64,
    pub add_count: u32,
    pub profit_source: String,
}

/// Diagnostic fields attached to every decision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionMetadata {
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    /// Ladder rule that produced the signal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    /// `REBALANCE` or `ADD` on opens the backend must not miscount as adds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_position_type: Option<String>,
    /// Guard rejection kind, set only on rejected snapshots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long: Option<LegDiagnostics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<LegDiagnostics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin: Option<f64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub margin_backfilled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_fingerprint: Option<String>,
}

/// Output of one decision cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub signal: Signal,
    /// Share of the position the signal applies to, in `[0, 1]`.
    pub position_ratio: f64,
    /// Quote-currency sizing of an open or add. `None` for holds and full closes.
    pub margin: Option<f64>,
    pub confidence: f64,
    pub reason: String,
    pub metadata: DecisionMetadata,
}

impl Decision {
    /// Zero-confidence hold carrying only a reason.
    pub fn hold(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            signal: Signal::Hold,
            position_ratio: 0.0,
            margin: None,
            confidence: 0.0,
            metadata: DecisionMetadata {
                reason: reason.clone(),
                ..Default::default()
            },
            reason,
        }
    }

    pub fn is_full_close(&self) -> bool {
        !self.signal.is_hold() && self.position_ratio >= 1.0
    }

    /// Margin is present iff the signal opens or adds.
    pub fn satisfies_margin_invariant(&self) -> bool {
        let needs_margin = !self.signal.is_hold() && self.position_ratio < 1.0;
        needs_margin == self.margin.is_some()
    }
}
