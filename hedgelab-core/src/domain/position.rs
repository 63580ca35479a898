//! Hedged position state as supplied by the caller for one decision cycle.

use serde::{Deserialize, Serialize};

/// One direction of a hedged position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn opposite(&self) -> Self {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Long => "long",
            Side::Short => "short",
        }
    }

    /// Parse the free-text side labels the backend sends (`"long"`, `"SHORT"`, ...).
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "long" | "buy" => Some(Side::Long),
            "short" | "sell" => Some(Side::Short),
            _ => None,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One leg of the hedge.
///
/// Optional fields distinguish "not supplied" from "supplied as zero": an
/// absent profit field lets the normalizer fall back to a secondary source,
/// a present zero is taken as the real value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionLeg {
    pub quantity: f64,
    pub open_rate: Option<f64>,
    pub profit_count: Option<u32>,
    /// Profit relative to margin, in percentage points, not leverage-adjusted.
    pub profit_pct: Option<f64>,
    pub add_count: Option<u32>,
    pub leverage: Option<f64>,
}

impl PositionLeg {
    /// Quantity clamped to be non-negative.
    pub fn held_quantity(&self) -> f64 {
        self.quantity.max(0.0)
    }

    pub fn is_held(&self) -> bool {
        self.held_quantity() > 0.0
    }

    /// Both profit fields absent: the feed did not report profit for this leg.
    pub fn lacks_profit_fields(&self) -> bool {
        self.profit_pct.is_none() && self.profit_count.is_none()
    }
}

/// A close that happened recently on one side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentCloseEvent {
    /// `None` when the backend sent a label that is not a recognised side.
    pub side: Option<Side>,
    pub close_time_millis: i64,
}

/// Both legs plus feed status and recent close history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub long: PositionLeg,
    pub short: PositionLeg,
    pub fetch_success: bool,
    pub error: Option<String>,
    pub recent_closes: Vec<RecentCloseEvent>,
}

impl Default for PositionSnapshot {
    fn default() -> Self {
        Self {
            long: PositionLeg::default(),
            short: PositionLeg::default(),
            fetch_success: true,
            error: None,
            recent_closes: Vec::new(),
        }
    }
}

impl PositionSnapshot {
    pub fn leg(&self, side: Side) -> &PositionLeg {
        match side {
            Side::Long => &self.long,
            Side::Short => &self.short,
        }
    }
}
