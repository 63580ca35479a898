//! Market data and strategy parameters supplied alongside the position.

use serde::{Deserialize, Serialize};

/// Latest market observation for the symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub price: Option<f64>,
    pub timestamp_millis: Option<i64>,
}

impl MarketSnapshot {
    pub fn new(price: f64, timestamp_millis: i64) -> Self {
        Self {
            price: Some(price),
            timestamp_millis: Some(timestamp_millis),
        }
    }

    /// Market timestamp, or the wall clock when the feed sent none.
    pub fn now_millis(&self) -> i64 {
        match self.timestamp_millis {
            Some(ts) if ts > 0 => ts,
            _ => chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Fallback leg record from `strategyParams.oppositePositions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OppositePosition {
    pub is_short: bool,
    pub profit_count: Option<u32>,
    pub profit_pct: Option<f64>,
    pub add_count: Option<u32>,
    pub open_rate: Option<f64>,
    pub leverage: Option<f64>,
}

/// Recognised strategy parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyParams {
    /// Caller-configured leverage used when a leg carries none.
    pub leverage: Option<f64>,
    pub opposite_positions: Vec<OppositePosition>,
}

/// Account information. Not read by the dual-direction strategy; kept so every
/// strategy shares one call signature.
pub type Account = serde_json::Map<String, serde_json::Value>;
