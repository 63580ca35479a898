//! JSON wire format exchanged with the trading backend.
//!
//! Field names follow the backend's camelCase payloads. Numeric fields accept
//! JSON numbers or numeric strings (serialized decimals); `null` and empty
//! strings read as absent. A `null` list, flag or section reads as its empty
//! default. Anything else fails deserialization, which the
//! service shell reports as a safe hold.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    Account, Decision, DecisionMetadata, MarketSnapshot, OppositePosition, PositionLeg,
    PositionSnapshot, RecentCloseEvent, Side, Signal, StrategyParams,
};

#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed request payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Lenient numeric deserializers for backend payloads.
pub mod lenient {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn number<E: Error>(value: Value) -> Result<Option<f64>, E> {
        match value {
            Value::Null => Ok(None),
            Value::Number(n) => n
                .as_f64()
                .map(Some)
                .ok_or_else(|| E::custom(format!("number out of range: {n}"))),
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                trimmed
                    .parse::<f64>()
                    .map(Some)
                    .map_err(|_| E::custom(format!("expected a number, got {s:?}")))
            }
            other => Err(E::custom(format!("expected a number, got {other}"))),
        }
    }

    pub fn f64_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        number(Value::deserialize(d)?)
    }

    /// Non-negative integral count.
    pub fn u32_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        match number::<D::Error>(Value::deserialize(d)?)? {
            None => Ok(None),
            Some(x) if x.is_finite() && x >= 0.0 && x.fract() == 0.0 && x <= u32::MAX as f64 => {
                Ok(Some(x as u32))
            }
            Some(x) => Err(D::Error::custom(format!(
                "expected a non-negative integer count, got {x}"
            ))),
        }
    }

    /// `null` reads as the type's default, like a missing key.
    pub fn null_default<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
    }

    /// Epoch milliseconds; fractional parts are truncated.
    pub fn i64_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        match number::<D::Error>(Value::deserialize(d)?)? {
            None => Ok(None),
            Some(x) if x.is_finite() => Ok(Some(x.trunc() as i64)),
            Some(x) => Err(D::Error::custom(format!("expected a timestamp, got {x}"))),
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMarketData {
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::i64_opt")]
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireOppositePosition {
    #[serde(default, deserialize_with = "lenient::null_default")]
    pub is_short: bool,
    #[serde(default, deserialize_with = "lenient::u32_opt")]
    pub profit_count: Option<u32>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub profit_pct: Option<f64>,
    #[serde(default, deserialize_with = "lenient::u32_opt")]
    pub add_count: Option<u32>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub open_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub leverage: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRecentClose {
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default, deserialize_with = "lenient::i64_opt")]
    pub close_time: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireStrategyParams {
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub leverage: Option<f64>,
    #[serde(default, deserialize_with = "lenient::null_default")]
    pub opposite_positions: Vec<WireOppositePosition>,
    #[serde(default, deserialize_with = "lenient::null_default")]
    pub recent_close_positions: Vec<WireRecentClose>,
}

/// Flat position record as sent by the backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePosition {
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub long_quantity: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub long_open_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient::u32_opt")]
    pub long_profit_count: Option<u32>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub long_profit_pct: Option<f64>,
    #[serde(default, deserialize_with = "lenient::u32_opt")]
    pub long_add_count: Option<u32>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub long_leverage: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub short_quantity: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub short_open_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient::u32_opt")]
    pub short_profit_count: Option<u32>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub short_profit_pct: Option<f64>,
    #[serde(default, deserialize_with = "lenient::u32_opt")]
    pub short_add_count: Option<u32>,
    #[serde(default, deserialize_with = "lenient::f64_opt")]
    pub short_leverage: Option<f64>,
    #[serde(rename = "_fetchSuccess", default = "default_true")]
    pub fetch_success: bool,
    #[serde(rename = "_error", default)]
    pub error: Option<String>,
}

impl Default for WirePosition {
    fn default() -> Self {
        Self {
            long_quantity: None,
            long_open_rate: None,
            long_profit_count: None,
            long_profit_pct: None,
            long_add_count: None,
            long_leverage: None,
            short_quantity: None,
            short_open_rate: None,
            short_profit_count: None,
            short_profit_pct: None,
            short_add_count: None,
            short_leverage: None,
            fetch_success: true,
            error: None,
        }
    }
}

/// Request body of `execute`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyRequest {
    pub strategy_name: String,
    pub symbol: String,
    #[serde(default, deserialize_with = "lenient::null_default")]
    pub market_data: WireMarketData,
    #[serde(default, deserialize_with = "lenient::null_default")]
    pub strategy_params: WireStrategyParams,
    #[serde(default, deserialize_with = "lenient::null_default")]
    pub position: WirePosition,
    #[serde(default, deserialize_with = "lenient::null_default")]
    pub account: Account,
}

/// Domain inputs of one `Strategy::decide` call.
#[derive(Debug, Clone)]
pub struct DecisionInput {
    pub symbol: String,
    pub market: MarketSnapshot,
    pub params: StrategyParams,
    pub position: PositionSnapshot,
    pub account: Account,
}

impl StrategyRequest {
    pub fn from_json(payload: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(payload)?)
    }

    /// Translate the wire payload into domain snapshots.
    pub fn into_input(self) -> DecisionInput {
        let StrategyRequest {
            symbol,
            market_data,
            strategy_params,
            position,
            account,
            ..
        } = self;

        let recent_closes = strategy_params
            .recent_close_positions
            .into_iter()
            .map(|c| RecentCloseEvent {
                side: c.side.as_deref().and_then(Side::parse),
                close_time_millis: c.close_time.unwrap_or(0),
            })
            .collect();

        let params = StrategyParams {
            leverage: strategy_params.leverage,
            opposite_positions: strategy_params
                .opposite_positions
                .into_iter()
                .map(|o| OppositePosition {
                    is_short: o.is_short,
                    profit_count: o.profit_count,
                    profit_pct: o.profit_pct,
                    add_count: o.add_count,
                    open_rate: o.open_rate,
                    leverage: o.leverage,
                })
                .collect(),
        };

        let position = PositionSnapshot {
            long: PositionLeg {
                quantity: position.long_quantity.unwrap_or(0.0),
                open_rate: position.long_open_rate,
                profit_count: position.long_profit_count,
                profit_pct: position.long_profit_pct,
                add_count: position.long_add_count,
                leverage: position.long_leverage,
            },
            short: PositionLeg {
                quantity: position.short_quantity.unwrap_or(0.0),
                open_rate: position.short_open_rate,
                profit_count: position.short_profit_count,
                profit_pct: position.short_profit_pct,
                add_count: position.short_add_count,
                leverage: position.short_leverage,
            },
            fetch_success: position.fetch_success,
            error: position.error,
            recent_closes,
        };

        DecisionInput {
            symbol,
            market: MarketSnapshot {
                price: market_data.price,
                timestamp_millis: market_data.timestamp,
            },
            params,
            position,
            account,
        }
    }
}

/// Response body of `execute`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyResponse {
    pub signal: Signal,
    pub position: f64,
    pub target_price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub confidence: f64,
    #[serde(default)]
    pub metadata: DecisionMetadata,
    pub error: Option<String>,
}

impl StrategyResponse {
    /// Safe default returned for any fault outside the guard's checks.
    pub fn failure(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            signal: Signal::Hold,
            position: 0.0,
            target_price: None,
            stop_loss: None,
            take_profit: None,
            confidence: 0.0,
            metadata: DecisionMetadata {
                reason: format!("strategy execution failed: {error}"),
                ..Default::default()
            },
            error: Some(error),
        }
    }
}

impl From<Decision> for StrategyResponse {
    fn from(decision: Decision) -> Self {
        Self {
            signal: decision.signal,
            position: decision.position_ratio,
            target_price: None,
            stop_loss: None,
            take_profit: None,
            confidence: decision.confidence,
            metadata: decision.metadata,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_strings_and_numbers() {
        let payload = r#"{
            "strategyName": "dual_direction_strategy",
            "symbol": "BTCUSDT",
            "marketData": {"price": "65000.5", "timestamp": 1700000000000},
            "strategyParams": {"leverage": 20},
            "position": {"longQuantity": "0.010", "longOpenRate": 64000, "longProfitCount": "3"},
            "account": {"balance": 100}
        }"#;
        let input = StrategyRequest::from_json(payload).unwrap().into_input();
        assert_eq!(input.market.price, Some(65000.5));
        assert_eq!(input.market.timestamp_millis, Some(1_700_000_000_000));
        assert_eq!(input.params.leverage, Some(20.0));
        assert_eq!(input.position.long.quantity, 0.01);
        assert_eq!(input.position.long.profit_count, Some(3));
        assert_eq!(input.position.long.profit_pct, None);
        assert!(input.position.fetch_success);
        assert_eq!(input.account.len(), 1);
    }

    #[test]
    fn test_null_and_empty_are_absent() {
        let payload = r#"{
            "strategyName": "s", "symbol": "X",
            "position": {"shortProfitPct": null, "shortOpenRate": "", "_fetchSuccess": false, "_error": "timeout"}
        }"#;
        let input = StrategyRequest::from_json(payload).unwrap().into_input();
        assert_eq!(input.position.short.profit_pct, None);
        assert_eq!(input.position.short.open_rate, None);
        assert!(!input.position.fetch_success);
        assert_eq!(input.position.error.as_deref(), Some("timeout"));
        assert_eq!(input.market.price, None);
    }

    #[test]
    fn test_null_lists_and_sections_read_as_empty() {
        let payload = r#"{
            "strategyName": "s", "symbol": "X",
            "marketData": {"price": 100},
            "strategyParams": {"oppositePositions": null, "recentClosePositions": null},
            "position": null,
            "account": null
        }"#;
        let input = StrategyRequest::from_json(payload).unwrap().into_input();
        assert!(input.params.opposite_positions.is_empty());
        assert!(input.position.recent_closes.is_empty());
        assert!(input.position.fetch_success);
        assert!(input.account.is_empty());

        let payload = r#"{
            "strategyName": "s", "symbol": "X",
            "strategyParams": {"oppositePositions": [{"isShort": null, "profitPct": 0.1}]}
        }"#;
        let input = StrategyRequest::from_json(payload).unwrap().into_input();
        assert!(!input.params.opposite_positions[0].is_short);
    }

    #[test]
    fn test_garbage_number_is_malformed() {
        let payload = r#"{"strategyName": "s", "symbol": "X", "position": {"longQuantity": "abc"}}"#;
        let err = StrategyRequest::from_json(payload).unwrap_err();
        assert!(err.to_string().contains("expected a number"));
    }

    #[test]
    fn test_fractional_count_is_malformed() {
        let payload = r#"{"strategyName": "s", "symbol": "X", "position": {"longAddCount": 1.5}}"#;
        assert!(StrategyRequest::from_json(payload).is_err());
    }

    #[test]
    fn test_params_translation() {
        let payload = r#"{
            "strategyName": "s", "symbol": "X",
            "strategyParams": {
                "oppositePositions": [{"isShort": true, "profitPct": "-0.2", "addCount": 1}],
                "recentClosePositions": [{"side": "SHORT", "closeTime": 1699999990000}, {"side": "?", "closeTime": 5}]
            }
        }"#;
        let input = StrategyRequest::from_json(payload).unwrap().into_input();
        assert_eq!(input.params.opposite_positions.len(), 1);
        assert!(input.params.opposite_positions[0].is_short);
        assert_eq!(input.params.opposite_positions[0].profit_pct, Some(-0.2));
        assert_eq!(input.position.recent_closes[0].side, Some(Side::Short));
        assert_eq!(input.position.recent_closes[1].side, None);
    }

    #[test]
    fn test_failure_response_shape() {
        let json = serde_json::to_value(StrategyResponse::failure("boom")).unwrap();
        assert_eq!(json["signal"], "HOLD");
        assert_eq!(json["position"], 0.0);
        assert_eq!(json["confidence"], 0.0);
        assert_eq!(json["error"], "boom");
        assert!(json["targetPrice"].is_null());
    }
}
