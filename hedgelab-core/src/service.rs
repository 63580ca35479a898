//! Service shell: request handling around the strategy registry.
//!
//! `execute` never fails: unknown strategies, malformed payloads and panics
//! inside a strategy all become a zero-confidence HOLD with `error` set.

use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Decision;
use crate::strategy::{RegistryError, StrategyRegistry};
use crate::wire::{StrategyRequest, StrategyResponse, WireError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Wire(#[from] WireError),
    #[error("strategy panicked: {0}")]
    Panicked(String),
}

/// Response of the strategy-listing operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyList {
    pub strategies: Vec<String>,
    pub count: usize,
}

/// Response of the liveness check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
}

pub fn health() -> Health {
    Health {
        status: "ok".to_string(),
    }
}

pub fn list_strategies(registry: &StrategyRegistry) -> StrategyList {
    let strategies: Vec<String> = registry.names().into_iter().map(String::from).collect();
    StrategyList {
        count: strategies.len(),
        strategies,
    }
}

/// Run one request, mapping every fault to a safe HOLD response.
pub fn execute(registry: &StrategyRegistry, request: StrategyRequest) -> StrategyResponse {
    log::info!(
        strategy = request.strategy_name.as_str(),
        symbol = request.symbol.as_str();
        "strategy request received"
    );
    match try_execute(registry, request) {
        Ok(decision) => {
            let response = StrategyResponse::from(decision);
            log::info!(
                signal = response.signal.to_string().as_str(),
                confidence = response.confidence;
                "strategy request completed"
            );
            response
        }
        Err(err) => {
            log::error!(error = err.to_string().as_str(); "strategy execution failed");
            StrategyResponse::failure(err.to_string())
        }
    }
}

/// Parse a raw JSON payload and run it.
pub fn execute_json(registry: &StrategyRegistry, payload: &str) -> StrategyResponse {
    match StrategyRequest::from_json(payload) {
        Ok(request) => execute(registry, request),
        Err(err) => {
            log::error!(error = err.to_string().as_str(); "rejecting malformed request");
            StrategyResponse::failure(ServiceError::from(err).to_string())
        }
    }
}

fn try_execute(
    registry: &StrategyRegistry,
    request: StrategyRequest,
) -> Result<Decision, ServiceError> {
    let strategy = registry.get(&request.strategy_name)?;
    let input = request.into_input();
    panic::catch_unwind(AssertUnwindSafe(|| {
        strategy.decide(
            &input.symbol,
            &input.market,
            &input.params,
            &input.position,
            &input.account,
        )
    }))
    .map_err(|payload| ServiceError::Panicked(panic_message(payload.as_ref())))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::domain::{Account, MarketSnapshot, PositionSnapshot, Signal, StrategyParams};
    use crate::strategy::Strategy;

    struct Exploding;

    impl Strategy for Exploding {
        fn name(&self) -> &str {
            "exploding"
        }

        fn decide(
            &self,
            _symbol: &str,
            _market: &MarketSnapshot,
            _params: &StrategyParams,
            _position: &PositionSnapshot,
            _account: &Account,
        ) -> Decision {
            panic!("division by zero in sizing");
        }
    }

    fn registry() -> StrategyRegistry {
        StrategyRegistry::with_defaults(&EngineConfig::default())
    }

    #[test]
    fn test_health() {
        assert_eq!(health().status, "ok");
    }

    #[test]
    fn test_list_strategies() {
        let list = list_strategies(&registry());
        assert_eq!(list.strategies, vec!["dual_direction_strategy".to_string()]);
        assert_eq!(list.count, 1);
    }

    #[test]
    fn test_unknown_strategy_is_safe_hold() {
        let payload = r#"{"strategyName": "grid_strategy", "symbol": "BTCUSDT"}"#;
        let response = execute_json(&registry(), payload);
        assert_eq!(response.signal, Signal::Hold);
        assert_eq!(response.confidence, 0.0);
        assert!(response.error.unwrap().contains("grid_strategy"));
    }

    #[test]
    fn test_malformed_payload_is_safe_hold() {
        let response = execute_json(&registry(), "{not json");
        assert_eq!(response.signal, Signal::Hold);
        assert!(response.error.is_some());
    }

    #[test]
    fn test_panicking_strategy_is_safe_hold() {
        let mut registry = registry();
        registry.register(Box::new(Exploding));
        let payload = r#"{"strategyName": "exploding", "symbol": "BTCUSDT", "marketData": {"price": 1}}"#;
        let response = execute_json(&registry, payload);
        assert_eq!(response.signal, Signal::Hold);
        assert_eq!(response.position, 0.0);
        assert!(response.error.unwrap().contains("division by zero"));
    }

    #[test]
    fn test_flat_request_dual_opens_with_margin_in_metadata() {
        let payload = r#"{
            "strategyName": "dual_direction_strategy",
            "symbol": "BTCUSDT",
            "marketData": {"price": 65000, "timestamp": 1700000000000},
            "strategyParams": {},
            "position": {"longQuantity": 0, "shortQuantity": 0},
            "account": {}
        }"#;
        let response = execute_json(&registry(), payload);
        assert_eq!(response.signal, Signal::DualOpen);
        assert_eq!(response.position, 0.5);
        assert_eq!(response.metadata.margin, Some(1.0));
        assert!(response.error.is_none());
    }
}
