//! Strategy interface and registry.
//!
//! Every strategy receives the full per-cycle input and returns one
//! `Decision`. Strategies hold configuration only; all position history
//! arrives with the call.

pub mod dual_direction;

pub use dual_direction::DualDirectionStrategy;

use std::collections::BTreeMap;

use crate::config::EngineConfig;
use crate::domain::{Account, Decision, MarketSnapshot, PositionSnapshot, StrategyParams};

/// Errors from strategy lookup.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("strategy not found: {0}")]
    UnknownStrategy(String),
}

/// A stateless per-cycle decision function.
///
/// # Invariants
/// - `decide()` MUST NOT keep state between calls
/// - `decide()` MUST return the same decision for the same inputs
///   (wall-clock fallback aside when the market carries no timestamp)
/// - `decide()` MUST NOT panic on anomalous data; anomalies become holds
pub trait Strategy: Send + Sync {
    /// Registry identifier.
    fn name(&self) -> &str;

    fn decide(
        &self,
        symbol: &str,
        market: &MarketSnapshot,
        params: &StrategyParams,
        position: &PositionSnapshot,
        account: &Account,
    ) -> Decision;
}

/// Named strategies available to the service shell.
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: BTreeMap<String, Box<dyn Strategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in strategies.
    pub fn with_defaults(config: &EngineConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(DualDirectionStrategy::new(
            config.dual_direction.clone(),
        )));
        registry
    }

    /// Add a strategy, replacing any previous one with the same name.
    pub fn register(&mut self, strategy: Box<dyn Strategy>) {
        self.strategies.insert(strategy.name().to_string(), strategy);
    }

    pub fn get(&self, name: &str) -> Result<&dyn Strategy, RegistryError> {
        self.strategies
            .get(name)
            .map(|s| s.as_ref())
            .ok_or_else(|| RegistryError::UnknownStrategy(name.to_string()))
    }

    /// Registered identifiers in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.strategies.keys().map(|k| k.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysHold;

    impl Strategy for AlwaysHold {
        fn name(&self) -> &str {
            "always_hold"
        }

        fn decide(
            &self,
            _symbol: &str,
            _market: &MarketSnapshot,
            _params: &StrategyParams,
            _position: &PositionSnapshot,
            _account: &Account,
        ) -> Decision {
            Decision::hold("always")
        }
    }

    #[test]
    fn test_defaults_register_dual_direction() {
        let registry = StrategyRegistry::with_defaults(&EngineConfig::default());
        assert_eq!(registry.names(), vec!["dual_direction_strategy"]);
        assert_eq!(registry.len(), 1);
        assert!(registry.get("dual_direction_strategy").is_ok());
    }

    #[test]
    fn test_unknown_strategy() {
        let registry = StrategyRegistry::new();
        assert!(registry.is_empty());
        let err = registry.get("ma_strategy").err().unwrap();
        assert_eq!(err.to_string(), "strategy not found: ma_strategy");
    }

    #[test]
    fn test_register_custom_strategy() {
        let mut registry = StrategyRegistry::with_defaults(&EngineConfig::default());
        registry.register(Box::new(AlwaysHold));
        assert_eq!(registry.names(), vec!["always_hold", "dual_direction_strategy"]);
        let decision = registry.get("always_hold").unwrap().decide(
            "BTCUSDT",
            &MarketSnapshot::new(1.0, 1),
            &StrategyParams::default(),
            &PositionSnapshot::default(),
            &Account::new(),
        );
        assert_eq!(decision.reason, "always");
    }
}
