//! HedgeLab Core: decision engine for the dual-direction (hedged) strategy.
//!
//! One call, one decision, no state between calls:
//! - Input guard rejecting failed fetches, bad prices and partial feeds
//! - Profit normalizer with fallback sources and leverage adjustment
//! - Cooldown tracker over recent closes
//! - Priority rule ladder (rebalance / close / add / initial open)
//! - Result builder enforcing the margin invariant
//!
//! Around the engine: the `Strategy` trait and registry, the backend's JSON
//! wire format, and the service shell that turns every fault into a safe hold.

pub mod config;
pub mod cooldown;
pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod guard;
pub mod profit;
pub mod result;
pub mod service;
pub mod strategy;
pub mod wire;

pub use config::{ConfigError, DualDirectionConfig, EngineConfig};
pub use domain::{
    Account, Decision, MarketSnapshot, PositionLeg, PositionSnapshot, Side, Signal, StrategyParams,
};
pub use strategy::{DualDirectionStrategy, Strategy, StrategyRegistry};
pub use wire::{StrategyRequest, StrategyResponse};
