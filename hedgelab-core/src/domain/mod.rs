//! Domain types for HedgeLab

pub mod decision;
pub mod market;
pub mod position;

pub use decision::{Decision, DecisionMetadata, LegDiagnostics, Signal};
pub use market::{Account, MarketSnapshot, OppositePosition, StrategyParams};
pub use position::{PositionLeg, PositionSnapshot, RecentCloseEvent, Side};
