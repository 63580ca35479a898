//! Content hash of a decision's inputs.
//!
//! Identical inputs hash identically, so a caller that replays a cycle can
//! recognise it from the fingerprint in the decision metadata.

use serde::Serialize;

use crate::domain::{MarketSnapshot, PositionSnapshot, StrategyParams};

#[derive(Serialize)]
struct FingerprintInput<'a> {
    symbol: &'a str,
    market: &'a MarketSnapshot,
    params: &'a StrategyParams,
    position: &'a PositionSnapshot,
}

/// BLAKE3 hex digest of the canonical JSON of the inputs.
pub fn input_fingerprint(
    symbol: &str,
    market: &MarketSnapshot,
    params: &StrategyParams,
    position: &PositionSnapshot,
) -> String {
    let input = FingerprintInput {
        symbol,
        market,
        params,
        position,
    };
    let json = serde_json::to_vec(&input).unwrap_or_default();
    blake3::hash(&json).to_hex().to_string()
}
