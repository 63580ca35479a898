//! Dual-direction strategy: hold a long and a short leg at all times, take
//! profit on whichever leg reaches the close threshold, and use profit cycles
//! on one leg to fund adds on the other.
//!
//! Pipeline per call: guard → profit normalizer → cooldown → rule ladder →
//! result builder. Each stage is a pure function of the call's inputs.

use crate::config::DualDirectionConfig;
use crate::cooldown;
use crate::domain::{Account, Decision, MarketSnapshot, PositionSnapshot, StrategyParams};
use crate::engine;
use crate::fingerprint::input_fingerprint;
use crate::guard::{self, GuardOutcome};
use crate::profit;
use crate::result::{self, BuildContext};

use super::Strategy;

#[derive(Debug, Clone, Default)]
pub struct DualDirectionStrategy {
    config: DualDirectionConfig,
}

impl DualDirectionStrategy {
    pub const NAME: &'static str = "dual_direction_strategy";
    /// Identifier written to `metadata.strategy`; the backend matches on it
    /// to route dual opens.
    pub const METADATA_NAME: &'static str = "DualDirectionStrategy";

    pub fn new(config: DualDirectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DualDirectionConfig {
        &self.config
    }
}

impl Strategy for DualDirectionStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn decide(
        &self,
        symbol: &str,
        market: &MarketSnapshot,
        params: &StrategyParams,
        position: &PositionSnapshot,
        _account: &Account,
    ) -> Decision {
        log::debug!(symbol = symbol; "evaluating dual-direction strategy");

        let fingerprint = input_fingerprint(symbol, market, params, position);

        let (price, warnings) = match guard::inspect(position, market) {
            GuardOutcome::Proceed { price, warnings } => (price, warnings),
            GuardOutcome::Reject(rejection) => {
                let ctx = BuildContext {
                    strategy: Self::METADATA_NAME,
                    warnings: &[],
                    fingerprint: Some(fingerprint),
                };
                return result::rejected(&rejection, &ctx);
            }
        };

        let resolved = profit::normalize(position, params, price, &self.config);
        let cooldown = cooldown::check(
            &position.recent_closes,
            market.now_millis(),
            self.config.cooldown_secs,
        );
        let outcome = engine::evaluate(&resolved, &cooldown, &self.config);

        let ctx = BuildContext {
            strategy: Self::METADATA_NAME,
            warnings: &warnings,
            fingerprint: Some(fingerprint),
        };
        result::build(outcome, &resolved, &ctx)
    }
}
