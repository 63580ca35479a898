//! Input guard: rejects corrupted or stale snapshots before any decision logic.
//!
//! Checks run in order and stop at the first failure:
//! 1. Position fetch reported failure
//! 2. Price missing, non-finite or non-positive
//! 3. A held leg without a positive open rate (partial feed)
//!
//! A fully zeroed snapshot is ambiguous (flat account or lost data) and only
//! produces a warning.

use serde::{Deserialize, Serialize};

use crate::domain::{MarketSnapshot, PositionSnapshot, Side};

/// Why a snapshot was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    FetchFailed,
    InvalidPrice,
    LegAnomaly,
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectionReason::FetchFailed => write!(f, "FetchFailed"),
            RejectionReason::InvalidPrice => write!(f, "InvalidPrice"),
            RejectionReason::LegAnomaly => write!(f, "LegAnomaly"),
        }
    }
}

/// A rejected snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub reason: RejectionReason,
    /// Offending leg for `LegAnomaly`.
    pub side: Option<Side>,
    pub message: String,
}

/// Non-fatal findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuardWarning {
    /// Quantities, profit counts and add counts are all zero.
    AllZeroSnapshot,
}

impl GuardWarning {
    pub fn message(&self) -> &'static str {
        match self {
            GuardWarning::AllZeroSnapshot => {
                "all position fields are zero; either genuinely flat or position data was lost"
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GuardOutcome {
    /// Snapshot usable; `price` is the validated market price.
    Proceed {
        price: f64,
        warnings: Vec<GuardWarning>,
    },
    Reject(Rejection),
}

/// Validate one snapshot pair.
pub fn inspect(position: &PositionSnapshot, market: &MarketSnapshot) -> GuardOutcome {
    if !position.fetch_success {
        let error = position.error.as_deref().unwrap_or("unknown error");
        log::error!(error = error; "position fetch failed, holding");
        return GuardOutcome::Reject(Rejection {
            reason: RejectionReason::FetchFailed,
            side: None,
            message: format!("position data fetch failed: {error}"),
        });
    }

    let price = match market.price {
        Some(price) if price.is_finite() && price > 0.0 => price,
        other => {
            let shown = other.map_or_else(|| "none".to_string(), |p| p.to_string());
            log::error!(price = shown.as_str(); "invalid price data, holding");
            return GuardOutcome::Reject(Rejection {
                reason: RejectionReason::InvalidPrice,
                side: None,
                message: format!("invalid price data: {shown}"),
            });
        }
    };

    for side in [Side::Long, Side::Short] {
        let leg = position.leg(side);
        let open_rate = leg.open_rate.filter(|r| r.is_finite()).unwrap_or(0.0);
        if leg.quantity > 0.0 && open_rate <= 0.0 {
            log::error!(
                side = side.as_str(),
                quantity = leg.quantity,
                open_rate = open_rate;
                "held leg without open rate, suspected network issue"
            );
            return GuardOutcome::Reject(Rejection {
                reason: RejectionReason::LegAnomaly,
                side: Some(side),
                message: format!("{side} position data anomaly, suspected network issue"),
            });
        }
    }

    let mut warnings = Vec::new();
    if is_all_zero(position) {
        log::warn!("{}", GuardWarning::AllZeroSnapshot.message());
        warnings.push(GuardWarning::AllZeroSnapshot);
    }
    GuardOutcome::Proceed { price, warnings }
}

fn is_all_zero(position: &PositionSnapshot) -> bool {
    [&position.long, &position.short].iter().all(|leg| {
        leg.quantity == 0.0
            && leg.profit_count.unwrap_or(0) == 0
            && leg.add_count.unwrap_or(0) == 0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PositionLeg;

    fn market() -> MarketSnapshot {
        MarketSnapshot::new(100.0, 1_700_000_000_000)
    }

    fn held(quantity: f64, open_rate: Option<f64>) -> PositionLeg {
        PositionLeg {
            quantity,
            open_rate,
            ..Default::default()
        }
    }

    #[test]
    fn test_fetch_failure_rejects_first() {
        let position = PositionSnapshot {
            fetch_success: false,
            error: Some("timeout".into()),
            long: held(5.0, None),
            ..Default::default()
        };
        let bad_market = MarketSnapshot::default();
        match inspect(&position, &bad_market) {
            GuardOutcome::Reject(r) => {
                assert_eq!(r.reason, RejectionReason::FetchFailed);
                assert!(r.message.contains("timeout"));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_fetch_failure_without_error_text() {
        let position = PositionSnapshot {
            fetch_success: false,
            ..Default::default()
        };
        match inspect(&position, &market()) {
            GuardOutcome::Reject(r) => assert!(r.message.contains("unknown error")),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_prices_reject() {
        let position = PositionSnapshot::default();
        for price in [None, Some(0.0), Some(-1.0), Some(f64::NAN)] {
            let m = MarketSnapshot {
                price,
                timestamp_millis: None,
            };
            match inspect(&position, &m) {
                GuardOutcome::Reject(r) => assert_eq!(r.reason, RejectionReason::InvalidPrice),
                other => panic!("expected rejection for {price:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_held_leg_without_open_rate_rejects() {
        let position = PositionSnapshot {
            long: held(1.0, Some(100.0)),
            short: held(2.0, Some(0.0)),
            ..Default::default()
        };
        match inspect(&position, &market()) {
            GuardOutcome::Reject(r) => {
                assert_eq!(r.reason, RejectionReason::LegAnomaly);
                assert_eq!(r.side, Some(Side::Short));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_absent_open_rate_counts_as_zero() {
        let position = PositionSnapshot {
            long: held(1.0, None),
            ..Default::default()
        };
        assert!(matches!(
            inspect(&position, &market()),
            GuardOutcome::Reject(_)
        ));
    }

    #[test]
    fn test_all_zero_warns_but_proceeds() {
        let outcome = inspect(&PositionSnapshot::default(), &market());
        assert_eq!(
            outcome,
            GuardOutcome::Proceed {
                price: 100.0,
                warnings: vec![GuardWarning::AllZeroSnapshot]
            }
        );
    }

    #[test]
    fn test_flat_with_history_has_no_warning() {
        let position = PositionSnapshot {
            long: PositionLeg {
                profit_count: Some(3),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            inspect(&position, &market()),
            GuardOutcome::Proceed {
                price: 100.0,
                warnings: vec![]
            }
        );
    }
}
