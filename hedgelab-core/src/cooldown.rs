//! Cooldown tracker: suppresses reopening a leg right after a close.

use serde::{Deserialize, Serialize};

use crate::domain::{RecentCloseEvent, Side};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CooldownStatus {
    Clear,
    Active {
        /// Side of the close that started the cooldown, if recognised.
        side: Option<Side>,
        elapsed_secs: f64,
        window_secs: u64,
    },
}

impl CooldownStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, CooldownStatus::Active { .. })
    }

    /// Human-readable note for the decision reason.
    pub fn describe(&self) -> Option<String> {
        match self {
            CooldownStatus::Clear => None,
            CooldownStatus::Active {
                side,
                elapsed_secs,
                window_secs,
            } => {
                let side = side.map_or("unknown", |s| s.as_str());
                Some(format!(
                    "{side} side closed {elapsed_secs:.1}s ago (cooldown {window_secs}s)"
                ))
            }
        }
    }
}

/// Report the first close inside the window ending at `now_millis`.
///
/// Events without a positive close time are ignored. A close time ahead of
/// `now_millis` (clock skew between backend and feed) counts as inside the
/// window.
pub fn check(events: &[RecentCloseEvent], now_millis: i64, window_secs: u64) -> CooldownStatus {
    for event in events {
        if event.close_time_millis <= 0 {
            continue;
        }
        let elapsed_secs = (now_millis - event.close_time_millis) as f64 / 1000.0;
        if elapsed_secs < window_secs as f64 {
            log::info!(
                side = event.side.map_or("unknown", |s| s.as_str()),
                elapsed_secs = elapsed_secs;
                "within cooldown after recent close"
            );
            return CooldownStatus::Active {
                side: event.side,
                elapsed_secs,
                window_secs,
            };
        }
    }
    CooldownStatus::Clear
}
