//! Refresh cycle state machine.
//!
//! # States
//! - Idle: no cycle running
//! - Fetching: sources are being read
//! - Failed: at least one source failed this cycle (the cycle continues)
//! - Merging: building the new table
//! - Publishing: swapping the new table in
//!
//! # State Transitions
//! ```text
//! Idle → Fetching → Merging → Publishing → Idle
//! Fetching → Failed → Merging
//! ```

use serde::Serialize;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshState {
    Idle = 0,
    Fetching = 1,
    Failed = 2,
    Merging = 3,
    Publishing = 4,
}

impl From<u8> for RefreshState {
    fn from(val: u8) -> Self {
        match val {
            1 => RefreshState::Fetching,
            2 => RefreshState::Failed,
            3 => RefreshState::Merging,
            4 => RefreshState::Publishing,
            _ => RefreshState::Idle,
        }
    }
}

/// Availability of the published routes, as seen by health checks.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteHealth {
    /// No cycle has completed yet.
    Starting = 0,
    /// Last cycle read every source.
    Ready = 1,
    /// Some sources failed; their previous routes are still served.
    Degraded = 2,
    /// Every source has failed and none has ever succeeded; the table is empty.
    AllSourcesFailed = 3,
}

impl From<u8> for RouteHealth {
    fn from(val: u8) -> Self {
        match val {
            1 => RouteHealth::Ready,
            2 => RouteHealth::Degraded,
            3 => RouteHealth::AllSourcesFailed,
            _ => RouteHealth::Starting,
        }
    }
}

impl RouteHealth {
    pub fn is_serving(&self) -> bool {
        matches!(self, RouteHealth::Ready | RouteHealth::Degraded)
    }
}
