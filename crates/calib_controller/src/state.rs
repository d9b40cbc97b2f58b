//! Controller states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Budget that ended a session without convergence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Budget {
    /// The iteration limit was reached.
    Iterations,
    /// The wall-clock limit was reached.
    WallClock,
}

/// Position of the calibration loop.
///
/// ```text
/// Initialized → Proposing → Simulating → Collecting → Estimating
///                   ↑                                      │
///                   └──────────────────────────────────────┤
///                                                          ↓
///                      Converged | IterationBudgetExhausted | Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    /// Created, not yet run.
    Initialized,
    /// Choosing the next parameters.
    Proposing,
    /// Waiting for the simulator.
    Simulating,
    /// Reading simulator outputs.
    Collecting,
    /// Fitting the observation model.
    Estimating,
    /// The stopping rule held.
    Converged,
    /// A budget was spent first.
    IterationBudgetExhausted,
    /// An unrecovered error ended the session.
    Failed,
}

impl ControllerState {
    /// Whether the session has ended.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ControllerState::Converged
                | ControllerState::IterationBudgetExhausted
                | ControllerState::Failed
        )
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControllerState::Initialized => "initialized",
            ControllerState::Proposing => "proposing",
            ControllerState::Simulating => "simulating",
            ControllerState::Collecting => "collecting",
            ControllerState::Estimating => "estimating",
            ControllerState::Converged => "converged",
            ControllerState::IterationBudgetExhausted => "iteration_budget_exhausted",
            ControllerState::Failed => "failed",
        };
        f.write_str(name)
    }
}
