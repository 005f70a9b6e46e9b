//! Execution state machine.
//!
//! ```text
//! pending ──claim──▶ processing ──complete──▶ completed
//!    │  ▲                 │
//!    │  └─────retry───────┤
//!    │                    └──fail──▶ failed
//!    └────────cancel────────────────▶ failed
//! ```
//!
//! `completed` and `failed` are terminal.

use crate::error::TransitionError;
use crate::types::ExecutionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Claim,
    Complete,
    Fail,
    Retry,
    Cancel,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Claim => "claim",
            Transition::Complete => "complete",
            Transition::Fail => "fail",
            Transition::Retry => "retry",
            Transition::Cancel => "cancel",
        }
    }

    /// Statuses this transition may start from.
    pub fn sources(&self) -> &'static [ExecutionStatus] {
        match self {
            Transition::Claim => &[ExecutionStatus::Pending],
            Transition::Complete | Transition::Fail | Transition::Retry => {
                &[ExecutionStatus::Processing]
            }
            Transition::Cancel => &[ExecutionStatus::Pending, ExecutionStatus::Processing],
        }
    }

    pub fn target(&self) -> ExecutionStatus {
        match self {
            Transition::Claim => ExecutionStatus::Processing,
            Transition::Complete => ExecutionStatus::Completed,
            Transition::Fail | Transition::Cancel => ExecutionStatus::Failed,
            Transition::Retry => ExecutionStatus::Pending,
        }
    }

    pub fn applies_to(&self, from: ExecutionStatus) -> bool {
        self.sources().contains(&from)
    }

    pub fn check(&self, from: ExecutionStatus) -> Result<ExecutionStatus, TransitionError> {
        if self.applies_to(from) {
            Ok(self.target())
        } else {
            Err(TransitionError {
                from,
                to: self.target(),
            })
        }
    }
}

/// Whether any transition leads from `from` to `to`.
pub fn can_transition(from: ExecutionStatus, to: ExecutionStatus) -> bool {
    [
        Transition::Claim,
        Transition::Complete,
        Transition::Fail,
        Transition::Retry,
        Transition::Cancel,
    ]
    .iter()
    .any(|t| t.applies_to(from) && t.target() == to)
}
