//! Workflow phases and the forward-only phase controller.
//!
//! Phases advance one step at a time in a fixed order:
//! RegisteringVoters → ProposalsRegistrationStarted → ProposalsRegistrationEnded
//! → VotingSessionStarted → VotingSessionEnded → VotesTallied

use super::error::{BallotError, BallotResult, Operation};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One stage of the ballot workflow.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum WorkflowPhase {
    #[default]
    RegisteringVoters = 0,
    ProposalsRegistrationStarted = 1,
    ProposalsRegistrationEnded = 2,
    VotingSessionStarted = 3,
    VotingSessionEnded = 4,
    VotesTallied = 5,
}

impl WorkflowPhase {
    /// All phases in workflow order.
    pub const ALL: [WorkflowPhase; 6] = [
        WorkflowPhase::RegisteringVoters,
        WorkflowPhase::ProposalsRegistrationStarted,
        WorkflowPhase::ProposalsRegistrationEnded,
        WorkflowPhase::VotingSessionStarted,
        WorkflowPhase::VotingSessionEnded,
        WorkflowPhase::VotesTallied,
    ];

    /// Numeric position in the workflow (0-5).
    pub fn index(self) -> u8 {
        self as u8
    }

    /// The phase that follows this one, if any.
    pub fn next(self) -> Option<WorkflowPhase> {
        Self::ALL.get(self.index() as usize + 1).copied()
    }
}

impl fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RegisteringVoters => "RegisteringVoters",
            Self::ProposalsRegistrationStarted => "ProposalsRegistrationStarted",
            Self::ProposalsRegistrationEnded => "ProposalsRegistrationEnded",
            Self::VotingSessionStarted => "VotingSessionStarted",
            Self::VotingSessionEnded => "VotingSessionEnded",
            Self::VotesTallied => "VotesTallied",
        };
        write!(f, "{}", name)
    }
}

/// Holds the current phase and only ever moves it one step forward.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseController {
    current: WorkflowPhase,
}

impl PhaseController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> WorkflowPhase {
        self.current
    }

    /// Fail with the operation's phase message unless the workflow is in `expected`.
    pub fn require(&self, operation: Operation, expected: WorkflowPhase) -> BallotResult<()> {
        if self.current != expected {
            return Err(BallotError::PhaseMismatch {
                operation,
                expected,
                actual: self.current,
            });
        }
        Ok(())
    }

    /// Advance from `from` to its successor.
    ///
    /// Returns `(previous, new)` for the status-change record. Nothing changes
    /// on failure.
    pub fn advance(
        &mut self,
        operation: Operation,
        from: WorkflowPhase,
    ) -> BallotResult<(WorkflowPhase, WorkflowPhase)> {
        self.require(operation, from)?;
        // VotesTallied is never a required source phase
        let to = from.next().ok_or(BallotError::PhaseMismatch {
            operation,
            expected: from,
            actual: self.current,
        })?;
        self.current = to;
        Ok((from, to))
    }
}
