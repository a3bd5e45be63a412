//! Ballot rejection taxonomy.
//!
//! Every error is a rejection of the attempted call: the ballot is left
//! exactly as it was before the call.

use super::access::Principal;
use super::phase::WorkflowPhase;
use super::ProposalId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for ballot operations.
pub type BallotResult<T> = Result<T, BallotError>;

/// Phase-gated ballot operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    AddVoter,
    StartProposalsRegistering,
    AddProposal,
    EndProposalsRegistering,
    StartVotingSession,
    SetVote,
    EndVotingSession,
    TallyVotes,
}

impl Operation {
    /// Message shown to the caller when the operation is attempted in the wrong phase.
    pub fn phase_message(self) -> &'static str {
        match self {
            Self::AddVoter => "Voters registration is not open yet",
            Self::StartProposalsRegistering => "Registering proposals cant be started now",
            Self::AddProposal => "Proposals are not allowed yet",
            Self::EndProposalsRegistering => "Registering proposals havent started yet",
            Self::StartVotingSession => "Registering proposals phase is not finished",
            Self::SetVote | Self::EndVotingSession => "Voting session havent started yet",
            Self::TallyVotes => "Current status is not voting session ended",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AddVoter => "addVoter",
            Self::StartProposalsRegistering => "startProposalsRegistering",
            Self::AddProposal => "addProposal",
            Self::EndProposalsRegistering => "endProposalsRegistering",
            Self::StartVotingSession => "startVotingSession",
            Self::SetVote => "setVote",
            Self::EndVotingSession => "endVotingSession",
            Self::TallyVotes => "tallyVotes",
        };
        write!(f, "{}", name)
    }
}

/// Ballot rejections.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BallotError {
    #[error("caller is not the administrator")]
    NotAdministrator,

    #[error("You're not a voter")]
    NotVoter,

    #[error("{}", .operation.phase_message())]
    PhaseMismatch {
        operation: Operation,
        expected: WorkflowPhase,
        actual: WorkflowPhase,
    },

    #[error("Already registered")]
    AlreadyRegistered,

    #[error("You have already voted")]
    AlreadyVoted,

    #[error("Proposal description must not be empty")]
    EmptyDescription,

    #[error("Proposal not found: {0}")]
    ProposalNotFound(ProposalId),

    #[error("No proposals to tally")]
    NoProposals,
}

/// Cross-registry inconsistencies found in a stored ballot.
///
/// These never arise from the ballot operations themselves; they describe
/// state that was written by something else.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("voter {0} stored without registration")]
    UnregisteredVoter(Principal),

    #[error("voter {0} has a choice but no vote")]
    ChoiceWithoutVote(Principal),

    #[error("voter {voter} voted for unknown proposal {proposal_id}")]
    UnknownVotedProposal {
        voter: Principal,
        proposal_id: ProposalId,
    },

    #[error("proposal {0} has an empty description")]
    EmptyDescription(ProposalId),

    #[error("proposal {id} counts {stored} votes but {expected} voters chose it")]
    VoteCountMismatch {
        id: ProposalId,
        stored: u64,
        expected: u64,
    },

    #[error("votes recorded during {0}")]
    EarlyVotes(WorkflowPhase),

    #[error("proposals recorded during {0}")]
    EarlyProposals(WorkflowPhase),

    #[error("tallied ballot is inconsistent: {0}")]
    UntallyableResult(BallotError),

    #[error("stored winner {stored} but tally selects {expected}")]
    WrongWinner {
        stored: ProposalId,
        expected: ProposalId,
    },

    #[error("winner recorded during {0}")]
    EarlyWinner(WorkflowPhase),
}
