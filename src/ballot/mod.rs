//! Plurality ballot core.
//!
//! One `Ballot` owns the phase controller, both registries and the tally
//! result. Every operation takes the verified caller, checks the access gate,
//! then the phase, then its own preconditions, and only then mutates. A
//! successful mutation returns the `BallotEvent` describing it; a rejected
//! call leaves the ballot untouched.

pub mod access;
pub mod error;
pub mod events;
pub mod phase;
pub mod proposals;
pub mod tally;
pub mod voters;

#[cfg(test)]
mod proptests;

pub use access::{require_administrator, require_registered_voter, Principal};
pub use error::{BallotError, BallotResult, InvariantViolation, Operation};
pub use events::{
    format_audit_log, query_audit_log, AuditEntry, AuditLog, AuditQuery, BallotEvent, EventKind,
};
pub use phase::{PhaseController, WorkflowPhase};
pub use proposals::{Proposal, ProposalRegistry};
pub use tally::plurality_winner;
pub use voters::{Voter, VoterRegistry};

use serde::{Deserialize, Serialize};

/// Proposal identifier: the proposal's index in arrival order.
pub type ProposalId = u64;

/// A single ballot instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    administrator: Principal,
    phase: PhaseController,
    voters: VoterRegistry,
    proposals: ProposalRegistry,
    winning_proposal_id: ProposalId,
}

impl Ballot {
    /// Create a ballot administered by `administrator`, in `RegisteringVoters`.
    pub fn new(administrator: Principal) -> Self {
        Self {
            administrator,
            phase: PhaseController::new(),
            voters: VoterRegistry::new(),
            proposals: ProposalRegistry::new(),
            winning_proposal_id: 0,
        }
    }

    pub fn administrator(&self) -> &Principal {
        &self.administrator
    }

    pub fn current_phase(&self) -> WorkflowPhase {
        self.phase.current()
    }

    /// Stored tally result; 0 until votes are tallied.
    pub fn winning_proposal_id(&self) -> ProposalId {
        self.winning_proposal_id
    }

    // ------------------------------------------------------------------
    // Voter registry
    // ------------------------------------------------------------------

    pub fn add_voter(
        &mut self,
        caller: &Principal,
        address: &Principal,
    ) -> BallotResult<BallotEvent> {
        require_administrator(&self.administrator, caller)?;
        self.phase
            .require(Operation::AddVoter, WorkflowPhase::RegisteringVoters)?;
        self.voters.register(address)?;

        Ok(BallotEvent::VoterRegistered {
            address: address.clone(),
        })
    }

    /// Voter record for `address`; unknown addresses read as the zero record.
    pub fn get_voter(&self, caller: &Principal, address: &Principal) -> BallotResult<Voter> {
        require_registered_voter(&self.voters, caller)?;
        Ok(self.voters.get(address))
    }

    // ------------------------------------------------------------------
    // Proposal registry
    // ------------------------------------------------------------------

    pub fn add_proposal(
        &mut self,
        caller: &Principal,
        description: &str,
    ) -> BallotResult<BallotEvent> {
        require_registered_voter(&self.voters, caller)?;
        self.phase.require(
            Operation::AddProposal,
            WorkflowPhase::ProposalsRegistrationStarted,
        )?;
        let id = self.proposals.push(description)?;

        Ok(BallotEvent::ProposalRegistered { id })
    }

    pub fn get_one_proposal(&self, caller: &Principal, id: ProposalId) -> BallotResult<&Proposal> {
        require_registered_voter(&self.voters, caller)?;
        self.proposals.get(id)
    }

    pub fn proposal_count(&self) -> usize {
        self.proposals.len()
    }

    // ------------------------------------------------------------------
    // Phase transitions
    // ------------------------------------------------------------------

    pub fn start_proposals_registering(&mut self, caller: &Principal) -> BallotResult<BallotEvent> {
        self.transition(
            caller,
            Operation::StartProposalsRegistering,
            WorkflowPhase::RegisteringVoters,
        )
    }

    pub fn end_proposals_registering(&mut self, caller: &Principal) -> BallotResult<BallotEvent> {
        self.transition(
            caller,
            Operation::EndProposalsRegistering,
            WorkflowPhase::ProposalsRegistrationStarted,
        )
    }

    pub fn start_voting_session(&mut self, caller: &Principal) -> BallotResult<BallotEvent> {
        self.transition(
            caller,
            Operation::StartVotingSession,
            WorkflowPhase::ProposalsRegistrationEnded,
        )
    }

    pub fn end_voting_session(&mut self, caller: &Principal) -> BallotResult<BallotEvent> {
        self.transition(
            caller,
            Operation::EndVotingSession,
            WorkflowPhase::VotingSessionStarted,
        )
    }

    fn transition(
        &mut self,
        caller: &Principal,
        operation: Operation,
        from: WorkflowPhase,
    ) -> BallotResult<BallotEvent> {
        require_administrator(&self.administrator, caller)?;
        let (previous, new) = self.phase.advance(operation, from)?;

        Ok(BallotEvent::WorkflowStatusChange { previous, new })
    }

    // ------------------------------------------------------------------
    // Voting and tally
    // ------------------------------------------------------------------

    /// Cast `caller`'s single vote for `proposal_id`.
    pub fn set_vote(
        &mut self,
        caller: &Principal,
        proposal_id: ProposalId,
    ) -> BallotResult<BallotEvent> {
        require_registered_voter(&self.voters, caller)?;
        self.phase
            .require(Operation::SetVote, WorkflowPhase::VotingSessionStarted)?;
        self.voters.ensure_not_voted(caller)?;
        if !self.proposals.contains(proposal_id) {
            return Err(BallotError::ProposalNotFound(proposal_id));
        }

        // Both checks above passed, so neither mutation can fail halfway.
        self.proposals.increment(proposal_id)?;
        self.voters.record_vote(caller, proposal_id)?;

        Ok(BallotEvent::Voted {
            voter: caller.clone(),
            proposal_id,
        })
    }

    /// Select the winner and close the workflow.
    ///
    /// Fails with `NoProposals` (phase unchanged) when nothing was submitted.
    pub fn tally_votes(&mut self, caller: &Principal) -> BallotResult<BallotEvent> {
        require_administrator(&self.administrator, caller)?;
        self.phase
            .require(Operation::TallyVotes, WorkflowPhase::VotingSessionEnded)?;
        let winner = plurality_winner(self.proposals.as_slice())?;
        let (previous, new) = self
            .phase
            .advance(Operation::TallyVotes, WorkflowPhase::VotingSessionEnded)?;
        self.winning_proposal_id = winner;

        Ok(BallotEvent::WorkflowStatusChange { previous, new })
    }

    /// Verify the cross-registry invariants of a restored ballot.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let phase = self.current_phase();
        let mut counts = vec![0u64; self.proposals.len()];

        for (address, voter) in self.voters.iter() {
            if !voter.is_registered {
                return Err(InvariantViolation::UnregisteredVoter(address.clone()));
            }
            if !voter.has_voted {
                if voter.voted_proposal_id != 0 {
                    return Err(InvariantViolation::ChoiceWithoutVote(address.clone()));
                }
                continue;
            }
            let slot = usize::try_from(voter.voted_proposal_id)
                .ok()
                .and_then(|index| counts.get_mut(index))
                .ok_or_else(|| InvariantViolation::UnknownVotedProposal {
                    voter: address.clone(),
                    proposal_id: voter.voted_proposal_id,
                })?;
            *slot += 1;
        }

        let proposals = self.proposals.as_slice();
        for (id, (proposal, expected)) in (0u64..).zip(proposals.iter().zip(counts)) {
            if proposal.description.is_empty() {
                return Err(InvariantViolation::EmptyDescription(id));
            }
            if proposal.vote_count != expected {
                return Err(InvariantViolation::VoteCountMismatch {
                    id,
                    stored: proposal.vote_count,
                    expected,
                });
            }
        }

        if phase < WorkflowPhase::VotingSessionStarted && self.voters.votes_cast() > 0 {
            return Err(InvariantViolation::EarlyVotes(phase));
        }
        if phase < WorkflowPhase::ProposalsRegistrationStarted && !self.proposals.is_empty() {
            return Err(InvariantViolation::EarlyProposals(phase));
        }

        if phase == WorkflowPhase::VotesTallied {
            let expected = plurality_winner(proposals)
                .map_err(InvariantViolation::UntallyableResult)?;
            if self.winning_proposal_id != expected {
                return Err(InvariantViolation::WrongWinner {
                    stored: self.winning_proposal_id,
                    expected,
                });
            }
        } else if self.winning_proposal_id != 0 {
            return Err(InvariantViolation::EarlyWinner(phase));
        }

        Ok(())
    }
}
