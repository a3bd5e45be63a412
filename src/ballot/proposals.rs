//! Proposal registry: append-only, ids are arrival order.

use super::error::{BallotError, BallotResult};
use super::ProposalId;
use serde::{Deserialize, Serialize};

/// A submitted proposal and its running vote count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub description: String,
    pub vote_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalRegistry {
    proposals: Vec<Proposal>,
}

impl ProposalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a proposal and return its id (the registry length before the push).
    pub fn push(&mut self, description: &str) -> BallotResult<ProposalId> {
        if description.is_empty() {
            return Err(BallotError::EmptyDescription);
        }
        let id = self.proposals.len() as ProposalId;
        self.proposals.push(Proposal {
            description: description.to_string(),
            vote_count: 0,
        });
        Ok(id)
    }

    pub fn get(&self, id: ProposalId) -> BallotResult<&Proposal> {
        usize::try_from(id)
            .ok()
            .and_then(|index| self.proposals.get(index))
            .ok_or(BallotError::ProposalNotFound(id))
    }

    pub fn contains(&self, id: ProposalId) -> bool {
        self.get(id).is_ok()
    }

    pub(crate) fn increment(&mut self, id: ProposalId) -> BallotResult<()> {
        let proposal = usize::try_from(id)
            .ok()
            .and_then(|index| self.proposals.get_mut(index))
            .ok_or(BallotError::ProposalNotFound(id))?;
        proposal.vote_count += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    pub fn as_slice(&self) -> &[Proposal] {
        &self.proposals
    }

    /// Sum of all vote counters.
    #[cfg(test)]
    pub fn total_votes(&self) -> u64 {
        self.proposals.iter().map(|p| p.vote_count).sum()
    }
}
