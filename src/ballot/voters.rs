//! Voter registry: eligibility and per-voter ballot state keyed by principal.

use super::access::Principal;
use super::error::{BallotError, BallotResult};
use super::ProposalId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Voter record.
///
/// The zero value (`Voter::default()`) is what readers see for a principal
/// that was never registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    pub is_registered: bool,
    pub has_voted: bool,
    pub voted_proposal_id: ProposalId,
}

impl Voter {
    fn registered() -> Self {
        Self {
            is_registered: true,
            has_voted: false,
            voted_proposal_id: 0,
        }
    }
}

/// Registered voters. Records are never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterRegistry {
    voters: BTreeMap<Principal, Voter>,
}

impl VoterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_registered(&self, address: &Principal) -> bool {
        self.voters
            .get(address)
            .map(|voter| voter.is_registered)
            .unwrap_or(false)
    }

    /// Stored record, or the zero-valued record for unknown addresses.
    pub fn get(&self, address: &Principal) -> Voter {
        self.voters.get(address).copied().unwrap_or_default()
    }

    /// Insert a fresh record for `address`.
    pub fn register(&mut self, address: &Principal) -> BallotResult<()> {
        if self.is_registered(address) {
            return Err(BallotError::AlreadyRegistered);
        }
        self.voters.insert(address.clone(), Voter::registered());
        Ok(())
    }

    /// Fails with `AlreadyVoted` if `address` has already cast its vote.
    pub fn ensure_not_voted(&self, address: &Principal) -> BallotResult<()> {
        if self.get(address).has_voted {
            return Err(BallotError::AlreadyVoted);
        }
        Ok(())
    }

    /// Mark `address` as having voted for `proposal_id`.
    ///
    /// Callers check eligibility and the proposal range first.
    pub(crate) fn record_vote(
        &mut self,
        address: &Principal,
        proposal_id: ProposalId,
    ) -> BallotResult<()> {
        let voter = self.voters.get_mut(address).ok_or(BallotError::NotVoter)?;
        if voter.has_voted {
            return Err(BallotError::AlreadyVoted);
        }
        voter.has_voted = true;
        voter.voted_proposal_id = proposal_id;
        Ok(())
    }

    /// Number of voters that have cast a vote.
    pub fn votes_cast(&self) -> usize {
        self.voters.values().filter(|voter| voter.has_voted).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Principal, &Voter)> {
        self.voters.iter()
    }
}
