//! Plurality tally.
//!
//! Scans proposals in ascending id order and keeps the first proposal with
//! the highest vote count: a later proposal replaces the current best only
//! with a strictly greater count, so ties go to the earliest submission.

use super::error::{BallotError, BallotResult};
use super::proposals::Proposal;
use super::ProposalId;

/// Id of the winning proposal, or `NoProposals` for an empty slice.
pub fn plurality_winner(proposals: &[Proposal]) -> BallotResult<ProposalId> {
    let first = proposals.first().ok_or(BallotError::NoProposals)?;

    let mut best_id: usize = 0;
    let mut best_count = first.vote_count;

    for (id, proposal) in proposals.iter().enumerate().skip(1) {
        if proposal.vote_count > best_count {
            best_id = id;
            best_count = proposal.vote_count;
        }
    }

    Ok(best_id as ProposalId)
}
