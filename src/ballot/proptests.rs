//! Property-based tests for the ballot core
//!
//! Tests for:
//! - Phase controller: monotonic, one step per successful transition
//! - Proposal registry: ids follow arrival order with no gaps
//! - Voting: one vote per voter, counts conserved, rejections are side-effect free
//! - Tally: winner is the first proposal holding the maximum count

use super::*;
use proptest::prelude::*;

fn owner() -> Principal {
    Principal::from("owner")
}

fn voter(n: u8) -> Principal {
    Principal::new(format!("voter_{}", n))
}

/// Attempt one of the five admin transitions by index (0-3 phase changes, 4 tally).
fn attempt_transition(ballot: &mut Ballot, which: u8) -> BallotResult<BallotEvent> {
    match which {
        0 => ballot.start_proposals_registering(&owner()),
        1 => ballot.end_proposals_registering(&owner()),
        2 => ballot.start_voting_session(&owner()),
        3 => ballot.end_voting_session(&owner()),
        _ => ballot.tally_votes(&owner()),
    }
}

/// Ballot in `VotingSessionStarted` with `voters` voters and `proposals` proposals.
fn open_voting(voters: u8, proposals: usize) -> Ballot {
    let mut ballot = Ballot::new(owner());
    for n in 0..voters {
        ballot.add_voter(&owner(), &voter(n)).unwrap();
    }
    ballot.start_proposals_registering(&owner()).unwrap();
    for i in 0..proposals {
        let submitter = voter((i % voters as usize) as u8);
        ballot
            .add_proposal(&submitter, &format!("proposal {}", i))
            .unwrap();
    }
    ballot.end_proposals_registering(&owner()).unwrap();
    ballot.start_voting_session(&owner()).unwrap();
    ballot
}

// ============================================================================
// PHASE CONTROLLER
// ============================================================================

proptest! {
    /// Property: phase never regresses and advances exactly once per success
    #[test]
    fn phase_is_monotonic(attempts in prop::collection::vec(0u8..5, 0..40)) {
        let mut ballot = Ballot::new(owner());
        ballot.add_voter(&owner(), &voter(0)).unwrap();
        ballot.start_proposals_registering(&owner()).unwrap();
        ballot.add_proposal(&voter(0), "only").unwrap();

        let mut successes = 1usize;
        for which in attempts {
            let before = ballot.current_phase();
            match attempt_transition(&mut ballot, which) {
                Ok(BallotEvent::WorkflowStatusChange { previous, new }) => {
                    successes += 1;
                    prop_assert_eq!(previous, before);
                    prop_assert_eq!(Some(new), before.next());
                }
                Ok(other) => prop_assert!(false, "unexpected record {:?}", other),
                Err(BallotError::PhaseMismatch { actual, .. }) => {
                    prop_assert_eq!(actual, before);
                    prop_assert_eq!(ballot.current_phase(), before);
                }
                Err(e) => prop_assert!(false, "unexpected error {:?}", e),
            }
            prop_assert!(ballot.current_phase() >= before);
            prop_assert_eq!(ballot.current_phase(), WorkflowPhase::ALL[successes]);
        }
    }
}

// ============================================================================
// PROPOSAL REGISTRY
// ============================================================================

proptest! {
    /// Property: ids are assigned 0..n in arrival order whoever submits
    #[test]
    fn proposal_ids_follow_arrival_order(
        submitters in prop::collection::vec(0u8..5, 1..30),
    ) {
        let mut ballot = Ballot::new(owner());
        for n in 0..5 {
            ballot.add_voter(&owner(), &voter(n)).unwrap();
        }
        ballot.start_proposals_registering(&owner()).unwrap();

        for (expected, submitter) in submitters.iter().enumerate() {
            let description = format!("from {} #{}", submitter, expected);
            let event = ballot
                .add_proposal(&voter(*submitter), &description)
                .unwrap();
            prop_assert_eq!(
                event,
                BallotEvent::ProposalRegistered {
                    id: expected as u64
                }
            );
            let stored = ballot
                .get_one_proposal(&voter(0), expected as u64)
                .unwrap();
            prop_assert_eq!(&stored.description, &description);
        }
        prop_assert_eq!(ballot.proposal_count(), submitters.len());
    }
}

// ============================================================================
// VOTING
// ============================================================================

proptest! {
    /// Property: each voter counts at most once and counts equal votes cast
    #[test]
    fn votes_are_conserved(
        votes in prop::collection::vec((0u8..8, 0u64..6), 0..40),
    ) {
        let mut ballot = open_voting(6, 4);

        for (who, proposal_id) in votes {
            let before = ballot.clone();
            match ballot.set_vote(&voter(who), proposal_id) {
                Ok(_) => {
                    let record = ballot.get_voter(&voter(who), &voter(who)).unwrap();
                    prop_assert!(record.has_voted);
                    prop_assert_eq!(record.voted_proposal_id, proposal_id);
                }
                Err(_) => prop_assert_eq!(&ballot, &before),
            }
        }

        prop_assert_eq!(
            ballot.proposals.total_votes(),
            ballot.voters.votes_cast() as u64
        );
        prop_assert!(ballot.check_invariants().is_ok());
    }
}

// ============================================================================
// TALLY
// ============================================================================

proptest! {
    /// Property: the winner is the first index holding the maximum count
    #[test]
    fn tally_selects_first_maximum(counts in prop::collection::vec(0u64..10, 1..20)) {
        let proposals: Vec<Proposal> = counts
            .iter()
            .map(|&vote_count| Proposal {
                description: "p".to_string(),
                vote_count,
            })
            .collect();

        let winner = plurality_winner(&proposals).unwrap() as usize;
        let max = *counts.iter().max().unwrap();

        prop_assert_eq!(counts[winner], max);
        prop_assert!(counts[..winner].iter().all(|&c| c < max));
    }

    /// Property: tallying a real ballot agrees with the registry scan
    #[test]
    fn tally_matches_cast_votes(choices in prop::collection::vec(0u64..4, 1..8)) {
        let mut ballot = open_voting(choices.len() as u8, 4);
        for (who, proposal_id) in choices.iter().enumerate() {
            ballot.set_vote(&voter(who as u8), *proposal_id).unwrap();
        }
        ballot.end_voting_session(&owner()).unwrap();
        ballot.tally_votes(&owner()).unwrap();

        let mut counts = [0u64; 4];
        for id in &choices {
            counts[*id as usize] += 1;
        }
        let max = *counts.iter().max().unwrap();
        let expected = counts.iter().position(|&c| c == max).unwrap() as u64;

        prop_assert_eq!(ballot.winning_proposal_id(), expected);
        prop_assert_eq!(ballot.current_phase(), WorkflowPhase::VotesTallied);
        prop_assert!(ballot.check_invariants().is_ok());
    }
}
