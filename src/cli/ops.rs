//! Ballot operations exposed on the command line.
//!
//! Each invocation opens the ballot from the configured state file, performs
//! one operation as `--caller`, and exits. The state file is rewritten only
//! when the operation succeeds.

use super::config::{default_config_path, BallotConfig};
use super::logging::init_logging;
use ballot::ballot::{BallotEvent, Principal, ProposalId, WorkflowPhase};
use ballot::service::BallotService;
use ballot::store::FileStore;
use std::path::PathBuf;

/// Mutating ballot operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    AddVoter(String),
    StartProposals,
    EndProposals,
    StartVoting,
    EndVoting,
    Tally,
    Propose(String),
    Vote(ProposalId),
}

/// Load config, install logging and open the ballot it points at.
pub async fn open_service(
    config_path: Option<String>,
) -> Result<BallotService<FileStore>, Box<dyn std::error::Error>> {
    let config_path = config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);

    if !config_path.exists() {
        return Err(format!(
            "No config file at '{}'. Run `ballot init --administrator <principal>` first.",
            config_path.display()
        )
        .into());
    }

    let config = BallotConfig::load(&config_path)?;
    init_logging(&config.logging)?;

    let store = FileStore::new(&config.ballot.state_path);
    let service = BallotService::open(store, Principal::new(config.ballot.administrator)).await?;
    Ok(service)
}

/// Apply one mutation as `caller` and report the committed record.
pub async fn execute(
    config_path: Option<String>,
    caller: String,
    mutation: Mutation,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = open_service(config_path).await?;
    let caller = Principal::new(caller);

    let entry = match mutation {
        Mutation::AddVoter(address) => service.add_voter(&caller, &Principal::new(address)).await?,
        Mutation::StartProposals => service.start_proposals_registering(&caller).await?,
        Mutation::EndProposals => service.end_proposals_registering(&caller).await?,
        Mutation::StartVoting => service.start_voting_session(&caller).await?,
        Mutation::EndVoting => service.end_voting_session(&caller).await?,
        Mutation::Tally => service.tally_votes(&caller).await?,
        Mutation::Propose(description) => service.add_proposal(&caller, &description).await?,
        Mutation::Vote(proposal_id) => service.set_vote(&caller, proposal_id).await?,
    };

    println!("✅ {}", entry.event);
    if let BallotEvent::WorkflowStatusChange {
        new: WorkflowPhase::VotesTallied,
        ..
    } = entry.event
    {
        println!(
            "🏆 Winning proposal: {}",
            service.winning_proposal_id().await
        );
    }

    Ok(())
}

/// Show a voter record (`getVoter`).
pub async fn show_voter(
    config_path: Option<String>,
    caller: String,
    address: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = open_service(config_path).await?;
    let voter = service
        .get_voter(&Principal::new(caller), &Principal::new(address.clone()))
        .await?;

    println!("Voter: {}", address);
    println!("  Registered: {}", voter.is_registered);
    println!("  Has voted: {}", voter.has_voted);
    if voter.has_voted {
        println!("  Voted for: {}", voter.voted_proposal_id);
    }

    Ok(())
}

/// Show a proposal (`getOneProposal`).
pub async fn show_proposal(
    config_path: Option<String>,
    caller: String,
    id: ProposalId,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = open_service(config_path).await?;
    let proposal = service
        .get_one_proposal(&Principal::new(caller), id)
        .await?;

    println!("Proposal {}", id);
    println!("  Description: {}", proposal.description);
    println!("  Votes: {}", proposal.vote_count);

    Ok(())
}
