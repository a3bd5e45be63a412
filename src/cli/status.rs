use super::ops::open_service;
use ballot::ballot::{format_audit_log, AuditQuery, Principal, WorkflowPhase};

/// Show the ballot's phase and result
pub async fn execute(config_path: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let service = open_service(config_path).await?;
    let snapshot = service.snapshot().await;
    let phase = snapshot.ballot.current_phase();

    println!("📊 Ballot Status");
    println!();
    println!("  Administrator: {}", snapshot.ballot.administrator());
    println!("  Phase: {} ({})", phase, phase.index());
    println!("  Proposals: {}", snapshot.ballot.proposal_count());
    println!("  Audit records: {}", snapshot.audit_log.len());

    if phase == WorkflowPhase::VotesTallied {
        println!("  Winning proposal: {}", snapshot.ballot.winning_proposal_id());
    } else if let Some(next) = phase.next() {
        println!("  Next phase: {}", next);
    }

    Ok(())
}

/// Print the audit log, most recent first
pub async fn audit(
    config_path: Option<String>,
    query: AuditQuery,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = open_service(config_path).await?;
    let entries = service.audit(&query).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        println!("{}", format_audit_log(&entries));
    }

    Ok(())
}

/// Build an audit query from command-line filters
pub fn build_query(
    kind: Option<ballot::ballot::EventKind>,
    actor: Option<String>,
    limit: usize,
    after: Option<u64>,
) -> AuditQuery {
    AuditQuery {
        kind,
        actor: actor.map(Principal::new),
        limit: if limit == 0 { None } else { Some(limit) },
        after_sequence: after,
    }
}
