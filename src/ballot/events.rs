//! Ballot records and the append-only audit log.
//!
//! Every successful mutation yields exactly one `BallotEvent`. The hosting
//! service wraps committed events in an `AuditEntry` and appends them here.
//!
//! Design principles:
//! - Immutable append-only log (no deletion, no reordering)
//! - Gapless sequence numbers starting at 0
//! - Actor recorded for every entry (ballots are not secret)

use super::access::Principal;
use super::phase::WorkflowPhase;
use super::ProposalId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Structured record emitted by a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BallotEvent {
    VoterRegistered {
        address: Principal,
    },
    WorkflowStatusChange {
        previous: WorkflowPhase,
        new: WorkflowPhase,
    },
    ProposalRegistered {
        id: ProposalId,
    },
    Voted {
        voter: Principal,
        proposal_id: ProposalId,
    },
}

impl BallotEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::VoterRegistered { .. } => EventKind::VoterRegistered,
            Self::WorkflowStatusChange { .. } => EventKind::WorkflowStatusChange,
            Self::ProposalRegistered { .. } => EventKind::ProposalRegistered,
            Self::Voted { .. } => EventKind::Voted,
        }
    }
}

impl fmt::Display for BallotEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VoterRegistered { address } => write!(f, "voter {} registered", address),
            Self::WorkflowStatusChange { previous, new } => {
                write!(f, "workflow {} -> {}", previous, new)
            }
            Self::ProposalRegistered { id } => write!(f, "proposal #{} registered", id),
            Self::Voted { voter, proposal_id } => {
                write!(f, "{} voted for proposal #{}", voter, proposal_id)
            }
        }
    }
}

/// Record kinds, used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    VoterRegistered,
    WorkflowStatusChange,
    ProposalRegistered,
    Voted,
}

/// Single committed audit log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Position in the log (0-based, gapless).
    pub sequence: u64,
    /// Unix timestamp (seconds since epoch).
    pub timestamp: u64,
    /// Principal whose call produced the event.
    pub actor: Principal,
    pub event: BallotEvent,
}

/// Append-only audit log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `event` with the next sequence number and the current time.
    pub fn append(&mut self, actor: Principal, event: BallotEvent) -> &AuditEntry {
        let entry = AuditEntry {
            sequence: self.entries.len() as u64,
            timestamp: unix_now(),
            actor,
            event,
        };
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    /// Remove the newest entry, undoing an append that was never committed.
    pub(crate) fn discard_last(&mut self) -> Option<AuditEntry> {
        self.entries.pop()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when sequence numbers run 0..len without gaps.
    pub fn is_contiguous(&self) -> bool {
        self.entries
            .iter()
            .enumerate()
            .all(|(i, entry)| entry.sequence == i as u64)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Query options for the audit log.
#[derive(Debug, Clone)]
pub struct AuditQuery {
    /// Filter by record kind.
    pub kind: Option<EventKind>,
    /// Filter by actor.
    pub actor: Option<Principal>,
    /// Limit number of results (most recent first).
    pub limit: Option<usize>,
    /// Only show entries with a sequence number greater than this.
    pub after_sequence: Option<u64>,
}

impl Default for AuditQuery {
    fn default() -> Self {
        Self {
            kind: None,
            actor: None,
            limit: Some(50),
            after_sequence: None,
        }
    }
}

/// Query the audit log with filters.
///
/// Returns entries in reverse order (most recent first).
pub fn query_audit_log(entries: &[AuditEntry], query: &AuditQuery) -> Vec<AuditEntry> {
    let matches = entries.iter().rev().filter(|entry| {
        if let Some(kind) = query.kind {
            if entry.event.kind() != kind {
                return false;
            }
        }

        if let Some(ref actor) = query.actor {
            if &entry.actor != actor {
                return false;
            }
        }

        if let Some(after) = query.after_sequence {
            if entry.sequence <= after {
                return false;
            }
        }

        true
    });

    match query.limit {
        Some(limit) => matches.take(limit).cloned().collect(),
        None => matches.cloned().collect(),
    }
}

/// Format audit entries for operator display.
pub fn format_audit_log(entries: &[AuditEntry]) -> String {
    if entries.is_empty() {
        return "No audit entries found.".to_string();
    }

    let mut output = String::from("Ballot audit log\n\n");

    for entry in entries {
        output.push_str(&format!(
            "#{} [{}] {}: {}\n",
            entry.sequence, entry.timestamp, entry.actor, entry.event
        ));
    }

    output.trim_end().to_string()
}
