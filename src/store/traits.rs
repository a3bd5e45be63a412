//! Trait abstraction for ballot persistence.
//!
//! The ballot core never touches storage. The hosting service saves a
//! `BallotSnapshot` after every committed mutation and restores it on open.

use crate::ballot::{AuditLog, Ballot, InvariantViolation};
use crate::serialization::{from_cbor, to_cbor, SerializationError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Current snapshot schema.
pub const SCHEMA_VERSION: u32 = 1;

/// Everything persisted for one ballot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotSnapshot {
    pub schema_version: u32,
    pub ballot: Ballot,
    #[serde(default)]
    pub audit_log: AuditLog,
}

impl BallotSnapshot {
    /// Fresh snapshot with an empty audit log.
    pub fn new(ballot: Ballot) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            ballot,
            audit_log: AuditLog::new(),
        }
    }

    pub fn encode(&self) -> StoreResult<Vec<u8>> {
        Ok(to_cbor(self)?)
    }

    /// Decode and validate.
    pub fn decode(bytes: &[u8]) -> StoreResult<Self> {
        let snapshot: BallotSnapshot = from_cbor(bytes)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Reject snapshots from another schema or with broken invariants.
    pub fn validate(&self) -> StoreResult<()> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(StoreError::Corrupt(format!(
                "unsupported schema version {} (expected {})",
                self.schema_version, SCHEMA_VERSION
            )));
        }
        self.ballot.check_invariants()?;
        if !self.audit_log.is_contiguous() {
            return Err(StoreError::Corrupt("audit log sequence has gaps".to_string()));
        }
        Ok(())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    #[error("Corrupt snapshot: {0}")]
    Corrupt(String),

    #[error("Inconsistent snapshot: {0}")]
    Inconsistent(#[from] InvariantViolation),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Snapshot persistence for one ballot.
///
/// Implementations must replace the previous snapshot atomically: a reader
/// sees either the old snapshot or the new one.
#[async_trait]
pub trait BallotStore: Send + Sync {
    /// Last saved snapshot, or `None` if nothing was saved yet.
    async fn load(&self) -> StoreResult<Option<BallotSnapshot>>;

    /// Replace the stored snapshot.
    async fn save(&self, snapshot: &BallotSnapshot) -> StoreResult<()>;
}
