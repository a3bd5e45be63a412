//! Ballot hosting service.
//!
//! Owns one ballot behind a single `RwLock`, which makes every mutating call
//! one serialized transaction:
//! 1. Apply the call to a copy of the ballot
//! 2. Swap the copy in and append the resulting record to the audit log
//! 3. Save the snapshot through the `BallotStore`
//! 4. Broadcast the record to subscribers
//!
//! A rejected call leaves the live state untouched. A failed or cancelled
//! save undoes step 2 before the write lock is released, so reads never see
//! a half-applied call.

use crate::ballot::{
    query_audit_log, AuditEntry, AuditQuery, Ballot, BallotError, BallotEvent, BallotResult,
    Principal, Proposal, ProposalId, Voter, WorkflowPhase,
};
use crate::store::{BallotSnapshot, BallotStore, StoreError};
use tokio::sync::{broadcast, RwLock};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{info, warn};

/// Buffered records per subscriber before it starts skipping.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Result type for service calls.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service errors.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The ballot rejected the call.
    #[error(transparent)]
    Ballot(#[from] BallotError),

    /// The call was valid but its result could not be persisted.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Hosts one ballot instance over a `BallotStore`.
pub struct BallotService<S: BallotStore> {
    state: RwLock<BallotSnapshot>,
    store: S,
    events: broadcast::Sender<AuditEntry>,
}

impl<S: BallotStore> BallotService<S> {
    /// Restore the ballot saved in `store`, or create one administered by `administrator`.
    ///
    /// A restored ballot keeps the administrator it was created with.
    pub async fn open(store: S, administrator: Principal) -> ServiceResult<Self> {
        let snapshot = match store.load().await? {
            Some(snapshot) => {
                if snapshot.ballot.administrator() != &administrator {
                    warn!(
                        stored = %snapshot.ballot.administrator(),
                        configured = %administrator,
                        "configured administrator differs from stored ballot; keeping stored"
                    );
                }
                info!(
                    phase = %snapshot.ballot.current_phase(),
                    records = snapshot.audit_log.len(),
                    "restored ballot"
                );
                snapshot
            }
            None => {
                let snapshot = BallotSnapshot::new(Ballot::new(administrator));
                store.save(&snapshot).await?;
                info!(administrator = %snapshot.ballot.administrator(), "created ballot");
                snapshot
            }
        };

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            state: RwLock::new(snapshot),
            store,
            events,
        })
    }

    // ------------------------------------------------------------------
    // Administrative
    // ------------------------------------------------------------------

    pub async fn add_voter(
        &self,
        caller: &Principal,
        address: &Principal,
    ) -> ServiceResult<AuditEntry> {
        self.commit(caller, |ballot| ballot.add_voter(caller, address))
            .await
    }

    pub async fn start_proposals_registering(
        &self,
        caller: &Principal,
    ) -> ServiceResult<AuditEntry> {
        self.commit(caller, |ballot| ballot.start_proposals_registering(caller))
            .await
    }

    pub async fn end_proposals_registering(&self, caller: &Principal) -> ServiceResult<AuditEntry> {
        self.commit(caller, |ballot| ballot.end_proposals_registering(caller))
            .await
    }

    pub async fn start_voting_session(&self, caller: &Principal) -> ServiceResult<AuditEntry> {
        self.commit(caller, |ballot| ballot.start_voting_session(caller))
            .await
    }

    pub async fn end_voting_session(&self, caller: &Principal) -> ServiceResult<AuditEntry> {
        self.commit(caller, |ballot| ballot.end_voting_session(caller))
            .await
    }

    pub async fn tally_votes(&self, caller: &Principal) -> ServiceResult<AuditEntry> {
        self.commit(caller, |ballot| ballot.tally_votes(caller))
            .await
    }

    // ------------------------------------------------------------------
    // Voter-facing
    // ------------------------------------------------------------------

    pub async fn add_proposal(
        &self,
        caller: &Principal,
        description: &str,
    ) -> ServiceResult<AuditEntry> {
        self.commit(caller, |ballot| ballot.add_proposal(caller, description))
            .await
    }

    pub async fn set_vote(
        &self,
        caller: &Principal,
        proposal_id: ProposalId,
    ) -> ServiceResult<AuditEntry> {
        self.commit(caller, |ballot| ballot.set_vote(caller, proposal_id))
            .await
    }

    pub async fn get_voter(&self, caller: &Principal, address: &Principal) -> ServiceResult<Voter> {
        let state = self.state.read().await;
        Ok(state.ballot.get_voter(caller, address)?)
    }

    pub async fn get_one_proposal(
        &self,
        caller: &Principal,
        id: ProposalId,
    ) -> ServiceResult<Proposal> {
        let state = self.state.read().await;
        Ok(state.ballot.get_one_proposal(caller, id)?.clone())
    }

    // ------------------------------------------------------------------
    // Universal reads
    // ------------------------------------------------------------------

    pub async fn current_phase(&self) -> WorkflowPhase {
        self.state.read().await.ballot.current_phase()
    }

    pub async fn winning_proposal_id(&self) -> ProposalId {
        self.state.read().await.ballot.winning_proposal_id()
    }

    pub async fn administrator(&self) -> Principal {
        self.state.read().await.ballot.administrator().clone()
    }

    pub async fn proposal_count(&self) -> usize {
        self.state.read().await.ballot.proposal_count()
    }

    /// Filtered view of the audit log, most recent first.
    pub async fn audit(&self, query: &AuditQuery) -> Vec<AuditEntry> {
        let state = self.state.read().await;
        query_audit_log(state.audit_log.entries(), query)
    }

    /// Copy of the committed state.
    pub async fn snapshot(&self) -> BallotSnapshot {
        self.state.read().await.clone()
    }

    /// Stream of records committed after this call.
    ///
    /// A subscriber that falls more than the channel capacity behind skips
    /// the records it missed; the audit log still has them.
    pub fn subscribe(&self) -> impl Stream<Item = AuditEntry> + Send + Unpin {
        BroadcastStream::new(self.events.subscribe()).filter_map(|item| item.ok())
    }

    async fn commit<F>(&self, caller: &Principal, op: F) -> ServiceResult<AuditEntry>
    where
        F: FnOnce(&mut Ballot) -> BallotResult<BallotEvent>,
    {
        let mut state = self.state.write().await;

        let mut staged = state.ballot.clone();
        let event = match op(&mut staged) {
            Ok(event) => event,
            Err(e) => {
                warn!(caller = %caller, error = %e, "ballot call rejected");
                return Err(e.into());
            }
        };

        let previous = std::mem::replace(&mut state.ballot, staged);
        let entry = state.audit_log.append(caller.clone(), event).clone();
        let pending = PendingCommit {
            state: &mut *state,
            previous: Some(previous),
        };

        if let Err(e) = self.store.save(pending.snapshot()).await {
            warn!(caller = %caller, error = %e, "failed to persist ballot; call discarded");
            return Err(e.into());
        }

        pending.keep();
        log_committed(&entry);
        // Sent under the lock so subscribers see records in commit order.
        // No subscribers is not an error.
        let _ = self.events.send(entry.clone());

        Ok(entry)
    }
}

/// A call applied to the live snapshot but not yet saved.
///
/// Dropping it without `keep` restores the previous ballot and removes the
/// appended record, which also covers a commit future cancelled mid-save.
struct PendingCommit<'a> {
    state: &'a mut BallotSnapshot,
    previous: Option<Ballot>,
}

impl PendingCommit<'_> {
    fn snapshot(&self) -> &BallotSnapshot {
        self.state
    }

    fn keep(mut self) {
        self.previous = None;
    }
}

impl Drop for PendingCommit<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.state.ballot = previous;
            self.state.audit_log.discard_last();
        }
    }
}

fn log_committed(entry: &AuditEntry) {
    match &entry.event {
        BallotEvent::VoterRegistered { address } => {
            info!(sequence = entry.sequence, voter = %address, "voter registered");
        }
        BallotEvent::WorkflowStatusChange { previous, new } => {
            info!(
                sequence = entry.sequence,
                previous = %previous,
                new = %new,
                "workflow status changed"
            );
        }
        BallotEvent::ProposalRegistered { id } => {
            info!(
                sequence = entry.sequence,
                proposal_id = id,
                actor = %entry.actor,
                "proposal registered"
            );
        }
        BallotEvent::Voted { voter, proposal_id } => {
            info!(
                sequence = entry.sequence,
                voter = %voter,
                proposal_id = proposal_id,
                "vote cast"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreResult};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    /// Store whose saves never finish while `stall` is set.
    #[derive(Clone, Default)]
    struct StallingStore {
        inner: MemoryStore,
        stall: Arc<AtomicBool>,
    }

    #[async_trait::async_trait]
    impl BallotStore for StallingStore {
        async fn load(&self) -> StoreResult<Option<BallotSnapshot>> {
            self.inner.load().await
        }

        async fn save(&self, snapshot: &BallotSnapshot) -> StoreResult<()> {
            if self.stall.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            self.inner.save(snapshot).await
        }
    }

    fn owner() -> Principal {
        Principal::from("owner")
    }

    async fn open_service() -> (BallotService<MemoryStore>, MemoryStore) {
        let store = MemoryStore::new();
        let service = BallotService::open(store.clone(), owner()).await.unwrap();
        (service, store)
    }

    #[tokio::test]
    async fn test_open_creates_and_persists() {
        let (service, store) = open_service().await;
        assert_eq!(
            service.current_phase().await,
            WorkflowPhase::RegisteringVoters
        );
        assert!(store.raw().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_commit_appends_audit_entry() {
        let (service, _store) = open_service().await;
        let voter = Principal::from("voter1");

        let entry = service.add_voter(&owner(), &voter).await.unwrap();
        assert_eq!(entry.sequence, 0);
        assert_eq!(entry.actor, owner());
        assert_eq!(
            entry.event,
            BallotEvent::VoterRegistered {
                address: voter.clone()
            }
        );

        let log = service.audit(&AuditQuery::default()).await;
        assert_eq!(log, vec![entry]);
    }

    #[tokio::test]
    async fn test_rejected_call_is_not_logged() {
        let (service, _store) = open_service().await;
        let voter = Principal::from("voter1");

        let err = service.add_voter(&voter, &voter).await.unwrap_err();
        assert!(matches!(err, ServiceError::Ballot(BallotError::NotAdministrator)));
        assert!(service.audit(&AuditQuery::default()).await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_save_discards_call() {
        let (service, store) = open_service().await;
        service
            .add_voter(&owner(), &Principal::from("voter1"))
            .await
            .unwrap();
        let committed = service.snapshot().await;
        store.set_fail_saves(true).unwrap();

        let err = service
            .start_proposals_registering(&owner())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Store(_)));
        assert_eq!(service.snapshot().await, committed);

        store.set_fail_saves(false).unwrap();
        let entry = service
            .start_proposals_registering(&owner())
            .await
            .unwrap();
        assert_eq!(entry.sequence, 1);
        assert_eq!(
            service.current_phase().await,
            WorkflowPhase::ProposalsRegistrationStarted
        );

        let snapshot = service.snapshot().await;
        assert_eq!(snapshot.audit_log.len(), 2);
        assert!(snapshot.audit_log.is_contiguous());
    }

    #[tokio::test]
    async fn test_cancelled_commit_is_rolled_back() {
        let store = StallingStore::default();
        let service = BallotService::open(store.clone(), owner()).await.unwrap();
        service
            .add_voter(&owner(), &Principal::from("voter1"))
            .await
            .unwrap();
        let committed = service.snapshot().await;

        store.stall.store(true, Ordering::SeqCst);
        let admin = owner();
        let call = service.start_proposals_registering(&admin);
        assert!(timeout(Duration::from_millis(20), call).await.is_err());
        assert_eq!(service.snapshot().await, committed);

        store.stall.store(false, Ordering::SeqCst);
        let entry = service
            .start_proposals_registering(&owner())
            .await
            .unwrap();
        assert_eq!(entry.sequence, 1);
    }

    #[tokio::test]
    async fn test_reopen_restores_state() {
        let (service, store) = open_service().await;
        service
            .add_voter(&owner(), &Principal::from("voter1"))
            .await
            .unwrap();
        service.start_proposals_registering(&owner()).await.unwrap();
        drop(service);

        // Configured administrator is ignored for an existing ballot
        let reopened = BallotService::open(store, Principal::from("intruder"))
            .await
            .unwrap();
        assert_eq!(reopened.administrator().await, owner());
        assert_eq!(
            reopened.current_phase().await,
            WorkflowPhase::ProposalsRegistrationStarted
        );
        assert_eq!(reopened.snapshot().await.audit_log.len(), 2);
    }

    #[tokio::test]
    async fn test_subscribe_receives_commits_in_order() {
        let (service, _store) = open_service().await;
        let mut stream = service.subscribe();

        service
            .add_voter(&owner(), &Principal::from("voter1"))
            .await
            .unwrap();
        service.start_proposals_registering(&owner()).await.unwrap();

        let first = stream.next().await.unwrap();
        let second = stream.next().await.unwrap();
        assert_eq!(first.sequence, 0);
        assert_eq!(second.sequence, 1);
        assert!(matches!(
            second.event,
            BallotEvent::WorkflowStatusChange { .. }
        ));
    }
}
