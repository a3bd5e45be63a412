//! In-memory ballot store.
//!
//! Holds the encoded snapshot so restores go through the same CBOR path as
//! the file store. Clones share the same storage.

use super::traits::*;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    bytes: Option<Vec<u8>>,
    fail_saves: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent saves fail (for exercising commit rollback).
    pub fn set_fail_saves(&self, fail: bool) -> StoreResult<()> {
        self.with_state(|state| state.fail_saves = fail)
    }

    /// Raw stored bytes, if any.
    pub fn raw(&self) -> StoreResult<Option<Vec<u8>>> {
        self.with_state(|state| state.bytes.clone())
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MemoryState) -> T) -> StoreResult<T> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        Ok(f(&mut state))
    }
}

#[async_trait]
impl BallotStore for MemoryStore {
    async fn load(&self) -> StoreResult<Option<BallotSnapshot>> {
        match self.raw()? {
            Some(bytes) => BallotSnapshot::decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    async fn save(&self, snapshot: &BallotSnapshot) -> StoreResult<()> {
        let bytes = snapshot.encode()?;
        self.with_state(|state| {
            if state.fail_saves {
                return Err(StoreError::Unavailable("saves disabled".to_string()));
            }
            state.bytes = Some(bytes);
            Ok(())
        })?
    }
}
