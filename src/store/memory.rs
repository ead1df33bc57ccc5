//! In-memory connection store.
//!
//! This is the reference implementation of `ConnectionStore`. It uses flat
//! Vecs protected by a parking_lot RwLock and supports failure injection so
//! tests can exercise the load-error and mutation-rollback paths without a
//! network.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use crate::model::{ConnectionKind, ConnectionRecord, UserId, UserProfile};
use crate::{Error, Result};

use super::ConnectionStore;

/// In-memory roster and connection tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    roster: RwLock<Vec<UserProfile>>,
    connections: RwLock<Vec<ConnectionRecord>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    /// Applied after a fetch has read its data — simulates transport
    /// latency so tests can overlap loads deterministically.
    read_delay: Mutex<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the roster and connection tables in one call.
    pub fn seeded(roster: Vec<UserProfile>, connections: Vec<ConnectionRecord>) -> Self {
        let store = Self::new();
        *store.inner.roster.write() = roster;
        *store.inner.connections.write() = connections;
        store
    }

    pub fn insert_user(&self, profile: UserProfile) {
        self.inner.roster.write().push(profile);
    }

    pub fn insert_connection(&self, record: ConnectionRecord) {
        self.inner.connections.write().push(record);
    }

    pub fn remove_user(&self, id: &UserId) {
        self.inner.roster.write().retain(|p| p.id != *id);
    }

    /// When set, fetches fail with `Error::Store`.
    pub fn set_fail_reads(&self, fail: bool) {
        self.inner.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// When set, upserts and deletes fail with `Error::Store`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Delay applied to fetches after they read their data.
    pub fn set_read_delay(&self, delay: Duration) {
        *self.inner.read_delay.lock() = delay;
    }

    /// Snapshot of the stored connection table (test inspection).
    pub fn connections(&self) -> Vec<ConnectionRecord> {
        self.inner.connections.read().clone()
    }

    fn check_reads(&self) -> Result<()> {
        if self.inner.fail_reads.load(Ordering::SeqCst) {
            Err(Error::Store("simulated read failure".into()))
        } else {
            Ok(())
        }
    }

    fn check_writes(&self) -> Result<()> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            Err(Error::Store("simulated write failure".into()))
        } else {
            Ok(())
        }
    }

    async fn delay(&self) {
        let delay = *self.inner.read_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ConnectionStore for MemoryStore {
    async fn fetch_roster(&self) -> Result<Vec<UserProfile>> {
        self.check_reads()?;
        let roster = self.inner.roster.read().clone();
        self.delay().await;
        Ok(roster)
    }

    async fn fetch_connections(&self) -> Result<Vec<ConnectionRecord>> {
        self.check_reads()?;
        let connections = self.inner.connections.read().clone();
        self.delay().await;
        Ok(connections)
    }

    async fn upsert_connection(
        &self,
        user_id: &UserId,
        connected_user_id: &UserId,
        kind: ConnectionKind,
    ) -> Result<()> {
        self.check_writes()?;
        let mut connections = self.inner.connections.write();
        if let Some(existing) = connections
            .iter_mut()
            .find(|r| r.pairs(user_id, connected_user_id))
        {
            existing.kind = kind;
        } else {
            connections.push(ConnectionRecord::new(
                user_id.clone(),
                connected_user_id.clone(),
                kind,
            ));
        }
        Ok(())
    }

    async fn delete_connection(
        &self,
        user_id: &UserId,
        connected_user_id: &UserId,
    ) -> Result<()> {
        self.check_writes()?;
        self.inner
            .connections
            .write()
            .retain(|r| !r.pairs(user_id, connected_user_id));
        Ok(())
    }
}
