//! Optimistic mutation reconciliation.
//!
//! Add/remove connection requests run in two phases: the link-level edit
//! is applied to the in-memory snapshot first, then the remote write is
//! issued. The remote call's resolution is the only thing allowed to
//! revert the optimistic edit — reconciliation is serialized per target
//! id, so no other mutation can interleave with an in-flight one for the
//! same link.
//!
//! The reconciler owns link-level state only. Tiers, mutual counts, and
//! scores are not recomputed here; a full reload does that.

use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::assemble::GraphSnapshot;
use crate::model::{ConnectionKind, GraphLink, UserId, CONFIRMED_FRIEND_STRENGTH};
use crate::store::ConnectionStore;
use crate::{Error, Result};

/// Per-target async locks. One mutation per target id at a time; the lock
/// is held from the optimistic apply through the remote resolution and any
/// rollback.
#[derive(Default)]
pub(crate) struct LockTable {
    locks: Mutex<HashMap<UserId, Arc<tokio::sync::Mutex<()>>>>,
}

impl LockTable {
    pub(crate) fn lock_for(&self, target: &UserId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock();
        // Entries held only by the table belong to finished mutations;
        // drop them so the table tracks in-flight targets, not history.
        locks.retain(|id, lock| id == target || Arc::strong_count(lock) > 1);
        locks
            .entry(target.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().len()
    }
}

/// Undo record for an optimistic `add_connection` edit.
enum AddEdit {
    /// A new link was appended.
    Inserted,
    /// An existing link was upgraded in place; the prior value is kept.
    Upgraded(GraphLink),
    /// The link was already a confirmed friend link — nothing changed.
    Unchanged,
}

pub(crate) struct Reconciler<'a, S> {
    pub store: &'a S,
    pub snapshot: &'a RwLock<Option<GraphSnapshot>>,
    pub locks: &'a LockTable,
}

impl<S: ConnectionStore> Reconciler<'_, S> {
    /// Upsert a friend link between self and `target`.
    ///
    /// Existing links are upgraded to `Friend` at the confirmed strength in
    /// place; absent links are inserted. Idempotent at the link level — an
    /// already-confirmed link stays as-is, though the remote upsert is
    /// still issued.
    pub(crate) async fn add_connection(&self, self_id: &UserId, target: &UserId) -> Result<()> {
        if target == self_id {
            warn!("add_connection targeting self, ignoring");
            return Ok(());
        }
        let lock = self.locks.lock_for(target);
        let _guard = lock.lock().await;

        // Phase 1: optimistic local edit, under a short write lock.
        let (edit, stamp) = {
            let mut slot = self.snapshot.write();
            let snapshot = slot.as_mut().ok_or(Error::NotLoaded)?;
            if !snapshot.contains(target) {
                return Err(Error::UnknownUser(target.clone()));
            }
            let stamp = snapshot.built_at;

            let edit = match snapshot.find_link(self_id, target) {
                Some(idx) => {
                    let link = &mut snapshot.links[idx];
                    if link.kind == ConnectionKind::Friend
                        && link.strength == CONFIRMED_FRIEND_STRENGTH
                    {
                        AddEdit::Unchanged
                    } else {
                        let prior = link.clone();
                        link.kind = ConnectionKind::Friend;
                        link.strength = CONFIRMED_FRIEND_STRENGTH;
                        AddEdit::Upgraded(prior)
                    }
                }
                None => {
                    snapshot.insert_link(GraphLink::new(
                        self_id.clone(),
                        target.clone(),
                        ConnectionKind::Friend,
                        self_id,
                    ));
                    AddEdit::Inserted
                }
            };
            (edit, stamp)
        };

        // Phase 2: remote write, then commit or rollback.
        match self
            .store
            .upsert_connection(self_id, target, ConnectionKind::Friend)
            .await
        {
            Ok(()) => {
                debug!(target = %target, "add_connection committed");
                Ok(())
            }
            Err(err) => {
                self.rollback_add(self_id, target, edit, stamp);
                Err(Error::Mutation {
                    target: target.clone(),
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Remove any link between self and `target`, either orientation.
    ///
    /// Removing an absent link is a no-op success; no remote call is made.
    pub(crate) async fn remove_connection(
        &self,
        self_id: &UserId,
        target: &UserId,
    ) -> Result<()> {
        if target == self_id {
            warn!("remove_connection targeting self, ignoring");
            return Ok(());
        }
        let lock = self.locks.lock_for(target);
        let _guard = lock.lock().await;

        let (removed, stamp) = {
            let mut slot = self.snapshot.write();
            let snapshot = slot.as_mut().ok_or(Error::NotLoaded)?;
            let stamp = snapshot.built_at;
            match snapshot.find_link(self_id, target) {
                Some(idx) => (snapshot.remove_link(idx), stamp),
                None => return Ok(()),
            }
        };

        match self.store.delete_connection(self_id, target).await {
            Ok(()) => {
                debug!(target = %target, "remove_connection committed");
                Ok(())
            }
            Err(err) => {
                self.rollback_remove(removed, stamp);
                Err(Error::Mutation {
                    target: target.clone(),
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Revert an optimistic add. Skipped if a fresh load replaced the
    /// snapshot mid-flight — the rebuild already reflects store truth and
    /// the optimistic edit died with the old snapshot.
    fn rollback_add(
        &self,
        self_id: &UserId,
        target: &UserId,
        edit: AddEdit,
        stamp: chrono::DateTime<chrono::Utc>,
    ) {
        let mut slot = self.snapshot.write();
        let Some(snapshot) = slot.as_mut() else { return };
        if snapshot.built_at != stamp {
            debug!("snapshot replaced during mutation, rollback skipped");
            return;
        }
        match edit {
            AddEdit::Unchanged => {}
            AddEdit::Inserted => {
                if let Some(idx) = snapshot.find_link(self_id, target) {
                    snapshot.remove_link(idx);
                }
            }
            AddEdit::Upgraded(prior) => {
                if let Some(idx) = snapshot.find_link(self_id, target) {
                    snapshot.links[idx] = prior;
                }
            }
        }
        warn!(target = %target, "add_connection rolled back");
    }

    fn rollback_remove(&self, removed: GraphLink, stamp: chrono::DateTime<chrono::Utc>) {
        let mut slot = self.snapshot.write();
        let Some(snapshot) = slot.as_mut() else { return };
        if snapshot.built_at != stamp {
            debug!("snapshot replaced during mutation, rollback skipped");
            return;
        }
        warn!(
            source = %removed.source,
            target = %removed.target,
            "remove_connection rolled back"
        );
        snapshot.insert_link(removed);
    }
}
