//! # tiergraph — Relationship-Graph Engine
//!
//! Turns a flat set of pairwise connection records into a tiered social
//! graph: relationship tiers by BFS from the current user, mutual-connection
//! counts, compatibility scores for suggested contacts, a hover
//! highlight/neighbor-expansion machine, and optimistic add/remove
//! mutations with rollback.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `ConnectionStore` is the contract between the engine
//!    and the hosted backend
//! 2. **Clean DTOs**: `UserProfile`, `ConnectionRecord`, `GraphNode`,
//!    `GraphLink` cross all boundaries
//! 3. **Links store ids only**: nodes are resolved through the snapshot's
//!    lookup table, never embedded in links
//! 4. **Optimistic mutation is two-phase**: apply locally → await remote →
//!    commit or rollback, with the rollback path a first-class branch
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tiergraph::{SocialGraph, UserId};
//!
//! # async fn example() -> tiergraph::Result<()> {
//! let graph = SocialGraph::open_memory(UserId::from("me"));
//!
//! graph.load().await?;
//!
//! if let Some(snapshot) = graph.snapshot() {
//!     for node in &snapshot.nodes {
//!         println!("{} → {}", node.id, node.tier);
//!     }
//! }
//!
//! graph.on_node_hover(Some(&UserId::from("friend-1")));
//! graph.add_connection(&UserId::from("suggested-7")).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Stores
//!
//! | Store | Module | Description |
//! |-------|--------|-------------|
//! | Memory | `store::memory` | In-memory for testing/embedding |

// ============================================================================
// Modules
// ============================================================================

pub mod affinity;
pub mod assemble;
pub mod highlight;
pub mod model;
mod reconcile;
pub mod store;
pub mod tiers;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use reconcile::{LockTable, Reconciler};

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    ConnectionKind, ConnectionRecord, GraphLink, GraphNode, Tier, UserId, UserProfile,
};

// ============================================================================
// Re-exports: Engine surface
// ============================================================================

pub use assemble::GraphSnapshot;
pub use highlight::{HoverState, HOVER_SCALE};
pub use store::{ConnectionStore, MemoryStore};

// ============================================================================
// Top-level SocialGraph handle
// ============================================================================

/// The primary entry point. Wraps a connection store, owns the current
/// in-memory snapshot, and exposes the event hooks the renderer drives.
///
/// All graph computation is synchronous over one snapshot; only `load` and
/// the two mutation calls perform I/O. Cheap to clone — handles share
/// state.
pub struct SocialGraph<S: ConnectionStore> {
    store: Arc<S>,
    self_id: UserId,
    state: Arc<SharedState>,
}

struct SharedState {
    snapshot: RwLock<Option<GraphSnapshot>>,
    hover: RwLock<HoverState>,
    selection: RwLock<Option<UserId>>,
    last_error: RwLock<Option<Error>>,
    /// Monotonic load generation: the most recently initiated load wins.
    load_gen: AtomicU64,
    locks: LockTable,
}

impl<S: ConnectionStore> Clone for SocialGraph<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            self_id: self.self_id.clone(),
            state: self.state.clone(),
        }
    }
}

impl<S: ConnectionStore> SocialGraph<S> {
    /// Create a graph over the given store, rooted at `self_id`.
    pub fn with_store(store: S, self_id: UserId) -> Self {
        Self {
            store: Arc::new(store),
            self_id,
            state: Arc::new(SharedState {
                snapshot: RwLock::new(None),
                hover: RwLock::new(HoverState::Idle),
                selection: RwLock::new(None),
                last_error: RwLock::new(None),
                load_gen: AtomicU64::new(0),
                locks: LockTable::default(),
            }),
        }
    }

    pub fn self_id(&self) -> &UserId {
        &self.self_id
    }

    /// Access the underlying store (for advanced use).
    pub fn store(&self) -> &S {
        &self.store
    }

    // ========================================================================
    // Loader
    // ========================================================================

    /// Fetch the roster and connection set and rebuild the graph from
    /// scratch.
    ///
    /// No partial graph is ever published: a fetch failure leaves the
    /// previous snapshot in place and returns `Error::Load`. If another
    /// load starts while this one is in flight, the stale result is
    /// discarded — the most recently initiated load wins. A successful
    /// publish resets hover to Idle; the selection survives only if the
    /// selected user still exists.
    pub async fn load(&self) -> Result<()> {
        let generation = self.state.load_gen.fetch_add(1, Ordering::SeqCst) + 1;

        let fetched = async {
            let roster = self.store.fetch_roster().await?;
            let connections = self.store.fetch_connections().await?;
            Ok::<_, Error>((roster, connections))
        }
        .await;

        let (roster, connections) = match fetched {
            Ok(data) => data,
            Err(err) => {
                let err = Error::Load(err.to_string());
                *self.state.last_error.write() = Some(err.clone());
                return Err(err);
            }
        };

        let snapshot = assemble::build(&roster, &connections, &self.self_id);

        {
            let mut slot = self.state.snapshot.write();
            if self.state.load_gen.load(Ordering::SeqCst) != generation {
                warn!(generation, "superseded load discarded");
                return Ok(());
            }
            let mut selection = self.state.selection.write();
            if let Some(selected) = selection.as_ref() {
                if !snapshot.contains(selected) {
                    *selection = None;
                }
            }
            *slot = Some(snapshot);
            *self.state.hover.write() = HoverState::Idle;
        }
        *self.state.last_error.write() = None;
        debug!(generation, "graph published");
        Ok(())
    }

    // ========================================================================
    // Renderer surface
    // ========================================================================

    /// Read-only clone of the current `{nodes, links}` snapshot.
    pub fn snapshot(&self) -> Option<GraphSnapshot> {
        self.state.snapshot.read().clone()
    }

    /// Hover event hook. `Some(id)` enters `Hovered(id)`, `None` returns
    /// to Idle. Presentation weights are recomputed from the tier baseline
    /// on every transition. A no-op before the first successful load.
    pub fn on_node_hover(&self, target: Option<&UserId>) {
        let mut slot = self.state.snapshot.write();
        let Some(snapshot) = slot.as_mut() else { return };
        let next = highlight::apply_hover(snapshot, target);
        *self.state.hover.write() = next;
    }

    /// Currently hovered node, if any.
    pub fn hovered(&self) -> Option<UserId> {
        self.state.hover.read().hovered_id().cloned()
    }

    /// Record at most one selected node for detail display. Independent of
    /// hover; never alters weights or highlight flags. Selecting an id
    /// absent from the snapshot clears the selection.
    ///
    /// Lock order is snapshot before selection, matching `load`.
    pub fn select(&self, target: Option<UserId>) {
        let validated = match target {
            Some(id) => {
                let slot = self.state.snapshot.read();
                match slot.as_ref() {
                    Some(snapshot) if snapshot.contains(&id) => Some(id),
                    _ => {
                        warn!(id = %id, "selection target not in snapshot, cleared");
                        None
                    }
                }
            }
            None => None,
        };
        *self.state.selection.write() = validated;
    }

    pub fn selected(&self) -> Option<UserId> {
        self.state.selection.read().clone()
    }

    /// The current-error slot the renderer may display.
    pub fn last_error(&self) -> Option<Error> {
        self.state.last_error.read().clone()
    }

    pub fn clear_error(&self) {
        *self.state.last_error.write() = None;
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Add (or confirm) a friend connection between self and `target`.
    ///
    /// The link edit is applied optimistically, then the remote upsert is
    /// issued; on remote failure the edit is reverted exactly and the
    /// failure lands in the error slot. Tier and score fields are not
    /// recomputed — call [`load`](Self::load) for that.
    pub async fn add_connection(&self, target: &UserId) -> Result<()> {
        let result = self.reconciler().add_connection(&self.self_id, target).await;
        if let Err(err) = &result {
            *self.state.last_error.write() = Some(err.clone());
        }
        result
    }

    /// Remove any connection between self and `target`, either direction.
    /// Removing an absent link is a no-op success.
    pub async fn remove_connection(&self, target: &UserId) -> Result<()> {
        let result = self
            .reconciler()
            .remove_connection(&self.self_id, target)
            .await;
        if let Err(err) = &result {
            *self.state.last_error.write() = Some(err.clone());
        }
        result
    }

    fn reconciler(&self) -> Reconciler<'_, S> {
        Reconciler {
            store: &self.store,
            snapshot: &self.state.snapshot,
            locks: &self.state.locks,
        }
    }
}

/// In-memory graph for testing and embedding.
impl SocialGraph<MemoryStore> {
    pub fn open_memory(self_id: UserId) -> Self {
        Self::with_store(MemoryStore::new(), self_id)
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Roster or connection fetch failed; no partial graph was published.
    #[error("load failed: {0}")]
    Load(String),

    /// A remote write failed after the optimistic local edit; the edit has
    /// been reverted.
    #[error("mutation failed for {target}: {reason}")]
    Mutation { target: UserId, reason: String },

    /// Transport/backend error surfaced by a `ConnectionStore`.
    #[error("store error: {0}")]
    Store(String),

    /// The referenced user is not in the current snapshot.
    #[error("unknown user: {0}")]
    UnknownUser(UserId),

    /// An operation that needs a graph ran before the first load.
    #[error("graph not loaded")]
    NotLoaded,
}

pub type Result<T> = std::result::Result<T, Error>;
