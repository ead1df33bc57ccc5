//! # Connection Store Trait
//!
//! The contract between the graph engine and the hosted backend that owns
//! user and connection records. The engine is a pure in-memory
//! transformation layer; everything durable lives behind this trait.
//!
//! ## Implementations
//!
//! | Store | Module | Description |
//! |-------|--------|-------------|
//! | `MemoryStore` | `memory` | In-memory for testing/embedding |

pub mod memory;

use async_trait::async_trait;

use crate::model::{ConnectionKind, ConnectionRecord, UserId, UserProfile};
use crate::Result;

pub use memory::MemoryStore;

/// Async access to the hosted roster and connection tables.
///
/// Reads return flat collections; the engine does all shaping. Writes are
/// issued by the mutation reconciler after its optimistic local edit.
#[async_trait]
pub trait ConnectionStore: Send + Sync + 'static {
    /// Fetch the full user roster.
    async fn fetch_roster(&self) -> Result<Vec<UserProfile>>;

    /// Fetch every pairwise connection record.
    async fn fetch_connections(&self) -> Result<Vec<ConnectionRecord>>;

    /// Upsert a connection record `{user_id, connected_user_id, kind}`.
    ///
    /// If a record already pairs the two users (either direction), its
    /// kind is updated in place; otherwise a new record is inserted.
    async fn upsert_connection(
        &self,
        user_id: &UserId,
        connected_user_id: &UserId,
        kind: ConnectionKind,
    ) -> Result<()>;

    /// Delete any record pairing the two users, in either direction.
    /// Deleting a non-existent pairing is a success.
    async fn delete_connection(&self, user_id: &UserId, connected_user_id: &UserId)
        -> Result<()>;
}
