//! # Social Graph Model
//!
//! Clean DTOs for the relationship-graph engine. These types cross every
//! boundary: store ↔ assembler ↔ highlight machine ↔ renderer.
//!
//! Design rule: this module is pure data — no I/O, no locks, no async.

pub mod connection;
pub mod link;
pub mod node;
pub mod user;

pub use connection::{ConnectionKind, ConnectionRecord};
pub use link::{link_strength, GraphLink, CONFIRMED_FRIEND_STRENGTH};
pub use node::{GraphNode, Tier};
pub use user::{UserId, UserProfile};
