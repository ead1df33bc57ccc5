//! Hover highlight and neighbor expansion.
//!
//! Two states: `Idle` and `Hovered(id)`. Every transition recomputes the
//! presentation fields from the tier baseline — nothing carries over from
//! the previous hover, so hover/unhover cycles restore the snapshot to its
//! exact baseline. Only `size_weight` and `highlighted` are ever written
//! here; tier, mutual counts, and scores stay untouched.

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::assemble::GraphSnapshot;
use crate::model::{Tier, UserId};

/// Enlargement applied to the hovered node and its neighbors, relative to
/// their tier baseline.
pub const HOVER_SCALE: f64 = 1.5;

/// Current hover state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HoverState {
    #[default]
    Idle,
    Hovered(UserId),
}

impl HoverState {
    pub fn hovered_id(&self) -> Option<&UserId> {
        match self {
            HoverState::Idle => None,
            HoverState::Hovered(id) => Some(id),
        }
    }
}

/// Apply a hover transition to the snapshot and return the new state.
///
/// `Some(id)` enters `Hovered(id)`; `None` returns to `Idle`. Hovering an
/// id absent from the snapshot (e.g. stale after a reload) resets to Idle.
pub fn apply_hover(snapshot: &mut GraphSnapshot, target: Option<&UserId>) -> HoverState {
    // Baseline first: hover-to-hover is exactly unhover-then-hover.
    snapshot.reset_presentation();

    let Some(id) = target else {
        return HoverState::Idle;
    };
    if !snapshot.contains(id) {
        warn!(id = %id, "hover target not in snapshot, ignoring");
        return HoverState::Idle;
    }

    let mut connected: HashSet<UserId> = HashSet::new();
    connected.insert(id.clone());
    for neighbor in snapshot.neighbor_ids(id) {
        connected.insert(neighbor);
    }

    for member in &connected {
        if let Some(node) = snapshot.node_mut(member) {
            node.size_weight = node.tier.base_weight() * HOVER_SCALE;
            // Suggested neighbors of the hovered node get called out.
            node.highlighted = node.tier == Tier::Suggested && member != id;
        }
    }

    HoverState::Hovered(id.clone())
}
