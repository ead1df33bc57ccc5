//! Derived graph links.

use serde::{Deserialize, Serialize};

use super::{ConnectionKind, UserId};

/// Strength of a confirmed friend link touching self. `add_connection`
/// upgrades existing links to exactly this value.
pub const CONFIRMED_FRIEND_STRENGTH: f64 = 1.0;

/// A link in the assembled graph.
///
/// Stores ids only — node objects are resolved at render time through the
/// snapshot's lookup table, never embedded here. That keeps the structure
/// acyclic and trivially cloneable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphLink {
    pub source: UserId,
    pub target: UserId,
    #[serde(rename = "relationshipType")]
    pub kind: ConnectionKind,
    /// In (0, 1], derived from kind and whether an endpoint is self.
    pub strength: f64,
}

impl GraphLink {
    pub fn new(
        source: impl Into<UserId>,
        target: impl Into<UserId>,
        kind: ConnectionKind,
        self_id: &UserId,
    ) -> Self {
        let source = source.into();
        let target = target.into();
        let strength = link_strength(kind, &source == self_id || &target == self_id);
        Self { source, target, kind, strength }
    }

    /// True if the link touches the given id on either end.
    pub fn touches(&self, id: &UserId) -> bool {
        self.source == *id || self.target == *id
    }

    /// The opposite endpoint from `from`, if `from` is an endpoint.
    pub fn other(&self, from: &UserId) -> Option<&UserId> {
        if self.source == *from {
            Some(&self.target)
        } else if self.target == *from {
            Some(&self.source)
        } else {
            None
        }
    }

    /// True if the link pairs the two ids, in either orientation.
    pub fn pairs(&self, a: &UserId, b: &UserId) -> bool {
        (self.source == *a && self.target == *b) || (self.source == *b && self.target == *a)
    }
}

/// Fixed strength mapping. Friend links touching self carry the confirmed
/// value; all results are in (0, 1].
pub fn link_strength(kind: ConnectionKind, touches_self: bool) -> f64 {
    match kind {
        ConnectionKind::Friend if touches_self => CONFIRMED_FRIEND_STRENGTH,
        ConnectionKind::Friend => 0.8,
        ConnectionKind::Pending => 0.5,
        ConnectionKind::Suggested => 0.25,
    }
}
