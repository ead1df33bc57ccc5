//! Pairwise connection records from the external store.

use serde::{Deserialize, Serialize};

use super::UserId;

/// Classification of a stored connection.
///
/// Closed set — every consumption site matches exhaustively, so adding a
/// kind is a compile-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    Friend,
    Pending,
    Suggested,
}

impl ConnectionKind {
    /// Precedence when duplicate records collapse into one link.
    /// Friend outranks Pending outranks Suggested.
    pub fn precedence(self) -> u8 {
        match self {
            ConnectionKind::Friend => 2,
            ConnectionKind::Pending => 1,
            ConnectionKind::Suggested => 0,
        }
    }
}

impl std::fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionKind::Friend => write!(f, "friend"),
            ConnectionKind::Pending => write!(f, "pending"),
            ConnectionKind::Suggested => write!(f, "suggested"),
        }
    }
}

/// A stored connection. Directional in storage (`user_id` issued it),
/// symmetric to the core: a record between A and B is visible from both
/// sides regardless of which side wrote it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    pub user_id: UserId,
    pub connected_user_id: UserId,
    #[serde(rename = "connectionType")]
    pub kind: ConnectionKind,
}

impl ConnectionRecord {
    pub fn new(
        user_id: impl Into<UserId>,
        connected_user_id: impl Into<UserId>,
        kind: ConnectionKind,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            connected_user_id: connected_user_id.into(),
            kind,
        }
    }

    /// The "other" end of the record from the given user.
    pub fn other(&self, from: &UserId) -> Option<&UserId> {
        if *from == self.user_id {
            Some(&self.connected_user_id)
        } else if *from == self.connected_user_id {
            Some(&self.user_id)
        } else {
            None
        }
    }

    /// True if the record pairs the two given users, in either direction.
    pub fn pairs(&self, a: &UserId, b: &UserId) -> bool {
        (self.user_id == *a && self.connected_user_id == *b)
            || (self.user_id == *b && self.connected_user_id == *a)
    }

    /// Canonical unordered-pair key, for de-duplication.
    pub fn pair_key(&self) -> (UserId, UserId) {
        if self.user_id <= self.connected_user_id {
            (self.user_id.clone(), self.connected_user_id.clone())
        } else {
            (self.connected_user_id.clone(), self.user_id.clone())
        }
    }
}
