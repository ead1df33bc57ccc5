//! Derived graph nodes and relationship tiers.

use serde::{Deserialize, Serialize};

use super::UserId;

/// Mutually-exclusive relationship tier, assigned once per build.
///
/// A pure function of the friend-link set relative to self — never of UI
/// state. Closed set; match exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tier {
    /// The current user.
    #[serde(rename = "self")]
    Own,
    /// Depth-1 friend of self.
    Direct,
    /// Friend-of-friend, not itself a direct friend.
    SecondDegree,
    /// Has a suggested-kind connection to self, unreached by the BFS.
    Suggested,
    /// Everyone else in the roster.
    Other,
}

impl Tier {
    /// Baseline presentation weight. Magnitudes are tunable; the ordering
    /// self > direct > secondDegree > other >= suggested is the contract.
    pub fn base_weight(self) -> f64 {
        match self {
            Tier::Own => 20.0,
            Tier::Direct => 12.0,
            Tier::SecondDegree => 8.0,
            Tier::Other => 6.0,
            Tier::Suggested => 5.0,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Own => write!(f, "self"),
            Tier::Direct => write!(f, "direct"),
            Tier::SecondDegree => write!(f, "secondDegree"),
            Tier::Suggested => write!(f, "suggested"),
            Tier::Other => write!(f, "other"),
        }
    }
}

/// A node in the assembled social graph.
///
/// `size_weight` and `highlighted` are transient presentation state owned
/// by the highlight machine; everything else is fixed at assembly time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: UserId,
    pub display_name: String,
    pub avatar_ref: String,
    pub tier: Tier,
    pub size_weight: f64,
    /// How many of self's direct friends also befriend this node.
    /// Zero (and meaningless) for the self node.
    pub mutual_count: u32,
    /// Defined only for `Tier::Suggested`; `None` otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compatibility_score: Option<u8>,
    pub highlighted: bool,
}

impl GraphNode {
    pub fn is_self(&self) -> bool {
        self.tier == Tier::Own
    }

    /// Drop transient hover state back to the tier baseline.
    pub fn reset_presentation(&mut self) {
        self.size_weight = self.tier.base_weight();
        self.highlighted = false;
    }
}
