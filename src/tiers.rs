//! Tier classification.
//!
//! Partitions every non-self roster user into exactly one relationship
//! tier by breadth-first traversal of the friend-connection set rooted at
//! the current user. Pending and suggested connections never establish
//! adjacency here — only `friend` records count toward depth.

use std::collections::VecDeque;

use hashbrown::{HashMap, HashSet};

use crate::model::{ConnectionKind, ConnectionRecord, Tier, UserId, UserProfile};

/// Assign a tier to every roster user. Self is included with `Tier::Own`.
///
/// BFS visits depth 1 before depth 2 and marks nodes visited, so a user
/// reachable at depth 1 is always `Direct`, never `SecondDegree`. Users
/// with a suggested-kind record touching self that the BFS never reached
/// become `Suggested`; everyone left is `Other`.
///
/// Records referencing ids outside the roster are ignored, so the result
/// is always exactly a partition of the roster.
pub fn classify(
    roster: &[UserProfile],
    connections: &[ConnectionRecord],
    self_id: &UserId,
) -> HashMap<UserId, Tier> {
    let mut known: HashSet<&UserId> = roster.iter().map(|p| &p.id).collect();
    known.insert(self_id);

    let mut adjacency: HashMap<&UserId, Vec<&UserId>> = HashMap::new();
    for record in connections {
        if record.kind == ConnectionKind::Friend
            && known.contains(&record.user_id)
            && known.contains(&record.connected_user_id)
        {
            adjacency.entry(&record.user_id).or_default().push(&record.connected_user_id);
            adjacency.entry(&record.connected_user_id).or_default().push(&record.user_id);
        }
    }

    let mut tiers: HashMap<UserId, Tier> = HashMap::with_capacity(roster.len());
    tiers.insert(self_id.clone(), Tier::Own);

    // BFS to depth 2. Visited set doubles as the precedence guard: depth-1
    // users are classified before any depth-2 candidate is examined.
    let mut visited: HashSet<&UserId> = HashSet::new();
    visited.insert(self_id);
    let mut queue: VecDeque<(&UserId, u8)> = VecDeque::new();
    queue.push_back((self_id, 0));

    while let Some((current, depth)) = queue.pop_front() {
        if depth >= 2 {
            continue;
        }
        if let Some(neighbors) = adjacency.get(current) {
            for &neighbor in neighbors {
                if !visited.insert(neighbor) {
                    continue;
                }
                let tier = if depth == 0 { Tier::Direct } else { Tier::SecondDegree };
                tiers.insert(neighbor.clone(), tier);
                queue.push_back((neighbor, depth + 1));
            }
        }
    }

    // Suggested-kind records touching self claim anyone the BFS missed.
    for record in connections {
        if record.kind == ConnectionKind::Suggested {
            if let Some(other) = record.other(self_id) {
                if known.contains(other) {
                    tiers.entry(other.clone()).or_insert(Tier::Suggested);
                }
            }
        }
    }

    for profile in roster {
        tiers.entry(profile.id.clone()).or_insert(Tier::Other);
    }

    tiers
}

/// The ids of self's direct friends, derived from a classification.
pub fn direct_friends(tiers: &HashMap<UserId, Tier>) -> HashSet<UserId> {
    tiers
        .iter()
        .filter(|(_, tier)| **tier == Tier::Direct)
        .map(|(id, _)| id.clone())
        .collect()
}
