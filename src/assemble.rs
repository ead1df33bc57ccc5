//! Graph assembly.
//!
//! Merges tier classification, mutual counts, and compatibility scores
//! into the `GraphSnapshot` the renderer consumes. The snapshot is an
//! arena of nodes plus an id → index lookup; links carry ids only and are
//! resolved through the lookup at render time, so no object cycles can
//! form.

use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::affinity::{compatibility_score, mutual_counts};
use crate::model::{
    link_strength, ConnectionKind, ConnectionRecord, GraphLink, GraphNode, Tier, UserId,
    UserProfile,
};
use crate::tiers::{classify, direct_friends};

/// The assembled node/link model. Rebuilt from scratch on every
/// successful load; targeted link edits come only from the reconciler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
    /// id → index into `nodes`.
    index: HashMap<UserId, usize>,
    /// node index → indices into `links` touching that node.
    adjacency: Vec<SmallVec<[usize; 8]>>,
    pub self_id: UserId,
    /// Self's direct-friend total at build time — the score denominator.
    pub direct_count: usize,
    pub built_at: DateTime<Utc>,
}

impl GraphSnapshot {
    pub fn node(&self, id: &UserId) -> Option<&GraphNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn node_mut(&mut self, id: &UserId) -> Option<&mut GraphNode> {
        self.index.get(id).map(|&i| &mut self.nodes[i])
    }

    pub fn contains(&self, id: &UserId) -> bool {
        self.index.contains_key(id)
    }

    /// Indices of the links touching `id`.
    pub fn link_indices_of(&self, id: &UserId) -> &[usize] {
        self.index
            .get(id)
            .map(|&i| self.adjacency[i].as_slice())
            .unwrap_or(&[])
    }

    /// Ids directly linked to `id`, any kind.
    pub fn neighbor_ids(&self, id: &UserId) -> Vec<UserId> {
        self.link_indices_of(id)
            .iter()
            .filter_map(|&li| self.links[li].other(id))
            .cloned()
            .collect()
    }

    /// Index of the link pairing `a` and `b`, either orientation.
    pub fn find_link(&self, a: &UserId, b: &UserId) -> Option<usize> {
        self.link_indices_of(a)
            .iter()
            .copied()
            .find(|&li| self.links[li].pairs(a, b))
    }

    /// Append a link and wire it into the adjacency lists.
    pub fn insert_link(&mut self, link: GraphLink) {
        let li = self.links.len();
        if let Some(&src) = self.index.get(&link.source) {
            self.adjacency[src].push(li);
        }
        if link.source != link.target {
            if let Some(&dst) = self.index.get(&link.target) {
                self.adjacency[dst].push(li);
            }
        }
        self.links.push(link);
    }

    /// Remove and return the link at `idx`, repairing adjacency.
    ///
    /// Swap-remove: the last link takes the removed slot, so adjacency is
    /// patched for both the removed and the moved link.
    pub fn remove_link(&mut self, idx: usize) -> GraphLink {
        let removed = self.links.swap_remove(idx);
        let moved_from = self.links.len();
        for list in &mut self.adjacency {
            list.retain(|li| *li != idx);
            for li in list.iter_mut() {
                if *li == moved_from {
                    *li = idx;
                }
            }
        }
        removed
    }

    /// Reset every node's transient presentation state to baseline.
    pub fn reset_presentation(&mut self) {
        for node in &mut self.nodes {
            node.reset_presentation();
        }
    }
}

/// Build a fresh snapshot from the loaded roster and connection set.
///
/// Guarantees the model invariants: unique node ids (first roster
/// occurrence wins), exactly one self node, all link endpoints resolvable,
/// at most one link per unordered pair (highest-precedence kind kept), and
/// connection records referencing unknown users filtered rather than
/// surfaced — no placeholder nodes are invented for them.
pub fn build(
    roster: &[UserProfile],
    connections: &[ConnectionRecord],
    self_id: &UserId,
) -> GraphSnapshot {
    // Dedupe the roster by id, keeping the first occurrence.
    let mut seen: HashMap<&UserId, ()> = HashMap::with_capacity(roster.len());
    let mut profiles: Vec<&UserProfile> = Vec::with_capacity(roster.len());
    for profile in roster {
        if seen.insert(&profile.id, ()).is_none() {
            profiles.push(profile);
        } else {
            warn!(id = %profile.id, "duplicate roster entry dropped");
        }
    }

    // Keep only well-formed records: both endpoints on the roster, no
    // self-loops. Malformed records are an input defect, not a load error.
    let usable: Vec<ConnectionRecord> = connections
        .iter()
        .filter(|r| {
            if r.user_id == r.connected_user_id {
                warn!(id = %r.user_id, "self-loop connection dropped");
                return false;
            }
            let known =
                seen.contains_key(&r.user_id) && seen.contains_key(&r.connected_user_id);
            if !known {
                warn!(
                    user = %r.user_id,
                    connected = %r.connected_user_id,
                    "connection references unknown user, dropped"
                );
            }
            known
        })
        .cloned()
        .collect();

    let tiers = classify(roster, &usable, self_id);
    let direct = direct_friends(&tiers);
    let mutuals = mutual_counts(&usable, &direct, self_id);

    let mut nodes: Vec<GraphNode> = Vec::with_capacity(profiles.len() + 1);
    let mut index: HashMap<UserId, usize> = HashMap::with_capacity(profiles.len() + 1);

    // The self node comes from its roster profile when present; a roster
    // that omits self still yields exactly one self node.
    if !profiles.iter().any(|p| p.id == *self_id) {
        index.insert(self_id.clone(), nodes.len());
        nodes.push(GraphNode {
            id: self_id.clone(),
            display_name: String::new(),
            avatar_ref: String::new(),
            tier: Tier::Own,
            size_weight: Tier::Own.base_weight(),
            mutual_count: 0,
            compatibility_score: None,
            highlighted: false,
        });
    }

    for profile in profiles {
        let tier = tiers.get(&profile.id).copied().unwrap_or(Tier::Other);
        let mutual_count = if tier == Tier::Own {
            0
        } else {
            mutuals.get(&profile.id).copied().unwrap_or(0)
        };
        let score = (tier == Tier::Suggested)
            .then(|| compatibility_score(mutual_count, direct.len()));

        index.insert(profile.id.clone(), nodes.len());
        nodes.push(GraphNode {
            id: profile.id.clone(),
            display_name: profile.display_name.clone(),
            avatar_ref: profile.avatar_ref.clone(),
            tier,
            size_weight: tier.base_weight(),
            mutual_count,
            compatibility_score: score,
            highlighted: false,
        });
    }

    // Collapse duplicate records per unordered pair, keeping the
    // highest-precedence kind.
    let mut by_pair: HashMap<(UserId, UserId), ConnectionKind> = HashMap::new();
    for record in &usable {
        by_pair
            .entry(record.pair_key())
            .and_modify(|kind| {
                if record.kind.precedence() > kind.precedence() {
                    *kind = record.kind;
                }
            })
            .or_insert(record.kind);
    }

    let mut links: Vec<GraphLink> = by_pair
        .into_iter()
        .map(|((a, b), kind)| {
            let touches_self = a == *self_id || b == *self_id;
            let strength = link_strength(kind, touches_self);
            GraphLink { source: a, target: b, kind, strength }
        })
        .collect();
    // Deterministic link order across rebuilds of the same input.
    links.sort_by(|l, r| (&l.source, &l.target).cmp(&(&r.source, &r.target)));

    let mut adjacency: Vec<SmallVec<[usize; 8]>> = vec![SmallVec::new(); nodes.len()];
    for (li, link) in links.iter().enumerate() {
        adjacency[index[&link.source]].push(li);
        adjacency[index[&link.target]].push(li);
    }

    debug!(
        nodes = nodes.len(),
        links = links.len(),
        direct = direct.len(),
        "graph assembled"
    );

    GraphSnapshot {
        nodes,
        links,
        index,
        adjacency,
        self_id: self_id.clone(),
        direct_count: direct.len(),
        built_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(ids: &[&str]) -> Vec<UserProfile> {
        ids.iter().map(|id| UserProfile::new(*id, *id)).collect()
    }

    fn friend(a: &str, b: &str) -> ConnectionRecord {
        ConnectionRecord::new(a, b, ConnectionKind::Friend)
    }

    #[test]
    fn test_single_self_node() {
        let snapshot = build(&roster(&["me", "b"]), &[friend("me", "b")], &UserId::from("me"));
        let selves: Vec<_> = snapshot.nodes.iter().filter(|n| n.is_self()).collect();
        assert_eq!(selves.len(), 1);
        assert_eq!(selves[0].id, UserId::from("me"));
    }

    #[test]
    fn test_self_missing_from_roster_is_synthesized() {
        let snapshot = build(&roster(&["b"]), &[], &UserId::from("me"));
        assert!(snapshot.node(&UserId::from("me")).is_some());
        assert_eq!(snapshot.nodes.iter().filter(|n| n.is_self()).count(), 1);
    }

    #[test]
    fn test_duplicate_records_collapse_keeping_friend() {
        let records = vec![
            ConnectionRecord::new("me", "b", ConnectionKind::Suggested),
            ConnectionRecord::new("b", "me", ConnectionKind::Friend),
            ConnectionRecord::new("me", "b", ConnectionKind::Pending),
        ];
        let snapshot = build(&roster(&["me", "b"]), &records, &UserId::from("me"));
        assert_eq!(snapshot.links.len(), 1);
        assert_eq!(snapshot.links[0].kind, ConnectionKind::Friend);
        assert_eq!(snapshot.links[0].strength, 1.0);
    }

    #[test]
    fn test_unknown_endpoint_filtered_without_placeholder() {
        let records = vec![friend("me", "ghost"), friend("me", "b")];
        let snapshot = build(&roster(&["me", "b"]), &records, &UserId::from("me"));
        assert_eq!(snapshot.links.len(), 1);
        assert!(!snapshot.contains(&UserId::from("ghost")));
    }

    #[test]
    fn test_all_link_endpoints_resolve() {
        let records = vec![friend("me", "b"), friend("b", "c")];
        let snapshot = build(&roster(&["me", "b", "c"]), &records, &UserId::from("me"));
        for link in &snapshot.links {
            assert!(snapshot.contains(&link.source));
            assert!(snapshot.contains(&link.target));
        }
    }

    #[test]
    fn test_suggested_nodes_scored_eagerly() {
        let records = vec![
            friend("me", "b"),
            friend("me", "c"),
            ConnectionRecord::new("me", "e", ConnectionKind::Suggested),
            friend("e", "b"),
        ];
        let snapshot = build(&roster(&["me", "b", "c", "e"]), &records, &UserId::from("me"));
        let e = snapshot.node(&UserId::from("e")).unwrap();
        assert_eq!(e.tier, Tier::Suggested);
        assert_eq!(e.compatibility_score, Some(50));
        // Non-suggested nodes carry no score.
        assert_eq!(snapshot.node(&UserId::from("b")).unwrap().compatibility_score, None);
    }

    #[test]
    fn test_remove_link_repairs_adjacency() {
        let records = vec![friend("me", "b"), friend("me", "c"), friend("b", "c")];
        let mut snapshot =
            build(&roster(&["me", "b", "c"]), &records, &UserId::from("me"));

        let me = UserId::from("me");
        let b = UserId::from("b");
        let idx = snapshot.find_link(&me, &b).unwrap();
        let removed = snapshot.remove_link(idx);
        assert!(removed.pairs(&me, &b));

        assert_eq!(snapshot.links.len(), 2);
        assert!(snapshot.find_link(&me, &b).is_none());
        // Remaining links still resolve through adjacency.
        let c = UserId::from("c");
        assert!(snapshot.find_link(&me, &c).is_some());
        assert!(snapshot.find_link(&b, &c).is_some());
    }
}
