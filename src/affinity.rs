//! Mutual-connection counts and compatibility scoring.

use hashbrown::{HashMap, HashSet};

use crate::model::{ConnectionKind, ConnectionRecord, UserId};

/// Count, for every non-self user, how many of self's direct friends also
/// befriend them: the size of the intersection of self's direct-friend set
/// and the user's friend-neighbor set.
///
/// Accumulates distinct direct-friend neighbors per user, so a friendship
/// stored from both directions still counts as one mutual. Symmetric by
/// construction — endpoint order in storage does not matter. Users with no
/// mutuals simply have no entry.
pub fn mutual_counts(
    connections: &[ConnectionRecord],
    direct_friends: &HashSet<UserId>,
    self_id: &UserId,
) -> HashMap<UserId, u32> {
    let mut mutuals: HashMap<UserId, HashSet<UserId>> = HashMap::new();

    for record in connections {
        if record.kind != ConnectionKind::Friend {
            continue;
        }
        let a_direct = direct_friends.contains(&record.user_id);
        let b_direct = direct_friends.contains(&record.connected_user_id);

        // Credit the non-friend endpoint; a friend↔friend record credits
        // both sides, since each is a mutual of the other.
        if a_direct && record.connected_user_id != *self_id {
            mutuals
                .entry(record.connected_user_id.clone())
                .or_default()
                .insert(record.user_id.clone());
        }
        if b_direct && record.user_id != *self_id {
            mutuals
                .entry(record.user_id.clone())
                .or_default()
                .insert(record.connected_user_id.clone());
        }
    }

    mutuals
        .into_iter()
        .map(|(id, friends)| (id, friends.len() as u32))
        .collect()
}

/// Compatibility percentage for a suggested contact.
///
/// Mutual-connection density against the viewer's own direct-friend total,
/// clamped to [0, 100]. Defined as 0 when the viewer has no direct friends
/// rather than dividing by zero. Pure and idempotent — eager or lazy
/// evaluation gives identical results.
pub fn compatibility_score(mutual_count: u32, total_direct_friends: usize) -> u8 {
    if total_direct_friends == 0 {
        return 0;
    }
    let ratio = mutual_count as f64 / total_direct_friends as f64;
    (ratio * 100.0).round().min(100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn friend(a: &str, b: &str) -> ConnectionRecord {
        ConnectionRecord::new(a, b, ConnectionKind::Friend)
    }

    fn direct(ids: &[&str]) -> HashSet<UserId> {
        ids.iter().map(|id| UserId::from(*id)).collect()
    }

    #[test]
    fn test_mutual_counts_shared_neighbor() {
        let me = UserId::from("me");
        let connections = vec![
            friend("me", "b"),
            friend("me", "c"),
            friend("b", "d"),
            friend("d", "c"), // reversed orientation still counts
        ];
        let counts = mutual_counts(&connections, &direct(&["b", "c"]), &me);
        assert_eq!(counts.get(&UserId::from("d")), Some(&2));
    }

    #[test]
    fn test_mutual_counts_bidirectional_record_counts_once() {
        // The d–b friendship is stored from both sides; d still has
        // exactly one mutual user.
        let me = UserId::from("me");
        let connections = vec![
            friend("me", "b"),
            friend("b", "d"),
            friend("d", "b"),
        ];
        let counts = mutual_counts(&connections, &direct(&["b"]), &me);
        assert_eq!(counts.get(&UserId::from("d")), Some(&1));
    }

    #[test]
    fn test_mutual_counts_ignore_non_friend_kinds() {
        let me = UserId::from("me");
        let connections = vec![
            friend("me", "b"),
            ConnectionRecord::new("b", "d", ConnectionKind::Pending),
            ConnectionRecord::new("b", "e", ConnectionKind::Suggested),
        ];
        let counts = mutual_counts(&connections, &direct(&["b"]), &me);
        assert_eq!(counts.get(&UserId::from("d")), None);
        assert_eq!(counts.get(&UserId::from("e")), None);
    }

    #[test]
    fn test_mutual_counts_never_credit_self() {
        let me = UserId::from("me");
        let connections = vec![friend("me", "b"), friend("me", "c"), friend("b", "c")];
        let counts = mutual_counts(&connections, &direct(&["b", "c"]), &me);
        assert_eq!(counts.get(&me), None);
        // b and c are each other's mutual.
        assert_eq!(counts.get(&UserId::from("b")), Some(&1));
        assert_eq!(counts.get(&UserId::from("c")), Some(&1));
    }

    #[test]
    fn test_score_basic() {
        assert_eq!(compatibility_score(1, 4), 25);
        assert_eq!(compatibility_score(3, 4), 75);
        assert_eq!(compatibility_score(4, 4), 100);
    }

    #[test]
    fn test_score_rounds() {
        assert_eq!(compatibility_score(1, 3), 33);
        assert_eq!(compatibility_score(2, 3), 67);
    }

    #[test]
    fn test_score_clamped_at_100() {
        assert_eq!(compatibility_score(9, 4), 100);
    }

    #[test]
    fn test_score_zero_friends_is_zero() {
        assert_eq!(compatibility_score(0, 0), 0);
        assert_eq!(compatibility_score(5, 0), 0);
    }
}
