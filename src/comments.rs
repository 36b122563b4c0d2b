//! Assembly of flat comment rows into threaded reply trees.
//!
//! The builder is a pure function over a slice of [`CommentRecord`]s that all
//! belong to one post. It never fails: dangling parent references are
//! promoted to top-level comments and cyclic references are broken by a
//! visited-set guard, so a single malformed row can never take down the
//! whole comment view.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::models::CommentRecord;

/// One comment plus its direct replies. The payload type is whatever the
/// caller's mapper produces, typically [`crate::models::CommentDto`].
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CommentNode<T> {
    #[serde(flatten)]
    pub comment: T,
    pub replies: Vec<CommentNode<T>>,
}

/// Builds an ordered forest of comment trees from flat rows.
///
/// Rules:
/// - a record with no `reply_to`, or whose `reply_to` does not match any id
///   in the input, is a forest root;
/// - each node's `replies` are exactly the records referencing its id,
///   in input order;
/// - every record is mapped and placed exactly once. Records that are only
///   reachable through a reference cycle are promoted to roots in input
///   order rather than dropped.
pub fn build_comment_forest<T, F>(records: &[CommentRecord], mut mapper: F) -> Vec<CommentNode<T>>
where
    F: FnMut(&CommentRecord) -> T,
{
    let known_ids: HashSet<i32> = records.iter().map(|r| r.id).collect();

    // Stable partition by parent. `None` collects top-level comments and
    // orphans whose parent is absent from this post's comment set.
    let mut by_parent: HashMap<Option<i32>, Vec<&CommentRecord>> = HashMap::new();
    for record in records {
        let key = record
            .reply_to
            .filter(|parent| *parent != record.id && known_ids.contains(parent));
        by_parent.entry(key).or_default().push(record);
    }

    let mut visited = HashSet::with_capacity(records.len());
    let mut forest = build_bucket(&by_parent, None, &mut visited, &mut mapper);

    // Anything still unvisited sits on a reference cycle with no path from a
    // root. Promote those records in input order; the visited guard breaks
    // the cycle after one pass.
    for record in records {
        if visited.insert(record.id) {
            let replies = build_bucket(&by_parent, Some(record.id), &mut visited, &mut mapper);
            forest.push(CommentNode {
                comment: mapper(record),
                replies,
            });
        }
    }

    forest
}

fn build_bucket<T, F>(
    by_parent: &HashMap<Option<i32>, Vec<&CommentRecord>>,
    parent: Option<i32>,
    visited: &mut HashSet<i32>,
    mapper: &mut F,
) -> Vec<CommentNode<T>>
where
    F: FnMut(&CommentRecord) -> T,
{
    let Some(bucket) = by_parent.get(&parent) else {
        return Vec::new();
    };

    let mut nodes = Vec::with_capacity(bucket.len());
    for record in bucket {
        if !visited.insert(record.id) {
            continue;
        }
        let comment = mapper(record);
        let replies = build_bucket(by_parent, Some(record.id), visited, mapper);
        nodes.push(CommentNode { comment, replies });
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(id: i32, reply_to: Option<i32>) -> CommentRecord {
        CommentRecord {
            id,
            post_id: 1,
            user_id: Some(10),
            reply_to,
            content: format!("comment {id}"),
            author_login: "alice".to_string(),
            author_avatar_key: None,
            created_at: Utc.timestamp_opt(1_700_000_000 + i64::from(id), 0).unwrap(),
        }
    }

    fn ids(forest: &[CommentNode<i32>]) -> Vec<i32> {
        forest.iter().map(|n| n.comment).collect()
    }

    fn build(records: &[CommentRecord]) -> Vec<CommentNode<i32>> {
        build_comment_forest(records, |r| r.id)
    }

    fn collect_ids(forest: &[CommentNode<i32>], out: &mut Vec<i32>) {
        for node in forest {
            out.push(node.comment);
            collect_ids(&node.replies, out);
        }
    }

    #[test]
    fn nests_replies_under_their_parents() {
        let records = vec![
            record(1, None),
            record(2, Some(1)),
            record(3, Some(1)),
            record(4, Some(2)),
        ];
        let forest = build(&records);

        assert_eq!(ids(&forest), vec![1]);
        assert_eq!(ids(&forest[0].replies), vec![2, 3]);
        assert_eq!(ids(&forest[0].replies[0].replies), vec![4]);
        assert!(forest[0].replies[0].replies[0].replies.is_empty());
        assert!(forest[0].replies[1].replies.is_empty());
    }

    #[test]
    fn every_record_appears_exactly_once() {
        let records = vec![
            record(1, None),
            record(2, Some(1)),
            record(3, Some(99)),
            record(4, Some(2)),
            record(5, None),
        ];
        let forest = build(&records);

        let mut seen = Vec::new();
        collect_ids(&forest, &mut seen);
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn orphan_is_promoted_to_root() {
        let records = vec![record(5, Some(999))];
        let forest = build(&records);

        assert_eq!(ids(&forest), vec![5]);
        assert!(forest[0].replies.is_empty());
    }

    #[test]
    fn empty_input_yields_empty_forest() {
        assert!(build(&[]).is_empty());
    }

    #[test]
    fn sibling_order_follows_input_order() {
        let records = vec![
            record(7, None),
            record(3, None),
            record(9, Some(3)),
            record(5, Some(3)),
        ];
        let forest = build(&records);

        assert_eq!(ids(&forest), vec![7, 3]);
        assert_eq!(ids(&forest[1].replies), vec![9, 5]);
    }

    #[test]
    fn two_comment_cycle_terminates_with_both_present() {
        let records = vec![record(1, Some(2)), record(2, Some(1))];
        let forest = build(&records);

        let mut seen = Vec::new();
        collect_ids(&forest, &mut seen);
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2]);

        // First cycle member in input order becomes the root.
        assert_eq!(ids(&forest), vec![1]);
        assert_eq!(ids(&forest[0].replies), vec![2]);
    }

    #[test]
    fn self_reply_is_treated_as_top_level() {
        let records = vec![record(4, Some(4)), record(6, Some(4))];
        let forest = build(&records);

        assert_eq!(ids(&forest), vec![4]);
        assert_eq!(ids(&forest[0].replies), vec![6]);
    }

    #[test]
    fn mapper_is_called_once_per_record() {
        let records = vec![
            record(1, Some(2)),
            record(2, Some(1)),
            record(3, None),
            record(4, Some(3)),
        ];
        let mut calls = 0;
        let _ = build_comment_forest(&records, |r| {
            calls += 1;
            r.id
        });
        assert_eq!(calls, records.len());
    }

    #[test]
    fn deep_chain_builds_in_order() {
        let records: Vec<_> = (1..=50)
            .map(|id| record(id, if id == 1 { None } else { Some(id - 1) }))
            .collect();
        let forest = build(&records);

        assert_eq!(forest.len(), 1);
        let mut node = &forest[0];
        for expected in 1..=50 {
            assert_eq!(node.comment, expected);
            if expected < 50 {
                assert_eq!(node.replies.len(), 1);
                node = &node.replies[0];
            } else {
                assert!(node.replies.is_empty());
            }
        }
    }
}
