// tests/comment_tree.rs
//! Checks the serialized shape of a threaded comment tree: flattened comment
//! fields plus a `replies` array at every level.

use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

use melodyhub_server::comments::build_comment_forest;
use melodyhub_server::models::{CommentDto, CommentRecord, DELETED_AUTHOR};

fn record(id: i32, reply_to: Option<i32>, author: &str) -> CommentRecord {
    CommentRecord {
        id,
        post_id: 42,
        user_id: if author == DELETED_AUTHOR { None } else { Some(7) },
        reply_to,
        content: format!("comment {id}"),
        author_login: author.to_string(),
        author_avatar_key: None,
        created_at: Utc.timestamp_opt(1_700_000_000 + i64::from(id), 0).unwrap(),
    }
}

#[test]
fn serialized_tree_flattens_comment_fields_and_nests_replies() {
    let records = vec![
        record(1, None, "alice"),
        record(2, Some(1), "bob"),
        record(3, Some(2), "alice"),
        record(4, None, "carol"),
    ];
    let forest = build_comment_forest(&records, |r| CommentDto::from_record(r, None));

    let value = serde_json::to_value(&forest).unwrap();
    let roots = value.as_array().unwrap();
    assert_eq!(roots.len(), 2);

    let first = &roots[0];
    assert_eq!(first["id"], json!(1));
    assert_eq!(first["postId"], json!(42));
    assert_eq!(first["userName"], json!("alice"));
    assert_eq!(first["replyToId"], Value::Null);

    let reply = &first["replies"][0];
    assert_eq!(reply["id"], json!(2));
    assert_eq!(reply["replyToId"], json!(1));
    assert_eq!(reply["replies"][0]["id"], json!(3));
    assert_eq!(reply["replies"][0]["replies"], json!([]));

    let second = &roots[1];
    assert_eq!(second["id"], json!(4));
    assert_eq!(second["replies"], json!([]));
}

#[test]
fn deleted_author_keeps_the_thread_intact() {
    let records = vec![
        record(1, None, DELETED_AUTHOR),
        record(2, Some(1), "bob"),
    ];
    let forest = build_comment_forest(&records, |r| CommentDto::from_record(r, None));
    let value = serde_json::to_value(&forest).unwrap();

    assert_eq!(value[0]["userName"], json!(DELETED_AUTHOR));
    assert_eq!(value[0]["userId"], Value::Null);
    assert_eq!(value[0]["replies"][0]["userName"], json!("bob"));
}

#[test]
fn orphaned_reply_surfaces_at_top_level_in_json() {
    let records = vec![record(9, Some(1234), "alice")];
    let forest = build_comment_forest(&records, |r| CommentDto::from_record(r, None));
    let value = serde_json::to_value(&forest).unwrap();

    assert_eq!(value.as_array().unwrap().len(), 1);
    assert_eq!(value[0]["id"], json!(9));
    // the dangling reference is still reported on the flattened payload
    assert_eq!(value[0]["replyToId"], json!(1234));
    assert_eq!(value[0]["replies"], json!([]));
}
