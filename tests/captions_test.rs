//! Caption generation integration tests

mod common;

use common::{broadcast, write_json, PUBLISHED};
use livestream_common::BroadcastMeta;
use livestream_dl::captions::{self, CommentsFile, LEADING_NOTICE};
use serde_json::json;
use tempfile::tempdir;

fn meta(delay: i64) -> BroadcastMeta {
    serde_json::from_value(broadcast("active", json!({ "delay": delay }))).unwrap()
}

#[test]
fn test_live_comments_to_srt() {
    let dir = tempdir().unwrap();
    let path = write_json(
        &dir.path().join("comments.json"),
        &json!({
            "id": common::STREAM_ID,
            "comments": [
                {"user_id": 1, "user": {"username": "a"}, "text": "hi", "created_at_utc": PUBLISHED + 10},
                {"user_id": 2, "user": {"username": "b"}, "text": "yo", "created_at_utc": PUBLISHED + 11},
                {"user_id": 1, "user": {"username": "a"}, "text": "later", "created_at_utc": PUBLISHED + 30},
            ],
        }),
    );

    let comments = CommentsFile::load(&path).unwrap();
    let blocks = captions::captions_for(&meta(0), &comments, 10.0);
    let srt = captions::render(&blocks);

    assert_eq!(
        srt,
        format!(
            "1\n00:00:00,001 --> 00:00:03,000\n{}\n\n\
             2\n00:00:20,001 --> 00:00:22,000\na: hi\nb: yo\n\n\
             3\n00:00:40,001 --> 00:00:42,000\na: later\n\n",
            LEADING_NOTICE
        )
    );
}

#[test]
fn test_replay_comments_use_download_start() {
    let dir = tempdir().unwrap();
    let path = write_json(
        &dir.path().join("comments.json"),
        &json!({
            "initial_buffered_duration": 0,
            "comments": [
                {"offset": 0, "comment": {"user": {"pk": 5, "username": "c"}, "text": "first"}},
                {"offset": 7, "comment": {"user": {"pk": 5, "username": "c"}, "text": "second"}},
            ],
        }),
    );

    let comments = CommentsFile::load(&path).unwrap();
    let blocks = captions::captions_for(&meta(25), &comments, 10.0);

    assert_eq!(blocks.len(), 2);
    assert_eq!((blocks[0].index, blocks[0].start, blocks[0].end), (1, 0, 2));
    assert_eq!(blocks[0].text, "c: first");
    assert_eq!((blocks[1].index, blocks[1].start), (2, 6));
}

#[test]
fn test_comments_before_recording_clamp_to_zero() {
    let comments: CommentsFile = serde_json::from_value(json!({
        "comments": [
            {"user": {"username": "early"}, "text": "x", "created_at_utc": PUBLISHED - 100},
        ],
    }))
    .unwrap();

    let blocks = captions::captions_for(&meta(0), &comments, 10.0);
    assert_eq!(blocks.len(), 1);
    assert_eq!((blocks[0].start, blocks[0].end), (0, 2));
}
