//! Comment collector tests against a scripted source.

mod common;

use common::{broadcast, STREAM_ID};
use livestream_common::{BroadcastMeta, BroadcastStatus};
use livestream_dl::captions::{Comment, CommentsFile};
use livestream_dl::collector::{
    collect_replay, CollectorError, CommentCollector, CommentFilter, CommentSource, CommentsPage,
    SourceError,
};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;

fn live_comment(username: &str, verified: bool, ts: i64) -> Comment {
    serde_json::from_value(json!({
        "user_id": username.len(),
        "user": {"username": username, "is_verified": verified},
        "text": format!("from {}", username),
        "created_at_utc": ts,
    }))
    .unwrap()
}

fn replay_comment(username: &str, offset: i64) -> Comment {
    serde_json::from_value(json!({
        "offset": offset,
        "comment": {"user": {"pk": 9, "username": username, "is_verified": false}, "text": "r"},
    }))
    .unwrap()
}

fn meta() -> BroadcastMeta {
    serde_json::from_value(broadcast(
        "active",
        json!({"segments": {"x-0.m4v": "720x1280"}, "duration": 30.0}),
    ))
    .unwrap()
}

/// Replays queued responses; reports `post_live` once the queue runs dry.
#[derive(Default)]
struct ScriptedSource {
    pages: VecDeque<Result<CommentsPage, SourceError>>,
    requests: Arc<Mutex<Vec<i64>>>,
}

impl ScriptedSource {
    fn new(pages: Vec<Result<CommentsPage, SourceError>>) -> Self {
        Self {
            pages: pages.into(),
            requests: Arc::default(),
        }
    }

    fn next(&mut self, cursor: i64) -> Result<CommentsPage, SourceError> {
        self.requests.lock().unwrap().push(cursor);
        self.pages.pop_front().unwrap_or_else(|| Ok(CommentsPage::default()))
    }
}

impl CommentSource for ScriptedSource {
    fn fetch_comments_page(&mut self, _id: &str, since_ts: i64) -> Result<CommentsPage, SourceError> {
        self.next(since_ts)
    }

    fn heartbeat(&mut self, _id: &str) -> Result<BroadcastStatus, SourceError> {
        if self.pages.is_empty() {
            Ok(BroadcastStatus::PostLive)
        } else {
            Ok(BroadcastStatus::Active)
        }
    }

    fn fetch_replay_page(
        &mut self,
        _id: &str,
        starting_offset: i64,
    ) -> Result<CommentsPage, SourceError> {
        self.next(starting_offset)
    }
}

fn page(comments: Vec<Comment>, next_ts: Option<i64>) -> Result<CommentsPage, SourceError> {
    Ok(CommentsPage { comments, next_ts })
}

#[test]
fn test_live_collection_filters_and_saves() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("comments.json");

    let source = ScriptedSource::new(vec![
        page(
            vec![live_comment("alice", false, 100), live_comment("mallory", false, 101)],
            Some(100),
        ),
        Err(SourceError::Transient("timed out".to_string())),
        page(vec![live_comment("star", true, 105)], Some(105)),
    ]);
    let requests = Arc::clone(&source.requests);

    let collector = CommentCollector::spawn(
        source,
        meta(),
        CommentFilter::new(["alice"], true),
        Duration::from_millis(1),
        dest.clone(),
    );
    let comments = collector.join().unwrap();

    let names: Vec<_> = comments
        .iter()
        .map(|c| c.body().user.username.as_str())
        .collect();
    assert_eq!(names, vec!["alice", "star"]);
    assert_eq!(*requests.lock().unwrap(), vec![0, 100, 100]);

    let saved = CommentsFile::load(&dest).unwrap();
    assert_eq!(saved.comments, comments);
    assert_eq!(saved.extra["id"], STREAM_ID);
    assert!(!saved.extra.contains_key("segments"));
}

#[test]
fn test_fatal_error_surfaces_from_join() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("comments.json");
    let source = ScriptedSource::new(vec![
        page(vec![live_comment("alice", false, 100)], Some(100)),
        Err(SourceError::Fatal("login_required".to_string())),
        page(vec![], None),
    ]);

    let collector = CommentCollector::spawn(
        source,
        meta(),
        CommentFilter::new(["alice"], false),
        Duration::from_millis(1),
        dest.clone(),
    );
    let err = collector.join().unwrap_err();
    assert!(matches!(err, CollectorError::Source(SourceError::Fatal(_))));

    // Comments gathered before the failure are still on disk.
    assert_eq!(CommentsFile::load(&dest).unwrap().comments.len(), 1);
}

/// Never ends on its own.
struct EndlessSource;

impl CommentSource for EndlessSource {
    fn fetch_comments_page(&mut self, _id: &str, since_ts: i64) -> Result<CommentsPage, SourceError> {
        Ok(CommentsPage {
            comments: Vec::new(),
            next_ts: Some(since_ts + 1),
        })
    }

    fn heartbeat(&mut self, _id: &str) -> Result<BroadcastStatus, SourceError> {
        Ok(BroadcastStatus::Active)
    }

    fn fetch_replay_page(&mut self, _id: &str, _offset: i64) -> Result<CommentsPage, SourceError> {
        Err(SourceError::Ended)
    }
}

#[test]
fn test_stop_interrupts_wait() {
    let dir = tempdir().unwrap();
    let collector = CommentCollector::spawn(
        EndlessSource,
        meta(),
        CommentFilter::default(),
        Duration::from_secs(3600),
        dir.path().join("comments.json"),
    );

    std::thread::sleep(Duration::from_millis(50));
    assert!(!collector.is_finished());
    collector.stop();
    assert!(collector.join().unwrap().is_empty());
}

#[test]
fn test_replay_paging_stops_past_duration() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("comments.json");
    let mut source = ScriptedSource::new(vec![
        page(vec![replay_comment("alice", 2), replay_comment("bob", 4)], Some(15)),
        page(vec![replay_comment("alice", 20)], Some(45)),
        page(vec![replay_comment("alice", 50)], Some(60)),
    ]);

    let comments = collect_replay(
        &mut source,
        &meta(),
        &CommentFilter::new(["alice"], false),
        Duration::ZERO,
        Some(&dest),
    )
    .unwrap();

    assert_eq!(comments.len(), 2);
    assert_eq!(*source.requests.lock().unwrap(), vec![0, 15]);

    let saved = CommentsFile::load(&dest).unwrap();
    assert_eq!(saved.initial_buffered_duration, Some(0.0));
    assert_eq!(saved.comments.len(), 2);
}

#[test]
fn test_replay_stops_on_empty_page() {
    let mut source = ScriptedSource::new(vec![
        page(vec![replay_comment("alice", 1)], Some(5)),
        page(vec![], Some(10)),
    ]);

    let comments = collect_replay(
        &mut source,
        &meta(),
        &CommentFilter::new(["alice"], false),
        Duration::ZERO,
        None,
    )
    .unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(*source.requests.lock().unwrap(), vec![0, 5]);
}
