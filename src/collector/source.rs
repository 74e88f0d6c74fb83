//! The session client interface the collector polls.

use crate::captions::Comment;
use livestream_common::BroadcastStatus;

/// One page of comments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentsPage {
    pub comments: Vec<Comment>,
    /// Cursor for the next request: a timestamp for live pages, an offset
    /// for replay pages. `None` when the source gave none.
    pub next_ts: Option<i64>,
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network hiccup or retryable server error.
    #[error("transient error: {0}")]
    Transient(String),

    /// The broadcast is gone.
    #[error("broadcast ended")]
    Ended,

    #[error("{0}")]
    Fatal(String),
}

/// API calls the collector needs from an authenticated session.
pub trait CommentSource: Send {
    /// Live comments newer than `since_ts` (0 for the first call).
    fn fetch_comments_page(
        &mut self,
        broadcast_id: &str,
        since_ts: i64,
    ) -> Result<CommentsPage, SourceError>;

    /// Current status of a live broadcast.
    fn heartbeat(&mut self, broadcast_id: &str) -> Result<BroadcastStatus, SourceError>;

    /// Replay comments from `starting_offset` seconds into the broadcast.
    fn fetch_replay_page(
        &mut self,
        broadcast_id: &str,
        starting_offset: i64,
    ) -> Result<CommentsPage, SourceError>;
}
