//! Caption generation from collected comments.
//!
//! Comments are normalised to [`CaptionEvent`]s, grouped into two-second
//! windows relative to the recording start and written as SubRip.

pub mod comments;
pub mod srt;
pub mod timeline;

pub use comments::{CaptionEvent, Comment, CommentBody, CommentUser, CommentsFile};
pub use srt::{render, write_srt};
pub use timeline::{build_captions, CaptionBlock, CaptionWindow, LEADING_NOTICE};

use livestream_common::BroadcastMeta;

/// Caption blocks for a broadcast from a loaded comments file.
pub fn captions_for(
    meta: &BroadcastMeta,
    comments: &CommentsFile,
    default_delay: f64,
) -> Vec<CaptionBlock> {
    let start = meta.download_start_time();
    let events = comments.events(start);
    build_captions(&events, start, comments.comments_delay(default_delay))
}
