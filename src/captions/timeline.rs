//! Bucketing of comments into fixed on-screen caption windows.

use super::CaptionEvent;
use std::collections::BTreeMap;

/// Width of a caption window and display span of each block, in seconds.
pub const WINDOW_SECS: i64 = 2;

/// Longest span of the leading notice block, in seconds.
pub const LEADING_NOTICE_MAX_SECS: i64 = 3;

/// Text of the block inserted ahead of the first comment when there is room.
pub const LEADING_NOTICE: &str = "Comment stream timing is slightly modified for easier viewing";

/// Comments created within the same two-second slot.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionWindow<'a> {
    /// `2 * floor(created_at_utc / 2)`.
    pub key: i64,
    pub events: Vec<&'a CaptionEvent>,
}

/// One numbered caption, timed in whole seconds from the start of the video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionBlock {
    pub index: usize,
    pub start: i64,
    pub end: i64,
    pub text: String,
}

/// Window key for an absolute timestamp.
pub fn window_key(created_at_utc: f64) -> i64 {
    WINDOW_SECS * (created_at_utc / WINDOW_SECS as f64).floor() as i64
}

/// Group events by window, in ascending key order.
///
/// Events keep their input order within a window.
pub fn windows(events: &[CaptionEvent]) -> Vec<CaptionWindow<'_>> {
    let mut buckets: BTreeMap<i64, Vec<&CaptionEvent>> = BTreeMap::new();
    for event in events {
        buckets
            .entry(window_key(event.created_at_utc))
            .or_default()
            .push(event);
    }
    buckets
        .into_iter()
        .map(|(key, events)| CaptionWindow { key, events })
        .collect()
}

/// Build caption blocks for `events`.
///
/// Each window becomes one block shown for [`WINDOW_SECS`], starting at
/// `key - download_start_time + floor(comments_delay)` clamped to zero.
/// If the first block does not start at zero, a [`LEADING_NOTICE`] block
/// numbered 1 fills the gap and later blocks are numbered from 2.
pub fn build_captions(
    events: &[CaptionEvent],
    download_start_time: i64,
    comments_delay: f64,
) -> Vec<CaptionBlock> {
    let delay = comments_delay.floor() as i64;
    let mut blocks = Vec::new();
    let mut shift = 1;

    for (i, window) in windows(events).iter().enumerate() {
        let clip_start = (window.key - download_start_time + delay).max(0);
        let clip_end = clip_start + WINDOW_SECS;

        if i == 0 && clip_start > 0 {
            blocks.push(CaptionBlock {
                index: 1,
                start: 0,
                end: LEADING_NOTICE_MAX_SECS.min(clip_start - 1),
                text: LEADING_NOTICE.to_string(),
            });
            shift = 2;
        }

        let text = window
            .events
            .iter()
            .map(|e| format!("{}: {}", e.username, e.text))
            .collect::<Vec<_>>()
            .join("\n");

        blocks.push(CaptionBlock {
            index: i + shift,
            start: clip_start,
            end: clip_end,
            text,
        });
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(username: &str, text: &str, created_at_utc: f64) -> CaptionEvent {
        CaptionEvent {
            username: username.to_string(),
            text: text.to_string(),
            created_at_utc,
        }
    }

    #[test]
    fn test_window_key() {
        assert_eq!(window_key(100.0), 100);
        assert_eq!(window_key(101.0), 100);
        assert_eq!(window_key(101.9), 100);
        assert_eq!(window_key(102.0), 102);
    }

    #[test]
    fn test_single_comment_with_leading_notice() {
        let blocks = build_captions(&[event("a", "hi", 100.0)], 90, 10.0);

        assert_eq!(
            blocks,
            vec![
                CaptionBlock {
                    index: 1,
                    start: 0,
                    end: 3,
                    text: LEADING_NOTICE.to_string(),
                },
                CaptionBlock {
                    index: 2,
                    start: 20,
                    end: 22,
                    text: "a: hi".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_no_notice_when_first_block_at_zero() {
        let events = [event("a", "first", 80.0), event("b", "second", 85.0)];
        let blocks = build_captions(&events, 90, 10.0);

        assert_eq!(blocks.len(), 2);
        assert_eq!((blocks[0].index, blocks[0].start, blocks[0].end), (1, 0, 2));
        assert_eq!((blocks[1].index, blocks[1].start, blocks[1].end), (2, 4, 6));
    }

    #[test]
    fn test_notice_shortened_for_small_gap() {
        let blocks = build_captions(&[event("a", "x", 92.0)], 90, 0.0);
        assert_eq!((blocks[0].start, blocks[0].end), (0, 1));
        assert_eq!(blocks[1].start, 2);
    }

    #[test]
    fn test_windows_sorted_numerically_and_grouped() {
        let events = [
            event("c", "late", 1000.0),
            event("a", "one", 98.0),
            event("b", "two", 99.5),
        ];
        let blocks = build_captions(&events, 90, 0.0);

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1].start, 8);
        assert_eq!(blocks[1].text, "a: one\nb: two");
        assert_eq!(blocks[2].index, 3);
        assert_eq!(blocks[2].start, 910);
    }

    #[test]
    fn test_fractional_delay_floored() {
        let blocks = build_captions(&[event("a", "x", 100.0)], 90, 8.9);
        assert_eq!(blocks[1].start, 18);
    }

    #[test]
    fn test_empty() {
        assert!(build_captions(&[], 90, 10.0).is_empty());
    }
}
