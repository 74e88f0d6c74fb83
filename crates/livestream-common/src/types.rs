//! Core type definitions for broadcasts and their media chunks.
//!
//! `BroadcastMeta` is the record the fetcher persists next to a segment
//! directory. It is written once when recording starts, rewritten when the job
//! ends, and treated as read-only by everything in this workspace.

use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Lifecycle status reported for a broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadcastStatus {
    /// The broadcast is live.
    Active,
    /// The broadcaster's connection dropped; the broadcast may resume.
    Interrupted,
    /// The broadcast ended and is available as a replay.
    PostLive,
    /// Any status this tool does not know about (`stopped`, `hard_stop`, ...).
    #[serde(other)]
    Unknown,
}

impl BroadcastStatus {
    /// Whether this is the `post_live` (replay) status.
    pub fn is_post_live(&self) -> bool {
        matches!(self, Self::PostLive)
    }

    /// Whether the broadcast can still produce new segments or comments.
    pub fn is_ongoing(&self) -> bool {
        matches!(self, Self::Active | Self::Interrupted)
    }
}

impl fmt::Display for BroadcastStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Interrupted => write!(f, "interrupted"),
            Self::PostLive => write!(f, "post_live"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Media kind of a fetched chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    /// Audio chunk (`.m4a`).
    Audio,
    /// Video chunk (`.m4v`).
    Video,
}

impl SegmentKind {
    /// File extension used by the fetcher for this kind.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Audio => "m4a",
            Self::Video => "m4v",
        }
    }
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Audio => write!(f, "audio"),
            Self::Video => write!(f, "video"),
        }
    }
}

/// Owner of a broadcast.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BroadcastOwner {
    #[serde(default)]
    pub username: String,
}

/// Persisted description of one broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastMeta {
    /// Broadcast id. Accepted as either a JSON string or number.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    /// Broadcast start, unix seconds.
    pub published_time: i64,

    /// Seconds missed before recording started (0 for replays).
    #[serde(default)]
    pub delay: i64,

    /// Replay duration in seconds.
    #[serde(default)]
    pub duration: Option<f64>,

    pub broadcast_status: BroadcastStatus,

    /// Segment filename to resolution label, written by newer fetchers.
    #[serde(default)]
    pub segments: Option<BTreeMap<String, String>>,

    #[serde(default)]
    pub broadcast_owner: Option<BroadcastOwner>,

    /// Seconds of stream already buffered when the fetcher started.
    #[serde(default)]
    pub initial_buffered_duration: Option<f64>,

    #[serde(default)]
    pub dash_playback_url: Option<String>,

    /// Fields this tool does not interpret, kept so records round-trip.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl BroadcastMeta {
    /// Load a broadcast record from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::not_found(path));
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|source| Error::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Unix time at which the local recording began.
    pub fn download_start_time(&self) -> i64 {
        self.published_time + self.delay.max(0)
    }

    /// Replays are `post_live` broadcasts or ones without a live playback url.
    pub fn is_replay(&self) -> bool {
        self.broadcast_status.is_post_live() || self.dash_playback_url.is_none()
    }

    /// Segment metadata when it was recorded and is non-empty.
    pub fn segment_labels(&self) -> Option<&BTreeMap<String, String>> {
        self.segments.as_ref().filter(|s| !s.is_empty())
    }

    /// Username of the broadcast owner, or an empty string.
    pub fn owner_username(&self) -> &str {
        self.broadcast_owner
            .as_ref()
            .map(|o| o.username.as_str())
            .unwrap_or("")
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Num(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Str(s) => s,
        Id::Num(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> BroadcastMeta {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_numeric_id_becomes_string() {
        let meta = parse(
            r#"{"id": 17849164549199999, "published_time": 1486300000, "broadcast_status": "active"}"#,
        );
        assert_eq!(meta.id, "17849164549199999");
        assert_eq!(meta.delay, 0);
        assert!(meta.segments.is_none());
    }

    #[test]
    fn test_download_start_time_ignores_negative_delay() {
        let mut meta = parse(
            r#"{"id": "1", "published_time": 1000, "delay": 25, "broadcast_status": "active"}"#,
        );
        assert_eq!(meta.download_start_time(), 1025);
        meta.delay = -5;
        assert_eq!(meta.download_start_time(), 1000);
    }

    #[test]
    fn test_status_parsing() {
        let meta = parse(r#"{"id": "1", "published_time": 0, "broadcast_status": "post_live"}"#);
        assert!(meta.broadcast_status.is_post_live());
        assert!(meta.is_replay());

        let meta = parse(r#"{"id": "1", "published_time": 0, "broadcast_status": "hard_stop"}"#);
        assert_eq!(meta.broadcast_status, BroadcastStatus::Unknown);
        assert!(!meta.broadcast_status.is_ongoing());
    }

    #[test]
    fn test_empty_segment_map_is_absent() {
        let meta = parse(
            r#"{"id": "1", "published_time": 0, "broadcast_status": "active", "segments": {}}"#,
        );
        assert!(meta.segment_labels().is_none());

        let meta = parse(
            r#"{"id": "1", "published_time": 0, "broadcast_status": "active",
                "segments": {"1-3.m4v": "720x1280"}}"#,
        );
        assert_eq!(meta.segment_labels().unwrap()["1-3.m4v"], "720x1280");
    }

    #[test]
    fn test_unknown_fields_are_preserved() {
        let meta = parse(
            r#"{"id": "1", "published_time": 0, "broadcast_status": "active", "viewer_count": 12}"#,
        );
        assert_eq!(meta.extra["viewer_count"], 12);
        let back = serde_json::to_value(&meta).unwrap();
        assert_eq!(back["viewer_count"], 12);
    }

    #[test]
    fn test_load_missing_file() {
        let err = BroadcastMeta::load(Path::new("/nonexistent/broadcast.json")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broadcast.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = BroadcastMeta::load(&path).unwrap_err();
        assert!(matches!(err, Error::Malformed { .. }));
    }
}
