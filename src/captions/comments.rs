//! Comment records as stored in a comments JSON file.
//!
//! Two shapes occur: live comments polled while the broadcast runs carry an
//! absolute `created_at_utc`; replay comments carry an `offset` from the
//! start of the recording and nest the comment under `comment`.

use livestream_common::{BroadcastMeta, Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Author of a comment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pk: Option<Value>,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub is_verified: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Fields shared by both comment shapes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Value>,

    #[serde(default)]
    pub user: CommentUser,

    #[serde(default)]
    pub text: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CommentBody {
    /// User id as a string, from `user_id` or `user.pk`.
    pub fn user_id(&self) -> Option<String> {
        self.user_id
            .as_ref()
            .or(self.user.pk.as_ref())
            .and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    }
}

/// One stored comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Comment {
    /// Post-live comment positioned by seconds from recording start.
    Replay {
        offset: f64,
        comment: CommentBody,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    /// Comment polled during the live broadcast.
    Live {
        created_at_utc: f64,
        #[serde(flatten)]
        body: CommentBody,
    },
}

impl Comment {
    pub fn body(&self) -> &CommentBody {
        match self {
            Self::Replay { comment, .. } => comment,
            Self::Live { body, .. } => body,
        }
    }

    /// Normalise to an absolute-time caption event.
    pub fn to_event(&self, download_start_time: i64) -> CaptionEvent {
        let body = self.body();
        let created_at_utc = match self {
            Self::Replay { offset, .. } => download_start_time as f64 + offset,
            Self::Live { created_at_utc, .. } => *created_at_utc,
        };
        CaptionEvent {
            username: body.user.username.clone(),
            text: body.text.clone(),
            created_at_utc,
        }
    }
}

/// A comment placed on the broadcast's absolute timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionEvent {
    pub username: String,
    pub text: String,
    /// Unix seconds.
    pub created_at_utc: f64,
}

/// Contents of a comments JSON file.
///
/// The collector writes the broadcast record (minus `segments`) with the
/// comments added, so unknown fields are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentsFile {
    #[serde(default)]
    pub comments: Vec<Comment>,

    /// Seconds buffered before the first downloaded segment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_buffered_duration: Option<f64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CommentsFile {
    /// Start a comments file from a broadcast record.
    pub fn for_broadcast(meta: &BroadcastMeta, comments: Vec<Comment>) -> Self {
        let mut extra = match serde_json::to_value(meta) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        for key in ["segments", "comments", "initial_buffered_duration"] {
            extra.remove(key);
        }
        Self {
            comments,
            initial_buffered_duration: meta.initial_buffered_duration,
            extra,
        }
    }

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

    /// Write the file as pretty JSON, replacing any previous contents.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|source| Error::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Caption delay: the recorded buffered duration, else `default`.
    pub fn comments_delay(&self, default: f64) -> f64 {
        self.initial_buffered_duration.unwrap_or(default)
    }

    pub fn events(&self, download_start_time: i64) -> Vec<CaptionEvent> {
        self.comments
            .iter()
            .map(|c| c.to_event(download_start_time))
            .collect()
    }
}
