//! Output file naming from a user-supplied format string.
//!
//! Formats use `{placeholder}` fields, e.g. the default
//! `{year}{month}{day}_{username}_{broadcastid}_{broadcasttype}`.

use chrono::{DateTime, Utc};
use livestream_common::BroadcastMeta;
use regex::Regex;
use std::sync::LazyLock;

/// Placeholders accepted in a filename format.
pub const PLACEHOLDERS: &[&str] = &[
    "year",
    "month",
    "day",
    "hour",
    "minute",
    "username",
    "broadcastid",
    "broadcasttype",
];

/// Exit code for an unusable filename format.
pub const INVALID_FORMAT_EXIT_CODE: u8 = 10;

static FIELD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]*)\}").expect("static regex"));

#[derive(Debug, thiserror::Error)]
pub enum NamingError {
    #[error("filename format is empty")]
    EmptyFormat,

    #[error("invalid filename format parameters: {}", .0.join(", "))]
    UnknownPlaceholders(Vec<String>),
}

impl NamingError {
    pub fn exit_code(&self) -> u8 {
        INVALID_FORMAT_EXIT_CODE
    }
}

/// Check that `format` is non-empty and only uses known placeholders.
pub fn check_format(format: &str) -> Result<(), NamingError> {
    if format.trim().is_empty() {
        return Err(NamingError::EmptyFormat);
    }

    let unknown: Vec<String> = FIELD_RE
        .captures_iter(format)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|name| !PLACEHOLDERS.contains(name))
        .map(str::to_string)
        .collect();

    if unknown.is_empty() {
        Ok(())
    } else {
        Err(NamingError::UnknownPlaceholders(unknown))
    }
}

/// Expand `format` for a broadcast.
///
/// Replays are dated by their `published_time`; live broadcasts by `now`.
pub fn filename_prefix(
    meta: &BroadcastMeta,
    format: &str,
    now: DateTime<Utc>,
) -> Result<String, NamingError> {
    check_format(format)?;

    let (start, broadcast_type) = if meta.is_replay() {
        (
            DateTime::from_timestamp(meta.published_time, 0).unwrap_or(now),
            "replay",
        )
    } else {
        (now, "live")
    };

    let expanded = FIELD_RE.replace_all(format, |caps: &regex::Captures<'_>| {
        match caps.get(1).map(|m| m.as_str()).unwrap_or_default() {
            "year" => start.format("%Y").to_string(),
            "month" => start.format("%m").to_string(),
            "day" => start.format("%d").to_string(),
            "hour" => start.format("%H").to_string(),
            "minute" => start.format("%M").to_string(),
            "username" => meta.owner_username().to_string(),
            "broadcastid" => meta.id.clone(),
            "broadcasttype" => broadcast_type.to_string(),
            _ => String::new(),
        }
    });

    Ok(expanded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const DEFAULT_FORMAT: &str = "{year}{month}{day}_{username}_{broadcastid}_{broadcasttype}";

    fn meta(json: &str) -> BroadcastMeta {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_replay_uses_published_time() {
        let replay = meta(
            r#"{"id": 178, "published_time": 1486300000, "broadcast_status": "post_live",
                "broadcast_owner": {"username": "johndoe"}}"#,
        );
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let name = filename_prefix(&replay, DEFAULT_FORMAT, now).unwrap();
        assert_eq!(name, "20170205_johndoe_178_replay");
    }

    #[test]
    fn test_live_uses_now() {
        let live = meta(
            r#"{"id": "178", "published_time": 1486300000, "broadcast_status": "active",
                "dash_playback_url": "https://example.invalid/live.mpd",
                "broadcast_owner": {"username": "johndoe"}}"#,
        );
        let now = Utc.with_ymd_and_hms(2030, 3, 4, 5, 6, 0).unwrap();
        let name = filename_prefix(&live, "{year}-{month}-{day}T{hour}{minute}_{broadcasttype}", now)
            .unwrap();
        assert_eq!(name, "2030-03-04T0506_live");
    }

    #[test]
    fn test_unknown_placeholder_rejected() {
        let err = check_format("{year}_{nope}_{title}").unwrap_err();
        match &err {
            NamingError::UnknownPlaceholders(names) => assert_eq!(names, &["nope", "title"]),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.exit_code(), 10);
        assert!(err.to_string().contains("nope, title"));
    }

    #[test]
    fn test_empty_format_rejected() {
        assert!(matches!(check_format("  "), Err(NamingError::EmptyFormat)));
    }

    #[test]
    fn test_literal_text_kept() {
        assert!(check_format("broadcast").is_ok());
    }
}
