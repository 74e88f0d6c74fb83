//! Shared fixtures for integration tests.
#![allow(dead_code)]

use livestream_av::Muxer;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

pub const STREAM_ID: &str = "17849164549199999";
pub const PUBLISHED: i64 = 1486300000;

/// A broadcast record with `extra` merged over the basic fields.
pub fn broadcast(status: &str, extra: Value) -> Value {
    let mut value = json!({
        "id": STREAM_ID,
        "published_time": PUBLISHED,
        "delay": 0,
        "broadcast_status": status,
        "broadcast_owner": {"username": "johndoe"},
    });
    if let (Some(base), Value::Object(extra)) = (value.as_object_mut(), extra) {
        base.extend(extra);
    }
    value
}

pub fn write_json(path: &Path, value: &Value) -> PathBuf {
    std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path.to_path_buf()
}

/// Write `{id}-{n}.m4v` / `.m4a` with recognisable contents.
pub fn write_chunk(dir: &Path, index: &str, video: &[u8]) {
    std::fs::write(dir.join(format!("{}-{}.m4v", STREAM_ID, index)), video).unwrap();
    std::fs::write(
        dir.join(format!("{}-{}.m4a", STREAM_ID, index)),
        format!("A{};", index),
    )
    .unwrap();
}

pub fn chunk_name(index: &str) -> String {
    format!("{}-{}.m4v", STREAM_ID, index)
}

/// Muxer that writes `audio ++ video` to the output and records each call.
#[derive(Default)]
pub struct FakeMuxer {
    pub fail_on_call: Option<usize>,
    pub calls: RefCell<Vec<(PathBuf, PathBuf, PathBuf)>>,
}

impl FakeMuxer {
    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Default::default()
        }
    }

    pub fn outputs(&self) -> Vec<PathBuf> {
        self.calls.borrow().iter().map(|c| c.2.clone()).collect()
    }
}

impl Muxer for FakeMuxer {
    fn mux(&self, audio: &Path, video: &Path, output: &Path) -> livestream_av::Result<()> {
        let call = self.calls.borrow().len();
        self.calls
            .borrow_mut()
            .push((audio.to_path_buf(), video.to_path_buf(), output.to_path_buf()));

        if self.fail_on_call == Some(call) {
            return Err(livestream_av::Error::tool_failed(
                "ffmpeg",
                "exited with code 1",
            ));
        }

        let mut data = std::fs::read(audio)?;
        data.extend(std::fs::read(video)?);
        std::fs::write(output, data)?;
        Ok(())
    }
}
