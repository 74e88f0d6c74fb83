//! SubRip rendering of caption blocks.

use super::CaptionBlock;
use chrono::DateTime;
use std::path::Path;

const BOM: char = '\u{feff}';

/// Format whole seconds as `HH:MM:SS`, wrapping at 24 hours.
fn clock(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "00:00:00".to_string())
}

/// Render blocks as SRT text (without the byte-order mark).
pub fn render(blocks: &[CaptionBlock]) -> String {
    blocks
        .iter()
        .map(|block| {
            format!(
                "{}\n{},001 --> {},000\n{}\n\n",
                block.index,
                clock(block.start),
                clock(block.end),
                block.text
            )
        })
        .collect()
}

/// Write blocks to `path` as BOM-prefixed UTF-8.
///
/// Nothing is written when `blocks` is empty; returns whether a file was written.
pub fn write_srt(path: &Path, blocks: &[CaptionBlock]) -> std::io::Result<bool> {
    if blocks.is_empty() {
        return Ok(false);
    }
    let mut content = String::from(BOM);
    content.push_str(&render(blocks));
    std::fs::write(path, content)?;
    Ok(true)
}
