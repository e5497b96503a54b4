//! Naming of raw capture segments and detection of segment rollover in the
//! capture process's diagnostic output.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use api::recorder::AudioCodec;

const PREFIX: &str = "chunk_";
const RAW_EXT: &str = "ts";

/// Output pattern handed to the segment muxer
pub fn capture_pattern(dir: &Path) -> PathBuf {
    dir.join(format!("{PREFIX}%04d.{RAW_EXT}"))
}

pub fn raw_filename(index: u32) -> String {
    format!("{PREFIX}{index:04}.{RAW_EXT}")
}

pub fn output_filename(index: u32, codec: AudioCodec) -> String {
    format!("{PREFIX}{index:04}.{}", codec.extension())
}

/// `chunk_0007.ts` -> 7
pub fn parse_raw_index(filename: &str) -> Option<u32> {
    let digits = filename
        .strip_prefix(PREFIX)?
        .strip_suffix(RAW_EXT)?
        .strip_suffix('.')?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Index of the segment file the muxer just opened, from a line like
/// `[segment @ 0x55d0c8] Opening '/tmp/r1/chunk_0001.ts' for writing`.
pub fn parse_opening(line: &str) -> Option<u32> {
    let rest = &line[line.find("Opening ")? + "Opening ".len()..];
    let quoted = rest.trim_start().strip_prefix('\'')?;
    let path = &quoted[..quoted.find('\'')?];
    let name = Path::new(path).file_name()?.to_str()?;
    parse_raw_index(name)
}

/// Raw segment files in `dir` not yet handed off, in index order.
pub fn pending_segments(dir: &Path, dispatched: &BTreeSet<u32>) -> io::Result<Vec<(u32, PathBuf)>> {
    let mut pending = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(index) = name.to_str().and_then(parse_raw_index) else {
            continue;
        };
        if !dispatched.contains(&index) {
            pending.push((index, entry.path()));
        }
    }
    pending.sort_by_key(|(index, _)| *index);
    Ok(pending)
}
