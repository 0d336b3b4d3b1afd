use std::cmp::Ordering;
use std::path::{Path, PathBuf};

pub const AUDIO_EXT: &str = ".mp3";

pub const ALBUM_COVER: &str = "cover.jpg";

pub const DIR_COVER_NAMES: [&str; 2] = [ALBUM_COVER, "folder.jpg"];

pub fn clean_logical_path(raw: &str) -> Option<String> {
    let normalized = raw.replace('\\', "/");
    if normalized.contains("..") || is_absolute(&normalized) {
        return None;
    }
    Some(normalized)
}

pub fn sanitize_user(raw: &str) -> Option<String> {
    let cleaned = raw.replace("..", "").replace('~', "").replace('\\', "/");
    let cleaned = if is_absolute(&cleaned) {
        cleaned.rsplit('/').next().unwrap_or("").to_string()
    } else {
        cleaned
    };
    let parts: Vec<&str> = path_segments(&cleaned).collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

fn is_absolute(path: &str) -> bool {
    path.starts_with('/') || path.as_bytes().get(1) == Some(&b':')
}

pub fn sanitize_segment(value: &str, fallback: &str) -> String {
    let cleaned = value.replace(['/', '\\'], "-");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        return fallback.to_string();
    }
    cleaned.to_string()
}

pub fn is_audio_name(name: &str) -> bool {
    name.to_lowercase().ends_with(AUDIO_EXT)
}

// Empty and current-dir segments never reach the filesystem, so any check
// against a path's first name has to look at this same view.
pub fn path_segments(path: &str) -> impl Iterator<Item = &str> + '_ {
    path.split('/').filter(|part| !part.is_empty() && *part != ".")
}

pub fn join_relpath(root: &Path, relpath: &str) -> PathBuf {
    let mut out = PathBuf::from(root);
    for part in path_segments(relpath) {
        out.push(part);
    }
    out
}

pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_key(a).cmp(&natural_key(b))
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Chunk {
    // (digit count after stripping leading zeros, stripped digits) compares
    // numerically without overflowing on absurdly long runs
    Number(usize, String),
    Text(String),
}

fn natural_key(name: &str) -> Vec<Chunk> {
    let mut key = Vec::new();
    let mut run = String::new();
    let mut run_is_digits = false;
    for ch in name.chars() {
        let is_digit = ch.is_ascii_digit();
        if !run.is_empty() && is_digit != run_is_digits {
            key.push(make_chunk(std::mem::take(&mut run), run_is_digits));
        }
        run_is_digits = is_digit;
        run.push(ch);
    }
    if !run.is_empty() {
        key.push(make_chunk(run, run_is_digits));
    }
    key
}

fn make_chunk(run: String, digits: bool) -> Chunk {
    if digits {
        let stripped = run.trim_start_matches('0');
        Chunk::Number(stripped.len(), stripped.to_string())
    } else {
        Chunk::Text(run.to_lowercase())
    }
}
