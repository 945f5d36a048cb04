//! Bounded tail of the host application's error log.
//!
//! Read-only and advisory. Only a fixed trailing window is read so a
//! multi-gigabyte log cannot exhaust memory, and lines come back newest
//! first for reading in a browser textarea.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Maximum number of trailing bytes read from the log.
pub const TAIL_CAP: usize = 20 * 1024;

/// The last `cap` bytes of `path` as lines, newest first.
///
/// Missing, unreadable, or empty files come back as explanatory text
/// rather than an error; this viewer must never take the rescue page down.
pub fn tail(path: &Path, cap: usize) -> String {
    if !path.exists() {
        return format!(
            "Debug log not found at {}. Enable the log flag and trigger an error to create it.",
            path.display()
        );
    }

    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(_) => return "Debug log exists but is not readable.".to_string(),
    };

    let size = match file.metadata() {
        Ok(meta) => meta.len(),
        Err(_) => return "Debug log exists but is not readable.".to_string(),
    };
    if size == 0 {
        return "Debug log is empty.".to_string();
    }

    let seek = size.saturating_sub(cap as u64);
    if file.seek(SeekFrom::Start(seek)).is_err() {
        return "Debug log exists but is not readable.".to_string();
    }

    let mut buf = Vec::with_capacity(cap.min(size as usize));
    if file.take(cap as u64).read_to_end(&mut buf).is_err() {
        return "Debug log exists but is not readable.".to_string();
    }
    let mut content = String::from_utf8_lossy(&buf).into_owned();

    // Discard the partial first line when the window starts mid-file.
    if seek > 0 {
        match content.find('\n') {
            Some(pos) => {
                content.drain(..=pos);
            }
            None => content.clear(),
        }
    }

    let mut lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
    lines.reverse();
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_message() {
        let dir = TempDir::new().unwrap();
        let out = tail(&dir.path().join("debug.log"), TAIL_CAP);
        assert!(out.contains("not found"));
    }

    #[test]
    fn test_empty_file_message() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("debug.log");
        fs::write(&path, "").unwrap();
        assert_eq!(tail(&path, TAIL_CAP), "Debug log is empty.");
    }

    #[test]
    fn test_lines_come_back_newest_first() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("debug.log");
        fs::write(&path, "first\nsecond\nthird\n").unwrap();
        assert_eq!(tail(&path, TAIL_CAP), "third\nsecond\nfirst");
    }

    #[test]
    fn test_window_is_bounded_and_partial_line_dropped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("debug.log");
        let mut content = String::new();
        for i in 0..100 {
            content.push_str(&format!("line number {i:04}\n"));
        }
        fs::write(&path, &content).unwrap();

        let out = tail(&path, 64);
        // Newest line survives, oldest lines fall outside the window.
        assert!(out.starts_with("line number 0099"));
        assert!(!out.contains("line number 0000"));
        // The first line in the window was cut mid-way and must be gone:
        // every surviving line is complete.
        for line in out.lines() {
            assert!(line.starts_with("line number "), "partial line kept: {line:?}");
        }
    }
}
