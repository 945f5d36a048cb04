//! Append-only log of every mutation performed through rescue mode.
//!
//! One text line per entry, `YYYY-MM-DD HH:MM:SS - message - IP: addr`,
//! readable with nothing but `cat` on a half-dead server. Entries are never
//! edited; the log can only grow or be cleared wholesale.

use crate::error::{RescueError, RescueResult};
use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, warn};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One immutable audit record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub timestamp: String,
    pub message: String,
    pub remote_addr: String,
}

impl AuditEntry {
    /// Parse a stored line. Lines that do not follow the format come back
    /// with the raw text as the message so nothing is silently dropped.
    fn parse(line: &str) -> Self {
        let parts: Vec<&str> = line.split(" - ").collect();
        if parts.len() >= 3 {
            let timestamp = parts[0].to_string();
            let ip_part = parts[parts.len() - 1];
            let remote_addr = ip_part.strip_prefix("IP: ").unwrap_or(ip_part).to_string();
            let message = parts[1..parts.len() - 1].join(" - ");
            Self {
                timestamp,
                message,
                remote_addr,
            }
        } else {
            Self {
                timestamp: String::new(),
                message: line.to_string(),
                remote_addr: String::new(),
            }
        }
    }
}

/// Append-only activity log backed by a plain text file.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append one entry, stamped with the current UTC time.
    ///
    /// Best-effort: a failed write is logged and swallowed, because a
    /// read-only log partition must not abort a successful rename.
    pub fn append(&self, message: &str, remote_addr: &str) {
        let line = format!(
            "{} - {} - IP: {}\n",
            Utc::now().format(TIMESTAMP_FORMAT),
            message,
            remote_addr
        );
        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut f| f.write_all(line.as_bytes()));
        if let Err(e) = result {
            warn!(path = %self.path.display(), error = %e, "Failed to append audit entry");
        }
    }

    /// Up to `limit` entries, most recent first. A missing or unreadable
    /// log reads as empty; this surface is advisory.
    pub fn read(&self, limit: usize) -> Vec<AuditEntry> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "No audit log to read");
                return Vec::new();
            }
        };
        raw.lines()
            .filter(|line| !line.trim().is_empty())
            .rev()
            .take(limit)
            .map(AuditEntry::parse)
            .collect()
    }

    /// Truncate the log to empty. Irreversible.
    pub fn clear(&self) -> RescueResult<()> {
        if !self.path.exists() {
            return Ok(());
        }
        fs::write(&self.path, "")
            .map_err(|e| RescueError::storage(format!("{}: {e}", self.path.display())))
    }
}
