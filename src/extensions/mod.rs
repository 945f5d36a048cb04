//! Extensions as they exist on disk.
//!
//! An extension is a plugin or theme directory. Enabled/disabled state is
//! encoded purely in the directory name (a `.off` suffix means disabled), so
//! the state is inspectable from the filesystem alone and cannot drift from
//! any separate store. Discovery lists the root per request; nothing is
//! cached.

pub mod rename;

pub use rename::{sanitize_name, RenameEngine};

use crate::error::RescueResult;
use std::path::Path;

/// Name suffix marking a disabled extension.
pub const DISABLED_SUFFIX: &str = ".off";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionKind {
    Plugin,
    Theme,
}

impl ExtensionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plugin => "plugin",
            Self::Theme => "theme",
        }
    }

    /// Heading used on the rescue page.
    pub fn heading(&self) -> &'static str {
        match self {
            Self::Plugin => "Plugins",
            Self::Theme => "Themes",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "plugin" => Some(Self::Plugin),
            "theme" => Some(Self::Theme),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnabledState {
    Enabled,
    Disabled,
}

/// Derive enabled state purely from a directory name.
///
/// Returns the state together with the base name (suffix stripped).
pub fn derive_state(name: &str) -> (EnabledState, &str) {
    match name.strip_suffix(DISABLED_SUFFIX) {
        Some(base) => (EnabledState::Disabled, base),
        None => (EnabledState::Enabled, name),
    }
}

/// One directory entry under a plugin or theme root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionEntry {
    /// Current directory basename, suffix included when disabled.
    pub name: String,
    pub kind: ExtensionKind,
}

impl ExtensionEntry {
    pub fn state(&self) -> EnabledState {
        derive_state(&self.name).0
    }

    pub fn enabled(&self) -> bool {
        self.state() == EnabledState::Enabled
    }

    /// Name with the disabled suffix stripped, for display.
    pub fn display_name(&self) -> &str {
        derive_state(&self.name).1
    }

    /// The name this entry would get from flipping its state: the suffix is
    /// stripped when present, appended otherwise.
    pub fn toggled_name(&self) -> String {
        match self.state() {
            EnabledState::Disabled => self.display_name().to_string(),
            EnabledState::Enabled => format!("{}{DISABLED_SUFFIX}", self.name),
        }
    }
}

/// List the extensions under `root`, sorted by name.
///
/// Dot-entries are skipped. Themes must be directories; plugins may also be
/// single files.
pub fn list(root: &Path, kind: ExtensionKind) -> RescueResult<Vec<ExtensionEntry>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        if kind == ExtensionKind::Theme && !entry.path().is_dir() {
            continue;
        }
        entries.push(ExtensionEntry { name, kind });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}
