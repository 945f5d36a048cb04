//! The rename engine: the only mutation this system performs.
//!
//! Enabling or disabling an extension is a single directory rename under a
//! fixed root. Both names arrive from the gated request and are reduced to
//! bare directory-entry names before any path is built, so a request can
//! never reach outside the configured roots.

use crate::error::{RescueError, RescueResult};
use crate::extensions::ExtensionKind;
use crate::store::AuditLog;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Reduce an untrusted string to a bare directory-entry name.
///
/// Path separators and NUL are removed, `..` sequences are collapsed away,
/// and leading/trailing dots and whitespace are stripped. `None` means
/// nothing usable was left.
pub fn sanitize_name(raw: &str) -> Option<String> {
    let mut name: String = raw
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | '\0'))
        .collect();
    while name.contains("..") {
        name = name.replace("..", ".");
    }
    let name = name.trim().trim_matches('.').trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Performs and records enable/disable renames.
pub struct RenameEngine {
    plugins_root: PathBuf,
    themes_root: PathBuf,
    audit: AuditLog,
}

impl RenameEngine {
    pub fn new(
        plugins_root: impl Into<PathBuf>,
        themes_root: impl Into<PathBuf>,
        audit: AuditLog,
    ) -> Self {
        Self {
            plugins_root: plugins_root.into(),
            themes_root: themes_root.into(),
            audit,
        }
    }

    pub fn root_for(&self, kind: ExtensionKind) -> &Path {
        match kind {
            ExtensionKind::Plugin => &self.plugins_root,
            ExtensionKind::Theme => &self.themes_root,
        }
    }

    /// Rename `target` to `new_name` under the root for `kind`.
    ///
    /// The caller decides the desired name (suffix appended or stripped);
    /// this engine only validates, renames, and records. On success the
    /// returned string is the operator-facing confirmation.
    pub fn toggle(
        &self,
        kind: ExtensionKind,
        target: &str,
        new_name: &str,
        remote_addr: &str,
    ) -> RescueResult<String> {
        let target = sanitize_name(target).ok_or(RescueError::InvalidName)?;
        let new_name = sanitize_name(new_name).ok_or(RescueError::InvalidName)?;

        let root = self.root_for(kind);
        let old_path = root.join(&target);
        let new_path = root.join(&new_name);

        if !old_path.exists() {
            return Err(RescueError::NotFound);
        }
        if new_path.exists() {
            return Err(RescueError::Conflict);
        }

        if let Err(e) = fs::rename(&old_path, &new_path) {
            warn!(
                kind = kind.as_str(),
                from = %target,
                to = %new_name,
                error = %e,
                "Rename failed"
            );
            return Err(RescueError::Io(e));
        }

        info!(kind = kind.as_str(), from = %target, to = %new_name, "Renamed extension");
        self.audit.append(
            &format!("Renamed {target} to {new_name} ({kind})"),
            remote_addr,
        );
        Ok(format!("Successfully renamed {target} to {new_name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        engine: RenameEngine,
        plugins: PathBuf,
        audit: AuditLog,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let plugins = dir.path().join("plugins");
        let themes = dir.path().join("themes");
        fs::create_dir_all(&plugins).unwrap();
        fs::create_dir_all(&themes).unwrap();
        let audit = AuditLog::new(dir.path().join("rescue_log.txt"));
        let engine = RenameEngine::new(&plugins, &themes, audit.clone());
        Fixture {
            _dir: dir,
            engine,
            plugins,
            audit,
        }
    }

    #[test]
    fn test_disable_then_conflict_on_repeat() {
        let fx = fixture();
        fs::create_dir(fx.plugins.join("foo")).unwrap();

        let msg = fx
            .engine
            .toggle(ExtensionKind::Plugin, "foo", "foo.off", "127.0.0.1")
            .unwrap();
        assert_eq!(msg, "Successfully renamed foo to foo.off");
        assert!(fx.plugins.join("foo.off").is_dir());
        assert!(!fx.plugins.join("foo").exists());

        // Re-creating the enabled directory and replaying the same rename
        // must be rejected, not crash.
        fs::create_dir(fx.plugins.join("foo")).unwrap();
        assert!(matches!(
            fx.engine
                .toggle(ExtensionKind::Plugin, "foo", "foo.off", "127.0.0.1"),
            Err(RescueError::Conflict)
        ));
    }

    #[test]
    fn test_missing_target_is_not_found_and_unlogged() {
        let fx = fixture();
        assert!(matches!(
            fx.engine
                .toggle(ExtensionKind::Plugin, "ghost", "ghost.off", "127.0.0.1"),
            Err(RescueError::NotFound)
        ));
        assert!(fx.audit.read(10).is_empty());
    }

    #[test]
    fn test_success_writes_audit_entry() {
        let fx = fixture();
        fs::create_dir(fx.plugins.join("foo")).unwrap();
        fx.engine
            .toggle(ExtensionKind::Plugin, "foo", "foo.off", "203.0.113.5")
            .unwrap();

        let entries = fx.audit.read(10);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "Renamed foo to foo.off (plugin)");
        assert_eq!(entries[0].remote_addr, "203.0.113.5");
    }

    #[test]
    fn test_traversal_attempts_stay_inside_root() {
        let fx = fixture();
        fs::create_dir(fx.plugins.join("foo")).unwrap();

        // "../foo" reduces to "foo", so the rename happens inside the root.
        fx.engine
            .toggle(ExtensionKind::Plugin, "../foo", "foo.off", "127.0.0.1")
            .unwrap();
        assert!(fx.plugins.join("foo.off").is_dir());

        // A name that sanitizes to nothing is rejected outright.
        assert!(matches!(
            fx.engine
                .toggle(ExtensionKind::Plugin, "../..", "x", "127.0.0.1"),
            Err(RescueError::InvalidName)
        ));
        assert!(matches!(
            fx.engine
                .toggle(ExtensionKind::Plugin, "foo.off", "/", "127.0.0.1"),
            Err(RescueError::InvalidName)
        ));
    }

    #[test]
    fn test_theme_rename_uses_theme_root() {
        let dir = TempDir::new().unwrap();
        let plugins = dir.path().join("plugins");
        let themes = dir.path().join("themes");
        fs::create_dir_all(&plugins).unwrap();
        fs::create_dir_all(themes.join("dusk")).unwrap();
        let engine = RenameEngine::new(
            &plugins,
            &themes,
            AuditLog::new(dir.path().join("rescue_log.txt")),
        );

        engine
            .toggle(ExtensionKind::Theme, "dusk", "dusk.off", "127.0.0.1")
            .unwrap();
        assert!(themes.join("dusk.off").is_dir());
    }

    #[test]
    fn test_sanitize_name_examples() {
        assert_eq!(sanitize_name("akismet"), Some("akismet".to_string()));
        assert_eq!(sanitize_name("akismet.off"), Some("akismet.off".to_string()));
        assert_eq!(sanitize_name("../etc/passwd"), Some("etcpasswd".to_string()));
        assert_eq!(sanitize_name("a/b\\c"), Some("abc".to_string()));
        assert_eq!(sanitize_name("..."), None);
        assert_eq!(sanitize_name("  "), None);
        assert_eq!(sanitize_name(".hidden"), Some("hidden".to_string()));
    }

    proptest! {
        /// Whatever comes in, a sanitized name is a single non-empty path
        /// component that cannot climb out of the root.
        #[test]
        fn prop_sanitized_names_are_bare_components(raw in ".{0,64}") {
            if let Some(name) = sanitize_name(&raw) {
                prop_assert!(!name.is_empty());
                prop_assert!(!name.contains('/'));
                prop_assert!(!name.contains('\\'));
                prop_assert!(!name.contains('\0'));
                prop_assert!(!name.contains(".."));
                prop_assert!(name != ".");
                let joined = Path::new("root").join(&name);
                prop_assert!(joined.starts_with("root"));
                prop_assert_eq!(joined.components().count(), 2);
            }
        }
    }
}
