//! Rescue page rendering.
//!
//! One self-contained HTML document, styled inline, no external assets: the
//! page must work when nothing else on the host does. Everything
//! interpolated from the filesystem or the query string is HTML-escaped.

use crate::extensions::{ExtensionEntry, ExtensionKind};
use crate::rescue::{
    ACTION_PARAM, KEY_PARAM, KIND_PARAM, NEW_NAME_PARAM, RENAME_ACTION, TARGET_PARAM, TOGGLE_PARAM,
};

/// Listing of one extension kind, or the reason it could not be read.
pub struct KindListing {
    pub kind: ExtensionKind,
    /// Root directory, for the error message when unreadable.
    pub root: String,
    /// `None` when the root could not be listed.
    pub entries: Option<Vec<ExtensionEntry>>,
}

/// Everything the page needs; assembled by the gate.
pub struct RescueView<'a> {
    /// Request path the links lead back to.
    pub path: &'a str,
    /// The verified secret, re-embedded into every link.
    pub key: &'a str,
    pub flash_msg: Option<String>,
    pub flash_error: Option<String>,
    pub log_flag_on: bool,
    /// Tail of the host error log, present when the log flag is set.
    pub log_tail: Option<String>,
    pub listings: Vec<KindListing>,
}

const STYLE: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; background: #f0f0f1; color: #3c434a; padding: 20px; line-height: 1.5; }
.container { max-width: 900px; margin: 0 auto; background: #fff; padding: 30px; box-shadow: 0 1px 3px rgba(0,0,0,0.1); border-radius: 5px; }
h1 { color: #d63638; margin-top: 0; border-bottom: 2px solid #eee; padding-bottom: 10px; }
h2 { margin-top: 30px; font-size: 1.3em; }
table { width: 100%; border-collapse: collapse; margin-top: 15px; border: 1px solid #e5e5e5; }
th, td { text-align: left; padding: 12px; border-bottom: 1px solid #e5e5e5; }
th { background: #f9f9f9; font-weight: 600; }
tr:hover { background: #fafafa; }
.btn { display: inline-block; padding: 6px 12px; text-decoration: none; border-radius: 3px; font-size: 13px; cursor: pointer; border: 1px solid transparent; }
.btn-danger { background: #d63638; color: #fff; border-color: #d63638; }
.btn-primary { background: #2271b1; color: #fff; border-color: #2271b1; }
.btn-secondary { background: #f6f7f7; color: #2c3338; border-color: #dcdcde; }
.status-active { color: #007017; font-weight: bold; background: #edfaef; padding: 4px 8px; border-radius: 4px; font-size: 0.9em; }
.status-disabled { color: #d63638; font-weight: bold; background: #fbeaea; padding: 4px 8px; border-radius: 4px; font-size: 0.9em; }
.message { padding: 12px; margin-bottom: 20px; border-left: 4px solid; box-shadow: 0 1px 1px rgba(0,0,0,0.04); }
.message.success { border-color: #46b450; background: #fff; }
.message.error { border-color: #d63638; background: #fff; }
.box { margin-bottom: 20px; padding: 15px; background: #fff; border: 1px solid #ccd0d4; border-left: 4px solid #2271b1; box-shadow: 0 1px 1px rgba(0,0,0,0.04); }
.box h3 { margin-top: 0; }
textarea.log { width: 100%; height: 300px; font-family: monospace; font-size: 12px; background: #f0f0f1; border: 1px solid #ddd; padding: 10px; white-space: pre; }
.footer { margin-top: 40px; font-size: 0.9em; color: #646970; text-align: center; border-top: 1px solid #eee; padding-top: 20px; }
"#;

/// Escape text for HTML body and attribute contexts.
fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Percent-encoded query string from key/value pairs.
fn query(pairs: &[(&str, &str)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

fn self_url(view: &RescueView) -> String {
    format!("{}?{}", view.path, query(&[(KEY_PARAM, view.key)]))
}

fn flash_boxes(view: &RescueView) -> String {
    let mut out = String::new();
    if let Some(msg) = &view.flash_msg {
        out.push_str(&format!(
            r#"<div class="message success">{}</div>"#,
            escape_html(msg)
        ));
    }
    if let Some(error) = &view.flash_error {
        out.push_str(&format!(
            r#"<div class="message error">{}</div>"#,
            escape_html(error)
        ));
    }
    out
}

fn debug_tools(view: &RescueView) -> String {
    let toggle_url = format!(
        "{}?{}",
        view.path,
        query(&[(KEY_PARAM, view.key), (TOGGLE_PARAM, "log")])
    );
    let label = if view.log_flag_on { "Disable" } else { "Enable" };
    let class = if view.log_flag_on {
        "btn-primary"
    } else {
        "btn-secondary"
    };
    format!(
        r#"<div class="box">
<h3>Debug tools</h3>
<p>Toggle debugging options for this session:</p>
<a href="{}" class="btn {class}">{label} debug log viewer</a>
</div>"#,
        escape_html(&toggle_url)
    )
}

fn log_viewer(view: &RescueView) -> String {
    let Some(tail) = &view.log_tail else {
        return String::new();
    };
    format!(
        r#"<div class="box">
<h3>Debug log viewer</h3>
<p>Last 20KB of the host error log, newest first:</p>
<textarea class="log" readonly>{}</textarea>
<p style="text-align: right; margin-top: 5px;"><a href="{}" class="btn btn-secondary">Refresh log</a></p>
</div>"#,
        escape_html(tail),
        escape_html(&self_url(view))
    )
}

fn listing_table(listing: &KindListing, view: &RescueView) -> String {
    let entries = match &listing.entries {
        None => {
            return format!(
                r#"<div class="message error">Directory not found: {}</div>"#,
                escape_html(&listing.root)
            );
        }
        Some(entries) if entries.is_empty() => return "<p>No items found.</p>".to_string(),
        Some(entries) => entries,
    };

    let mut rows = String::new();
    for entry in entries {
        let (status_class, status_label, action_label, btn_class) = if entry.enabled() {
            ("status-active", "Active", "Disable (Rename)", "btn-danger")
        } else {
            ("status-disabled", "Disabled", "Restore (Enable)", "btn-primary")
        };
        let toggled = entry.toggled_name();
        let action_url = format!(
            "{}?{}",
            view.path,
            query(&[
                (KEY_PARAM, view.key),
                (ACTION_PARAM, RENAME_ACTION),
                (KIND_PARAM, listing.kind.as_str()),
                (TARGET_PARAM, &entry.name),
                (NEW_NAME_PARAM, &toggled),
            ])
        );
        rows.push_str(&format!(
            r#"<tr>
<td><strong>{display}</strong><br><small style="color:#666">{name}</small></td>
<td><span class="{status_class}">{status_label}</span></td>
<td><a href="{url}" class="btn {btn_class}" onclick="return confirm('Are you sure you want to {confirm}?');">{action_label}</a></td>
</tr>"#,
            display = escape_html(entry.display_name()),
            name = escape_html(&entry.name),
            url = escape_html(&action_url),
            confirm = action_label.to_lowercase(),
        ));
    }

    format!(
        "<table><thead><tr><th>Name (folder)</th><th>Status</th><th>Action</th></tr></thead><tbody>{rows}</tbody></table>"
    )
}

/// Render the full recovery page.
pub fn render(view: &RescueView) -> String {
    let mut sections = String::new();
    sections.push_str(&debug_tools(view));
    sections.push_str(&log_viewer(view));
    sections.push_str(&flash_boxes(view));
    for listing in &view.listings {
        sections.push_str(&format!("<h2>{}</h2>", listing.kind.heading()));
        sections.push_str(&listing_table(listing, view));
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<title>Break-glass rescue</title>
<meta name="viewport" content="width=device-width, initial-scale=1">
<style>{STYLE}</style>
</head>
<body>
<div class="container">
<h1>Break-glass rescue</h1>
<p>Welcome to the emergency recovery mode. Here you can selectively disable plugins or themes by renaming their folders.</p>
<div style="margin-bottom: 20px;">
<a href="/admin" class="btn btn-primary" target="_blank">Try loading the admin panel &nearr;</a>
<a href="/" class="btn btn-secondary" target="_blank">View site &nearr;</a>
</div>
{sections}
<div class="footer">
<p>Generated by break-glass rescue &bull; <a href="{refresh}">Refresh page</a></p>
</div>
</div>
</body>
</html>"#,
        refresh = escape_html(&self_url(view)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view_with(entries: Vec<ExtensionEntry>) -> RescueView<'static> {
        RescueView {
            path: "/",
            key: "abc123",
            flash_msg: None,
            flash_error: None,
            log_flag_on: false,
            log_tail: None,
            listings: vec![KindListing {
                kind: ExtensionKind::Plugin,
                root: "content/plugins".to_string(),
                entries: Some(entries),
            }],
        }
    }

    #[test]
    fn test_render_lists_entries_with_action_links() {
        let html = render(&view_with(vec![
            ExtensionEntry {
                name: "akismet".to_string(),
                kind: ExtensionKind::Plugin,
            },
            ExtensionEntry {
                name: "broken.off".to_string(),
                kind: ExtensionKind::Plugin,
            },
        ]));

        assert!(html.contains("akismet"));
        assert!(html.contains("Disable (Rename)"));
        assert!(html.contains("Restore (Enable)"));
        assert!(html.contains("new_name=akismet.off"));
        assert!(html.contains("new_name=broken"));
        assert!(html.contains("rescue_key=abc123"));
    }

    #[test]
    fn test_render_escapes_untrusted_names() {
        let html = render(&view_with(vec![ExtensionEntry {
            name: "<script>alert(1)</script>".to_string(),
            kind: ExtensionKind::Plugin,
        }]));
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_render_flashes_and_log_viewer() {
        let mut view = view_with(vec![]);
        view.flash_msg = Some("Successfully renamed foo to foo.off".to_string());
        view.flash_error = Some("Destination already exists.".to_string());
        view.log_flag_on = true;
        view.log_tail = Some("fatal: something broke".to_string());

        let html = render(&view);
        assert!(html.contains("Successfully renamed foo to foo.off"));
        assert!(html.contains("Destination already exists."));
        assert!(html.contains("fatal: something broke"));
        assert!(html.contains("Disable debug log viewer"));
    }

    #[test]
    fn test_render_missing_root_message() {
        let view = RescueView {
            path: "/",
            key: "abc123",
            flash_msg: None,
            flash_error: None,
            log_flag_on: false,
            log_tail: None,
            listings: vec![KindListing {
                kind: ExtensionKind::Theme,
                root: "content/themes".to_string(),
                entries: None,
            }],
        };
        let html = render(&view);
        assert!(html.contains("Directory not found: content/themes"));
    }
}
