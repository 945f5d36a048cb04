//! The rescue gate.
//!
//! An axum middleware that runs before any host logic. Requests without the
//! correct secret pass through untouched; the host never learns the gate
//! exists and the gate performs zero side effects. A matching secret makes
//! the gate authoritative for the rest of the request: it either flips a
//! debug flag and redirects, performs one pending rename and redirects, or
//! renders the recovery page.
//!
//! Authentication is per-request. There is no login session to fixate and
//! no logout; presenting the secret is the whole protocol.

use crate::config::RescueConfig;
use crate::error::RescueResult;
use crate::extensions::{self, ExtensionKind, RenameEngine};
use crate::rescue::{
    debuglog, flags, page, ACTION_PARAM, ERROR_PARAM, KEY_PARAM, KIND_PARAM, MSG_PARAM,
    NEW_NAME_PARAM, RENAME_ACTION, TARGET_PARAM, TOGGLE_PARAM,
};
use crate::store::{AuditLog, FileKvStore, Secret, SecretStore};
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderValue, Uri};
use axum::middleware::Next;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything the gate needs, wired explicitly so tests can inject fakes.
pub struct RescueContext {
    pub secrets: SecretStore,
    pub engine: RenameEngine,
    pub audit: AuditLog,
    debug_log: PathBuf,
}

impl RescueContext {
    pub fn new(
        secrets: SecretStore,
        engine: RenameEngine,
        audit: AuditLog,
        debug_log: impl Into<PathBuf>,
    ) -> Self {
        Self {
            secrets,
            engine,
            audit,
            debug_log: debug_log.into(),
        }
    }

    pub fn from_config(config: &RescueConfig) -> Self {
        let kv = Arc::new(FileKvStore::new(config.paths.secret_store_file()));
        let audit = AuditLog::new(config.paths.audit_log_file());
        let engine = RenameEngine::new(
            &config.paths.plugins_dir,
            &config.paths.themes_dir,
            audit.clone(),
        );
        Self::new(
            SecretStore::new(kv),
            engine,
            audit,
            &config.paths.debug_log,
        )
    }

    /// The bookmarkable URL that activates rescue mode, generating the
    /// secret on first use.
    pub fn rescue_url(&self, base: &str) -> RescueResult<String> {
        let secret = self.secrets.current()?;
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair(KEY_PARAM, secret.reveal())
            .finish();
        Ok(format!("{}/?{query}", base.trim_end_matches('/')))
    }
}

/// Middleware entry point: install with
/// `axum::middleware::from_fn_with_state(ctx, rescue_gate)` in front of the
/// host router.
pub async fn rescue_gate(
    State(ctx): State<Arc<RescueContext>>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Response {
    let params = QueryParams::from_uri(req.uri());

    // No candidate key: not a rescue request at all.
    let Some(candidate) = params.first(KEY_PARAM) else {
        return next.run(req).await;
    };

    let secret = match ctx.secrets.stored() {
        Ok(Some(secret)) => secret,
        Ok(None) => {
            debug!("No rescue secret stored; yielding to host");
            return next.run(req).await;
        }
        Err(e) => {
            warn!(error = %e, "Secret storage unavailable; rescue mode disabled");
            return next.run(req).await;
        }
    };

    // Silent on mismatch: the response must not reveal whether a secret
    // exists at all.
    if !key_matches(&candidate, &secret) {
        debug!("Rescue key mismatch; yielding to host");
        return next.run(req).await;
    }

    if let Some(toggle) = params.first(TOGGLE_PARAM) {
        return toggle_response(req.uri(), &toggle, &jar, &secret);
    }

    if params.first(ACTION_PARAM).as_deref() == Some(RENAME_ACTION) {
        let remote_addr = remote_addr(&req);
        return mutation_response(&ctx, req.uri(), &params, &remote_addr);
    }

    serve_page(&ctx, req.uri(), &params, &jar, &secret)
}

/// Constant-time secret comparison: equality of BLAKE3 digests.
fn key_matches(candidate: &str, secret: &Secret) -> bool {
    blake3::hash(candidate.as_bytes()) == blake3::hash(secret.reveal().as_bytes())
}

fn remote_addr(req: &Request) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Flip the named flag's cookie and redirect with the directive stripped.
/// The directive is consumed even when the flag name is unknown.
fn toggle_response(uri: &Uri, toggle: &str, jar: &CookieJar, secret: &Secret) -> Response {
    let target = url_without(uri, &[TOGGLE_PARAM]);
    let mut response = Redirect::to(&target).into_response();
    match flags::SessionFlag::parse(toggle) {
        Some(flag) => {
            let (cookie, now_set) = flags::toggle_cookie(flag, jar, secret);
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    response.headers_mut().append(header::SET_COOKIE, value);
                    info!(flag = flag.as_str(), enabled = now_set, "Toggled debug flag");
                }
                Err(e) => warn!(error = %e, "Could not encode flag cookie"),
            }
        }
        None => debug!(flag = toggle, "Ignoring unknown debug flag"),
    }
    response
}

/// Perform the one pending rename and redirect with a one-shot flash.
fn mutation_response(
    ctx: &RescueContext,
    uri: &Uri,
    params: &QueryParams,
    remote_addr: &str,
) -> Response {
    let kind = params
        .first(KIND_PARAM)
        .and_then(|raw| ExtensionKind::parse(&raw))
        .unwrap_or(ExtensionKind::Plugin);
    let target = params.first(TARGET_PARAM).unwrap_or_default();
    let new_name = params.first(NEW_NAME_PARAM).unwrap_or_default();

    let base = url_without(
        uri,
        &[
            ACTION_PARAM,
            KIND_PARAM,
            TARGET_PARAM,
            NEW_NAME_PARAM,
            MSG_PARAM,
            ERROR_PARAM,
        ],
    );
    let target_url = match ctx.engine.toggle(kind, &target, &new_name, remote_addr) {
        Ok(msg) => append_param(&base, MSG_PARAM, &msg),
        Err(e) => {
            warn!(error = %e, kind = kind.as_str(), "Rescue mutation failed");
            append_param(&base, ERROR_PARAM, &e.operator_message())
        }
    };
    Redirect::to(&target_url).into_response()
}

/// Render the recovery interface.
fn serve_page(
    ctx: &RescueContext,
    uri: &Uri,
    params: &QueryParams,
    jar: &CookieJar,
    secret: &Secret,
) -> Response {
    let log_flag_on = flags::is_set(flags::SessionFlag::Log, jar, secret);
    let log_tail = log_flag_on.then(|| debuglog::tail(&ctx.debug_log, debuglog::TAIL_CAP));

    let listings = [ExtensionKind::Plugin, ExtensionKind::Theme]
        .into_iter()
        .map(|kind| {
            let root = ctx.engine.root_for(kind);
            let entries = match extensions::list(root, kind) {
                Ok(entries) => Some(entries),
                Err(e) => {
                    warn!(root = %root.display(), error = %e, "Could not list extensions");
                    None
                }
            };
            page::KindListing {
                kind,
                root: root.display().to_string(),
                entries,
            }
        })
        .collect();

    let view = page::RescueView {
        path: uri.path(),
        key: secret.reveal(),
        flash_msg: params.first(MSG_PARAM),
        flash_error: params.first(ERROR_PARAM),
        log_flag_on,
        log_tail,
        listings,
    };
    Html(page::render(&view)).into_response()
}

/// Decoded query parameters, first occurrence wins.
struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    fn from_uri(uri: &Uri) -> Self {
        let pairs = uri
            .query()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        Self(pairs)
    }

    fn first(&self, key: &str) -> Option<String> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }
}

/// The same URL with the given query parameters removed, re-encoded.
fn url_without(uri: &Uri, strip: &[&str]) -> String {
    let path = uri.path();
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    let mut kept_any = false;
    if let Some(query) = uri.query() {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if strip.contains(&key.as_ref()) {
                continue;
            }
            serializer.append_pair(&key, &value);
            kept_any = true;
        }
    }
    if kept_any {
        format!("{path}?{}", serializer.finish())
    } else {
        path.to_string()
    }
}

fn append_param(base: &str, key: &str, value: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair(key, value)
        .finish();
    if base.contains('?') {
        format!("{base}&{query}")
    } else {
        format!("{base}?{query}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::secret::test_secret;

    #[test]
    fn test_key_matches_exact_only() {
        let secret = test_secret("abc123");
        assert!(key_matches("abc123", &secret));
        assert!(!key_matches("abc12", &secret));
        assert!(!key_matches("abc1234", &secret));
        assert!(!key_matches("", &secret));
    }

    #[test]
    fn test_url_without_strips_and_keeps() {
        let uri: Uri = "/?rescue_key=abc&debug_toggle=log&x=1".parse().unwrap();
        let out = url_without(&uri, &[TOGGLE_PARAM]);
        assert_eq!(out, "/?rescue_key=abc&x=1");
    }

    #[test]
    fn test_url_without_everything_leaves_bare_path() {
        let uri: Uri = "/recover?rescue_key=abc".parse().unwrap();
        assert_eq!(url_without(&uri, &[KEY_PARAM]), "/recover");
    }

    #[test]
    fn test_append_param_encodes() {
        let out = append_param("/?rescue_key=abc", MSG_PARAM, "Successfully renamed a to b");
        assert_eq!(out, "/?rescue_key=abc&msg=Successfully+renamed+a+to+b");
        let out = append_param("/recover", ERROR_PARAM, "x&y");
        assert_eq!(out, "/recover?error=x%26y");
    }

    #[test]
    fn test_query_params_first_occurrence_wins() {
        let uri: Uri = "/?a=1&a=2&b=%20space".parse().unwrap();
        let params = QueryParams::from_uri(&uri);
        assert_eq!(params.first("a").as_deref(), Some("1"));
        assert_eq!(params.first("b").as_deref(), Some(" space"));
        assert_eq!(params.first("c"), None);
    }

    #[test]
    fn test_rescue_url_shape() {
        let dir = tempfile::TempDir::new().unwrap();
        let kv = Arc::new(FileKvStore::new(dir.path().join("state.json")));
        let secrets = SecretStore::new(kv);
        secrets.set("abc123").unwrap();
        let audit = AuditLog::new(dir.path().join("rescue_log.txt"));
        let engine = RenameEngine::new(
            dir.path().join("plugins"),
            dir.path().join("themes"),
            audit.clone(),
        );
        let ctx = RescueContext::new(secrets, engine, audit, dir.path().join("debug.log"));

        let url = ctx.rescue_url("http://example.com").unwrap();
        assert_eq!(url, "http://example.com/?rescue_key=abc123");
        // Trailing slash on the base collapses.
        let url = ctx.rescue_url("http://example.com/").unwrap();
        assert_eq!(url, "http://example.com/?rescue_key=abc123");
    }
}
