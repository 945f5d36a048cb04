//! Stateless debug-flag tokens.
//!
//! A flag is a named boolean the operator can flip while in rescue mode. It
//! lives entirely client-side: the cookie value is the BLAKE3 digest of the
//! current secret, so no server-side session storage is involved and
//! rotating the secret invalidates every outstanding flag at once. The flag
//! name selects the cookie, not the digest input, so the same token value is
//! valid for any flag a holder of the secret chooses to set.

use crate::store::Secret;
use axum_extra::extract::cookie::CookieJar;

/// Cookie name prefix for all flags.
pub const FLAG_COOKIE_PREFIX: &str = "bg_debug_";

/// Client-side lifetime of a flag cookie, in seconds.
pub const FLAG_TTL_SECS: u64 = 3600;

/// Known debug flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionFlag {
    /// Show the host application's error log on the rescue page.
    Log,
}

impl SessionFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Log => "log",
        }
    }

    /// Parse a toggle directive. Unknown names are not flags.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "log" => Some(Self::Log),
            _ => None,
        }
    }

    pub fn cookie_name(&self) -> String {
        format!("{FLAG_COOKIE_PREFIX}{}", self.as_str())
    }
}

/// The token value a valid flag cookie must carry for the current secret.
pub fn token(secret: &Secret) -> String {
    blake3::hash(secret.reveal().as_bytes())
        .to_hex()
        .to_string()
}

/// Whether `presented` is the valid token for the current secret.
///
/// Comparison goes through `blake3::Hash` equality, which is constant-time.
pub fn matches_token(presented: &str, secret: &Secret) -> bool {
    match blake3::Hash::from_hex(presented) {
        Ok(hash) => hash == blake3::hash(secret.reveal().as_bytes()),
        Err(_) => false,
    }
}

/// Whether the jar carries a currently-valid cookie for `flag`.
pub fn is_set(flag: SessionFlag, jar: &CookieJar, secret: &Secret) -> bool {
    jar.get(&flag.cookie_name())
        .map(|cookie| matches_token(cookie.value(), secret))
        .unwrap_or(false)
}

/// `Set-Cookie` header flipping `flag` to the opposite of its current
/// state. Returns the header value and whether the flag is set afterwards.
pub fn toggle_cookie(flag: SessionFlag, jar: &CookieJar, secret: &Secret) -> (String, bool) {
    if is_set(flag, jar, secret) {
        (clear_cookie(flag), false)
    } else {
        (set_cookie(flag, &token(secret)), true)
    }
}

/// `Set-Cookie` value establishing `flag` for the whole site for one hour.
pub fn set_cookie(flag: SessionFlag, token: &str) -> String {
    format!(
        "{}={token}; Max-Age={FLAG_TTL_SECS}; Path=/",
        flag.cookie_name()
    )
}

/// `Set-Cookie` value clearing `flag` immediately.
pub fn clear_cookie(flag: SessionFlag) -> String {
    format!("{}=; Max-Age=0; Path=/", flag.cookie_name())
}
