//! Process-wide connection defaults.

use std::sync::OnceLock;

/// Environment variable overriding the default server endpoint.
pub const ENDPOINT_ENV: &str = "PARLOR_WS_URL";

const FALLBACK_ENDPOINT: &str = "ws://127.0.0.1:8081";

static ENDPOINT: OnceLock<String> = OnceLock::new();

/// Default server endpoint: `PARLOR_WS_URL` when set, the built-in address
/// otherwise. Resolved once at first use.
pub fn default_endpoint() -> &'static str {
    ENDPOINT.get_or_init(|| {
        std::env::var(ENDPOINT_ENV).unwrap_or_else(|_| FALLBACK_ENDPOINT.to_string())
    })
}
