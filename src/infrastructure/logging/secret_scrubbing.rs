use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};

// Billing URLs carry the tenant API key as the last path segment.
static BILLING_PATH_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/(updateTokenAI|getTokenBalance)/[^/\s?]+").expect("valid regex")
});
static API_KEY_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(api-?key)([\x22']?\s*[:=]\s*[\x22']?)([A-Za-z0-9_\-\.]{8,})").expect("valid regex")
});
static BEARER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Bearer\s+[A-Za-z0-9_\-\.]+").expect("valid regex")
});
static OPENAI_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"sk-[A-Za-z0-9_\-]{20,}").expect("valid regex")
});

/// Redacts credentials from messages before they are logged or surfaced.
#[derive(Clone, Copy, Default)]
pub struct SecretScrubber;

impl SecretScrubber {
    pub const fn new() -> Self {
        Self
    }

    /// Scrub a message of sensitive data
    pub fn scrub_message(&self, message: &str) -> String {
        let scrubbed = BILLING_PATH_KEY.replace_all(message, "/$1/[REDACTED]");
        let scrubbed = API_KEY_HEADER.replace_all(&scrubbed, |caps: &Captures| {
            format!("{}{}[REDACTED]", &caps[1], &caps[2])
        });
        let scrubbed = BEARER.replace_all(&scrubbed, "Bearer [TOKEN_REDACTED]");
        OPENAI_KEY
            .replace_all(&scrubbed, "[API_KEY_REDACTED]")
            .into_owned()
    }
}

impl fmt::Debug for SecretScrubber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretScrubber").finish()
    }
}

/// Convenience wrapper over [`SecretScrubber::scrub_message`].
pub fn scrub(message: &str) -> String {
    SecretScrubber::new().scrub_message(message)
}
