//! Handling for resolved secret values
//!
//! Values leave a provider as [`SecureString`], whose buffer is wiped when it
//! is dropped and which never prints its contents. Text produced by backend
//! tools goes through [`sanitize_error`] before it can reach an error message.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use zeroize::Zeroizing;

/// A resolved secret value
///
/// `Debug` shows only the byte length and `Display` a fixed placeholder, so a
/// value that slips into a log line or error stays hidden.
#[derive(Clone, PartialEq, Eq)]
pub struct SecureString(Zeroizing<String>);

impl SecureString {
    pub fn new(value: String) -> Self {
        Self(Zeroizing::new(value))
    }

    /// Borrow the plaintext
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Hand the plaintext to a caller that must own it, e.g. a JSON writer
    ///
    /// The returned `String` is no longer wiped on drop.
    pub fn into_string(mut self) -> String {
        std::mem::take(&mut *self.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for SecureString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecureString {
    fn from(value: &str) -> Self {
        Self::new(value.to_owned())
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureString([REDACTED {} bytes])", self.len())
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

static REDACTIONS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        // Tokens and keys
        (r"(?i)token[=:]\s*([^\s]+)", "token=[REDACTED]"),
        (r"(?i)password[=:]\s*([^\s]+)", "password=[REDACTED]"),
        (r"(?i)secret[=:]\s*([^\s]+)", "secret=[REDACTED]"),
        (r"(?i)key[=:]\s*([^\s]+)", "key=[REDACTED]"),
        // Remaining assignments
        (r"=([^\s\[]+)", "=[REDACTED]"),
        // Base64-looking strings (48+ chars of base64 characters)
        (r"[A-Za-z0-9+/]{48,}={0,2}", "[REDACTED_BASE64]"),
    ]
    .into_iter()
    .filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, replacement)))
    .collect()
});

/// Redact credential-shaped fragments from backend tool output
pub fn sanitize_error(error: &str) -> String {
    let mut sanitized = error.to_string();
    for (re, replacement) in REDACTIONS.iter() {
        sanitized = re.replace_all(&sanitized, *replacement).to_string();
    }
    sanitized
}
