//! Authorization token for the API backend.
//!
//! The token is read from a plain text file and sent verbatim as the
//! `Authorization` header value. A missing file is not fatal: requests go
//! out with an empty header and the server decides.

use std::fmt;
use std::path::Path;

/// The Authorization header value.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wrap a header value, trimming surrounding whitespace.
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(value.as_ref().trim().to_string())
    }

    /// An empty header value.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Read the token from `path`.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let token = Self::new(contents);
        tracing::debug!(path = %path.display(), empty = token.is_empty(), "loaded auth token");
        Ok(token)
    }

    /// Read the token from `path`, falling back to an empty one.
    ///
    /// Returns whether the file was found alongside the token.
    pub fn load_or_empty(path: &Path) -> (Self, bool) {
        match Self::load(path) {
            Ok(token) => (token, true),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "auth token not loaded");
                (Self::empty(), false)
            }
        }
    }

    /// Check if there is no token.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw header value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("AuthToken(<empty>)")
        } else {
            f.write_str("AuthToken(<redacted>)")
        }
    }
}
