//! Content-derived identities for fixtures and test scopes.
//!
//! Both identities use the same short hash: SHA-1 over the UTF-8 input,
//! base64 with the URL-safe alphabet (`+` becomes `-`, `/` becomes `_`),
//! cut to [`FINGERPRINT_LEN`] characters. The result is stable across
//! machines and safe to use as a path segment.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fmt;

pub const FINGERPRINT_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Directory-safe identifier of a test scope: `<area>_<hash>`.
///
/// `area` is the part of the test name before the first `_`, kept so the
/// fixture tree stays browsable; the hash of the full name keeps the path
/// short while separating tests that share an area.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeId(String);

impl ScopeId {
    pub fn from_test_name(test_name: &str) -> Self {
        let area = test_name.split('_').next().unwrap_or_default();
        Self(format!(
            "{}_{}",
            sanitize_segment(area),
            hash_fingerprint(test_name)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn hash_fingerprint(input: &str) -> String {
    let digest = Sha1::digest(input.as_bytes());
    let mut encoded = URL_SAFE.encode(digest);
    // 20 digest bytes encode to 28 chars, so the cut never lands on padding.
    encoded.truncate(FINGERPRINT_LEN);
    encoded
}

/// Identity of one request: `"<method> <metadata> <body>"`, hashed.
pub fn fingerprint(method: &str, metadata: &str, body: &str) -> Fingerprint {
    let hash_input = format!("{method} {metadata} {}", unify_line_endings(body));
    Fingerprint(hash_fingerprint(&hash_input))
}

/// Drops raw carriage returns and their JSON-escaped form (`\r`) so bodies
/// produced on different platforms hash the same.
pub fn unify_line_endings(body: &str) -> String {
    body.replace('\r', "").replace("\\r", "")
}

fn sanitize_segment(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '-'
            }
        })
        .collect()
}
