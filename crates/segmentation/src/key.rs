//! Canonical segment names.
//!
//! `"VIP"`, `" vip "`, and the symbol form `":vip"` all name the same entry.

use audience_core::{AudienceError, AudienceResult};
use std::borrow::Borrow;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentKey(String);

impl SegmentKey {
    /// Normalize a raw name: trim, drop a leading `:`, lowercase.
    pub fn parse(raw: impl AsRef<str>) -> AudienceResult<Self> {
        let raw = raw.as_ref();
        let trimmed = raw.trim();
        let bare = trimmed.strip_prefix(':').unwrap_or(trimmed).trim();
        if bare.is_empty() {
            return Err(AudienceError::InvalidName(raw.to_string()));
        }
        Ok(Self(bare.to_lowercase()))
    }

    /// Keys for the built-in names, which are already canonical.
    pub(crate) fn builtin(name: &'static str) -> Self {
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SegmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for SegmentKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SegmentKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
