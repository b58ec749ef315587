//! Identifiers and versioning for externally mirrored carts.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a cart held by the external commerce service.
///
/// The external service assigns these as opaque strings (UUID-shaped in
/// practice); nothing in OpenKart parses their contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalCartId(String);

impl ExternalCartId {
    /// Wrap a raw cart id string.
    #[must_use]
    pub const fn new(id: String) -> Self {
        Self(id)
    }

    /// Returns the cart id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the id and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ExternalCartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExternalCartId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for ExternalCartId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Optimistic-concurrency token carried by every external cart record.
///
/// Every mutating call against the external service must supply the version
/// read in the immediately preceding fetch; the service assigns the next
/// version on success and rejects stale ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartVersion(u64);

impl CartVersion {
    /// Wrap a raw version number.
    #[must_use]
    pub const fn new(version: u64) -> Self {
        Self(version)
    }

    /// Get the underlying version number.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CartVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CartVersion {
    fn from(version: u64) -> Self {
        Self(version)
    }
}
