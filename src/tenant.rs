//! Tenant keys.
//!
//! Each tenant owns exactly one tree; keys are used to look snapshots up in a
//! [`TreeStore`](crate::storage::TreeStore) and as file names by the file
//! store, so they are validated up front.

use crate::error::{ClusterError, Result};
use std::fmt;

/// Validated identifier of the scope owning one spatial index.
///
/// # Examples
///
/// ```rust
/// use geocluster::TenantKey;
///
/// let tenant = TenantKey::parse("brand-8f3a").unwrap();
/// assert_eq!(tenant.as_str(), "brand-8f3a");
///
/// assert!(TenantKey::parse("").is_err());
/// assert!(TenantKey::parse("../etc").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TenantKey(String);

impl TenantKey {
    /// Longest accepted key, in bytes.
    pub const MAX_LEN: usize = 255;

    /// Parses and validates a tenant key.
    ///
    /// # Errors
    ///
    /// Returns `ClusterError::InvalidInput` if the key is empty, longer than
    /// 255 bytes, or contains NUL bytes, path separators or `..`.
    pub fn parse<S: Into<String>>(key: S) -> Result<Self> {
        let key = key.into();

        if key.is_empty() {
            return Err(ClusterError::InvalidInput("Tenant key cannot be empty".into()));
        }

        if key.len() > Self::MAX_LEN {
            return Err(ClusterError::InvalidInput(format!(
                "Tenant key cannot exceed {} bytes",
                Self::MAX_LEN
            )));
        }

        if key.contains('\0') {
            return Err(ClusterError::InvalidInput(
                "Tenant key cannot contain null bytes".into(),
            ));
        }

        if key.contains('/') || key.contains('\\') || key.contains("..") {
            return Err(ClusterError::InvalidInput(format!(
                "Tenant key '{}' cannot contain path separators",
                key
            )));
        }

        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TenantKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<TenantKey> for String {
    fn from(key: TenantKey) -> Self {
        key.0
    }
}

impl fmt::Display for TenantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
