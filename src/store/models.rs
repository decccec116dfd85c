// Keyward — Store data models
//
// `Entry` lives only inside the engine worker. `EntryInfo` is the projection handed
// out by the listing operations and never carries the value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A stored value together with the identity that created it.
#[derive(Clone, PartialEq, Eq)]
pub struct Entry {
    pub value: String,
    /// Set once on first write, never reassigned.
    pub owner: String,
}

impl Entry {
    pub fn new(value: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            owner: owner.into(),
        }
    }

    /// Whether `identity` is allowed to mutate this entry.
    pub fn is_owned_by(&self, identity: &str) -> bool {
        self.owner == identity
    }
}

/// Values can be arbitrary user data, keep them out of debug logs.
impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("value", &"[REDACTED]")
            .field("owner", &self.owner)
            .finish()
    }
}

/// Ownership metadata for a single key, used for listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryInfo {
    pub key: String,
    pub owner: String,
}

impl EntryInfo {
    pub fn new(key: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            owner: owner.into(),
        }
    }
}

impl fmt::Display for EntryInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (owner: {})", self.key, self.owner)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_debug_redacts_value() {
        let entry = Entry::new("top-secret-value", "user_a");
        let debug_output = format!("{:?}", entry);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(
            !debug_output.contains("top-secret-value"),
            "Debug output must never contain the stored value"
        );
        assert!(debug_output.contains("user_a"));
    }

    #[test]
    fn test_entry_ownership_check() {
        let entry = Entry::new("v", "user_a");
        assert!(entry.is_owned_by("user_a"));
        assert!(!entry.is_owned_by("user_b"));
        assert!(!entry.is_owned_by(""));
    }

    #[test]
    fn test_entry_info_json_shape() {
        let info = EntryInfo::new("abc", "user_a");
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json, serde_json::json!({"key": "abc", "owner": "user_a"}));
    }

    #[test]
    fn test_entry_info_display() {
        let info = EntryInfo::new("abc", "user_a");
        assert_eq!(info.to_string(), "abc (owner: user_a)");
    }
}
