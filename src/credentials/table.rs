// Keyward — Credential Table
//
// The fixed username → encoded digest map, loaded once at startup and never
// mutated afterwards. Shared read-only across request handlers.

use std::collections::HashMap;
use std::fmt;

/// Immutable set of credential records.
#[derive(Clone, Default)]
pub struct CredentialTable {
    records: HashMap<String, String>,
}

impl CredentialTable {
    pub fn new(records: HashMap<String, String>) -> Self {
        Self { records }
    }

    /// Encoded digest for `username`, if the user is known.
    pub fn digest_for(&self, username: &str) -> Option<&str> {
        self.records.get(username).map(String::as_str)
    }

    pub fn contains(&self, username: &str) -> bool {
        self.records.contains_key(username)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Known usernames, sorted.
    pub fn usernames(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.records.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl FromIterator<(String, String)> for CredentialTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Lists usernames only; digests stay out of logs.
impl fmt::Debug for CredentialTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialTable")
            .field("users", &self.usernames())
            .finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
