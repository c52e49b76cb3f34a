//! Route policy: path prefix to minimum role.

use super::role::Role;
use serde::{Deserialize, Serialize};

/// One row of the route policy table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyEntry {
    pub prefix: String,
    pub role: Role,
}

impl PolicyEntry {
    pub fn new(prefix: impl Into<String>, role: Role) -> Self {
        Self {
            prefix: prefix.into(),
            role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("policy prefix '{0}' must start with '/'")]
    NotAbsolute(String),

    #[error("policy prefix '{0}' is listed more than once")]
    Duplicate(String),

    #[error("policy prefixes '{shorter}' and '{longer}' overlap")]
    Overlap { shorter: String, longer: String },
}

/// Validated route policy table.
///
/// Entries are matched with plain `starts_with` against the request path.
/// Construction rejects any pair of prefixes where one starts with the
/// other, so at most one entry can ever match a given path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePolicy {
    entries: Vec<PolicyEntry>,
}

impl RoutePolicy {
    pub fn new(entries: Vec<PolicyEntry>) -> Result<Self, PolicyError> {
        for (i, entry) in entries.iter().enumerate() {
            if !entry.prefix.starts_with('/') {
                return Err(PolicyError::NotAbsolute(entry.prefix.clone()));
            }

            for other in &entries[i + 1..] {
                if entry.prefix == other.prefix {
                    return Err(PolicyError::Duplicate(entry.prefix.clone()));
                }
                if other.prefix.starts_with(&entry.prefix) {
                    return Err(PolicyError::Overlap {
                        shorter: entry.prefix.clone(),
                        longer: other.prefix.clone(),
                    });
                }
                if entry.prefix.starts_with(&other.prefix) {
                    return Err(PolicyError::Overlap {
                        shorter: other.prefix.clone(),
                        longer: entry.prefix.clone(),
                    });
                }
            }
        }

        Ok(Self { entries })
    }

    /// The entry governing `path`, if any.
    pub fn lookup(&self, path: &str) -> Option<&PolicyEntry> {
        self.entries
            .iter()
            .find(|entry| path.starts_with(&entry.prefix))
    }

    /// Minimum role for `path`; `None` means any signed-in user may enter.
    pub fn required_role(&self, path: &str) -> Option<Role> {
        self.lookup(path).map(|entry| entry.role)
    }

    pub fn entries(&self) -> &[PolicyEntry] {
        &self.entries
    }
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self {
            entries: vec![
                PolicyEntry::new("/dashboard", Role::Viewer),
                PolicyEntry::new("/products", Role::Staff),
                PolicyEntry::new("/sales", Role::Staff),
                PolicyEntry::new("/deliveries", Role::Staff),
                PolicyEntry::new("/inventory", Role::Staff),
                PolicyEntry::new("/settings", Role::Admin),
            ],
        }
    }
}
