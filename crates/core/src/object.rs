//! Remote object model
//!
//! A remote object is addressed by its category and an opaque name. Each
//! category carries a name grammar; names that do not match it are not
//! objects of that category and are skipped when listing.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Name of the marker object whose presence denotes an existing repository
pub const REPO_MARKER_NAME: &str = "syncany";

/// The closed set of object kinds stored in a repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteObjectCategory {
    /// The repository marker object at the root
    Repository,
    /// Content-addressed chunk containers
    Multichunk,
    /// Per-client database versions
    #[serde(rename = "database")]
    DatabaseSegment,
    /// Cleanup records, stored alongside database segments
    Cleanup,
    /// Lock-like action markers
    Action,
    /// Transaction manifests used for atomic promotion
    Transaction,
    /// Staged uploads awaiting promotion
    Temporary,
    /// Any other object at the root
    Generic,
}

impl RemoteObjectCategory {
    pub const ALL: [RemoteObjectCategory; 8] = [
        RemoteObjectCategory::Repository,
        RemoteObjectCategory::Multichunk,
        RemoteObjectCategory::DatabaseSegment,
        RemoteObjectCategory::Cleanup,
        RemoteObjectCategory::Action,
        RemoteObjectCategory::Transaction,
        RemoteObjectCategory::Temporary,
        RemoteObjectCategory::Generic,
    ];

    /// Check a candidate name against this category's grammar
    pub fn accepts(self, name: &str) -> bool {
        if name.is_empty() || name.contains('/') {
            return false;
        }

        match self {
            RemoteObjectCategory::Repository => name == REPO_MARKER_NAME,
            RemoteObjectCategory::Multichunk => name
                .strip_prefix("multichunk-")
                .is_some_and(is_lower_hex),
            RemoteObjectCategory::DatabaseSegment => name
                .strip_prefix("db-")
                .and_then(|rest| rest.rsplit_once('-'))
                .is_some_and(|(client, version)| {
                    !client.is_empty() && !client.contains('-') && is_digits(version)
                }),
            RemoteObjectCategory::Cleanup => name.strip_prefix("cleanup-").is_some_and(is_digits),
            RemoteObjectCategory::Action => name.strip_prefix("action-").is_some_and(|rest| {
                let parts: Vec<&str> = rest.splitn(3, '-').collect();
                match parts.as_slice() {
                    [kind, machine, timestamp] => {
                        !kind.is_empty()
                            && kind.bytes().all(|b| b.is_ascii_lowercase())
                            && !machine.is_empty()
                            && !machine.contains('-')
                            && is_digits(timestamp)
                    }
                    _ => false,
                }
            }),
            RemoteObjectCategory::Transaction => name
                .strip_prefix("transaction-")
                .is_some_and(is_lower_alnum),
            RemoteObjectCategory::Temporary => {
                name.strip_prefix("temp-").is_some_and(is_lower_alnum)
            }
            RemoteObjectCategory::Generic => true,
        }
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_lower_hex(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn is_lower_alnum(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
}

impl std::fmt::Display for RemoteObjectCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RemoteObjectCategory::Repository => "repository",
            RemoteObjectCategory::Multichunk => "multichunk",
            RemoteObjectCategory::DatabaseSegment => "database",
            RemoteObjectCategory::Cleanup => "cleanup",
            RemoteObjectCategory::Action => "action",
            RemoteObjectCategory::Transaction => "transaction",
            RemoteObjectCategory::Temporary => "temporary",
            RemoteObjectCategory::Generic => "generic",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for RemoteObjectCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "repository" | "repo" => Ok(RemoteObjectCategory::Repository),
            "multichunk" => Ok(RemoteObjectCategory::Multichunk),
            "database" | "db" => Ok(RemoteObjectCategory::DatabaseSegment),
            "cleanup" => Ok(RemoteObjectCategory::Cleanup),
            "action" => Ok(RemoteObjectCategory::Action),
            "transaction" => Ok(RemoteObjectCategory::Transaction),
            "temporary" | "temp" => Ok(RemoteObjectCategory::Temporary),
            "generic" => Ok(RemoteObjectCategory::Generic),
            _ => Err(format!("Invalid object category: {s}")),
        }
    }
}

/// A (category, name) pair identifying one addressable remote object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteObject {
    category: RemoteObjectCategory,
    name: String,
}

impl RemoteObject {
    /// Create a reference, validating the name against the category grammar
    pub fn new(category: RemoteObjectCategory, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if !category.accepts(&name) {
            return Err(Error::InvalidObjectName(format!(
                "'{name}' is not a valid {category} object name"
            )));
        }

        Ok(Self { category, name })
    }

    /// The repository marker object
    pub fn repo_marker() -> Self {
        Self {
            category: RemoteObjectCategory::Repository,
            name: REPO_MARKER_NAME.to_string(),
        }
    }

    /// A multichunk object for the given lowercase hex identifier
    pub fn multichunk(id: &str) -> Result<Self> {
        Self::new(RemoteObjectCategory::Multichunk, format!("multichunk-{id}"))
    }

    /// A database segment for a client at a version
    pub fn database(client: &str, version: u64) -> Result<Self> {
        Self::new(
            RemoteObjectCategory::DatabaseSegment,
            format!("db-{client}-{version:010}"),
        )
    }

    pub fn category(&self) -> RemoteObjectCategory {
        self.category
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for RemoteObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.category, self.name)
    }
}
