//! Repository layout and remote path routing
//!
//! Maps object categories onto the fixed folder structure below the
//! repository root. `RepositoryFolder::ALL` is the only place folder names
//! are defined: path resolution and repository initialization both read it.

use url::Url;

use crate::error::{Error, Result};
use crate::object::{RemoteObject, RemoteObjectCategory};

/// A fixed folder directly below the repository root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryFolder {
    Multichunks,
    Databases,
    Actions,
    Transactions,
    Temporary,
}

impl RepositoryFolder {
    pub const ALL: [RepositoryFolder; 5] = [
        RepositoryFolder::Multichunks,
        RepositoryFolder::Databases,
        RepositoryFolder::Actions,
        RepositoryFolder::Transactions,
        RepositoryFolder::Temporary,
    ];

    /// Folder name, always slash-terminated
    pub const fn dir_name(self) -> &'static str {
        match self {
            RepositoryFolder::Multichunks => "multichunks/",
            RepositoryFolder::Databases => "databases/",
            RepositoryFolder::Actions => "actions/",
            RepositoryFolder::Transactions => "transactions/",
            RepositoryFolder::Temporary => "temporary/",
        }
    }
}

impl RemoteObjectCategory {
    /// The folder holding objects of this category; `None` means the root
    pub const fn folder(self) -> Option<RepositoryFolder> {
        match self {
            RemoteObjectCategory::Multichunk => Some(RepositoryFolder::Multichunks),
            RemoteObjectCategory::DatabaseSegment | RemoteObjectCategory::Cleanup => {
                Some(RepositoryFolder::Databases)
            }
            RemoteObjectCategory::Action => Some(RepositoryFolder::Actions),
            RemoteObjectCategory::Transaction => Some(RepositoryFolder::Transactions),
            RemoteObjectCategory::Temporary => Some(RepositoryFolder::Temporary),
            RemoteObjectCategory::Repository | RemoteObjectCategory::Generic => None,
        }
    }
}

/// Absolute URLs of the repository root and its folders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLayout {
    root: String,
}

impl RepositoryLayout {
    /// Build the layout for a repository root URL.
    ///
    /// A trailing slash is optional in `root_url`; the stored root always has one.
    pub fn new(root_url: &str) -> Result<Self> {
        let trimmed = root_url.trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(Error::ConfigInvalid(
                "repository URL cannot be empty".to_string(),
            ));
        }

        Url::parse(trimmed)
            .map_err(|e| Error::ConfigInvalid(format!("invalid repository URL '{root_url}': {e}")))?;

        Ok(Self {
            root: format!("{trimmed}/"),
        })
    }

    /// Repository root URL (slash-terminated)
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Absolute URL of a fixed folder (slash-terminated)
    pub fn folder_url(&self, folder: RepositoryFolder) -> String {
        format!("{}{}", self.root, folder.dir_name())
    }

    /// URLs of every fixed folder, in table order
    pub fn folder_urls(&self) -> Vec<String> {
        RepositoryFolder::ALL
            .iter()
            .map(|folder| self.folder_url(*folder))
            .collect()
    }

    /// Path prefix under which objects of `category` live
    pub fn resolve_path(&self, category: RemoteObjectCategory) -> String {
        match category.folder() {
            Some(folder) => self.folder_url(folder),
            None => self.root.clone(),
        }
    }

    /// Absolute URL of one object
    pub fn resolve_url(&self, object: &RemoteObject) -> String {
        let name = urlencoding::encode(object.name());
        format!("{}{}", self.resolve_path(object.category()), name)
    }

    /// URL of an ad hoc object at the root, used by write probes
    pub fn root_object_url(&self, name: &str) -> String {
        format!("{}{}", self.root, urlencoding::encode(name))
    }

    /// Whether a listing entry is the listed folder itself.
    ///
    /// WebDAV servers report hrefs either as absolute paths or as full URLs,
    /// with or without a trailing slash and with arbitrary percent-encoding.
    /// Both sides are resolved against the folder URL and compared by their
    /// decoded path.
    pub fn is_folder_self(folder_url: &str, href: &str) -> bool {
        let Ok(folder) = Url::parse(folder_url) else {
            return false;
        };
        let Ok(entry) = folder.join(href) else {
            return false;
        };

        normalized_path(&folder) == normalized_path(&entry)
    }
}

fn normalized_path(url: &Url) -> String {
    let path = url.path().trim_end_matches('/');
    urlencoding::decode(path)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| path.to_string())
}
