//! TransferManager trait definition
//!
//! This trait is implemented by each storage backend. The synchronization
//! engine drives one instance at a time per repository and serializes its
//! calls; implementations hold at most one logical connection.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::object::{RemoteObject, RemoteObjectCategory};

/// Outcome of [`TransferManager::test`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StorageTestResult {
    pub target_exists: bool,
    pub target_can_write: bool,
    pub target_can_create: bool,
    pub repo_file_exists: bool,
}

/// Object-level operations on a remote repository
///
/// Every operation except `disconnect` establishes the connection first if
/// needed. Trust failures always surface as errors, including from the
/// boolean probes.
#[async_trait]
pub trait TransferManager: Send {
    /// Establish the connection; a no-op when already connected.
    ///
    /// This only prepares the client. No request is sent, so a TLS trust
    /// failure surfaces on the first operation that reaches the server.
    async fn connect(&mut self) -> Result<()>;

    /// Drop the connection and persist newly trusted certificates
    async fn disconnect(&mut self) -> Result<()>;

    /// Prepare the repository layout, creating it when `create_if_required`
    async fn init(&mut self, create_if_required: bool) -> Result<()>;

    /// Copy a remote object into `local_path`
    async fn download(&mut self, object: &RemoteObject, local_path: &Path) -> Result<()>;

    /// Push the contents of `local_path` to a remote object
    async fn upload(&mut self, local_path: &Path, object: &RemoteObject) -> Result<()>;

    /// Delete a remote object.
    ///
    /// Deleting a missing object succeeds. `Ok(false)` means the server
    /// refused the delete with some other status.
    async fn delete(&mut self, object: &RemoteObject) -> Result<bool>;

    /// Rename `source` to `target`
    async fn move_object(&mut self, source: &RemoteObject, target: &RemoteObject) -> Result<()>;

    /// Objects of `category`, keyed by name. Foreign entries are skipped.
    async fn list(
        &mut self,
        category: RemoteObjectCategory,
    ) -> Result<BTreeMap<String, RemoteObject>>;

    async fn test_target_exists(&mut self) -> Result<bool>;

    async fn test_target_can_write(&mut self) -> Result<bool>;

    async fn test_target_can_create(&mut self) -> Result<bool>;

    async fn test_repo_file_exists(&mut self) -> Result<bool>;

    /// Run all probes.
    ///
    /// An existing target counts as creatable; otherwise creation is only
    /// probed when `test_create_target` is set.
    async fn test(&mut self, test_create_target: bool) -> Result<StorageTestResult> {
        self.connect().await?;

        let target_exists = self.test_target_exists().await?;
        let target_can_write = self.test_target_can_write().await?;
        let repo_file_exists = self.test_repo_file_exists().await?;
        let target_can_create = if target_exists {
            true
        } else if test_create_target {
            self.test_target_can_create().await?
        } else {
            false
        };

        let result = StorageTestResult {
            target_exists,
            target_can_write,
            target_can_create,
            repo_file_exists,
        };
        tracing::info!(?result, "Storage test finished");

        Ok(result)
    }
}
