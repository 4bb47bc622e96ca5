//! WebDAV implementation of [`TransferManager`]
//!
//! Every operation follows the same shape: make sure the connection exists,
//! resolve the object's URL through the repository layout, issue the
//! request, then translate the transport error into the storage taxonomy.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use davsync_core::{
    Error, RemoteObject, RemoteObjectCategory, RepositoryLayout, Result, TransferManager,
    TrustStore, UserInteractionListener,
};
use bytes::Bytes;
use futures::StreamExt;
use reqwest::Body;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

use crate::client::DavClient;
use crate::connection::ConnectionManager;
use crate::error::DavError;
use crate::settings::WebdavSettings;

/// Name of the object written and removed again by the write probe
pub const WRITE_TEST_NAME: &str = "syncany-write-test";

/// Transfer manager for one repository on a WebDAV server
#[derive(Debug)]
pub struct WebdavTransferManager {
    layout: RepositoryLayout,
    connection: ConnectionManager,
}

impl WebdavTransferManager {
    /// Create a manager; no request is made until the first operation.
    pub fn new(settings: WebdavSettings, trust_store: Arc<TrustStore>) -> Result<Self> {
        let layout = RepositoryLayout::new(settings.url())?;
        Ok(Self {
            layout,
            connection: ConnectionManager::new(settings, trust_store),
        })
    }

    /// Ask `listener` before trusting an unknown server certificate
    pub fn with_interaction_listener(
        mut self,
        listener: Arc<dyn UserInteractionListener>,
    ) -> Self {
        self.connection.set_listener(listener);
        self
    }

    pub fn layout(&self) -> &RepositoryLayout {
        &self.layout
    }

    pub fn settings(&self) -> &WebdavSettings {
        self.connection.settings()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }
}

fn transfer_error(error: DavError) -> Error {
    error.into_storage_error(Error::TransferFailed)
}

/// Collapse a probe outcome into a boolean, re-raising trust failures
fn probe_outcome(
    probe: &'static str,
    outcome: std::result::Result<bool, DavError>,
) -> Result<bool> {
    match outcome {
        Ok(value) => Ok(value),
        Err(e) if e.is_trust_failure() => {
            tracing::error!(probe, error = %e, "TLS peer not verified");
            Err(transfer_error(e))
        }
        Err(e) => {
            tracing::warn!(probe, error = %e, "Probe failed");
            Ok(false)
        }
    }
}

async fn target_exists(
    client: &DavClient,
    layout: &RepositoryLayout,
) -> std::result::Result<bool, DavError> {
    // PROPFIND rather than HEAD: some servers forbid HEAD on collections
    match client.list(layout.root()).await {
        Ok(_) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl TransferManager for WebdavTransferManager {
    async fn connect(&mut self) -> Result<()> {
        self.connection.ensure_connected()?;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.connection.disconnect()
    }

    async fn init(&mut self, create_if_required: bool) -> Result<()> {
        let client = self.connection.ensure_connected()?;
        let layout = &self.layout;

        let exists = probe_outcome("target_exists", target_exists(client, layout).await)?;
        if !exists {
            if !create_if_required {
                return Err(Error::NotFound(format!(
                    "repository root {} does not exist",
                    layout.root()
                )));
            }
            tracing::info!(root = layout.root(), "WebDAV: Init called; creating repository root");
            client
                .create_directory(layout.root())
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "Cannot initialize WebDAV folder");
                    transfer_error(e)
                })?;
        }

        if create_if_required {
            tracing::info!("WebDAV: Creating repository folders");
            for folder_url in layout.folder_urls() {
                client.create_directory(&folder_url).await.map_err(|e| {
                    tracing::error!(folder = %folder_url, error = %e, "Cannot initialize WebDAV folder");
                    transfer_error(e)
                })?;
            }
        }

        Ok(())
    }

    async fn download(&mut self, object: &RemoteObject, local_path: &Path) -> Result<()> {
        let client = self.connection.ensure_connected()?;
        let url = self.layout.resolve_url(object);
        tracing::info!(%url, local = %local_path.display(), "WebDAV: Downloading");

        let response = client.get(&url).await.map_err(|e| {
            tracing::error!(%url, error = %e, "Error while downloading file from WebDAV");
            transfer_error(e)
        })?;

        let mut file = tokio::fs::File::create(local_path).await.map_err(|e| {
            Error::TransferFailed(format!("cannot create {}: {e}", local_path.display()))
        })?;

        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                tracing::error!(%url, error = %e, "Download interrupted");
                Error::TransferFailed(format!("reading {url}: {e}"))
            })?;
            file.write_all(&chunk).await.map_err(|e| {
                Error::TransferFailed(format!("writing {}: {e}", local_path.display()))
            })?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| {
            Error::TransferFailed(format!("writing {}: {e}", local_path.display()))
        })?;

        tracing::debug!(%url, bytes = written, "Download complete");
        Ok(())
    }

    async fn upload(&mut self, local_path: &Path, object: &RemoteObject) -> Result<()> {
        let client = self.connection.ensure_connected()?;
        let url = self.layout.resolve_url(object);
        tracing::info!(local = %local_path.display(), %url, "WebDAV: Uploading");

        let file = tokio::fs::File::open(local_path).await.map_err(|e| {
            Error::TransferFailed(format!("cannot read {}: {e}", local_path.display()))
        })?;
        let size = file
            .metadata()
            .await
            .map_err(|e| {
                Error::TransferFailed(format!("cannot read {}: {e}", local_path.display()))
            })?
            .len();
        let body = Body::wrap_stream(ReaderStream::new(file));

        client.put(&url, body, size).await.map_err(|e| {
            tracing::error!(%url, error = %e, "Error while uploading file to WebDAV");
            transfer_error(e)
        })?;

        tracing::debug!(%url, bytes = size, "Upload complete");
        Ok(())
    }

    async fn delete(&mut self, object: &RemoteObject) -> Result<bool> {
        let client = self.connection.ensure_connected()?;
        let url = self.layout.resolve_url(object);
        tracing::debug!(%url, "WebDAV: Deleting");

        match client.delete(&url).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_not_found() => {
                tracing::debug!(%url, "Already absent");
                Ok(true)
            }
            Err(e) if e.status().is_some() => {
                tracing::warn!(%url, error = %e, "Server refused delete");
                Ok(false)
            }
            Err(e) => {
                tracing::error!(%url, error = %e, "Error while deleting file from WebDAV");
                Err(transfer_error(e))
            }
        }
    }

    async fn move_object(&mut self, source: &RemoteObject, target: &RemoteObject) -> Result<()> {
        let client = self.connection.ensure_connected()?;
        let source_url = self.layout.resolve_url(source);
        let target_url = self.layout.resolve_url(target);
        tracing::debug!(source = %source_url, target = %target_url, "WebDAV: Moving");

        client.move_to(&source_url, &target_url).await.map_err(|e| {
            tracing::error!(source = %source_url, target = %target_url, error = %e, "Unable to move");
            e.into_storage_error(|msg| {
                Error::MoveFailed(format!("unable to move {source_url} to {target_url}: {msg}"))
            })
        })
    }

    async fn list(
        &mut self,
        category: RemoteObjectCategory,
    ) -> Result<BTreeMap<String, RemoteObject>> {
        let client = self.connection.ensure_connected()?;
        let folder_url = self.layout.resolve_path(category);
        tracing::info!(url = %folder_url, %category, "WebDAV: Listing objects");

        let resources = client.list(&folder_url).await.map_err(|e| {
            tracing::error!(url = %folder_url, error = %e, "Unable to list WebDAV directory");
            transfer_error(e)
        })?;

        let mut objects = BTreeMap::new();
        for resource in resources {
            if RepositoryLayout::is_folder_self(&folder_url, &resource.href) {
                continue;
            }
            if resource.is_collection {
                tracing::debug!(href = %resource.href, "Skipping collection");
                continue;
            }

            let name = resource.name();
            match RemoteObject::new(category, name.clone()) {
                Ok(object) => {
                    tracing::debug!(href = %resource.href, "Matching WebDAV resource");
                    objects.insert(name, object);
                }
                Err(_) => {
                    tracing::debug!(%name, %category, "Ignoring entry with foreign name");
                }
            }
        }

        Ok(objects)
    }

    async fn test_target_exists(&mut self) -> Result<bool> {
        let client = self.connection.ensure_connected()?;
        let exists = probe_outcome("target_exists", target_exists(client, &self.layout).await)?;
        tracing::info!(exists, "testTargetExists");
        Ok(exists)
    }

    async fn test_target_can_write(&mut self) -> Result<bool> {
        let client = self.connection.ensure_connected()?;
        let url = self.layout.root_object_url(WRITE_TEST_NAME);

        let outcome = async {
            client.put(&url, Bytes::from_static(&[0x01]), 1).await?;
            client.delete(&url).await?;
            Ok::<_, DavError>(true)
        }
        .await;

        let can_write = probe_outcome("target_can_write", outcome)?;
        tracing::info!(can_write, "testTargetCanWrite");
        Ok(can_write)
    }

    async fn test_target_can_create(&mut self) -> Result<bool> {
        let client = self.connection.ensure_connected()?;
        let layout = &self.layout;

        let outcome = async {
            if target_exists(client, layout).await? {
                tracing::debug!("Target already exists, so it counts as creatable");
                return Ok(true);
            }
            client.create_directory(layout.root()).await?;
            client.delete(layout.root()).await?;
            Ok::<_, DavError>(true)
        }
        .await;

        let can_create = probe_outcome("target_can_create", outcome)?;
        tracing::info!(can_create, "testTargetCanCreate");
        Ok(can_create)
    }

    async fn test_repo_file_exists(&mut self) -> Result<bool> {
        let client = self.connection.ensure_connected()?;
        let url = self.layout.resolve_url(&RemoteObject::repo_marker());

        let exists = probe_outcome("repo_file_exists", client.exists(&url).await)?;
        tracing::info!(exists, "testRepoFileExists");
        Ok(exists)
    }
}
