//! Lazily established connection state
//!
//! Nothing touches the network until the first operation asks for a client.
//! Disconnecting drops the client and persists any certificate the user
//! trusted in the meantime.

use std::sync::Arc;

use davsync_core::{Error, Result, TrustStore, UserInteractionListener};

use crate::client::DavClient;
use crate::settings::WebdavSettings;
use crate::tls::TofuVerifier;

#[derive(Debug, Default)]
enum ConnectionState {
    #[default]
    Disconnected,
    Connected(DavClient),
}

/// Owns the settings and at most one [`DavClient`]
#[derive(Debug)]
pub struct ConnectionManager {
    settings: WebdavSettings,
    trust_store: Arc<TrustStore>,
    listener: Option<Arc<dyn UserInteractionListener>>,
    state: ConnectionState,
}

impl ConnectionManager {
    pub fn new(settings: WebdavSettings, trust_store: Arc<TrustStore>) -> Self {
        Self {
            settings,
            trust_store,
            listener: None,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn set_listener(&mut self, listener: Arc<dyn UserInteractionListener>) {
        self.listener = Some(listener);
    }

    pub fn settings(&self) -> &WebdavSettings {
        &self.settings
    }

    pub fn trust_store(&self) -> &Arc<TrustStore> {
        &self.trust_store
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected(_))
    }

    /// Return the client, building it on first use
    pub fn ensure_connected(&mut self) -> Result<&DavClient> {
        if let ConnectionState::Disconnected = self.state {
            tracing::debug!(settings = %self.settings, "WebDAV: Connect called. Creating client");

            let verifier = self.settings.is_secure().then(|| {
                Arc::new(TofuVerifier::new(
                    self.trust_store.clone(),
                    self.listener.clone(),
                ))
            });
            let client = DavClient::new(&self.settings, verifier)
                .map_err(|e| e.into_storage_error(Error::ConfigInvalid))?;
            self.state = ConnectionState::Connected(client);
        }

        match &self.state {
            ConnectionState::Connected(client) => Ok(client),
            ConnectionState::Disconnected => Err(Error::General(
                "connection state lost after connect".to_string(),
            )),
        }
    }

    /// Drop the client and flush the trust store.
    ///
    /// Flushing happens whether or not a client existed, so certificates
    /// trusted through a failed operation are not lost.
    pub fn disconnect(&mut self) -> Result<()> {
        if self.is_connected() {
            tracing::debug!("WebDAV: Disconnecting");
        }
        self.state = ConnectionState::Disconnected;

        if self.trust_store.flush_if_dirty()? {
            tracing::info!("Stored newly trusted certificates");
        }
        Ok(())
    }
}
