//! Trust-on-first-use certificate store
//!
//! Certificates are pinned by alias (see [`Certificate::alias`]), not by CA.
//! The store is shared by every transfer manager in the process as an
//! `Arc<TrustStore>`; one mutex serializes lookups, confirmations and flushes.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::certificate::{Certificate, CertificateRejection};
use crate::error::{Error, Result};
use crate::interaction::UserInteractionListener;

const TRUST_STORE_VERSION: u32 = 1;

pub const CONFIRM_TITLE: &str = "Unknown SSL/TLS certificate";
pub const CONFIRM_QUESTION: &str = "Do you want to trust this certificate?";

/// Outcome of evaluating a presented certificate chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustDecision {
    /// Some certificate in the chain is pinned
    Trusted,
    /// The chain must not be used
    Rejected(CertificateRejection),
    /// Every certificate is valid but none is pinned; ask about the leaf
    NeedsConfirmation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TrustedCertificateEntry {
    alias: String,
    der: String,
    added: Timestamp,
}

#[derive(Debug, Serialize, Deserialize)]
struct TrustStoreFile {
    version: u32,
    #[serde(default)]
    certificates: Vec<TrustedCertificateEntry>,
}

#[derive(Debug, Default)]
struct TrustStoreState {
    entries: BTreeMap<String, TrustedCertificateEntry>,
    declined: HashSet<String>,
    dirty: bool,
}

/// Persistent set of trusted certificates
#[derive(Debug)]
pub struct TrustStore {
    path: Option<PathBuf>,
    state: Mutex<TrustStoreState>,
}

impl TrustStore {
    /// A store that is never written to disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: Mutex::new(TrustStoreState::default()),
        }
    }

    /// Load the store from `path`; a missing file yields an empty store
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut state = TrustStoreState::default();

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let file: TrustStoreFile = toml::from_str(&content)?;
            if file.version > TRUST_STORE_VERSION {
                return Err(Error::TrustStore(format!(
                    "unsupported trust store version {} in {}",
                    file.version,
                    path.display()
                )));
            }
            for entry in file.certificates {
                state.entries.insert(entry.alias.clone(), entry);
            }
            tracing::debug!(
                path = %path.display(),
                certificates = state.entries.len(),
                "Loaded trust store"
            );
        }

        Ok(Self {
            path: Some(path),
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> MutexGuard<'_, TrustStoreState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_trusted(&self, alias: &str) -> bool {
        self.lock().entries.contains_key(alias)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn aliases(&self) -> Vec<String> {
        self.lock().entries.keys().cloned().collect()
    }

    pub fn is_dirty(&self) -> bool {
        self.lock().dirty
    }

    /// Evaluate a chain, leaf first.
    ///
    /// Certificates are checked in order: an invalid one rejects the whole
    /// chain, a pinned one accepts it. If the end of the chain is reached the
    /// leaf needs a user decision.
    pub fn evaluate_chain(&self, chain: &[&[u8]], now: Timestamp) -> TrustDecision {
        if chain.is_empty() {
            return TrustDecision::Rejected(CertificateRejection::Malformed(
                "empty certificate chain".to_string(),
            ));
        }

        let state = self.lock();
        for der in chain {
            let certificate = match Certificate::from_der(der) {
                Ok(c) => c,
                Err(e) => {
                    return TrustDecision::Rejected(CertificateRejection::Malformed(e.to_string()));
                }
            };

            tracing::debug!(owner = certificate.owner(), "Checking certificate validity");
            if let Err(rejection) = certificate.check_validity(now) {
                tracing::debug!(owner = certificate.owner(), %rejection, "Certificate is not valid");
                return TrustDecision::Rejected(rejection);
            }

            if state.entries.contains_key(certificate.alias()) {
                tracing::debug!(alias = certificate.alias(), "Certificate found in trust store");
                return TrustDecision::Trusted;
            }
            tracing::debug!(alias = certificate.alias(), "Certificate not in trust store");
        }

        TrustDecision::NeedsConfirmation
    }

    /// Ask the user to trust `der` and pin it on approval.
    ///
    /// Returns `Ok(true)` once the certificate is trusted, immediately and
    /// without a prompt when it was pinned before. A decline, or a missing listener,
    /// fails with [`Error::TrustDenied`]; a declined fingerprint is not asked
    /// about again during this process.
    pub fn confirm_and_trust(
        &self,
        der: &[u8],
        listener: Option<&dyn UserInteractionListener>,
    ) -> Result<bool> {
        let certificate = Certificate::from_der(der)?;
        let alias = certificate.alias().to_string();

        let mut state = self.lock();
        if state.entries.contains_key(&alias) {
            return Ok(true);
        }
        if state.declined.contains(&alias) {
            return Err(Error::TrustDenied(format!(
                "certificate {} was already declined",
                certificate.sha256_fingerprint()
            )));
        }

        let Some(listener) = listener else {
            tracing::warn!(alias = %alias, "No interaction listener; cannot confirm certificate");
            return Err(Error::TrustDenied(
                "unknown certificate and no way to ask the user".to_string(),
            ));
        };

        if !listener.on_user_confirm(CONFIRM_TITLE, &certificate.summary(), CONFIRM_QUESTION) {
            tracing::info!(alias = %alias, "User does not trust certificate");
            state.declined.insert(alias);
            return Err(Error::TrustDenied(format!(
                "user declined certificate {}",
                certificate.sha256_fingerprint()
            )));
        }

        tracing::info!(alias = %alias, owner = certificate.owner(), "User trusts certificate; adding to trust store");
        state.entries.insert(
            alias.clone(),
            TrustedCertificateEntry {
                alias,
                der: hex::encode(certificate.der()),
                added: Timestamp::now(),
            },
        );
        state.dirty = true;

        Ok(true)
    }

    /// Persist the store if it changed since the last flush.
    ///
    /// Returns whether anything was written. In-memory stores only clear the
    /// dirty flag.
    pub fn flush_if_dirty(&self) -> Result<bool> {
        let mut state = self.lock();
        if !state.dirty {
            tracing::debug!("No new certificates; nothing to store");
            return Ok(false);
        }

        let Some(path) = &self.path else {
            state.dirty = false;
            return Ok(false);
        };

        tracing::info!(path = %path.display(), "New certificates; storing trust store on disk");
        let file = TrustStoreFile {
            version: TRUST_STORE_VERSION,
            certificates: state.entries.values().cloned().collect(),
        };
        let content = toml::to_string_pretty(&file)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, path)?;

        state.dirty = false;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::MockUserInteractionListener;
    use tempfile::TempDir;

    const LEAF: &[u8] = include_bytes!("../tests/fixtures/leaf.der");
    const EXPIRED: &[u8] = include_bytes!("../tests/fixtures/expired.der");

    fn now() -> Timestamp {
        "2026-10-18T00:00:00Z".parse().unwrap()
    }

    fn accepting(times: usize) -> MockUserInteractionListener {
        let mut listener = MockUserInteractionListener::new();
        listener
            .expect_on_user_confirm()
            .withf(|title, detail, _| {
                title.to_string() == CONFIRM_TITLE && detail.contains("davsync-test")
            })
            .times(times)
            .return_const(true);
        listener
    }

    #[test]
    fn test_unknown_chain_needs_confirmation() {
        let store = TrustStore::in_memory();
        assert_eq!(
            store.evaluate_chain(&[LEAF], now()),
            TrustDecision::NeedsConfirmation
        );
    }

    #[test]
    fn test_expired_certificate_rejects_chain() {
        let store = TrustStore::in_memory();
        assert!(matches!(
            store.evaluate_chain(&[EXPIRED, LEAF], now()),
            TrustDecision::Rejected(CertificateRejection::Expired(_))
        ));
        assert!(matches!(
            store.evaluate_chain(&[], now()),
            TrustDecision::Rejected(CertificateRejection::Malformed(_))
        ));
        assert!(matches!(
            store.evaluate_chain(&[b"junk".as_slice()], now()),
            TrustDecision::Rejected(CertificateRejection::Malformed(_))
        ));
    }

    #[test]
    fn test_pinned_certificate_anywhere_in_chain_is_trusted() {
        let store = TrustStore::in_memory();
        let listener = accepting(1);
        assert!(store.confirm_and_trust(LEAF, Some(&listener)).unwrap());

        assert_eq!(store.evaluate_chain(&[LEAF], now()), TrustDecision::Trusted);
        // A pinned certificate accepts the chain before later entries are inspected
        assert_eq!(
            store.evaluate_chain(&[LEAF, EXPIRED], now()),
            TrustDecision::Trusted
        );
    }

    #[test]
    fn test_confirm_prompts_once_per_fingerprint() {
        let store = TrustStore::in_memory();
        let listener = accepting(1);

        assert!(store.confirm_and_trust(LEAF, Some(&listener)).unwrap());
        // Already pinned: trusted again without a second prompt
        assert!(store.confirm_and_trust(LEAF, Some(&listener)).unwrap());

        let alias = Certificate::from_der(LEAF).unwrap().alias().to_string();
        assert!(store.is_trusted(&alias));
        assert!(store.is_dirty());
        assert_eq!(store.aliases(), vec![alias]);
    }

    #[test]
    fn test_declined_certificate_is_not_asked_again() {
        let store = TrustStore::in_memory();
        let mut listener = MockUserInteractionListener::new();
        listener
            .expect_on_user_confirm()
            .times(1)
            .return_const(false);

        let err = store.confirm_and_trust(LEAF, Some(&listener)).unwrap_err();
        assert!(matches!(err, Error::TrustDenied(_)));

        let err = store.confirm_and_trust(LEAF, Some(&listener)).unwrap_err();
        assert!(matches!(err, Error::TrustDenied(_)));

        assert!(store.is_empty());
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_missing_listener_denies_trust() {
        let store = TrustStore::in_memory();
        let err = store.confirm_and_trust(LEAF, None).unwrap_err();
        assert!(err.is_trust_failure());
        assert!(store.is_empty());
    }

    #[test]
    fn test_flush_only_when_dirty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("truststore.toml");
        let store = TrustStore::load(&path).unwrap();

        assert!(!store.flush_if_dirty().unwrap());
        assert!(!path.exists());

        store.confirm_and_trust(LEAF, Some(&accepting(1))).unwrap();
        assert!(store.flush_if_dirty().unwrap());
        assert!(path.exists());
        assert!(!store.is_dirty());

        // Redundant flushes are no-ops
        assert!(!store.flush_if_dirty().unwrap());
    }

    #[test]
    fn test_reload_keeps_pinned_certificates() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("truststore.toml");

        let store = TrustStore::load(&path).unwrap();
        store.confirm_and_trust(LEAF, Some(&accepting(1))).unwrap();
        store.flush_if_dirty().unwrap();

        let reloaded = TrustStore::load(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.evaluate_chain(&[LEAF], now()), TrustDecision::Trusted);

        // No prompt for a certificate pinned in an earlier session
        let mut listener = MockUserInteractionListener::new();
        listener.expect_on_user_confirm().never();
        assert!(reloaded.confirm_and_trust(LEAF, Some(&listener)).unwrap());
        assert!(!reloaded.is_dirty());
    }

    #[test]
    fn test_in_memory_flush_clears_dirty_flag() {
        let store = TrustStore::in_memory();
        store.confirm_and_trust(LEAF, Some(&accepting(1))).unwrap();
        assert!(!store.flush_if_dirty().unwrap());
        assert!(!store.is_dirty());
        assert!(store.path().is_none());
    }

    #[test]
    fn test_future_version_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("truststore.toml");
        std::fs::write(&path, "version = 99\n").unwrap();

        assert!(matches!(
            TrustStore::load(&path),
            Err(Error::TrustStore(_))
        ));
    }
}
