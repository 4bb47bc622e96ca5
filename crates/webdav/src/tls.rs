//! Trust-on-first-use certificate verification for rustls
//!
//! The verifier ignores the server name and the web PKI entirely: a chain is
//! accepted only if it is time-valid and one of its certificates is pinned in
//! the [`TrustStore`], or if the user pins the leaf when asked.

use std::sync::{Arc, Mutex};

use davsync_core::{CertificateRejection, TrustDecision, TrustStore, UserInteractionListener};
use jiff::Timestamp;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{CertificateError, ClientConfig, DigitallySignedStruct, SignatureScheme};

use crate::error::DavError;

/// Why the last handshake was refused by this verifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustFailure {
    /// Chain failed validation (expired, not yet valid, malformed)
    Rejected(String),
    /// The user declined, or nobody could be asked
    Denied(String),
}

impl From<TrustFailure> for DavError {
    fn from(failure: TrustFailure) -> Self {
        match failure {
            TrustFailure::Rejected(msg) => DavError::Tls(msg),
            TrustFailure::Denied(msg) => DavError::TrustDenied(msg),
        }
    }
}

/// rustls verifier backed by the process-wide trust store
#[derive(Debug)]
pub struct TofuVerifier {
    trust_store: Arc<TrustStore>,
    listener: Option<Arc<dyn UserInteractionListener>>,
    provider: Arc<CryptoProvider>,
    last_failure: Mutex<Option<TrustFailure>>,
}

impl TofuVerifier {
    pub fn new(
        trust_store: Arc<TrustStore>,
        listener: Option<Arc<dyn UserInteractionListener>>,
    ) -> Self {
        Self {
            trust_store,
            listener,
            provider: Arc::new(rustls::crypto::ring::default_provider()),
            last_failure: Mutex::new(None),
        }
    }

    /// Take the reason of the most recent refusal, if any.
    ///
    /// rustls only reports a generic certificate error through the HTTP
    /// stack; the client consults this to tell a declined certificate from
    /// an invalid one.
    pub fn take_failure(&self) -> Option<TrustFailure> {
        self.last_failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    fn record(&self, failure: TrustFailure) {
        *self
            .last_failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(failure);
    }

    /// Build a rustls client configuration using this verifier
    pub fn client_config(self: &Arc<Self>) -> Result<ClientConfig, rustls::Error> {
        let config = ClientConfig::builder_with_provider(self.provider.clone())
            .with_safe_default_protocol_versions()?
            .dangerous()
            .with_custom_certificate_verifier(self.clone())
            .with_no_client_auth();
        Ok(config)
    }
}

fn rejection_error(rejection: &CertificateRejection) -> CertificateError {
    match rejection {
        CertificateRejection::Expired(_) => CertificateError::Expired,
        CertificateRejection::NotYetValid(_) => CertificateError::NotValidYet,
        CertificateRejection::Malformed(_) => CertificateError::BadEncoding,
    }
}

impl ServerCertVerifier for TofuVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let now = i64::try_from(now.as_secs())
            .ok()
            .and_then(|secs| Timestamp::from_second(secs).ok())
            .unwrap_or_else(Timestamp::now);

        let chain: Vec<&[u8]> = std::iter::once(end_entity.as_ref())
            .chain(intermediates.iter().map(|c| c.as_ref()))
            .collect();
        tracing::debug!(certificates = chain.len(), "Verifying server certificate chain");

        match self.trust_store.evaluate_chain(&chain, now) {
            TrustDecision::Trusted => Ok(ServerCertVerified::assertion()),
            TrustDecision::Rejected(rejection) => {
                tracing::warn!(%rejection, "Server certificate chain rejected");
                let error = rejection_error(&rejection);
                self.record(TrustFailure::Rejected(rejection.to_string()));
                Err(rustls::Error::InvalidCertificate(error))
            }
            TrustDecision::NeedsConfirmation => {
                match self
                    .trust_store
                    .confirm_and_trust(end_entity.as_ref(), self.listener.as_deref())
                {
                    Ok(_) => Ok(ServerCertVerified::assertion()),
                    Err(e) => {
                        self.record(TrustFailure::Denied(e.to_string()));
                        Err(rustls::Error::InvalidCertificate(
                            CertificateError::ApplicationVerificationFailure,
                        ))
                    }
                }
            }
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const LEAF: &[u8] = include_bytes!("../tests/fixtures/leaf.der");

    struct Counting {
        answer: bool,
        calls: AtomicUsize,
    }

    impl UserInteractionListener for Counting {
        fn on_user_confirm(&self, _: &str, _: &str, _: &str) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer
        }
    }

    fn verify(verifier: &TofuVerifier, now: UnixTime) -> Result<ServerCertVerified, rustls::Error> {
        let leaf = CertificateDer::from(LEAF.to_vec());
        let name = ServerName::try_from("localhost").unwrap();
        verifier.verify_server_cert(&leaf, &[], &name, &[], now)
    }

    fn now() -> UnixTime {
        UnixTime::since_unix_epoch(std::time::Duration::from_secs(1_790_000_000))
    }

    #[test]
    fn test_accepting_user_pins_leaf() {
        let store = Arc::new(TrustStore::in_memory());
        let listener = Arc::new(Counting {
            answer: true,
            calls: AtomicUsize::new(0),
        });
        let verifier = TofuVerifier::new(store.clone(), Some(listener.clone()));

        assert!(verify(&verifier, now()).is_ok());
        assert!(verify(&verifier, now()).is_ok());

        assert_eq!(listener.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.len(), 1);
        assert!(verifier.take_failure().is_none());
    }

    #[test]
    fn test_declining_user_records_denial() {
        let store = Arc::new(TrustStore::in_memory());
        let listener = Arc::new(Counting {
            answer: false,
            calls: AtomicUsize::new(0),
        });
        let verifier = TofuVerifier::new(store.clone(), Some(listener.clone()));

        let err = verify(&verifier, now()).unwrap_err();
        assert!(matches!(
            err,
            rustls::Error::InvalidCertificate(CertificateError::ApplicationVerificationFailure)
        ));
        assert!(matches!(
            verifier.take_failure(),
            Some(TrustFailure::Denied(_))
        ));
        assert!(verifier.take_failure().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_no_listener_denies() {
        let verifier = TofuVerifier::new(Arc::new(TrustStore::in_memory()), None);
        assert!(verify(&verifier, now()).is_err());
        let failure: DavError = verifier.take_failure().unwrap().into();
        assert!(matches!(failure, DavError::TrustDenied(_)));
    }

    #[test]
    fn test_time_invalid_chain_never_prompts() {
        let listener = Arc::new(Counting {
            answer: true,
            calls: AtomicUsize::new(0),
        });
        let verifier = TofuVerifier::new(
            Arc::new(TrustStore::in_memory()),
            Some(listener.clone()),
        );

        // 2015, before the fixture's validity window
        let early = UnixTime::since_unix_epoch(std::time::Duration::from_secs(1_420_070_400));
        let err = verify(&verifier, early).unwrap_err();

        assert!(matches!(
            err,
            rustls::Error::InvalidCertificate(CertificateError::NotValidYet)
        ));
        assert_eq!(listener.calls.load(Ordering::SeqCst), 0);
        let failure: DavError = verifier.take_failure().unwrap().into();
        assert!(matches!(failure, DavError::Tls(_)));
    }

    #[test]
    fn test_client_config_builds() {
        let verifier = Arc::new(TofuVerifier::new(Arc::new(TrustStore::in_memory()), None));
        assert!(verifier.client_config().is_ok());
        assert!(!verifier.supported_verify_schemes().is_empty());
    }
}
