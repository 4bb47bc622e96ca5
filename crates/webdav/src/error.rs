//! Transport errors of the WebDAV client and their translation into the
//! storage error taxonomy.

use davsync_core::Error;
use http::{Method, StatusCode};

/// Failure of one WebDAV request
#[derive(Debug, thiserror::Error)]
pub enum DavError {
    /// The server answered with an unexpected status
    #[error("{method} {url} returned HTTP {status}")]
    Status {
        method: Method,
        url: String,
        status: StatusCode,
    },

    /// Our certificate verifier refused the peer after asking the user
    #[error("certificate not trusted: {0}")]
    TrustDenied(String),

    /// The TLS handshake failed for any other reason
    #[error("TLS handshake failed: {0}")]
    Tls(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid multistatus response: {0}")]
    Xml(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DavError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            DavError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    pub fn is_trust_failure(&self) -> bool {
        matches!(self, DavError::TrustDenied(_) | DavError::Tls(_))
    }

    /// Translate into the storage taxonomy.
    ///
    /// Trust failures keep their kind; everything else becomes the
    /// operation's own failure kind built by `other`.
    pub fn into_storage_error(self, other: impl FnOnce(String) -> Error) -> Error {
        match self {
            DavError::TrustDenied(msg) => Error::TrustDenied(msg),
            DavError::Tls(msg) => Error::TlsHandshakeFailed(msg),
            e => other(e.to_string()),
        }
    }
}
