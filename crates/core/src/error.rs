//! Error types for davsync-core
//!
//! Storage backends translate their transport failures into this taxonomy
//! at every operation boundary, so the synchronization engine only ever sees
//! these kinds.

/// Result type alias for davsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for storage operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or incomplete settings, detected before any connection attempt
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    /// The TLS peer could not be verified
    #[error("TLS handshake failed: {0}")]
    TlsHandshakeFailed(String),

    /// The user (or the absence of a confirmation capability) refused a certificate
    #[error("Certificate not trusted: {0}")]
    TrustDenied(String),

    /// I/O or transport failure while listing, downloading or uploading
    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    /// Remote rename failed; kept apart from transfer failures
    #[error("Move failed: {0}")]
    MoveFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid object name: {0}")]
    InvalidObjectName(String),

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Trust store error: {0}")]
    TrustStore(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("{0}")]
    General(String),
}

impl Error {
    /// Whether this error comes from TLS peer verification.
    ///
    /// Boolean probes never swallow these into `false`.
    pub fn is_trust_failure(&self) -> bool {
        matches!(self, Error::TrustDenied(_) | Error::TlsHandshakeFailed(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
