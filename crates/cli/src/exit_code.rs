//! Process exit codes
//!
//! Scripts driving `davsync` can tell failure classes apart without parsing
//! messages.

use davsync_core::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    /// Bad arguments or invalid configuration
    UsageError = 2,
    /// Transport failure talking to the server
    NetworkError = 3,
    /// TLS peer not verified or trust declined
    AuthError = 4,
    NotFound = 5,
    /// Move failed; the target may be in an unexpected state
    Conflict = 6,
}

impl ExitCode {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Classify a storage error
    pub fn from_error(error: &Error) -> Self {
        match error {
            Error::ConfigInvalid(_) | Error::InvalidObjectName(_) => ExitCode::UsageError,
            Error::TlsHandshakeFailed(_) | Error::TrustDenied(_) => ExitCode::AuthError,
            Error::TransferFailed(_) => ExitCode::NetworkError,
            Error::MoveFailed(_) => ExitCode::Conflict,
            Error::NotFound(_) | Error::ProfileNotFound(_) => ExitCode::NotFound,
            _ => ExitCode::GeneralError,
        }
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.as_u8())
    }
}
