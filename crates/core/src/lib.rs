//! davsync-core: Core library for davsync storage backends
//!
//! This crate provides the backend-independent pieces of a transfer manager:
//! - Configuration and profile management
//! - The remote object model and the fixed repository layout
//! - Certificate inspection and the trust-on-first-use trust store
//! - The `TransferManager` trait implemented by storage backends
//!
//! Nothing here speaks a network protocol; backends such as `davsync-webdav`
//! build on these types.

pub mod certificate;
pub mod config;
pub mod error;
pub mod interaction;
pub mod layout;
pub mod object;
pub mod profile;
pub mod traits;
pub mod trust;

pub use certificate::{Certificate, CertificateRejection};
pub use config::{Config, ConfigManager};
pub use error::{Error, Result};
pub use interaction::UserInteractionListener;
pub use layout::{RepositoryFolder, RepositoryLayout};
pub use object::{REPO_MARKER_NAME, RemoteObject, RemoteObjectCategory};
pub use profile::{Profile, ProfileManager};
pub use traits::{StorageTestResult, TransferManager};
pub use trust::{TrustDecision, TrustStore};
