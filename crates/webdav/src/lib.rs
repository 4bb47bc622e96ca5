//! davsync-webdav: WebDAV storage backend
//!
//! This crate implements the `TransferManager` trait from davsync-core on
//! top of a WebDAV server reached over HTTP or HTTPS. Server certificates
//! are pinned trust-on-first-use through the shared `TrustStore`.

pub mod client;
pub mod connection;
pub mod error;
pub mod multistatus;
pub mod settings;
pub mod tls;
pub mod transfer;

pub use client::DavClient;
pub use connection::ConnectionManager;
pub use error::DavError;
pub use multistatus::DavResource;
pub use settings::{OPTION_SPECS, OptionSpec, WebdavSettings};
pub use tls::{TofuVerifier, TrustFailure};
pub use transfer::{WRITE_TEST_NAME, WebdavTransferManager};
