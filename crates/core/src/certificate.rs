//! X.509 certificate inspection
//!
//! Extracts what the trust workflow needs from a DER-encoded certificate:
//! the pinning alias, a human-readable summary for confirmation prompts and
//! the validity window.

use std::fmt::Write as _;

use jiff::Timestamp;
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Why a certificate failed validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CertificateRejection {
    #[error("certificate expired at {0}")]
    Expired(Timestamp),

    #[error("certificate not valid before {0}")]
    NotYetValid(Timestamp),

    #[error("malformed certificate: {0}")]
    Malformed(String),
}

/// A parsed certificate, keeping its DER encoding
#[derive(Debug, Clone)]
pub struct Certificate {
    der: Vec<u8>,
    alias: String,
    owner: String,
    issuer: String,
    serial: String,
    not_before: Timestamp,
    not_after: Timestamp,
}

impl Certificate {
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (_, cert) = x509_parser::parse_x509_certificate(der)
            .map_err(|e| Error::TlsHandshakeFailed(format!("cannot parse certificate: {e}")))?;

        let signature: &[u8] = &cert.signature_value.data;
        let validity = cert.validity();

        Ok(Self {
            der: der.to_vec(),
            alias: hex::encode(Sha256::digest(signature)),
            owner: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            serial: cert.tbs_certificate.serial.to_string(),
            not_before: to_timestamp(validity.not_before.timestamp())?,
            not_after: to_timestamp(validity.not_after.timestamp())?,
        })
    }

    /// Stable lookup key: SHA-256 over the certificate signature, lowercase hex
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Serial number in decimal
    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn not_before(&self) -> Timestamp {
        self.not_before
    }

    pub fn not_after(&self) -> Timestamp {
        self.not_after
    }

    /// Check the validity window at `now`
    pub fn check_validity(&self, now: Timestamp) -> std::result::Result<(), CertificateRejection> {
        if now < self.not_before {
            return Err(CertificateRejection::NotYetValid(self.not_before));
        }
        if now > self.not_after {
            return Err(CertificateRejection::Expired(self.not_after));
        }
        Ok(())
    }

    pub fn md5_fingerprint(&self) -> String {
        format_fingerprint(&Md5::digest(&self.der))
    }

    pub fn sha1_fingerprint(&self) -> String {
        format_fingerprint(&Sha1::digest(&self.der))
    }

    pub fn sha256_fingerprint(&self) -> String {
        format_fingerprint(&Sha256::digest(&self.der))
    }

    /// Multi-line description shown when asking the user to trust this certificate
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Owner: {}", self.owner);
        let _ = writeln!(out, "Issuer: {}", self.issuer);
        let _ = writeln!(out, "Serial number: {}", self.serial);
        let _ = writeln!(
            out,
            "Valid from {} until: {}",
            self.not_before, self.not_after
        );
        let _ = writeln!(out, "Certificate fingerprints:");
        let _ = writeln!(out, " MD5:  {}", self.md5_fingerprint());
        let _ = writeln!(out, " SHA1: {}", self.sha1_fingerprint());
        let _ = write!(out, " SHA256: {}", self.sha256_fingerprint());
        out
    }
}

fn to_timestamp(seconds: i64) -> Result<Timestamp> {
    Timestamp::from_second(seconds)
        .map_err(|e| Error::TlsHandshakeFailed(format!("certificate validity out of range: {e}")))
}

/// Colon-separated uppercase hex, e.g. `9D:36:A1`
pub fn format_fingerprint(digest: &[u8]) -> String {
    digest
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(":")
}
