//! Thin WebDAV client over reqwest
//!
//! Each method issues exactly one request with basic authentication and
//! returns a [`DavError`]; translation into the storage taxonomy happens in
//! the transfer manager, which knows what operation it was performing.

use std::error::Error as StdError;
use std::sync::Arc;

use http::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderValue};
use http::{Method, StatusCode};
use reqwest::{Body, Client, RequestBuilder, Response};

use crate::error::DavError;
use crate::multistatus::{DavResource, PROPFIND_BODY, parse_multistatus};
use crate::settings::WebdavSettings;
use crate::tls::TofuVerifier;

const OCTET_STREAM: &str = "application/octet-stream";

fn dav_method(name: &'static [u8]) -> Method {
    // Extension methods are valid tokens; from_bytes only fails on bad bytes
    Method::from_bytes(name).unwrap_or(Method::GET)
}

/// HTTP client bound to one set of credentials
#[derive(Clone)]
pub struct DavClient {
    inner: Client,
    username: String,
    password: String,
    verifier: Option<Arc<TofuVerifier>>,
}

impl DavClient {
    /// Build a client for `settings`.
    ///
    /// For `https` endpoints `verifier` decides which server certificates
    /// are acceptable; it is ignored for plain HTTP.
    pub fn new(
        settings: &WebdavSettings,
        verifier: Option<Arc<TofuVerifier>>,
    ) -> Result<Self, DavError> {
        let mut builder =
            Client::builder().user_agent(concat!("davsync/", env!("CARGO_PKG_VERSION")));

        let verifier = if settings.is_secure() { verifier } else { None };
        if let Some(verifier) = &verifier {
            let tls = verifier
                .client_config()
                .map_err(|e| DavError::Tls(e.to_string()))?;
            builder = builder.use_preconfigured_tls(tls);
        }

        let inner = builder.build()?;

        Ok(Self {
            inner,
            username: settings.username().to_string(),
            password: settings.password().to_string(),
            verifier,
        })
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> Result<Response, DavError> {
        tracing::debug!(%method, url, "WebDAV request");

        let request = self
            .inner
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password));

        build(request).send().await.map_err(|e| self.request_error(e))
    }

    /// Map a failed request, preferring what the verifier recorded
    fn request_error(&self, error: reqwest::Error) -> DavError {
        if let Some(failure) = self.verifier.as_ref().and_then(|v| v.take_failure()) {
            return failure.into();
        }
        if let Some(tls) = find_rustls_error(&error) {
            return DavError::Tls(tls.to_string());
        }
        DavError::Http(error)
    }

    fn expect(
        method: &Method,
        url: &str,
        response: Response,
        accepted: &[StatusCode],
    ) -> Result<Response, DavError> {
        let status = response.status();
        if status.is_success() && (accepted.is_empty() || accepted.contains(&status)) {
            return Ok(response);
        }
        Err(DavError::Status {
            method: method.clone(),
            url: url.to_string(),
            status,
        })
    }

    /// PROPFIND with depth 1 on a collection
    pub async fn list(&self, url: &str) -> Result<Vec<DavResource>, DavError> {
        let method = dav_method(b"PROPFIND");
        let response = self
            .send(method.clone(), url, |r| {
                r.header("Depth", "1")
                    .header(CONTENT_TYPE, HeaderValue::from_static("application/xml"))
                    .body(PROPFIND_BODY)
            })
            .await?;
        let response = Self::expect(
            &method,
            url,
            response,
            &[StatusCode::MULTI_STATUS, StatusCode::OK],
        )?;

        let body = response.text().await.map_err(|e| self.request_error(e))?;
        parse_multistatus(&body)
    }

    /// GET, returning the response for streaming its body
    pub async fn get(&self, url: &str) -> Result<Response, DavError> {
        let response = self.send(Method::GET, url, |r| r).await?;
        Self::expect(&Method::GET, url, response, &[])
    }

    /// PUT `length` bytes of opaque binary body, which may be a stream
    pub async fn put(&self, url: &str, body: impl Into<Body>, length: u64) -> Result<(), DavError> {
        let body = body.into();
        let response = self
            .send(Method::PUT, url, |r| {
                r.header(CONTENT_TYPE, HeaderValue::from_static(OCTET_STREAM))
                    .header(CONTENT_LENGTH, length)
                    .body(body)
            })
            .await?;
        Self::expect(&Method::PUT, url, response, &[])?;
        Ok(())
    }

    pub async fn delete(&self, url: &str) -> Result<(), DavError> {
        let response = self.send(Method::DELETE, url, |r| r).await?;
        Self::expect(&Method::DELETE, url, response, &[])?;
        Ok(())
    }

    /// MOVE `source` onto `destination`, replacing an existing target
    pub async fn move_to(&self, source: &str, destination: &str) -> Result<(), DavError> {
        let method = dav_method(b"MOVE");
        let response = self
            .send(method.clone(), source, |r| {
                r.header("Destination", destination).header("Overwrite", "T")
            })
            .await?;
        Self::expect(&method, source, response, &[])?;
        Ok(())
    }

    /// HEAD; `Ok(false)` only for 404
    pub async fn exists(&self, url: &str) -> Result<bool, DavError> {
        let response = self.send(Method::HEAD, url, |r| r).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::expect(&Method::HEAD, url, response, &[])?;
        Ok(true)
    }

    /// MKCOL; an already existing collection (405) is not an error
    pub async fn create_directory(&self, url: &str) -> Result<(), DavError> {
        let method = dav_method(b"MKCOL");
        let response = self.send(method.clone(), url, |r| r).await?;
        if response.status() == StatusCode::METHOD_NOT_ALLOWED {
            tracing::debug!(url, "Collection already exists");
            return Ok(());
        }
        Self::expect(&method, url, response, &[])?;
        Ok(())
    }
}

impl std::fmt::Debug for DavClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DavClient")
            .field("username", &self.username)
            .field("password", &"***")
            .field("verified", &self.verifier.is_some())
            .finish()
    }
}

/// Find a rustls certificate error somewhere in the source chain
fn find_rustls_error<'a>(error: &'a (dyn StdError + 'static)) -> Option<&'a rustls::Error> {
    let mut current: Option<&'a (dyn StdError + 'static)> = Some(error);
    while let Some(err) = current {
        if let Some(tls) = err.downcast_ref::<rustls::Error>() {
            return Some(tls);
        }
        if let Some(io) = err.downcast_ref::<std::io::Error>()
            && let Some(inner) = io.get_ref()
            && let Some(tls) = inner.downcast_ref::<rustls::Error>()
        {
            return Some(tls);
        }
        current = err.source();
    }
    None
}
