//! In-process servers for integration tests
//!
//! `FakeDav` is a small WebDAV server over an in-memory tree, enough for
//! PROPFIND (depth 1), GET, HEAD, PUT, DELETE, MOVE and MKCOL. `TlsEndpoint`
//! terminates TLS with the fixture certificate and answers every request
//! with a canned multistatus.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::header::{AUTHORIZATION, CONTENT_LENGTH};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Path of the repository root on the fake server
pub const REPO_PATH: &str = "/dav/repo";

#[derive(Debug, Default)]
pub struct Tree {
    pub collections: BTreeSet<String>,
    pub files: BTreeMap<String, Vec<u8>>,
    /// Successful MKCOL count per path
    pub created: BTreeMap<String, usize>,
    /// DELETE on these paths answers 403
    pub forbidden_deletes: BTreeSet<String>,
    /// PUT anywhere answers 403
    pub read_only: bool,
    /// Content-Length announced by the last PUT per path
    pub put_lengths: BTreeMap<String, Option<u64>>,
}

impl Tree {
    fn parent(path: &str) -> &str {
        path.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("")
    }

    fn parent_exists(&self, path: &str) -> bool {
        self.collections.contains(Self::parent(path))
    }

    fn children(&self, path: &str) -> Vec<(String, bool)> {
        let dirs = self
            .collections
            .iter()
            .filter(|c| c.as_str() != path && Self::parent(c) == path)
            .map(|c| (c.clone(), true));
        let files = self
            .files
            .keys()
            .filter(|f| Self::parent(f) == path)
            .map(|f| (f.clone(), false));
        dirs.chain(files).collect()
    }
}

pub struct FakeDav {
    pub addr: SocketAddr,
    pub tree: Arc<Mutex<Tree>>,
}

impl FakeDav {
    /// Start a server whose tree holds only `/dav`
    pub async fn start() -> Self {
        let mut tree = Tree::default();
        tree.collections.insert("/dav".to_string());
        let tree = Arc::new(Mutex::new(tree));

        let app = Router::new()
            .fallback(handle)
            .layer(DefaultBodyLimit::disable())
            .with_state(tree.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, tree }
    }

    /// URL of the repository root
    pub fn repo_url(&self) -> String {
        format!("http://{}{}", self.addr, REPO_PATH)
    }

    pub fn tree(&self) -> std::sync::MutexGuard<'_, Tree> {
        self.tree.lock().unwrap()
    }

    /// Put a file straight into the tree, bypassing the client
    pub fn seed_file(&self, path: &str, content: &[u8]) {
        self.tree().files.insert(path.to_string(), content.to_vec());
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.tree().files.contains_key(path)
    }

    pub fn has_collection(&self, path: &str) -> bool {
        self.tree().collections.contains(path)
    }

    pub fn created_count(&self, path: &str) -> usize {
        self.tree().created.get(path).copied().unwrap_or(0)
    }

    pub fn put_length(&self, path: &str) -> Option<u64> {
        self.tree().put_lengths.get(path).copied().flatten()
    }
}

fn multistatus(entries: &[(String, bool)]) -> Response {
    let mut xml = String::from(r#"<?xml version="1.0" encoding="utf-8"?><D:multistatus xmlns:D="DAV:">"#);
    for (href, is_collection) in entries {
        let (href, resourcetype) = if *is_collection {
            (format!("{href}/"), "<D:collection/>")
        } else {
            (href.clone(), "")
        };
        xml.push_str(&format!(
            "<D:response><D:href>{href}</D:href><D:propstat><D:prop>\
             <D:resourcetype>{resourcetype}</D:resourcetype></D:prop>\
             <D:status>HTTP/1.1 200 OK</D:status></D:propstat></D:response>"
        ));
    }
    xml.push_str("</D:multistatus>");

    Response::builder()
        .status(StatusCode::MULTI_STATUS)
        .header("content-type", "application/xml; charset=utf-8")
        .body(Body::from(xml))
        .unwrap()
}

async fn handle(
    State(tree): State<Arc<Mutex<Tree>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !headers.contains_key(AUTHORIZATION) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let path = uri.path().trim_end_matches('/').to_string();
    let mut tree = tree.lock().unwrap();

    match method.as_str() {
        "PROPFIND" => {
            if tree.collections.contains(&path) {
                let mut entries = vec![(path.clone(), true)];
                entries.extend(tree.children(&path));
                multistatus(&entries)
            } else if tree.files.contains_key(&path) {
                multistatus(&[(path, false)])
            } else {
                StatusCode::NOT_FOUND.into_response()
            }
        }
        "GET" => match tree.files.get(&path) {
            Some(content) => (StatusCode::OK, content.clone()).into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        },
        "HEAD" => {
            if tree.files.contains_key(&path) || tree.collections.contains(&path) {
                StatusCode::OK.into_response()
            } else {
                StatusCode::NOT_FOUND.into_response()
            }
        }
        "PUT" => {
            if tree.read_only {
                StatusCode::FORBIDDEN.into_response()
            } else if !tree.parent_exists(&path) {
                StatusCode::CONFLICT.into_response()
            } else {
                let length = headers
                    .get(CONTENT_LENGTH)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok());
                tree.put_lengths.insert(path.clone(), length);
                tree.files.insert(path, body.to_vec());
                StatusCode::CREATED.into_response()
            }
        }
        "DELETE" => {
            if tree.forbidden_deletes.contains(&path) {
                StatusCode::FORBIDDEN.into_response()
            } else if tree.files.remove(&path).is_some() {
                StatusCode::NO_CONTENT.into_response()
            } else if tree.collections.remove(&path) {
                let prefix = format!("{path}/");
                tree.collections.retain(|c| !c.starts_with(&prefix));
                tree.files.retain(|f, _| !f.starts_with(&prefix));
                StatusCode::NO_CONTENT.into_response()
            } else {
                StatusCode::NOT_FOUND.into_response()
            }
        }
        "MKCOL" => {
            if tree.collections.contains(&path) || tree.files.contains_key(&path) {
                StatusCode::METHOD_NOT_ALLOWED.into_response()
            } else if !tree.parent_exists(&path) {
                StatusCode::CONFLICT.into_response()
            } else {
                tree.collections.insert(path.clone());
                *tree.created.entry(path).or_default() += 1;
                StatusCode::CREATED.into_response()
            }
        }
        "MOVE" => {
            let Some(destination) = headers
                .get("destination")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| url::Url::parse(v).ok())
            else {
                return StatusCode::BAD_REQUEST.into_response();
            };
            let target = destination.path().trim_end_matches('/').to_string();

            if !tree.parent_exists(&target) {
                return StatusCode::CONFLICT.into_response();
            }
            match tree.files.remove(&path) {
                Some(content) => {
                    let replaced = tree.files.insert(target, content).is_some();
                    if replaced {
                        StatusCode::NO_CONTENT.into_response()
                    } else {
                        StatusCode::CREATED.into_response()
                    }
                }
                None => StatusCode::NOT_FOUND.into_response(),
            }
        }
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

/// TLS server presenting `tests/fixtures/leaf.der`
pub struct TlsEndpoint {
    pub addr: SocketAddr,
    /// Handshakes that completed
    pub handshakes: Arc<AtomicUsize>,
}

impl TlsEndpoint {
    pub async fn start() -> Self {
        use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};

        let cert = CertificateDer::from(include_bytes!("../fixtures/leaf.der").to_vec());
        let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(
            include_bytes!("../fixtures/key.pk8.der").to_vec(),
        ));
        let config = rustls::ServerConfig::builder_with_provider(Arc::new(
            rustls::crypto::ring::default_provider(),
        ))
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(vec![cert], key)
        .unwrap();
        let acceptor = tokio_rustls::TlsAcceptor::from(Arc::new(config));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handshakes = Arc::new(AtomicUsize::new(0));

        let counter = handshakes.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let acceptor = acceptor.clone();
                let counter = counter.clone();
                tokio::spawn(async move {
                    let Ok(mut tls) = acceptor.accept(stream).await else {
                        return;
                    };
                    counter.fetch_add(1, Ordering::SeqCst);
                    while let Some(request) = read_request(&mut tls).await {
                        let response = canned_response(&request);
                        if tls.write_all(response.as_bytes()).await.is_err() {
                            return;
                        }
                    }
                });
            }
        });

        Self { addr, handshakes }
    }

    pub fn repo_url(&self) -> String {
        format!("https://{}{}", self.addr, REPO_PATH)
    }

    pub fn handshakes(&self) -> usize {
        self.handshakes.load(Ordering::SeqCst)
    }
}

/// Read one request (head and body); `None` on EOF
async fn read_request<S: AsyncReadExt + Unpin>(stream: &mut S) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);

    while buf.len() < head_end + length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Some(head)
}

fn canned_response(request: &str) -> String {
    if request.starts_with("PROPFIND ") {
        let body = format!(
            r#"<?xml version="1.0" encoding="utf-8"?><D:multistatus xmlns:D="DAV:"><D:response><D:href>{REPO_PATH}/</D:href><D:propstat><D:prop><D:resourcetype><D:collection/></D:resourcetype></D:prop><D:status>HTTP/1.1 200 OK</D:status></D:propstat></D:response></D:multistatus>"#
        );
        format!(
            "HTTP/1.1 207 Multi-Status\r\ncontent-type: application/xml\r\ncontent-length: {}\r\n\r\n{body}",
            body.len()
        )
    } else {
        "HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\n\r\n".to_string()
    }
}
