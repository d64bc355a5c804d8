// tests/common/mod.rs

//! Shared helpers for integration tests: an in-process upstream archive
//! that records every request path, and builders for release files and
//! gzipped package indices.

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};

/// A fake upstream archive: path -> body, plus a log of requested paths.
pub struct Upstream {
    pub files: HashMap<String, Vec<u8>>,
    pub requests: Vec<String>,
}

pub type SharedUpstream = Arc<Mutex<Upstream>>;

/// Serve `files` on an ephemeral local port. Returns the base URL and the
/// shared state, through which tests inspect requests and rotate files.
pub async fn spawn_upstream(files: HashMap<String, Vec<u8>>) -> (String, SharedUpstream) {
    let state: SharedUpstream = Arc::new(Mutex::new(Upstream {
        files,
        requests: Vec::new(),
    }));

    let app = Router::new().fallback(serve_file).with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), state)
}

async fn serve_file(State(state): State<SharedUpstream>, uri: Uri) -> Response {
    let path = uri.path().to_string();
    let mut upstream = state.lock().unwrap();
    upstream.requests.push(path.clone());
    match upstream.files.get(&path) {
        Some(body) => body.clone().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Number of requests whose path contains `needle`.
pub fn request_count(state: &SharedUpstream, needle: &str) -> usize {
    state
        .lock()
        .unwrap()
        .requests
        .iter()
        .filter(|path| path.contains(needle))
        .count()
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Build an InRelease body whose SHA256 table lists the given
/// (relative path, body) pairs.
pub fn release_file(suite: &str, entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut out = String::new();
    out.push_str("Origin: Ubuntu\n");
    out.push_str("Label: Ubuntu\n");
    out.push_str(&format!("Suite: {suite}\n"));
    out.push_str(&format!("Codename: {suite}\n"));
    out.push_str("Date: Thu, 21 Apr 2022 17:16:08 +0000\n");
    out.push_str("Architectures: amd64 arm64\n");
    out.push_str("Components: main universe\n");
    out.push_str("Description: test archive\n");
    out.push_str("SHA256:\n");
    for (path, body) in entries {
        out.push_str(&format!(" {} {} {}\n", sha256_hex(body), body.len(), path));
    }
    out.into_bytes()
}

/// The one-stanza Packages file from the first-refresh scenario.
pub fn foo_packages() -> Vec<u8> {
    let stanza = format!(
        "Package: foo\nVersion: 1.0\nFilename: pool/main/f/foo.deb\nSize: 42\nSHA256: {}\nMaintainer: A <a@x>\n",
        "00".repeat(32)
    );
    stanza.into_bytes()
}
