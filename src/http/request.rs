//! Request capture and normalization.
//!
//! # Responsibilities
//! - Buffer the request body exactly once and hand the bytes back downstream
//! - Flatten headers, cookies and query parameters into single-valued maps
//! - Produce an immutable [`RequestSnapshot`] shared by the logger and responders
//!
//! # Design Decisions
//! - Extraction is total: missing or malformed input degrades to a placeholder
//! - Duplicate headers, cookies and query keys keep the last value seen. A
//!   multi-value map would be more faithful; the flat shape is what the echo
//!   format promises.
//! - Invalid UTF-8 in the body is dropped, not replaced

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::net::SocketAddr;

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, Request},
    http::{header, request::Parts, HeaderMap, Version},
};
use http_body_util::LengthLimitError;
use percent_encoding::percent_decode_str;
use serde::Serialize;

use crate::observability::metrics;

/// Placeholder for metadata the transport does not expose.
pub const UNKNOWN: &str = "unknown";

/// Canonical view of one inbound request.
///
/// Built once per request by [`extract`], then shared read-only as
/// `Arc<RequestSnapshot>` through request extensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestSnapshot {
    pub client_address: String,
    pub http_version: String,
    pub method: String,
    /// Percent-decoded path, always starting with `/`.
    pub path: String,
    pub query_raw: String,
    pub query_params: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub cookies: BTreeMap<String, String>,
    /// `None` when the request carried no body bytes.
    pub body: Option<String>,
}

impl RequestSnapshot {
    /// Build a snapshot from request metadata and the already-buffered body.
    pub fn from_parts(parts: &Parts, body: &[u8]) -> Self {
        let query_raw = parts.uri.query().unwrap_or_default().to_string();

        Self {
            client_address: client_address(parts),
            http_version: version_label(parts.version).to_string(),
            method: parts.method.as_str().to_ascii_uppercase(),
            path: decode_path(parts.uri.path()),
            query_params: flatten_query(&query_raw),
            query_raw,
            headers: flatten_headers(&parts.headers),
            cookies: flatten_cookies(&parts.headers),
            body: decode_body(body),
        }
    }
}

/// Outcome of buffering the request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyCapture {
    /// The whole body is in the snapshot.
    Complete,
    /// The body is larger than the configured limit; the snapshot has no body.
    TooLarge,
    /// The stream failed mid-read (client abort); the body is captured as empty.
    Failed,
}

/// A snapshot plus the request rebuilt from the buffered body.
pub struct Captured {
    pub snapshot: RequestSnapshot,
    pub request: Request,
    pub body: BodyCapture,
}

/// Capture a snapshot of `request`, consuming its body.
///
/// The body is buffered once, up to `max_body_size` bytes, and the returned
/// request carries those same bytes so downstream handlers never touch the
/// original stream. Snapshot construction itself cannot fail; the
/// [`BodyCapture`] tells the caller whether the body made it in.
pub async fn extract(request: Request, max_body_size: usize) -> Captured {
    let (parts, body) = request.into_parts();

    let (bytes, body) = match axum::body::to_bytes(body, max_body_size).await {
        Ok(bytes) => (bytes, BodyCapture::Complete),
        Err(e) if is_length_limit(&e) => {
            tracing::warn!(
                method = %parts.method,
                path = %parts.uri.path(),
                max_body_size,
                "Request body exceeds the configured limit"
            );
            (Bytes::new(), BodyCapture::TooLarge)
        }
        Err(e) => {
            tracing::warn!(
                method = %parts.method,
                path = %parts.uri.path(),
                error = %e,
                "Failed to read request body, capturing it as empty"
            );
            metrics::record_body_read_failure();
            (Bytes::new(), BodyCapture::Failed)
        }
    };

    let snapshot = RequestSnapshot::from_parts(&parts, &bytes);
    Captured {
        snapshot,
        request: Request::from_parts(parts, Body::from(bytes)),
        body,
    }
}

fn is_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(err) = source {
        if err.is::<LengthLimitError>() {
            return true;
        }
        source = err.source();
    }
    false
}

fn client_address(parts: &Parts) -> String {
    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Protocol version in the short form used by the echo payload ("1.1", "2").
pub fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_11 => "1.1",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => UNKNOWN,
    }
}

fn decode_path(raw: &str) -> String {
    let decoded = percent_decode_str(raw).decode_utf8_lossy();
    if decoded.starts_with('/') {
        decoded.into_owned()
    } else {
        format!("/{decoded}")
    }
}

/// Parse a raw query string. Blank values are kept; the last duplicate wins.
pub fn flatten_query(query: &str) -> BTreeMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

/// Flatten headers into lowercase names with one value each; the last wins.
pub fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

/// Parse every `Cookie` header, in order, into a flat map.
pub fn flatten_cookies(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut cookies = BTreeMap::new();
    for value in headers.get_all(header::COOKIE) {
        let value = String::from_utf8_lossy(value.as_bytes());
        for chunk in value.split(';') {
            let (name, raw) = chunk.split_once('=').unwrap_or(("", chunk));
            let (name, raw) = (name.trim(), raw.trim());
            if name.is_empty() && raw.is_empty() {
                continue;
            }
            cookies.insert(name.to_string(), unquote_cookie(raw));
        }
    }
    cookies
}

fn unquote_cookie(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return value.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match (c, chars.clone().next()) {
            ('\\', Some(next @ ('"' | '\\'))) => {
                out.push(next);
                chars.next();
            }
            _ => out.push(c),
        }
    }
    out
}

/// Decode body bytes, dropping invalid UTF-8 sequences. Empty bodies are `None`.
pub fn decode_body(bytes: &[u8]) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    Some(bytes.utf8_chunks().map(|chunk| chunk.valid()).collect())
}
