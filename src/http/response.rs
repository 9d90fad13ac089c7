//! Echo and status-code responders.
//!
//! # Responsibilities
//! - Mirror a [`RequestSnapshot`] back as JSON
//! - Validate a requested status code and answer with it
//!
//! # Design Decisions
//! - Payloads borrow from the snapshot; nothing is copied before serialization
//! - Maps are ordered, so identical requests produce identical bodies

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::http::request::RequestSnapshot;
use crate::observability::{metrics, RequestLogger};

/// Lowest status code the status route will generate.
pub const MIN_STATUS_CODE: i64 = 100;
/// Highest status code the status route will generate.
pub const MAX_STATUS_CODE: i64 = 599;

/// JSON body of the echo route. Field order is the wire order.
#[derive(Debug, Serialize)]
pub struct EchoPayload<'a> {
    pub path: &'a str,
    pub method: &'a str,
    pub headers: &'a BTreeMap<String, String>,
    pub query_params: &'a BTreeMap<String, String>,
    pub cookies: &'a BTreeMap<String, String>,
    pub body: Option<&'a str>,
    pub client_ip: &'a str,
    pub http_version: &'a str,
}

impl<'a> From<&'a RequestSnapshot> for EchoPayload<'a> {
    fn from(snapshot: &'a RequestSnapshot) -> Self {
        Self {
            path: &snapshot.path,
            method: &snapshot.method,
            headers: &snapshot.headers,
            query_params: &snapshot.query_params,
            cookies: &snapshot.cookies,
            body: snapshot.body.as_deref(),
            client_ip: &snapshot.client_address,
            http_version: &snapshot.http_version,
        }
    }
}

/// JSON body of a generated status response.
#[derive(Debug, Serialize)]
pub struct StatusPayload<'a> {
    pub status_code: u16,
    pub message: String,
    #[serde(flatten)]
    pub echo: EchoPayload<'a>,
}

impl<'a> StatusPayload<'a> {
    pub fn new(status: StatusCode, snapshot: &'a RequestSnapshot) -> Self {
        Self {
            status_code: status.as_u16(),
            message: format!("Generated error with status {}", status.as_u16()),
            echo: EchoPayload::from(snapshot),
        }
    }
}

/// A requested status code outside `100..=599`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("status code {0} is outside 100..=599")]
pub struct InvalidStatusCode(pub i64);

impl IntoResponse for InvalidStatusCode {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid status code" })),
        )
            .into_response()
    }
}

/// Accept `code` if it is a status code the service can answer with.
pub fn validate_status_code(code: i64) -> Result<StatusCode, InvalidStatusCode> {
    if !(MIN_STATUS_CODE..=MAX_STATUS_CODE).contains(&code) {
        return Err(InvalidStatusCode(code));
    }
    u16::try_from(code)
        .ok()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .ok_or(InvalidStatusCode(code))
}

/// `200 OK` with the snapshot mirrored as JSON.
pub fn echo_response(snapshot: &RequestSnapshot) -> Response {
    (StatusCode::OK, Json(EchoPayload::from(snapshot))).into_response()
}

/// Answer with the requested status code, logging the generated response.
///
/// Rejected codes are not logged.
pub fn status_code_response(
    code: i64,
    snapshot: &RequestSnapshot,
    logger: &RequestLogger,
) -> Result<Response, InvalidStatusCode> {
    let status = validate_status_code(code)?;

    logger.log(snapshot, Some(status));
    metrics::record_generated_status(status.as_u16());

    Ok((status, Json(StatusPayload::new(status, snapshot))).into_response())
}
