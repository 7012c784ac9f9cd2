//! Serializable shapes of the fixture artifacts.
//!
//! `request.json` holds a [`RequestMetaRecord`], `response.json` a
//! [`ResponseMetaRecord`]; bodies are stored verbatim next to them.

use crate::errors::FixtureError;
use crate::fingerprint::{fingerprint, Fingerprint};
use crate::normalizer::Normalizer;
use crate::types::{HttpHeader, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

pub const REQUEST_META_FILE: &str = "request.json";
pub const REQUEST_CONTENT_FILE: &str = "request_content.json";
pub const RESPONSE_META_FILE: &str = "response.json";
pub const RESPONSE_CONTENT_FILE: &str = "response_content.json";

/// Serializable mirror of `HttpRequest` without its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMetaRecord {
    pub method: String,
    pub uri: String,
    pub headers: Vec<HttpHeader>,
}

/// Serializable mirror of `HttpResponse` without its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMetaRecord {
    pub status: u16,
    #[serde(default)]
    pub reason: Option<String>,
    pub headers: Vec<HttpHeader>,
}

/// A request with its secrets swapped for placeholders, plus its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortableRequest {
    pub method: String,
    pub target: String,
    pub meta: String,
    pub content: String,
    pub fingerprint: Fingerprint,
}

impl PortableRequest {
    pub fn from_request(
        request: &HttpRequest,
        normalizer: &Normalizer,
    ) -> Result<Self, FixtureError> {
        let record = RequestMetaRecord {
            method: request.method.clone(),
            uri: normalizer.to_portable(&request.uri),
            headers: map_headers(&request.headers, |text| normalizer.to_portable(text)),
        };
        let meta = to_pretty_json(&record)?;
        let content = normalizer.to_portable(request.body.as_deref().unwrap_or_default());
        let fingerprint = fingerprint(&request.method, &meta, &content);
        Ok(Self {
            method: request.method.clone(),
            target: normalizer.to_portable(&request.uri),
            meta,
            content,
            fingerprint,
        })
    }
}

/// The four texts stored for one interaction, exactly as on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureArtifacts {
    pub request_meta: String,
    pub request_content: String,
    pub response_meta: String,
    pub response_content: String,
}

pub fn portable_response(
    response: &HttpResponse,
    normalizer: &Normalizer,
) -> Result<(String, String), FixtureError> {
    let record = ResponseMetaRecord {
        status: response.status,
        reason: response
            .reason
            .as_deref()
            .map(|reason| normalizer.to_portable(reason)),
        headers: map_headers(&response.headers, |text| normalizer.to_portable(text)),
    };
    let meta = to_pretty_json(&record)?;
    Ok((meta, normalizer.to_portable(&response.body)))
}

/// Rebuilds the response a fixture describes, with live secrets applied.
pub fn restore_response(
    artifacts: &FixtureArtifacts,
    normalizer: &Normalizer,
) -> Result<HttpResponse, FixtureError> {
    let record: ResponseMetaRecord = serde_json::from_str(&artifacts.response_meta)
        .map_err(|e| FixtureError::Serialization(format!("{RESPONSE_META_FILE}: {e}")))?;
    Ok(HttpResponse {
        status: record.status,
        reason: record
            .reason
            .as_deref()
            .map(|reason| normalizer.from_portable(reason)),
        headers: map_headers(&record.headers, |text| normalizer.from_portable(text)),
        body: normalizer.from_portable(&artifacts.response_content),
    })
}

// Secrets are swapped per field, before serialization escapes them.
fn map_headers(headers: &[HttpHeader], swap: impl Fn(&str) -> String) -> Vec<HttpHeader> {
    headers
        .iter()
        .map(|header| HttpHeader::new(swap(&header.name), swap(&header.value)))
        .collect()
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, FixtureError> {
    serde_json::to_string_pretty(value).map_err(|e| FixtureError::Serialization(e.to_string()))
}
