//! Extraction of JSON payloads from free-form oracle output
//!
//! Oracles frequently wrap their JSON in prose or markdown fences. Only the outermost
//! `{...}` span (first `{` through last `}`) is parsed; everything around it is ignored.

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("No JSON object found in response")]
    NoJsonObject,
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
}

/// Returns the outermost `{...}` span of `response`, if any
pub fn extract_json_object(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if start < end {
        Some(&response[start..=end])
    } else {
        None
    }
}

/// Locates the embedded JSON object and deserializes it into `T`
pub fn parse_embedded<T: DeserializeOwned>(response: &str) -> Result<T, ResponseError> {
    debug!("Parsing oracle response ({} chars)", response.len());

    let json_str = extract_json_object(response).ok_or(ResponseError::NoJsonObject)?;

    serde_json::from_str(json_str).map_err(|e| {
        warn!("JSON parse error: {}", e);
        ResponseError::InvalidJson(format!(
            "{}: {}",
            e,
            json_str.chars().take(100).collect::<String>()
        ))
    })
}
