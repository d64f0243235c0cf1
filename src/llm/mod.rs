//! Oracle client abstraction layer
//!
//! This module provides a trait-based abstraction for oracle communication,
//! allowing different backends (GenAI, Mock) to be used interchangeably.

mod client;
mod error;
mod genai;
mod mock;
pub mod response;
mod types;

pub use ::genai::adapter::AdapterKind;
pub use client::LLMClient;
pub use error::BackendError;
pub use genai::{GenAIClient, API_BASE_URL_ENV};
pub use mock::{MockLLMClient, MockResponse};
pub use response::{extract_json_object, parse_embedded, ResponseError};
pub use types::{ChatMessage, LLMRequest, LLMResponse, MessageRole};
