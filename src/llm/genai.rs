//! GenAI-based oracle client
//!
//! Provides an [`LLMClient`] implementation using the `genai` crate, supporting
//! multiple providers (Groq, Ollama, OpenAI, Claude, Gemini, Grok).

use super::client::LLMClient;
use super::error::BackendError;
use super::types::{ChatMessage, LLMRequest, LLMResponse, MessageRole};
use async_trait::async_trait;
use genai::adapter::AdapterKind;
use genai::chat::{
    ChatMessage as GenAIChatMessage, ChatOptions, ChatRequest as GenAIChatRequest,
    ChatResponseFormat,
};
use genai::resolver::{AuthData, Endpoint, ServiceTargetResolver};
use genai::{Client, ModelIden, ServiceTarget};
use std::time::Duration;
use tracing::{debug, error};

/// Environment variable overriding the provider endpoint
pub const API_BASE_URL_ENV: &str = "SMARTAUDIT_API_BASE_URL";

/// GenAI-based oracle client supporting multiple providers
pub struct GenAIClient {
    client: Client,
    model: String,
    provider: AdapterKind,
    timeout: Duration,
}

impl GenAIClient {
    /// Creates a new GenAI client
    ///
    /// # Arguments
    ///
    /// * `provider` - Provider to use
    /// * `model` - Model name (without provider prefix)
    /// * `timeout` - Per-request timeout
    pub fn new(
        provider: AdapterKind,
        model: String,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        if model.trim().is_empty() {
            return Err(BackendError::ConfigurationError {
                message: "model name cannot be empty".to_string(),
            });
        }

        let custom_endpoint = std::env::var(API_BASE_URL_ENV).ok();

        let client = if let Some(endpoint_url) = custom_endpoint {
            debug!(
                "Using custom endpoint for {}: {}",
                provider.as_str(),
                endpoint_url
            );

            let model_clone = model.clone();

            let resolver = ServiceTargetResolver::from_resolver_fn(
                move |_service_target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error>
                {
                    let endpoint = Endpoint::from_owned(endpoint_url.clone());

                    let auth = match provider.default_key_env_name() {
                        Some(api_key_var) => AuthData::from_env(api_key_var),
                        None => AuthData::from_single(""),
                    };

                    Ok(ServiceTarget {
                        endpoint,
                        auth,
                        model: ModelIden::new(provider, &model_clone),
                    })
                },
            );

            Client::builder()
                .with_service_target_resolver(resolver)
                .build()
        } else {
            Client::default()
        };

        debug!(
            "Creating GenAI client: provider={}, model={}",
            provider.as_str(),
            model,
        );

        Ok(Self {
            client,
            model,
            provider,
            timeout,
        })
    }

    fn convert_message(msg: &ChatMessage) -> GenAIChatMessage {
        match msg.role {
            MessageRole::System => GenAIChatMessage::system(&msg.content),
            MessageRole::User => GenAIChatMessage::user(&msg.content),
            MessageRole::Assistant => GenAIChatMessage::assistant(&msg.content),
        }
    }
}

#[async_trait]
impl LLMClient for GenAIClient {
    async fn chat(&self, request: LLMRequest) -> Result<LLMResponse, BackendError> {
        let start = std::time::Instant::now();

        let messages: Vec<GenAIChatMessage> =
            request.messages.iter().map(Self::convert_message).collect();
        let genai_request = GenAIChatRequest::new(messages);

        let mut options = ChatOptions::default();
        if let Some(temp) = request.temperature {
            options = options.with_temperature(temp as f64);
        }
        if let Some(max_tokens) = request.max_tokens {
            options = options.with_max_tokens(max_tokens);
        }
        if request.json_mode {
            options = options.with_response_format(ChatResponseFormat::JsonMode);
        }

        let response = match tokio::time::timeout(
            self.timeout,
            self.client
                .exec_chat(&self.model, genai_request, Some(&options)),
        )
        .await
        {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => {
                error!("{} API error: {}", self.provider.as_str(), e);
                return Err(BackendError::ApiError {
                    message: format!("{} request failed: {}", self.provider.as_str(), e),
                    status_code: None,
                });
            }
            Err(_) => {
                error!(
                    "{} request timed out after {}s",
                    self.provider.as_str(),
                    self.timeout.as_secs()
                );
                return Err(BackendError::TimeoutError {
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        let content = response.first_text().unwrap_or_default().to_string();
        if content.is_empty() {
            return Err(BackendError::InvalidResponse {
                message: "empty completion".to_string(),
                raw_response: None,
            });
        }

        Ok(LLMResponse::text(content, start.elapsed()))
    }

    fn name(&self) -> &str {
        self.provider.as_str()
    }

    fn model_info(&self) -> Option<String> {
        Some(self.model.clone())
    }
}

impl std::fmt::Debug for GenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenAIClient")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genai_client_creation() {
        let client = GenAIClient::new(
            AdapterKind::Groq,
            "llama-3.3-70b-versatile".to_string(),
            Duration::from_secs(30),
        )
        .unwrap();

        assert_eq!(client.name(), "Groq");
        assert_eq!(
            client.model_info(),
            Some("llama-3.3-70b-versatile".to_string())
        );
    }

    #[test]
    fn test_empty_model_rejected() {
        let result = GenAIClient::new(AdapterKind::Groq, "  ".to_string(), Duration::from_secs(5));
        assert!(matches!(
            result,
            Err(BackendError::ConfigurationError { .. })
        ));
    }

    #[test]
    fn test_debug_impl() {
        fn assert_debug<T: std::fmt::Debug>() {}
        assert_debug::<GenAIClient>();
    }
}
