//! HTTP client for a prompt/completion style model endpoint.

use std::time::Duration;

use async_trait::async_trait;
use carpool_core::{AdvisorError, AdvisorProposal, AdvisorRequest, WeightAdvisor};
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::prompt::{build_prompt, parse_proposal};
use crate::traffic::{DEFAULT_USER_AGENT, ProviderBuildError};

/// Model requested when none is configured.
pub const DEFAULT_MODEL_ID: &str = "anthropic.claude-3-sonnet-20240229-v1:0";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for [`HttpWeightAdvisor`].
#[derive(Debug, Clone)]
pub struct HttpAdvisorConfig {
    /// Endpoint that accepts the invocation body.
    pub endpoint: String,
    /// Model identifier forwarded as `modelId`.
    pub model_id: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Nucleus sampling cut-off.
    pub top_p: f64,
    /// Completion length cap.
    pub max_tokens: u32,
    /// Request timeout.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
    /// Optional bearer token.
    pub api_key: Option<String>,
}

impl Default for HttpAdvisorConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8081/invoke".to_owned(),
            model_id: DEFAULT_MODEL_ID.to_owned(),
            temperature: 0.3,
            top_p: 0.9,
            max_tokens: 2000,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            api_key: None,
        }
    }
}

impl HttpAdvisorConfig {
    /// Create a configuration for `endpoint` with default model settings.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Set the model identifier.
    #[must_use]
    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Authenticate with a bearer token.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InvokeRequest<'a> {
    model_id: &'a str,
    prompt: String,
    parameters: InvokeParameters,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InvokeParameters {
    temperature: f64,
    top_p: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvokeResponse {
    content: String,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

/// [`WeightAdvisor`] that asks a remote model for a proposal.
#[derive(Debug, Clone)]
pub struct HttpWeightAdvisor {
    client: Client,
    config: HttpAdvisorConfig,
}

impl HttpWeightAdvisor {
    /// Build the advisor client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_config(config: HttpAdvisorConfig) -> Result<Self, ProviderBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ProviderBuildError::HttpClient)?;
        Ok(Self { client, config })
    }

    fn convert_reqwest_error(&self, error: &reqwest::Error) -> AdvisorError {
        if error.is_timeout() {
            return AdvisorError::Timeout {
                timeout: self.config.timeout,
            };
        }
        if error.is_decode() {
            return AdvisorError::MalformedResponse {
                message: error.to_string(),
            };
        }
        AdvisorError::Unavailable {
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl WeightAdvisor for HttpWeightAdvisor {
    async fn propose(&self, request: &AdvisorRequest) -> Result<AdvisorProposal, AdvisorError> {
        let body = InvokeRequest {
            model_id: &self.config.model_id,
            prompt: build_prompt(request)?,
            parameters: InvokeParameters {
                temperature: self.config.temperature,
                top_p: self.config.top_p,
                max_tokens: self.config.max_tokens,
            },
        };

        let mut call = self.client.post(&self.config.endpoint).json(&body);
        if let Some(api_key) = &self.config.api_key {
            call = call.bearer_auth(api_key);
        }
        let response: InvokeResponse = call
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| self.convert_reqwest_error(&err))?
            .json()
            .await
            .map_err(|err| self.convert_reqwest_error(&err))?;

        if let Some(usage) = &response.usage {
            debug!(
                "advisor used {} input and {} output tokens",
                usage.input_tokens, usage.output_tokens
            );
        }
        parse_proposal(&response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn invocation_body_uses_camel_case() {
        let body = InvokeRequest {
            model_id: "model-x",
            prompt: "p".into(),
            parameters: InvokeParameters {
                temperature: 0.3,
                top_p: 0.9,
                max_tokens: 2000,
            },
        };
        let json = serde_json::to_value(&body).expect("serialise");
        assert_eq!(json["modelId"], "model-x");
        assert_eq!(json["parameters"]["topP"], 0.9);
        assert_eq!(json["parameters"]["maxTokens"], 2000);
    }

    #[rstest]
    fn responses_without_usage_deserialise() {
        let response: InvokeResponse =
            serde_json::from_str(r#"{"content": "{}"}"#).expect("deserialise");
        assert!(response.usage.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn unreachable_endpoint_is_unavailable() {
        let advisor = HttpWeightAdvisor::with_config(
            HttpAdvisorConfig::new("http://127.0.0.1:9/invoke")
                .with_timeout(Duration::from_secs(2)),
        )
        .expect("advisor");
        let request = AdvisorRequest {
            current_weights: carpool_core::MetricWeights::default(),
            aggregated_history: carpool_core::PerformanceAnalysis::default(),
        };
        let err = advisor.propose(&request).await.expect_err("no server");
        assert!(matches!(
            err,
            AdvisorError::Unavailable { .. } | AdvisorError::Timeout { .. }
        ));
    }
}
