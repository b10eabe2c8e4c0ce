//! OpenAI chat-completions advisor.

use std::time::Duration;

use indexmap::IndexMap;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{NormalizerError, Result};
use crate::matching::MappingSuggestion;
use crate::schema::FieldSpec;

use super::prompts;
use super::provider::{DEFAULT_SUGGESTION_CONFIDENCE, LlmConfig, MappingAdvisor, validate_unit};

/// OpenAI API endpoint.
const API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Advisor backed by OpenAI GPT models.
pub struct OpenAiAdvisor {
    client: Client,
    api_key: String,
    config: LlmConfig,
}

impl OpenAiAdvisor {
    /// Create a new advisor with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(api_key, LlmConfig::default())
    }

    /// Create a new advisor with custom configuration.
    pub fn with_config(api_key: impl Into<String>, config: LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| NormalizerError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            config,
        })
    }

    /// Create from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with_config(LlmConfig::default())
    }

    pub fn from_env_with_config(config: LlmConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            NormalizerError::Config("OPENAI_API_KEY environment variable not set".to_string())
        })?;
        Self::with_config(api_key, config)
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Build headers for API requests.
    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| NormalizerError::Config(format!("Invalid API key: {}", e)))?,
        );
        Ok(headers)
    }

    /// Send one system + user exchange and return the reply text.
    fn send_message(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": [
                {
                    "role": "system",
                    "content": system_prompt
                },
                {
                    "role": "user",
                    "content": user_prompt
                }
            ]
        });

        let response = self
            .client
            .post(API_URL)
            .headers(self.build_headers()?)
            .json(&body)
            .send()
            .map_err(|e| NormalizerError::Advisor(format!("API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(NormalizerError::Advisor(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        let api_response: OpenAiResponse = response
            .json()
            .map_err(|e| NormalizerError::Advisor(format!("Failed to parse API response: {}", e)))?;

        api_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| NormalizerError::Advisor("No response from OpenAI".to_string()))
    }
}

impl MappingAdvisor for OpenAiAdvisor {
    fn suggest_mappings(
        &self,
        unassigned_headers: &[String],
        missing_fields: &[&FieldSpec],
    ) -> Result<Vec<MappingSuggestion>> {
        if !self.config.suggest_mappings || unassigned_headers.is_empty() || missing_fields.is_empty() {
            return Ok(Vec::new());
        }

        let prompt = prompts::mapping_prompt(unassigned_headers, missing_fields);
        let response = self.send_message(prompts::mapping_system_prompt(), &prompt)?;
        debug!(advisor = self.name(), response = %response, "mapping reply");

        parse_suggestions(&response)
    }

    fn resolve_unit(&self, hs_code: &str) -> Result<Option<String>> {
        if !self.config.resolve_units {
            return Ok(None);
        }

        let response = self.send_message(prompts::unit_system_prompt(), &prompts::unit_prompt(hs_code))?;
        Ok(validate_unit(&response))
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// Strip a markdown code fence around a JSON reply, if present.
pub(crate) fn extract_json(response: &str) -> &str {
    if response.contains("```json") {
        response
            .split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .map(|s| s.trim())
            .unwrap_or(response)
    } else if response.contains("```") {
        response
            .split("```")
            .nth(1)
            .map(|s| s.trim())
            .unwrap_or(response)
    } else {
        response.trim()
    }
}

/// Parse a mapping reply: either a list of scored pairings or a plain
/// `{"header": "field"}` object.
pub(crate) fn parse_suggestions(response: &str) -> Result<Vec<MappingSuggestion>> {
    let reply: SuggestionReply = serde_json::from_str(extract_json(response)).map_err(|e| {
        NormalizerError::Advisor(format!("Failed to parse LLM JSON response: {}", e))
    })?;

    Ok(match reply {
        SuggestionReply::Scored(items) => items
            .into_iter()
            .map(|s| {
                MappingSuggestion::new(
                    s.header,
                    s.field,
                    s.confidence.unwrap_or(DEFAULT_SUGGESTION_CONFIDENCE),
                )
            })
            .collect(),
        SuggestionReply::Pairs(pairs) => pairs
            .into_iter()
            .map(|(header, field)| MappingSuggestion::new(header, field, DEFAULT_SUGGESTION_CONFIDENCE))
            .collect(),
    })
}

/// OpenAI API response structure.
#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SuggestionReply {
    Scored(Vec<ScoredPairing>),
    Pairs(IndexMap<String, String>),
}

#[derive(Debug, Deserialize)]
struct ScoredPairing {
    header: String,
    field: String,
    #[serde(default)]
    confidence: Option<f64>,
}
