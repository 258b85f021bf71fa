//! Anthropic Claude API oracle implementation.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;

use crate::error::{Result, TablecastError};
use crate::schema::ColumnSchema;
use crate::table::Frame;

use super::prompts;
use super::{OracleFeedback, SchemaOracle};

/// Anthropic API endpoint.
const API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic API version.
const API_VERSION: &str = "2023-06-01";

/// Configuration for the Anthropic oracle.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// Model to use.
    pub model: String,
    /// Maximum tokens in the response.
    pub max_tokens: usize,
    /// Temperature for generation (0.0-1.0).
    pub temperature: f64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 2048,
            temperature: 0.2,
        }
    }
}

/// Schema oracle backed by the Anthropic messages API.
pub struct AnthropicOracle {
    client: Client,
    api_key: String,
    config: OracleConfig,
}

impl AnthropicOracle {
    /// Create a new oracle with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(api_key, OracleConfig::default())
    }

    /// Create a new oracle with custom configuration.
    pub fn with_config(api_key: impl Into<String>, config: OracleConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| {
                TablecastError::Config(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            config,
        })
    }

    /// Create from the ANTHROPIC_API_KEY environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            TablecastError::Config("ANTHROPIC_API_KEY environment variable not set".to_string())
        })?;
        Self::new(api_key)
    }

    /// Build headers for API requests.
    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| TablecastError::Config(format!("Invalid API key: {}", e)))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        Ok(headers)
    }

    /// Send a message to the Claude API and return the text response.
    fn send_message(&self, user_prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "system": prompts::system_prompt(),
            "messages": [
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
            .map_err(|e| TablecastError::Config(format!("API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(TablecastError::Config(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let api_response: ApiResponse = response.json().map_err(|e| {
            TablecastError::Config(format!("Failed to parse API response: {}", e))
        })?;

        api_response
            .content
            .into_iter()
            .find_map(|block| {
                if block.content_type == "text" {
                    Some(block.text)
                } else {
                    None
                }
            })
            .ok_or_else(|| TablecastError::Config("No text in API response".to_string()))
    }

    /// Parse JSON from the model response, handling markdown code blocks.
    fn parse_json_response<T: for<'de> Deserialize<'de>>(&self, response: &str) -> Result<T> {
        let json_str = if response.contains("```json") {
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
        };

        serde_json::from_str(json_str).map_err(|e| {
            TablecastError::Config(format!("Failed to parse schema JSON response: {}", e))
        })
    }
}

impl SchemaOracle for AnthropicOracle {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn propose(
        &self,
        sample: &Frame,
        feedback: Option<&OracleFeedback>,
    ) -> Result<Vec<ColumnSchema>> {
        let prompt = prompts::inference_prompt(sample, feedback);
        let response = self.send_message(&prompt)?;
        self.parse_json_response(&response)
    }
}

/// Response from the Anthropic API.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_response_plain() {
        let oracle = AnthropicOracle::new("test-key").unwrap();
        let response = r#"[{"name": "id", "data_type": "integer", "regex_cleaning_pattern": ""}]"#;
        let schemas: Vec<ColumnSchema> = oracle.parse_json_response(response).unwrap();
        assert_eq!(schemas.len(), 1);
        assert_eq!(schemas[0].name, "id");
    }

    #[test]
    fn test_parse_json_response_markdown_fenced() {
        let oracle = AnthropicOracle::new("test-key").unwrap();
        let response = "Here is the schema:\n```json\n[{\"name\": \"id\", \"data_type\": \"string\", \"regex_cleaning_pattern\": \"\"}]\n```";
        let schemas: Vec<ColumnSchema> = oracle.parse_json_response(response).unwrap();
        assert_eq!(schemas.len(), 1);
    }

    #[test]
    fn test_parse_json_response_invalid() {
        let oracle = AnthropicOracle::new("test-key").unwrap();
        let result: Result<Vec<ColumnSchema>> = oracle.parse_json_response("not json");
        assert!(result.is_err());
    }
}
