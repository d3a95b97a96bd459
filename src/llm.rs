//! Generation service integration
//!
//! This module handles communication with the Gemini API for producing
//! workout plans. One prompt in, one markdown blob out; the caller parses
//! the sections. Failures carry the service's own message and are never
//! retried here.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const GEMINI_MODEL: &str = "gemini-2.0-flash";

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum LlmError {
  #[error("API key not configured")]
  MissingApiKey,

  #[error("Request failed: {0}")]
  Request(String),

  #[error("API error: {0}")]
  Api(String),

  #[error("Parse error: {0}")]
  Parse(String),
}

/// ---------------------------------------------------------------------------
/// Gemini API Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
  contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
  role: String,
  parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
  text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
  #[serde(rename = "usageMetadata")]
  usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
  content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
  #[serde(default)]
  parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
  text: Option<String>,
}

/// Token accounting echoed by the service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
  #[serde(default)]
  pub prompt_token_count: u32,
  #[serde(default)]
  pub candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
  error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
  message: String,
}

/// ---------------------------------------------------------------------------
/// Gemini Client
/// ---------------------------------------------------------------------------

pub struct GeminiClient {
  client: Client,
  api_key: String,
  base_url: String,
}

impl GeminiClient {
  /// Create a new client, loading the API key from the environment.
  pub fn from_env() -> Result<Self, LlmError> {
    dotenvy::dotenv().ok();
    let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| LlmError::MissingApiKey)?;
    Ok(Self::new(api_key))
  }

  pub fn new(api_key: impl Into<String>) -> Self {
    Self::with_base_url(api_key, GEMINI_API_BASE)
  }

  /// Point the client at a different endpoint (test servers).
  pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
    Self {
      client: Client::new(),
      api_key: api_key.into(),
      base_url: base_url.into(),
    }
  }

  fn endpoint(&self) -> Result<Url, LlmError> {
    let mut url = Url::parse(&format!(
      "{}/models/{}:generateContent",
      self.base_url, GEMINI_MODEL
    ))
    .map_err(|e| LlmError::Request(e.to_string()))?;
    url.query_pairs_mut().append_pair("key", &self.api_key);
    Ok(url)
  }

  /// Send one prompt and return the generated text plus token accounting.
  pub async fn generate_content(
    &self,
    prompt: &str,
  ) -> Result<(String, Option<UsageMetadata>), LlmError> {
    let request = GenerateContentRequest {
      contents: vec![Content {
        role: "user".to_string(),
        parts: vec![Part {
          text: prompt.to_string(),
        }],
      }],
    };

    let response = self
      .client
      .post(self.endpoint()?)
      .json(&request)
      .send()
      .await
      .map_err(|e| LlmError::Request(e.to_string()))?;

    let status = response.status();
    let body = response
      .text()
      .await
      .map_err(|e| LlmError::Request(e.to_string()))?;

    if !status.is_success() {
      // Surface the service's own message when the body is parseable.
      if let Ok(error_resp) = serde_json::from_str::<GeminiErrorResponse>(&body) {
        return Err(LlmError::Api(error_resp.error.message));
      }
      return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
    }

    let parsed: GenerateContentResponse =
      serde_json::from_str(&body).map_err(|e| LlmError::Parse(e.to_string()))?;

    let text = parsed
      .candidates
      .first()
      .and_then(|c| c.content.as_ref())
      .and_then(|c| c.parts.first())
      .and_then(|p| p.text.clone())
      .ok_or_else(|| LlmError::Parse("Response contained no candidate text".to_string()))?;

    Ok((text, parsed.usage_metadata))
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  fn candidate_body(text: &str) -> String {
    serde_json::json!({
      "candidates": [
        { "content": { "role": "model", "parts": [ { "text": text } ] } }
      ],
      "usageMetadata": { "promptTokenCount": 120, "candidatesTokenCount": 340 }
    })
    .to_string()
  }

  #[tokio::test]
  async fn test_generate_content_returns_first_candidate_text() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("POST", "/models/gemini-2.0-flash:generateContent")
      .match_query(mockito::Matcher::Any)
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(candidate_body("## Warm-up\n5 min easy"))
      .create_async()
      .await;

    let client = GeminiClient::with_base_url("test-key", server.url());
    let (text, usage) = client.generate_content("design a workout").await.unwrap();

    assert_eq!(text, "## Warm-up\n5 min easy");
    assert_eq!(usage.unwrap().candidates_token_count, 340);
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_api_error_surfaces_service_message() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("POST", "/models/gemini-2.0-flash:generateContent")
      .match_query(mockito::Matcher::Any)
      .with_status(400)
      .with_body(r#"{"error": {"message": "API key not valid", "code": 400}}"#)
      .create_async()
      .await;

    let client = GeminiClient::with_base_url("bad-key", server.url());
    let err = client.generate_content("prompt").await.unwrap_err();

    match err {
      LlmError::Api(message) => assert_eq!(message, "API key not valid"),
      other => panic!("expected Api error, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn test_empty_candidates_is_a_parse_error() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("POST", "/models/gemini-2.0-flash:generateContent")
      .match_query(mockito::Matcher::Any)
      .with_status(200)
      .with_body(r#"{"candidates": []}"#)
      .create_async()
      .await;

    let client = GeminiClient::with_base_url("test-key", server.url());
    let err = client.generate_content("prompt").await.unwrap_err();

    assert!(matches!(err, LlmError::Parse(_)));
  }

  #[test]
  #[serial]
  fn test_from_env_requires_api_key() {
    temp_env::with_var("GEMINI_API_KEY", None::<&str>, || {
      assert!(matches!(GeminiClient::from_env(), Err(LlmError::MissingApiKey)));
    });

    temp_env::with_var("GEMINI_API_KEY", Some("abc123"), || {
      assert!(GeminiClient::from_env().is_ok());
    });
  }
}
