//! Gemini `generateContent` backend for [`CompletionService`].
//!
//! One POST per request. The schema goes into
//! `generationConfig.responseSchema` with `responseMimeType` set to JSON, so
//! the model answers with a bare JSON document in the first candidate's text
//! parts.
//!
//! No retry, no explicit timeout: failures surface as
//! [`GazetteError::ServiceRequest`] or [`GazetteError::ServiceStatus`] and end
//! the run.

use crate::config::ServiceConfig;
use crate::error::GazetteError;
use crate::pipeline::extract::{CompletionRequest, CompletionService};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Longest error body kept in [`GazetteError::ServiceStatus`].
const MAX_ERROR_BODY: usize = 500;

/// Gemini REST client bound to one model.
pub struct GeminiService {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    temperature: Option<f32>,
}

impl std::fmt::Debug for GeminiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiService")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiService {
    /// Validate `config` and build a client.
    ///
    /// Fails with [`GazetteError::MissingCredential`] before anything touches
    /// the network when the key is absent.
    pub fn new(config: &ServiceConfig) -> Result<Self, GazetteError> {
        let api_key = config.validate()?.to_string();
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| GazetteError::InvalidConfig(format!("HTTP client: {e}")))?;
        let endpoint = format!(
            "{}/models/{}:generateContent",
            config.api_base.trim_end_matches('/'),
            config.model
        );
        Ok(Self {
            client,
            api_key,
            endpoint,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    /// Full URL requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body<'a>(&self, request: &'a CompletionRequest) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![TextPart {
                    text: &request.instruction,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![TextPart {
                    text: &request.user_text,
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: &request.response_schema,
                temperature: self.temperature,
            },
        }
    }
}

#[async_trait]
impl CompletionService for GeminiService {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Option<String>, GazetteError> {
        let body = self.request_body(request);
        debug!("POST {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GazetteError::ServiceRequest {
                reason: e.to_string(),
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GazetteError::ServiceRequest {
                reason: format!("reading response body: {e}"),
            })?;

        if !status.is_success() {
            return Err(GazetteError::ServiceStatus {
                status: status.as_u16(),
                body: truncate(&text, MAX_ERROR_BODY),
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text).map_err(|e| {
            GazetteError::malformed(format!("service envelope is not valid JSON: {e}"))
        })?;

        if let Some(reason) = parsed
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Err(GazetteError::ServiceRequest {
                reason: format!("prompt blocked by the service ({reason})"),
            });
        }

        let answer = parsed.first_text();
        if let Some(ref t) = answer {
            debug!("Received {} chars of JSON", t.len());
        }
        Ok(answer)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}\u{2026}", &s[..end])
}

// ── Wire types ────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<TextPart<'a>>,
}

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate, if any text exists.
    fn first_text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}
