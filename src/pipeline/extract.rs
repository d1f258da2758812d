//! Structured extraction: page text → normalized [`AnalysisResult`].
//!
//! The remote model sits behind the [`CompletionService`] trait. The
//! extractor builds one [`CompletionRequest`] (instruction, schema and the
//! page-marked text), makes exactly one call, and normalizes whatever comes
//! back. There is no retry: a failed call or an unusable answer fails the run.
//!
//! ## Normalization vs. validation
//!
//! Normalization fills gaps the model is known to leave: a missing or `null`
//! list becomes empty, a missing or blank date becomes
//! [`GAZETTE_DATE_FALLBACK`]. Anything that *is* present must match the typed
//! model; a wrong type, a missing sub-field or a relevance outside the four
//! allowed values is a [`GazetteError::MalformedResponse`].

use crate::error::GazetteError;
use crate::model::{AnalysisResult, Appointment, Norm, PageText, GAZETTE_DATE_FALLBACK};
use crate::pipeline::schema::analysis_response_schema;
use crate::prompts::{user_message, EXTRACTION_INSTRUCTION, INSTRUCTION_VERSION};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One schema-constrained completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System instruction describing the extraction duties.
    pub instruction: String,
    /// User turn: prefix plus page-marked document text.
    pub user_text: String,
    /// JSON schema the answer must follow.
    pub response_schema: Value,
}

/// A remote service that answers a [`CompletionRequest`] with JSON text.
///
/// Implementations return the raw text of the answer; parsing and
/// normalization stay in [`SchemaExtractor`] so every backend gets the same
/// treatment.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Perform the call. `Ok(None)` means the service answered but produced
    /// no text.
    async fn complete(&self, request: &CompletionRequest) -> Result<Option<String>, GazetteError>;
}

/// Build the request for `pages`.
pub fn build_request(pages: &[PageText]) -> CompletionRequest {
    CompletionRequest {
        instruction: EXTRACTION_INSTRUCTION.to_string(),
        user_text: user_message(pages),
        response_schema: analysis_response_schema(),
    }
}

/// Sends page text to a [`CompletionService`] and normalizes the answer.
#[derive(Clone)]
pub struct SchemaExtractor {
    service: Arc<dyn CompletionService>,
}

impl SchemaExtractor {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self { service }
    }

    /// Run one extraction over `pages`.
    pub async fn extract(&self, pages: &[PageText]) -> Result<AnalysisResult, GazetteError> {
        if pages.is_empty() {
            warn!("Extracting from a document with no non-empty pages");
        }
        let request = build_request(pages);
        info!(
            "Requesting extraction from {} ({} pages, {} chars, instruction {})",
            self.service.name(),
            pages.len(),
            request.user_text.len(),
            INSTRUCTION_VERSION
        );

        let text = self.service.complete(&request).await?;
        let result = match text {
            Some(t) => normalize_response(&t, pages)?,
            None => {
                warn!("Completion service returned no text; treating it as an empty object");
                normalize_response("{}", pages)?
            }
        };

        info!(
            "Extracted {} norms, {} designated, {} concluded (gazette date: {})",
            result.norms.len(),
            result.designated_appointments.len(),
            result.concluded_appointments.len(),
            result.gazette_date
        );
        Ok(result)
    }
}

static RE_JSON_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```(?:json|JSON)?\s*\n(.*?)\n?```\s*$").expect("static regex is valid")
});

/// Remove a Markdown code fence wrapped around the whole answer.
fn strip_json_fences(input: &str) -> &str {
    let trimmed = input.trim();
    match RE_JSON_FENCE.captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => trimmed,
    }
}

/// Parse and normalize the raw answer text.
///
/// `pages` is only used to warn about norms pointing at pages that were not
/// part of the request.
pub fn normalize_response(text: &str, pages: &[PageText]) -> Result<AnalysisResult, GazetteError> {
    let body = strip_json_fences(text);
    let value: Value = serde_json::from_str(body)
        .map_err(|e| GazetteError::malformed(format!("response is not valid JSON: {e}")))?;

    let mut obj = match value {
        Value::Object(obj) => obj,
        other => {
            return Err(GazetteError::malformed(format!(
                "expected a JSON object at the top level, got {}",
                json_kind(&other)
            )))
        }
    };

    let gazette_date = take_gazette_date(&mut obj)?;
    let norms: Vec<Norm> = take_list(&mut obj, "norms")?;
    let designated_appointments: Vec<Appointment> = take_list(&mut obj, "designatedAppointments")?;
    let concluded_appointments: Vec<Appointment> = take_list(&mut obj, "concludedAppointments")?;

    if !obj.is_empty() {
        debug!(
            "Ignoring unexpected response fields: {:?}",
            obj.keys().collect::<Vec<_>>()
        );
    }

    let known: HashSet<u32> = pages.iter().map(|p| p.page_number).collect();
    for norm in &norms {
        if !known.contains(&norm.page_number) {
            warn!(
                "Norm '{}' reports page {} which was not in the request",
                norm.norm_id, norm.page_number
            );
        }
    }

    Ok(AnalysisResult {
        gazette_date,
        norms,
        designated_appointments,
        concluded_appointments,
    })
}

fn take_gazette_date(obj: &mut Map<String, Value>) -> Result<String, GazetteError> {
    match obj.remove("gazetteDate") {
        None | Some(Value::Null) => Ok(GAZETTE_DATE_FALLBACK.to_string()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(GAZETTE_DATE_FALLBACK.to_string()),
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(other) => Err(GazetteError::malformed(format!(
            "gazetteDate must be a string, got {}",
            json_kind(&other)
        ))),
    }
}

fn take_list<T: DeserializeOwned>(
    obj: &mut Map<String, Value>,
    field: &str,
) -> Result<Vec<T>, GazetteError> {
    match obj.remove(field) {
        None | Some(Value::Null) => {
            debug!("Field {field} missing from response; using an empty list");
            Ok(Vec::new())
        }
        Some(value @ Value::Array(_)) => serde_json::from_value(value)
            .map_err(|e| GazetteError::malformed(format!("invalid entry in {field}: {e}"))),
        Some(other) => Err(GazetteError::malformed(format!(
            "{field} must be an array, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
