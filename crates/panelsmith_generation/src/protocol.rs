//! Single-retry structured generation.
//!
//! Every model-backed task goes through [`generate_structured`]: one call,
//! parse and validate, and on failure exactly one more call with a fix
//! prompt that shows the model its own output and what was wrong with it.

use derive_builder::Builder;
use panelsmith_core::{ChatRequest, ChatResponse, JsonKind, Message, TokenUsage};
use panelsmith_error::{ExtractionError, PanelsmithError, PanelsmithResult, ValidationError};
use panelsmith_extraction::parse_json_from_text;
use panelsmith_interface::{Contract, ModelDriver};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};

/// Prompts for one structured generation.
///
/// # Examples
///
/// ```
/// use panelsmith_generation::StructuredRequest;
///
/// let request = StructuredRequest::builder()
///     .system_prompt("Reply with JSON.")
///     .user_prompt("Design the sound for scene 3.")
///     .build()
///     .unwrap();
/// assert!(request.fix_system_prompt.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(setter(into))]
pub struct StructuredRequest {
    /// System prompt of the first attempt
    pub system_prompt: String,
    /// User prompt of the first attempt
    pub user_prompt: String,
    /// System prompt of the fix attempt; the task system prompt when absent
    #[builder(default, setter(strip_option))]
    pub fix_system_prompt: Option<String>,
    /// Output token limit for both attempts
    #[builder(default, setter(strip_option))]
    pub max_tokens: Option<u32>,
}

impl StructuredRequest {
    /// Create a builder.
    pub fn builder() -> StructuredRequestBuilder {
        StructuredRequestBuilder::default()
    }
}

/// How an attempt ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// Parsed and valid
    Accepted,
    /// No JSON of the expected kind could be recovered
    ExtractionFailed {
        /// Extraction failure message
        reason: String,
    },
    /// Parsed but violated the contract
    ValidationFailed {
        /// One entry per violation
        issues: Vec<String>,
    },
}

/// Record of one model call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationAttempt {
    /// 1 or 2
    pub attempt_number: u8,
    /// User prompt sent
    pub prompt: String,
    /// Raw model reply
    pub raw_output: String,
    /// JSON text recovered from the reply, if any
    pub extraction: Option<String>,
    /// Verdict
    pub validation: AttemptOutcome,
    /// Usage of this call
    pub token_usage: Option<TokenUsage>,
}

/// A validated artifact with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredOutput<T> {
    /// The artifact
    pub artifact: T,
    /// JSON text the artifact was parsed from
    pub extracted_json: String,
    /// Usage summed over both attempts
    pub token_usage: Option<TokenUsage>,
    /// One or two attempts
    pub attempts: Vec<GenerationAttempt>,
    /// Whether the fix attempt produced the artifact
    pub fixed: bool,
}

/// Why a reply was rejected.
enum Rejection {
    Extraction(ExtractionError),
    Validation(ValidationError),
}

impl Rejection {
    fn reason(&self) -> String {
        match self {
            Rejection::Extraction(e) => e.kind().to_string(),
            Rejection::Validation(e) => e.summary(),
        }
    }

    fn outcome(&self) -> AttemptOutcome {
        match self {
            Rejection::Extraction(e) => AttemptOutcome::ExtractionFailed {
                reason: e.kind().to_string(),
            },
            Rejection::Validation(e) => AttemptOutcome::ValidationFailed {
                issues: e.issues.clone(),
            },
        }
    }

    fn into_error(self) -> PanelsmithError {
        match self {
            Rejection::Extraction(e) => e.into(),
            Rejection::Validation(e) => e.into(),
        }
    }
}

struct Evaluation<T> {
    artifact: T,
    extracted_json: String,
}

fn evaluate<C: Contract>(
    contract: &C,
    raw: &str,
) -> (Option<String>, Result<Evaluation<C::Output>, Rejection>) {
    let parsed = match parse_json_from_text(raw, Some(contract.expected_kind())) {
        Ok(parsed) => parsed,
        Err(e) => return (None, Err(Rejection::Extraction(e))),
    };
    let extraction = Some(parsed.extracted_json.clone());
    match contract.validate(&parsed.json) {
        Ok(artifact) => (
            extraction,
            Ok(Evaluation {
                artifact,
                extracted_json: parsed.extracted_json,
            }),
        ),
        Err(issues) => (
            extraction,
            Err(Rejection::Validation(ValidationError::new(
                contract.name(),
                issues,
            ))),
        ),
    }
}

/// Build the second-attempt user prompt.
///
/// The raw output is embedded unchanged between `<<<` and `>>>`.
pub fn build_fix_prompt(reason: &str, raw_output: &str, kind: JsonKind, hint: Option<&str>) -> String {
    let mut lines = vec![
        "Your previous output could not be used.".to_string(),
        format!("Reason: {}", reason),
        String::new(),
        "Requirements:".to_string(),
        format!("1. Output exactly one JSON {}, nothing else", kind),
        "2. No Markdown, code fences or commentary".to_string(),
        "3. Keep every field name in English".to_string(),
    ];
    if let Some(hint) = hint {
        lines.push(format!("4. {}", hint));
    }
    lines.extend([
        String::new(),
        "Original output:".to_string(),
        "<<<".to_string(),
        raw_output.to_string(),
        ">>>".to_string(),
        String::new(),
        "Output only the corrected JSON:".to_string(),
    ]);
    lines.join("\n")
}

async fn call(
    driver: &dyn ModelDriver,
    system: &str,
    user: &str,
    max_tokens: Option<u32>,
) -> PanelsmithResult<ChatResponse> {
    let request = ChatRequest {
        messages: vec![Message::system(system), Message::user(user)],
        max_tokens,
        ..Default::default()
    };
    driver.invoke(&request).await
}

/// Generate one artifact with at most two model calls.
///
/// # Errors
///
/// - Upstream errors from either call propagate immediately.
/// - When the fix attempt is also rejected, its extraction or validation
///   error is returned.
#[instrument(skip_all, fields(contract = contract.name(), provider = driver.provider_name()))]
pub async fn generate_structured<C: Contract>(
    driver: &dyn ModelDriver,
    contract: &C,
    request: &StructuredRequest,
) -> PanelsmithResult<StructuredOutput<C::Output>> {
    let first = call(
        driver,
        &request.system_prompt,
        &request.user_prompt,
        request.max_tokens,
    )
    .await?;

    let (extraction, verdict) = evaluate(contract, &first.content);
    let rejection = match verdict {
        Ok(evaluation) => {
            debug!(attempt = 1, "Output accepted");
            return Ok(StructuredOutput {
                artifact: evaluation.artifact,
                extracted_json: evaluation.extracted_json,
                token_usage: first.token_usage,
                attempts: vec![GenerationAttempt {
                    attempt_number: 1,
                    prompt: request.user_prompt.clone(),
                    raw_output: first.content,
                    extraction,
                    validation: AttemptOutcome::Accepted,
                    token_usage: first.token_usage,
                }],
                fixed: false,
            });
        }
        Err(rejection) => rejection,
    };

    let reason = rejection.reason();
    warn!(attempt = 1, reason = %reason, "Output rejected, sending fix prompt");
    let fix_prompt = build_fix_prompt(
        &reason,
        &first.content,
        contract.expected_kind(),
        contract.fix_hint().as_deref(),
    );
    let mut attempts = vec![GenerationAttempt {
        attempt_number: 1,
        prompt: request.user_prompt.clone(),
        raw_output: first.content,
        extraction,
        validation: rejection.outcome(),
        token_usage: first.token_usage,
    }];

    let fix_system = request
        .fix_system_prompt
        .as_deref()
        .unwrap_or(&request.system_prompt);
    let second = call(driver, fix_system, &fix_prompt, request.max_tokens).await?;
    let token_usage = TokenUsage::merge(first.token_usage, second.token_usage);

    let (extraction, verdict) = evaluate(contract, &second.content);
    match verdict {
        Ok(evaluation) => {
            debug!(attempt = 2, "Fixed output accepted");
            attempts.push(GenerationAttempt {
                attempt_number: 2,
                prompt: fix_prompt,
                raw_output: second.content,
                extraction,
                validation: AttemptOutcome::Accepted,
                token_usage: second.token_usage,
            });
            Ok(StructuredOutput {
                artifact: evaluation.artifact,
                extracted_json: evaluation.extracted_json,
                token_usage,
                attempts,
                fixed: true,
            })
        }
        Err(rejection) => {
            error!(attempt = 2, reason = %rejection.reason(), "Fix attempt rejected");
            Err(rejection.into_error())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_prompt_embeds_raw_output_verbatim() {
        let raw = "  Sure! {\"cues\": [}\n";
        let prompt = build_fix_prompt(
            "Mismatched brackets",
            raw,
            JsonKind::Object,
            Some("cues must not be empty"),
        );

        assert!(prompt.contains("Reason: Mismatched brackets"));
        assert!(prompt.contains(&format!("<<<\n{}\n>>>", raw)));
        assert!(prompt.contains("exactly one JSON object"));
        assert!(prompt.contains("4. cues must not be empty"));
    }
}
