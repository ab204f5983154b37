//! Supervisor decisions: the closed set of verdicts, the tolerant parser that
//! turns raw completion text into one, and the pure routing/finalizing
//! functions the workflow dispatches on.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

const FENCE_OPEN: &str = "```json";
const FENCE_CLOSE: &str = "```";
const FALLBACK_PREFIX: &str = "Sorry, there was a problem processing the answer.";

/// The supervisor's verdict on a draft answer. Exactly one variant per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SupervisorDecision {
    FinalAnswer {
        answer: String,
    },
    CorrectAndRefine {
        reasoning: String,
        corrected_answer: String,
    },
    ComplementWithWikipedia {
        reasoning: String,
        search_query: String,
    },
}

impl SupervisorDecision {
    pub fn kind(&self) -> &'static str {
        match self {
            SupervisorDecision::FinalAnswer { .. } => "FinalAnswer",
            SupervisorDecision::CorrectAndRefine { .. } => "CorrectAndRefine",
            SupervisorDecision::ComplementWithWikipedia { .. } => "ComplementWithWikipedia",
        }
    }

    pub fn reasoning(&self) -> Option<&str> {
        match self {
            SupervisorDecision::FinalAnswer { .. } => None,
            SupervisorDecision::CorrectAndRefine { reasoning, .. }
            | SupervisorDecision::ComplementWithWikipedia { reasoning, .. } => Some(reasoning),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecisionError {
    #[error("response is not valid JSON: {0}")]
    Decode(String),
    #[error("invalid data for {variant}: {reason}")]
    Validation {
        variant: &'static str,
        reason: String,
    },
    #[error("unrecognized decision type: {0}")]
    UnrecognizedVariant(String),
}

#[derive(Deserialize)]
struct FinalAnswerData {
    answer: String,
}

#[derive(Deserialize)]
struct CorrectAndRefineData {
    reasoning: String,
    corrected_answer: String,
}

#[derive(Deserialize)]
struct ComplementWithWikipediaData {
    reasoning: String,
    search_query: String,
}

/// Removes a surrounding ```` ```json ```` fence. Text that is not wrapped in
/// exactly those markers is returned trimmed but otherwise untouched.
pub fn strip_code_fence(raw: &str) -> &str {
    let text = raw.trim();
    if text.len() >= FENCE_OPEN.len() + FENCE_CLOSE.len()
        && text.starts_with(FENCE_OPEN)
        && text.ends_with(FENCE_CLOSE)
    {
        text[FENCE_OPEN.len()..text.len() - FENCE_CLOSE.len()].trim()
    } else {
        text
    }
}

pub fn parse_decision(raw: &str) -> Result<SupervisorDecision, DecisionError> {
    let text = strip_code_fence(raw);
    let value: Value =
        serde_json::from_str(text).map_err(|e| DecisionError::Decode(e.to_string()))?;
    if !value.is_object() {
        return Err(DecisionError::Decode("expected a JSON object".to_string()));
    }

    let kind = match value.get("type") {
        Some(Value::String(kind)) => kind.as_str(),
        Some(other) => return Err(DecisionError::UnrecognizedVariant(other.to_string())),
        None => return Err(DecisionError::UnrecognizedVariant("(missing)".to_string())),
    };
    let data = value.get("data").cloned().unwrap_or(Value::Null);

    match kind {
        "FinalAnswer" => {
            let d: FinalAnswerData = variant_data("FinalAnswer", data)?;
            Ok(SupervisorDecision::FinalAnswer { answer: d.answer })
        }
        "CorrectAndRefine" => {
            let d: CorrectAndRefineData = variant_data("CorrectAndRefine", data)?;
            Ok(SupervisorDecision::CorrectAndRefine {
                reasoning: d.reasoning,
                corrected_answer: d.corrected_answer,
            })
        }
        "ComplementWithWikipedia" => {
            let d: ComplementWithWikipediaData = variant_data("ComplementWithWikipedia", data)?;
            Ok(SupervisorDecision::ComplementWithWikipedia {
                reasoning: d.reasoning,
                search_query: d.search_query,
            })
        }
        other => Err(DecisionError::UnrecognizedVariant(other.to_string())),
    }
}

fn variant_data<T: serde::de::DeserializeOwned>(
    variant: &'static str,
    data: Value,
) -> Result<T, DecisionError> {
    serde_json::from_value(data).map_err(|e| DecisionError::Validation {
        variant,
        reason: e.to_string(),
    })
}

/// Replacement decision for a supervisor reply that could not be used.
pub fn fallback_decision(error: &DecisionError, draft: &str) -> SupervisorDecision {
    let note = match error {
        DecisionError::Decode(_) => "The model did not return valid JSON.".to_string(),
        DecisionError::UnrecognizedVariant(kind) => {
            format!("Unrecognized decision type: {}.", kind)
        }
        DecisionError::Validation { .. } => format!("Validation error: {}.", error),
    };
    SupervisorDecision::FinalAnswer {
        answer: format!("{} {} Original answer: {}", FALLBACK_PREFIX, note, draft),
    }
}

/// Total over any input: a usable decision or its fallback.
pub fn decide(raw: &str, draft: &str) -> SupervisorDecision {
    match parse_decision(raw) {
        Ok(decision) => decision,
        Err(err) => {
            tracing::warn!(error = %err, raw = %raw, "Supervisor reply rejected, using fallback");
            fallback_decision(&err, draft)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionRoute {
    Enrich,
    Finalize,
}

impl DecisionRoute {
    /// Edge label in the workflow graph.
    pub fn as_str(self) -> &'static str {
        match self {
            DecisionRoute::Enrich => "enrich_with_wikipedia",
            DecisionRoute::Finalize => "prepare_final_response",
        }
    }
}

pub fn route_decision(decision: &SupervisorDecision) -> DecisionRoute {
    match decision {
        SupervisorDecision::ComplementWithWikipedia { .. } => DecisionRoute::Enrich,
        SupervisorDecision::FinalAnswer { .. } | SupervisorDecision::CorrectAndRefine { .. } => {
            DecisionRoute::Finalize
        }
    }
}

/// User-facing text of a terminal decision. `None` for a decision that
/// still needs enrichment.
pub fn finalize_text(decision: &SupervisorDecision) -> Option<&str> {
    match decision {
        SupervisorDecision::FinalAnswer { answer } => Some(answer),
        SupervisorDecision::CorrectAndRefine {
            corrected_answer, ..
        } => Some(corrected_answer),
        SupervisorDecision::ComplementWithWikipedia { .. } => None,
    }
}
