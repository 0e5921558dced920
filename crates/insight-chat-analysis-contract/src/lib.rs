#![warn(missing_docs)]
//! # insight-chat-analysis-contract
//!
//! ## Purpose
//! Defines the analysis backend response schemas and client-side mapping
//! helpers.
//!
//! ## Responsibilities
//! - Parse image (`description`) and document (`summary`) analysis replies.
//! - Split replies into completed results and server-declared failures.
//! - Extract server error strings from non-success HTTP bodies.
//!
//! ## Data flow
//! Raw JSON body -> [`parse_analysis_reply`] -> [`AnalysisOutcome`] ->
//! controller appends one system message.
//!
//! ## Ownership and lifetimes
//! Parsed values are owned structs to avoid borrowing from transient network
//! buffers.
//!
//! ## Error model
//! Invalid JSON or a success reply missing its text return
//! [`AnalysisContractError`]; the controller maps those to the generic
//! failure message.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fallback text when a failure reply carries no reason.
pub const REMOTE_FAILURE_FALLBACK: &str = "The analysis service could not process this request.";

/// Which analysis endpoint produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisKind {
    /// `POST /analyze-image`.
    Image,
    /// `POST /analyze-document`.
    Document,
}

/// `POST /analyze-image` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAnalysisResponse {
    /// Whether analysis succeeded.
    pub success: bool,
    /// Detailed description on success.
    #[serde(default)]
    pub description: Option<String>,
    /// Failure reason.
    #[serde(default)]
    pub error: Option<String>,
    /// Model that produced the description.
    #[serde(default)]
    pub model_used: Option<String>,
}

/// `POST /analyze-document` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentAnalysisResponse {
    /// Whether analysis succeeded.
    pub success: bool,
    /// Summary on success.
    #[serde(default)]
    pub summary: Option<String>,
    /// Failure reason.
    #[serde(default)]
    pub error: Option<String>,
    /// Where the content came from (`PDF`, `DOCX`, `URL`, `Text`, ...).
    #[serde(default)]
    pub source_type: Option<String>,
    /// Extracted content length in characters.
    #[serde(default)]
    pub content_length: Option<u64>,
}

/// Minimal body shape for error replies.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// Mapped result of one analysis reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    /// Backend returned a description or summary.
    Completed {
        /// Description or summary text.
        text: String,
        /// Display annotation (model or source type).
        source: Option<String>,
    },
    /// Backend reported `success: false`.
    Rejected {
        /// Server-provided error text.
        error: String,
    },
}

/// Parses a raw reply body for the given endpoint.
///
/// # Errors
/// Returns [`AnalysisContractError::Decode`] for invalid JSON, and
/// [`AnalysisContractError::InvalidContract`] when a success reply carries a
/// blank description/summary.
pub fn parse_analysis_reply(
    kind: AnalysisKind,
    raw: &str,
) -> Result<AnalysisOutcome, AnalysisContractError> {
    match kind {
        AnalysisKind::Image => {
            let parsed: ImageAnalysisResponse = serde_json::from_str(raw)?;
            let source = parsed.model_used.filter(|model| !model.trim().is_empty());
            outcome(parsed.success, parsed.description, parsed.error, source, "description")
        }
        AnalysisKind::Document => {
            let parsed: DocumentAnalysisResponse = serde_json::from_str(raw)?;
            let source = parsed.source_type.filter(|source| !source.trim().is_empty());
            outcome(parsed.success, parsed.summary, parsed.error, source, "summary")
        }
    }
}

fn outcome(
    success: bool,
    text: Option<String>,
    error: Option<String>,
    source: Option<String>,
    field: &str,
) -> Result<AnalysisOutcome, AnalysisContractError> {
    if !success {
        return Ok(AnalysisOutcome::Rejected {
            error: non_blank(error).unwrap_or_else(|| REMOTE_FAILURE_FALLBACK.to_string()),
        });
    }

    let text = non_blank(text)
        .ok_or_else(|| AnalysisContractError::InvalidContract(format!("{field} is empty")))?;
    Ok(AnalysisOutcome::Completed { text, source })
}

/// Extracts the server `error` string from an error reply body, if any.
pub fn server_error_message(raw: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(raw)
        .ok()
        .and_then(|body| non_blank(body.error))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// Analysis contract errors.
#[derive(Debug, Error)]
pub enum AnalysisContractError {
    /// JSON decode failure.
    #[error("analysis decode failure: {0}")]
    Decode(#[from] serde_json::Error),
    /// Parsed payload violates contract invariants.
    #[error("analysis contract violation: {0}")]
    InvalidContract(String),
}
