#![warn(missing_docs)]
//! # insight-chat-transport
//!
//! ## Purpose
//! Carries staged input to the analysis backend over HTTP.
//!
//! ## Responsibilities
//! - Model one analysis submission as an [`AnalysisRequest`].
//! - Define the [`AnalysisTransport`] seam used by the controller.
//! - Classify failed calls into authorization loss, remote and network
//!   failures.
//! - Provide [`HttpApi`], a `reqwest` implementation of both
//!   [`AnalysisTransport`] and [`AuthTransport`] sharing one cookie jar.
//!
//! ## Data flow
//! Controller builds [`AnalysisRequest`] -> [`AnalysisTransport::analyze`]
//! -> [`RawReply`] on 2xx or [`TransportError`] otherwise ->
//! [`classify_transport_error`] picks the conversation mapping.
//!
//! ## Error model
//! Non-2xx statuses keep their body in [`TransportError::Status`] so the
//! caller can quote the server error string. Connection-level failures become
//! [`TransportError::Network`]. Nothing is retried.
//!
//! ## Security and privacy notes
//! Request bodies are never logged. Submissions are identified in logs by a
//! short SHA-256 [`AnalysisRequest::fingerprint`].

use std::fmt;
use std::time::Duration;

use insight_chat_analysis_contract::AnalysisKind;
use insight_chat_auth::{
    AuthError, AuthStatusResponse, AuthTransport, LoginRequest, LoginResponse, endpoint_url,
};
use insight_chat_core::{DocumentAttachment, ImageAttachment};
use reqwest::blocking::{Client, RequestBuilder, multipart};
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

/// Number of hex characters kept from the content digest.
const FINGERPRINT_LEN: usize = 12;

/// One analysis submission.
#[derive(Clone, PartialEq, Eq)]
pub enum AnalysisRequest {
    /// Image sent as a JSON data URL.
    Image(ImageAttachment),
    /// Document sent as multipart field `file`.
    DocumentFile(DocumentAttachment),
    /// Document URL sent as JSON `{url}`.
    DocumentUrl(String),
    /// Raw text sent as JSON `{text}`.
    DocumentText(String),
}

impl AnalysisRequest {
    /// Endpoint family this request targets.
    pub fn kind(&self) -> AnalysisKind {
        match self {
            AnalysisRequest::Image(_) => AnalysisKind::Image,
            _ => AnalysisKind::Document,
        }
    }

    /// Endpoint path relative to the API base URL.
    pub fn endpoint_path(&self) -> &'static str {
        match self.kind() {
            AnalysisKind::Image => "analyze-image",
            AnalysisKind::Document => "analyze-document",
        }
    }

    /// Short label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            AnalysisRequest::Image(_) => "image",
            AnalysisRequest::DocumentFile(_) => "document_file",
            AnalysisRequest::DocumentUrl(_) => "document_url",
            AnalysisRequest::DocumentText(_) => "document_text",
        }
    }

    /// Log-safe content fingerprint (truncated SHA-256 hex).
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.label().as_bytes());
        match self {
            AnalysisRequest::Image(image) => hasher.update(image.data_url.as_bytes()),
            AnalysisRequest::DocumentFile(document) => {
                hasher.update(document.file_name.as_bytes());
                hasher.update(&document.bytes);
            }
            AnalysisRequest::DocumentUrl(value) | AnalysisRequest::DocumentText(value) => {
                hasher.update(value.as_bytes())
            }
        }
        let mut digest = hex::encode(hasher.finalize());
        digest.truncate(FINGERPRINT_LEN);
        digest
    }
}

impl fmt::Debug for AnalysisRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisRequest")
            .field("kind", &self.label())
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

/// Successful (2xx) reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReply {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

/// `GET /health` response body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    /// Service status string, `healthy` when up.
    pub status: String,
    /// Informational message.
    #[serde(default)]
    pub message: Option<String>,
}

/// Abstract transport used by the chat controller for analysis calls.
pub trait AnalysisTransport: Send + Sync {
    /// Sends one analysis request.
    ///
    /// # Errors
    /// Returns [`TransportError::Status`] for non-2xx replies and
    /// [`TransportError::Network`] when no reply was received.
    fn analyze(&self, request: &AnalysisRequest) -> Result<RawReply, TransportError>;

    /// Probes `GET /health`.
    ///
    /// # Errors
    /// Same classification as [`AnalysisTransport::analyze`].
    fn health(&self) -> Result<HealthStatus, TransportError>;
}

/// Failure bucket used to pick the conversation mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// 401/403: the session is gone; force logout.
    AuthorizationLost,
    /// Server answered with another non-success status.
    Remote,
    /// No usable reply.
    Network,
}

/// Classifies transport failures.
pub fn classify_transport_error(error: &TransportError) -> FailureClass {
    match error {
        TransportError::Status { status: 401 | 403, .. } => FailureClass::AuthorizationLost,
        TransportError::Status { .. } => FailureClass::Remote,
        TransportError::Network(_) => FailureClass::Network,
    }
}

/// Transport errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Server replied with a non-success status.
    #[error("server replied with status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body, possibly carrying an `error` string.
        body: String,
    },
    /// Request never produced a reply.
    #[error("network failure: {0}")]
    Network(String),
}

/// `reqwest` blocking client for the analysis API.
///
/// One instance holds the session cookie for every auth and analysis call.
#[derive(Debug, Clone)]
pub struct HttpApi {
    base: Url,
    client: Client,
}

impl HttpApi {
    /// Builds a client with a cookie store and no request timeout.
    ///
    /// # Errors
    /// Returns [`TransportError::Network`] when the TLS backend cannot be
    /// initialised.
    pub fn new(base: Url) -> Result<Self, TransportError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(None::<Duration>)
            .build()
            .map_err(|error| TransportError::Network(error.to_string()))?;
        Ok(Self { base, client })
    }

    /// Configured API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        endpoint_url(&self.base, path)
    }

    fn execute(&self, builder: RequestBuilder) -> Result<RawReply, TransportError> {
        let response = builder
            .send()
            .map_err(|error| TransportError::Network(error.without_url().to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|error| TransportError::Network(error.without_url().to_string()))?;

        if (200..300).contains(&status) {
            Ok(RawReply { status, body })
        } else {
            Err(TransportError::Status { status, body })
        }
    }
}

impl AnalysisTransport for HttpApi {
    fn analyze(&self, request: &AnalysisRequest) -> Result<RawReply, TransportError> {
        let url = self.url(request.endpoint_path());
        tracing::debug!(
            stage = "transport",
            action = "analyze",
            kind = request.label(),
            fingerprint = %request.fingerprint(),
            "sending analysis request"
        );

        let builder = match request {
            AnalysisRequest::Image(image) => self
                .client
                .post(&url)
                .json(&json!({ "image": image.data_url })),
            AnalysisRequest::DocumentFile(document) => {
                let part = multipart::Part::bytes(document.bytes.clone())
                    .file_name(document.file_name.clone());
                self.client
                    .post(&url)
                    .multipart(multipart::Form::new().part("file", part))
            }
            AnalysisRequest::DocumentUrl(value) => {
                self.client.post(&url).json(&json!({ "url": value }))
            }
            AnalysisRequest::DocumentText(value) => {
                self.client.post(&url).json(&json!({ "text": value }))
            }
        };

        let result = self.execute(builder);
        match &result {
            Ok(reply) => tracing::debug!(
                stage = "transport",
                action = "analyze_reply",
                status = reply.status,
                "analysis reply received"
            ),
            Err(error) => tracing::warn!(
                stage = "transport",
                action = "analyze_failed",
                error = %error,
                "analysis request failed"
            ),
        }
        result
    }

    fn health(&self) -> Result<HealthStatus, TransportError> {
        let reply = self.execute(self.client.get(self.url("health")))?;
        serde_json::from_str(&reply.body).map_err(|error| TransportError::Status {
            status: reply.status,
            body: format!("undecodable health body: {error}"),
        })
    }
}

impl AuthTransport for HttpApi {
    fn login(&self, request: &LoginRequest) -> Result<LoginResponse, AuthError> {
        let builder = self.client.post(self.url("login")).json(request);
        let (status, body) = match self.execute(builder) {
            Ok(reply) => (reply.status, reply.body),
            Err(TransportError::Status { status, body }) => (status, body),
            Err(TransportError::Network(message)) => return Err(AuthError::Transport(message)),
        };

        serde_json::from_str(&body).map_err(|_| {
            AuthError::InvalidResponse(format!("login reply with status {status} is not json"))
        })
    }

    fn logout(&self) -> Result<(), AuthError> {
        self.execute(self.client.post(self.url("logout")))
            .map(|_| ())
            .map_err(|error| AuthError::Transport(error.to_string()))
    }

    fn check_auth(&self) -> Result<AuthStatusResponse, AuthError> {
        let reply = self
            .execute(self.client.get(self.url("check-auth")))
            .map_err(|error| AuthError::Transport(error.to_string()))?;
        serde_json::from_str(&reply.body)
            .map_err(|error| AuthError::InvalidResponse(error.to_string()))
    }
}
