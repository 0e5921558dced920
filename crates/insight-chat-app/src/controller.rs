//! Chat controller: the single owner of session, feature, conversation and
//! staged-input state.
//!
//! Every submission is split into `begin_*` (validate, append the optimistic
//! user message, set busy) and [`ChatController::complete`] (map the reply,
//! clear busy). [`ChatController::dispatch`] runs both halves around a
//! blocking transport call.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use insight_chat_analysis_contract::{AnalysisOutcome, parse_analysis_reply, server_error_message};
use insight_chat_auth::{
    AuthClient, AuthError, AuthStateMachine, AuthTransport, Credentials, login_failure_message,
};
use insight_chat_core::{
    CoreError, DocumentAttachment, Feature, ImageAttachment, InputKind, Message,
    MessageIdGenerator, Role, validate_document_url,
};
use insight_chat_transport::{
    AnalysisRequest, AnalysisTransport, FailureClass, HealthStatus, RawReply, TransportError,
    classify_transport_error,
};
use insight_chat_ui::{UiAuthState, UiState};
use thiserror::Error;

/// System message appended when a request is denied authorization.
pub const AUTH_REQUIRED_MESSAGE: &str = "Authentication required. Please log in again.";

/// System message appended for failures without a server explanation.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Clock returning Unix epoch milliseconds.
pub type Clock = fn() -> u64;

/// Accepted submission waiting for its transport result.
#[derive(Debug)]
#[must_use = "a pending submission leaves the controller busy until completed"]
pub struct PendingSubmission {
    id: u64,
    request: AnalysisRequest,
    epoch: u64,
    session: u64,
}

impl PendingSubmission {
    /// Request to hand to the transport.
    pub fn request(&self) -> &AnalysisRequest {
        &self.request
    }
}

/// Local misuse or validation failures. Nothing is appended or sent.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// No authenticated session.
    #[error("log in before submitting")]
    Unauthenticated,
    /// Another request is outstanding.
    #[error("a request is already in progress")]
    Busy,
    /// No feature selected.
    #[error("select a feature first")]
    NoFeatureSelected,
    /// Selected feature has no input adapter yet.
    #[error("{0} is coming soon")]
    FeatureUnavailable(Feature),
    /// Input does not belong to the selected feature.
    #[error("{expected} input is not accepted while {selected} is selected")]
    FeatureMismatch {
        /// Feature the input belongs to.
        expected: Feature,
        /// Feature currently selected.
        selected: Feature,
    },
    /// Text submit attempted while the document panel is in file mode.
    #[error("switch to text or url mode to submit text")]
    TextModeRequired,
    /// Picked file or typed URL failed validation.
    #[error(transparent)]
    Input(#[from] CoreError),
    /// Picked file could not be read.
    #[error("could not read {path}: {source}")]
    Io {
        /// Path the user picked.
        path: PathBuf,
        /// Underlying read error.
        source: std::io::Error,
    },
}

/// Orchestrates login, feature selection, input adapters and the response
/// mapper over injectable transports.
pub struct ChatController {
    auth_client: AuthClient,
    auth: AuthStateMachine,
    analysis: Arc<dyn AnalysisTransport>,
    ui: UiState,
    ids: MessageIdGenerator,
    clock: Clock,
    // Bumped whenever the conversation is reset, so late replies are dropped.
    epoch: u64,
    // Bumped on login and logout; authorization loss only applies within one session.
    session: u64,
    next_submission: u64,
    in_flight: Option<u64>,
}

impl ChatController {
    /// Creates a controller in the unauthenticated state.
    pub fn new(
        auth_transport: Arc<dyn AuthTransport>,
        analysis: Arc<dyn AnalysisTransport>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            auth_client: AuthClient::new(auth_transport),
            auth: AuthStateMachine::new(),
            analysis,
            ui: UiState::new(version),
            ids: MessageIdGenerator::new(),
            clock: unix_timestamp_millis,
            epoch: 0,
            session: 0,
            next_submission: 0,
            in_flight: None,
        }
    }

    /// Replaces the timestamp source.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// UI state snapshot.
    pub fn state(&self) -> &UiState {
        &self.ui
    }

    /// Session state machine.
    pub fn session(&self) -> &AuthStateMachine {
        &self.auth
    }

    /// Silently asks the server whether the stored cookie is still valid.
    ///
    /// Authenticates only on explicit confirmation and never surfaces an
    /// error on the login form.
    pub fn check_status(&mut self) -> bool {
        match self.auth_client.check_status() {
            Ok(status) => {
                self.auth.on_status_check(&status);
                self.sync_auth_state();
                if self.auth.is_authenticated() {
                    tracing::info!(stage = "auth", action = "session_restored", "session confirmed");
                }
            }
            Err(error) => {
                tracing::debug!(stage = "auth", action = "check_failed", error = %error, "session check failed");
            }
        }
        self.auth.is_authenticated()
    }

    /// Updates the login form fields.
    pub fn set_credentials(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.ui.login.username = username.into();
        self.ui.login.password = password.into();
    }

    /// Submits the login form.
    ///
    /// On success the form is cleared; on failure the form keeps its values
    /// and shows the error.
    ///
    /// # Errors
    /// Returns the [`AuthError`] that caused the failure.
    pub fn login(&mut self) -> Result<(), AuthError> {
        self.ui.login.begin_attempt();
        let credentials = Credentials {
            username: self.ui.login.username.clone(),
            password: self.ui.login.password.clone(),
        };
        tracing::info!(stage = "auth", action = "login_attempt", username = %credentials.username.trim(), "login requested");

        match self.auth_client.login(&credentials) {
            Ok(user) => {
                self.auth.on_login_success(user);
                self.sync_auth_state();
                self.session += 1;
                self.ui.login.succeed();
                tracing::info!(stage = "auth", action = "login_success", "session established");
                Ok(())
            }
            Err(error) => {
                self.ui.login.fail(login_failure_message(&error));
                tracing::warn!(stage = "auth", action = "login_failed", error = %error, "login failed");
                Err(error)
            }
        }
    }

    /// Ends the session. Local state is cleared even if the remote call fails.
    pub fn logout(&mut self) {
        if let Err(error) = self.auth_client.logout() {
            tracing::warn!(stage = "auth", action = "logout_failed", error = %error, "remote logout failed; clearing local session anyway");
        }
        self.auth.logout();
        self.ui.reset_session(UiAuthState::from(self.auth.state()));
        self.ui.login = Default::default();
        self.epoch += 1;
        self.session += 1;
        self.in_flight = None;
        tracing::info!(stage = "auth", action = "logout", "session cleared");
    }

    /// Selects a feature by id. Blank or unknown ids deselect.
    pub fn select_feature(&mut self, feature_id: &str) -> Option<Feature> {
        let feature = Feature::from_id(feature_id);
        self.ui.select_feature(feature);
        self.epoch += 1;
        tracing::debug!(stage = "feature", action = "select", feature = feature.map(Feature::id).unwrap_or("none"), "feature selected");
        feature
    }

    /// Switches the document panel between text, url and file input.
    pub fn set_input_kind(&mut self, kind: InputKind) {
        self.ui.staged.kind = kind;
    }

    /// Replaces the staged text or URL.
    pub fn set_staged_text(&mut self, text: impl Into<String>) {
        self.ui.staged.text = text.into();
    }

    /// Empties the conversation together with staged input and previews.
    pub fn clear_chat(&mut self) {
        self.ui.clear_chat();
        self.epoch += 1;
    }

    /// Probes backend health.
    ///
    /// # Errors
    /// Propagates transport failures.
    pub fn health(&self) -> Result<HealthStatus, TransportError> {
        self.analysis.health()
    }

    /// Reads an image from disk and submits it.
    ///
    /// # Errors
    /// See [`ChatController::begin_image_upload`]; also fails when the file
    /// cannot be read.
    pub fn upload_image(&mut self, path: &Path) -> Result<(), ControllerError> {
        let (file_name, bytes) = read_picked_file(path)?;
        let pending = self.begin_image_upload(file_name, &bytes)?;
        self.dispatch(pending);
        Ok(())
    }

    /// Reads a document from disk and submits it.
    ///
    /// # Errors
    /// See [`ChatController::begin_document_upload`]; also fails when the
    /// file cannot be read.
    pub fn upload_document_file(&mut self, path: &Path) -> Result<(), ControllerError> {
        let (file_name, bytes) = read_picked_file(path)?;
        let pending = self.begin_document_upload(file_name, bytes)?;
        self.dispatch(pending);
        Ok(())
    }

    /// Stages text or a URL and submits it.
    ///
    /// Whitespace-only values are a silent no-op.
    ///
    /// # Errors
    /// See [`ChatController::begin_text_submit`].
    pub fn submit_text(
        &mut self,
        kind: InputKind,
        value: impl Into<String>,
    ) -> Result<(), ControllerError> {
        self.set_input_kind(kind);
        self.set_staged_text(value);
        if let Some(pending) = self.begin_text_submit()? {
            self.dispatch(pending);
        }
        Ok(())
    }

    /// Packages an image, appends the user message with its preview and
    /// marks the controller busy.
    ///
    /// # Errors
    /// Returns a [`ControllerError`] when the session, feature or busy gates
    /// fail or the file is not a supported image. Nothing is appended then.
    pub fn begin_image_upload(
        &mut self,
        file_name: impl Into<String>,
        bytes: &[u8],
    ) -> Result<PendingSubmission, ControllerError> {
        self.ensure_ready(Feature::ImageAnalysis)?;
        let image = ImageAttachment::from_bytes(file_name, bytes)?;

        let message = Message::text(
            self.ids.next_id(),
            Role::User,
            format!("Uploaded image: {}", image.file_name),
            self.now(),
        )
        .with_image(image.clone());
        self.ui.log.append(message);
        self.ui.staged.image = Some(image.clone());

        Ok(self.start(AnalysisRequest::Image(image)))
    }

    /// Packages a document file, appends the user message and marks the
    /// controller busy. The staged file stays staged after submission.
    ///
    /// # Errors
    /// Same gates as [`ChatController::begin_image_upload`], for documents.
    pub fn begin_document_upload(
        &mut self,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<PendingSubmission, ControllerError> {
        self.ensure_ready(Feature::DocumentAnalysis)?;
        let document = DocumentAttachment::from_bytes(file_name, bytes)?;

        let message = Message::text(
            self.ids.next_id(),
            Role::User,
            format!("Uploaded document: {}", document.file_name),
            self.now(),
        );
        self.ui.log.append(message);
        self.ui.staged.document = Some(document.clone());
        self.ui.staged.kind = InputKind::File;

        Ok(self.start(AnalysisRequest::DocumentFile(document)))
    }

    /// Submits the staged text or URL.
    ///
    /// Returns `Ok(None)` without touching anything when the staged value is
    /// empty after trimming.
    ///
    /// # Errors
    /// Returns a [`ControllerError`] for failed gates, file mode, or an
    /// invalid URL. Nothing is appended then.
    pub fn begin_text_submit(&mut self) -> Result<Option<PendingSubmission>, ControllerError> {
        let Some(value) = self.ui.staged.trimmed_text().map(str::to_string) else {
            return Ok(None);
        };
        self.ensure_ready(Feature::DocumentAnalysis)?;

        let (content, request) = match self.ui.staged.kind {
            InputKind::Text => (value.clone(), AnalysisRequest::DocumentText(value)),
            InputKind::Url => {
                let url = validate_document_url(&value)?.to_string();
                (
                    format!("Summarize document at {url}"),
                    AnalysisRequest::DocumentUrl(url),
                )
            }
            InputKind::File => return Err(ControllerError::TextModeRequired),
        };

        let message = Message::text(self.ids.next_id(), Role::User, content, self.now());
        self.ui.log.append(message);
        self.ui.staged.clear_text();

        Ok(Some(self.start(request)))
    }

    /// Sends a pending submission through the analysis transport and maps
    /// the result.
    pub fn dispatch(&mut self, pending: PendingSubmission) {
        let result = self.analysis.analyze(pending.request());
        self.complete(pending, result);
    }

    /// Maps a transport result into exactly one system message and clears
    /// busy if this submission is the one outstanding.
    ///
    /// Replies for a conversation that was reset meanwhile are dropped,
    /// except an authorization denial within the same session, which still
    /// revokes it.
    pub fn complete(
        &mut self,
        pending: PendingSubmission,
        result: Result<RawReply, TransportError>,
    ) {
        if self.in_flight == Some(pending.id) {
            self.in_flight = None;
            self.ui.busy = false;
        }

        if pending.epoch != self.epoch {
            match &result {
                Err(error)
                    if pending.session == self.session
                        && classify_transport_error(error) == FailureClass::AuthorizationLost =>
                {
                    let message = self.map_failure(error);
                    self.ui.log.append(message);
                }
                _ => {
                    tracing::debug!(stage = "analysis", action = "stale_reply", kind = pending.request.label(), "dropping reply for a reset conversation");
                }
            }
            return;
        }

        let kind = pending.request.kind();
        if matches!(pending.request, AnalysisRequest::Image(_)) {
            self.ui.staged.image = None;
        }

        let message = match result {
            Ok(reply) => match parse_analysis_reply(kind, &reply.body) {
                Ok(AnalysisOutcome::Completed { text, source }) => {
                    tracing::info!(stage = "analysis", action = "completed", kind = pending.request.label(), "analysis completed");
                    Message::text(self.ids.next_id(), Role::System, text, self.now())
                        .with_source(source)
                }
                Ok(AnalysisOutcome::Rejected { error }) => {
                    tracing::warn!(stage = "analysis", action = "rejected", error = %error, "backend reported failure");
                    Message::error(self.ids.next_id(), error, self.now())
                }
                Err(error) => {
                    tracing::warn!(stage = "analysis", action = "undecodable", error = %error, "reply violated contract");
                    Message::error(self.ids.next_id(), GENERIC_FAILURE_MESSAGE, self.now())
                }
            },
            Err(error) => self.map_failure(&error),
        };
        self.ui.log.append(message);
    }

    fn map_failure(&mut self, error: &TransportError) -> Message {
        match classify_transport_error(error) {
            FailureClass::AuthorizationLost => {
                tracing::warn!(stage = "analysis", action = "authorization_lost", "request denied; session revoked");
                self.auth.on_authorization_lost();
                self.sync_auth_state();
                Message::error(self.ids.next_id(), AUTH_REQUIRED_MESSAGE, self.now())
            }
            FailureClass::Remote | FailureClass::Network => {
                tracing::warn!(stage = "analysis", action = "failed", error = %error, "analysis request failed");
                let text = match error {
                    TransportError::Status { body, .. } => server_error_message(body),
                    TransportError::Network(_) => None,
                }
                .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());
                Message::error(self.ids.next_id(), text, self.now())
            }
        }
    }

    fn sync_auth_state(&mut self) {
        self.ui.auth = UiAuthState::from(self.auth.state());
    }

    fn ensure_ready(&self, expected: Feature) -> Result<(), ControllerError> {
        if !self.auth.is_authenticated() {
            return Err(ControllerError::Unauthenticated);
        }
        if self.ui.busy {
            return Err(ControllerError::Busy);
        }
        let selected = self.ui.feature.ok_or(ControllerError::NoFeatureSelected)?;
        if !selected.is_available() {
            return Err(ControllerError::FeatureUnavailable(selected));
        }
        if selected != expected {
            return Err(ControllerError::FeatureMismatch { expected, selected });
        }
        Ok(())
    }

    fn start(&mut self, request: AnalysisRequest) -> PendingSubmission {
        self.next_submission += 1;
        let id = self.next_submission;
        self.in_flight = Some(id);
        self.ui.busy = true;
        tracing::info!(stage = "analysis", action = "submit", id, kind = request.label(), fingerprint = %request.fingerprint(), "submission started");
        PendingSubmission {
            id,
            request,
            epoch: self.epoch,
            session: self.session,
        }
    }

    fn now(&self) -> u64 {
        (self.clock)()
    }
}

fn read_picked_file(path: &Path) -> Result<(String, Vec<u8>), ControllerError> {
    let bytes = fs::read(path).map_err(|source| ControllerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok((file_name, bytes))
}

/// Current Unix time in milliseconds.
pub fn unix_timestamp_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
