#![warn(missing_docs)]
//! # insight-chat-ui
//!
//! ## Purpose
//! Defines the UI-facing state model for `insight-chat`.
//!
//! ## Responsibilities
//! - Hold the login form, selected feature, conversation log, staged input
//!   and busy flag.
//! - Project the selected feature into the input panel that should be shown.
//! - Expose guard checks for whether uploads and text submits are allowed.
//! - Render the transcript top to bottom with a trailing busy indicator.
//!
//! ## Data flow
//! Controller events mutate [`UiState`], which drives what the front-end
//! draws through [`UiState::panel`] and [`render_transcript`].
//!
//! ## Ownership and lifetimes
//! `UiState` owns all strings, messages and attachments to keep event
//! reducers simple.
//!
//! ## Error model
//! This crate favors explicit state over recoverable errors. Invalid
//! combinations are prevented by guard methods.
//!
//! ## Security and privacy notes
//! The login form holds the password only until the next successful login or
//! logout; the transcript never renders it.

use insight_chat_auth::AuthState;
use insight_chat_core::{ConversationLog, Feature, InputKind, Role, StagedInput};

/// Prompt shown when no feature is selected.
pub const EMPTY_STATE_PROMPT: &str = "Select a feature to get started.";

/// Line appended to the transcript while a request is outstanding.
pub const BUSY_INDICATOR: &str = "... analyzing";

/// Username label on the terminal login prompt.
pub const USERNAME_PROMPT: &str = "username: ";

/// Password label on the terminal login prompt; input is not masked.
pub const PASSWORD_PROMPT: &str = "password (input is echoed): ";

/// UI-auth state projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAuthState {
    /// User is not authenticated.
    Unauthenticated,
    /// Valid authenticated session.
    Authenticated,
    /// Session was revoked mid-use and requires a new login.
    ReauthRequired,
}

impl From<&AuthState> for UiAuthState {
    fn from(state: &AuthState) -> Self {
        match state {
            AuthState::Unauthenticated => UiAuthState::Unauthenticated,
            AuthState::Authenticated(_) => UiAuthState::Authenticated,
            AuthState::ReauthRequired => UiAuthState::ReauthRequired,
        }
    }
}

/// Transient credential fields backing the login prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    /// Entered username.
    pub username: String,
    /// Entered password.
    pub password: String,
    /// Inline error shown under the form.
    pub error: Option<String>,
    /// Login request in flight.
    pub busy: bool,
}

impl LoginForm {
    /// Starts a login attempt: clears the prior error and sets busy.
    pub fn begin_attempt(&mut self) {
        self.error = None;
        self.busy = true;
    }

    /// Successful login: clears every field.
    pub fn succeed(&mut self) {
        *self = Self::default();
    }

    /// Failed login: keeps entered values, shows the error.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.busy = false;
    }
}

/// Input panel the front-end should draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeaturePanel {
    /// No feature selected; show [`EMPTY_STATE_PROMPT`].
    EmptyState,
    /// Reserved feature; show a placeholder and accept no input.
    ComingSoon(Feature),
    /// Image picker with auto-submit.
    ImageUpload,
    /// Document panel in the given input mode.
    DocumentInput(InputKind),
}

/// Aggregate UI runtime state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    /// App version string sourced from root `VERSION`.
    pub version: String,
    /// Current auth status.
    pub auth: UiAuthState,
    /// Login prompt fields.
    pub login: LoginForm,
    /// Selected feature.
    pub feature: Option<Feature>,
    /// Conversation for the active feature.
    pub log: ConversationLog,
    /// Input not yet submitted.
    pub staged: StagedInput,
    /// Analysis request in flight.
    pub busy: bool,
}

impl UiState {
    /// Creates default UI state.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            auth: UiAuthState::Unauthenticated,
            login: LoginForm::default(),
            feature: None,
            log: ConversationLog::new(),
            staged: StagedInput::default(),
            busy: false,
        }
    }

    /// Selects a feature (or none) and clears conversation and staged input.
    pub fn select_feature(&mut self, feature: Option<Feature>) {
        self.feature = feature;
        self.clear_chat();
    }

    /// Empties the conversation together with staged input and previews.
    pub fn clear_chat(&mut self) {
        self.log.clear();
        self.staged.clear();
    }

    /// Drops every piece of session-scoped state.
    pub fn reset_session(&mut self, auth: UiAuthState) {
        self.auth = auth;
        self.feature = None;
        self.busy = false;
        self.clear_chat();
    }

    /// Returns `true` when the main interface (not the login prompt) is shown.
    pub fn is_authenticated(&self) -> bool {
        self.auth == UiAuthState::Authenticated
    }

    /// Projects the selected feature into the input panel.
    pub fn panel(&self) -> FeaturePanel {
        match self.feature {
            None => FeaturePanel::EmptyState,
            Some(Feature::ImageAnalysis) => FeaturePanel::ImageUpload,
            Some(Feature::DocumentAnalysis) => FeaturePanel::DocumentInput(self.staged.kind),
            Some(feature) => FeaturePanel::ComingSoon(feature),
        }
    }

    /// Returns `true` when a file picker may fire a submission.
    pub fn can_upload(&self) -> bool {
        self.is_authenticated()
            && !self.busy
            && matches!(
                self.panel(),
                FeaturePanel::ImageUpload | FeaturePanel::DocumentInput(_)
            )
    }

    /// Returns `true` when the text/URL submit control is enabled.
    pub fn can_submit_text(&self) -> bool {
        self.is_authenticated()
            && !self.busy
            && matches!(
                self.panel(),
                FeaturePanel::DocumentInput(InputKind::Text | InputKind::Url)
            )
            && self.staged.trimmed_text().is_some()
    }
}

/// Renders the conversation top to bottom, one entry per line group.
///
/// While a request is outstanding, [`BUSY_INDICATOR`] is appended last.
pub fn render_transcript(state: &UiState) -> Vec<String> {
    let mut lines = Vec::with_capacity(state.log.len() * 2 + 1);
    for message in state.log.messages() {
        let author = match (message.role, message.is_error) {
            (Role::User, _) => "You",
            (Role::System, false) => "Assistant",
            (Role::System, true) => "Error",
        };
        lines.push(format!(
            "[{}] {author}: {}",
            message.display_time(),
            message.content
        ));
        if let Some(image) = &message.image {
            lines.push(format!(
                "    [image preview: {} ({}, {} bytes)]",
                image.file_name, image.mime_type, image.size_bytes
            ));
        }
        if let Some(source) = &message.source {
            lines.push(format!("    (via {source})"));
        }
    }

    if state.busy {
        lines.push(BUSY_INDICATOR.to_string());
    }
    lines
}

/// Placeholder text for a panel that accepts no input.
pub fn panel_placeholder(panel: FeaturePanel) -> Option<String> {
    match panel {
        FeaturePanel::EmptyState => Some(EMPTY_STATE_PROMPT.to_string()),
        FeaturePanel::ComingSoon(feature) => Some(format!("{} is coming soon.", feature.label())),
        FeaturePanel::ImageUpload | FeaturePanel::DocumentInput(_) => None,
    }
}
