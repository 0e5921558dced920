//! Shared fixtures for app integration tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use insight_chat_app::ChatController;
use insight_chat_auth::{
    AuthError, AuthStatusResponse, AuthTransport, LoginRequest, LoginResponse, UserInfo,
};
use insight_chat_transport::{
    AnalysisRequest, AnalysisTransport, HealthStatus, RawReply, TransportError,
};

/// Fixed timestamp for deterministic messages (2023-11-14T22:13:20Z).
#[allow(dead_code)]
pub const FIXED_NOW_MS: u64 = 1_700_000_000_000;

/// Deterministic clock.
#[allow(dead_code)]
pub fn fixed_clock() -> u64 {
    FIXED_NOW_MS
}

/// Auth transport replaying scripted replies.
#[derive(Default)]
pub struct ScriptedAuth {
    login_replies: Mutex<VecDeque<Result<LoginResponse, AuthError>>>,
    status: Mutex<Option<Result<AuthStatusResponse, AuthError>>>,
    logout_fails: bool,
    /// Login requests received, in order.
    pub login_requests: Mutex<Vec<LoginRequest>>,
    /// Number of logout calls received.
    pub logout_calls: Mutex<u32>,
}

#[allow(dead_code)]
impl ScriptedAuth {
    /// Transport whose remote logout always fails.
    pub fn with_failing_logout() -> Self {
        Self {
            logout_fails: true,
            ..Self::default()
        }
    }

    /// Queues one login reply.
    pub fn push_login(&self, reply: Result<LoginResponse, AuthError>) {
        self.login_replies
            .lock()
            .expect("login queue lock should work")
            .push_back(reply);
    }

    /// Sets the `/check-auth` reply.
    pub fn set_status(&self, reply: Result<AuthStatusResponse, AuthError>) {
        *self.status.lock().expect("status lock should work") = Some(reply);
    }

    /// Number of login calls that reached the transport.
    pub fn login_count(&self) -> usize {
        self.login_requests
            .lock()
            .expect("login request lock should work")
            .len()
    }
}

impl AuthTransport for ScriptedAuth {
    fn login(&self, request: &LoginRequest) -> Result<LoginResponse, AuthError> {
        self.login_requests
            .lock()
            .expect("login request lock should work")
            .push(request.clone());
        self.login_replies
            .lock()
            .expect("login queue lock should work")
            .pop_front()
            .unwrap_or_else(|| Err(AuthError::Transport("no scripted login reply".to_string())))
    }

    fn logout(&self) -> Result<(), AuthError> {
        *self.logout_calls.lock().expect("logout lock should work") += 1;
        if self.logout_fails {
            Err(AuthError::Transport("connection reset".to_string()))
        } else {
            Ok(())
        }
    }

    fn check_auth(&self) -> Result<AuthStatusResponse, AuthError> {
        self.status
            .lock()
            .expect("status lock should work")
            .take()
            .unwrap_or_else(|| Err(AuthError::Transport("no scripted status".to_string())))
    }
}

/// Analysis transport replaying scripted replies and recording requests.
#[derive(Default)]
pub struct ScriptedAnalysis {
    replies: Mutex<VecDeque<Result<RawReply, TransportError>>>,
    /// Requests received, in order.
    pub requests: Mutex<Vec<AnalysisRequest>>,
}

#[allow(dead_code)]
impl ScriptedAnalysis {
    /// Queues one analysis reply.
    pub fn push(&self, reply: Result<RawReply, TransportError>) {
        self.replies
            .lock()
            .expect("reply queue lock should work")
            .push_back(reply);
    }

    /// Number of requests that reached the transport.
    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("request lock should work").len()
    }

    /// Most recent request.
    pub fn last_request(&self) -> Option<AnalysisRequest> {
        self.requests
            .lock()
            .expect("request lock should work")
            .last()
            .cloned()
    }
}

impl AnalysisTransport for ScriptedAnalysis {
    fn analyze(&self, request: &AnalysisRequest) -> Result<RawReply, TransportError> {
        self.requests
            .lock()
            .expect("request lock should work")
            .push(request.clone());
        self.replies
            .lock()
            .expect("reply queue lock should work")
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("no scripted reply".to_string())))
    }

    fn health(&self) -> Result<HealthStatus, TransportError> {
        Ok(HealthStatus {
            status: "healthy".to_string(),
            message: Some("Image Analysis API is running".to_string()),
        })
    }
}

/// 200 reply with the given body.
#[allow(dead_code)]
pub fn ok(body: &str) -> Result<RawReply, TransportError> {
    Ok(RawReply {
        status: 200,
        body: body.to_string(),
    })
}

/// Non-success reply with the given status and body.
#[allow(dead_code)]
pub fn status(status: u16, body: &str) -> Result<RawReply, TransportError> {
    Err(TransportError::Status {
        status,
        body: body.to_string(),
    })
}

/// Successful login reply for `admin`.
#[allow(dead_code)]
pub fn admin_login() -> LoginResponse {
    LoginResponse {
        success: true,
        error: None,
        message: Some("Login successful".to_string()),
        user: Some(UserInfo {
            username: "admin".to_string(),
            role: Some("admin".to_string()),
        }),
    }
}

/// Fresh controller over scripted transports.
#[allow(dead_code)]
pub fn controller_with(
    auth: ScriptedAuth,
) -> (ChatController, Arc<ScriptedAuth>, Arc<ScriptedAnalysis>) {
    let auth = Arc::new(auth);
    let analysis = Arc::new(ScriptedAnalysis::default());
    let controller = ChatController::new(auth.clone(), analysis.clone(), "v0.1.0")
        .with_clock(fixed_clock);
    (controller, auth, analysis)
}

/// Controller already logged in as `admin`.
#[allow(dead_code)]
pub fn logged_in_controller() -> (ChatController, Arc<ScriptedAuth>, Arc<ScriptedAnalysis>) {
    let (mut controller, auth, analysis) = controller_with(ScriptedAuth::default());
    auth.push_login(Ok(admin_login()));
    controller.set_credentials("admin", "secret");
    controller
        .login()
        .expect("scripted login should succeed");
    (controller, auth, analysis)
}

/// Logged-in controller with `feature_id` selected.
#[allow(dead_code)]
pub fn controller_on(
    feature_id: &str,
) -> (ChatController, Arc<ScriptedAuth>, Arc<ScriptedAnalysis>) {
    let (mut controller, auth, analysis) = logged_in_controller();
    controller.select_feature(feature_id);
    (controller, auth, analysis)
}
