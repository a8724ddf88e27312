//! Transport layer: one HTTP call per user action.
//!
//! DESIGN
//! ======
//! [`Backend`] is the seam between the state holders and the network. The
//! production implementation is [`api::ApiClient`]; tests substitute a mock
//! that returns queued responses. Every method is a single attempt with no
//! retry and no timeout. A non-2xx status is a failure whatever the body
//! says.

pub mod api;
pub mod types;

use serde_json::Value;

use types::{
    AdminRequest, AuditResult, ChatReply, CourtTurnPayload, DashboardStats, DebateTurn, FullReport, Health,
    MedicalAnalysis, RequestStatus, StatusAck, TermExplanation, TriggerAck,
};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by transport calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (connect, DNS, reset).
    #[error("{action}: request failed: {message}")]
    Request { action: &'static str, message: String },

    /// The backend answered with a non-success status.
    #[error("{action}: HTTP {status}")]
    Status { action: &'static str, status: u16, body: String },

    /// A success response whose body did not match the expected shape.
    #[error("{action}: response decode failed: {message}")]
    Decode { action: &'static str, message: String },

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// HTTP status for [`ApiError::Status`], `None` otherwise.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// =============================================================================
// BACKEND SEAM
// =============================================================================

/// The remote service, one method per route.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// `POST /chat/`
    async fn send_chat_message(&self, text: &str, context: &str) -> Result<ChatReply, ApiError>;

    /// `POST /audit/`
    async fn request_policy_audit(&self, policy_text: &str, doc_type: &str) -> Result<AuditResult, ApiError>;

    /// `POST /audit/full-report`
    async fn request_full_report(&self, policy_text: &str, doc_type: &str) -> Result<FullReport, ApiError>;

    /// `GET /admin/dashboard-stats`
    async fn fetch_dashboard_stats(&self) -> Result<DashboardStats, ApiError>;

    /// `GET /admin/requests`
    async fn fetch_admin_requests(&self) -> Result<Vec<AdminRequest>, ApiError>;

    /// `PUT /admin/requests/{index}/status`
    ///
    /// `index` is a position in the most recently fetched list, not a key.
    async fn set_request_status(&self, index: usize, status: RequestStatus) -> Result<StatusAck, ApiError>;

    /// `POST /admin/trigger-agent`
    async fn trigger_agent(&self, agent_name: &str, payload: Value) -> Result<TriggerAck, ApiError>;

    /// `POST /courtroom/simulate-turn`
    ///
    /// The full history goes up on every call; the server picks the next
    /// speaker.
    async fn advance_courtroom_turn(&self, context: &str, history: &[DebateTurn])
    -> Result<CourtTurnPayload, ApiError>;

    /// `POST /medical/analyze`
    async fn analyze_medical_report(&self, query: &str, policy_context: &str) -> Result<MedicalAnalysis, ApiError>;

    /// `GET /medical/explain/{term}`
    async fn explain_medical_term(&self, term: &str) -> Result<TermExplanation, ApiError>;

    /// `GET /health`
    async fn health(&self) -> Result<Health, ApiError>;
}
