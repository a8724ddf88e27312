//! `reqwest` implementation of [`Backend`].
//!
//! ERROR HANDLING
//! ==============
//! The response body is read as text before the status check so the body of
//! a failed call can ride along in [`ApiError::Status`] for diagnostics. It is
//! never parsed for structured error details.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use reqwest::{Method, RequestBuilder, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::types::{
    AdminRequest, AuditResult, ChatReply, CourtTurnPayload, DashboardStats, DebateTurn, FullReport, Health,
    MedicalAnalysis, RequestStatus, StatusAck, TermExplanation, TriggerAck,
};
use super::{ApiError, Backend};
use crate::config::ClientConfig;

/// HTTP client bound to one backend base URL.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client for `base_url`. No request or connect timeout is set.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the TLS backend fails to
    /// initialize.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_owned() })
    }

    /// Build a client from a parsed [`ClientConfig`].
    ///
    /// # Errors
    ///
    /// See [`ApiClient::new`].
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::new(&config.base_url)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    async fn post_json<B, T>(&self, action: &'static str, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        send(action, self.request(Method::POST, path).json(body)).await
    }

    async fn get_json<T: DeserializeOwned>(&self, action: &'static str, path: &str) -> Result<T, ApiError> {
        send(action, self.request(Method::GET, path)).await
    }
}

async fn send<T: DeserializeOwned>(action: &'static str, request: RequestBuilder) -> Result<T, ApiError> {
    let (client, request) = request.build_split();
    let request = request.map_err(|e| ApiError::Request { action, message: e.to_string() })?;
    debug!(action, method = %request.method(), url = %request.url(), "backend request");

    let response = client
        .execute(request)
        .await
        .map_err(|e| {
            warn!(action, error = %e, "backend unreachable");
            ApiError::Request { action, message: e.to_string() }
        })?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ApiError::Request { action, message: e.to_string() })?;

    if !status.is_success() {
        warn!(action, status = status.as_u16(), "backend returned failure status");
        return Err(ApiError::Status { action, status: status.as_u16(), body: text });
    }

    serde_json::from_str(&text).map_err(|e| {
        warn!(action, error = %e, "backend response did not decode");
        ApiError::Decode { action, message: e.to_string() }
    })
}

#[derive(Serialize)]
struct ChatBody<'a> {
    message: &'a str,
    context: &'a str,
}

#[derive(Serialize)]
struct AuditBody<'a> {
    policy_text: &'a str,
    doc_type: &'a str,
}

#[derive(Serialize)]
struct StatusBody {
    status: RequestStatus,
}

#[derive(Serialize)]
struct TriggerBody<'a> {
    agent_name: &'a str,
    payload: Value,
}

#[derive(Serialize)]
struct SimulateBody<'a> {
    context: &'a str,
    history: &'a [DebateTurn],
}

#[derive(Serialize)]
struct MedicalBody<'a> {
    query: &'a str,
    policy_context: &'a str,
}

#[async_trait::async_trait]
impl Backend for ApiClient {
    async fn send_chat_message(&self, text: &str, context: &str) -> Result<ChatReply, ApiError> {
        self.post_json("send chat message", "/chat/", &ChatBody { message: text, context })
            .await
    }

    async fn request_policy_audit(&self, policy_text: &str, doc_type: &str) -> Result<AuditResult, ApiError> {
        self.post_json("audit policy", "/audit/", &AuditBody { policy_text, doc_type })
            .await
    }

    async fn request_full_report(&self, policy_text: &str, doc_type: &str) -> Result<FullReport, ApiError> {
        self.post_json("generate full report", "/audit/full-report", &AuditBody { policy_text, doc_type })
            .await
    }

    async fn fetch_dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        self.get_json("fetch dashboard stats", "/admin/dashboard-stats")
            .await
    }

    async fn fetch_admin_requests(&self) -> Result<Vec<AdminRequest>, ApiError> {
        self.get_json("fetch requests", "/admin/requests").await
    }

    async fn set_request_status(&self, index: usize, status: RequestStatus) -> Result<StatusAck, ApiError> {
        let path = format!("/admin/requests/{index}/status");
        send("update status", self.request(Method::PUT, &path).json(&StatusBody { status })).await
    }

    async fn trigger_agent(&self, agent_name: &str, payload: Value) -> Result<TriggerAck, ApiError> {
        self.post_json("trigger agent", "/admin/trigger-agent", &TriggerBody { agent_name, payload })
            .await
    }

    async fn advance_courtroom_turn(
        &self,
        context: &str,
        history: &[DebateTurn],
    ) -> Result<CourtTurnPayload, ApiError> {
        self.post_json("simulate courtroom turn", "/courtroom/simulate-turn", &SimulateBody { context, history })
            .await
    }

    async fn analyze_medical_report(&self, query: &str, policy_context: &str) -> Result<MedicalAnalysis, ApiError> {
        self.post_json("analyze medical report", "/medical/analyze", &MedicalBody { query, policy_context })
            .await
    }

    async fn explain_medical_term(&self, term: &str) -> Result<TermExplanation, ApiError> {
        const ACTION: &str = "explain medical term";
        let mut url = Url::parse(&format!("{}/medical/explain/", self.base_url))
            .map_err(|e| ApiError::Request { action: ACTION, message: e.to_string() })?;
        url.path_segments_mut()
            .map_err(|()| ApiError::Request { action: ACTION, message: "base URL cannot carry a path".to_owned() })?
            .pop_if_empty()
            .push(term);
        send(ACTION, self.http.get(url)).await
    }

    async fn health(&self) -> Result<Health, ApiError> {
        self.get_json("health check", "/health").await
    }
}
