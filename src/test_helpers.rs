//! Shared fixtures for state holder tests.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::net::types::{
    AdminRequest, AuditResult, ChatReply, CourtTurnPayload, DashboardStats, DebateTurn, FullReport, Health,
    MedicalAnalysis, RequestStatus, StatusAck, TermExplanation, TriggerAck,
};
use crate::net::{ApiError, Backend};
use crate::state::Notifier;

/// One recorded backend call.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Chat { text: String, context: String },
    Audit,
    FullReport,
    Stats,
    Requests,
    SetStatus { index: usize, status: RequestStatus },
    Trigger { agent: String, payload: Value },
    Courtroom { context: String, history: Vec<DebateTurn> },
    MedicalAnalyze,
    MedicalExplain,
    Health,
}

/// In-memory backend.
///
/// Chat and courtroom replies are served from queues (an empty queue answers
/// HTTP 500). Admin requests live in a list that `set_request_status`
/// mutates in place, like the real store. Any method named in `failing`
/// answers HTTP 500, and any method named in `stalled` never answers.
#[derive(Default)]
pub struct MockBackend {
    pub calls: Mutex<Vec<Call>>,
    pub chat_replies: Mutex<VecDeque<Result<ChatReply, ApiError>>>,
    pub court_replies: Mutex<VecDeque<Result<CourtTurnPayload, ApiError>>>,
    pub requests: Mutex<Vec<AdminRequest>>,
    pub stats: Mutex<DashboardStats>,
    pub failing: Mutex<HashSet<&'static str>>,
    pub stalled: Mutex<HashSet<&'static str>>,
    /// `error` carried by the next successful status acknowledgement.
    pub status_ack_error: Mutex<Option<String>>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_chat(&self, reply: Result<ChatReply, ApiError>) {
        self.chat_replies.lock().unwrap().push_back(reply);
    }

    pub fn push_chat_text(&self, text: &str) {
        self.push_chat(Ok(ChatReply { response: text.to_owned() }));
    }

    pub fn push_court(&self, reply: Result<CourtTurnPayload, ApiError>) {
        self.court_replies.lock().unwrap().push_back(reply);
    }

    pub fn push_turn(&self, speaker: &str, argument: &str) {
        self.push_court(Ok(CourtTurnPayload {
            speaker: Some(speaker.to_owned()),
            argument: Some(argument.to_owned()),
            ..CourtTurnPayload::default()
        }));
    }

    pub fn set_requests(&self, requests: Vec<AdminRequest>) {
        *self.requests.lock().unwrap() = requests;
    }

    pub fn fail(&self, method: &'static str) {
        self.failing.lock().unwrap().insert(method);
    }

    pub fn recover(&self, method: &'static str) {
        self.failing.lock().unwrap().remove(method);
    }

    pub fn stall(&self, method: &'static str) {
        self.stalled.lock().unwrap().insert(method);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    async fn answer(&self, method: &'static str) -> Result<(), ApiError> {
        let stalled = self.stalled.lock().unwrap().contains(method);
        if stalled {
            std::future::pending::<()>().await;
        }
        let failing = self.failing.lock().unwrap().contains(method);
        if failing {
            return Err(server_error(method));
        }
        Ok(())
    }
}

pub fn server_error(action: &'static str) -> ApiError {
    ApiError::Status { action, status: 500, body: r#"{"detail":"boom"}"#.to_owned() }
}

pub fn pending(tool: &str, message: &str) -> AdminRequest {
    AdminRequest {
        id: None,
        timestamp: "2025-01-01T10:00:00".to_owned(),
        tool: tool.to_owned(),
        message: message.to_owned(),
        status: RequestStatus::Pending,
    }
}

#[async_trait::async_trait]
impl Backend for MockBackend {
    async fn send_chat_message(&self, text: &str, context: &str) -> Result<ChatReply, ApiError> {
        self.record(Call::Chat { text: text.to_owned(), context: context.to_owned() });
        self.answer("chat").await?;
        self.chat_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(server_error("chat")))
    }

    async fn request_policy_audit(&self, _policy_text: &str, _doc_type: &str) -> Result<AuditResult, ApiError> {
        self.record(Call::Audit);
        self.answer("audit").await?;
        Ok(AuditResult::default())
    }

    async fn request_full_report(&self, _policy_text: &str, _doc_type: &str) -> Result<FullReport, ApiError> {
        self.record(Call::FullReport);
        self.answer("full_report").await?;
        Ok(FullReport { report_markdown: "# Report".to_owned() })
    }

    async fn fetch_dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        self.record(Call::Stats);
        self.answer("stats").await?;
        Ok(self.stats.lock().unwrap().clone())
    }

    async fn fetch_admin_requests(&self) -> Result<Vec<AdminRequest>, ApiError> {
        self.record(Call::Requests);
        self.answer("requests").await?;
        Ok(self.requests.lock().unwrap().clone())
    }

    async fn set_request_status(&self, index: usize, status: RequestStatus) -> Result<StatusAck, ApiError> {
        self.record(Call::SetStatus { index, status });
        self.answer("set_status").await?;
        let mut requests = self.requests.lock().unwrap();
        let Some(request) = requests.get_mut(index) else {
            return Err(ApiError::Status { action: "set_status", status: 404, body: String::new() });
        };
        request.status = status;
        let error = self.status_ack_error.lock().unwrap().take();
        Ok(StatusAck { message: Some("Status updated".to_owned()), error })
    }

    async fn trigger_agent(&self, agent_name: &str, payload: Value) -> Result<TriggerAck, ApiError> {
        self.record(Call::Trigger { agent: agent_name.to_owned(), payload });
        self.answer("trigger").await?;
        Ok(TriggerAck {
            status: Some("Triggered".to_owned()),
            agent: Some(agent_name.to_owned()),
            result: Some("Simulation started".to_owned()),
        })
    }

    async fn advance_courtroom_turn(
        &self,
        context: &str,
        history: &[DebateTurn],
    ) -> Result<CourtTurnPayload, ApiError> {
        self.record(Call::Courtroom { context: context.to_owned(), history: history.to_vec() });
        self.answer("courtroom").await?;
        self.court_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(server_error("courtroom")))
    }

    async fn analyze_medical_report(&self, _query: &str, _policy_context: &str) -> Result<MedicalAnalysis, ApiError> {
        self.record(Call::MedicalAnalyze);
        self.answer("medical_analyze").await?;
        Ok(MedicalAnalysis { analysis: Value::Null })
    }

    async fn explain_medical_term(&self, _term: &str) -> Result<TermExplanation, ApiError> {
        self.record(Call::MedicalExplain);
        self.answer("medical_explain").await?;
        Ok(TermExplanation { explanation: Value::Null })
    }

    async fn health(&self) -> Result<Health, ApiError> {
        self.record(Call::Health);
        self.answer("health").await?;
        Ok(Health { status: "healthy".to_owned() })
    }
}

/// Notifier that keeps every alert for later assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    pub alerts: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_owned());
    }
}
