use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::json;

use super::*;
use crate::net::types::Speaker;

type Log = Arc<Mutex<Vec<(String, Value)>>>;

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn record(log: &Log, route: &str, body: Value) {
    log.lock().unwrap().push((route.to_owned(), body));
}

fn backend_router(log: Log) -> Router {
    Router::new()
        .route(
            "/chat/",
            post(|State(log): State<Log>, Json(body): Json<Value>| async move {
                let reply = format!("echo: {}", body["message"].as_str().unwrap_or_default());
                record(&log, "chat", body);
                Json(json!({ "response": reply }))
            }),
        )
        .route(
            "/audit/",
            post(|State(log): State<Log>, Json(body): Json<Value>| async move {
                record(&log, "audit", body);
                Json(json!({ "report": { "score": 7 }, "critic_review": null }))
            }),
        )
        .route(
            "/audit/full-report",
            post(|Json(_body): Json<Value>| async { Json(json!({ "report_markdown": "# Findings" })) }),
        )
        .route(
            "/admin/dashboard-stats",
            get(|| async { Json(json!({ "metrics": { "total_policies_analyzed": 3, "top_risk_zip": "560001" } })) }),
        )
        .route(
            "/admin/requests",
            get(|| async {
                Json(json!([{ "timestamp": "t0", "tool": "email", "message": "m", "status": "PENDING" }]))
            }),
        )
        .route(
            "/admin/requests/{index}/status",
            put(|State(log): State<Log>, Path(index): Path<usize>, Json(body): Json<Value>| async move {
                record(&log, &format!("status:{index}"), body);
                Json(json!({ "message": "Status updated" }))
            }),
        )
        .route(
            "/admin/trigger-agent",
            post(|State(log): State<Log>, Json(body): Json<Value>| async move {
                let agent = body["agent_name"].clone();
                record(&log, "trigger", body);
                Json(json!({ "status": "Triggered", "agent": agent, "result": "started" }))
            }),
        )
        .route(
            "/courtroom/simulate-turn",
            post(|State(log): State<Log>, Json(body): Json<Value>| async move {
                let round = body["history"].as_array().map_or(0, Vec::len);
                record(&log, "courtroom", body);
                let speaker = if round % 2 == 0 { "Policyholder" } else { "Insurer" };
                Json(json!({ "speaker": speaker, "argument": format!("round {round}") }))
            }),
        )
        .route(
            "/medical/analyze",
            post(|Json(body): Json<Value>| async move { Json(json!({ "analysis": { "query": body["query"] } })) }),
        )
        .route(
            "/medical/explain/{term}",
            get(|Path(term): Path<String>| async move { Json(json!({ "explanation": format!("about {term}") })) }),
        )
        .route("/health", get(|| async { Json(json!({ "status": "healthy" })) }))
        .with_state(log)
}

async fn client_with_log() -> (ApiClient, Log) {
    let log: Log = Arc::default();
    let base = serve(backend_router(log.clone())).await;
    (ApiClient::new(&format!("{base}/")).unwrap(), log)
}

// =============================================================
// routes and bodies
// =============================================================

#[tokio::test]
async fn chat_posts_message_and_context() {
    let (client, log) = client_with_log().await;

    let reply = client.send_chat_message("hello", "motor").await.unwrap();

    assert_eq!(reply.response, "echo: hello");
    assert_eq!(log.lock().unwrap()[0], ("chat".to_owned(), json!({ "message": "hello", "context": "motor" })));
}

#[tokio::test]
async fn audit_posts_policy_text_and_doc_type() {
    let (client, log) = client_with_log().await;

    let result = client.request_policy_audit("Clause 1", "Insurance").await.unwrap();

    assert_eq!(result.report.get("score"), Some(&json!(7)));
    assert!(result.critic_review.is_none());
    assert_eq!(
        log.lock().unwrap()[0],
        ("audit".to_owned(), json!({ "policy_text": "Clause 1", "doc_type": "Insurance" }))
    );
}

#[tokio::test]
async fn full_report_returns_markdown() {
    let (client, _log) = client_with_log().await;
    let report = client.request_full_report("Clause 1", "Insurance").await.unwrap();
    assert_eq!(report.report_markdown, "# Findings");
}

#[tokio::test]
async fn admin_reads_decode() {
    let (client, _log) = client_with_log().await;

    let stats = client.fetch_dashboard_stats().await.unwrap();
    let requests = client.fetch_admin_requests().await.unwrap();

    assert_eq!(stats.metrics.total_policies_analyzed, Some(3));
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].status, RequestStatus::Pending);
}

#[tokio::test]
async fn set_status_puts_to_positional_route() {
    let (client, log) = client_with_log().await;

    let ack = client.set_request_status(4, RequestStatus::Denied).await.unwrap();

    assert_eq!(ack.message.as_deref(), Some("Status updated"));
    assert_eq!(log.lock().unwrap()[0], ("status:4".to_owned(), json!({ "status": "DENIED" })));
}

#[tokio::test]
async fn trigger_posts_agent_and_payload() {
    let (client, log) = client_with_log().await;

    let ack = client
        .trigger_agent("AUDITOR", json!({ "manual_trigger": true }))
        .await
        .unwrap();

    assert_eq!(ack.agent.as_deref(), Some("AUDITOR"));
    assert_eq!(
        log.lock().unwrap()[0].1,
        json!({ "agent_name": "AUDITOR", "payload": { "manual_trigger": true } })
    );
}

#[tokio::test]
async fn courtroom_sends_full_history() {
    let (client, log) = client_with_log().await;
    let history = vec![DebateTurn { speaker: Speaker::Policyholder, argument: "round 0".into() }];

    let payload = client.advance_courtroom_turn("claim dispute", &history).await.unwrap();

    assert_eq!(payload.into_turn().unwrap().speaker, Speaker::Insurer);
    assert_eq!(
        log.lock().unwrap()[0].1,
        json!({
            "context": "claim dispute",
            "history": [{ "speaker": "Policyholder", "argument": "round 0" }]
        })
    );
}

#[tokio::test]
async fn medical_routes() {
    let (client, _log) = client_with_log().await;

    let analysis = client.analyze_medical_report("HbA1c 7.2", "").await.unwrap();
    let explanation = client.explain_medical_term("blood pressure").await.unwrap();

    assert_eq!(analysis.analysis, json!({ "query": "HbA1c 7.2" }));
    assert_eq!(explanation.explanation, json!("about blood pressure"));
}

#[tokio::test]
async fn health_check() {
    let (client, _log) = client_with_log().await;
    assert_eq!(client.health().await.unwrap().status, "healthy");
}

// =============================================================
// failure contract
// =============================================================

#[tokio::test]
async fn non_success_status_is_an_error_whatever_the_body() {
    let router = Router::new().route(
        "/chat/",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "response": "looks fine" }))) }),
    );
    let client = ApiClient::new(&serve(router).await).unwrap();

    let err = client.send_chat_message("hello", "").await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert!(matches!(err, ApiError::Status { action: "send chat message", ref body, .. } if body.contains("looks fine")));
}

#[tokio::test]
async fn unknown_route_is_a_status_error() {
    let client = ApiClient::new(&serve(Router::new()).await).unwrap();
    let err = client.fetch_admin_requests().await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn undecodable_success_body_is_a_decode_error() {
    let router = Router::new().route("/courtroom/simulate-turn", post(|| async { "the court is adjourned" }));
    let client = ApiClient::new(&serve(router).await).unwrap();

    let err = client.advance_courtroom_turn("claim", &[]).await.unwrap_err();

    assert!(matches!(err, ApiError::Decode { .. }));
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn unreachable_backend_is_a_request_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = ApiClient::new(&format!("http://{addr}")).unwrap();

    let err = client.health().await.unwrap_err();

    assert!(matches!(err, ApiError::Request { action: "health check", .. }));
}

#[test]
fn base_url_trailing_slash_is_trimmed() {
    let client = ApiClient::new("http://localhost:8000///").unwrap();
    assert_eq!(client.base_url(), "http://localhost:8000");
}
