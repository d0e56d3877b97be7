// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Client tests against a mocked tracing backend and replay endpoint

use mockito::{Matcher, Server};
use serde_json::json;
use std::time::Duration;
use tracereplay_client::{
    ClientConfig, ClientError, ListTracesParams, ObservationRef, ReplayClient, TraceClient,
};
use tracereplay_core::replay::{self, ContextBuilder};
use tracereplay_core::{extract_generation, ObservationType};

// base64("pk-lf-test:sk-lf-test")
const AUTH_HEADER: &str = "Basic cGstbGYtdGVzdDpzay1sZi10ZXN0";

fn client_for(server: &Server) -> TraceClient {
    let config = ClientConfig::new(server.url()).with_credentials("pk-lf-test", "sk-lf-test");
    TraceClient::new(config).unwrap()
}

fn trace_body(id: &str, timestamp: &str, user: &str, assistant: &str) -> String {
    json!({
        "id": id,
        "sessionId": "session-1",
        "timestamp": timestamp,
        "tags": ["chat"],
        "observations": [
            {"id": format!("{id}-span"), "traceId": id, "type": "SPAN", "startTime": timestamp},
            {
                "id": format!("{id}-gen"),
                "traceId": id,
                "type": "GENERATION",
                "startTime": timestamp,
                "model": "deepseek-chat",
                "input": [{"role": "user", "content": user}],
                "output": {"role": "assistant", "content": assistant},
                "usage": {"input": 10, "output": 5, "total": 15}
            }
        ],
        "scores": []
    })
    .to_string()
}

#[tokio::test]
async fn test_get_trace_sends_basic_auth() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/public/traces/trace-1")
        .match_header("authorization", AUTH_HEADER)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(trace_body("trace-1", "2024-05-01T10:00:00Z", "Q", "A"))
        .create_async()
        .await;

    let trace = client_for(&server).get_trace("trace-1").await.unwrap();
    mock.assert_async().await;

    assert_eq!(trace.session_id.as_deref(), Some("session-1"));
    assert_eq!(trace.observations.len(), 2);
    assert_eq!(trace.observations[1].kind, ObservationType::Generation);

    let extract = extract_generation(&trace, 1).unwrap();
    assert_eq!(extract.model.as_deref(), Some("deepseek-chat"));
    assert_eq!(extract.messages.len(), 2);
    assert_eq!(extract.turn.token_usage.total_tokens, 15);
}

#[tokio::test]
async fn test_non_success_is_api_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/public/traces/missing")
        .with_status(404)
        .with_body(r#"{"message":"Trace not found"}"#)
        .create_async()
        .await;

    let err = client_for(&server).get_trace("missing").await.unwrap_err();
    match err {
        ClientError::ApiError { status, message } => {
            assert_eq!(status, 404);
            assert!(message.contains("Trace not found"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_serialization_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/public/traces/broken")
        .with_status(200)
        .with_body("{\"id\": ")
        .create_async()
        .await;

    let err = client_for(&server).get_trace("broken").await.unwrap_err();
    assert!(matches!(err, ClientError::SerializationError(_)));
}

#[tokio::test]
async fn test_list_traces_query_and_paging() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/public/traces")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".into(), "2".into()),
            Matcher::UrlEncoded("limit".into(), "1".into()),
            Matcher::UrlEncoded("userId".into(), "user-1".into()),
            Matcher::UrlEncoded("tags".into(), "chat".into()),
        ]))
        .with_status(200)
        .with_body(
            json!({
                "data": [{
                    "id": "trace-2",
                    "timestamp": "2024-05-01T10:01:00Z",
                    "userId": "user-1",
                    "observations": ["trace-2-span", "trace-2-gen"],
                    "latency": 1.25,
                    "totalCost": 0.0004
                }],
                "meta": {"page": 2, "limit": 1, "totalItems": 3, "totalPages": 3}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let params = ListTracesParams {
        page: Some(2),
        limit: Some(1),
        user_id: Some("user-1".into()),
        tags: vec!["chat".into()],
        ..Default::default()
    };
    let list = client_for(&server).list_traces(&params).await.unwrap();
    mock.assert_async().await;

    assert_eq!(list.data.len(), 1);
    assert_eq!(list.data[0].user_id.as_deref(), Some("user-1"));
    assert!(matches!(list.data[0].observations[0], ObservationRef::Id(_)));
    assert!(list.has_next_page());
    assert_eq!(list.meta.total_items, 3);
}

#[tokio::test]
async fn test_session_replay_context_orders_and_appends() {
    let mut server = Server::new_async().await;
    let _session = server
        .mock("GET", "/api/public/sessions/session-1")
        .with_status(200)
        .with_body(
            json!({
                "id": "session-1",
                "createdAt": "2024-05-01T09:59:00Z",
                "projectId": "project-1",
                "traces": [
                    {"id": "trace-late", "timestamp": "2024-05-01T10:05:00Z", "observations": []},
                    {"id": "trace-early", "timestamp": "2024-05-01T10:00:00Z", "observations": []}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;
    let _late = server
        .mock("GET", "/api/public/traces/trace-late")
        .with_status(200)
        .with_body(trace_body("trace-late", "2024-05-01T10:05:00Z", "Bye", "Goodbye"))
        .create_async()
        .await;
    let _early = server
        .mock("GET", "/api/public/traces/trace-early")
        .with_status(200)
        .with_body(trace_body("trace-early", "2024-05-01T10:00:00Z", "Hi", "Hello"))
        .create_async()
        .await;

    let mut builder = ContextBuilder::new("user-1", "https://api.deepseek.com/v1", "deepseek-chat");
    builder.set_system_prompt("sys", None);

    let appended = client_for(&server)
        .session_replay_context("session-1", &mut builder)
        .await
        .unwrap();
    assert_eq!(appended, 2);
    assert_eq!(builder.session_id(), "session-1");

    let ctx = builder.build("trace-late");
    let rounds: Vec<u32> = ctx.history.iter().map(|t| t.round).collect();
    assert_eq!(rounds, vec![1, 2]);
    assert_eq!(ctx.history[0].turn_id, "trace-early");

    let contents: Vec<String> = replay::to_canonical_messages(&ctx)
        .iter()
        .map(|m| m.content_text())
        .collect();
    assert_eq!(contents, vec!["sys", "Hi", "Hello", "Bye", "Goodbye"]);
}

#[tokio::test]
async fn test_replay_client_returns_error_status_as_data() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/replay")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(json!({
            "model": "deepseek-chat",
            "history": [{"role": "user", "content": "Hi"}]
        })))
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;

    let client = ReplayClient::new(
        format!("{}/api/v1/replay", server.url()),
        Duration::from_secs(5),
    )
    .unwrap();
    let template = json!({"model": "deepseek-chat", "history": []});
    let response = client
        .send_messages(&template, &[tracereplay_core::Message::user("Hi")])
        .await
        .unwrap();
    mock.assert_async().await;

    assert_eq!(response.status, 500);
    assert!(!response.is_success());
    assert_eq!(response.body, "upstream exploded");
}

#[tokio::test]
async fn test_replay_client_rejects_non_object_template() {
    let client = ReplayClient::new("http://localhost:9001/api/v1/replay", Duration::from_secs(1))
        .unwrap();
    let err = client.send_messages(&json!("nope"), &[]).await.unwrap_err();
    assert!(matches!(err, ClientError::Core(_)));
}
