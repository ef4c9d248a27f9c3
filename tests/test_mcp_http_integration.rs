use std::sync::Arc;

use axum::Router;
use http_body_util::BodyExt; // for .collect
use hyper::{header, Request, StatusCode};
use serde_json::{json, Value};
use tokio::time::{timeout, Duration};
use tower::ServiceExt; // for .oneshot

use leantime_mcp_gateway::clients::leantime::LeantimeClient;
use leantime_mcp_gateway::infra::http_app::build_app;
use leantime_mcp_gateway::infra::logging::RecordingSink;
use leantime_mcp_gateway::tools::leantime::tool_router::make_factory;

fn app_against(base: String, sink: &RecordingSink) -> Router {
    let log = Arc::new(sink.clone());
    let client = LeantimeClient::new(base, "lt_integration", log.clone()).unwrap();
    build_app(make_factory(Arc::new(client), log))
}

fn post(body: Value, session: Option<&str>) -> Request<axum::body::Body> {
    let mut b = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header(header::ACCEPT, "application/json, text/event-stream")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(s) = session {
        b = b.header("MCP-Session-Id", s);
    }
    b.body(axum::body::Body::from(body.to_string())).unwrap()
}

/// First JSON-RPC frame carried in an SSE body.
async fn sse_frame(resp: axum::response::Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let s = String::from_utf8_lossy(&bytes);
    s.lines()
        .find_map(|line| line.strip_prefix("data: ").map(|d| d.to_string()))
        .and_then(|d| serde_json::from_str::<Value>(&d).ok())
        .expect("Did not find a JSON-RPC frame in the SSE body")
}

async fn open_session(app: &Router) -> String {
    let init = json!({
        "jsonrpc":"2.0","id":1,"method":"initialize",
        "params":{ "protocolVersion":"2025-03-26","capabilities":{},"clientInfo":{"name":"test","version":"0.1"} }
    });
    let init_res = app.clone().oneshot(post(init, None)).await.unwrap();
    assert!(init_res.status().is_success());
    let session_id = init_res
        .headers()
        .get("MCP-Session-Id")
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();
    let init_frame = sse_frame(init_res).await;
    assert!(init_frame["result"]["instructions"]
        .as_str()
        .unwrap()
        .contains("Leantime"));

    let initialized = json!({"jsonrpc":"2.0","method":"notifications/initialized","params":{}});
    let res = app
        .clone()
        .oneshot(post(initialized, Some(&session_id)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    session_id
}

#[tokio::test]
async fn lists_tools_and_fetches_filtered_tickets() {
    let server = httpmock::MockServer::start();
    let leantime = server.mock(|when, then| {
        when.method(httpmock::Method::POST)
            .path("/api/jsonrpc")
            .header("x-api-key", "lt_integration")
            .json_body(json!({
                "jsonrpc": "2.0",
                "method": "leantime.rpc.Tickets.getAllOpenUserTickets",
                "params": {"userId": 42},
                "id": 1
            }));
        then.status(200).json_body(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": [{"0": "x", "id": 42, "headline": "fix bug"}]
        }));
    });

    let sink = RecordingSink::new();
    let app = app_against(server.base_url(), &sink);
    let session_id = open_session(&app).await;

    let list = json!({"jsonrpc":"2.0","id":2,"method":"tools/list","params":{}});
    let list_res = timeout(Duration::from_secs(20), app.clone().oneshot(post(list, Some(&session_id))))
        .await
        .unwrap()
        .unwrap();
    assert!(list_res.status().is_success());
    let tools = sse_frame(list_res).await;
    let names: Vec<&str> = tools["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert_eq!(names.len(), 3, "got: {names:?}");
    assert!(names.contains(&"get_all_users_by_mail"));
    let tickets_tool = tools["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["name"] == "get_tickets_assigned_to_user")
        .unwrap();
    assert!(tickets_tool["inputSchema"]["properties"]["user_id"].is_object());

    let call = json!({
        "jsonrpc":"2.0","id":3,"method":"tools/call",
        "params": {"name":"get_tickets_assigned_to_user","arguments":{"user_id":42}}
    });
    let call_res = app.clone().oneshot(post(call, Some(&session_id))).await.unwrap();
    assert!(call_res.status().is_success());
    let v = sse_frame(call_res).await;
    assert_eq!(
        v["result"]["structuredContent"],
        json!({"tickets": [{"id": 42, "headline": "fix bug"}]})
    );
    leantime.assert();
}

#[tokio::test]
async fn missing_user_id_is_rejected_without_calling_leantime() {
    let server = httpmock::MockServer::start();
    let leantime = server.mock(|when, then| {
        when.method(httpmock::Method::POST).path("/api/jsonrpc");
        then.status(200).json_body(json!({"result": []}));
    });

    let sink = RecordingSink::new();
    let app = app_against(server.base_url(), &sink);
    let session_id = open_session(&app).await;

    let call = json!({
        "jsonrpc":"2.0","id":2,"method":"tools/call",
        "params": {"name":"get_tickets_assigned_to_user","arguments":{"user_id":0}}
    });
    let call_res = app.clone().oneshot(post(call, Some(&session_id))).await.unwrap();
    let v = sse_frame(call_res).await;
    assert_eq!(v["error"]["code"], -32602);
    assert_eq!(v["error"]["data"]["status"], 400);
    leantime.assert_hits(0);
}

#[tokio::test]
async fn user_lookup_by_email_over_mcp() {
    let server = httpmock::MockServer::start();
    server.mock(|when, then| {
        when.method(httpmock::Method::POST)
            .path("/api/jsonrpc")
            .json_body_partial(r#"{"method": "leantime.rpc.Users.getAll"}"#);
        then.status(200).json_body(json!({"result": [
            {"0": 1, "id": 1, "email": "bob@example.com"},
            {"0": 2, "id": 2, "email": "alice@example.com", "firstname": "Alice"}
        ]}));
    });

    let sink = RecordingSink::new();
    let app = app_against(server.base_url(), &sink);
    let session_id = open_session(&app).await;

    let call = json!({
        "jsonrpc":"2.0","id":2,"method":"tools/call",
        "params": {"name":"get_all_users_by_mail","arguments":{"mail":"Alice@Example.com"}}
    });
    let v = sse_frame(app.clone().oneshot(post(call, Some(&session_id))).await.unwrap()).await;
    assert_eq!(
        v["result"]["structuredContent"]["user"],
        json!({"id": 2, "email": "alice@example.com", "firstname": "Alice"})
    );

    let call = json!({
        "jsonrpc":"2.0","id":3,"method":"tools/call",
        "params": {"name":"get_all_users_by_mail","arguments":{"mail":"nobody@example.com"}}
    });
    let v = sse_frame(app.clone().oneshot(post(call, Some(&session_id))).await.unwrap()).await;
    assert_eq!(v["result"]["structuredContent"], json!({"user": {}}));
}

#[tokio::test]
async fn unreachable_leantime_is_internal_error() {
    let sink = RecordingSink::new();
    let app = app_against("http://127.0.0.1:9".into(), &sink);
    let session_id = open_session(&app).await;

    let call = json!({"jsonrpc":"2.0","id":2,"method":"tools/call","params": {"name":"get_all_users","arguments":{}}});
    let v = sse_frame(app.clone().oneshot(post(call, Some(&session_id))).await.unwrap()).await;
    assert_eq!(v["error"]["code"], -32603);
    assert!(v["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Failed to fetch users"));
    assert!(!sink.errors().is_empty());
}
