//! Protocol-level integration tests: lifecycle gate, routing, result shapes.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};

use fluentmcp::codec;
use fluentmcp::types::{PromptArgument, PromptMessage};
use fluentmcp::{
    Arguments, Dispatcher, McpServer, PromptArguments, PromptEntry, PromptOutput, ResourceEntry,
    ResourceOutput, ServerConfig, SessionState, ToolEntry, ToolOutput,
};
use fluentmcp_schema::{ParamType, SchemaDescriptor, SchemaResult, ToolInput};

// ─────────────────────── helpers ───────────────────────

#[derive(Deserialize)]
struct ScaleInput {
    value: i64,
    factor: f64,
}

impl ToolInput for ScaleInput {
    fn schema() -> SchemaResult<SchemaDescriptor> {
        SchemaDescriptor::builder()
            .required("value", ParamType::Integer)
            .optional("factor", ParamType::Number)
            .build()
    }
}

fn test_server(config: ServerConfig) -> McpServer {
    let echo_schema = SchemaDescriptor::builder()
        .required("text", ParamType::String)
        .build()
        .unwrap();
    let count_schema = SchemaDescriptor::builder()
        .required("n", ParamType::Integer)
        .optional("label", ParamType::String)
        .build()
        .unwrap();

    McpServer::builder(config)
        .tool(
            ToolEntry::new("echo", echo_schema, |args: Arguments| async move {
                Ok(ToolOutput::text(args["text"].as_str().unwrap_or_default()))
            })
            .with_description("Echo text"),
        )
        .tool(ToolEntry::new("count", count_schema, |args: Arguments| async move {
            Ok(ToolOutput::Json(Value::Object(args)))
        }))
        .tool(ToolEntry::new("boom", SchemaDescriptor::empty(), |_| async {
            Err::<ToolOutput, _>(anyhow::anyhow!("kaboom"))
        }))
        .tool(ToolEntry::new("panics", SchemaDescriptor::empty(), |_| async {
            panic!("handler blew up")
        }))
        .tool(ToolEntry::new("sleepy", SchemaDescriptor::empty(), |_| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(ToolOutput::text("late"))
        }))
        .typed_tool("scale", "Scale a value", |input: ScaleInput| async move {
            Ok(ToolOutput::text((input.value as f64 * input.factor).to_string()))
        })
        .prompt(
            PromptEntry::new("greet", |args: PromptArguments| async move {
                Ok(PromptOutput::text(format!("Hello, {}", args["name"])))
            })
            .with_argument(PromptArgument::required("name")),
        )
        .prompt(PromptEntry::new("dialog", |_| async {
            Ok(PromptOutput::messages([
                PromptMessage::user("one"),
                PromptMessage::assistant("two"),
                PromptMessage::user("three"),
            ]))
        }))
        .prompt(PromptEntry::new("broken", |_| async {
            Ok(PromptOutput::Prebuilt(json!({ "messages": "not a list" })))
        }))
        .prompt(PromptEntry::new("slow", |_| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(PromptOutput::text("late"))
        }))
        .resource(
            ResourceEntry::new("test://readme", "readme", || async {
                Ok(ResourceOutput::text("hello"))
            })
            .with_mime_type("text/plain"),
        )
        .resource(
            ResourceEntry::new("test://bytes", "bytes", || async {
                Ok(ResourceOutput::Blob(vec![0, 1, 2, 253, 254, 255]))
            })
            .with_mime_type("application/octet-stream"),
        )
        .resource(ResourceEntry::new("test://failing", "failing", || async {
            Err::<ResourceOutput, _>(anyhow::anyhow!("disk on fire"))
        }))
        .build()
        .unwrap()
}

fn dispatcher() -> Dispatcher {
    let config = ServerConfig {
        handler_timeout_ms: 100,
        ..ServerConfig::default()
    };
    test_server(config).dispatcher()
}

/// Build an MCP JSON-RPC request.
fn mcp_request(id: i64, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params
    })
}

fn init_request(version: &str) -> Value {
    mcp_request(
        0,
        "initialize",
        json!({
            "protocolVersion": version,
            "capabilities": {},
            "clientInfo": { "name": "test-client", "version": "1.0" }
        }),
    )
}

/// Send a JSON message through the codec and dispatcher.
async fn send(dispatcher: &Dispatcher, msg: Value) -> Option<Value> {
    let parsed = codec::decode(msg.to_string().as_bytes()).unwrap();
    dispatcher
        .handle_message(parsed)
        .await
        .map(|reply| serde_json::to_value(reply).unwrap())
}

async fn send_unwrap(dispatcher: &Dispatcher, msg: Value) -> Value {
    send(dispatcher, msg).await.expect("expected response")
}

async fn ready_dispatcher() -> Dispatcher {
    let d = dispatcher();
    let resp = send_unwrap(&d, init_request("2025-06-18")).await;
    assert!(resp.get("result").is_some(), "initialize failed: {resp}");
    assert!(send(&d, json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }))
        .await
        .is_none());
    d
}

async fn call_tool(d: &Dispatcher, name: &str, arguments: Value) -> Value {
    send_unwrap(
        d,
        mcp_request(5, "tools/call", json!({ "name": name, "arguments": arguments })),
    )
    .await
}

// ═══════════════════════════════════════════════════════
// LIFECYCLE
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_echo_scenario_exact_bytes() {
    let d = ready_dispatcher().await;
    let line = br#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"echo","arguments":{"text":"hi"}}}"#;
    let reply = d.handle_message(codec::decode(line).unwrap()).await.unwrap();
    let bytes = codec::encode(&reply).unwrap();
    assert_eq!(
        String::from_utf8(bytes).unwrap(),
        "{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{\"content\":[{\"type\":\"text\",\"text\":\"hi\"}],\"isError\":false}}\n"
    );
}

#[tokio::test]
async fn test_initialize_result_shape() {
    let d = dispatcher();
    let resp = send_unwrap(&d, init_request("2024-11-05")).await;
    let result = &resp["result"];
    assert_eq!(result["protocolVersion"], "2024-11-05");
    assert_eq!(result["serverInfo"]["name"], "fluentmcp");
    assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
    assert!(result["capabilities"]["prompts"].is_object());
    assert!(result["capabilities"]["resources"].is_object());
    assert_eq!(d.state().await, SessionState::Ready);
}

#[tokio::test]
async fn test_unsupported_version_then_retry() {
    let d = dispatcher();
    let resp = send_unwrap(&d, init_request("1999-01-01")).await;
    assert_eq!(resp["error"]["code"], -32602);
    assert_eq!(resp["error"]["data"]["requested"], "1999-01-01");
    assert_eq!(
        resp["error"]["data"]["supported"],
        json!(["2025-06-18", "2025-03-26", "2024-11-05"])
    );
    assert_eq!(d.state().await, SessionState::Uninitialized);

    let resp = send_unwrap(&d, init_request("2025-03-26")).await;
    assert_eq!(resp["result"]["protocolVersion"], "2025-03-26");
    assert_eq!(d.state().await, SessionState::Ready);
}

#[tokio::test]
async fn test_methods_before_initialize_rejected() {
    let d = dispatcher();
    for method in [
        "ping",
        "tools/list",
        "tools/call",
        "prompts/list",
        "prompts/get",
        "resources/list",
        "resources/read",
        "no/such/method",
    ] {
        let resp = send_unwrap(&d, mcp_request(3, method, json!({}))).await;
        assert_eq!(resp["error"]["code"], -32002, "method {method}");
        assert_eq!(resp["id"], 3);
    }

    // Notifications before Ready are dropped silently.
    assert!(send(&d, json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }))
        .await
        .is_none());
    assert_eq!(d.state().await, SessionState::Uninitialized);
}

#[tokio::test]
async fn test_second_initialize_rejected() {
    let d = ready_dispatcher().await;
    let resp = send_unwrap(&d, init_request("2025-06-18")).await;
    assert_eq!(resp["error"]["code"], -32600);
    assert_eq!(d.state().await, SessionState::Ready);
}

#[tokio::test]
async fn test_ping_and_unknown_method() {
    let d = ready_dispatcher().await;
    let resp = send_unwrap(&d, mcp_request(2, "ping", json!({}))).await;
    assert_eq!(resp["result"], json!({}));

    let resp = send_unwrap(&d, mcp_request(3, "sampling/createMessage", json!({}))).await;
    assert_eq!(resp["error"]["code"], -32601);
    assert!(resp["error"]["message"]
        .as_str()
        .unwrap()
        .contains("sampling/createMessage"));
}

#[tokio::test]
async fn test_blank_method_is_invalid_request() {
    let d = ready_dispatcher().await;
    for method in ["", "  "] {
        let resp = send_unwrap(&d, mcp_request(4, method, json!({}))).await;
        assert_eq!(resp["error"]["code"], -32600, "method {method:?}");
        assert_eq!(resp["id"], 4);
    }
}

#[tokio::test]
async fn test_client_responses_ignored() {
    let d = ready_dispatcher().await;
    assert!(send(&d, json!({ "jsonrpc": "2.0", "id": 9, "result": {} }))
        .await
        .is_none());
    assert!(send(
        &d,
        json!({ "jsonrpc": "2.0", "method": "notifications/cancelled", "params": { "requestId": 5 } })
    )
    .await
    .is_none());
}

// ═══════════════════════════════════════════════════════
// LISTING
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_lists_in_registration_order_and_idempotent() {
    let d = ready_dispatcher().await;

    let first = send_unwrap(&d, mcp_request(1, "tools/list", json!({}))).await;
    let names: Vec<&str> = first["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["echo", "count", "boom", "panics", "sleepy", "scale"]);
    assert!(first["result"].get("nextCursor").is_none());

    let second = send_unwrap(&d, mcp_request(1, "tools/list", json!({}))).await;
    assert_eq!(first, second);

    let prompts = send_unwrap(&d, mcp_request(2, "prompts/list", json!({}))).await;
    let names: Vec<&str> = prompts["result"]["prompts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["greet", "dialog", "broken", "slow"]);

    let resources = send_unwrap(&d, mcp_request(3, "resources/list", json!({}))).await;
    let uris: Vec<&str> = resources["result"]["resources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["uri"].as_str().unwrap())
        .collect();
    assert_eq!(uris, vec!["test://readme", "test://bytes", "test://failing"]);
}

#[tokio::test]
async fn test_tool_list_exposes_schema() {
    let d = ready_dispatcher().await;
    let resp = send_unwrap(&d, mcp_request(1, "tools/list", json!({}))).await;
    let scale = &resp["result"]["tools"][5];
    assert_eq!(scale["description"], "Scale a value");
    assert_eq!(
        scale["inputSchema"],
        json!({
            "type": "object",
            "properties": {
                "value": { "type": "integer" },
                "factor": { "type": "number" }
            },
            "required": ["value"]
        })
    );
}

// ═══════════════════════════════════════════════════════
// TOOLS
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_unknown_tool_echoes_name() {
    let d = ready_dispatcher().await;
    let resp = call_tool(&d, "does-not-exist", json!({})).await;
    assert_eq!(resp["error"]["code"], -32803);
    assert!(resp["error"]["message"]
        .as_str()
        .unwrap()
        .contains("does-not-exist"));
}

#[tokio::test]
async fn test_missing_required_argument() {
    let d = ready_dispatcher().await;
    let resp = call_tool(&d, "count", json!({ "label": "x" })).await;
    assert_eq!(resp["error"]["code"], -32602);
    assert!(resp["error"]["message"]
        .as_str()
        .unwrap()
        .ends_with("Missing required argument(s): n"));

    let resp = call_tool(&d, "echo", json!("not an object")).await;
    assert_eq!(resp["error"]["code"], -32602);
}

#[tokio::test]
async fn test_numeric_strings_coerced_extras_pass_through() {
    let d = ready_dispatcher().await;
    let resp = call_tool(&d, "count", json!({ "n": "42", "label": 7, "extra": true })).await;
    let text = resp["result"]["content"][0]["text"].as_str().unwrap();
    let echoed: Value = serde_json::from_str(text).unwrap();
    assert_eq!(echoed, json!({ "n": 42, "label": 7, "extra": true }));
    assert_eq!(resp["result"]["isError"], false);
}

#[tokio::test]
async fn test_failing_tool_is_error_result() {
    let d = ready_dispatcher().await;
    let resp = call_tool(&d, "boom", json!({})).await;
    assert!(resp.get("error").is_none());
    assert_eq!(resp["result"]["isError"], true);
    assert_eq!(resp["result"]["content"][0]["text"], "kaboom");
}

#[tokio::test]
async fn test_panicking_tool_is_error_result() {
    let d = ready_dispatcher().await;
    let resp = call_tool(&d, "panics", json!({})).await;
    assert_eq!(resp["id"], 5);
    assert_eq!(resp["result"]["isError"], true);
    assert!(resp["result"]["content"][0]["text"]
        .as_str()
        .unwrap()
        .contains("handler blew up"));

    // The session survives.
    let resp = call_tool(&d, "echo", json!({ "text": "still here" })).await;
    assert_eq!(resp["result"]["content"][0]["text"], "still here");
}

#[tokio::test]
async fn test_timed_out_tool_is_error_result() {
    let d = ready_dispatcher().await;
    let resp = call_tool(&d, "sleepy", json!({})).await;
    assert_eq!(resp["result"]["isError"], true);
    assert!(resp["result"]["content"][0]["text"]
        .as_str()
        .unwrap()
        .contains("timed out"));
}

#[tokio::test]
async fn test_typed_tool() {
    let d = ready_dispatcher().await;
    let resp = call_tool(&d, "scale", json!({ "value": "4", "factor": "2.5" })).await;
    assert_eq!(resp["result"]["content"][0]["text"], "10");

    // Validation passes (factor is optional) but deserialization fails.
    let resp = call_tool(&d, "scale", json!({ "value": 4 })).await;
    assert_eq!(resp["result"]["isError"], true);
    assert!(resp["result"]["content"][0]["text"]
        .as_str()
        .unwrap()
        .starts_with("Invalid arguments"));
}

// ═══════════════════════════════════════════════════════
// PROMPTS
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_plain_text_prompt_is_single_user_message() {
    let d = ready_dispatcher().await;
    let resp = send_unwrap(
        &d,
        mcp_request(4, "prompts/get", json!({ "name": "greet", "arguments": { "name": "Ada" } })),
    )
    .await;
    assert_eq!(
        resp["result"]["messages"],
        json!([{ "role": "user", "content": { "type": "text", "text": "Hello, Ada" } }])
    );
}

#[tokio::test]
async fn test_prompt_arguments_stringified() {
    let d = ready_dispatcher().await;
    let resp = send_unwrap(
        &d,
        mcp_request(4, "prompts/get", json!({ "name": "greet", "arguments": { "name": 42 } })),
    )
    .await;
    assert_eq!(resp["result"]["messages"][0]["content"]["text"], "Hello, 42");
}

#[tokio::test]
async fn test_prompt_missing_argument() {
    let d = ready_dispatcher().await;
    let resp = send_unwrap(&d, mcp_request(4, "prompts/get", json!({ "name": "greet" }))).await;
    assert_eq!(resp["error"]["code"], -32602);
    assert!(resp["error"]["message"].as_str().unwrap().contains("name"));
}

#[tokio::test]
async fn test_prompt_messages_keep_order() {
    let d = ready_dispatcher().await;
    let resp = send_unwrap(&d, mcp_request(4, "prompts/get", json!({ "name": "dialog" }))).await;
    let messages = resp["result"]["messages"].as_array().unwrap();
    let pairs: Vec<(&str, &str)> = messages
        .iter()
        .map(|m| {
            (
                m["role"].as_str().unwrap(),
                m["content"]["text"].as_str().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        pairs,
        vec![("user", "one"), ("assistant", "two"), ("user", "three")]
    );
}

#[tokio::test]
async fn test_prompt_errors() {
    let d = ready_dispatcher().await;

    let resp = send_unwrap(&d, mcp_request(4, "prompts/get", json!({ "name": "nope" }))).await;
    assert_eq!(resp["error"]["code"], -32804);
    assert!(resp["error"]["message"].as_str().unwrap().contains("nope"));

    let resp = send_unwrap(&d, mcp_request(4, "prompts/get", json!({ "name": "broken" }))).await;
    assert_eq!(resp["error"]["code"], -32603);

    let resp = send_unwrap(&d, mcp_request(4, "prompts/get", json!({ "name": "slow" }))).await;
    assert_eq!(resp["error"]["code"], -32805);
}

// ═══════════════════════════════════════════════════════
// RESOURCES
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_text_resource() {
    let d = ready_dispatcher().await;
    let resp = send_unwrap(&d, mcp_request(6, "resources/read", json!({ "uri": "test://readme" }))).await;
    assert_eq!(
        resp["result"],
        json!({ "contents": [{ "uri": "test://readme", "mimeType": "text/plain", "text": "hello" }] })
    );
}

#[tokio::test]
async fn test_blob_resource_is_base64_with_mime_type() {
    let d = ready_dispatcher().await;
    let resp = send_unwrap(&d, mcp_request(6, "resources/read", json!({ "uri": "test://bytes" }))).await;
    let content = &resp["result"]["contents"][0];
    assert_eq!(content["mimeType"], "application/octet-stream");
    assert_eq!(content["blob"], "AAEC/f7/");
    assert!(content.get("text").is_none());
}

#[tokio::test]
async fn test_resource_errors() {
    let d = ready_dispatcher().await;

    let resp = send_unwrap(&d, mcp_request(6, "resources/read", json!({ "uri": "test://missing" }))).await;
    assert_eq!(resp["error"]["code"], -32802);
    assert!(resp["error"]["message"]
        .as_str()
        .unwrap()
        .contains("test://missing"));

    let resp = send_unwrap(&d, mcp_request(6, "resources/read", json!({ "uri": "test://failing" }))).await;
    assert_eq!(resp["error"]["code"], -32603);
    assert!(resp["error"]["message"].as_str().unwrap().contains("disk on fire"));

    let resp = send_unwrap(&d, mcp_request(6, "resources/read", json!({}))).await;
    assert_eq!(resp["error"]["code"], -32602);
}

#[tokio::test]
async fn test_string_ids_preserved() {
    let d = ready_dispatcher().await;
    let resp = send_unwrap(
        &d,
        json!({ "jsonrpc": "2.0", "id": "abc-1", "method": "ping" }),
    )
    .await;
    assert_eq!(resp["id"], "abc-1");
}
