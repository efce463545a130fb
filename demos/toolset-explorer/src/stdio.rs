//! Line-delimited JSON-RPC over stdin/stdout for one session.

use std::sync::Arc;

use anyhow::Result;
use serde_json::{Value, json};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use toolset_session::{Session, SessionError};
use tracing::{debug, info};

const PROTOCOL_VERSION: &str = "2024-11-05";

pub async fn serve(session: Arc<Session>) -> Result<()> {
    let mut stdout = io::stdout();
    let mut lines = BufReader::new(io::stdin()).lines();
    info!(session_id = %session.id(), "serving on stdio");

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let request: Value = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(err) => {
                let error = failure(&Value::Null, -32700, &format!("Parse error: {err}"));
                write(&mut stdout, &error).await?;
                continue;
            }
        };

        // Notifications get no response.
        let Some(id) = request.get("id").cloned() else {
            continue;
        };

        let before = session.bound_count();
        let response = handle(&session, &id, &request).await;
        write(&mut stdout, &response).await?;

        if session.bound_count() != before {
            let changed = json!({
                "jsonrpc": "2.0",
                "method": "notifications/tools/list_changed",
            });
            write(&mut stdout, &changed).await?;
        }
    }
    Ok(())
}

async fn handle(session: &Session, id: &Value, request: &Value) -> Value {
    let method = request.get("method").and_then(Value::as_str).unwrap_or_default();
    debug!(method, "request received");
    match method {
        "initialize" => success(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": { "listChanged": true } },
                "serverInfo": {
                    "name": "toolset-explorer",
                    "version": env!("CARGO_PKG_VERSION"),
                },
            }),
        ),
        "ping" => success(id, json!({})),
        "tools/list" => success(id, json!({ "tools": session.tool_listing() })),
        "tools/call" => {
            let params = request.get("params").cloned().unwrap_or(Value::Null);
            let Some(name) = params.get("name").and_then(Value::as_str) else {
                return failure(id, -32602, "missing tool name");
            };
            let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
            match session.call(name, arguments).await {
                Ok(result) => success(id, result.to_protocol()),
                Err(err @ SessionError::UnknownCapability { .. }) => {
                    failure(id, -32602, &err.to_string())
                }
                Err(err) => failure(id, -32603, &err.to_string()),
            }
        }
        other => failure(id, -32601, &format!("Method not found: {other}")),
    }
}

fn success(id: &Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn failure(id: &Value, code: i64, message: &str) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
}

async fn write(stdout: &mut Stdout, message: &Value) -> Result<()> {
    stdout.write_all(format!("{message}\n").as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}
