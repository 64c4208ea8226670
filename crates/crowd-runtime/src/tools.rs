//! Built-in tools

use chrono::Utc;
use crowd_core::{AgentError, FnTool, Parameters, Result, ToolContext, ToolRegistry};
use serde_json::{Value, json};

/// Current time as `iso` (RFC 3339, default), `unix` seconds or `human`
pub fn datetime_tool() -> FnTool {
    FnTool::new(
        "datetime",
        "Returns the current UTC date and time. Arguments: format = iso | unix | human",
        current_datetime,
    )
}

fn current_datetime(_: &ToolContext, arguments: &Parameters) -> Result<Value> {
    let now = Utc::now();
    match arguments.get("format").and_then(Value::as_str).unwrap_or("iso") {
        "iso" => Ok(json!(now.to_rfc3339())),
        "unix" => Ok(json!(now.timestamp())),
        "human" => Ok(json!(now.format("%A, %B %-d %Y, %H:%M UTC").to_string())),
        other => Err(AgentError::ToolExecution(format!(
            "Unknown format '{other}' (expected iso, unix or human)"
        ))),
    }
}

/// Register every built-in tool
pub fn register_builtin_tools(registry: &ToolRegistry) -> Result<()> {
    registry.register(datetime_tool())
}
