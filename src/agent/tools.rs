//! Built-in agent tools
//!
//! Agents allowed to end their team's run are offered `terminate_team`.

use serde_json::json;

use crate::core::{ToolCall, ToolDefinition};

/// Name of the tool that stops the enclosing team
pub const TERMINATE_TOOL: &str = "terminate_team";

/// Tool result recorded after a termination call
pub const TERMINATE_RESULT: &str = "Team conversation terminated.";

/// Definition of the `terminate_team` tool
pub fn terminate_tool() -> ToolDefinition {
    ToolDefinition::function(
        TERMINATE_TOOL,
        "End the team conversation. Call this once the task is complete and no other participant needs to act.",
        json!({
            "type": "object",
            "properties": {
                "reason": {
                    "type": "string",
                    "description": "Why the conversation is complete"
                }
            },
            "required": []
        }),
    )
}

/// Find a termination request among the calls a model made
pub fn find_termination(tool_calls: &[ToolCall]) -> Option<&ToolCall> {
    tool_calls.iter().find(|tc| tc.name == TERMINATE_TOOL)
}

/// Reason given for a termination, with a fallback
pub fn termination_reason(call: &ToolCall) -> String {
    call.get_string("reason")
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| "task complete".to_string())
}
