//! CLI commands
//!
//! Special commands that can be executed in the REPL.

use crate::cli::session::{Session, Target};
use crate::core::Result;

/// Result of parsing a command
pub enum CommandResult {
    /// Continue processing as normal input
    Continue(String),
    /// Command was handled, show output
    Handled(String),
    /// Exit the REPL
    Exit,
    /// Clear session memory
    Clear,
}

/// Parse and handle special commands
pub async fn handle_command(input: &str, session: &mut Session) -> Result<CommandResult> {
    let input = input.trim();
    let mut parts = input.splitn(2, ' ');
    let cmd = parts.next().unwrap_or_default().to_lowercase();
    let args = parts.next().map(str::trim).unwrap_or("");

    match cmd.as_str() {
        "exit" | "quit" | "q" => Ok(CommandResult::Exit),

        "clear" | "reset" => {
            session.clear();
            Ok(CommandResult::Clear)
        }

        "help" | "?" => Ok(CommandResult::Handled(help_text())),

        "models" => {
            let models = session.orchestrator().resolver().llm().list_models().await?;
            let output = format!(
                "Available models:\n{}\n\nDefaults:\n  Agents:   {}\n  Selector: {}",
                models
                    .iter()
                    .map(|m| format!("  - {}", m))
                    .collect::<Vec<_>>()
                    .join("\n"),
                session.config().models.default,
                session.config().models.selector
            );
            Ok(CommandResult::Handled(output))
        }

        "teams" => {
            let store = session.orchestrator().resolver().store();
            let teams = store.team_names();
            let agents = store.agent_names();
            Ok(CommandResult::Handled(format!(
                "Namespace: {}\nTeams:\n{}\nAgents:\n{}",
                store.namespace(),
                bullet_list(&teams),
                bullet_list(&agents)
            )))
        }

        "use" => Ok(CommandResult::Handled(use_target(args, session))),

        "status" => {
            let usage = session.usage();
            let status = format!(
                "Conductor Status:\n\
                 ─────────────────────────────\n\
                 Target:   {}\n\
                 Session:  {}\n\
                 Memory:   {} messages\n\
                 Tokens:   {} (prompt {}, completion {})\n\
                 Ollama:   {}",
                session.target(),
                session.session_id(),
                session.memory_len(),
                usage.total_tokens,
                usage.prompt_tokens,
                usage.completion_tokens,
                session.config().ollama_url()
            );
            Ok(CommandResult::Handled(status))
        }

        "responses" => Ok(CommandResult::Handled(format_responses(session))),

        "usage" => {
            let session_usage = session.usage();
            let total = session.orchestrator().token_summary();
            Ok(CommandResult::Handled(format!(
                "Session tokens: {} (prompt {}, completion {})\nProcess tokens: {}",
                session_usage.total_tokens,
                session_usage.prompt_tokens,
                session_usage.completion_tokens,
                total.total_tokens
            )))
        }

        _ => {
            // Not a command, treat as normal input
            if input.starts_with('/') {
                Ok(CommandResult::Handled(format!(
                    "Unknown command: {}. Type 'help' for available commands.",
                    cmd
                )))
            } else {
                Ok(CommandResult::Continue(input.to_string()))
            }
        }
    }
}

/// Switch the session to a team, or to an agent when no team has the name
fn use_target(name: &str, session: &mut Session) -> String {
    if name.is_empty() {
        return format!("Current target: {}\nUsage: use <team|agent>", session.target());
    }

    let store = session.orchestrator().resolver().store();
    let target = if store.team(name).is_some() {
        Target::Team(name.to_string())
    } else if store.agent(name).is_some() {
        Target::Agent(name.to_string())
    } else {
        return format!("No team or agent named {}", name);
    };

    session.set_target(target);
    format!("Now using {}. Session memory cleared.", session.target())
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "  (none)".to_string();
    }
    items
        .iter()
        .map(|i| format!("  - {}", i))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_responses(session: &Session) -> String {
    let responses = session.last_responses();
    if responses.is_empty() {
        return "No responses captured yet.".to_string();
    }

    let mut output = String::from("Member responses (last run):\n");
    for response in responses {
        output.push_str(&format!(
            "  [turn {}] {} ({}) {:?}",
            response.turn, response.agent_name, response.agent_type, response.duration
        ));
        if let Some(usage) = response.token_usage.filter(|u| !u.is_empty()) {
            output.push_str(&format!(", {} tokens", usage.total_tokens));
        }
        for call in &response.tool_calls {
            output.push_str(&format!(", tool {}({})", call.name, call.parameters));
        }
        if let Some(error) = &response.error {
            output.push_str(&format!("\n      error: {}", error));
        }
        output.push('\n');
    }
    output
}

/// Get help text
fn help_text() -> String {
    r#"Conductor Commands:
─────────────────────────────────────────────────────────
  help, ?          Show this help message
  exit, quit, q    Exit Conductor
  clear, reset     Clear session memory
  status           Show current target and session
  teams            List teams and agents in the definitions
  use <name>       Run queries against another team or agent
  responses        Show member responses from the last run
  usage            Show token usage
  models           List available models

Anything else is sent to the current team or agent.
Ctrl-C cancels a run in progress; at the prompt it exits."#
        .to_string()
}
