//! Definition resolution and orchestrator integration tests

mod common;

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use url::Url;

use common::{contents, ScriptedLlm};
use conductor::agent::RemoteClient;
use conductor::core::{Role, ToolCall};
use conductor::definitions::{AgentSpec, DefinitionStore, MemberRef, TeamSpec};
use conductor::llm::LLMResponse;
use conductor::{
    ConductorError, ExecutionContext, FileStore, MemberResolver, MemberType, Message, Orchestrator,
    Result, Strategy,
};

const DEFINITIONS: &str = r#"
namespace = "studio"

[[agents]]
name = "writer"
description = "Writes drafts"
prompt = "You write."
hydrate_system_prompt = true

[[agents]]
name = "editor"
description = "Tightens drafts"
prompt = "You edit."
can_terminate = true

[[agents]]
name = "scout"
description = "Remote researcher"
[agents.remote]
address = "http://scout.local/a2a"
headers = { "x-api-key" = "secret" }

[[teams]]
name = "desk"
strategy = "sequential"
members = [{ name = "writer", type = "agent" }, { name = "editor", type = "agent" }]

[[teams]]
name = "newsroom"
strategy = "round-robin"
max_turns = 3
members = [{ name = "desk", type = "team" }, { name = "scout", type = "agent" }]

[[teams]]
name = "picker"
strategy = "selector"
max_turns = 1
members = [{ name = "writer", type = "agent" }, { name = "editor", type = "agent" }]
[teams.selector]
model = "tiny"
prompt = "Pick from {{participants}}"

[[teams]]
name = "flow"
strategy = "graph"
members = [{ name = "writer", type = "agent" }, { name = "editor", type = "agent" }]
[teams.graph]
edges = [{ from = "writer", to = "editor" }]
"#;

/// Remote transport that echoes the text back and records headers
#[derive(Default)]
struct Echo {
    calls: Mutex<Vec<(String, BTreeMap<String, String>)>>,
}

#[async_trait]
impl RemoteClient for Echo {
    async fn send_message(
        &self,
        address: &Url,
        headers: &BTreeMap<String, String>,
        text: &str,
    ) -> Result<String> {
        self.calls.lock().push((address.to_string(), headers.clone()));
        Ok(format!("scouted: {}", text))
    }
}

fn store() -> Arc<FileStore> {
    Arc::new(assert_ok!(FileStore::from_toml(DEFINITIONS)))
}

fn resolver(store: Arc<FileStore>, llm: Arc<ScriptedLlm>) -> MemberResolver {
    MemberResolver::new(store, llm)
        .with_remote_client(Arc::new(Echo::default()))
        .with_models("base-model", "selector-model")
}

#[test]
fn test_resolve_nested_team() {
    let resolver = resolver(store(), ScriptedLlm::new(vec![]));

    let team = assert_ok!(resolver.resolve_team("newsroom"));
    assert_eq!(team.full_name(), "studio/newsroom");
    assert_eq!(team.strategy(), Strategy::RoundRobin);
    assert_eq!(team.max_turns(), Some(3));

    let kinds: Vec<MemberType> = team.members().iter().map(|m| m.member_type()).collect();
    assert_eq!(kinds, vec![MemberType::Team, MemberType::Agent]);
}

#[test]
fn test_resolve_graph_edges() {
    let resolver = resolver(store(), ScriptedLlm::new(vec![]));

    let team = assert_ok!(resolver.resolve_team("flow"));
    assert_eq!(team.edges().len(), 1);
    assert_eq!(team.edges()[0].to, "editor");
}

#[test]
fn test_missing_definitions() {
    let store = store();
    store.upsert_team(TeamSpec {
        name: "broken".to_string(),
        strategy: "sequential".to_string(),
        members: vec![MemberRef::agent("ghost")],
        ..Default::default()
    });
    let resolver = resolver(store, ScriptedLlm::new(vec![]));

    assert!(matches!(
        resolver.resolve_agent("nobody"),
        Err(ConductorError::AgentNotFound { name, team }) if name == "nobody" && team == "query"
    ));
    assert!(matches!(
        resolver.resolve_team("nowhere"),
        Err(ConductorError::TeamNotFound { name, .. }) if name == "nowhere"
    ));
    assert!(matches!(
        resolver.resolve_team("broken"),
        Err(ConductorError::AgentNotFound { name, team }) if name == "ghost" && team == "studio/broken"
    ));
}

#[test]
fn test_invalid_team_definitions() {
    let store = store();
    let member = vec![MemberRef::agent("writer")];
    store.upsert_team(TeamSpec {
        name: "parallel".to_string(),
        strategy: "parallel".to_string(),
        members: member.clone(),
        ..Default::default()
    });
    store.upsert_team(TeamSpec {
        name: "hollow".to_string(),
        strategy: "sequential".to_string(),
        ..Default::default()
    });
    store.upsert_team(TeamSpec {
        name: "odd".to_string(),
        strategy: "sequential".to_string(),
        members: vec![MemberRef {
            name: "writer".to_string(),
            kind: "robot".to_string(),
        }],
        ..Default::default()
    });
    store.upsert_team(TeamSpec {
        name: "loop".to_string(),
        strategy: "sequential".to_string(),
        members: vec![MemberRef::team("loop")],
        ..Default::default()
    });
    let resolver = resolver(store, ScriptedLlm::new(vec![]));

    assert!(matches!(
        resolver.resolve_team("parallel"),
        Err(ConductorError::UnsupportedStrategy { strategy, .. }) if strategy == "parallel"
    ));
    assert!(matches!(
        resolver.resolve_team("hollow"),
        Err(ConductorError::EmptyTeam(name)) if name == "studio/hollow"
    ));
    assert!(matches!(
        resolver.resolve_team("odd"),
        Err(ConductorError::UnsupportedMemberType { kind, member, .. }) if kind == "robot" && member == "writer"
    ));
    assert!(matches!(
        resolver.resolve_team("loop"),
        Err(ConductorError::TeamCycle(name)) if name == "studio/loop"
    ));
}

#[test]
fn test_graph_edge_to_non_member() {
    let store = store();
    store.upsert_team(TeamSpec {
        name: "stray".to_string(),
        strategy: "graph".to_string(),
        members: vec![MemberRef::agent("writer")],
        graph: Some(conductor::definitions::GraphSpec {
            edges: vec![conductor::Edge::new("writer", "editor")],
        }),
        ..Default::default()
    });
    let resolver = resolver(store, ScriptedLlm::new(vec![]));

    let err = assert_err!(resolver.resolve_team("stray"));
    assert!(matches!(err, ConductorError::UnknownGraphMember { member, .. } if member == "editor"));
}

#[test]
fn test_invalid_remote_address() {
    let store = store();
    store.upsert_agent(AgentSpec {
        name: "far".to_string(),
        remote: Some(conductor::definitions::RemoteSpec {
            address: "ftp://far.local".to_string(),
            headers: BTreeMap::new(),
        }),
        ..Default::default()
    });
    store.upsert_agent(AgentSpec {
        name: "nowhere".to_string(),
        remote: Some(conductor::definitions::RemoteSpec {
            address: "not a url".to_string(),
            headers: BTreeMap::new(),
        }),
        ..Default::default()
    });
    let resolver = resolver(store, ScriptedLlm::new(vec![]));

    assert!(matches!(resolver.resolve_agent("far"), Err(ConductorError::Config(_))));
    assert!(matches!(resolver.resolve_agent("nowhere"), Err(ConductorError::Config(_))));
}

#[test]
fn test_remote_agent_requires_client() {
    let resolver = MemberResolver::new(store(), ScriptedLlm::new(vec![]));
    assert!(matches!(resolver.resolve_agent("scout"), Err(ConductorError::Config(_))));
}

#[tokio::test]
async fn test_definitions_resolved_fresh_per_query() {
    let store = store();
    let llm = ScriptedLlm::answering(|_| "draft".to_string());
    let orchestrator = Orchestrator::new(resolver(store.clone(), llm.clone()));
    let input = [Message::user("write")];

    assert_ok!(
        orchestrator
            .run_agent(ExecutionContext::new(), "writer", &input, &[])
            .await
    );

    store.upsert_agent(AgentSpec {
        name: "writer".to_string(),
        prompt: "You write poems.".to_string(),
        model: Some("poet".to_string()),
        ..Default::default()
    });
    assert_ok!(
        orchestrator
            .run_agent(ExecutionContext::new(), "writer", &input, &[])
            .await
    );

    let requests = llm.requests();
    assert_eq!(requests[0][0].content, "You write.");
    assert_eq!(requests[1][0].content, "You write poems.");
}

#[tokio::test]
async fn test_run_agent_hydrates_memory_once() {
    let llm = ScriptedLlm::answering(|_| "draft".to_string());
    let orchestrator = Orchestrator::new(resolver(store(), llm.clone()));

    let first = assert_ok!(
        orchestrator
            .run_agent(ExecutionContext::new(), "writer", &[Message::user("one")], &[])
            .await
    );
    assert!(first.is_ok());
    assert_eq!(contents(&first.memory_messages), vec!["You write.", "one", "draft"]);
    assert_eq!(first.memory_messages[0].role, Role::System);

    let memory = first.memory_messages.clone();
    let second = assert_ok!(
        orchestrator
            .run_agent(ExecutionContext::new(), "writer", &[Message::user("two")], &memory)
            .await
    );
    assert_eq!(contents(&second.memory_messages), vec!["two", "draft"]);

    // The hydrated prompt leads memory, so it is not sent twice
    let requests = llm.requests();
    let system_count = requests[1].iter().filter(|m| m.is_system()).count();
    assert_eq!(system_count, 1);
    assert_eq!(contents(&requests[1]), vec!["You write.", "one", "draft", "two"]);
}

#[tokio::test]
async fn test_run_team_reports_responses_and_memory() {
    let llm = ScriptedLlm::answering(|messages| format!("reply to {}", messages.len()));
    let orchestrator = Orchestrator::new(resolver(store(), llm));

    let report = assert_ok!(
        orchestrator
            .run_team(ExecutionContext::new(), "desk", &[Message::user("hello")], &[])
            .await
    );

    assert!(report.is_ok());
    // writer sees [system, input]; editor sees [system, writer output, input]
    assert_eq!(contents(&report.new_messages), vec!["reply to 2", "reply to 3"]);
    assert_eq!(report.final_content(), Some("reply to 3"));

    // The writer hydrates the team's memory
    assert_eq!(
        contents(&report.memory_messages),
        vec!["You write.", "hello", "reply to 2", "reply to 3"]
    );

    let names: Vec<&str> = report.responses.iter().map(|r| r.agent_name.as_str()).collect();
    assert_eq!(names, vec!["writer", "editor"]);
}

#[tokio::test]
async fn test_agent_termination_stops_round_robin() {
    let terminate = LLMResponse {
        tool_calls: vec![ToolCall::new("terminate_team", json!({ "reason": "good enough" }))],
        ..Default::default()
    };
    let llm = ScriptedLlm::new(vec![LLMResponse::text("draft"), terminate]);
    let store = store();
    store.upsert_team(TeamSpec {
        name: "loop".to_string(),
        strategy: "round-robin".to_string(),
        max_turns: Some(10),
        members: vec![MemberRef::agent("writer"), MemberRef::agent("editor")],
        ..Default::default()
    });
    let orchestrator = Orchestrator::new(resolver(store, llm.clone()));

    let report = assert_ok!(
        orchestrator
            .run_team(ExecutionContext::new(), "loop", &[Message::user("go")], &[])
            .await
    );

    assert!(report.is_ok());
    assert_eq!(llm.requests().len(), 2);
    assert_eq!(report.new_messages.len(), 3);
    assert_eq!(report.new_messages[2].role, Role::Tool);

    let editor = &report.responses[1];
    assert_eq!(editor.tool_calls.len(), 1);
    assert_eq!(editor.tool_calls[0].name, "terminate_team");
}

#[tokio::test]
async fn test_remote_member_in_team() {
    let llm = ScriptedLlm::answering(|_| "ok".to_string());
    let echo = Arc::new(Echo::default());
    let resolver = MemberResolver::new(store(), llm).with_remote_client(echo.clone());
    let orchestrator = Orchestrator::new(resolver);

    let report = assert_ok!(
        orchestrator
            .run_agent(ExecutionContext::new(), "scout", &[Message::user("find sources")], &[])
            .await
    );

    assert_eq!(report.final_content(), Some("scouted: find sources"));
    let calls = echo.calls.lock();
    assert_eq!(calls[0].0, "http://scout.local/a2a");
    assert_eq!(calls[0].1["x-api-key"], "secret");
}

#[tokio::test]
async fn test_selector_uses_team_settings() {
    let llm = ScriptedLlm::answering(|messages| {
        if messages[0].content.starts_with("Pick from") {
            "editor".to_string()
        } else {
            "edited".to_string()
        }
    });
    let orchestrator = Orchestrator::new(resolver(store(), llm.clone()));

    let report = assert_ok!(
        orchestrator
            .run_team(ExecutionContext::new(), "picker", &[Message::user("go")], &[])
            .await
    );

    assert_eq!(contents(&report.new_messages), vec!["edited"]);
    assert!(matches!(report.error, Some(ConductorError::MaxTurns { max_turns: 1, .. })));
    assert_eq!(llm.requests()[0][0].content, "Pick from writer, editor");
}

#[tokio::test]
async fn test_empty_input_rejected() {
    let orchestrator = Orchestrator::new(resolver(store(), ScriptedLlm::new(vec![])));

    let err = assert_err!(
        orchestrator
            .run_team(ExecutionContext::new(), "desk", &[], &[])
            .await
    );
    assert!(matches!(err, ConductorError::EmptyInput));
}

#[test]
fn test_file_store_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(DEFINITIONS.as_bytes()).unwrap();

    let store = assert_ok!(FileStore::load(file.path()));
    assert_eq!(store.namespace(), "studio");
    assert_eq!(store.team_names().len(), 4);
}
