//! Team module - the strategy engine
//!
//! A team is a group of members plus one strategy deciding who executes
//! next. Teams are members themselves, so they nest.
//!
//! # Strategies
//!
//! - **sequential**: every member once, in declaration order
//! - **round-robin**: full cycles over all members until termination or MaxTurns
//! - **selector**: a model picks the next member at every step
//! - **graph**: breadth-first over an edge list, each member at most once

pub mod engine;
pub mod graph;
pub mod selector;
pub mod strategy;
pub mod turns;

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::agent::member::{Execution, MemberType, TeamMember};
use crate::core::{ConductorError, ExecutionContext, Message, Result};
use crate::telemetry::{EventSink, OperationTracker, TokenCounter, TokenUsageCollector, TracingSink};

pub use graph::Edge;
pub use selector::Selector;
pub use turns::TurnBudget;

/// Execution strategy of a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Sequential,
    RoundRobin,
    Selector,
    Graph,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Sequential => "sequential",
            Strategy::RoundRobin => "round-robin",
            Strategy::Selector => "selector",
            Strategy::Graph => "graph",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = ConductorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sequential" => Ok(Strategy::Sequential),
            "round-robin" => Ok(Strategy::RoundRobin),
            "selector" => Ok(Strategy::Selector),
            "graph" => Ok(Strategy::Graph),
            other => Err(ConductorError::UnsupportedStrategy {
                strategy: other.to_string(),
                team: String::new(),
            }),
        }
    }
}

/// A group of members run under one strategy
pub struct Team {
    name: String,
    namespace: String,
    description: String,
    members: Vec<Arc<dyn TeamMember>>,
    strategy: Strategy,
    max_turns: Option<usize>,
    selector: Option<Selector>,
    edges: Vec<Edge>,
    sink: Arc<dyn EventSink>,
    tokens: Arc<dyn TokenCounter>,
}

impl std::fmt::Debug for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Team")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("strategy", &self.strategy)
            .field("members", &self.members.len())
            .finish_non_exhaustive()
    }
}

/// Builder for creating Teams
pub struct TeamBuilder {
    name: String,
    namespace: String,
    description: String,
    members: Vec<Arc<dyn TeamMember>>,
    strategy: Strategy,
    max_turns: Option<usize>,
    selector: Option<Selector>,
    edges: Vec<Edge>,
    sink: Option<Arc<dyn EventSink>>,
    tokens: Option<Arc<dyn TokenCounter>>,
}

impl TeamBuilder {
    /// Create a new builder with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: "default".to_string(),
            description: String::new(),
            members: Vec::new(),
            strategy: Strategy::Sequential,
            max_turns: None,
            selector: None,
            edges: Vec::new(),
            sink: None,
            tokens: None,
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add one member; declaration order is execution order
    pub fn member(mut self, member: Arc<dyn TeamMember>) -> Self {
        self.members.push(member);
        self
    }

    pub fn members(mut self, members: Vec<Arc<dyn TeamMember>>) -> Self {
        self.members.extend(members);
        self
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn max_turns(mut self, max_turns: Option<usize>) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Model-backed selector for the selector strategy
    pub fn selector(mut self, selector: Selector) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Graph edges for the graph strategy
    pub fn edges(mut self, edges: Vec<Edge>) -> Self {
        self.edges = edges;
        self
    }

    /// Where lifecycle events go (default: tracing)
    pub fn sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Running token counter used for usage deltas
    pub fn tokens(mut self, tokens: Arc<dyn TokenCounter>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Build the Team
    pub fn build(self) -> Result<Team> {
        let full_name = format!("{}/{}", self.namespace, self.name);

        if self.members.is_empty() {
            return Err(ConductorError::EmptyTeam(full_name));
        }

        let names: HashSet<&str> = self.members.iter().map(|m| m.name()).collect();
        for edge in &self.edges {
            for endpoint in [&edge.from, &edge.to] {
                if !names.contains(endpoint.as_str()) {
                    return Err(ConductorError::UnknownGraphMember {
                        member: endpoint.clone(),
                        team: full_name,
                    });
                }
            }
        }

        if self.strategy == Strategy::Selector && self.selector.is_none() {
            return Err(ConductorError::config(format!(
                "team {} uses the selector strategy but has no selector",
                full_name
            )));
        }

        Ok(Team {
            name: self.name,
            namespace: self.namespace,
            description: self.description,
            members: self.members,
            strategy: self.strategy,
            max_turns: self.max_turns,
            selector: self.selector,
            edges: self.edges,
            sink: self.sink.unwrap_or_else(|| Arc::new(TracingSink)),
            tokens: self
                .tokens
                .unwrap_or_else(|| Arc::new(TokenUsageCollector::new())),
        })
    }
}

impl Team {
    /// Create a builder
    pub fn builder(name: impl Into<String>) -> TeamBuilder {
        TeamBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// `namespace/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    pub fn members(&self) -> &[Arc<dyn TeamMember>] {
        &self.members
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn max_turns(&self) -> Option<usize> {
        self.max_turns
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Run the strategy with team-level tracking.
    ///
    /// A termination sentinel from the strategy becomes a successful
    /// execution; everything else keeps its error and partial output.
    pub async fn run(
        &self,
        ctx: &ExecutionContext,
        input: &Message,
        history: &[Message],
    ) -> Execution {
        let metadata = BTreeMap::from([
            ("strategy".to_string(), self.strategy.to_string()),
            ("queryId".to_string(), ctx.query_id.clone()),
            ("sessionId".to_string(), ctx.session_id.clone()),
            ("teamName".to_string(), self.full_name()),
            ("memberCount".to_string(), self.members.len().to_string()),
        ]);
        let tracker = OperationTracker::start(self.sink.clone(), "team", self.full_name(), metadata);

        tracing::debug!(
            team = %self.full_name(),
            strategy = %self.strategy,
            query_id = %ctx.query_id,
            members = self.members.len(),
            "executing team"
        );

        let tokens_before = self.tokens.token_summary();
        let execution = match self.strategy {
            Strategy::Sequential => self.execute_sequential(ctx, input, history).await,
            Strategy::RoundRobin => {
                self.execute_round_robin(ctx, &tracker, input, history)
                    .await
            }
            Strategy::Selector => self.execute_selector(ctx, &tracker, input, history).await,
            Strategy::Graph => self.execute_graph(ctx, &tracker, input, history).await,
        };
        let usage = self.tokens.token_summary().delta_since(&tokens_before);

        match execution.error {
            Some(err) if err.is_termination() => {
                tracker.complete_with_termination(&err.to_string());
                Execution::completed(execution.messages)
            }
            Some(err) => {
                tracker.fail(&err);
                Execution::failed(execution.messages, err)
            }
            None => {
                if usage.total_tokens > 0 {
                    tracker.complete_with_tokens(usage);
                } else {
                    tracker.complete();
                }
                Execution::completed(execution.messages)
            }
        }
    }

    fn max_turns_error(&self, max_turns: usize) -> ConductorError {
        ConductorError::MaxTurns {
            team: self.full_name(),
            strategy: self.strategy.to_string(),
            max_turns,
        }
    }
}

#[async_trait]
impl TeamMember for Team {
    fn name(&self) -> &str {
        &self.name
    }

    fn member_type(&self) -> MemberType {
        MemberType::Team
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn execute(
        &self,
        ctx: &ExecutionContext,
        input: &Message,
        history: &[Message],
    ) -> Execution {
        self.run(ctx, input, history).await
    }
}
