//! Graph strategy
//!
//! Breadth-first from the first declared member. Each member runs at most
//! once per run; edges back to a visited member are ignored, so cycles in
//! the edge list cannot loop.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::agent::member::{Execution, TeamMember};
use crate::core::{ConductorError, ExecutionContext, Message};
use crate::telemetry::OperationTracker;

use super::engine::Transcript;
use super::turns::TurnBudget;
use super::Team;

/// Directed edge between two members of a graph team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl Team {
    /// Adjacency list in edge declaration order
    fn adjacency(&self) -> HashMap<&str, Vec<&str>> {
        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
        for edge in &self.edges {
            adjacency
                .entry(edge.from.as_str())
                .or_default()
                .push(edge.to.as_str());
        }
        adjacency
    }

    pub(crate) async fn execute_graph(
        &self,
        ctx: &ExecutionContext,
        tracker: &OperationTracker,
        input: &Message,
        history: &[Message],
    ) -> Execution {
        let mut transcript = Transcript::new(history);
        let mut budget = TurnBudget::new(self.max_turns);

        let by_name: HashMap<&str, &dyn TeamMember> = self
            .members
            .iter()
            .map(|m| (m.name(), m.as_ref()))
            .collect();
        let adjacency = self.adjacency();

        tracker.team_turn(0, "Start");

        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = self.members.first().map(|m| m.name()).into_iter().collect();

        while let Some(name) = queue.pop_front() {
            if ctx.is_cancelled() {
                return transcript.finish(Some(ConductorError::Cancelled));
            }

            if visited.contains(name) {
                continue;
            }

            if let Some(max_turns) = budget.max_turns().filter(|_| budget.exhausted()) {
                tracker.team_turn(budget.turn(), "MaxTurns");
                tracing::warn!(team = %self.full_name(), max_turns, "graph reached MaxTurns");
                return transcript.finish(Some(self.max_turns_error(max_turns)));
            }

            visited.insert(name);

            let Some(member) = by_name.get(name) else {
                return transcript.finish(Some(ConductorError::UnknownGraphMember {
                    member: name.to_string(),
                    team: self.full_name(),
                }));
            };

            tracker.participant_selected(name, budget.turn());

            if let Err(err) = self
                .execute_member_and_accumulate(ctx, *member, input, &mut transcript, budget.turn())
                .await
            {
                return transcript.finish(Some(err));
            }

            budget.advance();

            if let Some(next) = adjacency.get(name) {
                queue.extend(next.iter().copied().filter(|n| !visited.contains(n)));
            }
        }

        transcript.finish(None)
    }
}
