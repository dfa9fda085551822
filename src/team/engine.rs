//! Shared per-member step of every strategy
//!
//! Executes one member, accumulates its output, records its response and
//! lifecycle, and classifies its error.

use std::collections::BTreeMap;
use std::time::Instant;

use crate::agent::member::{Execution, MemberType, TeamMember};
use crate::core::{ConductorError, ExecutionContext, Message, Result};
use crate::telemetry::{MemberResponse, OperationTracker};

use super::Team;

/// Conversation owned by one strategy run.
///
/// `messages` is what the next member sees; `new_messages` is what the run
/// returns.
#[derive(Debug, Default)]
pub(crate) struct Transcript {
    pub messages: Vec<Message>,
    pub new_messages: Vec<Message>,
}

impl Transcript {
    pub fn new(history: &[Message]) -> Self {
        Self {
            messages: history.to_vec(),
            new_messages: Vec::new(),
        }
    }

    pub fn append(&mut self, produced: Vec<Message>) {
        self.messages.extend_from_slice(&produced);
        self.new_messages.extend(produced);
    }

    pub fn finish(self, error: Option<ConductorError>) -> Execution {
        Execution {
            messages: self.new_messages,
            error,
        }
    }
}

impl Team {
    /// Run one member and fold its output into the transcript.
    ///
    /// Output is appended even when the member fails. The termination
    /// sentinel comes back unchanged; any other error is wrapped with the
    /// team, member, strategy and turn.
    pub(crate) async fn execute_member_and_accumulate(
        &self,
        ctx: &ExecutionContext,
        member: &dyn TeamMember,
        input: &Message,
        transcript: &mut Transcript,
        turn: usize,
    ) -> Result<()> {
        let metadata = BTreeMap::from([
            ("team".to_string(), self.full_name()),
            ("memberType".to_string(), member.member_type().to_string()),
            ("turn".to_string(), turn.to_string()),
            ("queryId".to_string(), ctx.query_id.clone()),
            ("sessionId".to_string(), ctx.session_id.clone()),
            ("strategy".to_string(), self.strategy.to_string()),
        ]);
        let tracker = OperationTracker::start(self.sink.clone(), "member", member.name(), metadata);

        let tokens_before = self.tokens.token_summary();
        let started = Instant::now();
        let Execution { messages, error } = member.execute(ctx, input, &transcript.messages).await;
        let duration = started.elapsed();

        if let Some(capture) = ctx.response_capture() {
            let mut response = MemberResponse::from_messages(
                member.name(),
                member.member_type(),
                turn,
                &messages,
                duration,
            );
            if let Some(err) = &error {
                response = response.with_error(err);
            }
            if member.member_type() == MemberType::Agent {
                let usage = self.tokens.token_summary().delta_since(&tokens_before);
                response = response.with_token_usage(usage);
            }
            capture.add(response);
        }

        transcript.append(messages);

        match error {
            None => {
                tracker.complete();
                Ok(())
            }
            Some(err) if err.is_termination() => {
                tracker.complete_with_termination(&err.to_string());
                Err(err)
            }
            Some(err) => {
                tracing::warn!(
                    team = %self.full_name(),
                    member = %member.name(),
                    strategy = %self.strategy,
                    turn,
                    error = %err,
                    "team member failed"
                );
                tracker.fail(&err);
                Err(ConductorError::Member {
                    team: self.full_name(),
                    member: member.name().to_string(),
                    strategy: self.strategy.to_string(),
                    turn,
                    source: Box::new(err),
                })
            }
        }
    }
}
