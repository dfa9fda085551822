//! Sequential and round-robin strategies

use crate::agent::member::Execution;
use crate::core::{ConductorError, ExecutionContext, Message};
use crate::telemetry::OperationTracker;

use super::engine::Transcript;
use super::turns::TurnBudget;
use super::Team;

impl Team {
    /// Every member once, in declaration order. The turn is the member index.
    pub(crate) async fn execute_sequential(
        &self,
        ctx: &ExecutionContext,
        input: &Message,
        history: &[Message],
    ) -> Execution {
        let mut transcript = Transcript::new(history);

        for (i, member) in self.members.iter().enumerate() {
            if ctx.is_cancelled() {
                return transcript.finish(Some(ConductorError::Cancelled));
            }

            if let Err(err) = self
                .execute_member_and_accumulate(ctx, member.as_ref(), input, &mut transcript, i)
                .await
            {
                return transcript.finish(Some(err));
            }
        }

        transcript.finish(None)
    }

    /// Full cycles over all members. The turn is the cycle number; after the
    /// cycle numbered `max_turns - 1` the run stops with MaxTurns.
    pub(crate) async fn execute_round_robin(
        &self,
        ctx: &ExecutionContext,
        tracker: &OperationTracker,
        input: &Message,
        history: &[Message],
    ) -> Execution {
        let mut transcript = Transcript::new(history);
        let mut budget = TurnBudget::new(self.max_turns);

        loop {
            if ctx.is_cancelled() {
                return transcript.finish(Some(ConductorError::Cancelled));
            }

            let turn = budget.turn();
            tracker.team_turn(turn, "Start");

            for member in &self.members {
                if ctx.is_cancelled() {
                    return transcript.finish(Some(ConductorError::Cancelled));
                }

                if let Err(err) = self
                    .execute_member_and_accumulate(ctx, member.as_ref(), input, &mut transcript, turn)
                    .await
                {
                    return transcript.finish(Some(err));
                }
            }

            if let Some(max_turns) = budget.max_turns().filter(|_| budget.is_last_cycle()) {
                tracker.team_turn(turn + 1, "MaxTurns");
                tracing::warn!(team = %self.full_name(), max_turns, "round-robin reached MaxTurns");
                return transcript.finish(Some(self.max_turns_error(max_turns)));
            }

            budget.advance();
        }
    }
}
