//! Selector strategy
//!
//! At every step a model reads the whole conversation so far and names the
//! next participant. Unknown names fall back to the first member.
//!
//! # Template placeholders
//!
//! - `{{participants}}` - comma-separated member names
//! - `{{roles}}` - one `name: description` line per member
//! - `{{history}}` - prior history, the user input and every member output

use std::sync::Arc;

use handlebars::Handlebars;
use serde::Serialize;

use crate::agent::member::{Execution, TeamMember};
use crate::core::{ConductorError, ExecutionContext, Message, Result};
use crate::llm::{GenerateOptions, LLMProvider};
use crate::telemetry::OperationTracker;

use super::engine::Transcript;
use super::turns::TurnBudget;
use super::Team;

const TEMPLATE: &str = "selector";

/// Instruction sent alongside the rendered selector prompt
pub const SELECT_INSTRUCTION: &str = "Select the next participant.";

/// Values available to the selector template
#[derive(Debug, Clone, Serialize)]
pub struct SelectorContext {
    pub participants: String,
    pub roles: String,
    pub history: String,
}

impl SelectorContext {
    pub fn new(members: &[Arc<dyn TeamMember>], history: &[Message]) -> Self {
        let participants = members
            .iter()
            .map(|m| m.name())
            .collect::<Vec<_>>()
            .join(", ");

        let roles = members
            .iter()
            .map(|m| format!("{}: {}", m.name(), m.description()))
            .collect::<Vec<_>>()
            .join("\n");

        let history = history
            .iter()
            .filter(|m| !m.content.trim().is_empty())
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n");

        Self {
            participants,
            roles,
            history,
        }
    }
}

/// Model-backed participant selection
pub struct Selector {
    llm: Arc<dyn LLMProvider>,
    model: String,
    templates: Handlebars<'static>,
}

impl Selector {
    /// Compile the selector template; a malformed template fails here
    pub fn new(
        llm: Arc<dyn LLMProvider>,
        model: impl Into<String>,
        template: &str,
    ) -> Result<Self> {
        let mut templates = Handlebars::new();
        templates.set_strict_mode(false);
        templates.register_escape_fn(handlebars::no_escape);
        templates
            .register_template_string(TEMPLATE, template)
            .map_err(|e| ConductorError::Template(format!("Failed to register selector template: {}", e)))?;

        Ok(Self {
            llm,
            model: model.into(),
            templates,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Render the selector system prompt
    pub fn render(&self, context: &SelectorContext) -> Result<String> {
        self.templates
            .render(TEMPLATE, context)
            .map_err(|e| ConductorError::Template(format!("Failed to render selector template: {}", e)))
    }

    /// Ask the model for the next participant
    pub async fn select<'a>(
        &self,
        members: &'a [Arc<dyn TeamMember>],
        history: &[Message],
    ) -> Result<&'a Arc<dyn TeamMember>> {
        let prompt = self.render(&SelectorContext::new(members, history))?;
        let messages = vec![Message::system(prompt), Message::user(SELECT_INSTRUCTION)];

        let response = self
            .llm
            .chat(
                &self.model,
                &messages,
                Some(GenerateOptions {
                    temperature: Some(0.0),
                    ..Default::default()
                }),
            )
            .await?;

        let choice = response.content.trim();
        match members.iter().find(|m| m.name() == choice) {
            Some(member) => Ok(member),
            None => {
                tracing::debug!(choice = %choice, "selector chose an unknown participant, using the first member");
                members
                    .first()
                    .ok_or_else(|| ConductorError::Other("selector has no members to choose from".into()))
            }
        }
    }
}

impl Team {
    pub(crate) async fn execute_selector(
        &self,
        ctx: &ExecutionContext,
        tracker: &OperationTracker,
        input: &Message,
        history: &[Message],
    ) -> Execution {
        let mut transcript = Transcript::new(history);

        let Some(selector) = &self.selector else {
            return transcript.finish(Some(ConductorError::config(format!(
                "team {} uses the selector strategy but has no selector",
                self.full_name()
            ))));
        };

        let mut budget = TurnBudget::new(self.max_turns);
        tracker.team_turn(0, "Start");

        loop {
            if ctx.is_cancelled() {
                return transcript.finish(Some(ConductorError::Cancelled));
            }

            if let Some(max_turns) = budget.max_turns().filter(|_| budget.exhausted()) {
                tracker.team_turn(budget.turn(), "MaxTurns");
                tracing::warn!(team = %self.full_name(), max_turns, "selector reached MaxTurns");
                return transcript.finish(Some(self.max_turns_error(max_turns)));
            }

            // Prior history, then the user input, then every member output so far
            let conversation: Vec<Message> = history
                .iter()
                .chain(std::iter::once(input))
                .chain(&transcript.new_messages)
                .cloned()
                .collect();

            let member = tokio::select! {
                biased;
                _ = ctx.cancelled() => Err(ConductorError::Cancelled),
                selected = selector.select(&self.members, &conversation) => selected,
            };
            let member = match member {
                Ok(member) => member.clone(),
                Err(ConductorError::Cancelled) => {
                    return transcript.finish(Some(ConductorError::Cancelled))
                }
                Err(err) => {
                    tracing::warn!(team = %self.full_name(), turn = budget.turn(), error = %err, "selector failed");
                    return transcript.finish(Some(ConductorError::Selector {
                        team: self.full_name(),
                        strategy: self.strategy.to_string(),
                        turn: budget.turn(),
                        source: Box::new(err),
                    }));
                }
            };

            tracker.participant_selected(member.name(), budget.turn());
            tracing::debug!(team = %self.full_name(), participant = %member.name(), turn = budget.turn(), "participant selected");

            if let Err(err) = self
                .execute_member_and_accumulate(ctx, member.as_ref(), input, &mut transcript, budget.turn())
                .await
            {
                return transcript.finish(Some(err));
            }

            budget.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::member::MemberType;
    use async_trait::async_trait;

    struct Named(&'static str, &'static str);

    #[async_trait]
    impl TeamMember for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn member_type(&self) -> MemberType {
            MemberType::Agent
        }

        fn description(&self) -> &str {
            self.1
        }

        async fn execute(&self, _: &ExecutionContext, _: &Message, _: &[Message]) -> Execution {
            Execution::default()
        }
    }

    #[test]
    fn test_context_fields() {
        let members: Vec<Arc<dyn TeamMember>> = vec![
            Arc::new(Named("writer", "writes drafts")),
            Arc::new(Named("critic", "reviews drafts")),
        ];
        let history = vec![
            Message::user("write a haiku"),
            Message::assistant(""),
            Message::assistant("old pond <frog>"),
        ];

        let context = SelectorContext::new(&members, &history);
        assert_eq!(context.participants, "writer, critic");
        assert_eq!(context.roles, "writer: writes drafts\ncritic: reviews drafts");
        assert_eq!(context.history, "user: write a haiku\nassistant: old pond <frog>");
    }

    #[test]
    fn test_render_does_not_escape() {
        struct NoModel;

        #[async_trait]
        impl LLMProvider for NoModel {
            async fn chat(
                &self,
                _: &str,
                _: &[Message],
                _: Option<GenerateOptions>,
            ) -> Result<crate::llm::LLMResponse> {
                Err(ConductorError::llm("unused"))
            }

            async fn chat_with_tools(
                &self,
                _: &str,
                _: &[Message],
                _: &[crate::core::ToolDefinition],
                _: Option<GenerateOptions>,
            ) -> Result<crate::llm::LLMResponse> {
                Err(ConductorError::llm("unused"))
            }

            async fn list_models(&self) -> Result<Vec<String>> {
                Ok(Vec::new())
            }

            fn name(&self) -> &str {
                "none"
            }
        }

        let selector = Selector::new(Arc::new(NoModel), "m", "[{{participants}}]\n{{history}}").unwrap();
        let rendered = selector
            .render(&SelectorContext {
                participants: "a, b".into(),
                roles: String::new(),
                history: "user: x < y & z".into(),
            })
            .unwrap();
        assert_eq!(rendered, "[a, b]\nuser: x < y & z");

        assert!(matches!(
            Selector::new(Arc::new(NoModel), "m", "{{#if}}"),
            Err(ConductorError::Template(_))
        ));
    }
}
