//! Message preparation for execution and session memory
//!
//! Pure functions: they decide what a member sees and what gets written back
//! to memory, never mutating their inputs.

use crate::agent::member::TeamMember;
use crate::core::{ConductorError, Message, Result};
use crate::team::Team;

/// Split a run's input into the current message and its context.
///
/// The last input message is current; memory followed by the earlier input
/// messages is context.
pub fn prepare_execution_messages(
    input: &[Message],
    memory: &[Message],
) -> Result<(Message, Vec<Message>)> {
    let (current, earlier) = input.split_last().ok_or(ConductorError::EmptyInput)?;

    let mut context = Vec::with_capacity(memory.len() + earlier.len());
    context.extend_from_slice(memory);
    context.extend_from_slice(earlier);

    Ok((current.clone(), context))
}

/// Everything a model call sees: memory followed by input
pub fn prepare_model_messages(input: &[Message], memory: &[Message]) -> Vec<Message> {
    memory.iter().chain(input).cloned().collect()
}

/// What a run adds to memory: its input followed by its response
pub fn prepare_new_messages_for_memory(input: &[Message], response: &[Message]) -> Vec<Message> {
    input.iter().chain(response).cloned().collect()
}

/// New memory messages for an agent run, seeding the hydrated system prompt
/// on the first turn of a session
pub fn prepare_agent_messages_for_memory(
    member: &dyn TeamMember,
    existing: &[Message],
    input: &[Message],
    response: &[Message],
) -> Vec<Message> {
    with_hydrated_prompt(member.memory_system_prompt(), existing, input, response)
}

/// New memory messages for a team run. The first member exposing a hydrated
/// prompt provides it.
pub fn prepare_team_messages_for_memory(
    team: &Team,
    existing: &[Message],
    input: &[Message],
    response: &[Message],
) -> Vec<Message> {
    let prompt = team
        .members()
        .iter()
        .find_map(|member| member.memory_system_prompt());
    with_hydrated_prompt(prompt, existing, input, response)
}

fn with_hydrated_prompt(
    prompt: Option<&str>,
    existing: &[Message],
    input: &[Message],
    response: &[Message],
) -> Vec<Message> {
    let mut messages = prepare_new_messages_for_memory(input, response);

    let Some(prompt) = prompt else {
        return messages;
    };

    let already_present = existing
        .iter()
        .chain(input.first())
        .any(|m| m.is_system() && m.content == prompt);

    if existing.is_empty() && !already_present {
        messages.insert(0, Message::system(prompt));
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::member::{Execution, MemberType};
    use crate::core::ExecutionContext;
    use async_trait::async_trait;

    struct Hydrated(Option<&'static str>);

    #[async_trait]
    impl TeamMember for Hydrated {
        fn name(&self) -> &str {
            "hydrated"
        }

        fn member_type(&self) -> MemberType {
            MemberType::Agent
        }

        fn description(&self) -> &str {
            ""
        }

        async fn execute(&self, _: &ExecutionContext, _: &Message, _: &[Message]) -> Execution {
            Execution::default()
        }

        fn memory_system_prompt(&self) -> Option<&str> {
            self.0
        }
    }

    #[test]
    fn test_execution_messages_split() {
        let memory = vec![Message::user("old"), Message::assistant("old reply")];
        let input = vec![Message::user("first"), Message::user("second")];

        let (current, context) = prepare_execution_messages(&input, &memory).unwrap();
        assert_eq!(current.content, "second");
        let contents: Vec<_> = context.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["old", "old reply", "first"]);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let err = prepare_execution_messages(&[], &[Message::user("m")]).unwrap_err();
        assert!(matches!(err, ConductorError::EmptyInput));
    }

    #[test]
    fn test_model_and_memory_ordering() {
        let memory = vec![Message::user("m")];
        let input = vec![Message::user("i")];
        let response = vec![Message::assistant("r")];

        let model = prepare_model_messages(&input, &memory);
        assert_eq!(model[0].content, "m");
        assert_eq!(model[1].content, "i");

        let new = prepare_new_messages_for_memory(&input, &response);
        assert_eq!(new[0].content, "i");
        assert_eq!(new[1].content, "r");
    }

    #[test]
    fn test_agent_memory_seeds_prompt_on_first_turn() {
        let member = Hydrated(Some("You are helpful."));
        let out = prepare_agent_messages_for_memory(
            &member,
            &[],
            &[Message::user("hi")],
            &[Message::assistant("hello")],
        );

        assert_eq!(out.len(), 3);
        assert_eq!(out[0], Message::system("You are helpful."));
    }

    #[test]
    fn test_agent_memory_is_idempotent() {
        let member = Hydrated(Some("You are helpful."));
        let existing = vec![Message::system("You are helpful."), Message::user("hi")];

        let out = prepare_agent_messages_for_memory(
            &member,
            &existing,
            &[Message::user("again")],
            &[Message::assistant("sure")],
        );
        assert!(out.iter().all(|m| !m.is_system()));

        // Prompt already leading the input
        let input = vec![Message::system("You are helpful."), Message::user("hi")];
        let out = prepare_agent_messages_for_memory(&member, &[], &input, &[]);
        assert_eq!(out.iter().filter(|m| m.is_system()).count(), 1);
    }

    #[test]
    fn test_agent_memory_without_hydration() {
        let member = Hydrated(None);
        let out =
            prepare_agent_messages_for_memory(&member, &[], &[Message::user("hi")], &[]);
        assert_eq!(out, vec![Message::user("hi")]);
    }
}
