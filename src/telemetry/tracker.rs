//! Lifecycle events for teams and members
//!
//! A tracker is started for every team execution and every member
//! invocation. Events go to an [`EventSink`]; the default sink writes them
//! through `tracing`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{ConductorError, TokenUsage};

/// Kind of lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    Started,
    Completed,
    Terminated,
    Failed,
    TeamTurn,
    ParticipantSelected,
}

/// One lifecycle event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub kind: EventKind,
    /// "team" or "member"
    pub operation: String,
    pub name: String,
    pub correlation_id: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default, with = "humantime_serde")]
    pub duration: Option<Duration>,
    #[serde(default)]
    pub token_usage: Option<TokenUsage>,
    #[serde(default)]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Receiver of lifecycle events. Must never fail or block a run.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: LifecycleEvent);
}

/// Writes events as structured `tracing` records
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: LifecycleEvent) {
        let duration_ms = event.duration.map(|d| d.as_millis() as u64);
        let total_tokens = event.token_usage.map(|u| u.total_tokens);
        let message = event.message.as_deref().unwrap_or("");
        let metadata = format!("{:?}", event.metadata);

        match event.kind {
            EventKind::Failed => tracing::warn!(
                operation = %event.operation,
                name = %event.name,
                correlation_id = %event.correlation_id,
                metadata = %metadata,
                duration_ms,
                "{} failed: {}",
                event.operation,
                message
            ),
            EventKind::Started | EventKind::TeamTurn | EventKind::ParticipantSelected => {
                tracing::debug!(
                    kind = ?event.kind,
                    operation = %event.operation,
                    name = %event.name,
                    correlation_id = %event.correlation_id,
                    metadata = %metadata,
                    "{}",
                    message
                )
            }
            EventKind::Completed | EventKind::Terminated => tracing::info!(
                kind = ?event.kind,
                operation = %event.operation,
                name = %event.name,
                correlation_id = %event.correlation_id,
                duration_ms,
                total_tokens,
                "{} {}",
                event.operation,
                message
            ),
        }
    }
}

/// Collects events in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events.lock().clone()
    }

    /// Events of one kind, in emission order
    pub fn events_of(&self, kind: EventKind) -> Vec<LifecycleEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: LifecycleEvent) {
        self.events.lock().push(event);
    }
}

/// Tracks one operation from start to its single outcome
pub struct OperationTracker {
    sink: Arc<dyn EventSink>,
    operation: String,
    name: String,
    correlation_id: String,
    metadata: BTreeMap<String, String>,
    started: Instant,
}

impl OperationTracker {
    /// Emit a `Started` event and begin timing
    pub fn start(
        sink: Arc<dyn EventSink>,
        operation: impl Into<String>,
        name: impl Into<String>,
        metadata: BTreeMap<String, String>,
    ) -> Self {
        let tracker = Self {
            sink,
            operation: operation.into(),
            name: name.into(),
            correlation_id: Uuid::new_v4().to_string(),
            metadata,
            started: Instant::now(),
        };
        tracker.emit(EventKind::Started, None, None, Some("started".to_string()));
        tracker
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Emit a turn marker, e.g. `Start` or `MaxTurns`
    pub fn team_turn(&self, turn: usize, phase: &str) {
        self.emit(
            EventKind::TeamTurn,
            None,
            None,
            Some(format!("turn {} {}", turn, phase)),
        );
    }

    pub fn participant_selected(&self, participant: &str, turn: usize) {
        self.emit(
            EventKind::ParticipantSelected,
            None,
            None,
            Some(format!("selected {} for turn {}", participant, turn)),
        );
    }

    pub fn complete(self) {
        let elapsed = self.elapsed();
        self.emit(
            EventKind::Completed,
            Some(elapsed),
            None,
            Some("completed".to_string()),
        );
    }

    pub fn complete_with_tokens(self, usage: TokenUsage) {
        let elapsed = self.elapsed();
        self.emit(
            EventKind::Completed,
            Some(elapsed),
            Some(usage),
            Some("completed".to_string()),
        );
    }

    pub fn complete_with_termination(self, reason: &str) {
        let elapsed = self.elapsed();
        self.emit(
            EventKind::Terminated,
            Some(elapsed),
            None,
            Some(format!("terminated: {}", reason)),
        );
    }

    pub fn fail(self, error: &ConductorError) {
        let elapsed = self.elapsed();
        self.emit(EventKind::Failed, Some(elapsed), None, Some(error.to_string()));
    }

    fn emit(
        &self,
        kind: EventKind,
        duration: Option<Duration>,
        token_usage: Option<TokenUsage>,
        message: Option<String>,
    ) {
        self.sink.emit(LifecycleEvent {
            kind,
            operation: self.operation.clone(),
            name: self.name.clone(),
            correlation_id: self.correlation_id.clone(),
            metadata: self.metadata.clone(),
            duration,
            token_usage,
            message,
            timestamp: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_lifecycle() {
        let sink = Arc::new(MemorySink::new());
        let metadata = BTreeMap::from([("strategy".to_string(), "graph".to_string())]);

        let tracker = OperationTracker::start(sink.clone(), "team", "default/t", metadata);
        let id = tracker.correlation_id().to_string();
        tracker.team_turn(0, "Start");
        tracker.complete_with_tokens(TokenUsage::new(3, 2));

        let events = sink.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].kind, EventKind::Started);
        assert_eq!(events[1].kind, EventKind::TeamTurn);
        assert_eq!(events[2].kind, EventKind::Completed);
        assert!(events.iter().all(|e| e.correlation_id == id));
        assert_eq!(events[2].token_usage, Some(TokenUsage::new(3, 2)));
        assert_eq!(events[0].metadata["strategy"], "graph");
    }

    #[test]
    fn test_failure_carries_message() {
        let sink = Arc::new(MemorySink::new());
        let tracker = OperationTracker::start(sink.clone(), "member", "a", BTreeMap::new());
        tracker.fail(&ConductorError::llm("model offline"));

        let failed = sink.events_of(EventKind::Failed);
        assert_eq!(failed.len(), 1);
        assert!(failed[0].message.as_deref().unwrap().contains("model offline"));
        assert!(failed[0].duration.is_some());
    }
}
