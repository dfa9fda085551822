//! Interactive session state
//!
//! Keeps session memory between queries and remembers what the last run
//! captured.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::agent::{Orchestrator, RunReport};
use crate::core::{Config, ExecutionContext, Message, Result, TokenUsage};
use crate::telemetry::MemberResponse;

/// What queries run against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Team(String),
    Agent(String),
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Team(name) => write!(f, "team {}", name),
            Target::Agent(name) => write!(f, "agent {}", name),
        }
    }
}

/// Routes Ctrl-C to whichever run is in flight
#[derive(Clone, Default)]
pub struct Interrupt {
    in_flight: Arc<Mutex<Option<CancellationToken>>>,
}

impl Interrupt {
    /// Register a new run and hand back its token
    pub fn begin(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.in_flight.lock() = Some(token.clone());
        token
    }

    pub fn finish(&self) {
        self.in_flight.lock().take();
    }

    /// Cancel the run in flight. Returns false when nothing is running.
    pub fn interrupt(&self) -> bool {
        match self.in_flight.lock().as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

/// Install the process-wide Ctrl-C handler. A run in flight is cancelled;
/// with nothing running the process exits.
pub fn spawn_interrupt_handler(interrupt: Interrupt) -> JoinHandle<()> {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if interrupt.interrupt() {
                eprintln!("\nCancelling run...");
            } else {
                println!("\nGoodbye!");
                std::process::exit(130);
            }
        }
    })
}

/// One interactive session
pub struct Session {
    orchestrator: Orchestrator,
    config: Config,
    target: Target,
    session_id: String,
    memory: Vec<Message>,
    last_responses: Vec<MemberResponse>,
    usage: TokenUsage,
    interrupt: Interrupt,
}

impl Session {
    pub fn new(orchestrator: Orchestrator, config: Config, target: Target) -> Self {
        Self {
            orchestrator,
            config,
            target,
            session_id: Uuid::new_v4().to_string(),
            memory: Vec::new(),
            last_responses: Vec::new(),
            usage: TokenUsage::default(),
            interrupt: Interrupt::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn set_target(&mut self, target: Target) {
        self.target = target;
        self.clear();
    }

    /// Handle for cancelling this session's run in flight
    pub fn interrupt(&self) -> Interrupt {
        self.interrupt.clone()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }

    /// Member responses captured by the last run
    pub fn last_responses(&self) -> &[MemberResponse] {
        &self.last_responses
    }

    /// Tokens used by this session so far
    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    /// Forget session memory and start a new session id
    pub fn clear(&mut self) {
        self.memory.clear();
        self.last_responses.clear();
        self.session_id = Uuid::new_v4().to_string();
    }

    /// Run one query; `interrupt()` cancels it while it runs
    pub async fn ask(&mut self, text: &str) -> Result<RunReport> {
        let ctx = ExecutionContext::new()
            .with_session(&self.session_id)
            .with_cancellation(self.interrupt.begin());

        let input = vec![Message::user(text)];
        let result = match &self.target {
            Target::Team(name) => {
                self.orchestrator
                    .run_team(ctx, name, &input, &self.memory)
                    .await
            }
            Target::Agent(name) => {
                self.orchestrator
                    .run_agent(ctx, name, &input, &self.memory)
                    .await
            }
        };
        self.interrupt.finish();

        let report = result?;
        self.memory.extend(report.memory_messages.iter().cloned());
        self.last_responses = report.responses.clone();
        self.usage += report.token_usage;
        Ok(report)
    }
}
