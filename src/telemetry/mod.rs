//! Telemetry module - what happened during a run
//!
//! Response capture for per-member metadata, lifecycle tracking for teams and
//! members, and running token counters.

pub mod capture;
pub mod tokens;
pub mod tracker;

pub use capture::{CapturedToolCall, MemberResponse, ResponseCapture};
pub use tokens::{TokenCounter, TokenUsageCollector};
pub use tracker::{EventKind, EventSink, LifecycleEvent, MemorySink, OperationTracker, TracingSink};
