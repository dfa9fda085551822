//! Per-run execution context
//!
//! Carries the run identity, the cancellation token and the response
//! capture down through nested teams. Cloning is cheap; clones share the
//! same token and capture.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::telemetry::ResponseCapture;

/// Context threaded through every member execution of one run
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Identifies the query being executed
    pub query_id: String,
    /// Identifies the session the query belongs to
    pub session_id: String,
    cancellation: CancellationToken,
    capture: Option<Arc<ResponseCapture>>,
}

impl ExecutionContext {
    /// Create a context with fresh ids and no response capture
    pub fn new() -> Self {
        Self {
            query_id: Uuid::new_v4().to_string(),
            session_id: Uuid::new_v4().to_string(),
            cancellation: CancellationToken::new(),
            capture: None,
        }
    }

    /// Set the session id
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Attach a fresh response capture and return its handle
    pub fn with_response_capture(mut self) -> (Self, Arc<ResponseCapture>) {
        let capture = Arc::new(ResponseCapture::new());
        self.capture = Some(capture.clone());
        (self, capture)
    }

    /// Response capture for this run, if one was attached
    pub fn response_capture(&self) -> Option<&Arc<ResponseCapture>> {
        self.capture.as_ref()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Resolves once the run is cancelled
    pub async fn cancelled(&self) {
        self.cancellation.cancelled().await
    }

    /// Cancel the run
    pub fn cancel(&self) {
        self.cancellation.cancel()
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}
