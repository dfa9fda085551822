//! Running token counters
//!
//! The engine only needs a before/after snapshot of a running total, so the
//! counter is a trait and any backend can satisfy it.

use parking_lot::Mutex;

use crate::core::TokenUsage;

/// Running total of token usage
pub trait TokenCounter: Send + Sync {
    /// Add usage reported by one model call
    fn record_usage(&self, usage: TokenUsage);

    /// Current running total
    fn token_summary(&self) -> TokenUsage;
}

/// In-memory token counter
#[derive(Debug, Default)]
pub struct TokenUsageCollector {
    total: Mutex<TokenUsage>,
}

impl TokenUsageCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the running total to zero
    pub fn reset(&self) {
        *self.total.lock() = TokenUsage::default();
    }
}

impl TokenCounter for TokenUsageCollector {
    fn record_usage(&self, usage: TokenUsage) {
        *self.total.lock() += usage;
    }

    fn token_summary(&self) -> TokenUsage {
        *self.total.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_accumulates() {
        let collector = TokenUsageCollector::new();
        let before = collector.token_summary();

        collector.record_usage(TokenUsage::new(12, 4));
        collector.record_usage(TokenUsage::new(3, 1));

        let delta = collector.token_summary().delta_since(&before);
        assert_eq!(delta, TokenUsage::new(15, 5));

        collector.reset();
        assert!(collector.token_summary().is_empty());
    }
}
