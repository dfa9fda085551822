//! Turn accounting for multi-turn strategies
//!
//! Round-robin counts full cycles; selector and graph count member
//! executions. `None` means unbounded.

/// Turn counter with an optional upper bound
#[derive(Debug, Clone, Copy)]
pub struct TurnBudget {
    /// Current turn number (0-indexed)
    turn: usize,
    /// Maximum allowed turns
    max_turns: Option<usize>,
}

impl TurnBudget {
    /// Create a new budget with the given max turns
    pub fn new(max_turns: Option<usize>) -> Self {
        Self { turn: 0, max_turns }
    }

    pub fn turn(&self) -> usize {
        self.turn
    }

    pub fn max_turns(&self) -> Option<usize> {
        self.max_turns
    }

    /// No turn may start: checked before a selector step or graph node
    pub fn exhausted(&self) -> bool {
        self.max_turns.is_some_and(|max| self.turn >= max)
    }

    /// The turn that just finished was the last allowed one: checked after a
    /// round-robin cycle
    pub fn is_last_cycle(&self) -> bool {
        self.max_turns.is_some_and(|max| self.turn + 1 >= max)
    }

    /// Increment the turn counter
    pub fn advance(&mut self) {
        self.turn += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_new() {
        let budget = TurnBudget::new(Some(10));
        assert_eq!(budget.turn(), 0);
        assert_eq!(budget.max_turns(), Some(10));
        assert!(!budget.exhausted());
    }

    #[test]
    fn test_exhausted() {
        let mut budget = TurnBudget::new(Some(2));
        budget.advance();
        assert!(!budget.exhausted());

        budget.advance();
        assert!(budget.exhausted()); // Reached max turns
    }

    #[test]
    fn test_last_cycle() {
        let mut budget = TurnBudget::new(Some(2));
        assert!(!budget.is_last_cycle());
        budget.advance();
        assert!(budget.is_last_cycle());
    }

    #[test]
    fn test_unbounded() {
        let mut budget = TurnBudget::new(None);
        for _ in 0..1000 {
            budget.advance();
        }
        assert!(!budget.exhausted());
        assert!(!budget.is_last_cycle());
    }
}
