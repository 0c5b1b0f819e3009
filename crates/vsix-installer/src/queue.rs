//! Work queue with an explicit cursor and per-item retry budget.
//!
//! The token list never changes after construction. Progress is the cursor
//! position; the rate limit retries spent on the current head are counted
//! next to it and reset whenever the cursor moves.

/// Rate limit retries allowed for a single queue item
pub const MAX_RATE_LIMIT_RETRIES: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkQueue {
    items: Vec<String>,
    cursor: usize,
    retries: u32,
}

impl WorkQueue {
    pub fn new(items: Vec<String>) -> Self {
        Self {
            items,
            cursor: 0,
            retries: 0,
        }
    }

    /// The item currently being worked on
    pub fn head(&self) -> Option<&str> {
        self.items.get(self.cursor).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_drained(&self) -> bool {
        self.cursor >= self.items.len()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// 1-based position of the head, for progress output
    pub fn position(&self) -> usize {
        self.cursor + 1
    }

    /// Items that finished successfully
    pub fn completed(&self) -> &[String] {
        &self.items[..self.cursor]
    }

    /// The head and everything after it
    pub fn remaining(&self) -> &[String] {
        &self.items[self.cursor.min(self.items.len())..]
    }

    /// Retries already spent on the head
    pub fn retries_used(&self) -> u32 {
        self.retries
    }

    /// Spend one retry on the head. Returns `false`, leaving the counter
    /// unchanged, when the budget is already used up.
    pub fn consume_retry(&mut self) -> bool {
        if self.retries >= MAX_RATE_LIMIT_RETRIES {
            return false;
        }
        self.retries += 1;
        true
    }

    /// Mark the head as done and move to the next item
    pub fn advance(&mut self) {
        debug_assert!(!self.is_drained(), "advance past the end of the queue");
        self.cursor += 1;
        self.retries = 0;
    }
}
