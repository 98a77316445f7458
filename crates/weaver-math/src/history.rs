//! Undo/redo for document mutations.
//!
//! Provides:
//! - `UndoManager` trait for abstracting undo implementations
//! - `History<S>` - snapshot stacks where one mutation is one step

/// Trait for managing undo/redo operations.
///
/// Implementations must actually perform the undo/redo, not just track state.
pub trait UndoManager {
    /// Check if undo is available.
    fn can_undo(&self) -> bool;

    /// Check if redo is available.
    fn can_redo(&self) -> bool;

    /// Perform undo. Returns true if successful.
    fn undo(&mut self) -> bool;

    /// Perform redo. Returns true if successful.
    fn redo(&mut self) -> bool;

    /// Clear all undo/redo history.
    fn clear_history(&mut self);
}

/// Snapshot history.
///
/// Callers record the state as it was *before* each mutation. Undo swaps the
/// current state with the last recorded one, so a multi-leaf rewrite is
/// reverted in one step.
#[derive(Debug, Clone)]
pub struct History<S> {
    undo_stack: Vec<S>,
    redo_stack: Vec<S>,
    max_steps: usize,
}

impl<S> Default for History<S> {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_HISTORY_DEPTH)
    }
}

impl<S> History<S> {
    pub fn new(max_steps: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_steps,
        }
    }

    /// Record the pre-mutation state.
    pub fn record(&mut self, before: S) {
        // Clear redo stack on new edit
        self.redo_stack.clear();
        self.undo_stack.push(before);

        // Trim if over max
        while self.undo_stack.len() > self.max_steps {
            self.undo_stack.remove(0);
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of undo steps available.
    pub fn depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Restore the last recorded state into `current`.
    pub fn undo(&mut self, current: &mut S) -> bool {
        let Some(previous) = self.undo_stack.pop() else {
            return false;
        };
        let now = std::mem::replace(current, previous);
        self.redo_stack.push(now);
        true
    }

    /// Re-apply the last undone state into `current`.
    pub fn redo(&mut self, current: &mut S) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        let now = std::mem::replace(current, next);
        self.undo_stack.push(now);
        true
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_redo_cycle() {
        let mut state = String::from("a");
        let mut history = History::new(10);

        history.record(state.clone());
        state.push('b');
        assert!(history.can_undo());

        // Undo
        assert!(history.undo(&mut state));
        assert_eq!(state, "a");
        assert!(!history.can_undo());
        assert!(history.can_redo());

        // Redo
        assert!(history.redo(&mut state));
        assert_eq!(state, "ab");
        assert!(!history.can_redo());
    }

    #[test]
    fn test_new_record_clears_redo() {
        let mut state = 1;
        let mut history = History::new(10);
        history.record(state);
        state = 2;
        assert!(history.undo(&mut state));
        assert!(history.can_redo());

        history.record(state);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_max_steps() {
        let mut state = 0;
        let mut history = History::new(3);
        for next in 1..=4 {
            history.record(state);
            state = next;
        }
        assert_eq!(history.depth(), 3);

        // Should only be able to undo 3 times
        assert!(history.undo(&mut state));
        assert!(history.undo(&mut state));
        assert!(history.undo(&mut state));
        assert!(!history.undo(&mut state));
        assert_eq!(state, 1);
    }

    #[test]
    fn test_empty_history() {
        let mut state = 0u8;
        let mut history: History<u8> = History::default();
        assert!(!history.undo(&mut state));
        assert!(!history.redo(&mut state));
    }
}
