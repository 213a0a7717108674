//! Snapshot based undo/redo over the committed annotation list.

use super::Annotation;

const DEFAULT_LIMIT: usize = 100;

#[derive(Clone, Debug)]
pub struct History {
    undo: Vec<Vec<Annotation>>,
    redo: Vec<Vec<Annotation>>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_limit(DEFAULT_LIMIT)
    }
}

impl History {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Records the list as it was before a mutating action.
    ///
    /// Any new action invalidates the redo stack.
    pub fn record(&mut self, before: &[Annotation]) {
        self.undo.push(before.to_vec());
        if self.undo.len() > self.limit {
            self.undo.remove(0);
        }
        self.redo.clear();
    }

    /// Records a clear of the whole list.
    ///
    /// A clear does not get its own undo entry: undoing it steps back to
    /// the state before the last recorded action, and redo returns to the
    /// cleared list. Only when nothing is left to step back to is the
    /// pre-clear list kept, so a clear is always undoable.
    pub fn record_clear(&mut self, before: &[Annotation]) {
        if self.undo.is_empty() {
            self.undo.push(before.to_vec());
        }
        self.redo.clear();
    }

    /// Returns the list to restore, stashing `current` for redo.
    pub fn undo(&mut self, current: &[Annotation]) -> Option<Vec<Annotation>> {
        let previous = self.undo.pop()?;
        self.redo.push(current.to_vec());
        Some(previous)
    }

    pub fn redo(&mut self, current: &[Annotation]) -> Option<Vec<Annotation>> {
        let next = self.redo.pop()?;
        self.undo.push(current.to_vec());
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn reset(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{Color, TextAnnotation};

    fn label(text: &str) -> Annotation {
        Annotation::Text(TextAnnotation {
            x: 0.0,
            y: 0.0,
            text: text.to_string(),
            color: Color::RED,
            font_size: 12.0,
        })
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = History::with_limit(2);
        let mut list = Vec::new();
        for name in ["a", "b", "c"] {
            history.record(&list);
            list.push(label(name));
        }

        let list = history.undo(&list).unwrap();
        let list = history.undo(&list).unwrap();
        assert_eq!(list, vec![label("a")]);
        assert!(history.undo(&list).is_none());
    }

    #[test]
    fn test_undo_after_clear_steps_past_last_action() {
        let mut history = History::default();
        let mut list = Vec::new();
        for name in ["a", "b"] {
            history.record(&list);
            list.push(label(name));
        }

        history.record_clear(&list);
        let list = history.undo(&[]).unwrap();
        assert_eq!(list, vec![label("a")]);

        let list = history.redo(&list).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_clear_without_history_is_undoable() {
        let mut history = History::default();
        history.record_clear(&[label("a")]);

        assert_eq!(history.undo(&[]).unwrap(), vec![label("a")]);
        assert!(history.redo(&[label("a")]).unwrap().is_empty());
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = History::default();
        history.record(&[]);
        let restored = history.undo(&[label("a")]).unwrap();
        assert!(restored.is_empty());
        assert!(history.can_redo());

        history.record(&restored);
        assert!(!history.can_redo());
    }
}
