/// Deduplicated ordered set, most recent entry first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecencyStack<T: Copy + Eq> {
    entries: Vec<T>,
}

impl<T: Copy + Eq> Default for RecencyStack<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: Copy + Eq> RecencyStack<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move `item` to the front, dropping any earlier occurrence.
    pub fn push(&mut self, item: T) {
        self.remove(item);
        self.entries.insert(0, item);
    }

    /// Returns whether `item` was present.
    pub fn remove(&mut self, item: T) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| *entry != item);
        self.entries.len() != before
    }

    pub fn top(&self) -> Option<T> {
        self.entries.first().copied()
    }

    pub fn contains(&self, item: T) -> bool {
        self.entries.contains(&item)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.entries.iter().copied()
    }

    /// Keep only entries matching `keep`; returns the dropped ones.
    pub fn retain<F: FnMut(T) -> bool>(&mut self, mut keep: F) -> Vec<T> {
        let mut dropped = Vec::new();
        self.entries.retain(|entry| {
            let kept = keep(*entry);
            if !kept {
                dropped.push(*entry);
            }
            kept
        });
        dropped
    }

    pub fn as_slice(&self) -> &[T] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_moves_to_front_without_duplicates() {
        let mut stack = RecencyStack::new();
        stack.push(1u32);
        stack.push(2);
        stack.push(3);
        stack.push(1);
        assert_eq!(stack.as_slice(), &[1, 3, 2]);
        assert_eq!(stack.top(), Some(1));
        assert_eq!(stack.len(), 3);
    }

    #[test]
    fn remove_reports_presence() {
        let mut stack = RecencyStack::new();
        stack.push(5u32);
        assert!(stack.remove(5));
        assert!(!stack.remove(5));
        assert!(stack.is_empty());
        assert_eq!(stack.top(), None);
    }

    #[test]
    fn retain_returns_dropped_in_order() {
        let mut stack = RecencyStack::new();
        for id in 1u32..=5 {
            stack.push(id);
        }
        let dropped = stack.retain(|id| id % 2 == 1);
        assert_eq!(dropped, vec![4, 2]);
        assert_eq!(stack.iter().collect::<Vec<_>>(), vec![5, 3, 1]);
    }
}
