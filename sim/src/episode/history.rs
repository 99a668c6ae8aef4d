use std::collections::VecDeque;

use glam::DVec2;

/// Bounded checkpoint log. Only the newest `capacity` positions are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionHistory {
    capacity: usize,
    positions: VecDeque<DVec2>,
}

impl PositionHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);

        Self {
            capacity,
            positions: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, position: DVec2) {
        if self.positions.len() == self.capacity {
            self.positions.pop_front();
        }
        self.positions.push_back(position);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// `checkpoints_back = 0` is the newest entry.
    pub fn back(&self, checkpoints_back: usize) -> Option<DVec2> {
        let len = self.positions.len();
        if checkpoints_back < len {
            self.positions.get(len - 1 - checkpoints_back).copied()
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }
}

#[cfg(test)]
mod test {
    use crate::episode::history::PositionHistory;

    #[test]
    fn test_ring_keeps_newest() {
        let mut history = PositionHistory::with_capacity(3);
        assert!(history.is_empty());
        assert_eq!(history.back(0), None);

        for i in 0..5 {
            history.push(glam::dvec2(i as f64, 0.));
        }

        assert_eq!(history.len(), 3);
        assert_eq!(history.back(0), Some(glam::dvec2(4., 0.)));
        assert_eq!(history.back(2), Some(glam::dvec2(2., 0.)));
        assert_eq!(history.back(3), None);

        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.capacity(), 3);
    }

    #[test]
    fn test_zero_capacity_still_holds_latest() {
        let mut history = PositionHistory::with_capacity(0);
        history.push(glam::dvec2(1., 1.));
        history.push(glam::dvec2(2., 2.));

        assert_eq!(history.len(), 1);
        assert_eq!(history.back(0), Some(glam::dvec2(2., 2.)));
    }
}
