// Fixed-capacity FIFO buffer used for histories, logs and alerts
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct BoundedLog<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedLog<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Append an item, evicting the oldest one once capacity is reached.
    pub fn push(&mut self, item: T) {
        if self.capacity == 0 {
            return;
        }
        while self.items.len() >= self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T: Clone> BoundedLog<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }

    /// The newest `n` items, oldest first.
    pub fn tail(&self, n: usize) -> Vec<T> {
        let skip = self.items.len().saturating_sub(n);
        self.items.iter().skip(skip).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_oldest_on_overflow() {
        let mut log = BoundedLog::new(3);
        for i in 0..4 {
            log.push(i);
        }

        assert_eq!(log.len(), 3);
        assert_eq!(log.to_vec(), vec![1, 2, 3]);
        assert_eq!(log.last(), Some(&3));
    }

    #[test]
    fn test_tail() {
        let mut log = BoundedLog::new(10);
        for i in 0..5 {
            log.push(i);
        }

        assert_eq!(log.tail(2), vec![3, 4]);
        assert_eq!(log.tail(10), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut log = BoundedLog::new(0);
        log.push("x");
        assert!(log.is_empty());
    }
}
