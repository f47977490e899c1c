//! FIFO implemented using VecDeque
use std::collections::vec_deque::{Iter, IterMut};
use std::collections::VecDeque;
use std::ops::{Index, IndexMut, RangeBounds};

#[derive(Clone, Debug)]
pub struct FIFO<A> {
    deq: VecDeque<A>,
}

impl<A> Default for FIFO<A> {
    fn default() -> Self {
        Self {
            deq: VecDeque::new(),
        }
    }
}

impl<A> FIFO<A> {
    pub fn new() -> Self {
        Self {
            deq: VecDeque::new(),
        }
    }
    pub fn iter(&self) -> Iter<'_, A> {
        self.deq.iter()
    }
    pub fn range<R>(&self, range: R) -> Iter<'_, A>
    where
        R: RangeBounds<usize>,
    {
        self.deq.range(range)
    }
    pub fn range_mut<R>(&mut self, range: R) -> IterMut<'_, A>
    where
        R: RangeBounds<usize>,
    {
        self.deq.range_mut(range)
    }
    pub fn drain_front(&mut self, count: usize) -> usize {
        let count = count.min(self.deq.len());
        self.deq.drain(..count);
        count
    }
    pub fn append_back(&mut self, e: A) {
        self.deq.push_back(e);
    }
    pub fn len(&self) -> usize {
        self.deq.len()
    }
    pub fn is_empty(&self) -> bool {
        self.deq.is_empty()
    }
}

impl<A> Index<usize> for FIFO<A> {
    type Output = A;

    fn index(&self, index: usize) -> &Self::Output {
        self.deq.index(index)
    }
}

impl<A> IndexMut<usize> for FIFO<A> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        self.deq.index_mut(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fifo(items: &[i32]) -> FIFO<i32> {
        let mut fifo = FIFO::new();
        for item in items {
            fifo.append_back(*item);
        }
        fifo
    }

    #[test]
    fn drain_front_is_clamped() {
        let mut fifo = fifo(&[1, 2, 3]);

        assert_eq!(fifo.drain_front(2), 2);
        assert_eq!(fifo[0], 3);
        assert_eq!(fifo.drain_front(5), 1);
        assert!(fifo.is_empty());
    }

    #[test]
    fn range_mut_starts_at_offset() {
        let mut fifo = fifo(&[1, 2, 3, 4]);
        for item in fifo.range_mut(2..) {
            *item *= 10;
        }

        assert_eq!(fifo.iter().copied().collect::<Vec<_>>(), vec![1, 2, 30, 40]);
    }
}
