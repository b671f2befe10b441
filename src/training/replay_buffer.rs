use rand::seq::index;
use rand::Rng;

use crate::error::ReplayError;

/// Fixed-capacity ring buffer of training transitions.
///
/// Once full, every push overwrites the oldest entry.
#[derive(Debug, Clone)]
pub struct ReplayBuffer<T> {
    buffer: Vec<T>,
    capacity: usize,
    position: usize,
}

impl<T> ReplayBuffer<T> {
    /// Create an empty buffer. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        ReplayBuffer {
            buffer: Vec::with_capacity(capacity.min(1 << 16)),
            capacity,
            position: 0,
        }
    }

    /// Add an item to the buffer. Overwrites the oldest when full.
    pub fn push(&mut self, item: T) {
        if self.buffer.len() < self.capacity {
            self.buffer.push(item);
        } else {
            self.buffer[self.position] = item;
        }
        self.position = (self.position + 1) % self.capacity;
    }

    /// Draw `batch_size` distinct entries uniformly at random.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        batch_size: usize,
        rng: &mut R,
    ) -> Result<Vec<&T>, ReplayError> {
        if batch_size > self.buffer.len() {
            return Err(ReplayError::InsufficientData {
                requested: batch_size,
                available: self.buffer.len(),
            });
        }
        let indices = index::sample(rng, self.buffer.len(), batch_size);
        Ok(indices.iter().map(|i| &self.buffer[i]).collect())
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let (newer, older) = if self.buffer.len() < self.capacity {
            (&self.buffer[..], &self.buffer[..0])
        } else {
            self.buffer.split_at(self.position)
        };
        older.iter().chain(newer.iter())
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_push_and_len() {
        let mut buf = ReplayBuffer::new(10);
        assert!(buf.is_empty());

        buf.push(0);
        assert_eq!(buf.len(), 1);

        for i in 1..10 {
            buf.push(i);
        }
        assert_eq!(buf.len(), 10);
        assert_eq!(buf.capacity(), 10);
    }

    #[test]
    fn test_ring_buffer_evicts_oldest() {
        let capacity = 5;
        let k = 7;
        let mut buf = ReplayBuffer::new(capacity);
        for i in 0..capacity + k {
            buf.push(i);
        }
        assert_eq!(buf.len(), capacity);
        for evicted in 0..k {
            assert!(buf.iter().all(|&v| v != evicted));
        }
        let held: Vec<usize> = buf.iter().copied().collect();
        assert_eq!(held, vec![7, 8, 9, 10, 11]);
    }

    #[test]
    fn test_iter_before_wrap_is_insertion_order() {
        let mut buf = ReplayBuffer::new(4);
        buf.push('a');
        buf.push('b');
        assert_eq!(buf.iter().copied().collect::<String>(), "ab");
    }

    #[test]
    fn test_sample_without_replacement() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut buf = ReplayBuffer::new(100);
        for i in 0..50 {
            buf.push(i);
        }
        let batch = buf.sample(50, &mut rng).unwrap();
        let distinct: HashSet<i32> = batch.into_iter().copied().collect();
        assert_eq!(distinct.len(), 50);
    }

    #[test]
    fn test_sample_too_many() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut buf = ReplayBuffer::new(10);
        buf.push(1);
        assert_eq!(
            buf.sample(5, &mut rng),
            Err(ReplayError::InsufficientData {
                requested: 5,
                available: 1
            })
        );
    }

    #[test]
    fn test_sample_is_roughly_uniform() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut buf = ReplayBuffer::new(10);
        for i in 0..25 {
            buf.push(i);
        }
        let mut counts = [0usize; 25];
        for _ in 0..5000 {
            for &v in buf.sample(2, &mut rng).unwrap() {
                counts[v] += 1;
            }
        }
        assert!(counts[..15].iter().all(|&c| c == 0));
        // 10000 draws over 10 entries: ~1000 each.
        assert!(counts[15..].iter().all(|&c| (800..1200).contains(&c)));
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let mut buf = ReplayBuffer::new(0);
        buf.push(1);
        buf.push(2);
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.iter().copied().collect::<Vec<_>>(), vec![2]);
    }
}
