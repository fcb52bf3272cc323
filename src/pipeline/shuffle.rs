use rand::Rng;

/// Approximate shuffle over an unbounded stream.
///
/// Keeps up to `capacity` items in a buffer and emits a uniformly chosen one
/// each time, refilling from the inner stream. With a capacity of one the
/// order is unchanged.
pub struct ShuffleBuffer<I, T, R> {
    inner: I,
    buffer: Vec<T>,
    capacity: usize,
    rng: R,
    exhausted: bool,
}

impl<I, T, R> ShuffleBuffer<I, T, R> {
    pub fn new(inner: I, capacity: usize, rng: R) -> Self {
        let capacity = capacity.max(1);
        ShuffleBuffer {
            inner,
            // Large buffers fill lazily
            buffer: Vec::with_capacity(capacity.min(1024)),
            capacity,
            rng,
            exhausted: false,
        }
    }
}

impl<I, T, E, R> Iterator for ShuffleBuffer<I, T, R>
where
    I: Iterator<Item = Result<T, E>>,
    R: Rng,
{
    type Item = Result<T, E>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.exhausted && self.buffer.len() < self.capacity {
            match self.inner.next() {
                Some(Ok(item)) => self.buffer.push(item),
                Some(Err(e)) => return Some(Err(e)),
                None => self.exhausted = true,
            }
        }

        if self.buffer.is_empty() {
            return None;
        }

        let index = self.rng.gen_range(0..self.buffer.len());
        Some(Ok(self.buffer.swap_remove(index)))
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn numbers(n: u32) -> impl Iterator<Item = Result<u32, String>> {
        (0..n).map(Ok)
    }

    #[test]
    fn emits_a_permutation() {
        let mut out: Vec<u32> = ShuffleBuffer::new(numbers(100), 10, StdRng::seed_from_u64(1))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_ne!(out, (0..100).collect::<Vec<_>>());
        out.sort_unstable();
        assert_eq!(out, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn capacity_one_keeps_order() {
        let out: Vec<u32> = ShuffleBuffer::new(numbers(20), 1, StdRng::seed_from_u64(3))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(out, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn same_seed_same_order() {
        let a: Vec<_> = ShuffleBuffer::new(numbers(50), 16, StdRng::seed_from_u64(9)).collect();
        let b: Vec<_> = ShuffleBuffer::new(numbers(50), 16, StdRng::seed_from_u64(9)).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn window_bounds_displacement() {
        // An item can only be emitted once it has entered the buffer
        let out: Vec<u32> = ShuffleBuffer::new(numbers(200), 5, StdRng::seed_from_u64(4))
            .collect::<Result<_, _>>()
            .unwrap();
        for (position, value) in out.iter().enumerate() {
            assert!((*value as usize) < position + 5);
        }
    }

    #[test]
    fn forwards_errors() {
        let items = vec![Ok(1), Err("bad".to_string()), Ok(2)];
        let mut stream = ShuffleBuffer::new(items.into_iter(), 4, StdRng::seed_from_u64(0));
        assert_eq!(stream.next(), Some(Err("bad".to_string())));
    }
}
