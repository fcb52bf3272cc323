//! Lazy stages the input pipeline is assembled from.
//!
//! Every stage works on iterators of `Result<T, E>`: errors are forwarded as
//! soon as they are seen, so a consumer always observes the first failure.

pub mod batch;
pub mod repeat;
pub mod shuffle;

use rand::Rng;

pub use batch::Batched;
pub use repeat::{repeat, Repeat};
pub use shuffle::ShuffleBuffer;

pub trait PipelineExt<T, E>: Iterator<Item = Result<T, E>> + Sized {
    fn shuffle_buffer<R: Rng>(self, capacity: usize, rng: R) -> ShuffleBuffer<Self, T, R> {
        ShuffleBuffer::new(self, capacity, rng)
    }

    fn batched(self, batch_size: usize, drop_last: bool) -> Batched<Self> {
        Batched::new(self, batch_size, drop_last)
    }
}

impl<I, T, E> PipelineExt<T, E> for I where I: Iterator<Item = Result<T, E>> {}
