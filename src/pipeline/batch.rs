/// Groups consecutive items into `Vec`s of `batch_size`.
///
/// A trailing partial batch is emitted unless `drop_last` is set. On an
/// error the partly collected batch is discarded and the stream ends.
pub struct Batched<I> {
    inner: I,
    batch_size: usize,
    drop_last: bool,
    done: bool,
}

impl<I> Batched<I> {
    pub fn new(inner: I, batch_size: usize, drop_last: bool) -> Self {
        Batched {
            inner,
            batch_size: batch_size.max(1),
            drop_last,
            done: false,
        }
    }
}

impl<I, T, E> Iterator for Batched<I>
where
    I: Iterator<Item = Result<T, E>>,
{
    type Item = Result<Vec<T>, E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut batch = Vec::with_capacity(self.batch_size);
        while batch.len() < self.batch_size {
            match self.inner.next() {
                Some(Ok(item)) => batch.push(item),
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    break;
                }
            }
        }

        if batch.is_empty() || (self.drop_last && batch.len() < self.batch_size) {
            return None;
        }

        Some(Ok(batch))
    }
}
