use log::debug;

/// Re-creates its source every time the previous one runs dry.
///
/// Ends when a freshly created source yields nothing, so an empty dataset
/// cannot spin forever. A failure to create a source is yielded once and
/// ends the stream.
pub struct Repeat<F, I> {
    make_source: F,
    current: Option<I>,
    epoch: usize,
    yielded_this_epoch: usize,
    done: bool,
}

pub fn repeat<F, I, T, E>(make_source: F) -> Repeat<F, I>
where
    F: FnMut() -> Result<I, E>,
    I: Iterator<Item = Result<T, E>>,
{
    Repeat {
        make_source,
        current: None,
        epoch: 0,
        yielded_this_epoch: 0,
        done: false,
    }
}

impl<F, I, T, E> Iterator for Repeat<F, I>
where
    F: FnMut() -> Result<I, E>,
    I: Iterator<Item = Result<T, E>>,
{
    type Item = Result<T, E>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }

            if self.current.is_none() {
                match (self.make_source)() {
                    Ok(source) => {
                        self.yielded_this_epoch = 0;
                        self.current = Some(source);
                    }
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                }
            }

            let source = self.current.as_mut()?;

            match source.next() {
                Some(item) => {
                    self.yielded_this_epoch += 1;
                    return Some(item);
                }
                None => {
                    self.current = None;
                    if self.yielded_this_epoch == 0 {
                        self.done = true;
                        return None;
                    }
                    self.epoch += 1;
                    debug!("Finished epoch {} ({} records)", self.epoch, self.yielded_this_epoch);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(items: Vec<u32>) -> impl FnMut() -> Result<std::vec::IntoIter<Result<u32, String>>, String> {
        move || Ok(items.iter().copied().map(Ok).collect::<Vec<_>>().into_iter())
    }

    #[test]
    fn cycles_through_source() {
        let items: Vec<u32> = repeat(source(vec![1, 2, 3]))
            .take(8)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(items, vec![1, 2, 3, 1, 2, 3, 1, 2]);
    }

    #[test]
    fn empty_source_ends() {
        let mut stream = repeat(source(Vec::new()));
        assert!(stream.next().is_none());
        assert!(stream.next().is_none());
    }

    #[test]
    fn source_failure_is_reported_once() {
        let mut stream = repeat(|| Err::<std::vec::IntoIter<Result<u32, String>>, _>("missing".to_string()));
        assert_eq!(stream.next(), Some(Err("missing".to_string())));
        assert_eq!(stream.next(), None);
    }
}
