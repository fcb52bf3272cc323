use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, warn};

use super::data_batch::DataBatch;
use super::error::{RecordInputError, Result};

pub type BatchSender = Sender<Result<DataBatch>>;

/// Forward-only cursor over batches built on a background thread.
///
/// Up to `prefetch_count` batches are kept ready. The cursor cannot be
/// rewound; after yielding an error it is exhausted.
pub struct BatchIter {
    receiver: Option<Receiver<Result<DataBatch>>>,
    handle: Option<JoinHandle<()>>,
    seed: u64,
    finished: bool,
}

impl BatchIter {
    pub(crate) fn spawn<F>(prefetch_count: usize, seed: u64, produce: F) -> Result<Self>
    where
        F: FnOnce(&BatchSender) + Send + 'static,
    {
        let (sender, receiver) = bounded(prefetch_count);

        let handle = thread::Builder::new()
            .name("record-input".to_string())
            .spawn(move || {
                produce(&sender);
                debug!("Batch producer finished");
            })?;

        Ok(BatchIter {
            receiver: Some(receiver),
            handle: Some(handle),
            seed,
            finished: false,
        })
    }

    /// Seed of the shuffle and distortion generators, for reproducing a run.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Iterator for BatchIter {
    type Item = Result<DataBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let received = self.receiver.as_ref()?.recv();
        match received {
            Ok(Ok(batch)) => Some(Ok(batch)),
            Ok(Err(e)) => {
                self.finished = true;
                Some(Err(e))
            }
            Err(_) => {
                // Producer hung up; a panic is reported, a normal exit ends the stream
                self.finished = true;
                let handle = self.handle.take()?;
                match handle.join() {
                    Ok(()) => None,
                    Err(_) => Some(Err(RecordInputError::ProducerPanicked)),
                }
            }
        }
    }
}

impl Drop for BatchIter {
    fn drop(&mut self) {
        // Closing the channel makes the producer's next send fail
        drop(self.receiver.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Batch producer thread panicked");
            }
        }
    }
}
