//! Input pipeline for image classification records.
//!
//! ```rust,ignore
//! let input = RecordInput::new(Geometry::new(32, 32, 3)?, "data", 10, "train", true, None)?;
//! for batch in input.make_batch(128)?.take(1000) {
//!     let (images, labels) = batch?.into_parts();
//!     // images: (128, 32, 32, 3), labels: (128, 10)
//! }
//! ```

pub mod augment;
pub mod dataloader;
pub mod pipeline;
pub mod record;

pub use dataloader::config::{LabelPolicy, RecordInputConfig};
pub use dataloader::data_batch::{DataBatch, Sample};
pub use dataloader::error::{RecordInputError, Result};
pub use dataloader::geometry::Geometry;
pub use dataloader::par_iter::BatchIter;
pub use dataloader::record_input::RecordInput;
pub use dataloader::subset::{num_examples_per_epoch, Subset, SubsetSizes};
