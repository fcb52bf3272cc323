use std::path::{Path, PathBuf};

use log::{debug, warn};
use ndarray::{Array1, Array3};
use prost::Message;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::augment;
use crate::pipeline::{self, PipelineExt};
use crate::record::example::{IMAGE_KEY, LABEL_KEY};
use crate::record::{Example, ExampleExt, RecordReader};

use super::config::{LabelPolicy, RecordInputConfig};
use super::data_batch::{DataBatch, Sample};
use super::error::{RecordInputError, Result};
use super::geometry::Geometry;
use super::info::log_pipeline_info;
use super::par_iter::{BatchIter, BatchSender};
use super::subset::Subset;

/// Reads one subset of a record dataset and turns it into an endless stream
/// of `(images, labels)` batches.
#[derive(Clone, Debug)]
pub struct RecordInput {
    data_dir: PathBuf,
    subset: Subset,
    geometry: Geometry,
    num_classes: usize,
    use_distortion: bool,
    examples_per_epoch: usize,
    config: RecordInputConfig,
}

impl RecordInput {
    /// Validates everything that can be checked without touching the data
    /// file. The file itself is opened on the first pull from `make_batch`.
    pub fn new(
        geometry: Geometry,
        data_dir: impl AsRef<Path>,
        num_classes: usize,
        subset: &str,
        use_distortion: bool,
        config: Option<RecordInputConfig>,
    ) -> Result<Self> {
        let geometry = Geometry::new(geometry.width, geometry.height, geometry.depth)?;
        if num_classes == 0 {
            return Err(RecordInputError::InvalidNumClasses);
        }

        let subset: Subset = subset.parse()?;
        let config = config.unwrap_or_default().build()?;
        let examples_per_epoch = config.subset_sizes.examples_per_epoch(subset)?;

        Ok(RecordInput {
            data_dir: data_dir.as_ref().to_owned(),
            subset,
            geometry,
            num_classes,
            use_distortion,
            examples_per_epoch,
            config,
        })
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn subset(&self) -> Subset {
        self.subset
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn config(&self) -> &RecordInputConfig {
        &self.config
    }

    pub fn examples_per_epoch(&self) -> usize {
        self.examples_per_epoch
    }

    /// True when `preprocess` distorts images rather than passing them through.
    pub fn distortion_active(&self) -> bool {
        self.subset.is_train() && self.use_distortion
    }

    pub fn get_filenames(&self) -> Vec<PathBuf> {
        vec![self.data_dir.join(self.subset.file_name())]
    }

    /// Train shuffle buffer: a fixed share of an epoch plus a few batches of
    /// headroom. `None` for subsets that are read in order.
    pub fn shuffle_buffer_size(&self, batch_size: usize) -> Result<Option<usize>> {
        if !self.subset.is_train() {
            return Ok(None);
        }
        let fraction = self.config.shuffle_fraction;
        let headroom = self.config.shuffle_batch_headroom;
        let min_queue_examples = (self.examples_per_epoch as f64 * fraction).floor() as usize;
        let size = headroom
            .checked_mul(batch_size)
            .and_then(|extra| extra.checked_add(min_queue_examples))
            .ok_or(RecordInputError::InvalidShuffleSettings { fraction, headroom })?;
        Ok(Some(size))
    }

    /// Parses one serialized `Example` into a `(height, width, depth)` image
    /// and a one-hot label.
    pub fn decode_record(&self, raw: &[u8]) -> Result<Sample> {
        let example = Example::decode(raw)?;

        let bytes = example
            .single_bytes(IMAGE_KEY)
            .ok_or(RecordInputError::MissingFeature(IMAGE_KEY))?;
        let label = example
            .single_int64(LABEL_KEY)
            .ok_or(RecordInputError::MissingFeature(LABEL_KEY))?;

        let expected = self.geometry.bytes_per_image();
        if bytes.len() != expected {
            return Err(RecordInputError::ImageSizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }

        // Stored depth-major, exposed channels-last
        let image = Array3::from_shape_vec(self.geometry.record_shape(), bytes.to_vec())?.permuted_axes([1, 2, 0]);
        let image = image.as_standard_layout().mapv(f32::from);

        Ok((image, self.one_hot(label)?))
    }

    fn one_hot(&self, label: i64) -> Result<Array1<f32>> {
        let mut encoded = Array1::zeros(self.num_classes);
        // Labels are stored as int64 but only the int32 range is meaningful
        let index = i32::try_from(label).ok().and_then(|l| usize::try_from(l).ok());
        match index {
            Some(index) if index < self.num_classes => encoded[index] = 1.0,
            _ => match self.config.label_policy {
                LabelPolicy::ZeroVector => {
                    debug!("Label {} out of range, encoding as zero vector", label)
                }
                LabelPolicy::Error => {
                    return Err(RecordInputError::LabelOutOfRange {
                        label,
                        num_classes: self.num_classes,
                    })
                }
            },
        }
        Ok(encoded)
    }

    /// Train-time distortion: center crop-or-pad to the target size, random
    /// crop, then random left-right flip. Identity for other subsets or when
    /// distortion is disabled.
    pub fn preprocess<R: Rng + ?Sized>(&self, image: Array3<f32>, rng: &mut R) -> Result<Array3<f32>> {
        if !self.distortion_active() {
            return Ok(image);
        }

        let Geometry { width, height, .. } = self.geometry;
        let image = augment::crop_or_pad(image.view(), height, width);
        let image = augment::random_crop(image.view(), self.geometry.image_shape(), rng)?;
        Ok(augment::random_flip_left_right(image, rng))
    }

    /// Starts the batch pipeline and returns its cursor.
    ///
    /// Records are repeated forever, decoded, shuffled through a bounded
    /// buffer when reading the train subset, and grouped into batches of
    /// `batch_size`. I/O happens on a background thread; errors, including
    /// a missing data file, arrive through the cursor.
    pub fn make_batch(&self, batch_size: usize) -> Result<BatchIter> {
        if batch_size == 0 {
            return Err(RecordInputError::InvalidBatchSize);
        }

        let shuffle_buffer = self.shuffle_buffer_size(batch_size)?;

        let seed = self
            .config
            .shuffle_seed
            .unwrap_or_else(|| rand::thread_rng().gen());
        log_pipeline_info(self, batch_size, shuffle_buffer, seed);

        let input = self.clone();
        BatchIter::spawn(self.config.prefetch_count, seed, move |sender| {
            input.produce(batch_size, shuffle_buffer, seed, sender)
        })
    }

    fn produce(&self, batch_size: usize, shuffle_buffer: Option<usize>, seed: u64, sender: &BatchSender) {
        let filenames = self.get_filenames();
        let check_integrity = self.config.check_integrity;

        let records = pipeline::repeat(|| -> Result<_> {
            let readers = filenames
                .iter()
                .map(|path| RecordReader::open(path, check_integrity))
                .collect::<Result<Vec<_>>>()?;
            Ok(readers.into_iter().flatten())
        });

        let mut distort_rng = StdRng::seed_from_u64(seed.wrapping_add(1));
        let samples = records.map(|raw| raw.and_then(|raw| self.decode_for_pipeline(&raw, &mut distort_rng)));

        let samples: Box<dyn Iterator<Item = Result<Sample>> + '_> = match shuffle_buffer {
            Some(capacity) => Box::new(samples.shuffle_buffer(capacity, StdRng::seed_from_u64(seed))),
            None => Box::new(samples),
        };

        for (batch_number, batch) in samples.batched(batch_size, self.config.drop_last).enumerate() {
            let batch = batch.and_then(|samples| DataBatch::stack(&samples, batch_number));
            let failed = batch.is_err();
            if sender.send(batch).is_err() {
                debug!("Batch receiver dropped after {} batches", batch_number);
                return;
            }
            if failed {
                return;
            }
        }

        warn!("No records found in {:?}", filenames);
        let path = filenames.into_iter().next().unwrap_or_default();
        let _ = sender.send(Err(RecordInputError::EmptyDataset(path)));
    }

    fn decode_for_pipeline(&self, raw: &[u8], rng: &mut StdRng) -> Result<Sample> {
        let (image, label) = self.decode_record(raw)?;
        if self.config.distort_in_pipeline {
            return Ok((self.preprocess(image, rng)?, label));
        }
        Ok((image, label))
    }
}
