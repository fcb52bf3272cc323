use std::path::PathBuf;

use thiserror::Error;

use super::subset::Subset;

pub type Result<T, E = RecordInputError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum RecordInputError {
    // Configuration errors, raised before any file is touched
    #[error("Invalid data subset \"{0}\"")]
    InvalidSubset(String),

    #[error("No example count configured for subset \"{0}\"")]
    UnknownSubsetSize(Subset),

    #[error("Invalid image geometry. Width: {width}, Height: {height}, Depth: {depth}")]
    InvalidGeometry {
        width: usize,
        height: usize,
        depth: usize,
    },

    #[error("Number of classes must be positive")]
    InvalidNumClasses,

    #[error("Batch size must be positive")]
    InvalidBatchSize,

    #[error("Prefetch count must be positive")]
    InvalidPrefetchCount,

    #[error("Invalid shuffle settings. Fraction: {fraction}, Headroom: {headroom}")]
    InvalidShuffleSettings { fraction: f64, headroom: usize },

    // IO and system errors
    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Thread pool error: {0}")]
    ThreadPoolError(#[from] rayon::ThreadPoolBuildError),

    #[error("Batch producer thread panicked")]
    ProducerPanicked,

    // Record container errors
    #[error("Record #{index} is truncated")]
    TruncatedRecord { index: usize },

    #[error("Checksum mismatch in {part} of record #{index}")]
    ChecksumMismatch { index: usize, part: &'static str },

    #[error("Protobuf decode error: {0}")]
    ProtobufError(#[from] prost::DecodeError),

    #[error("Record error: {0}")]
    RecordError(#[from] tfrecord::Error),

    #[error("No records found in {}", .0.display())]
    EmptyDataset(PathBuf),

    // Per-record decode errors
    #[error("Record has no single-valued \"{0}\" feature")]
    MissingFeature(&'static str),

    #[error("Image has {actual} bytes, expected {expected} (depth * height * width)")]
    ImageSizeMismatch { expected: usize, actual: usize },

    #[error("Label {label} is outside [0, {num_classes})")]
    LabelOutOfRange { label: i64, num_classes: usize },

    #[error("Shape error: {0}")]
    ShapeError(#[from] ndarray::ShapeError),

    #[error("Cannot crop {crop:?} out of an image of shape {image:?}")]
    CropLargerThanImage {
        crop: (usize, usize, usize),
        image: (usize, usize, usize),
    },

    #[error("Image depth {0} is not supported, expected 1, 3 or 4")]
    UnsupportedDepth(usize),
}
