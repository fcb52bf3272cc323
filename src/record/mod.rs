//! TFRecord container: length-prefixed, crc32c-checked records whose payloads
//! are `tensorflow.Example` protobufs. Message types and writing come from
//! `tfrecord`; reading goes through `RecordReader`.

pub mod example;
pub mod reader;

pub use example::ExampleExt;
pub use reader::RecordReader;
pub use tfrecord::{Example, ExampleWriter};

const MASK_DELTA: u32 = 0xa282_ead8;

pub(crate) fn masked_crc(data: &[u8]) -> u32 {
    let crc = crc32c::crc32c(data);
    ((crc >> 15) | (crc << 17)).wrapping_add(MASK_DELTA)
}
