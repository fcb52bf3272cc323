use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use log::debug;
use tfrecord::io::sync::try_read_len;

use crate::dataloader::error::{RecordInputError, Result};

use super::masked_crc;

const FOOTER_LEN: usize = 4;

/// Streams raw record payloads out of a TFRecord file.
///
/// Once an error has been returned the reader is exhausted.
pub struct RecordReader<R> {
    reader: R,
    check_integrity: bool,
    index: usize,
    failed: bool,
}

impl RecordReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>, check_integrity: bool) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        debug!("Opened record file {}", path.display());
        Ok(Self::new(BufReader::new(file), check_integrity))
    }
}

impl<R: Read> RecordReader<R> {
    pub fn new(reader: R, check_integrity: bool) -> Self {
        RecordReader {
            reader,
            check_integrity,
            index: 0,
            failed: false,
        }
    }

    /// Returns `Ok(None)` on a clean end of file.
    pub fn read_record(&mut self) -> Result<Option<Vec<u8>>> {
        let index = self.index;

        let len = match try_read_len(&mut self.reader, self.check_integrity) {
            Ok(Some(len)) => len as u64,
            Ok(None) => return Ok(None),
            Err(error) => return Err(header_error(error, index)),
        };

        // The length is untrusted, so the buffer only grows as bytes arrive
        let mut data = Vec::new();
        (&mut self.reader).take(len).read_to_end(&mut data)?;
        if data.len() as u64 != len {
            return Err(RecordInputError::TruncatedRecord { index });
        }

        let mut data_crc = [0u8; FOOTER_LEN];
        if fill(&mut self.reader, &mut data_crc)? != FOOTER_LEN {
            return Err(RecordInputError::TruncatedRecord { index });
        }

        if self.check_integrity && masked_crc(&data) != u32::from_le_bytes(data_crc) {
            return Err(RecordInputError::ChecksumMismatch {
                index,
                part: "data",
            });
        }

        self.index += 1;
        Ok(Some(data))
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let record = self.read_record().transpose();
        if let Some(Err(_)) = record {
            self.failed = true;
        }
        record
    }
}

fn header_error(error: tfrecord::Error, index: usize) -> RecordInputError {
    match error {
        tfrecord::Error::ChecksumMismatch { .. } => RecordInputError::ChecksumMismatch {
            index,
            part: "length",
        },
        tfrecord::Error::UnexpectedEof => RecordInputError::TruncatedRecord { index },
        tfrecord::Error::IoError(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            RecordInputError::TruncatedRecord { index }
        }
        error => error.into(),
    }
}

// Like read_exact, but reports how many bytes arrived before end of file
fn fill(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use tfrecord::BytesWriter;

    use super::*;

    const HEADER_LEN: usize = 12;

    fn encode(records: &[&[u8]]) -> Vec<u8> {
        let mut bytes = Vec::new();
        let mut writer = BytesWriter::from_writer(&mut bytes).unwrap();
        for record in records {
            writer.send(record.to_vec()).unwrap();
        }
        drop(writer);
        bytes
    }

    #[test]
    fn reads_back_written_records() {
        let bytes = encode(&[b"first", b"", b"third record"]);
        let records: Vec<Vec<u8>> = RecordReader::new(Cursor::new(bytes), true)
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(records, vec![b"first".to_vec(), Vec::new(), b"third record".to_vec()]);
    }

    #[test]
    fn empty_input_has_no_records() {
        let mut reader = RecordReader::new(Cursor::new(Vec::new()), true);
        assert!(reader.read_record().unwrap().is_none());
    }

    #[test]
    fn detects_corrupted_payload() {
        let mut bytes = encode(&[b"payload"]);
        bytes[HEADER_LEN] ^= 0xff;

        let mut reader = RecordReader::new(Cursor::new(bytes.clone()), true);
        assert!(matches!(
            reader.next(),
            Some(Err(RecordInputError::ChecksumMismatch { index: 0, part: "data" }))
        ));
        assert!(reader.next().is_none());

        // Without integrity checks the corrupted payload is passed through
        let mut reader = RecordReader::new(Cursor::new(bytes), false);
        assert_eq!(reader.next().unwrap().unwrap().len(), 7);
    }

    #[test]
    fn detects_corrupted_length() {
        let mut bytes = encode(&[b"payload"]);
        bytes[0] ^= 0x01;
        let mut reader = RecordReader::new(Cursor::new(bytes), true);
        assert!(matches!(
            reader.read_record(),
            Err(RecordInputError::ChecksumMismatch { part: "length", .. })
        ));
    }

    #[test]
    fn detects_truncation() {
        let bytes = encode(&[b"one", b"two"]);
        let truncated = bytes[..bytes.len() - 2].to_vec();
        let mut reader = RecordReader::new(Cursor::new(truncated), true);

        assert_eq!(reader.next().unwrap().unwrap(), b"one".to_vec());
        assert!(matches!(
            reader.next(),
            Some(Err(RecordInputError::TruncatedRecord { index: 1 }))
        ));
    }

    #[test]
    fn truncated_header_is_reported() {
        let bytes = encode(&[b"one"]);
        let mut reader = RecordReader::new(Cursor::new(bytes[..5].to_vec()), true);
        assert!(matches!(
            reader.next(),
            Some(Err(RecordInputError::TruncatedRecord { index: 0 }))
        ));

        let mut reader = RecordReader::new(Cursor::new(bytes[..10].to_vec()), false);
        assert!(matches!(
            reader.next(),
            Some(Err(RecordInputError::TruncatedRecord { index: 0 }))
        ));
    }

    #[test]
    fn huge_length_fails_without_allocating() {
        let len = u64::MAX.to_le_bytes();
        let mut bytes = len.to_vec();
        bytes.extend_from_slice(&masked_crc(&len).to_le_bytes());
        bytes.extend_from_slice(b"short");

        for check_integrity in [true, false] {
            let mut reader = RecordReader::new(Cursor::new(bytes.clone()), check_integrity);
            assert!(matches!(
                reader.next(),
                Some(Err(RecordInputError::TruncatedRecord { index: 0 }))
            ));
            assert!(reader.next().is_none());
        }
    }
}
