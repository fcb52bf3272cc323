use serde::{Deserialize, Serialize};

use super::error::{RecordInputError, Result};

/// Fixed image size every record in a dataset is decoded to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
}

impl Geometry {
    /// Rejects empty dimensions and images whose byte size overflows `usize`.
    pub fn new(width: usize, height: usize, depth: usize) -> Result<Self> {
        let bytes = width.checked_mul(height).and_then(|n| n.checked_mul(depth));
        if width == 0 || height == 0 || depth == 0 || bytes.is_none() {
            return Err(RecordInputError::InvalidGeometry {
                width,
                height,
                depth,
            });
        }
        Ok(Geometry {
            width,
            height,
            depth,
        })
    }

    pub fn bytes_per_image(&self) -> usize {
        self.width * self.height * self.depth
    }

    /// Layout of the decoded image tensor, `(height, width, depth)`.
    pub fn image_shape(&self) -> (usize, usize, usize) {
        (self.height, self.width, self.depth)
    }

    /// Layout of the stored bytes, `(depth, height, width)`.
    pub fn record_shape(&self) -> (usize, usize, usize) {
        (self.depth, self.height, self.width)
    }
}
