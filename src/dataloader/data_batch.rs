use ndarray::{Array1, Array2, Array3, Array4, ArrayView1, Axis, ErrorKind, ShapeError};
use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};
use rayon::slice::ParallelSliceMut;

use super::error::Result;

/// One decoded record: `(height, width, depth)` image and one-hot label.
pub type Sample = (Array3<f32>, Array1<f32>);

#[derive(Clone, Debug)]
pub struct DataBatch {
    /// `(batch, height, width, depth)`
    pub images: Array4<f32>,
    /// `(batch, num_classes)`
    pub labels: Array2<f32>,
    pub batch_number: usize,
}

impl DataBatch {
    pub fn stack(samples: &[Sample], batch_number: usize) -> Result<Self> {
        let (first_image, first_label) = samples
            .first()
            .ok_or_else(|| ShapeError::from_kind(ErrorKind::OutOfBounds))?;
        let (height, width, depth) = first_image.dim();
        let bytes_per_image = height * width * depth;

        if bytes_per_image == 0
            || samples
                .iter()
                .any(|(image, label)| image.dim() != first_image.dim() || label.len() != first_label.len())
        {
            return Err(ShapeError::from_kind(ErrorKind::IncompatibleShape).into());
        }

        let mut image_data = vec![0f32; samples.len() * bytes_per_image];
        image_data
            .par_chunks_exact_mut(bytes_per_image)
            .zip(samples.par_iter())
            .for_each(|(chunk, (image, _))| {
                // Logical iteration order is row-major whatever the memory layout
                chunk
                    .iter_mut()
                    .zip(image.iter())
                    .for_each(|(dst, src)| *dst = *src);
            });
        let images = Array4::from_shape_vec((samples.len(), height, width, depth), image_data)?;

        let label_views: Vec<ArrayView1<f32>> = samples.iter().map(|(_, label)| label.view()).collect();
        let labels = ndarray::stack(Axis(0), &label_views)?;

        Ok(DataBatch {
            images,
            labels,
            batch_number,
        })
    }

    pub fn len(&self) -> usize {
        self.images.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_parts(self) -> (Array4<f32>, Array2<f32>) {
        (self.images, self.labels)
    }

    /// Index of the hot entry of each label row, `None` for all-zero rows.
    pub fn class_indices(&self) -> Vec<Option<usize>> {
        self.labels
            .outer_iter()
            .map(|row| row.iter().position(|&v| v == 1.0))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{arr1, Array};

    use super::*;

    fn sample(fill: f32, hot: usize) -> Sample {
        let mut label = Array1::zeros(4);
        label[hot] = 1.0;
        (Array3::from_elem((2, 3, 1), fill), label)
    }

    #[test]
    fn stacks_images_and_labels() {
        let batch = DataBatch::stack(&[sample(1.0, 0), sample(2.0, 3), sample(3.0, 1)], 7).unwrap();

        assert_eq!(batch.images.dim(), (3, 2, 3, 1));
        assert_eq!(batch.labels.dim(), (3, 4));
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.batch_number, 7);
        assert_eq!(batch.images[[1, 1, 2, 0]], 2.0);
        assert_eq!(batch.class_indices(), vec![Some(0), Some(3), Some(1)]);
    }

    #[test]
    fn keeps_logical_order_of_permuted_images() {
        // (depth, height, width) data viewed as (height, width, depth)
        let image = Array::range(0.0, 12.0, 1.0)
            .into_shape((2, 2, 3))
            .unwrap()
            .permuted_axes([1, 2, 0]);
        let expected = image.to_owned();
        let batch = DataBatch::stack(&[(image, arr1(&[1.0]))], 0).unwrap();

        assert_eq!(batch.images.index_axis(Axis(0), 0), expected);
    }

    #[test]
    fn rejects_mismatched_samples() {
        let odd = (Array3::zeros((3, 3, 1)), Array1::zeros(4));
        assert!(DataBatch::stack(&[sample(1.0, 0), odd], 0).is_err());
        assert!(DataBatch::stack(&[], 0).is_err());
    }
}
