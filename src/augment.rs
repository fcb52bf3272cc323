//! Image distortions for `(height, width, depth)` tensors.

use ndarray::{s, Array3, ArrayView3};
use rand::Rng;

use crate::dataloader::error::{RecordInputError, Result};

/// Centers the image in a `target_height` x `target_width` frame, cropping
/// larger axes and zero padding smaller ones.
pub fn crop_or_pad(image: ArrayView3<f32>, target_height: usize, target_width: usize) -> Array3<f32> {
    let (height, width, depth) = image.dim();
    let (src_y, dst_y, rows) = center_window(height, target_height);
    let (src_x, dst_x, cols) = center_window(width, target_width);

    let mut out = Array3::zeros((target_height, target_width, depth));
    out.slice_mut(s![dst_y..dst_y + rows, dst_x..dst_x + cols, ..])
        .assign(&image.slice(s![src_y..src_y + rows, src_x..src_x + cols, ..]));
    out
}

// (source offset, destination offset, length) along one axis
fn center_window(size: usize, target: usize) -> (usize, usize, usize) {
    if size >= target {
        ((size - target) / 2, 0, target)
    } else {
        (0, (target - size) / 2, size)
    }
}

/// Cuts a window of exactly `(height, width, depth)` at a uniformly random
/// offset.
pub fn random_crop<R: Rng + ?Sized>(
    image: ArrayView3<f32>,
    crop: (usize, usize, usize),
    rng: &mut R,
) -> Result<Array3<f32>> {
    let (height, width, depth) = crop;
    let dim = image.dim();
    if dim.0 < height || dim.1 < width || dim.2 != depth {
        return Err(RecordInputError::CropLargerThanImage { crop, image: dim });
    }

    let y = rng.gen_range(0..=dim.0 - height);
    let x = rng.gen_range(0..=dim.1 - width);
    Ok(image.slice(s![y..y + height, x..x + width, ..]).to_owned())
}

/// Mirrors the width axis with probability one half.
pub fn random_flip_left_right<R: Rng + ?Sized>(image: Array3<f32>, rng: &mut R) -> Array3<f32> {
    if rng.gen_bool(0.5) {
        flip_left_right(image.view())
    } else {
        image
    }
}

pub fn flip_left_right(image: ArrayView3<f32>) -> Array3<f32> {
    image.slice(s![.., ..;-1, ..]).to_owned()
}
