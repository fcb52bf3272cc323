use std::collections::HashSet;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use log::{debug, info};
use ndarray::Array3;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::record::example::image_example;
use crate::record::ExampleWriter;

use super::error::{RecordInputError, Result};
use super::geometry::Geometry;
use super::subset::Subset;

pub struct PackOptions {
    pub threads: usize,
    pub filter: FilterType,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
            filter: FilterType::Triangle,
        }
    }
}

#[derive(Debug)]
pub struct PackSummary {
    pub output: PathBuf,
    pub records: usize,
    /// Class directory names, indexed by label
    pub classes: Vec<String>,
}

/// Converts `root/<class>/<image>` into `{out_dir}/{subset}.tfrecords`.
///
/// Class directories are sorted by name to assign labels. Every image is
/// resized to the geometry and stored depth-major as the input pipeline
/// expects.
pub fn pack_image_dir(
    root: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    subset: Subset,
    geometry: Geometry,
    options: PackOptions,
) -> Result<PackSummary> {
    let root = root.as_ref();
    if !root.exists() {
        return Err(RecordInputError::DirectoryNotFound(root.display().to_string()));
    }
    if !matches!(geometry.depth, 1 | 3 | 4) {
        return Err(RecordInputError::UnsupportedDepth(geometry.depth));
    }

    let valid_extensions: HashSet<String> = image::ImageFormat::all()
        .flat_map(|format| format.extensions_str())
        .map(|ext| ext.to_string())
        .collect();

    let mut classes: Vec<String> = std::fs::read_dir(root)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().to_str().map(|s| s.to_owned()))
        .collect();
    // read_dir order is filesystem dependent, labels must not be
    classes.sort_unstable();

    let mut entries = Vec::new();
    for (label, class) in classes.iter().enumerate() {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(root.join(class))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| is_valid_extension(&valid_extensions, path))
            .collect();
        paths.sort_unstable();
        debug!("Class {} \"{}\": {} images", label, class, paths.len());
        entries.extend(paths.into_iter().map(|path| (path, label as i64)));
    }

    if entries.is_empty() {
        return Err(RecordInputError::EmptyDataset(root.to_owned()));
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.threads)
        .build()?;
    let encoded: Vec<(Vec<u8>, i64)> = pool.install(|| {
        entries
            .par_iter()
            .map(|(path, label)| -> Result<(Vec<u8>, i64)> {
                Ok((encode_image(path, geometry, options.filter)?, *label))
            })
            .collect::<Result<_>>()
    })?;

    let output = out_dir.as_ref().join(subset.file_name());
    let records = encoded.len();
    let mut writer = ExampleWriter::create(&output)?;
    for (image, label) in encoded {
        writer.send(image_example(image, label))?;
    }
    writer.flush()?;

    info!(
        "Packed {} images from {} classes into {}",
        records,
        classes.len(),
        output.display()
    );

    Ok(PackSummary {
        output,
        records,
        classes,
    })
}

fn is_valid_extension(valid_extensions: &HashSet<String>, path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| valid_extensions.contains(&ext.to_lowercase()))
        .unwrap_or(false)
}

/// Decodes, resizes and re-lays an image file as `(depth, height, width)` bytes.
pub fn encode_image(path: &Path, geometry: Geometry, filter: FilterType) -> Result<Vec<u8>> {
    let img = image::open(path)?.resize_exact(geometry.width as u32, geometry.height as u32, filter);

    let interleaved = match geometry.depth {
        1 => img.to_luma8().into_raw(),
        3 => img.to_rgb8().into_raw(),
        4 => img.to_rgba8().into_raw(),
        depth => return Err(RecordInputError::UnsupportedDepth(depth)),
    };

    let planar = Array3::from_shape_vec(geometry.image_shape(), interleaved)?
        .permuted_axes([2, 0, 1])
        .iter()
        .copied()
        .collect();
    Ok(planar)
}
