use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{bail, ensure, Context, Result};
use image::{GrayImage, RgbImage, RgbaImage};
use log::info;
use ndarray::{ArrayView3, Axis};
use record_input::dataloader::for_imagesdir::{pack_image_dir, PackOptions};
use record_input::{DataBatch, Geometry, RecordInput, RecordInputConfig, Subset};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
struct GeometryArgs {
    #[structopt(long, default_value = "10")]
    width: usize,
    #[structopt(long, default_value = "10")]
    height: usize,
    #[structopt(long, default_value = "1")]
    depth: usize,
}

impl GeometryArgs {
    fn geometry(&self) -> Result<Geometry> {
        Ok(Geometry::new(self.width, self.height, self.depth)?)
    }
}

#[derive(Debug, StructOpt)]
#[structopt(name = "record-input", about = "Inspect and build image record datasets")]
enum Command {
    /// Pull batches from a record dataset and print them
    Show {
        #[structopt(long, parse(from_os_str), default_value = "debug/resnet")]
        data_dir: PathBuf,
        #[structopt(flatten)]
        geometry: GeometryArgs,
        #[structopt(long, default_value = "11")]
        num_classes: usize,
        #[structopt(long, default_value = "train")]
        subset: String,
        #[structopt(long)]
        no_distortion: bool,
        #[structopt(long, default_value = "11")]
        batch_size: usize,
        #[structopt(long, default_value = "1")]
        batches: usize,
        /// JSON file with pipeline settings
        #[structopt(long, parse(from_os_str))]
        config: Option<PathBuf>,
        /// Write the images of the first batch as PNG files into this directory
        #[structopt(long, parse(from_os_str))]
        dump_png: Option<PathBuf>,
    },
    /// Pack a `<root>/<class>/<image>` directory into a record file
    Pack {
        #[structopt(parse(from_os_str))]
        image_dir: PathBuf,
        #[structopt(parse(from_os_str))]
        out_dir: PathBuf,
        #[structopt(long, default_value = "train")]
        subset: String,
        #[structopt(flatten)]
        geometry: GeometryArgs,
        #[structopt(long)]
        threads: Option<usize>,
    },
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    match Command::from_args() {
        Command::Show {
            data_dir,
            geometry,
            num_classes,
            subset,
            no_distortion,
            batch_size,
            batches,
            config,
            dump_png,
        } => {
            let config = config.as_deref().map(load_config).transpose()?;
            let input = RecordInput::new(
                geometry.geometry()?,
                &data_dir,
                num_classes,
                &subset,
                !no_distortion,
                config,
            )?;

            for (index, batch) in input.make_batch(batch_size)?.take(batches).enumerate() {
                let batch = batch.with_context(|| format!("failed to read batch {}", index))?;
                print_batch(&batch);
                if index == 0 {
                    if let Some(dir) = &dump_png {
                        dump_batch(&batch, dir)?;
                    }
                }
            }
        }
        Command::Pack {
            image_dir,
            out_dir,
            subset,
            geometry,
            threads,
        } => {
            let subset: Subset = subset.parse()?;
            let mut options = PackOptions::default();
            if let Some(threads) = threads {
                options.threads = threads;
            }
            let summary = pack_image_dir(&image_dir, &out_dir, subset, geometry.geometry()?, options)
                .with_context(|| format!("failed to pack {}", image_dir.display()))?;
            for (label, class) in summary.classes.iter().enumerate() {
                println!("{}\t{}", label, class);
            }
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<RecordInputConfig> {
    let file = File::open(path).with_context(|| format!("cannot open config {}", path.display()))?;
    let config = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}

fn print_batch(batch: &DataBatch) {
    println!(
        "batch {}: images {:?}, labels {:?}",
        batch.batch_number,
        batch.images.shape(),
        batch.labels.shape()
    );
    println!("{}", batch.images);
    println!("{}", batch.labels);
}

fn dump_batch(batch: &DataBatch, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let classes = batch.class_indices();

    for (index, image) in batch.images.axis_iter(Axis(0)).enumerate() {
        let label = classes[index].map_or_else(|| "none".to_string(), |c| c.to_string());
        let path = dir.join(format!("{:04}_label{}.png", index, label));
        save_png(image, &path)?;
    }

    info!("Wrote {} images to {}", batch.len(), dir.display());
    Ok(())
}

fn save_png(image: ArrayView3<f32>, path: &Path) -> Result<()> {
    let (height, width, depth) = image.dim();
    ensure!(width > 0 && height > 0, "empty image");
    let raw: Vec<u8> = image.iter().map(|&v| v.round().clamp(0.0, 255.0) as u8).collect();
    let (width, height) = (width as u32, height as u32);

    match depth {
        1 => GrayImage::from_raw(width, height, raw).context("bad image buffer")?.save(path)?,
        3 => RgbImage::from_raw(width, height, raw).context("bad image buffer")?.save(path)?,
        4 => RgbaImage::from_raw(width, height, raw).context("bad image buffer")?.save(path)?,
        depth => bail!("cannot write {}-channel image as PNG", depth),
    }
    Ok(())
}
