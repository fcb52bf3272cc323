use std::path::Path;

use image::{GrayImage, Luma, Rgb, RgbImage};
use record_input::dataloader::for_imagesdir::{pack_image_dir, PackOptions};
use record_input::{Geometry, RecordInput, Subset};

fn save_gray(dir: &Path, name: &str, value: u8) {
    std::fs::create_dir_all(dir).unwrap();
    GrayImage::from_pixel(4, 3, Luma([value])).save(dir.join(name)).unwrap();
}

#[test]
fn packed_directory_reads_back_through_record_input() {
    let images = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();

    // Classes are labelled in name order, not creation order
    save_gray(&images.path().join("zebra"), "a.png", 200);
    save_gray(&images.path().join("ant"), "b.png", 10);
    save_gray(&images.path().join("ant"), "c.png", 20);
    std::fs::write(images.path().join("ant").join("notes.txt"), "skip me").unwrap();

    let geometry = Geometry::new(4, 3, 1).unwrap();
    let options = PackOptions {
        threads: 2,
        ..Default::default()
    };
    let summary = pack_image_dir(images.path(), out.path(), Subset::Eval, geometry, options).unwrap();

    assert_eq!(summary.records, 3);
    assert_eq!(summary.classes, vec!["ant".to_string(), "zebra".to_string()]);
    assert_eq!(summary.output, out.path().join("eval.tfrecords"));

    let input = RecordInput::new(geometry, out.path(), 2, "eval", false, None).unwrap();
    let batch = input.make_batch(3).unwrap().next().unwrap().unwrap();

    assert_eq!(batch.images.shape(), &[3, 3, 4, 1]);
    assert_eq!(batch.class_indices(), vec![Some(0), Some(0), Some(1)]);
    assert_eq!(batch.images[[0, 2, 3, 0]], 10.0);
    assert_eq!(batch.images[[1, 0, 0, 0]], 20.0);
    assert_eq!(batch.images[[2, 1, 1, 0]], 200.0);
}

#[test]
fn rgb_images_keep_channels_after_decode() {
    let images = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let class_dir = images.path().join("red");
    std::fs::create_dir_all(&class_dir).unwrap();
    RgbImage::from_pixel(2, 2, Rgb([255, 16, 1]))
        .save(class_dir.join("px.png"))
        .unwrap();

    let geometry = Geometry::new(2, 2, 3).unwrap();
    pack_image_dir(images.path(), out.path(), Subset::Train, geometry, PackOptions::default()).unwrap();

    let input = RecordInput::new(geometry, out.path(), 1, "validation", false, None);
    // Packed as train, so the validation file does not exist
    assert!(input.unwrap().make_batch(1).unwrap().next().unwrap().is_err());

    let input = RecordInput::new(geometry, out.path(), 1, "train", false, None).unwrap();
    let (image, _) = input
        .decode_record(&first_raw_record(&out.path().join("train.tfrecords")))
        .unwrap();
    assert_eq!(image.dim(), (2, 2, 3));
    assert_eq!(image[[1, 0, 0]], 255.0);
    assert_eq!(image[[1, 0, 1]], 16.0);
    assert_eq!(image[[1, 0, 2]], 1.0);
}

fn first_raw_record(path: &Path) -> Vec<u8> {
    record_input::record::RecordReader::open(path, true)
        .unwrap()
        .next()
        .unwrap()
        .unwrap()
}
