use log::info;

use super::record_input::RecordInput;

pub fn log_pipeline_info(input: &RecordInput, batch_size: usize, shuffle_buffer: Option<usize>, seed: u64) {
    let geometry = input.geometry();
    let config = input.config();
    let examples = input.examples_per_epoch();
    let full_batches = examples / batch_size;
    let last_batch = examples % batch_size;

    info!("Record input:");
    info!("  Files: {:?}", input.get_filenames());
    info!("  Subset: {} ({} examples per epoch)", input.subset(), examples);
    info!(
        "  Image: {}x{}x{} (width x height x depth)",
        geometry.width, geometry.height, geometry.depth
    );
    info!("  Classes: {}", input.num_classes());
    info!("  Batch size: {}", batch_size);
    info!(
        "  Batches per epoch: {} full{}",
        full_batches,
        if last_batch > 0 {
            format!(", epoch boundary falls inside a batch after {} records", last_batch)
        } else {
            String::new()
        }
    );
    match shuffle_buffer {
        Some(buffer) => info!("  Shuffle: buffer of {} records, seed {}", buffer, seed),
        None => info!("  Shuffle: off"),
    }
    info!(
        "  Distortion: {}",
        if input.distortion_active() && config.distort_in_pipeline {
            "applied in pipeline"
        } else if input.distortion_active() {
            "available, not applied in pipeline"
        } else {
            "off"
        }
    );
    info!("  Label policy: {:?}", config.label_policy);
    info!("  Prefetch: {} batches", config.prefetch_count);
}
