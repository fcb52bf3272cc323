pub mod config;
pub mod data_batch;
pub mod error;
pub mod for_imagesdir;
pub mod geometry;
pub mod info;
pub mod par_iter;
pub mod record_input;
pub mod subset;
