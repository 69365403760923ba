pub mod dataset;
pub mod image_adapter;

pub use dataset::{load_dataset, ImageDataset};
pub use image_adapter::{from_tensor, postprocess, to_tensor, DEFAULT_OUTPUT_SIZE};
