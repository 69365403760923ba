pub mod generate;

pub use generate::{generate_file, generate_image, sample_file, LoadedGenerator};
