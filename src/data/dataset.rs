use std::path::{Path, PathBuf};

use image::DynamicImage;
use rand::Rng;
use tracing::debug;

use crate::data::image_adapter::encode_pixels;
use crate::error::{GanError, Result};
use crate::math::{Matrix, Shape};

/// File extensions the loader picks up (compared case-insensitively).
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Real training images, decoded, resized to `shape` and encoded once.
#[derive(Debug, Clone)]
pub struct ImageDataset {
    shape: Shape,
    samples: Vec<Vec<f64>>,
    sources: Vec<PathBuf>,
}

impl ImageDataset {
    /// Walks `dir` recursively, decoding every eligible image in path order.
    ///
    /// Any unreadable directory, undecodable file or an empty result is a
    /// `DatasetLoad` error.
    pub fn load(dir: impl AsRef<Path>, shape: &Shape) -> Result<ImageDataset> {
        let dir = dir.as_ref();
        check_shape(shape)?;

        let mut paths = Vec::new();
        collect_image_paths(dir, &mut paths).map_err(|e| GanError::DatasetLoad {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;
        paths.sort();

        if paths.is_empty() {
            return Err(GanError::DatasetLoad {
                path: dir.to_path_buf(),
                reason: format!("no {} images found", IMAGE_EXTENSIONS.join("/")),
            });
        }

        let mut samples = Vec::with_capacity(paths.len());
        for path in &paths {
            let image = image::open(path).map_err(|e| GanError::DatasetLoad {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            samples.push(encode_pixels(&image, shape)?);
        }
        debug!(count = samples.len(), dir = %dir.display(), "loaded dataset");

        Ok(ImageDataset { shape: shape.clone(), samples, sources: paths })
    }

    /// Builds a dataset from images already in memory.
    pub fn from_images(images: &[DynamicImage], shape: &Shape) -> Result<ImageDataset> {
        check_shape(shape)?;
        if images.is_empty() {
            return Err(GanError::DatasetLoad {
                path: PathBuf::from("<memory>"),
                reason: "no images given".to_string(),
            });
        }
        let samples = images.iter()
            .map(|image| encode_pixels(image, shape))
            .collect::<Result<Vec<_>>>()?;
        Ok(ImageDataset { shape: shape.clone(), samples, sources: Vec::new() })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Files the samples were decoded from, in sample order. Empty for
    /// in-memory datasets.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// Encoded pixels of sample `index`.
    pub fn sample(&self, index: usize) -> &[f64] {
        &self.samples[index]
    }

    /// Draws `batch_size` samples uniformly with replacement, one per row.
    pub fn sample_batch<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Matrix {
        let data = (0..batch_size)
            .map(|_| self.samples[rng.gen_range(0..self.samples.len())].clone())
            .collect();
        Matrix::from_data(data)
    }
}

/// Loads every eligible image under `dir`; see `ImageDataset::load`.
pub fn load_dataset(dir: impl AsRef<Path>, shape: &Shape) -> Result<ImageDataset> {
    ImageDataset::load(dir, shape)
}

fn check_shape(shape: &Shape) -> Result<()> {
    shape.check_image()
        .map(|_| ())
        .map_err(|reason| GanError::InvalidConfig(format!("dataset image shape: {reason}")))
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}

fn collect_image_paths(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_image_paths(&path, out)?;
        } else if has_image_extension(&path) {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use tempfile::tempdir;

    fn solid(value: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 6, Rgb([value, value, value])))
    }

    #[test]
    fn loads_nested_images_in_path_order() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        solid(10).save(dir.path().join("b.png")).unwrap();
        solid(200).save(dir.path().join("sub").join("a.png")).unwrap();
        solid(90).save(dir.path().join("c.jpg")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let ds = ImageDataset::load(dir.path(), &Shape::image(4, 4, 3)).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.sample(0).len(), 48);
        assert!(ds.sources()[0].ends_with("b.png"));
        assert!(ds.sources()[2].ends_with("sub/a.png"));
    }

    #[test]
    fn extensions_match_case_insensitively() {
        assert!(has_image_extension(Path::new("faces/IMG_001.JPG")));
        assert!(has_image_extension(Path::new("x.Jpeg")));
        assert!(!has_image_extension(Path::new("x.gif")));
        assert!(!has_image_extension(Path::new("jpg")));
    }

    #[test]
    fn empty_directory_is_dataset_load_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("readme.md"), "no images").unwrap();
        let err = ImageDataset::load(dir.path(), &Shape::image(4, 4, 3)).unwrap_err();
        assert!(matches!(err, GanError::DatasetLoad { .. }));
    }

    #[test]
    fn missing_directory_is_dataset_load_error() {
        let dir = tempdir().unwrap();
        let err = ImageDataset::load(dir.path().join("nope"), &Shape::image(4, 4, 3)).unwrap_err();
        assert!(matches!(err, GanError::DatasetLoad { .. }));
    }

    #[test]
    fn undecodable_file_names_its_path() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("broken.jpg"), b"not a jpeg").unwrap();
        match ImageDataset::load(dir.path(), &Shape::image(4, 4, 3)) {
            Err(GanError::DatasetLoad { path, .. }) => assert!(path.ends_with("broken.jpg")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn batches_have_requested_size_and_are_seeded() {
        let images: Vec<_> = (0..5).map(|i| solid(i * 40)).collect();
        let ds = ImageDataset::from_images(&images, &Shape::image(2, 2, 3)).unwrap();

        let a = ds.sample_batch(8, &mut ChaCha8Rng::seed_from_u64(1));
        let b = ds.sample_batch(8, &mut ChaCha8Rng::seed_from_u64(1));
        assert_eq!((a.rows, a.cols), (8, 12));
        assert_eq!(a, b);
    }
}
