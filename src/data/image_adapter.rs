//! Conversions between decoded images and the `[-1, 1]` pixel tensors the
//! networks consume and produce.
//!
//! Images are resized to the target resolution with Lanczos3 and flattened
//! row-major as R, G, B, ... (or a single luma value per pixel).

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, RgbImage};

use crate::error::{GanError, Result};
use crate::math::{Shape, Tensor};

/// Default edge length of postprocessed output images.
pub const DEFAULT_OUTPUT_SIZE: u32 = 256;

fn encode(p: u8) -> f64 {
    p as f64 / 127.5 - 1.0
}

fn decode(v: f64) -> u8 {
    ((v + 1.0) * 127.5).round().clamp(0.0, 255.0) as u8
}

fn not_an_image_shape(port: &str, shape: &Shape, reason: String) -> GanError {
    GanError::ShapeMismatch {
        port: port.to_string(),
        expected: format!("an [height, width, 1|3] image shape ({reason})"),
        actual: shape.to_string(),
    }
}

/// Resizes `image` to `target` and returns its `height × width × channels`
/// encoded pixels.
pub fn encode_pixels(image: &DynamicImage, target: &Shape) -> Result<Vec<f64>> {
    let (h, w, c) = target.check_image()
        .map_err(|reason| not_an_image_shape("image adapter", target, reason))?;
    let (w, h) = (w as u32, h as u32);

    let resized;
    let image = if image.width() == w && image.height() == h {
        image
    } else {
        resized = image.resize_exact(w, h, FilterType::Lanczos3);
        &resized
    };

    let pixels = if c == 1 {
        image.to_luma8().into_raw()
    } else {
        image.to_rgb8().into_raw()
    };
    Ok(pixels.into_iter().map(encode).collect())
}

/// Encodes one image as a batch-of-one tensor with sample shape `target`.
pub fn to_tensor(image: &DynamicImage, target: &Shape) -> Result<Tensor> {
    let data = encode_pixels(image, target)?;
    Tensor::new(1, target.clone(), data)
}

/// Decodes a batch-of-one image tensor.
pub fn from_tensor(tensor: &Tensor) -> Result<DynamicImage> {
    let shape = tensor.sample_shape();
    let (h, w, c) = shape.check_image()
        .map_err(|reason| not_an_image_shape("image adapter", shape, reason))?;
    if tensor.batch_size() != 1 {
        return Err(GanError::ShapeMismatch {
            port: "image adapter".to_string(),
            expected: format!("[1, {}]", shape.dims().iter().map(|d| d.to_string()).collect::<Vec<_>>().join(", ")),
            actual: format!("{:?}", tensor.dims()),
        });
    }
    let (w, h) = (w as u32, h as u32);
    let raw: Vec<u8> = tensor.data().iter().map(|&v| decode(v)).collect();

    // Buffer length equals h·w·c by construction of the tensor.
    let image = if c == 1 {
        GrayImage::from_raw(w, h, raw).map(DynamicImage::ImageLuma8)
    } else {
        RgbImage::from_raw(w, h, raw).map(DynamicImage::ImageRgb8)
    };
    image.ok_or_else(|| not_an_image_shape("image adapter", shape, "buffer size".to_string()))
}

/// Final resize of a generated image to `size × size` RGB.
pub fn postprocess(image: &DynamicImage, size: u32) -> RgbImage {
    image.resize_exact(size, size, FilterType::Lanczos3).to_rgb8()
}
