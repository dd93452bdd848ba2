// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Image preprocessing for pose inference.
//!
//! Letterbox resizing (aspect-preserving scale plus constant-color padding),
//! normalization to `[0, 1]` and NCHW tensor layout. The returned scale and
//! padding let postprocessing map model outputs back to original image
//! pixel space.

use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::Array4;

use crate::error::{PoseVizError, Result};

/// Letterbox padding color (gray).
pub const LETTERBOX_COLOR: [u8; 3] = [114, 114, 114];

/// Result of preprocessing an image, containing the tensor and transform info.
#[derive(Debug, Clone)]
pub struct PreprocessResult {
    /// Preprocessed image tensor in NCHW format, normalized to [0, 1].
    pub tensor: Array4<f32>,
    /// Original image dimensions (height, width).
    pub orig_shape: (u32, u32),
    /// Scale factors applied (`scale_y`, `scale_x`).
    pub scale: (f32, f32),
    /// Padding applied (`pad_top`, `pad_left`).
    pub padding: (f32, f32),
}

/// Round a size up to the nearest multiple of the model stride.
#[must_use]
pub const fn check_size(size: usize, stride: u32) -> usize {
    let stride = stride as usize;
    size.div_ceil(stride) * stride
}

/// Preprocess an image for pose inference.
///
/// Performs letterbox resizing to `target_size` (stride-aligned), pads with
/// [`LETTERBOX_COLOR`], normalizes to `[0, 1]` and lays the data out as an
/// NCHW tensor.
///
/// # Arguments
///
/// * `image` - Input image.
/// * `target_size` - Target size as (height, width).
/// * `stride` - Model stride for padding alignment (typically 32).
///
/// # Errors
///
/// Returns an error if the resize buffers cannot be constructed.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn preprocess_image(
    image: &DynamicImage,
    target_size: (usize, usize),
    stride: u32,
) -> Result<PreprocessResult> {
    let (src_w, src_h) = image.dimensions();
    let target_h = check_size(target_size.0, stride) as u32;
    let target_w = check_size(target_size.1, stride) as u32;

    // Scale to fit inside the target while preserving aspect ratio.
    let ratio = (target_w as f32 / src_w as f32).min(target_h as f32 / src_h as f32);
    let new_w = ((src_w as f32 * ratio).round() as u32).clamp(1, target_w);
    let new_h = ((src_h as f32 * ratio).round() as u32).clamp(1, target_h);

    let resized = resize_rgb(image, new_w, new_h)?;

    // Center the resized content on a letterbox canvas.
    let pad_left = (target_w - new_w) / 2;
    let pad_top = (target_h - new_h) / 2;
    let mut canvas = RgbImage::from_pixel(target_w, target_h, Rgb(LETTERBOX_COLOR));
    image::imageops::replace(&mut canvas, &resized, i64::from(pad_left), i64::from(pad_top));

    // HWC u8 -> NCHW f32 in [0, 1].
    let mut tensor = Array4::<f32>::zeros((1, 3, target_h as usize, target_w as usize));
    for (x, y, pixel) in canvas.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        tensor[[0, 0, y, x]] = f32::from(pixel[0]) / 255.0;
        tensor[[0, 1, y, x]] = f32::from(pixel[1]) / 255.0;
        tensor[[0, 2, y, x]] = f32::from(pixel[2]) / 255.0;
    }

    Ok(PreprocessResult {
        tensor,
        orig_shape: (src_h, src_w),
        scale: (ratio, ratio),
        padding: (pad_top as f32, pad_left as f32),
    })
}

/// Resize an image to exact dimensions with bilinear convolution.
fn resize_rgb(image: &DynamicImage, new_w: u32, new_h: u32) -> Result<RgbImage> {
    use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};

    let (src_w, src_h) = image.dimensions();
    let src_rgb = image.to_rgb8();
    let src_image = Image::from_vec_u8(src_w, src_h, src_rgb.into_raw(), PixelType::U8x3)
        .map_err(|e| PoseVizError::Inference(format!("Failed to create resize source: {e}")))?;

    let mut dst_image = Image::new(new_w, new_h, PixelType::U8x3);

    let mut resizer = Resizer::new();
    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));
    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| PoseVizError::Inference(format!("Failed to resize image: {e}")))?;

    RgbImage::from_raw(new_w, new_h, dst_image.into_vec())
        .ok_or_else(|| PoseVizError::Inference("Failed to create resized buffer".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_size() {
        assert_eq!(check_size(640, 32), 640);
        assert_eq!(check_size(641, 32), 672);
        assert_eq!(check_size(1, 32), 32);
    }

    #[test]
    fn test_letterbox_geometry() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(320, 240, Rgb([200, 100, 50])));
        let result = preprocess_image(&img, (640, 640), 32).unwrap();

        assert_eq!(result.tensor.shape(), &[1, 3, 640, 640]);
        assert_eq!(result.orig_shape, (240, 320));
        // 320x240 scales by 2.0 into 640x480, leaving 80px top padding.
        assert!((result.scale.0 - 2.0).abs() < 1e-6);
        assert!((result.padding.0 - 80.0).abs() < 1e-6);
        assert!((result.padding.1 - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_letterbox_padding_color() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(320, 240, Rgb([200, 100, 50])));
        let result = preprocess_image(&img, (640, 640), 32).unwrap();

        // Top-left corner is inside the padding band.
        let expected = f32::from(LETTERBOX_COLOR[0]) / 255.0;
        assert!((result.tensor[[0, 0, 0, 0]] - expected).abs() < 1e-6);
        // Center is image content.
        assert!((result.tensor[[0, 0, 320, 320]] - 200.0 / 255.0).abs() < 0.05);
    }

    #[test]
    fn test_square_input_no_padding() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 100, Rgb([10, 10, 10])));
        let result = preprocess_image(&img, (640, 640), 32).unwrap();
        assert!((result.padding.0).abs() < f32::EPSILON);
        assert!((result.padding.1).abs() < f32::EPSILON);
        assert!((result.scale.0 - 6.4).abs() < 1e-6);
    }
}
