// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! The load, infer, annotate pipeline.
//!
//! Composition shared by the CLI and tests. The image is decoded before the
//! provider is ever invoked, so an unreadable path fails without touching
//! the model.

use std::path::Path;

use ab_glyph::FontRef;
use image::{DynamicImage, RgbImage};

use crate::annotate::draw_keypoint_labels;
use crate::error::Result;
use crate::model::PoseProvider;
use crate::results::PoseResults;
use crate::utils::load_image;

/// Run the pipeline against an image file.
///
/// # Errors
///
/// Returns an error if the image cannot be decoded (before inference runs)
/// or if the provider fails.
pub fn render(
    provider: &mut dyn PoseProvider,
    image_path: &Path,
    font: Option<&FontRef>,
) -> Result<(RgbImage, PoseResults)> {
    let image = load_image(image_path)?;
    render_image(provider, &image, image_path.display().to_string(), font)
}

/// Run the pipeline against an already-loaded image.
///
/// Returns the annotated RGB canvas together with the raw results, so
/// callers can log detection counts and timings.
///
/// # Errors
///
/// Returns an error if the provider fails.
pub fn render_image(
    provider: &mut dyn PoseProvider,
    image: &DynamicImage,
    path: String,
    font: Option<&FontRef>,
) -> Result<(RgbImage, PoseResults)> {
    let results = provider.predict_image(image, path)?;

    let mut canvas = image.to_rgb8();
    draw_keypoint_labels(&mut canvas, &results, font);

    Ok((canvas, results))
}
