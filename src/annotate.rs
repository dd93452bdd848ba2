// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Keypoint index annotation.
//!
//! For every detection, every keypoint gets its zero-based index rendered as
//! text at the integer-rounded keypoint position. Style is fixed: one font
//! scale, one color. Out-of-image positions clip silently during drawing.

use std::env;
use std::fs::{self, File};
use std::io;
use std::path::PathBuf;

use ab_glyph::{FontRef, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;

use crate::results::PoseResults;

/// Fixed font scale for keypoint index labels.
pub const LABEL_SCALE: f32 = 16.0;

/// Fixed label color (green).
pub const LABEL_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Environment variable overriding the label font file.
pub const FONT_ENV: &str = "POSEVIZ_FONT";

/// Fallback font downloaded when no system font is found.
const FALLBACK_FONT_URL: &str =
    "https://github.com/JetBrains/JetBrainsMono/raw/master/fonts/ttf/JetBrainsMono-Regular.ttf";

/// Well-known system font locations, checked in order.
const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// One planned text label: which keypoint of which detection, where, and
/// what text to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeypointLabel {
    /// Detection index in model output order.
    pub detection: usize,
    /// Zero-based keypoint index within its detection.
    pub keypoint: usize,
    /// Integer-rounded x position in image pixels.
    pub x: i32,
    /// Integer-rounded y position in image pixels.
    pub y: i32,
    /// Label text, the string form of the keypoint index.
    pub text: String,
}

/// Compute the annotation plan for a result set.
///
/// Flat iteration over (detection, keypoint) pairs. The label text uses only
/// the keypoint index, matching detection-order enumeration; the detection
/// index is carried for callers that need to disambiguate subjects.
#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn label_plan(results: &PoseResults) -> Vec<KeypointLabel> {
    let kps = &results.keypoints;
    let mut labels = Vec::with_capacity(results.total_keypoints());

    for detection in 0..kps.len() {
        for keypoint in 0..kps.num_per_detection() {
            let x = kps.data[[detection, keypoint, 0]].round() as i32;
            let y = kps.data[[detection, keypoint, 1]].round() as i32;
            labels.push(KeypointLabel {
                detection,
                keypoint,
                x,
                y,
                text: keypoint.to_string(),
            });
        }
    }

    labels
}

/// Draw keypoint index labels onto an image buffer in place.
///
/// One label per keypoint across all detections. Without a font nothing is
/// rendered (the CLI warns in that case). Labels whose position falls
/// outside the image clip silently.
pub fn draw_keypoint_labels(img: &mut RgbImage, results: &PoseResults, font: Option<&FontRef>) {
    let Some(font) = font else {
        return;
    };

    let scale = PxScale::from(LABEL_SCALE);
    for label in label_plan(results) {
        draw_text_mut(img, LABEL_COLOR, label.x, label.y, scale, font, &label.text);
    }
}

/// Resolve the label font, returning the raw font file bytes.
///
/// Resolution order: `POSEVIZ_FONT` env override, well-known system font
/// paths, a cached copy in the user config dir, then a one-time download of
/// the fallback font. Returns `None` when nothing can be resolved.
#[must_use]
pub fn resolve_font_bytes() -> Option<Vec<u8>> {
    if let Ok(path) = env::var(FONT_ENV) {
        if let Ok(bytes) = fs::read(&path) {
            return Some(bytes);
        }
        eprintln!("Failed to read font from {FONT_ENV}={path}");
    }

    for path in SYSTEM_FONT_PATHS {
        if let Ok(bytes) = fs::read(path) {
            return Some(bytes);
        }
    }

    let cached = cached_font_path()?;
    if cached.exists() {
        return fs::read(&cached).ok();
    }

    download_font(&cached)
}

/// Location of the cached fallback font in the user config dir.
fn cached_font_path() -> Option<PathBuf> {
    let file_name = FALLBACK_FONT_URL.rsplit('/').next()?;
    Some(dirs::config_dir()?.join("poseviz").join(file_name))
}

/// Download the fallback font to `target`, returning its bytes.
fn download_font(target: &PathBuf) -> Option<Vec<u8>> {
    if let Some(parent) = target.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Failed to create config directory: {e}");
            return None;
        }
    }

    println!("Downloading {FALLBACK_FONT_URL} to {}", target.display());
    match ureq::get(FALLBACK_FONT_URL).call() {
        Ok(response) => {
            let mut file = match File::create(target) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Failed to create font file: {e}");
                    return None;
                }
            };
            let mut reader = response.into_body().into_reader();
            if let Err(e) = io::copy(&mut reader, &mut file) {
                eprintln!("Failed to download font: {e}");
                let _ = fs::remove_file(target);
                return None;
            }
            fs::read(target).ok()
        }
        Err(e) => {
            eprintln!("Failed to download font from {FALLBACK_FONT_URL}: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{Keypoints, Speed};
    use ndarray::array;
    use std::collections::HashMap;

    fn results_with_keypoints(data: ndarray::Array3<f32>) -> PoseResults {
        let mut results = PoseResults::new(
            (100, 100),
            "test.jpg".to_string(),
            HashMap::new(),
            Speed::default(),
        );
        results.keypoints = Keypoints::new(data, (100, 100));
        results
    }

    #[test]
    fn test_plan_counts_every_keypoint() {
        // Two detections with three keypoints each.
        let data = array![
            [[10.0, 10.0, 0.9], [20.0, 20.0, 0.8], [30.0, 30.0, 0.7]],
            [[40.0, 40.0, 0.9], [50.0, 50.0, 0.8], [60.0, 60.0, 0.7]]
        ];
        let results = results_with_keypoints(data);

        let plan = label_plan(&results);
        assert_eq!(plan.len(), results.total_keypoints());
        assert_eq!(plan.len(), 6);
    }

    #[test]
    fn test_plan_text_is_keypoint_index() {
        let data = array![
            [[10.0, 10.0, 0.9], [20.0, 20.0, 0.8]],
            [[40.0, 40.0, 0.9], [50.0, 50.0, 0.8]]
        ];
        let results = results_with_keypoints(data);

        let plan = label_plan(&results);
        // The index restarts per detection, independent of coordinates.
        assert_eq!(plan[0].text, "0");
        assert_eq!(plan[1].text, "1");
        assert_eq!(plan[2].text, "0");
        assert_eq!(plan[3].text, "1");
        assert_eq!(plan[2].detection, 1);
    }

    #[test]
    fn test_plan_rounds_positions() {
        let data = array![[[10.4, 10.6, 0.9], [20.5, 19.5, 0.8]]];
        let results = results_with_keypoints(data);

        let plan = label_plan(&results);
        assert_eq!((plan[0].x, plan[0].y), (10, 11));
        assert_eq!((plan[1].x, plan[1].y), (21, 20));
    }

    #[test]
    fn test_plan_empty_results() {
        let results = PoseResults::new(
            (100, 100),
            "test.jpg".to_string(),
            HashMap::new(),
            Speed::default(),
        );
        assert!(label_plan(&results).is_empty());
    }

    #[test]
    fn test_draw_without_font_is_noop() {
        let data = array![[[10.0, 10.0, 0.9], [20.0, 20.0, 0.8]]];
        let results = results_with_keypoints(data);

        let mut img = RgbImage::from_pixel(100, 100, Rgb([0, 0, 0]));
        let original = img.clone();
        draw_keypoint_labels(&mut img, &results, None);
        assert_eq!(img, original);
    }

    #[test]
    fn test_draw_empty_results_is_noop() {
        let results = PoseResults::new(
            (100, 100),
            "test.jpg".to_string(),
            HashMap::new(),
            Speed::default(),
        );

        // Even with a font present, zero detections must leave the buffer
        // untouched; without one the call is a no-op either way.
        let font_bytes = SYSTEM_FONT_PATHS.iter().find_map(|p| fs::read(p).ok());
        let font = font_bytes
            .as_deref()
            .and_then(|data| FontRef::try_from_slice(data).ok());

        let mut img = RgbImage::from_pixel(64, 64, Rgb([7, 7, 7]));
        let original = img.clone();
        draw_keypoint_labels(&mut img, &results, font.as_ref());
        assert_eq!(img, original);
    }
}
