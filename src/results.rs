// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Result types for pose inference output.
//!
//! [`PoseResults`] holds everything the model produced for one image. The
//! keypoint coordinates are in original image pixel space, not normalized;
//! detection order is the order the model returned them in.

use std::collections::HashMap;

use ndarray::{Array2, Array3, ArrayView1, ArrayView2, s};

/// Timing information for inference operations (in milliseconds).
#[derive(Debug, Clone, Default)]
pub struct Speed {
    /// Time spent on preprocessing.
    pub preprocess: Option<f64>,
    /// Time spent on model inference.
    pub inference: Option<f64>,
    /// Time spent on postprocessing.
    pub postprocess: Option<f64>,
}

impl Speed {
    /// Create a new Speed instance with all timings in milliseconds.
    #[must_use]
    pub const fn new(preprocess: f64, inference: f64, postprocess: f64) -> Self {
        Self {
            preprocess: Some(preprocess),
            inference: Some(inference),
            postprocess: Some(postprocess),
        }
    }

    /// Sum of preprocess, inference, and postprocess times in milliseconds.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.preprocess.unwrap_or(0.0)
            + self.inference.unwrap_or(0.0)
            + self.postprocess.unwrap_or(0.0)
    }
}

/// Inference output for a single image.
#[derive(Debug, Clone)]
pub struct PoseResults {
    /// Original image shape (height, width).
    pub orig_shape: (u32, u32),
    /// Detection bounding boxes, one row per detected subject.
    pub boxes: Option<Boxes>,
    /// Pose keypoints for every detected subject.
    pub keypoints: Keypoints,
    /// Inference timing information.
    pub speed: Speed,
    /// Class ID to name mapping.
    pub names: HashMap<usize, String>,
    /// Path to the source image.
    pub path: String,
}

impl PoseResults {
    /// Create an empty result set for an image.
    #[must_use]
    pub fn new(
        orig_shape: (u32, u32),
        path: String,
        names: HashMap<usize, String>,
        speed: Speed,
    ) -> Self {
        Self {
            orig_shape,
            boxes: None,
            keypoints: Keypoints::empty(orig_shape),
            speed,
            names,
            path,
        }
    }

    /// Number of detected subjects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    /// Check if nothing was detected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total keypoint count across all detections.
    #[must_use]
    pub fn total_keypoints(&self) -> usize {
        self.keypoints.len() * self.keypoints.num_per_detection()
    }

    /// Generate a log string describing the results (e.g., "2 poses, ").
    #[must_use]
    pub fn verbose(&self) -> String {
        if self.is_empty() {
            return "(no detections), ".to_string();
        }
        let n = self.len();
        let suffix = if n > 1 { "s" } else { "" };
        format!("{n} pose{suffix}, ")
    }
}

/// Detection bounding boxes.
///
/// Stores one row per detection: `[x1, y1, x2, y2, conf, cls]` in original
/// image pixel space.
#[derive(Debug, Clone)]
pub struct Boxes {
    /// Raw data array with shape (N, 6).
    pub data: Array2<f32>,
    /// Original image shape (height, width).
    pub orig_shape: (u32, u32),
}

impl Boxes {
    /// Create a new Boxes instance from a (N, 6) array.
    #[must_use]
    pub const fn new(data: Array2<f32>, orig_shape: (u32, u32)) -> Self {
        Self { data, orig_shape }
    }

    /// Number of boxes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    /// Check if there are no boxes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Boxes in xyxy format `[x1, y1, x2, y2]`.
    #[must_use]
    pub fn xyxy(&self) -> ArrayView2<'_, f32> {
        self.data.slice(s![.., 0..4])
    }

    /// Confidence scores (0.0 to 1.0).
    #[must_use]
    pub fn conf(&self) -> ArrayView1<'_, f32> {
        self.data.slice(s![.., 4])
    }

    /// Class IDs.
    #[must_use]
    pub fn cls(&self) -> ArrayView1<'_, f32> {
        self.data.slice(s![.., 5])
    }
}

/// Pose keypoints.
///
/// Raw data has shape (N, K, 2) or (N, K, 3) when per-keypoint confidence is
/// included: N detections, K keypoints each.
#[derive(Debug, Clone)]
pub struct Keypoints {
    /// Raw keypoint data.
    pub data: Array3<f32>,
    /// Original image shape (height, width).
    pub orig_shape: (u32, u32),
    /// Whether confidence values are included.
    has_visible: bool,
}

impl Keypoints {
    /// Create a new Keypoints instance.
    ///
    /// # Panics
    ///
    /// Panics if the last axis is not 2 or 3 wide.
    #[must_use]
    pub fn new(data: Array3<f32>, orig_shape: (u32, u32)) -> Self {
        let dim = data.shape()[2];
        assert!(dim == 2 || dim == 3, "keypoint dim must be 2 or 3, got {dim}");
        let has_visible = dim == 3;
        Self {
            data,
            orig_shape,
            has_visible,
        }
    }

    /// Create an empty keypoint set (zero detections).
    #[must_use]
    pub fn empty(orig_shape: (u32, u32)) -> Self {
        Self::new(Array3::zeros((0, 0, 3)), orig_shape)
    }

    /// Number of detected subjects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.shape()[0]
    }

    /// Keypoints per detection.
    #[must_use]
    pub fn num_per_detection(&self) -> usize {
        self.data.shape()[1]
    }

    /// Check if there are no keypoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// xy coordinates with shape (N, K, 2).
    #[must_use]
    pub fn xy(&self) -> Array3<f32> {
        self.data.slice(s![.., .., 0..2]).to_owned()
    }

    /// Per-keypoint confidence values with shape (N, K), if available.
    #[must_use]
    pub fn conf(&self) -> Option<Array2<f32>> {
        if self.has_visible {
            Some(self.data.slice(s![.., .., 2]).to_owned())
        } else {
            None
        }
    }
}
