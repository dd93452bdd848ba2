// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Pose model output decoding.
//!
//! Pose model output shape is typically `[1, 4 + nc + K*D, P]` where the
//! first four features are the candidate box (xywh, letterbox space), the
//! next `nc` are class scores and the rest are `K` keypoints with `D` values
//! each. Decoding filters candidates by confidence, applies per-class NMS
//! and maps boxes and keypoints back to original image pixel space.

use std::collections::HashMap;

use ndarray::{Array2, Array3, s};

use crate::inference::InferenceConfig;
use crate::preprocessing::PreprocessResult;
use crate::results::{Boxes, Keypoints, PoseResults, Speed};
use crate::utils::nms_per_class;

/// Map a box from letterbox space back to original image space.
fn scale_coords(coords: &[f32; 4], scale: (f32, f32), padding: (f32, f32)) -> [f32; 4] {
    let (scale_y, scale_x) = scale;
    let (pad_top, pad_left) = padding;
    [
        (coords[0] - pad_left) / scale_x,
        (coords[1] - pad_top) / scale_y,
        (coords[2] - pad_left) / scale_x,
        (coords[3] - pad_top) / scale_y,
    ]
}

/// Clip a box to image bounds (height, width).
#[allow(clippy::cast_precision_loss)]
fn clip_coords(coords: &[f32; 4], shape: (u32, u32)) -> [f32; 4] {
    let (h, w) = (shape.0 as f32, shape.1 as f32);
    [
        coords[0].clamp(0.0, w),
        coords[1].clamp(0.0, h),
        coords[2].clamp(0.0, w),
        coords[3].clamp(0.0, h),
    ]
}

/// Decode raw pose model output into [`PoseResults`].
///
/// # Arguments
///
/// * `output` - Flat output tensor data.
/// * `output_shape` - Output tensor shape, `[1, features, preds]` or transposed.
/// * `preprocess` - Transform info from preprocessing.
/// * `config` - Confidence/IoU thresholds and detection cap.
/// * `kpt_shape` - (keypoints per detection, values per keypoint).
/// * `names` - Class ID to name mapping.
/// * `path` - Source image path, carried into the results.
/// * `speed` - Timing info accumulated so far.
#[allow(
    clippy::too_many_arguments,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]
#[must_use]
pub fn postprocess_pose(
    output: &[f32],
    output_shape: &[usize],
    preprocess: &PreprocessResult,
    config: &InferenceConfig,
    kpt_shape: (usize, usize),
    names: &HashMap<usize, String>,
    path: String,
    speed: Speed,
) -> PoseResults {
    let mut results = PoseResults::new(preprocess.orig_shape, path, names.clone(), speed);

    let (num_keypoints, kpt_dim) = kpt_shape;
    let kpt_features = num_keypoints * kpt_dim;

    // Parse output shape: [1, features, preds] vs [1, preds, features].
    let expected_features = 4 + names.len().max(1) + kpt_features;
    let (num_preds, is_transposed) = match output_shape {
        [_, a, b] => {
            if *a == expected_features || (a < b && *a >= 4 + kpt_features) {
                (*b, false)
            } else {
                (*a, true)
            }
        }
        [a, b] => {
            if a < b {
                (*b, false)
            } else {
                (*a, true)
            }
        }
        _ => (0, false),
    };

    if output.is_empty() || num_preds == 0 {
        return results;
    }

    let actual_features = output.len() / num_preds;
    if actual_features < 4 + kpt_features {
        return results;
    }

    // Convert to 2D [preds, features].
    let output_2d = if is_transposed {
        Array2::from_shape_vec((num_preds, actual_features), output.to_vec())
            .unwrap_or_else(|_| Array2::zeros((0, 0)))
    } else {
        let arr = Array2::from_shape_vec((actual_features, num_preds), output.to_vec())
            .unwrap_or_else(|_| Array2::zeros((0, 0)));
        arr.t().to_owned()
    };

    if output_2d.is_empty() {
        return results;
    }

    let num_classes = actual_features.saturating_sub(4 + kpt_features).max(1);

    // Confidence filter, collecting candidates with their keypoints.
    let mut candidates: Vec<([f32; 4], f32, usize, Vec<[f32; 3]>)> = Vec::new();

    for i in 0..num_preds {
        let class_scores = output_2d.slice(s![i, 4..4 + num_classes]);
        let (best_class, best_score) = class_scores
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Less))
            .map(|(idx, &score)| (idx, if score.is_nan() { 0.0 } else { score }))
            .unwrap_or((0, 0.0));

        if best_score < config.confidence_threshold {
            continue;
        }

        // Candidate box is xywh; convert to xyxy.
        let cx = output_2d[[i, 0]];
        let cy = output_2d[[i, 1]];
        let w = output_2d[[i, 2]];
        let h = output_2d[[i, 3]];
        let xyxy = [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0];

        let scaled = scale_coords(&xyxy, preprocess.scale, preprocess.padding);
        let clipped = clip_coords(&scaled, preprocess.orig_shape);

        // Keypoints follow the class scores.
        let kpt_start = 4 + num_classes;
        let (oh, ow) = preprocess.orig_shape;
        let mut keypoints = Vec::with_capacity(num_keypoints);
        for k in 0..num_keypoints {
            let offset = kpt_start + k * kpt_dim;
            let kpt_x = output_2d[[i, offset]];
            let kpt_y = output_2d[[i, offset + 1]];
            let kpt_conf = if kpt_dim > 2 {
                output_2d[[i, offset + 2]]
            } else {
                1.0
            };

            let scaled_kpt =
                scale_coords(&[kpt_x, kpt_y, kpt_x, kpt_y], preprocess.scale, preprocess.padding);
            keypoints.push([
                scaled_kpt[0].clamp(0.0, ow as f32),
                scaled_kpt[1].clamp(0.0, oh as f32),
                kpt_conf,
            ]);
        }

        candidates.push((clipped, best_score, best_class, keypoints));
    }

    if candidates.is_empty() {
        results.keypoints = Keypoints::new(
            Array3::zeros((0, num_keypoints, 3)),
            preprocess.orig_shape,
        );
        return results;
    }

    // NMS over candidate boxes.
    let nms_candidates: Vec<_> = candidates
        .iter()
        .map(|(bbox, score, class, _)| (*bbox, *score, *class))
        .collect();
    let keep_indices = nms_per_class(&nms_candidates, config.iou_threshold);
    let num_kept = keep_indices.len().min(config.max_detections);

    let mut boxes_data = Array2::zeros((num_kept, 6));
    let mut keypoints_data = Array3::zeros((num_kept, num_keypoints, 3));

    for (out_idx, &keep_idx) in keep_indices.iter().take(num_kept).enumerate() {
        let (bbox, score, class, kpts) = &candidates[keep_idx];

        boxes_data[[out_idx, 0]] = bbox[0];
        boxes_data[[out_idx, 1]] = bbox[1];
        boxes_data[[out_idx, 2]] = bbox[2];
        boxes_data[[out_idx, 3]] = bbox[3];
        boxes_data[[out_idx, 4]] = *score;
        boxes_data[[out_idx, 5]] = *class as f32;

        for (k, kpt) in kpts.iter().enumerate() {
            keypoints_data[[out_idx, k, 0]] = kpt[0];
            keypoints_data[[out_idx, k, 1]] = kpt[1];
            keypoints_data[[out_idx, k, 2]] = kpt[2];
        }
    }

    results.boxes = Some(Boxes::new(boxes_data, preprocess.orig_shape));
    results.keypoints = Keypoints::new(keypoints_data, preprocess.orig_shape);

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;

    /// Identity transform: model input space == original image space.
    fn identity_preprocess(shape: (u32, u32)) -> PreprocessResult {
        PreprocessResult {
            tensor: Array4::zeros((1, 3, shape.0 as usize, shape.1 as usize)),
            orig_shape: shape,
            scale: (1.0, 1.0),
            padding: (0.0, 0.0),
        }
    }

    fn person_names() -> HashMap<usize, String> {
        HashMap::from([(0, "person".to_string())])
    }

    /// Build a `[1, features, preds]` output with the given candidate rows.
    /// Each row: [cx, cy, w, h, score, kpts...].
    fn build_output(rows: &[Vec<f32>]) -> (Vec<f32>, Vec<usize>) {
        let features = rows[0].len();
        let preds = rows.len();
        // Layout is feature-major: output[f * preds + p].
        let mut data = vec![0.0; features * preds];
        for (p, row) in rows.iter().enumerate() {
            for (f, &v) in row.iter().enumerate() {
                data[f * preds + p] = v;
            }
        }
        (data, vec![1, features, preds])
    }

    #[test]
    fn test_decode_single_detection() {
        // One candidate with 2 keypoints, (x, y, conf) each.
        let row = vec![
            50.0, 50.0, 20.0, 20.0, // box xywh
            0.9, // person score
            10.0, 10.0, 0.8, // keypoint 0
            20.0, 20.0, 0.7, // keypoint 1
        ];
        let (data, shape) = build_output(&[row]);
        let preprocess = identity_preprocess((100, 100));

        let results = postprocess_pose(
            &data,
            &shape,
            &preprocess,
            &InferenceConfig::default(),
            (2, 3),
            &person_names(),
            "test.jpg".to_string(),
            Speed::default(),
        );

        assert_eq!(results.len(), 1);
        assert_eq!(results.total_keypoints(), 2);

        let xy = results.keypoints.xy();
        assert!((xy[[0, 0, 0]] - 10.0).abs() < 1e-4);
        assert!((xy[[0, 1, 1]] - 20.0).abs() < 1e-4);

        let boxes = results.boxes.as_ref().unwrap();
        assert!((boxes.conf()[0] - 0.9).abs() < 1e-4);
        assert!((boxes.xyxy()[[0, 0]] - 40.0).abs() < 1e-4);
    }

    #[test]
    fn test_decode_applies_letterbox_transform() {
        let row = vec![
            50.0, 90.0, 20.0, 20.0, // box
            0.9, // score
            50.0, 90.0, 0.8, // keypoint at box center
        ];
        let (data, shape) = build_output(&[row]);
        // Half-scale with 80px top padding: (x, y) -> ((x - 0) / 0.5, (y - 80) / 0.5)
        let preprocess = PreprocessResult {
            tensor: Array4::zeros((1, 3, 4, 4)),
            orig_shape: (200, 200),
            scale: (0.5, 0.5),
            padding: (80.0, 0.0),
        };

        let results = postprocess_pose(
            &data,
            &shape,
            &preprocess,
            &InferenceConfig::default(),
            (1, 3),
            &person_names(),
            "test.jpg".to_string(),
            Speed::default(),
        );

        let xy = results.keypoints.xy();
        assert!((xy[[0, 0, 0]] - 100.0).abs() < 1e-4);
        assert!((xy[[0, 0, 1]] - 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_low_confidence_filtered() {
        let row = vec![50.0, 50.0, 20.0, 20.0, 0.1, 10.0, 10.0, 0.8];
        let (data, shape) = build_output(&[row]);
        let preprocess = identity_preprocess((100, 100));

        let results = postprocess_pose(
            &data,
            &shape,
            &preprocess,
            &InferenceConfig::default(),
            (1, 3),
            &person_names(),
            "test.jpg".to_string(),
            Speed::default(),
        );

        assert!(results.is_empty());
        assert_eq!(results.total_keypoints(), 0);
    }

    #[test]
    fn test_nms_merges_duplicates() {
        let row_a = vec![50.0, 50.0, 20.0, 20.0, 0.9, 10.0, 10.0, 0.8];
        let row_b = vec![51.0, 51.0, 20.0, 20.0, 0.8, 11.0, 11.0, 0.8];
        let (data, shape) = build_output(&[row_a, row_b]);
        let preprocess = identity_preprocess((100, 100));

        let results = postprocess_pose(
            &data,
            &shape,
            &preprocess,
            &InferenceConfig::default(),
            (1, 3),
            &person_names(),
            "test.jpg".to_string(),
            Speed::default(),
        );

        // Heavily overlapping same-class candidates collapse to the stronger one.
        assert_eq!(results.len(), 1);
        let boxes = results.boxes.as_ref().unwrap();
        assert!((boxes.conf()[0] - 0.9).abs() < 1e-4);
    }

    #[test]
    fn test_empty_output() {
        let preprocess = identity_preprocess((100, 100));
        let results = postprocess_pose(
            &[],
            &[1, 8, 0],
            &preprocess,
            &InferenceConfig::default(),
            (1, 3),
            &person_names(),
            "test.jpg".to_string(),
            Speed::default(),
        );
        assert!(results.is_empty());
    }
}
