// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Utility functions: image loading, IoU and NMS.

use std::path::Path;

use image::DynamicImage;

use crate::error::{PoseVizError, Result};

/// Load an image file into memory.
///
/// No resizing and no color-space conversion happen here; the buffer is the
/// decoded file as-is.
///
/// # Errors
///
/// Returns [`PoseVizError::ImageDecode`] if the path does not resolve to a
/// decodable image.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    let path = path.as_ref();
    image::open(path).map_err(|e| {
        PoseVizError::ImageDecode(format!("Failed to load image {}: {e}", path.display()))
    })
}

/// Calculate IoU (Intersection over Union) between two bounding boxes.
///
/// # Arguments
///
/// * `box1` - First bounding box `[x1, y1, x2, y2]`.
/// * `box2` - Second bounding box `[x1, y1, x2, y2]`.
///
/// # Returns
///
/// IoU value between 0.0 and 1.0.
#[must_use]
pub fn calculate_iou(box1: &[f32; 4], box2: &[f32; 4]) -> f32 {
    let x1 = box1[0].max(box2[0]);
    let y1 = box1[1].max(box2[1]);
    let x2 = box1[2].min(box2[2]);
    let y2 = box1[3].min(box2[3]);

    let intersection = ((x2 - x1).max(0.0)) * ((y2 - y1).max(0.0));

    let area1 = (box1[2] - box1[0]) * (box1[3] - box1[1]);
    let area2 = (box2[2] - box2[0]) * (box2[3] - box2[1]);
    let union = area1 + area2 - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

/// Per-class Non-Maximum Suppression for filtering overlapping detections.
///
/// Only suppresses boxes within the same class.
///
/// # Arguments
///
/// * `boxes` - Bounding boxes with scores and class IDs `[(bbox, score, class_id)]`.
/// * `iou_threshold` - IoU threshold for suppression.
///
/// # Returns
///
/// Indices of boxes to keep, sorted by descending score.
///
/// # Panics
///
/// Panics if `partial_cmp` fails for floating point comparisons (e.g. NaN).
#[must_use]
pub fn nms_per_class(boxes: &[([f32; 4], f32, usize)], iou_threshold: f32) -> Vec<usize> {
    if boxes.is_empty() {
        return vec![];
    }

    // Sort by score (descending)
    let mut indices: Vec<usize> = (0..boxes.len()).collect();
    indices.sort_by(|&a, &b| boxes[b].1.partial_cmp(&boxes[a].1).unwrap());

    let mut keep = vec![];
    let mut suppressed = vec![false; boxes.len()];

    for &i in &indices {
        if suppressed[i] {
            continue;
        }
        keep.push(i);

        let class_i = boxes[i].2;

        for &j in &indices {
            if !suppressed[j] && i != j && boxes[j].2 == class_i {
                let iou = calculate_iou(&boxes[i].0, &boxes[j].0);
                if iou > iou_threshold {
                    suppressed[j] = true;
                }
            }
        }
    }

    keep
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_iou() {
        let box1 = [0.0, 0.0, 10.0, 10.0];
        let box2 = [5.0, 5.0, 15.0, 15.0];
        let iou = calculate_iou(&box1, &box2);
        assert!((iou - 0.142_857).abs() < 0.001); // 25 / (100 + 100 - 25)
    }

    #[test]
    fn test_iou_disjoint() {
        let box1 = [0.0, 0.0, 10.0, 10.0];
        let box2 = [20.0, 20.0, 30.0, 30.0];
        assert!((calculate_iou(&box1, &box2)).abs() < f32::EPSILON);
    }

    #[test]
    fn test_nms_per_class() {
        // Two overlapping boxes of different classes should both be kept
        let boxes = vec![
            ([0.0, 0.0, 10.0, 10.0], 0.9, 0),
            ([1.0, 1.0, 11.0, 11.0], 0.8, 1),
            ([100.0, 100.0, 110.0, 110.0], 0.95, 0),
        ];
        let keep = nms_per_class(&boxes, 0.5);
        assert_eq!(keep.len(), 3);
    }

    #[test]
    fn test_nms_per_class_suppression() {
        let boxes = vec![
            ([0.0, 0.0, 10.0, 10.0], 0.9, 0),
            ([1.0, 1.0, 11.0, 11.0], 0.8, 0), // overlapping, same class
        ];
        let keep = nms_per_class(&boxes, 0.5);
        assert_eq!(keep.len(), 1);
        assert!(keep.contains(&0));
    }

    #[test]
    fn test_load_image_missing() {
        let result = load_image("definitely/not/a/real/image.jpg");
        assert!(matches!(
            result.unwrap_err(),
            PoseVizError::ImageDecode(_)
        ));
    }
}
