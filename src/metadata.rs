// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! ONNX model metadata parsing.
//!
//! Pose models exported from the Ultralytics trainer embed their
//! configuration as YAML-ish key/value pairs in the ONNX custom metadata
//! properties. This module extracts the fields the pipeline needs: task,
//! stride, input size, keypoint shape and class names.

use std::collections::HashMap;

use crate::error::{PoseVizError, Result};

/// Metadata extracted from a pose ONNX model.
#[derive(Debug, Clone)]
pub struct ModelMetadata {
    /// Model description (e.g., "Ultralytics YOLO11n-pose model").
    pub description: String,
    /// Exporter version.
    pub version: String,
    /// Task string declared by the model (must be "pose").
    pub task: String,
    /// Model stride (typically 32).
    pub stride: u32,
    /// Input image size as (height, width).
    pub imgsz: (usize, usize),
    /// Keypoint shape as (keypoints per detection, values per keypoint).
    pub kpt_shape: (usize, usize),
    /// Class ID to class name mapping.
    pub names: HashMap<usize, String>,
}

impl ModelMetadata {
    /// Parse metadata from ONNX model custom metadata properties.
    ///
    /// # Arguments
    ///
    /// * `metadata_map` - The custom metadata from the ONNX model session.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata is malformed.
    pub fn from_onnx_metadata(metadata_map: &HashMap<String, String>) -> Result<Self> {
        // Ultralytics exports store metadata either under one combined key or
        // as individual keys. Accept both by joining everything into one
        // parseable string.
        let combined = metadata_map
            .get("metadata")
            .or_else(|| metadata_map.values().find(|v| v.contains("task:")))
            .cloned()
            .unwrap_or_else(|| {
                metadata_map
                    .iter()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            });

        Self::from_yaml_str(&combined)
    }

    /// Parse metadata from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if a present field has an unparseable value.
    pub fn from_yaml_str(yaml_str: &str) -> Result<Self> {
        // Parse manually to avoid a YAML dependency for flat key: value data.
        let mut metadata = Self::default();

        for line in yaml_str.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once(':') {
                let key = key.trim();
                let value = value.trim().trim_matches('\'').trim_matches('"');

                match key {
                    "description" => metadata.description = value.to_string(),
                    "version" => metadata.version = value.to_string(),
                    "task" => metadata.task = value.to_string(),
                    "stride" => {
                        metadata.stride = value.parse().map_err(|_| {
                            PoseVizError::Metadata(format!("Invalid stride value: {value}"))
                        })?;
                    }
                    _ => {}
                }
            }
        }

        if let Some(imgsz) = Self::parse_usize_list(yaml_str, "imgsz") {
            metadata.imgsz = imgsz;
        }
        if let Some(kpt_shape) = Self::parse_usize_list(yaml_str, "kpt_shape") {
            metadata.kpt_shape = kpt_shape;
        }

        metadata.names = Self::parse_names_block(yaml_str);

        Ok(metadata)
    }

    /// Whether the model declares the pose task.
    #[must_use]
    pub fn is_pose(&self) -> bool {
        matches!(
            self.task.to_lowercase().as_str(),
            "pose" | "keypoint" | "keypoints"
        )
    }

    /// Keypoints per detection.
    #[must_use]
    pub const fn num_keypoints(&self) -> usize {
        self.kpt_shape.0
    }

    /// Values per keypoint (2 for xy, 3 for xy + visibility).
    #[must_use]
    pub const fn kpt_dim(&self) -> usize {
        self.kpt_shape.1
    }

    /// Get the number of classes in this model.
    #[must_use]
    pub fn num_classes(&self) -> usize {
        self.names.len()
    }

    /// Parse a two-element list field like `imgsz: [640, 640]` or the
    /// multi-line YAML list form. Returns `None` when the key is absent or
    /// fewer than two values are found.
    fn parse_usize_list(yaml_str: &str, field: &str) -> Option<(usize, usize)> {
        let key = format!("{field}:");
        let lines: Vec<&str> = yaml_str.lines().collect();
        let idx = lines.iter().position(|l| l.trim().starts_with(&key))?;

        // Inline form: "imgsz: [640, 640]"
        let line = lines[idx];
        if let (Some(start), Some(end)) = (line.find('['), line.find(']')) {
            let values: Vec<usize> = line[start + 1..end]
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if values.len() >= 2 {
                return Some((values[0], values[1]));
            }
            return None;
        }

        // Block form:
        //   imgsz:
        //   - 640
        //   - 640
        let mut values = Vec::new();
        for following in lines.iter().skip(idx + 1) {
            let trimmed = following.trim();
            if let Some(rest) = trimmed.strip_prefix('-') {
                if let Ok(val) = rest.trim().parse::<usize>() {
                    values.push(val);
                }
            } else if !trimmed.is_empty() && !trimmed.starts_with('#') {
                break;
            }
            if values.len() >= 2 {
                break;
            }
        }

        if values.len() >= 2 {
            Some((values[0], values[1]))
        } else {
            None
        }
    }

    /// Parse the names block from YAML or Python dict format.
    fn parse_names_block(yaml_str: &str) -> HashMap<usize, String> {
        let mut names = HashMap::new();

        // Python dict format `names: {0: 'person', 1: 'bicycle'}` is how the
        // exporter stores names in ONNX metadata.
        if let Some(start) = yaml_str.find("names:") {
            let trimmed = yaml_str[start + 6..].trim();
            if trimmed.starts_with('{') {
                if let Some(end) = trimmed.find('}') {
                    return Self::parse_python_dict(&trimmed[1..end]);
                }
            }
        }

        // Fall back to YAML block format.
        let mut in_names_block = false;
        for line in yaml_str.lines() {
            let trimmed = line.trim();

            if trimmed.starts_with("names:") {
                in_names_block = true;
                continue;
            }

            if in_names_block {
                if !trimmed.is_empty()
                    && !trimmed.starts_with('#')
                    && !trimmed.chars().next().is_some_and(|c| c.is_ascii_digit())
                {
                    break;
                }
                if let Some((key, value)) = trimmed.split_once(':') {
                    if let Ok(class_id) = key.trim().parse::<usize>() {
                        let class_name = value.trim().trim_matches('\'').trim_matches('"');
                        names.insert(class_id, class_name.to_string());
                    }
                }
            }
        }

        names
    }

    /// Parse a Python dict string like `0: 'person', 1: 'bicycle'`.
    fn parse_python_dict(dict_str: &str) -> HashMap<usize, String> {
        let mut names = HashMap::new();

        for entry in dict_str.split(',') {
            if let Some((key, value)) = entry.trim().split_once(':') {
                let value = value.trim().trim_matches('\'').trim_matches('"');
                if let Ok(class_id) = key.trim().parse::<usize>() {
                    names.insert(class_id, value.to_string());
                }
            }
        }

        names
    }
}

impl Default for ModelMetadata {
    fn default() -> Self {
        Self {
            description: String::new(),
            version: String::new(),
            task: String::new(),
            stride: 32,
            imgsz: (640, 640),
            // COCO pose layout: 17 keypoints, (x, y, visibility) each.
            kpt_shape: (17, 3),
            names: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_METADATA: &str = r"
description: Ultralytics YOLO11n-pose model
version: 8.3.0
stride: 32
task: pose
imgsz:
- 640
- 640
kpt_shape:
- 17
- 3
names:
  0: person
";

    #[test]
    fn test_parse_metadata() {
        let metadata = ModelMetadata::from_yaml_str(SAMPLE_METADATA).unwrap();

        assert_eq!(metadata.task, "pose");
        assert!(metadata.is_pose());
        assert_eq!(metadata.stride, 32);
        assert_eq!(metadata.imgsz, (640, 640));
        assert_eq!(metadata.kpt_shape, (17, 3));
        assert_eq!(metadata.num_classes(), 1);
        assert_eq!(metadata.names.get(&0).map(String::as_str), Some("person"));
    }

    #[test]
    fn test_parse_inline_lists() {
        let yaml = "task: pose\nimgsz: [320, 320]\nkpt_shape: [24, 2]\nstride: 32";
        let metadata = ModelMetadata::from_yaml_str(yaml).unwrap();
        assert_eq!(metadata.imgsz, (320, 320));
        assert_eq!(metadata.num_keypoints(), 24);
        assert_eq!(metadata.kpt_dim(), 2);
    }

    #[test]
    fn test_parse_python_dict_names() {
        let yaml = "task: pose\nnames: {0: 'wolf', 1: 'dog'}";
        let metadata = ModelMetadata::from_yaml_str(yaml).unwrap();
        assert_eq!(metadata.num_classes(), 2);
        assert_eq!(metadata.names.get(&1).map(String::as_str), Some("dog"));
    }

    #[test]
    fn test_non_pose_task() {
        let yaml = "task: detect\nstride: 32";
        let metadata = ModelMetadata::from_yaml_str(yaml).unwrap();
        assert!(!metadata.is_pose());
    }

    #[test]
    fn test_default_metadata() {
        let metadata = ModelMetadata::default();
        assert_eq!(metadata.stride, 32);
        assert_eq!(metadata.imgsz, (640, 640));
        assert_eq!(metadata.kpt_shape, (17, 3));
        assert!(!metadata.is_pose());
    }
}
