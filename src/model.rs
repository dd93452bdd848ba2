// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Pose model loading and inference.
//!
//! [`PoseModel`] wraps an ONNX Runtime session. The visualization pipeline
//! only depends on the [`PoseProvider`] trait, so the model is swappable
//! (tests use a stub provider).

use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use image::DynamicImage;
use ort::session::Session;
use ort::value::TensorRef;

use crate::error::{PoseVizError, Result};
use crate::inference::InferenceConfig;
use crate::metadata::ModelMetadata;
use crate::postprocessing::postprocess_pose;
use crate::preprocessing::preprocess_image;
use crate::results::{PoseResults, Speed};

/// Contract the visualization pipeline consumes: given a loaded image,
/// produce detection results that expose keypoints in original image pixel
/// space. Failure modes internal to the provider (incompatible input shape,
/// runtime faults) surface as errors and are terminal.
pub trait PoseProvider {
    /// Run pose inference on an in-memory image.
    ///
    /// # Arguments
    ///
    /// * `image` - The image to run inference on.
    /// * `path` - Identifier for the image, carried into the results.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    fn predict_image(&mut self, image: &DynamicImage, path: String) -> Result<PoseResults>;
}

/// Pose estimation model backed by ONNX Runtime.
///
/// # Example
///
/// ```no_run
/// use poseviz::{PoseModel, PoseProvider};
///
/// let mut model = PoseModel::load("yolo11n-pose.onnx")?;
/// let image = image::open("wolf.jpg")?;
/// let results = model.predict_image(&image, "wolf.jpg".to_string())?;
/// println!("{} poses", results.len());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct PoseModel {
    /// ONNX Runtime session.
    session: Session,
    /// Model metadata (keypoint shape, classes, input size).
    metadata: ModelMetadata,
    /// Input tensor name.
    input_name: String,
    /// Output tensor names.
    output_names: Vec<String>,
    /// Inference configuration.
    config: InferenceConfig,
}

impl PoseModel {
    /// Load a pose model from an ONNX file with default configuration.
    ///
    /// The metadata (keypoint shape, class names, input size) is extracted
    /// from the model's custom metadata properties.
    ///
    /// # Errors
    ///
    /// Returns an error if the file doesn't exist, can't be loaded, or does
    /// not declare the pose task.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with_config(path, InferenceConfig::default())
    }

    /// Load a pose model with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file doesn't exist, can't be loaded, or does
    /// not declare the pose task.
    pub fn load_with_config<P: AsRef<Path>>(path: P, config: InferenceConfig) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(PoseVizError::ModelLoad(format!(
                "Model file not found: {}",
                path.display()
            )));
        }

        let session = Session::builder()
            .map_err(|e| {
                PoseVizError::ModelLoad(format!("Failed to create session builder: {e}"))
            })?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
            .map_err(|e| {
                PoseVizError::ModelLoad(format!("Failed to set optimization level: {e}"))
            })?
            .with_intra_threads(config.num_threads)
            .map_err(|e| {
                PoseVizError::ModelLoad(format!("Failed to set intra-thread count: {e}"))
            })?
            .commit_from_file(path)
            .map_err(|e| PoseVizError::ModelLoad(format!("Failed to load model: {e}")))?;

        let metadata = Self::extract_metadata(&session)?;
        if !metadata.task.is_empty() && !metadata.is_pose() {
            return Err(PoseVizError::ModelLoad(format!(
                "Model task '{}' is not a pose model",
                metadata.task
            )));
        }

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "images".to_string());

        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();

        // Prefer the model's own input size unless overridden.
        let config = InferenceConfig {
            imgsz: config.imgsz.or(Some(metadata.imgsz)),
            ..config
        };

        Ok(Self {
            session,
            metadata,
            input_name,
            output_names,
            config,
        })
    }

    /// Extract metadata from the ONNX model session.
    fn extract_metadata(session: &Session) -> Result<ModelMetadata> {
        let model_metadata = session
            .metadata()
            .map_err(|e| PoseVizError::ModelLoad(format!("Failed to get model metadata: {e}")))?;

        // Exported models store metadata under individual keys.
        let keys = [
            "description",
            "version",
            "stride",
            "task",
            "imgsz",
            "kpt_shape",
            "names",
        ];

        let mut metadata_map: HashMap<String, String> = HashMap::new();
        for key in &keys {
            if let Ok(Some(value)) = model_metadata.custom(key) {
                metadata_map.insert((*key).to_string(), value);
            }
        }

        // Some exports use a single combined key instead.
        if metadata_map.is_empty() {
            for key in &["", "metadata", "model_metadata"] {
                if let Ok(Some(value)) = model_metadata.custom(key) {
                    metadata_map.insert((*key).to_string(), value);
                }
            }
        }

        if metadata_map.is_empty() {
            return Ok(ModelMetadata::default());
        }

        ModelMetadata::from_onnx_metadata(&metadata_map)
    }

    /// Run the ONNX session on an NCHW tensor.
    fn run_inference(&mut self, input: &ndarray::Array4<f32>) -> Result<(Vec<f32>, Vec<usize>)> {
        let input_contiguous = input.as_standard_layout();

        let input_tensor = TensorRef::from_array_view(&input_contiguous).map_err(|e| {
            PoseVizError::Inference(format!("Failed to create input tensor: {e}"))
        })?;

        let inputs = ort::inputs![&self.input_name => input_tensor];

        let outputs = self
            .session
            .run(inputs)
            .map_err(|e| PoseVizError::Inference(format!("Inference failed: {e}")))?;

        let output_name = &self.output_names[0];
        let output = outputs.get(output_name.as_str()).ok_or_else(|| {
            PoseVizError::Inference(format!("Output '{output_name}' not found"))
        })?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| PoseVizError::Inference(format!("Failed to extract output: {e}")))?;

        #[allow(clippy::cast_sign_loss)]
        let shape_vec: Vec<usize> = shape.iter().map(|&d| d as usize).collect();

        Ok((data.to_vec(), shape_vec))
    }

    /// Get the model metadata.
    #[must_use]
    pub const fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// Get the model's input size (height, width).
    #[must_use]
    pub fn imgsz(&self) -> (usize, usize) {
        self.config.imgsz.unwrap_or(self.metadata.imgsz)
    }
}

impl PoseProvider for PoseModel {
    fn predict_image(&mut self, image: &DynamicImage, path: String) -> Result<PoseResults> {
        let target_size = self.imgsz();

        let start_preprocess = Instant::now();
        let preprocess = preprocess_image(image, target_size, self.metadata.stride)?;
        let preprocess_time = start_preprocess.elapsed().as_secs_f64() * 1000.0;

        let start_inference = Instant::now();
        let (output_data, output_shape) = self.run_inference(&preprocess.tensor)?;
        let inference_time = start_inference.elapsed().as_secs_f64() * 1000.0;

        let start_postprocess = Instant::now();
        let mut results = postprocess_pose(
            &output_data,
            &output_shape,
            &preprocess,
            &self.config,
            self.metadata.kpt_shape,
            &self.metadata.names,
            path,
            Speed::new(preprocess_time, inference_time, 0.0),
        );
        results.speed.postprocess = Some(start_postprocess.elapsed().as_secs_f64() * 1000.0);

        Ok(results)
    }
}

impl std::fmt::Debug for PoseModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoseModel")
            .field("kpt_shape", &self.metadata.kpt_shape)
            .field("num_classes", &self.metadata.num_classes())
            .field("imgsz", &self.metadata.imgsz)
            .field("stride", &self.metadata.stride)
            .finish()
    }
}
