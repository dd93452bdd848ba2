// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

#![allow(clippy::multiple_crate_versions)]

//! # poseviz
//!
//! Run a pretrained ONNX pose-estimation model on a single image and preview
//! the detected keypoints with their indices overlaid as text.
//!
//! The pipeline is deliberately linear: load the image, run the model,
//! stamp every keypoint with its zero-based index, show the result in a
//! window until a key is pressed.
//!
//! ## Quick Start (Library)
//!
//! ```no_run
//! use poseviz::{PoseModel, pipeline};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut model = PoseModel::load("yolo11n-pose.onnx")?;
//!     let (canvas, results) = pipeline::render(
//!         &mut model,
//!         std::path::Path::new("wolf.jpg"),
//!         None,
//!     )?;
//!     println!("{} poses, {} keypoints", results.len(), results.total_keypoints());
//!     println!("annotated {}x{} buffer", canvas.width(), canvas.height());
//!     Ok(())
//! }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! poseviz --model yolo11n-pose.onnx --image wolf.jpg
//! ```
//!
//! The window blocks until any key is pressed.
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`model`] | [`PoseModel`] (ONNX Runtime) and the [`PoseProvider`] trait |
//! | [`results`] | Output types ([`PoseResults`], [`Keypoints`], [`Boxes`]) |
//! | [`annotate`] | Keypoint index labelling ([`annotate::label_plan`], drawing) |
//! | [`pipeline`] | Load, infer, annotate composition |
//! | [`viewer`] | Blocking preview window (feature `visualize`) |
//! | [`inference`] | [`InferenceConfig`] for provider-internal thresholds |
//! | [`preprocessing`] | Letterbox resize to model input |
//! | [`postprocessing`] | Output decoding, NMS, coordinate rescaling |
//! | [`metadata`] | ONNX model metadata parsing |
//! | [`error`] | Error types ([`PoseVizError`], [`Result`]) |
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `visualize` | Preview window display (default) |

// Modules
pub mod annotate;
pub mod cli;
pub mod error;
pub mod inference;
pub mod metadata;
pub mod model;
pub mod pipeline;
pub mod postprocessing;
pub mod preprocessing;
pub mod results;
pub mod utils;
#[cfg(feature = "visualize")]
pub mod viewer;

// Re-export main types for convenience
pub use annotate::{KeypointLabel, draw_keypoint_labels, label_plan};
pub use error::{PoseVizError, Result};
pub use inference::InferenceConfig;
pub use metadata::ModelMetadata;
pub use model::{PoseModel, PoseProvider};
pub use results::{Boxes, Keypoints, PoseResults, Speed};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
