// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Error types for the pose visualization pipeline.

use std::fmt;

/// Result type alias for pose visualization operations.
pub type Result<T> = std::result::Result<T, PoseVizError>;

/// Main error type for the crate.
///
/// Every failure is terminal: the CLI prints the message and exits non-zero.
#[derive(Debug)]
pub enum PoseVizError {
    /// Error loading the ONNX model (missing file, corrupt weights, wrong task).
    ModelLoad(String),
    /// Error during model inference.
    Inference(String),
    /// Image path unreadable or not a decodable image.
    ImageDecode(String),
    /// Error parsing model metadata.
    Metadata(String),
    /// Error decoding model output.
    PostProcessing(String),
    /// Invalid configuration provided.
    Config(String),
    /// Viewer/window error.
    Viewer(String),
    /// Feature not enabled at compile time.
    FeatureNotEnabled(String),
    /// Wrapped `std::io::Error`.
    Io(std::io::Error),
}

impl fmt::Display for PoseVizError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelLoad(msg) => write!(f, "Model load error: {msg}"),
            Self::Inference(msg) => write!(f, "Inference error: {msg}"),
            Self::ImageDecode(msg) => write!(f, "Image decode error: {msg}"),
            Self::Metadata(msg) => write!(f, "Metadata error: {msg}"),
            Self::PostProcessing(msg) => write!(f, "Post-processing error: {msg}"),
            Self::Config(msg) => write!(f, "Config error: {msg}"),
            Self::Viewer(msg) => write!(f, "Viewer error: {msg}"),
            Self::FeatureNotEnabled(msg) => write!(f, "Feature not enabled: {msg}"),
            Self::Io(err) => write!(f, "IO error: {err}"),
        }
    }
}

impl std::error::Error for PoseVizError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PoseVizError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<image::ImageError> for PoseVizError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageDecode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PoseVizError::ModelLoad("test".to_string());
        assert_eq!(err.to_string(), "Model load error: test");

        let err = PoseVizError::ImageDecode("test".to_string());
        assert_eq!(err.to_string(), "Image decode error: test");
    }

    #[test]
    fn test_image_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: PoseVizError = image::ImageError::IoError(io).into();
        assert!(matches!(err, PoseVizError::ImageDecode(_)));
    }
}
