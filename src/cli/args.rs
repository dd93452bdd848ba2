// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use clap::Parser;

/// CLI arguments parser.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(after_help = r"Examples:
    poseviz --model yolo11n-pose.onnx --image wolf.jpg
    poseviz -m yolo11n-pose.onnx -i wolf.jpg --conf 0.5
    poseviz -m yolo11n-pose.onnx -i wolf.jpg --imgsz 1280 --title preview")]
pub struct Cli {
    /// Path to the pose ONNX model file
    #[arg(short, long)]
    pub model: String,

    /// Path to the input image
    #[arg(short, long)]
    pub image: String,

    /// Confidence threshold for detection candidates
    #[arg(long, default_value_t = 0.25)]
    pub conf: f32,

    /// `IoU` threshold for NMS
    #[arg(long, default_value_t = 0.45)]
    pub iou: f32,

    /// Inference image size (square)
    #[arg(long)]
    pub imgsz: Option<usize>,

    /// Preview window title
    #[arg(long, default_value = "poseviz")]
    pub title: String,

    /// Show verbose output
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_args_defaults() {
        let args = Cli::parse_from(["poseviz", "--model", "pose.onnx", "--image", "wolf.jpg"]);
        assert_eq!(args.model, "pose.onnx");
        assert_eq!(args.image, "wolf.jpg");
        assert!((args.conf - 0.25).abs() < f32::EPSILON);
        assert!((args.iou - 0.45).abs() < f32::EPSILON);
        assert_eq!(args.imgsz, None);
        assert_eq!(args.title, "poseviz");
        assert!(args.verbose);
    }

    #[test]
    fn test_args_custom() {
        let args = Cli::parse_from([
            "poseviz",
            "-m",
            "custom.onnx",
            "-i",
            "test.jpg",
            "--conf",
            "0.8",
            "--title",
            "preview",
            "--verbose",
            "false",
        ]);
        assert_eq!(args.model, "custom.onnx");
        assert_eq!(args.image, "test.jpg");
        assert!((args.conf - 0.8).abs() < f32::EPSILON);
        assert_eq!(args.title, "preview");
        assert!(!args.verbose);
    }
}
