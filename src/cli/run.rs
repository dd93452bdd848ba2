// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::process;

use ab_glyph::FontRef;

use crate::annotate::resolve_font_bytes;
use crate::cli::args::Cli;
use crate::cli::logging::set_verbose;
use crate::inference::InferenceConfig;
use crate::model::PoseModel;
use crate::pipeline::render_image;
use crate::utils::load_image;
use crate::{error, verbose, warn};

/// Run the pose visualization pipeline and block on the preview window.
///
/// Any failure is terminal: the error is printed and the process exits
/// non-zero.
pub fn run(args: &Cli) {
    set_verbose(args.verbose);

    let mut config = InferenceConfig::new()
        .with_confidence(args.conf)
        .with_iou(args.iou);
    if let Some(sz) = args.imgsz {
        config = config.with_imgsz(sz, sz);
    }

    // Decode the image before the model is touched, so a bad image path
    // fails without loading weights.
    let image = match load_image(&args.image) {
        Ok(img) => img,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    let mut model = match PoseModel::load_with_config(&args.model, config) {
        Ok(m) => m,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    let imgsz = model.imgsz();
    let (num_kpts, kpt_dim) = model.metadata().kpt_shape;
    verbose!(
        "poseviz {}: {}x{} keypoints, {} classes, imgsz=({}, {})",
        env!("CARGO_PKG_VERSION"),
        num_kpts,
        kpt_dim,
        model.metadata().num_classes(),
        imgsz.0,
        imgsz.1
    );

    let font_bytes = resolve_font_bytes();
    if font_bytes.is_none() {
        warn!("No label font available; keypoint indices will not be rendered");
    }
    let font = font_bytes
        .as_deref()
        .and_then(|data| FontRef::try_from_slice(data).ok());

    let (canvas, results) = match render_image(&mut model, &image, args.image.clone(), font.as_ref())
    {
        Ok(out) => out,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    verbose!(
        "image 1/1 {}: {}x{} {}{:.1}ms",
        args.image,
        results.orig_shape.0,
        results.orig_shape.1,
        results.verbose(),
        results.speed.inference.unwrap_or(0.0)
    );
    verbose!(
        "Speed: {:.1}ms preprocess, {:.1}ms inference, {:.1}ms postprocess",
        results.speed.preprocess.unwrap_or(0.0),
        results.speed.inference.unwrap_or(0.0),
        results.speed.postprocess.unwrap_or(0.0)
    );

    if let Err(e) = show(&canvas, &args.title) {
        error!("{e}");
        process::exit(1);
    }
}

/// Display the annotated canvas and block until a key press.
#[cfg(feature = "visualize")]
fn show(canvas: &image::RgbImage, title: &str) -> crate::error::Result<()> {
    use crate::viewer::Viewer;

    let mut viewer = Viewer::new(title, canvas.width() as usize, canvas.height() as usize)?;
    viewer.show(canvas)?;
    viewer.wait_for_key()
}

#[cfg(not(feature = "visualize"))]
fn show(_canvas: &image::RgbImage, _title: &str) -> crate::error::Result<()> {
    Err(crate::error::PoseVizError::FeatureNotEnabled(
        "window display requires the 'visualize' feature".to_string(),
    ))
}
