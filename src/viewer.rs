// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Blocking image viewer.
//!
//! Presents the annotated buffer in a window and blocks the calling thread
//! until any key press (or the window is closed).

use image::RgbImage;
use minifb::{KeyRepeat, Window, WindowOptions};

use crate::error::{PoseVizError, Result};

/// A simple image viewer using minifb.
pub struct Viewer {
    window: Window,
    width: usize,
    height: usize,
    buffer: Vec<u32>,
}

impl Viewer {
    /// Create a new viewer window.
    ///
    /// # Errors
    ///
    /// Returns an error if the window cannot be created.
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        let mut window = Window::new(
            title,
            width,
            height,
            WindowOptions {
                resize: true,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| PoseVizError::Viewer(format!("Failed to create window: {e}")))?;

        // Limit update rate
        window.limit_update_rate(Some(std::time::Duration::from_micros(16600)));

        Ok(Self {
            window,
            width,
            height,
            buffer: Vec::new(),
        })
    }

    /// Load an image into the window's pixel buffer and present it once.
    ///
    /// # Errors
    ///
    /// Returns an error if the window update fails.
    pub fn show(&mut self, image: &RgbImage) -> Result<()> {
        let (img_width, img_height) = (image.width() as usize, image.height() as usize);

        let num_pixels = img_width * img_height;
        if self.buffer.len() != num_pixels {
            self.buffer.resize(num_pixels, 0);
        }

        // minifb expects one u32 per pixel, packed as 0x00RRGGBB.
        for (i, pixel) in image.pixels().enumerate() {
            let r = u32::from(pixel[0]);
            let g = u32::from(pixel[1]);
            let b = u32::from(pixel[2]);
            self.buffer[i] = (r << 16) | (g << 8) | b;
        }

        self.width = img_width;
        self.height = img_height;

        self.window
            .update_with_buffer(&self.buffer, self.width, self.height)
            .map_err(|e| PoseVizError::Viewer(format!("Failed to update window: {e}")))
    }

    /// Block until any key is pressed or the window is closed.
    ///
    /// Keeps pumping the event loop so the window stays responsive; minifb's
    /// update rate limit prevents the loop from spinning at 100% CPU.
    ///
    /// # Errors
    ///
    /// Returns an error if the window update fails.
    pub fn wait_for_key(&mut self) -> Result<()> {
        loop {
            if !self.window.is_open() {
                return Ok(());
            }
            if !self.window.get_keys_pressed(KeyRepeat::No).is_empty() {
                return Ok(());
            }
            self.window
                .update_with_buffer(&self.buffer, self.width, self.height)
                .map_err(|e| PoseVizError::Viewer(format!("Failed to update window: {e}")))?;
        }
    }
}
