//! Letterbox resizing for the 320×240 panel.
//!
//! Photos are shrunk to fit inside the target while keeping their aspect
//! ratio, then centered on a black canvas. Small photos are never enlarged.

use anyhow::Context;
use cyd_slideshow::config::{PANEL_HEIGHT, PANEL_WIDTH};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the output folder created inside the input folder
pub const DEFAULT_OUTPUT_NAME: &str = "converted_photos";
pub const DEFAULT_QUALITY: u8 = 95;

/// Per-file failure. The batch keeps going after any of these.
#[derive(Debug, Error)]
pub enum ResizeError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error("refusing to overwrite source file {0}")]
    WouldOverwrite(PathBuf),
}

/// Target canvas and encoder settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeOptions {
    pub width: u32,
    pub height: u32,
    pub quality: u8,
}

impl Default for ResizeOptions {
    fn default() -> Self {
        Self {
            width: PANEL_WIDTH,
            height: PANEL_HEIGHT,
            quality: DEFAULT_QUALITY,
        }
    }
}

/// Largest size with the source's aspect ratio that fits in `max_w`×`max_h`,
/// or the source size if it already fits.
pub fn fit_size(width: u32, height: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if width <= max_w && height <= max_h {
        return (width, height);
    }

    let (w, h) = (u64::from(width), u64::from(height));
    let (mw, mh) = (u64::from(max_w), u64::from(max_h));

    // Rounded integer scaling; whichever axis is the tighter fit wins
    if w * mh >= h * mw {
        let scaled = (h * mw * 2 + w) / (w * 2);
        (max_w, scaled.clamp(1, mh) as u32)
    } else {
        let scaled = (w * mh * 2 + h) / (h * 2);
        (scaled.clamp(1, mw) as u32, max_h)
    }
}

/// Shrink `img` into the target and center it on black.
pub fn letterbox(img: &DynamicImage, opts: &ResizeOptions) -> RgbImage {
    let rgb = img.to_rgb8();
    let (w, h) = fit_size(rgb.width(), rgb.height(), opts.width, opts.height);

    let fitted = if (w, h) == rgb.dimensions() {
        rgb
    } else {
        imageops::resize(&rgb, w, h, FilterType::Lanczos3)
    };

    let mut canvas = RgbImage::from_pixel(opts.width, opts.height, Rgb([0, 0, 0]));
    let x = (opts.width - w) / 2;
    let y = (opts.height - h) / 2;
    imageops::overlay(&mut canvas, &fitted, i64::from(x), i64::from(y));
    canvas
}

/// Letterbox one file from `input` into `output` as a JPEG.
pub fn resize_file(input: &Path, output: &Path, opts: &ResizeOptions) -> Result<(), ResizeError> {
    if same_file(input, output) {
        return Err(ResizeError::WouldOverwrite(input.to_path_buf()));
    }

    let img = image::open(input)?;
    let canvas = letterbox(&img, opts);

    let file = File::create(output).map_err(|source| ResizeError::Io {
        path: output.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    JpegEncoder::new_with_quality(&mut writer, opts.quality).encode_image(&canvas)?;
    Ok(())
}

/// Create `<input>/<name>` and make sure it is not the input folder itself.
pub fn prepare_output_dir(input: &Path, name: &str) -> anyhow::Result<PathBuf> {
    let output = input.join(name);
    fs::create_dir_all(&output)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    if same_file(input, &output) {
        anyhow::bail!(
            "Output directory {} is the input directory; pick another --output-name",
            output.display()
        );
    }
    Ok(output)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
