//! Run photos through the firmware's JPEG decoder on the host.
//!
//! Decoding goes through the same `JpegDecoder` and `blit_tile` path the
//! frame uses, into an in-memory copy of the panel, so a file that passes
//! here will show on the device.

use anyhow::{Context, Result};
use cyd_slideshow::config::{PANEL_HEIGHT, PANEL_WIDTH};
use cyd_slideshow::{blit_tile, DecodeError, Framebuffer, ImageInfo, JpegDecoder};
use embedded_graphics::pixelcolor::{Rgb565, Rgb888, RgbColor};
use embedded_graphics::prelude::*;
use image::{ImageFormat, Rgb, RgbImage};
use std::path::Path;

/// Decoder plus a panel-sized framebuffer, reused across files.
pub struct PanelPreview {
    decoder: Box<JpegDecoder>,
    panel: Box<Framebuffer>,
}

impl PanelPreview {
    pub fn new() -> Self {
        Self {
            decoder: Box::new(JpegDecoder::new()),
            panel: Box::new(Framebuffer::new()),
        }
    }

    /// Decode `data` onto a black panel at the top-left corner, exactly as the
    /// slideshow does.
    pub fn render(&mut self, data: &[u8]) -> Result<ImageInfo, DecodeError> {
        let panel = &mut *self.panel;
        panel.fill(Rgb565::BLACK);
        self.decoder
            .draw(data, Point::zero(), |tile| blit_tile(panel, tile))
    }

    /// Header-only inspection, for reporting sizes of files that fail to draw.
    pub fn inspect(&mut self, data: &[u8]) -> Result<ImageInfo, DecodeError> {
        self.decoder.info(data)
    }

    /// Current panel contents as an RGB image.
    pub fn snapshot(&self) -> RgbImage {
        let mut img = RgbImage::new(PANEL_WIDTH, PANEL_HEIGHT);
        for (pixel, color) in img.pixels_mut().zip(self.panel.pixels()) {
            let c = Rgb888::from(color);
            *pixel = Rgb([c.r(), c.g(), c.b()]);
        }
        img
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.snapshot()
            .save_with_format(path, ImageFormat::Png)
            .with_context(|| format!("Failed to write preview {}", path.display()))
    }
}

impl Default for PanelPreview {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether the image fits the panel without being cut off.
pub fn fits_panel(info: &ImageInfo) -> bool {
    info.fits(Size::new(PANEL_WIDTH, PANEL_HEIGHT))
}
