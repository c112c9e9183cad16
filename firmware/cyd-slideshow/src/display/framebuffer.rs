//! RGB565 framebuffer for the 320×240 panel.
//!
//! Host-side stand-in for the SPI panel: the slideshow draws into it exactly
//! as it would draw onto the ILI9341, which makes it the surface for tests
//! and for the desktop tool's previews.

use core::convert::Infallible;

use embedded_graphics::pixelcolor::raw::{RawData, RawU16};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;

use crate::config::{PANEL_HEIGHT, PANEL_WIDTH};

const WIDTH: u16 = PANEL_WIDTH as u16;
const HEIGHT: u16 = PANEL_HEIGHT as u16;
const PIXELS: usize = (WIDTH as usize) * (HEIGHT as usize);

/// Framebuffer for 320×240 RGB565 display
pub struct Framebuffer {
    buffer: [u16; PIXELS],
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framebuffer {
    /// Create a new framebuffer initialized to black
    pub const fn new() -> Self {
        Self { buffer: [0; PIXELS] }
    }

    /// Get pixel at coordinates
    pub fn get_pixel(&self, x: u16, y: u16) -> Option<Rgb565> {
        if x < WIDTH && y < HEIGHT {
            let idx = (y as usize) * (WIDTH as usize) + (x as usize);
            Some(RawU16::new(self.buffer[idx]).into())
        } else {
            None
        }
    }

    /// Set pixel at coordinates (bounds-checked)
    pub fn set_pixel(&mut self, x: u16, y: u16, color: Rgb565) -> bool {
        if x < WIDTH && y < HEIGHT {
            let idx = (y as usize) * (WIDTH as usize) + (x as usize);
            self.buffer[idx] = RawU16::from(color).into_inner();
            true
        } else {
            false
        }
    }

    /// Fill the whole buffer with one colour
    pub fn fill(&mut self, color: Rgb565) {
        self.buffer.fill(RawU16::from(color).into_inner());
    }

    /// Raw RGB565 words, row-major
    pub fn as_slice(&self) -> &[u16] {
        &self.buffer
    }

    /// Pixels in row-major order
    pub fn pixels(&self) -> impl Iterator<Item = Rgb565> + '_ {
        self.buffer.iter().map(|&raw| RawU16::new(raw).into())
    }
}

impl OriginDimensions for Framebuffer {
    fn size(&self) -> Size {
        Size::new(PANEL_WIDTH, PANEL_HEIGHT)
    }
}

impl DrawTarget for Framebuffer {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let (Ok(x), Ok(y)) = (u16::try_from(point.x), u16::try_from(point.y)) {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill(color);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

    #[test]
    fn test_bounds_checked_access() {
        let mut fb = Framebuffer::new();
        assert!(fb.set_pixel(319, 239, Rgb565::RED));
        assert!(!fb.set_pixel(320, 0, Rgb565::RED));
        assert!(!fb.set_pixel(0, 240, Rgb565::RED));
        assert_eq!(fb.get_pixel(319, 239), Some(Rgb565::RED));
        assert_eq!(fb.get_pixel(0, 0), Some(Rgb565::BLACK));
        assert_eq!(fb.get_pixel(320, 239), None);
    }

    #[test]
    fn test_raw_layout_is_rgb565() {
        let mut fb = Framebuffer::new();
        fb.set_pixel(1, 0, Rgb565::RED);
        fb.set_pixel(2, 0, Rgb565::GREEN);
        fb.set_pixel(0, 1, Rgb565::BLUE);
        assert_eq!(fb.as_slice()[1], 0xF800);
        assert_eq!(fb.as_slice()[2], 0x07E0);
        assert_eq!(fb.as_slice()[320], 0x001F);
    }

    #[test]
    fn test_draw_target_clips_off_panel_pixels() {
        let mut fb = Framebuffer::new();
        Rectangle::new(Point::new(-5, 230), Size::new(20, 20))
            .into_styled(PrimitiveStyle::with_fill(Rgb565::WHITE))
            .draw(&mut fb)
            .unwrap();
        assert_eq!(fb.get_pixel(0, 239), Some(Rgb565::WHITE));
        assert_eq!(fb.get_pixel(14, 230), Some(Rgb565::WHITE));
        assert_eq!(fb.get_pixel(15, 230), Some(Rgb565::BLACK));
        let lit = fb.pixels().filter(|&p| p == Rgb565::WHITE).count();
        assert_eq!(lit, 15 * 10);
    }

    #[test]
    fn test_clear() {
        let mut fb = Framebuffer::new();
        fb.clear(Rgb565::YELLOW).unwrap();
        assert!(fb.pixels().all(|p| p == Rgb565::YELLOW));
    }
}
