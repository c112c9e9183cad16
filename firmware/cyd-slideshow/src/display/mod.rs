//! Display surface helpers
//!
//! The slideshow draws onto any `DrawTarget<Color = Rgb565>`: the ILI9341
//! through `mipidsi` on the board, [`Framebuffer`] on the host.

pub mod framebuffer;

pub use framebuffer::Framebuffer;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use log::warn;

use crate::jpeg::Tile;

/// Push one decoded tile onto `target`.
///
/// Returns `false` once the tile starts at or below the bottom of the
/// visible area, which stops the decode; nothing further down can show.
/// Tiles partly off the panel are clipped.
pub fn blit_tile<D>(target: &mut D, tile: &Tile<'_>) -> bool
where
    D: DrawTarget<Color = Rgb565>,
    D::Error: core::fmt::Debug,
{
    let bounds = target.bounding_box();
    let bottom = bounds.top_left.y + bounds.size.height as i32;
    if tile.area.top_left.y >= bottom {
        return false;
    }

    let visible = tile.area.intersection(&bounds);
    if visible.is_zero_sized() {
        return true;
    }

    let result = if visible == tile.area {
        target.fill_contiguous(&tile.area, tile.pixels.iter().copied())
    } else {
        // Partially visible: let the target drop the off-panel pixels
        let width = tile.area.size.width as usize;
        let origin = tile.area.top_left;
        target.draw_iter(tile.pixels.iter().enumerate().filter_map(|(i, &color)| {
            let point = origin + Point::new((i % width) as i32, (i / width) as i32);
            visible.contains(point).then_some(Pixel(point, color))
        }))
    };
    if let Err(e) = result {
        warn!("display: tile at {:?} failed: {:?}", tile.area.top_left, e);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::Rectangle;

    fn tile(x: i32, y: i32, w: u32, h: u32, pixels: &[Rgb565]) -> Tile<'_> {
        Tile {
            area: Rectangle::new(Point::new(x, y), Size::new(w, h)),
            pixels,
        }
    }

    #[test]
    fn test_visible_tile_is_drawn() {
        let mut fb = Framebuffer::new();
        let pixels = [Rgb565::GREEN; 64];
        assert!(blit_tile(&mut fb, &tile(8, 16, 8, 8, &pixels)));
        assert_eq!(fb.get_pixel(8, 16), Some(Rgb565::GREEN));
        assert_eq!(fb.get_pixel(15, 23), Some(Rgb565::GREEN));
        assert_eq!(fb.get_pixel(16, 23), Some(Rgb565::BLACK));
    }

    #[test]
    fn test_tile_below_panel_stops_decode() {
        let mut fb = Framebuffer::new();
        let pixels = [Rgb565::WHITE; 64];
        assert!(!blit_tile(&mut fb, &tile(0, 240, 8, 8, &pixels)));
        assert!(!blit_tile(&mut fb, &tile(0, 400, 8, 8, &pixels)));
    }

    #[test]
    fn test_tile_off_the_right_edge_continues() {
        let mut fb = Framebuffer::new();
        let pixels = [Rgb565::WHITE; 64];
        assert!(blit_tile(&mut fb, &tile(320, 0, 8, 8, &pixels)));
        assert!(fb.pixels().all(|p| p == Rgb565::BLACK));
    }

    #[test]
    fn test_partial_tile_is_clipped() {
        let mut fb = Framebuffer::new();
        // Distinct colour per column so misplaced pixels show up
        let pixels: Vec<Rgb565> = (0..16 * 16)
            .map(|i| Rgb565::new((i % 16) as u8, 0, 0))
            .collect();
        assert!(blit_tile(&mut fb, &tile(312, 232, 16, 16, &pixels)));
        assert_eq!(fb.get_pixel(312, 232), Some(Rgb565::new(0, 0, 0)));
        assert_eq!(fb.get_pixel(319, 239), Some(Rgb565::new(7, 0, 0)));
        assert_eq!(fb.get_pixel(311, 232), Some(Rgb565::BLACK));
    }

    /// A panel whose bus always fails.
    struct DeadPanel;

    #[derive(Debug)]
    struct BusError;

    impl OriginDimensions for DeadPanel {
        fn size(&self) -> Size {
            Size::new(320, 240)
        }
    }

    impl DrawTarget for DeadPanel {
        type Color = Rgb565;
        type Error = BusError;

        fn draw_iter<I>(&mut self, _pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            Err(BusError)
        }
    }

    #[test]
    fn test_draw_errors_do_not_stop_decode() {
        let pixels = [Rgb565::RED; 64];
        assert!(blit_tile(&mut DeadPanel, &tile(0, 0, 8, 8, &pixels)));
        assert!(blit_tile(&mut DeadPanel, &tile(316, 0, 8, 8, &pixels)));
        assert!(!blit_tile(&mut DeadPanel, &tile(0, 240, 8, 8, &pixels)));
    }
}
