//! Status screens shown during boot and when the slideshow cannot run.
//!
//! Text is 10x20 mono, top-left anchored at the same cursor positions the
//! frame has always used, on an opaque background so redraws overwrite.

use core::fmt::Write;

use embedded_graphics::mono_font::ascii::FONT_10X20;
use embedded_graphics::mono_font::{MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use heapless::String;

fn style(text: Rgb565, background: Rgb565) -> MonoTextStyle<'static, Rgb565> {
    MonoTextStyleBuilder::new()
        .font(&FONT_10X20)
        .text_color(text)
        .background_color(background)
        .build()
}

fn line<D>(target: &mut D, x: i32, y: i32, text: &str, style: MonoTextStyle<'static, Rgb565>) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    Text::with_baseline(text, Point::new(x, y), style, Baseline::Top)
        .draw(target)
        .map(|_| ())
}

/// One solid fill of the power-on colour test.
pub const COLOR_TEST: [Rgb565; 3] = [Rgb565::RED, Rgb565::GREEN, Rgb565::BLUE];

/// "Display OK!" / "Check Serial" on black.
pub fn boot_banner<D>(target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let white = style(Rgb565::WHITE, Rgb565::BLACK);
    line(target, 10, 60, "Display OK!", white)?;
    line(target, 10, 90, "Check Serial", white)
}

/// "Init SD..." under the banner.
pub fn storage_probe<D>(target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    line(target, 10, 120, "Init SD...", style(Rgb565::WHITE, Rgb565::BLACK))
}

/// Fatal: the card could not be mounted at boot.
pub fn storage_failed<D>(target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    target.clear(Rgb565::RED)?;
    line(target, 10, 100, "SD FAILED!", style(Rgb565::WHITE, Rgb565::RED))
}

/// Card mounted: clears the screen and shows its size.
pub fn storage_ok<D>(target: &mut D, size_mb: u64) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    target.clear(Rgb565::BLACK)?;
    let green = style(Rgb565::GREEN, Rgb565::BLACK);
    line(target, 10, 60, "SD Card OK!", green)?;

    let mut text: String<32> = String::new();
    // 20 digits of u64 plus the label always fit
    let _ = write!(text, "Size: {} MB", size_mb);
    line(target, 10, 90, &text, green)
}

/// Number of images found during the boot inventory.
pub fn image_count<D>(target: &mut D, images: usize) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let mut text: String<32> = String::new();
    let _ = write!(text, "JPEGs: {}", images);
    line(target, 10, 120, &text, style(Rgb565::GREEN, Rgb565::BLACK))
}

/// Runtime: the root directory could not be opened.
pub fn storage_error<D>(target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    target.clear(Rgb565::RED)?;
    line(target, 10, 100, "Error reading SD", style(Rgb565::WHITE, Rgb565::RED))
}

/// A full pass found nothing to show.
pub fn no_images<D>(target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    target.clear(Rgb565::YELLOW)?;
    let black = style(Rgb565::BLACK, Rgb565::YELLOW);
    line(target, 20, 100, "No JPEGs found!", black)?;
    line(target, 20, 130, "Add .jpg files", black)?;
    line(target, 20, 160, "to SD card root", black)
}
