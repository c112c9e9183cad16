//! ESP32-2432S028 wiring.
//!
//! Pin numbers are documentation here; `main` moves the matching
//! `peripherals.GPIOn` fields, so keep both in step.

use mipidsi::options::{ColorOrder, Orientation, Rotation};

// ============================================================================
// TFT (ILI9341 on SPI2 / HSPI)
// ============================================================================

pub const TFT_MISO: u8 = 12;
pub const TFT_MOSI: u8 = 13;
pub const TFT_SCLK: u8 = 14;
pub const TFT_CS: u8 = 15;
pub const TFT_DC: u8 = 2;
/// Reset is tied to EN; the panel has no reset GPIO
pub const TFT_RST: Option<u8> = None;
pub const TFT_SPI_MHZ: u32 = 40;

/// Native panel size, portrait
pub const TFT_NATIVE_WIDTH: u16 = 240;
pub const TFT_NATIVE_HEIGHT: u16 = 320;
/// Landscape, USB connector on the right
pub const TFT_ORIENTATION: Orientation = Orientation::new().rotate(Rotation::Deg90);
pub const TFT_COLOR_ORDER: ColorOrder = ColorOrder::Bgr;

// ============================================================================
// Backlight (LEDC low-speed timer 0, channel 0)
// ============================================================================

pub const TFT_BL: u8 = 21;
pub const BACKLIGHT_PWM_KHZ: u32 = 5;

// ============================================================================
// SD card (SPI3 / VSPI)
// ============================================================================

pub const SD_CS: u8 = 5;
pub const SD_MOSI: u8 = 23;
pub const SD_MISO: u8 = 19;
pub const SD_SCK: u8 = 18;
/// Card identification must run at 400 kHz or less
pub const SD_INIT_KHZ: u32 = 400;
pub const SD_SPI_MHZ: u32 = 20;
