//! # CYD Photo Frame Slideshow
//!
//! Board-independent core of the ESP32-2432S028 ("Cheap Yellow Display")
//! photo frame. Photos are read from the SD card root, decoded tile by tile
//! straight onto the panel and cycled with backlight fades.
//!
//! # Architecture
//!
//! ```text
//!                 Slideshow (owns everything below)
//!                     │
//!      ┌──────────────┼───────────────┬──────────────┐
//!      ▼              ▼               ▼              ▼
//! ┌─────────┐   ┌───────────┐   ┌───────────┐   ┌─────────┐
//! │ Storage │   │JpegDecoder│──▶│ blit_tile │   │  Fader  │
//! │ (trait) │   │ MCU tiles │   │ DrawTarget│   │Backlight│
//! └─────────┘   └───────────┘   └───────────┘   └─────────┘
//!  SD / FAT       no alloc        ILI9341          LEDC PWM
//! ```
//!
//! Everything here is `no_std` and allocation-free; the board crate supplies
//! the SPI panel, SD card, PWM channel and delay.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod display;
pub mod fade;
pub mod jpeg;
pub mod screens;
pub mod slideshow;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use config::SlideshowConfig;
pub use display::{blit_tile, Framebuffer};
pub use fade::{Backlight, Fader, PwmBacklight};
pub use jpeg::{ByteSource, DecodeError, ImageInfo, JpegDecoder, Tile};
pub use slideshow::{PassOutcome, Phase, Slideshow, StartupError, StartupReport};
pub use storage::{is_slide_name, CardInfo, DirEntry, Storage};
