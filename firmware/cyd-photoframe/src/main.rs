//! # CYD Photo Frame
//!
//! Firmware for the ESP32-2432S028 ("Cheap Yellow Display"): cycles through
//! the JPEG files in the SD card root with backlight fades between them.
//!
//! ## Hardware
//!
//! - ILI9341 320×240 TFT on SPI2, driven through `mipidsi`
//! - Backlight on GPIO21, PWM from LEDC low-speed timer 0
//! - SD card on SPI3 (FAT, short names)
//!
//! Everything else (listing, decoding, fades, status screens) lives in
//! `cyd-slideshow`.

#![no_std]
#![no_main]

mod board;
mod sd;

use cyd_slideshow::{PwmBacklight, Slideshow, SlideshowConfig};
use embedded_hal_bus::spi::ExclusiveDevice;
use esp_backtrace as _;
use esp_hal::clock::CpuClock;
use esp_hal::delay::Delay;
use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::ledc::channel::{self, ChannelIFace};
use esp_hal::ledc::timer::{self, TimerIFace};
use esp_hal::ledc::{LSGlobalClkSource, Ledc, LowSpeed};
use esp_hal::main;
use esp_hal::spi::master::{Config as SpiConfig, Spi};
use esp_hal::spi::Mode;
use esp_hal::time::Rate;
use log::{error, info, warn};
use mipidsi::interface::SpiInterface;
use mipidsi::models::ILI9341Rgb565;
use mipidsi::Builder;

use crate::sd::SdStorage;

esp_bootloader_esp_idf::esp_app_desc!();

#[main]
fn main() -> ! {
    esp_println::logger::init_logger_from_env();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);
    let mut delay = Delay::new();

    info!("=== ESP32-2432S028 Photo Display ===");

    // ========================================================================
    // Display
    // ========================================================================

    info!(
        "tft: SPI2 sck {} mosi {} miso {} cs {} dc {} rst {:?}",
        board::TFT_SCLK,
        board::TFT_MOSI,
        board::TFT_MISO,
        board::TFT_CS,
        board::TFT_DC,
        board::TFT_RST
    );
    let tft_spi = Spi::new(
        peripherals.SPI2,
        SpiConfig::default()
            .with_frequency(Rate::from_mhz(board::TFT_SPI_MHZ))
            .with_mode(Mode::_0),
    )
    .expect("TFT SPI config")
    .with_sck(peripherals.GPIO14)
    .with_mosi(peripherals.GPIO13)
    .with_miso(peripherals.GPIO12);
    let tft_cs = Output::new(peripherals.GPIO15, Level::High, OutputConfig::default());
    let tft_dc = Output::new(peripherals.GPIO2, Level::Low, OutputConfig::default());
    let tft_device = ExclusiveDevice::new_no_delay(tft_spi, tft_cs).expect("TFT chip select");

    let mut tft_buffer = [0_u8; 512];
    let di = SpiInterface::new(tft_device, tft_dc, &mut tft_buffer);
    let display = Builder::new(ILI9341Rgb565, di)
        .display_size(board::TFT_NATIVE_WIDTH, board::TFT_NATIVE_HEIGHT)
        .orientation(board::TFT_ORIENTATION)
        .color_order(board::TFT_COLOR_ORDER)
        .init(&mut delay)
        .expect("ILI9341 init");
    info!("tft: init complete, landscape");

    // ========================================================================
    // Backlight
    // ========================================================================

    let mut ledc = Ledc::new(peripherals.LEDC);
    ledc.set_global_slow_clock(LSGlobalClkSource::APBClk);

    let mut backlight_timer = ledc.timer::<LowSpeed>(timer::Number::Timer0);
    backlight_timer
        .configure(timer::config::Config {
            duty: timer::config::Duty::Duty8Bit,
            clock_source: timer::LSClockSource::APBClk,
            frequency: Rate::from_khz(board::BACKLIGHT_PWM_KHZ),
        })
        .expect("backlight timer");

    let mut backlight_channel = ledc.channel(channel::Number::Channel0, peripherals.GPIO21);
    backlight_channel
        .configure(channel::config::Config {
            timer: &backlight_timer,
            duty_pct: 0,
            pin_config: channel::config::PinConfig::PushPull,
        })
        .expect("backlight channel");
    info!("backlight: gpio {}, {} kHz", board::TFT_BL, board::BACKLIGHT_PWM_KHZ);

    // ========================================================================
    // SD card
    // ========================================================================

    info!(
        "sd: SPI3 sck {} mosi {} miso {} cs {}",
        board::SD_SCK,
        board::SD_MOSI,
        board::SD_MISO,
        board::SD_CS
    );
    let sd_spi = Spi::new(
        peripherals.SPI3,
        SpiConfig::default()
            .with_frequency(Rate::from_khz(board::SD_INIT_KHZ))
            .with_mode(Mode::_0),
    )
    .expect("SD SPI config")
    .with_sck(peripherals.GPIO18)
    .with_mosi(peripherals.GPIO23)
    .with_miso(peripherals.GPIO19);
    let sd_cs = Output::new(peripherals.GPIO5, Level::High, OutputConfig::default());
    let sd_device = ExclusiveDevice::new_no_delay(sd_spi, sd_cs).expect("SD chip select");
    let storage = SdStorage::new(sd_device, delay);

    // ========================================================================
    // Slideshow
    // ========================================================================

    let mut show = Slideshow::new(
        display,
        storage,
        PwmBacklight::new(backlight_channel),
        delay,
        SlideshowConfig::DEFAULT,
    );

    match show.startup() {
        Ok(report) => {
            // Identification is done; the card can take the fast clock now
            let fast = SpiConfig::default()
                .with_frequency(Rate::from_mhz(board::SD_SPI_MHZ))
                .with_mode(Mode::_0);
            if let Err(e) = show
                .storage_mut()
                .with_spi(|dev| dev.bus_mut().apply_config(&fast))
            {
                warn!("sd: staying at {} kHz: {:?}", board::SD_INIT_KHZ, e);
            }
            info!(
                "setup complete: {} MB card, {} files, {} JPEGs",
                report.card_size_mb, report.files, report.images
            );
        }
        Err(e) => {
            error!("{}", e);
            show.halt()
        }
    }

    show.run()
}
