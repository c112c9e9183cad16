//! Slideshow driver.
//!
//! One [`Slideshow`] owns the panel, the card, the backlight fader, the delay
//! provider and the decoder workspace. A pass walks the card root once and,
//! for every image, fades out, decodes onto a black screen, fades back in and
//! dwells. Passes repeat forever.
//!
//! The loop is an explicit state machine so callers (and tests) can advance
//! it one transition at a time:
//!
//! ```text
//!  Idle ──open root──▶ Scanning ──image──▶ FadeOut ──▶ Decode ──▶ FadeIn ──▶ Dwell
//!   ▲                    │  ▲                                                 │
//!   └──── end of pass ───┘  └─────────────────────────────────────────────────┘
//! ```

use core::fmt;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_hal::delay::DelayNs;
use log::{debug, error, info, warn};
use thiserror::Error;

use crate::config::{SlideshowConfig, BRIGHTNESS_MAX, HALT_POLL_MS};
use crate::display::blit_tile;
use crate::fade::{Backlight, Fader};
use crate::jpeg::{DecodeError, ImageInfo, JpegDecoder};
use crate::screens;
use crate::storage::{DirEntry, Storage};

/// Where the slideshow is within a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Between passes; the root is closed
    Idle,
    /// Looking for the next image in the open root
    Scanning,
    FadeOut,
    Decode,
    FadeIn,
    /// Image fully visible
    Dwell,
}

/// How a pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Directory exhausted after showing `shown` images
    Completed { shown: usize },
    /// Nothing to show; the warning screen was up for the retry delay
    NoImages,
    /// The root could not be opened; the error screen was up for the retry delay
    StorageError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StartupError {
    #[error("SD card initialization failed")]
    StorageUnavailable,
}

/// Summary of the boot-time card inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StartupReport {
    pub card_size_mb: u64,
    /// Regular files in the root
    pub files: usize,
    /// Of those, files with an image extension
    pub images: usize,
}

pub struct Slideshow<D, S, B, T> {
    display: D,
    storage: S,
    fader: Fader<B>,
    delay: T,
    decoder: JpegDecoder,
    config: SlideshowConfig,
    phase: Phase,
    current: Option<DirEntry>,
    shown: usize,
}

impl<D, S, B, T> Slideshow<D, S, B, T>
where
    D: DrawTarget<Color = Rgb565>,
    D::Error: fmt::Debug,
    S: Storage,
    B: Backlight,
    T: DelayNs,
{
    pub fn new(display: D, storage: S, backlight: B, delay: T, config: SlideshowConfig) -> Self {
        Self {
            display,
            storage,
            fader: Fader::new(backlight, config.fade_steps, config.fade_step_ms),
            delay,
            decoder: JpegDecoder::new(),
            config,
            phase: Phase::Idle,
            current: None,
            shown: 0,
        }
    }

    /// Power-on sequence: colour test, card mount and inventory, then a fade
    /// through black into the slideshow.
    ///
    /// A card that cannot be mounted leaves the red failure screen up and is
    /// reported as [`StartupError::StorageUnavailable`]; the caller is
    /// expected to [`halt`](Self::halt).
    pub fn startup(&mut self) -> Result<StartupReport, StartupError> {
        info!("=== CYD Photo Frame ===");
        self.fader.set_level(BRIGHTNESS_MAX);

        info!("display: color test");
        for color in screens::COLOR_TEST {
            self.fill(color);
            self.delay.delay_ms(self.config.color_test_ms);
        }
        self.fill(Rgb565::BLACK);
        self.draw(screens::boot_banner);

        info!("storage: initializing SD card");
        self.draw(screens::storage_probe);
        let card = match self.storage.mount() {
            Ok(card) => card,
            Err(e) => {
                error!("storage: SD card initialization failed: {:?}", e);
                self.draw(screens::storage_failed);
                return Err(StartupError::StorageUnavailable);
            }
        };

        let card_size_mb = card.size_mb();
        info!("storage: SD card size {} MB", card_size_mb);
        self.draw(|d| screens::storage_ok(d, card_size_mb));

        let mut report = StartupReport {
            card_size_mb,
            ..StartupReport::default()
        };
        if let Some((files, images)) = self.inventory() {
            report.files = files;
            report.images = images;
            self.draw(|d| screens::image_count(d, images));
        }

        self.delay.delay_ms(self.config.boot_hold_ms);
        info!("starting slideshow");
        self.fader.fade_out(&mut self.delay);
        self.fill(Rgb565::BLACK);
        self.fader.fade_in(&mut self.delay);
        Ok(report)
    }

    /// List the root once, logging every regular file.
    fn inventory(&mut self) -> Option<(usize, usize)> {
        if let Err(e) = self.storage.open_root() {
            error!("storage: failed to open root directory: {:?}", e);
            return None;
        }

        let (mut files, mut images) = (0, 0);
        loop {
            match self.storage.next_entry() {
                Ok(Some(entry)) if entry.is_dir => {}
                Ok(Some(entry)) => {
                    files += 1;
                    info!("  {}. {} ({} bytes)", files, entry.name, entry.size);
                    if entry.is_slide() {
                        images += 1;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("storage: directory listing stopped: {:?}", e);
                    break;
                }
            }
        }
        self.storage.close_root();

        info!("storage: {} files, {} images", files, images);
        Some((files, images))
    }

    /// Advance by one transition. Returns the outcome when a pass ends.
    pub fn step(&mut self) -> Option<PassOutcome> {
        match self.phase {
            Phase::Idle => {
                info!("--- starting slideshow pass ---");
                if let Err(e) = self.storage.open_root() {
                    error!("storage: failed to open root directory: {:?}", e);
                    self.draw(screens::storage_error);
                    self.delay.delay_ms(self.config.retry_ms);
                    return Some(PassOutcome::StorageError);
                }
                self.shown = 0;
                self.phase = Phase::Scanning;
                None
            }
            Phase::Scanning => match self.storage.next_entry() {
                Ok(Some(entry)) if entry.is_slide() => {
                    self.current = Some(entry);
                    self.phase = Phase::FadeOut;
                    None
                }
                Ok(Some(entry)) => {
                    debug!("skipping {}", entry.name);
                    None
                }
                Ok(None) => Some(self.finish_pass()),
                Err(e) => {
                    warn!("storage: reading next entry failed: {:?}", e);
                    Some(self.finish_pass())
                }
            },
            Phase::FadeOut => {
                self.shown += 1;
                if let Some(entry) = &self.current {
                    info!("image #{}: {}", self.shown, entry.name);
                }
                self.fader.fade_out(&mut self.delay);
                self.phase = Phase::Decode;
                None
            }
            Phase::Decode => {
                self.fill(Rgb565::BLACK);
                if let Some(entry) = self.current.take() {
                    match self.show_image(&entry.name) {
                        Ok(info) => debug!("  displayed {}x{}", info.width, info.height),
                        Err(e) => warn!("  failed to display image, error code {}: {}", e.code(), e),
                    }
                }
                self.phase = Phase::FadeIn;
                None
            }
            Phase::FadeIn => {
                self.fader.fade_in(&mut self.delay);
                self.phase = Phase::Dwell;
                None
            }
            Phase::Dwell => {
                debug!("displaying for {} ms", self.config.dwell_ms);
                self.delay.delay_ms(self.config.dwell_ms);
                self.phase = Phase::Scanning;
                None
            }
        }
    }

    fn finish_pass(&mut self) -> PassOutcome {
        self.storage.close_root();
        self.phase = Phase::Idle;
        if self.shown == 0 {
            warn!("no JPEG files found on SD card");
            self.draw(screens::no_images);
            self.delay.delay_ms(self.config.retry_ms);
            PassOutcome::NoImages
        } else {
            info!("--- end of files, {} shown ---", self.shown);
            PassOutcome::Completed { shown: self.shown }
        }
    }

    /// Drive [`step`](Self::step) until the current pass ends.
    pub fn run_pass(&mut self) -> PassOutcome {
        loop {
            if let Some(outcome) = self.step() {
                return outcome;
            }
        }
    }

    /// Cycle through the card forever.
    pub fn run(&mut self) -> ! {
        loop {
            self.run_pass();
        }
    }

    /// Park after a fatal startup failure, leaving the screen as it is.
    pub fn halt(&mut self) -> ! {
        loop {
            self.delay.delay_ms(HALT_POLL_MS);
        }
    }

    /// Decode `name` from the card root straight onto the display at (0, 0).
    pub fn show_image(&mut self, name: &str) -> Result<ImageInfo, DecodeError> {
        let Self {
            display,
            storage,
            decoder,
            ..
        } = self;
        let file = storage.open_file(name).map_err(|e| {
            warn!("storage: cannot open {}: {:?}", name, e);
            DecodeError::Input
        })?;
        decoder.draw(file, Point::zero(), |tile| blit_tile(display, tile))
    }

    fn fill(&mut self, color: Rgb565) {
        if let Err(e) = self.display.clear(color) {
            warn!("display: clear failed: {:?}", e);
        }
    }

    fn draw<F>(&mut self, screen: F)
    where
        F: FnOnce(&mut D) -> Result<(), D::Error>,
    {
        if let Err(e) = screen(&mut self.display) {
            warn!("display: draw failed: {:?}", e);
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &SlideshowConfig {
        &self.config
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn fader(&self) -> &Fader<B> {
        &self.fader
    }

    pub fn delay_mut(&mut self) -> &mut T {
        &mut self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::Framebuffer;
    use crate::testing::{solid_jpeg, MockStorage, RecordingBacklight, RecordingDelay};

    type TestShow = Slideshow<Framebuffer, MockStorage, RecordingBacklight, RecordingDelay>;

    fn slideshow(storage: MockStorage) -> TestShow {
        Slideshow::new(
            Framebuffer::new(),
            storage,
            RecordingBacklight::default(),
            RecordingDelay::default(),
            SlideshowConfig::default(),
        )
    }

    fn pixel(show: &TestShow, x: u16, y: u16) -> Rgb565 {
        show.display().get_pixel(x, y).unwrap()
    }

    fn near(a: Rgb565, b: Rgb565) -> bool {
        a.r().abs_diff(b.r()) <= 1 && a.g().abs_diff(b.g()) <= 2 && a.b().abs_diff(b.b()) <= 1
    }

    #[test]
    fn test_pass_shows_only_images() {
        let storage = MockStorage::new()
            .file("readme.txt", b"hello".to_vec())
            .file("a.jpg", solid_jpeg(320, 240, [255, 0, 0]))
            .dir("ALBUM.JPG")
            .file("b.JPEG", solid_jpeg(320, 240, [0, 0, 255]))
            .file("c.png", vec![0; 16]);
        let mut show = slideshow(storage);

        assert_eq!(show.run_pass(), PassOutcome::Completed { shown: 2 });
        assert_eq!(show.storage().opened, vec!["a.jpg", "b.JPEG"]);
        assert!(near(pixel(&show, 160, 120), Rgb565::BLUE));
        assert_eq!(show.fader().level(), 255);
        assert_eq!(show.phase(), Phase::Idle);
        assert!(!show.storage().is_root_open());

        let delay = &show.delay_mut().ms_calls;
        assert_eq!(delay.iter().filter(|&&ms| ms == 3000).count(), 2);
        assert!(!delay.contains(&5000));
    }

    #[test]
    fn test_short_timing_config() {
        let config = SlideshowConfig::DEFAULT
            .with_dwell_ms(10)
            .with_fade(2, 1)
            .with_retry_ms(20);
        let storage = MockStorage::new().file("a.jpg", solid_jpeg(8, 8, [0, 0, 0]));
        let mut show = Slideshow::new(
            Framebuffer::new(),
            storage,
            RecordingBacklight::default(),
            RecordingDelay::default(),
            config,
        );
        assert_eq!(show.config().dwell_ms, 10);
        assert_eq!(show.config().fade_steps, 2);

        assert_eq!(show.run_pass(), PassOutcome::Completed { shown: 1 });
        let delay = &show.delay_mut().ms_calls;
        assert_eq!(delay.iter().filter(|&&ms| ms == 10).count(), 1);
        assert!(delay.iter().all(|&ms| ms == 10 || ms == 1));

        *show.storage_mut() = MockStorage::new();
        assert_eq!(show.run_pass(), PassOutcome::NoImages);
        assert_eq!(show.delay_mut().ms_calls.last(), Some(&20));
    }

    #[test]
    fn test_step_walks_the_phases() {
        let storage = MockStorage::new()
            .file("notes.txt", Vec::new())
            .file("one.jpg", solid_jpeg(16, 16, [0, 255, 0]));
        let mut show = slideshow(storage);

        let mut phases = vec![show.phase()];
        let outcome = loop {
            if let Some(outcome) = show.step() {
                break outcome;
            }
            phases.push(show.phase());
        };
        assert_eq!(outcome, PassOutcome::Completed { shown: 1 });
        assert_eq!(
            phases,
            vec![
                Phase::Idle,
                Phase::Scanning,
                Phase::Scanning,
                Phase::FadeOut,
                Phase::Decode,
                Phase::FadeIn,
                Phase::Dwell,
                Phase::Scanning,
            ]
        );
    }

    #[test]
    fn test_fades_bracket_each_image() {
        let storage = MockStorage::new().file("x.jpg", solid_jpeg(8, 8, [255, 255, 255]));
        let mut show = slideshow(storage);
        show.run_pass();

        let levels = &show.fader().backlight().levels;
        // 22 stepped levels plus the clamp write, each way
        assert_eq!(levels.len(), 46);
        assert_eq!(levels[0], 255);
        assert_eq!(levels[22], 0);
        assert_eq!(levels[23], 0);
        assert_eq!(levels[45], 255);
    }

    #[test]
    fn test_empty_card_warns_once_per_pass() {
        let storage = MockStorage::new().dir("DCIM").file("notes.txt", Vec::new());
        let mut show = slideshow(storage);

        assert_eq!(show.run_pass(), PassOutcome::NoImages);
        assert_eq!(pixel(&show, 0, 0), Rgb565::YELLOW);
        assert_eq!(show.delay_mut().count(5000), 1);

        assert_eq!(show.run_pass(), PassOutcome::NoImages);
        assert_eq!(show.delay_mut().count(5000), 2);
        assert_eq!(show.storage().root_opens, 2);
        assert_eq!(show.storage().root_closes, 2);
        assert!(show.storage().opened.is_empty());
    }

    #[test]
    fn test_unreadable_root_is_retried() {
        let mut storage = MockStorage::new().file("a.jpg", solid_jpeg(8, 8, [0, 0, 0]));
        storage.open_root_fails = true;
        let mut show = slideshow(storage);

        assert_eq!(show.run_pass(), PassOutcome::StorageError);
        assert_eq!(pixel(&show, 0, 0), Rgb565::RED);
        assert_eq!(show.delay_mut().ms_calls, vec![5000]);
        assert_eq!(show.phase(), Phase::Idle);

        show.storage_mut().open_root_fails = false;
        assert_eq!(show.run_pass(), PassOutcome::Completed { shown: 1 });
    }

    #[test]
    fn test_listing_error_ends_the_pass() {
        let mut storage = MockStorage::new()
            .file("a.jpg", solid_jpeg(8, 8, [0, 0, 0]))
            .file("b.jpg", solid_jpeg(8, 8, [0, 0, 0]));
        storage.fail_entry_at = Some(1);
        let mut show = slideshow(storage);

        assert_eq!(show.run_pass(), PassOutcome::Completed { shown: 1 });
        assert_eq!(show.storage().root_closes, 1);
        assert!(!show.storage().is_root_open());
    }

    #[test]
    fn test_broken_image_still_fades_in_and_dwells() {
        let storage = MockStorage::new()
            .file("broken.jpg", b"not a jpeg at all".to_vec())
            .file("good.jpg", solid_jpeg(8, 8, [0, 255, 0]));
        let mut show = slideshow(storage);

        assert_eq!(show.run_pass(), PassOutcome::Completed { shown: 2 });
        assert_eq!(show.delay_mut().count(3000), 2);
        assert_eq!(show.fader().level(), 255);
    }

    #[test]
    fn test_show_image_reports_decode_codes() {
        let storage = MockStorage::new()
            .file("broken.jpg", b"not a jpeg".to_vec())
            .file("big.jpg", solid_jpeg(400, 300, [255, 255, 255]));
        let mut show = slideshow(storage);

        assert_eq!(show.show_image("broken.jpg").unwrap_err().code(), 6);
        assert_eq!(show.show_image("missing.jpg").unwrap_err(), DecodeError::Input);

        // Oversized images fill the panel, then the first tile below it stops the decode
        let err = show.show_image("big.jpg").unwrap_err();
        assert_eq!(err, DecodeError::Interrupted);
        assert!(near(pixel(&show, 319, 239), Rgb565::WHITE));
    }

    #[test]
    fn test_small_image_is_drawn_top_left_on_black() {
        let storage = MockStorage::new().file("small.jpg", solid_jpeg(100, 50, [255, 0, 0]));
        let mut show = slideshow(storage);
        show.display_mut().fill(Rgb565::BLUE);
        show.run_pass();

        assert!(near(pixel(&show, 0, 0), Rgb565::RED));
        assert!(near(pixel(&show, 99, 49), Rgb565::RED));
        assert_eq!(pixel(&show, 100, 0), Rgb565::BLACK);
        assert_eq!(pixel(&show, 0, 50), Rgb565::BLACK);
    }

    #[test]
    fn test_startup_reports_inventory() {
        let storage = MockStorage::new()
            .file("a.jpg", Vec::new())
            .file("b.txt", vec![1, 2, 3])
            .dir("SUB")
            .file("C.JPEG", Vec::new());
        let mut show = slideshow(storage);

        let report = show.startup().unwrap();
        assert_eq!(
            report,
            StartupReport {
                card_size_mb: 8192,
                files: 3,
                images: 2,
            }
        );
        let delays = &show.delay_mut().ms_calls;
        assert_eq!(&delays[..3], &[500, 500, 500]);
        assert!(delays.contains(&3000));
        assert_eq!(show.fader().level(), 255);
        assert_eq!(pixel(&show, 0, 0), Rgb565::BLACK);
        assert_eq!(show.storage().root_closes, 1);
    }

    #[test]
    fn test_startup_without_card_fails() {
        let mut storage = MockStorage::new();
        storage.mount_fails = true;
        let mut show = slideshow(storage);

        assert_eq!(show.startup(), Err(StartupError::StorageUnavailable));
        assert_eq!(pixel(&show, 0, 0), Rgb565::RED);
        assert_eq!(show.storage().root_opens, 0);
        // Still lit so the failure screen is readable
        assert_eq!(show.fader().level(), 255);
    }

    #[test]
    fn test_startup_survives_unreadable_root() {
        let mut storage = MockStorage::new();
        storage.open_root_fails = true;
        let mut show = slideshow(storage);

        let report = show.startup().unwrap();
        assert_eq!((report.files, report.images), (0, 0));
        assert_eq!(report.card_size_mb, 8192);
    }
}
