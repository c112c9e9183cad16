//! Panel geometry and slideshow timing.

/// Panel width in landscape orientation
pub const PANEL_WIDTH: u32 = 320;
/// Panel height in landscape orientation
pub const PANEL_HEIGHT: u32 = 240;

/// Extensions (lowercase) selected for display
pub const IMAGE_EXTENSIONS: [&str; 2] = [".jpg", ".jpeg"];

/// Longest directory entry name kept in a listing
pub const MAX_NAME_LEN: usize = 64;

/// Backlight level when fully on
pub const BRIGHTNESS_MAX: u8 = 255;

/// Poll interval of the halt loop after a fatal startup failure
pub const HALT_POLL_MS: u32 = 1000;

/// Slideshow timing.
///
/// Defaults: 3 s per image, 20-step fades at 30 ms per step, 5 s before
/// retrying a failed or empty pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideshowConfig {
    /// Dwell time: how long a fully visible image stays up
    pub dwell_ms: u32,
    /// Number of fade steps (higher = smoother but slower)
    pub fade_steps: u16,
    /// Delay between fade steps
    pub fade_step_ms: u32,
    /// Wait before retrying after a storage error or an empty pass
    pub retry_ms: u32,
    /// How long the boot summary stays on screen
    pub boot_hold_ms: u32,
    /// How long each color-test fill is held
    pub color_test_ms: u32,
}

impl SlideshowConfig {
    pub const DEFAULT: Self = Self {
        dwell_ms: 3000,
        fade_steps: 20,
        fade_step_ms: 30,
        retry_ms: 5000,
        boot_hold_ms: 3000,
        color_test_ms: 500,
    };

    pub const fn with_dwell_ms(mut self, dwell_ms: u32) -> Self {
        self.dwell_ms = dwell_ms;
        self
    }

    pub const fn with_fade(mut self, steps: u16, step_ms: u32) -> Self {
        self.fade_steps = steps;
        self.fade_step_ms = step_ms;
        self
    }

    pub const fn with_retry_ms(mut self, retry_ms: u32) -> Self {
        self.retry_ms = retry_ms;
        self
    }
}

impl Default for SlideshowConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
