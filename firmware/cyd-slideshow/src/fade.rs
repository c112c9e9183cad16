//! Backlight fades.
//!
//! A fade walks the backlight linearly between black and full brightness in
//! `steps` equal steps, sleeping between steps. The step size is integer
//! `255 / steps`, so the walk rarely lands on the end value by itself; the
//! final level is always written explicitly.

use embedded_hal::delay::DelayNs;
use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::config::BRIGHTNESS_MAX;

/// Anything that can set the panel backlight intensity (0 = off, 255 = full).
pub trait Backlight {
    fn set_level(&mut self, level: u8);
}

impl<B: Backlight + ?Sized> Backlight for &mut B {
    fn set_level(&mut self, level: u8) {
        (**self).set_level(level);
    }
}

/// Backlight driven by an `embedded-hal` PWM channel.
pub struct PwmBacklight<P> {
    pwm: P,
}

impl<P: SetDutyCycle> PwmBacklight<P> {
    pub fn new(pwm: P) -> Self {
        Self { pwm }
    }

    pub fn into_inner(self) -> P {
        self.pwm
    }
}

impl<P: SetDutyCycle> Backlight for PwmBacklight<P> {
    fn set_level(&mut self, level: u8) {
        if let Err(e) = self
            .pwm
            .set_duty_cycle_fraction(u16::from(level), u16::from(BRIGHTNESS_MAX))
        {
            warn!("backlight PWM update to {} failed: {:?}", level, e);
        }
    }
}

/// Fade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Full brightness to black
    Out,
    /// Black to full brightness
    In,
}

impl Direction {
    const fn start(self) -> i32 {
        match self {
            Direction::Out => BRIGHTNESS_MAX as i32,
            Direction::In => 0,
        }
    }

    /// Level written once the ramp has run out
    pub const fn target(self) -> u8 {
        match self {
            Direction::Out => 0,
            Direction::In => BRIGHTNESS_MAX,
        }
    }
}

/// Stepped levels of one fade, excluding the final clamp write.
#[derive(Debug, Clone)]
pub struct Ramp {
    direction: Direction,
    step: i32,
    next: i32,
}

impl Iterator for Ramp {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        let current = self.next;
        if !(0..=i32::from(BRIGHTNESS_MAX)).contains(&current) {
            return None;
        }
        self.next = match self.direction {
            Direction::Out => current - self.step,
            Direction::In => current + self.step,
        };
        Some(current as u8)
    }
}

/// Levels visited by a fade of `steps` steps.
///
/// `steps == 0` behaves like a single step; more than 255 steps degrade to a
/// step size of one.
pub fn ramp(direction: Direction, steps: u16) -> Ramp {
    let step = (i32::from(BRIGHTNESS_MAX) / i32::from(steps.max(1))).max(1);
    Ramp {
        direction,
        step,
        next: direction.start(),
    }
}

/// Owns the backlight and remembers the last level written.
pub struct Fader<B> {
    backlight: B,
    steps: u16,
    step_ms: u32,
    level: u8,
}

impl<B: Backlight> Fader<B> {
    pub fn new(backlight: B, steps: u16, step_ms: u32) -> Self {
        Self {
            backlight,
            steps,
            step_ms,
            level: 0,
        }
    }

    /// Write a level immediately.
    pub fn set_level(&mut self, level: u8) {
        self.backlight.set_level(level);
        self.level = level;
    }

    /// Last level written
    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn fade_out<D: DelayNs>(&mut self, delay: &mut D) {
        self.fade(Direction::Out, delay);
    }

    pub fn fade_in<D: DelayNs>(&mut self, delay: &mut D) {
        self.fade(Direction::In, delay);
    }

    fn fade<D: DelayNs>(&mut self, direction: Direction, delay: &mut D) {
        for level in ramp(direction, self.steps) {
            self.set_level(level);
            delay.delay_ms(self.step_ms);
        }
        // Ensure it ends fully off / fully on
        self.set_level(direction.target());
    }

    pub fn backlight(&self) -> &B {
        &self.backlight
    }

    pub fn backlight_mut(&mut self) -> &mut B {
        &mut self.backlight
    }

    pub fn into_inner(self) -> B {
        self.backlight
    }
}
