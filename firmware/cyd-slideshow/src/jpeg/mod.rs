//! Baseline JPEG decoder with tiled output.
//!
//! Decodes one MCU at a time from a [`ByteSource`] and hands each finished
//! tile (at most 16x16 pixels of RGB565) to a sink, so a full image never
//! sits in memory. The working set is a few kilobytes and lives inside
//! [`JpegDecoder`]; keep one around and reuse it.
//!
//! Supported: 8-bit baseline and extended-Huffman sequential frames, 1 or 3
//! components, luma sampling 1x1, 2x1, 1x2 or 2x2 with unsubsampled-block
//! chroma (4:4:4, 4:2:2, 4:4:0, 4:2:0), restart intervals.
//!
//! Failures carry the same numeric codes the firmware logs:
//!
//! | code | variant                | meaning                          |
//! |------|------------------------|----------------------------------|
//! | 1    | `Interrupted`          | the sink asked to stop           |
//! | 2    | `Input`                | read failure or premature end    |
//! | 6    | `Format`               | malformed stream / not a JPEG    |
//! | 7    | `UnsupportedLayout`    | component / sampling layout      |
//! | 8    | `UnsupportedStandard`  | progressive, lossless, 12-bit... |

mod huffman;
mod idct;
mod input;
mod markers;

use embedded_graphics::pixelcolor::{Rgb565, Rgb888};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::debug;
use thiserror::Error;

use idct::Idct;
use input::{extend, BitReader, Input};
use markers::{Frame, Headers};

pub use input::{ByteSource, INPUT_BUFFER_SIZE};

/// Largest MCU edge in pixels (2x2 luma sampling)
pub const MAX_MCU_SIZE: usize = 16;

/// Natural-order index of the k-th coefficient in zigzag order
const ZIGZAG: [usize; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10, //
    17, 24, 32, 25, 18, 11, 4, 5, //
    12, 19, 26, 33, 40, 48, 41, 34, //
    27, 20, 13, 6, 7, 14, 21, 28, //
    35, 42, 49, 56, 57, 50, 43, 36, //
    29, 22, 15, 23, 30, 37, 44, 51, //
    58, 59, 52, 45, 38, 31, 39, 46, //
    53, 60, 61, 54, 47, 55, 62, 63,
];

/// Slots in the block buffer: up to four luma blocks, then Cb and Cr.
const CB_SLOT: usize = 4;
const CR_SLOT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("decode interrupted by output sink")]
    Interrupted,

    #[error("input stream failed or ended early")]
    Input,

    #[error("malformed JPEG: {0}")]
    Format(&'static str),

    #[error("unsupported JPEG layout: {0}")]
    UnsupportedLayout(&'static str),

    #[error("unsupported JPEG process: {0}")]
    UnsupportedStandard(&'static str),
}

impl DecodeError {
    /// Numeric result code as logged by the firmware
    pub const fn code(&self) -> u8 {
        match self {
            DecodeError::Interrupted => 1,
            DecodeError::Input => 2,
            DecodeError::Format(_) => 6,
            DecodeError::UnsupportedLayout(_) => 7,
            DecodeError::UnsupportedStandard(_) => 8,
        }
    }
}

/// Frame parameters of a decodable image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u16,
    pub height: u16,
    pub components: u8,
    pub mcu_width: u8,
    pub mcu_height: u8,
}

impl ImageInfo {
    fn from_frame(frame: &Frame) -> Self {
        let (mcu_width, mcu_height) = frame.mcu_size();
        Self {
            width: frame.width,
            height: frame.height,
            components: frame.count as u8,
            mcu_width: mcu_width as u8,
            mcu_height: mcu_height as u8,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(u32::from(self.width), u32::from(self.height))
    }

    /// True when the image fits inside `bounds` without clipping.
    pub fn fits(&self, bounds: Size) -> bool {
        u32::from(self.width) <= bounds.width && u32::from(self.height) <= bounds.height
    }
}

/// One decoded block of pixels in screen coordinates.
///
/// `pixels` is row-major and exactly `area.size.width * area.size.height`
/// long. Tiles on the right and bottom image edges are cropped.
#[derive(Debug, Clone, Copy)]
pub struct Tile<'a> {
    pub area: Rectangle,
    pub pixels: &'a [Rgb565],
}

/// Reusable decoder state.
pub struct JpegDecoder {
    headers: Headers,
    idct: Idct,
    /// Dequantized coefficients of the current block
    coef: [i32; 64],
    samples: [[u8; 64]; 6],
    pixels: [Rgb565; MAX_MCU_SIZE * MAX_MCU_SIZE],
}

impl Default for JpegDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl JpegDecoder {
    pub fn new() -> Self {
        Self {
            headers: Headers::default(),
            idct: Idct::new(),
            coef: [0; 64],
            samples: [[0; 64]; 6],
            pixels: [Rgb565::BLACK; MAX_MCU_SIZE * MAX_MCU_SIZE],
        }
    }

    /// Parse the headers only.
    pub fn info<S: ByteSource>(&mut self, src: S) -> Result<ImageInfo, DecodeError> {
        let mut input = Input::new(src);
        let frame = self.headers.read(&mut input)?;
        Ok(ImageInfo::from_frame(&frame))
    }

    /// Decode `src`, handing tiles to `sink` with the image's top-left corner
    /// placed at `origin`.
    ///
    /// Tiles arrive left to right, top to bottom. Returning `false` from the
    /// sink aborts with [`DecodeError::Interrupted`].
    pub fn draw<S, F>(&mut self, src: S, origin: Point, mut sink: F) -> Result<ImageInfo, DecodeError>
    where
        S: ByteSource,
        F: FnMut(&Tile<'_>) -> bool,
    {
        let mut input = Input::new(src);
        let frame = self.headers.read(&mut input)?;
        let info = ImageInfo::from_frame(&frame);
        debug!(
            "jpeg: {}x{}, {} component(s), {}x{} MCU, restart interval {}",
            info.width,
            info.height,
            info.components,
            info.mcu_width,
            info.mcu_height,
            self.headers.restart_interval
        );

        let (mcu_w, mcu_h) = frame.mcu_size();
        let width = u32::from(frame.width);
        let height = u32::from(frame.height);
        let mcus_x = width.div_ceil(mcu_w);
        let mcus_y = height.div_ceil(mcu_h);

        let mut bits = BitReader::default();
        let mut predictors = [0i32; 3];
        let restart_interval = self.headers.restart_interval;
        let mut until_restart = restart_interval;

        for my in 0..mcus_y {
            for mx in 0..mcus_x {
                if restart_interval != 0 {
                    if until_restart == 0 {
                        bits.restart(&mut input)?;
                        predictors = [0; 3];
                        until_restart = restart_interval;
                    }
                    until_restart -= 1;
                }

                self.decode_mcu(&frame, &mut bits, &mut input, &mut predictors)?;

                let x0 = mx * mcu_w;
                let y0 = my * mcu_h;
                let w = mcu_w.min(width - x0);
                let h = mcu_h.min(height - y0);
                self.assemble(&frame, w as usize, h as usize);

                let tile = Tile {
                    area: Rectangle::new(
                        origin + Point::new(x0 as i32, y0 as i32),
                        Size::new(w, h),
                    ),
                    pixels: &self.pixels[..(w * h) as usize],
                };
                if !sink(&tile) {
                    return Err(DecodeError::Interrupted);
                }
            }
        }
        Ok(info)
    }

    fn decode_mcu<S: ByteSource>(
        &mut self,
        frame: &Frame,
        bits: &mut BitReader,
        input: &mut Input<S>,
        predictors: &mut [i32; 3],
    ) -> Result<(), DecodeError> {
        let luma = &frame.components[0];
        for block in 0..usize::from(luma.h * luma.v) {
            self.decode_block(frame, 0, block, bits, input, predictors)?;
        }
        if frame.count == 3 {
            self.decode_block(frame, 1, CB_SLOT, bits, input, predictors)?;
            self.decode_block(frame, 2, CR_SLOT, bits, input, predictors)?;
        }
        Ok(())
    }

    /// Decode one 8x8 block of component `ci` into sample slot `slot`.
    fn decode_block<S: ByteSource>(
        &mut self,
        frame: &Frame,
        ci: usize,
        slot: usize,
        bits: &mut BitReader,
        input: &mut Input<S>,
        predictors: &mut [i32; 3],
    ) -> Result<(), DecodeError> {
        let comp = &frame.components[ci];
        let quant = &self.headers.quant[usize::from(comp.tq)];
        let dc = &self.headers.dc[usize::from(comp.td)];
        let ac = &self.headers.ac[usize::from(comp.ta)];

        self.coef.fill(0);

        let s = dc.decode(bits, input)?;
        if s > 11 {
            return Err(DecodeError::Format("DC magnitude"));
        }
        predictors[ci] = predictors[ci]
            .checked_add(extend(bits.receive(input, s)?, s))
            .ok_or(DecodeError::Format("DC overflow"))?;
        self.coef[0] = predictors[ci]
            .checked_mul(i32::from(quant[0]))
            .ok_or(DecodeError::Format("DC overflow"))?;

        let mut k = 1;
        while k < 64 {
            let rs = ac.decode(bits, input)?;
            let (run, size) = (usize::from(rs >> 4), rs & 0x0F);
            if size == 0 {
                if run == 15 {
                    k += 16;
                    continue;
                }
                break;
            }
            k += run;
            if k > 63 {
                return Err(DecodeError::Format("AC run past end of block"));
            }
            let value = extend(bits.receive(input, size)?, size);
            self.coef[ZIGZAG[k]] = value * i32::from(quant[k]);
            k += 1;
        }

        self.idct.transform(&self.coef, &mut self.samples[slot]);
        Ok(())
    }

    /// Colour-convert the cropped `w` x `h` top-left part of the current MCU.
    fn assemble(&mut self, frame: &Frame, w: usize, h: usize) {
        let luma = &frame.components[0];
        let (hs, vs) = (usize::from(luma.h), usize::from(luma.v));
        let samples = &self.samples;
        for y in 0..h {
            for x in 0..w {
                let block = (y / 8) * hs + x / 8;
                let yy = i32::from(samples[block][(y % 8) * 8 + x % 8]);
                let pixel = if frame.count == 3 {
                    let c = (y / vs) * 8 + x / hs;
                    ycbcr_to_rgb(yy, i32::from(samples[CB_SLOT][c]), i32::from(samples[CR_SLOT][c]))
                } else {
                    Rgb888::new(yy as u8, yy as u8, yy as u8)
                };
                self.pixels[y * w + x] = pixel.into();
            }
        }
    }
}

/// JFIF YCbCr to RGB in 16.16 fixed point.
fn ycbcr_to_rgb(y: i32, cb: i32, cr: i32) -> Rgb888 {
    let cb = cb - 128;
    let cr = cr - 128;
    let r = y + ((91_881 * cr) >> 16);
    let g = y - ((22_554 * cb + 46_802 * cr) >> 16);
    let b = y + ((116_130 * cb) >> 16);
    Rgb888::new(clamp_u8(r), clamp_u8(g), clamp_u8(b))
}

fn clamp_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}
