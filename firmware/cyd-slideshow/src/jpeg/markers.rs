//! Header segments: everything from SOI up to the start of the scan.

use log::trace;

use super::huffman::HuffmanTable;
use super::input::{ByteSource, Input};
use super::DecodeError;

pub(crate) const SOI: u8 = 0xD8;
pub(crate) const EOI: u8 = 0xD9;
const SOF0: u8 = 0xC0;
const SOF1: u8 = 0xC1;
const SOF2: u8 = 0xC2;
const DHT: u8 = 0xC4;
const DQT: u8 = 0xDB;
const DRI: u8 = 0xDD;
const SOS: u8 = 0xDA;
const TEM: u8 = 0x01;

/// Luma sampling factors the MCU assembler knows about.
const SUPPORTED_SAMPLING: [(u8, u8); 4] = [(1, 1), (2, 1), (1, 2), (2, 2)];

/// One colour component of the frame
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Component {
    pub id: u8,
    pub h: u8,
    pub v: u8,
    /// Quantization table selector
    pub tq: u8,
    /// DC / AC Huffman table selectors, set by SOS
    pub td: u8,
    pub ta: u8,
}

/// Parsed SOF segment.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Frame {
    pub width: u16,
    pub height: u16,
    pub count: usize,
    pub components: [Component; 3],
}

impl Frame {
    /// MCU size in pixels, driven by the luma sampling factors
    pub(crate) fn mcu_size(&self) -> (u32, u32) {
        let luma = &self.components[0];
        (8 * u32::from(luma.h), 8 * u32::from(luma.v))
    }
}

/// Tables and frame state collected from the header segments.
pub(crate) struct Headers {
    /// Quantization tables in zigzag order
    pub quant: [[u16; 64]; 4],
    quant_present: [bool; 4],
    pub dc: [HuffmanTable; 2],
    pub ac: [HuffmanTable; 2],
    pub frame: Option<Frame>,
    pub restart_interval: u16,
}

impl Default for Headers {
    fn default() -> Self {
        Self {
            quant: [[0; 64]; 4],
            quant_present: [false; 4],
            dc: [HuffmanTable::default(), HuffmanTable::default()],
            ac: [HuffmanTable::default(), HuffmanTable::default()],
            frame: None,
            restart_interval: 0,
        }
    }
}

/// Next marker code, skipping fill bytes.
fn next_marker<S: ByteSource>(input: &mut Input<S>) -> Result<u8, DecodeError> {
    if input.byte()? != 0xFF {
        return Err(DecodeError::Format("expected marker"));
    }
    let mut code = input.byte()?;
    while code == 0xFF {
        code = input.byte()?;
    }
    Ok(code)
}

/// Segment length without the length field itself
fn segment_len<S: ByteSource>(input: &mut Input<S>) -> Result<usize, DecodeError> {
    let len = usize::from(input.word()?);
    len.checked_sub(2)
        .ok_or(DecodeError::Format("segment length"))
}

impl Headers {
    /// Read from SOI through the SOS header; the stream is left at the
    /// first entropy-coded byte.
    pub(crate) fn read<S: ByteSource>(&mut self, input: &mut Input<S>) -> Result<Frame, DecodeError> {
        *self = Self::default();

        if input.byte()? != 0xFF || input.byte()? != SOI {
            return Err(DecodeError::Format("not a JPEG stream"));
        }

        loop {
            let marker = next_marker(input)?;
            trace!("jpeg: marker {:02X}", marker);
            match marker {
                SOF0 | SOF1 => self.read_sof(input)?,
                SOF2 => return Err(DecodeError::UnsupportedStandard("progressive")),
                0xC3 | 0xC5..=0xC7 | 0xCB | 0xCD..=0xCF => {
                    return Err(DecodeError::UnsupportedStandard("lossless or hierarchical"))
                }
                0xC9 | 0xCA => return Err(DecodeError::UnsupportedStandard("arithmetic coding")),
                DHT => self.read_dht(input)?,
                DQT => self.read_dqt(input)?,
                DRI => self.read_dri(input)?,
                SOS => return self.read_sos(input),
                EOI => return Err(DecodeError::Format("no scan before EOI")),
                TEM | 0xD0..=0xD7 => {}
                _ => {
                    let len = segment_len(input)?;
                    input.skip(len)?;
                }
            }
        }
    }

    fn read_sof<S: ByteSource>(&mut self, input: &mut Input<S>) -> Result<(), DecodeError> {
        let len = segment_len(input)?;
        if input.byte()? != 8 {
            return Err(DecodeError::UnsupportedStandard("sample precision"));
        }
        let height = input.word()?;
        let width = input.word()?;
        if width == 0 || height == 0 {
            return Err(DecodeError::Format("zero image dimension"));
        }
        let count = usize::from(input.byte()?);
        if count != 1 && count != 3 {
            return Err(DecodeError::UnsupportedLayout("component count"));
        }
        if len < 6 + 3 * count {
            return Err(DecodeError::Format("SOF length"));
        }

        let mut frame = Frame {
            width,
            height,
            count,
            ..Frame::default()
        };
        for (i, comp) in frame.components[..count].iter_mut().enumerate() {
            comp.id = input.byte()?;
            let hv = input.byte()?;
            comp.h = hv >> 4;
            comp.v = hv & 0x0F;
            comp.tq = input.byte()?;
            if comp.tq > 3 {
                return Err(DecodeError::Format("quantization table id"));
            }
            if i > 0 && (comp.h, comp.v) != (1, 1) {
                return Err(DecodeError::UnsupportedLayout("chroma sampling"));
            }
        }
        if count == 1 {
            // A lone component is never interleaved: one block per MCU
            frame.components[0].h = 1;
            frame.components[0].v = 1;
        } else {
            let luma = &frame.components[0];
            if !SUPPORTED_SAMPLING.contains(&(luma.h, luma.v)) {
                return Err(DecodeError::UnsupportedLayout("luma sampling"));
            }
        }
        input.skip(len - 6 - 3 * count)?;

        self.frame = Some(frame);
        Ok(())
    }

    fn read_dht<S: ByteSource>(&mut self, input: &mut Input<S>) -> Result<(), DecodeError> {
        let mut remaining = segment_len(input)?;
        while remaining > 0 {
            let class_id = input.byte()?;
            let (class, id) = (class_id >> 4, usize::from(class_id & 0x0F));
            if class > 1 {
                return Err(DecodeError::Format("huffman table class"));
            }
            if id > 1 {
                return Err(DecodeError::UnsupportedLayout("huffman table id"));
            }
            let mut counts = [0u8; 16];
            for c in counts.iter_mut() {
                *c = input.byte()?;
            }
            let total: usize = counts.iter().map(|&c| usize::from(c)).sum();
            if total > 256 || remaining < 17 + total {
                return Err(DecodeError::Format("DHT length"));
            }
            let mut symbols = [0u8; 256];
            for s in symbols[..total].iter_mut() {
                *s = input.byte()?;
            }
            let table = HuffmanTable::build(&counts, &symbols[..total])?;
            if class == 0 {
                self.dc[id] = table;
            } else {
                self.ac[id] = table;
            }
            remaining -= 17 + total;
        }
        Ok(())
    }

    fn read_dqt<S: ByteSource>(&mut self, input: &mut Input<S>) -> Result<(), DecodeError> {
        let mut remaining = segment_len(input)?;
        while remaining > 0 {
            let precision_id = input.byte()?;
            let (precision, id) = (precision_id >> 4, usize::from(precision_id & 0x0F));
            if id > 3 {
                return Err(DecodeError::Format("quantization table id"));
            }
            let size = match precision {
                0 => 65,
                1 => 129,
                _ => return Err(DecodeError::Format("quantization precision")),
            };
            if remaining < size {
                return Err(DecodeError::Format("DQT length"));
            }
            for q in self.quant[id].iter_mut() {
                *q = if precision == 0 {
                    u16::from(input.byte()?)
                } else {
                    input.word()?
                };
            }
            self.quant_present[id] = true;
            remaining -= size;
        }
        Ok(())
    }

    fn read_dri<S: ByteSource>(&mut self, input: &mut Input<S>) -> Result<(), DecodeError> {
        if segment_len(input)? != 2 {
            return Err(DecodeError::Format("DRI length"));
        }
        self.restart_interval = input.word()?;
        Ok(())
    }

    fn read_sos<S: ByteSource>(&mut self, input: &mut Input<S>) -> Result<Frame, DecodeError> {
        let len = segment_len(input)?;
        let mut frame = self.frame.ok_or(DecodeError::Format("scan before frame header"))?;
        let count = usize::from(input.byte()?);
        if count != frame.count {
            return Err(DecodeError::UnsupportedLayout("non-interleaved scan"));
        }
        if len < 4 + 2 * count {
            return Err(DecodeError::Format("SOS length"));
        }

        for _ in 0..count {
            let id = input.byte()?;
            let tables = input.byte()?;
            let comp = frame.components[..frame.count]
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or(DecodeError::Format("scan component"))?;
            comp.td = tables >> 4;
            comp.ta = tables & 0x0F;
            if comp.td > 1 || comp.ta > 1 {
                return Err(DecodeError::UnsupportedLayout("huffman table id"));
            }
            if !self.dc[usize::from(comp.td)].is_present()
                || !self.ac[usize::from(comp.ta)].is_present()
            {
                return Err(DecodeError::Format("missing huffman table"));
            }
            if !self.quant_present[usize::from(comp.tq)] {
                return Err(DecodeError::Format("missing quantization table"));
            }
        }

        let ss = input.byte()?;
        let se = input.byte()?;
        let approx = input.byte()?;
        if ss != 0 || se != 63 || approx != 0 {
            return Err(DecodeError::UnsupportedStandard("spectral selection"));
        }
        input.skip(len - 4 - 2 * count)?;

        self.frame = Some(frame);
        Ok(frame)
    }
}
