//! Buffered byte input and the entropy-coded bit reader.

use core::convert::Infallible;
use core::fmt;

use log::debug;

use super::DecodeError;

/// Size of the stream input buffer
pub const INPUT_BUFFER_SIZE: usize = 512;

/// Sequential byte stream feeding the decoder.
pub trait ByteSource {
    type Error: fmt::Debug;

    /// Fill `buf` from the stream; `Ok(0)` means end of stream.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

impl ByteSource for &[u8] {
    type Error = Infallible;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let n = buf.len().min(self.len());
        let (head, tail) = self.split_at(n);
        buf[..n].copy_from_slice(head);
        *self = tail;
        Ok(n)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    type Error = S::Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        (**self).read(buf)
    }
}

/// Byte-oriented reader over a [`ByteSource`].
pub(crate) struct Input<S> {
    src: S,
    buf: [u8; INPUT_BUFFER_SIZE],
    pos: usize,
    len: usize,
}

impl<S: ByteSource> Input<S> {
    pub(crate) fn new(src: S) -> Self {
        Self {
            src,
            buf: [0; INPUT_BUFFER_SIZE],
            pos: 0,
            len: 0,
        }
    }

    fn refill(&mut self) -> Result<(), DecodeError> {
        let n = self.src.read(&mut self.buf).map_err(|e| {
            debug!("jpeg: source read failed: {:?}", e);
            DecodeError::Input
        })?;
        if n == 0 {
            return Err(DecodeError::Input);
        }
        self.pos = 0;
        self.len = n;
        Ok(())
    }

    pub(crate) fn byte(&mut self) -> Result<u8, DecodeError> {
        if self.pos == self.len {
            self.refill()?;
        }
        let b = self.buf[self.pos];
        self.pos += 1;
        Ok(b)
    }

    /// Big-endian u16
    pub(crate) fn word(&mut self) -> Result<u16, DecodeError> {
        let hi = self.byte()?;
        let lo = self.byte()?;
        Ok(u16::from_be_bytes([hi, lo]))
    }

    pub(crate) fn skip(&mut self, mut n: usize) -> Result<(), DecodeError> {
        while n > 0 {
            if self.pos == self.len {
                self.refill()?;
            }
            let k = n.min(self.len - self.pos);
            self.pos += k;
            n -= k;
        }
        Ok(())
    }
}

/// MSB-first bit reader for entropy-coded segments.
///
/// Stuffed `FF 00` pairs are unstuffed. When a marker shows up it is parked in
/// `marker` and zero bits are fed from then on, as ITU T.81 F.2.2.5 asks.
#[derive(Debug, Default)]
pub(crate) struct BitReader {
    acc: u32,
    count: u8,
    marker: Option<u8>,
}

impl BitReader {
    fn fill<S: ByteSource>(&mut self, input: &mut Input<S>) -> Result<(), DecodeError> {
        let byte = if self.marker.is_some() {
            0
        } else {
            let b = input.byte()?;
            if b == 0xFF {
                let mut next = input.byte()?;
                while next == 0xFF {
                    next = input.byte()?;
                }
                if next == 0x00 {
                    0xFF
                } else {
                    self.marker = Some(next);
                    0
                }
            } else {
                b
            }
        };
        self.acc = (self.acc << 8) | u32::from(byte);
        self.count += 8;
        Ok(())
    }

    pub(crate) fn bit<S: ByteSource>(&mut self, input: &mut Input<S>) -> Result<u32, DecodeError> {
        if self.count == 0 {
            self.fill(input)?;
        }
        self.count -= 1;
        Ok((self.acc >> self.count) & 1)
    }

    /// RECEIVE(n): next `n` bits as an unsigned value
    pub(crate) fn receive<S: ByteSource>(
        &mut self,
        input: &mut Input<S>,
        n: u8,
    ) -> Result<i32, DecodeError> {
        let mut v = 0i32;
        for _ in 0..n {
            v = (v << 1) | self.bit(input)? as i32;
        }
        Ok(v)
    }

    /// Drop buffered bits and consume the RSTn marker that must come next.
    pub(crate) fn restart<S: ByteSource>(&mut self, input: &mut Input<S>) -> Result<(), DecodeError> {
        self.acc = 0;
        self.count = 0;
        let marker = match self.marker.take() {
            Some(m) => m,
            None => loop {
                if input.byte()? != 0xFF {
                    continue;
                }
                let mut next = input.byte()?;
                while next == 0xFF {
                    next = input.byte()?;
                }
                if next != 0x00 {
                    break next;
                }
            },
        };
        if !(0xD0..=0xD7).contains(&marker) {
            return Err(DecodeError::Format("missing restart marker"));
        }
        Ok(())
    }
}

/// EXTEND(v, s): sign-extend an `s`-bit magnitude category value
pub(crate) fn extend(v: i32, s: u8) -> i32 {
    if s == 0 {
        0
    } else if v < (1 << (s - 1)) {
        v - (1 << s) + 1
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out at most `chunk` bytes per read
    struct Trickle<'a> {
        data: &'a [u8],
        chunk: usize,
    }

    impl ByteSource for Trickle<'_> {
        type Error = Infallible;

        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            let n = buf.len().min(self.chunk).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_input_spans_short_reads() {
        let data: Vec<u8> = (0..=255u8).collect();
        let mut input = Input::new(Trickle { data: &data, chunk: 3 });
        assert_eq!(input.word().unwrap(), 0x0001);
        input.skip(250).unwrap();
        assert_eq!(input.byte().unwrap(), 252);
        assert_eq!(input.word().unwrap(), 0xFDFE);
        assert_eq!(input.byte().unwrap(), 255);
        assert_eq!(input.byte(), Err(DecodeError::Input));
    }

    #[test]
    fn test_bits_unstuff_ff00() {
        let data = [0b1010_0000u8, 0xFF, 0x00, 0x0F];
        let mut input = Input::new(&data[..]);
        let mut bits = BitReader::default();
        assert_eq!(bits.receive(&mut input, 3).unwrap(), 0b101);
        assert_eq!(bits.receive(&mut input, 5).unwrap(), 0);
        assert_eq!(bits.receive(&mut input, 8).unwrap(), 0xFF);
        assert_eq!(bits.receive(&mut input, 8).unwrap(), 0x0F);
    }

    #[test]
    fn test_marker_feeds_zero_bits_then_restarts() {
        let data = [0xFFu8, 0xD3, 0x80];
        let mut input = Input::new(&data[..]);
        let mut bits = BitReader::default();
        assert_eq!(bits.receive(&mut input, 16).unwrap(), 0);
        bits.restart(&mut input).unwrap();
        assert_eq!(bits.bit(&mut input).unwrap(), 1);
    }

    #[test]
    fn test_restart_rejects_other_markers() {
        let data = [0x12u8, 0xFF, 0xD9];
        let mut input = Input::new(&data[..]);
        let mut bits = BitReader::default();
        assert_eq!(
            bits.restart(&mut input),
            Err(DecodeError::Format("missing restart marker"))
        );
    }

    #[test]
    fn test_extend() {
        assert_eq!(extend(0, 0), 0);
        assert_eq!(extend(0, 1), -1);
        assert_eq!(extend(1, 1), 1);
        assert_eq!(extend(0b010, 3), -5);
        assert_eq!(extend(0b110, 3), 6);
    }
}
