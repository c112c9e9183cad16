//! Canonical Huffman tables (ITU T.81 Annex C / F.2.2.3).

use super::input::{BitReader, ByteSource, Input};
use super::DecodeError;

/// Decoding form of one DHT table.
#[derive(Clone)]
pub(crate) struct HuffmanTable {
    /// Largest code of each length, -1 when no code has that length
    maxcode: [i32; 17],
    /// Smallest code of each length
    mincode: [i32; 17],
    /// Index into `values` of the first code of each length
    valptr: [i32; 17],
    values: [u8; 256],
    present: bool,
}

impl Default for HuffmanTable {
    fn default() -> Self {
        Self {
            maxcode: [-1; 17],
            mincode: [0; 17],
            valptr: [0; 17],
            values: [0; 256],
            present: false,
        }
    }
}

impl HuffmanTable {
    /// Build from the BITS counts (codes of length 1..=16) and HUFFVAL symbols.
    pub(crate) fn build(counts: &[u8; 16], symbols: &[u8]) -> Result<Self, DecodeError> {
        let total: usize = counts.iter().map(|&c| usize::from(c)).sum();
        if total != symbols.len() || total > 256 {
            return Err(DecodeError::Format("bad huffman table"));
        }

        let mut table = Self::default();
        table.values[..total].copy_from_slice(symbols);

        let mut code = 0i32;
        let mut k = 0i32;
        for len in 1..=16 {
            let n = i32::from(counts[len - 1]);
            if n == 0 {
                table.maxcode[len] = -1;
            } else {
                table.valptr[len] = k;
                table.mincode[len] = code;
                code += n;
                k += n;
                table.maxcode[len] = code - 1;
                // A full set of codes at this length leaves no room below
                if code > (1 << len) {
                    return Err(DecodeError::Format("bad huffman table"));
                }
            }
            code <<= 1;
        }
        table.present = true;
        Ok(table)
    }

    pub(crate) fn is_present(&self) -> bool {
        self.present
    }

    /// DECODE: read one symbol bit by bit.
    pub(crate) fn decode<S: ByteSource>(
        &self,
        bits: &mut BitReader,
        input: &mut Input<S>,
    ) -> Result<u8, DecodeError> {
        let mut code = bits.bit(input)? as i32;
        for len in 1..=16 {
            if code <= self.maxcode[len] {
                let idx = self.valptr[len] + code - self.mincode[len];
                return Ok(self.values[idx as usize]);
            }
            code = (code << 1) | bits.bit(input)? as i32;
        }
        Err(DecodeError::Format("bad huffman code"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(usize, u8)]) -> [u8; 16] {
        let mut c = [0u8; 16];
        for &(len, n) in pairs {
            c[len - 1] = n;
        }
        c
    }

    #[test]
    fn test_decodes_canonical_codes() {
        // Lengths: A=2 (00), B=2 (01), C=3 (100), D=3 (101), E=3 (110)
        let table = HuffmanTable::build(&counts(&[(2, 2), (3, 3)]), b"ABCDE").unwrap();
        // 01 100 110 00 101 -> B C E A D
        let data = [0b0110_0110u8, 0b0010_1000];
        let mut input = Input::new(&data[..]);
        let mut bits = BitReader::default();
        let decoded: Vec<u8> = (0..5)
            .map(|_| table.decode(&mut bits, &mut input).unwrap())
            .collect();
        assert_eq!(decoded, b"BCEAD");
    }

    #[test]
    fn test_rejects_oversubscribed_lengths() {
        // Three 1-bit codes cannot exist
        let result = HuffmanTable::build(&counts(&[(1, 3)]), b"abc");
        assert!(matches!(result, Err(DecodeError::Format(_))));
    }

    #[test]
    fn test_rejects_count_mismatch() {
        let result = HuffmanTable::build(&counts(&[(2, 2)]), b"abc");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_code_is_a_format_error() {
        // Only code "0" exists; a run of ones never matches
        let table = HuffmanTable::build(&counts(&[(1, 1)]), b"z").unwrap();
        let data = [0xFFu8, 0x00, 0xFF, 0x00, 0xFF, 0x00];
        let mut input = Input::new(&data[..]);
        let mut bits = BitReader::default();
        assert_eq!(
            table.decode(&mut bits, &mut input),
            Err(DecodeError::Format("bad huffman code"))
        );
    }
}
