//! Separable 8x8 inverse DCT with level shift and clamping.

use core::f32::consts::FRAC_1_SQRT_2;

/// cos(k * pi / 16) for k in 0..=8
const COS: [f32; 9] = [
    1.0,
    0.980_785_3,
    0.923_879_5,
    0.831_469_6,
    0.707_106_8,
    0.555_570_2,
    0.382_683_4,
    0.195_090_3,
    0.0,
];

/// cos(k * pi / 16) for any k, folded onto the first quadrant
fn cos16(k: usize) -> f32 {
    let k = k % 32;
    let k = if k > 16 { 32 - k } else { k };
    if k > 8 {
        -COS[16 - k]
    } else {
        COS[k]
    }
}

/// Inverse DCT with a precomputed basis.
pub(crate) struct Idct {
    /// basis[x][u] = C(u) / 2 * cos((2x + 1) * u * pi / 16)
    basis: [[f32; 8]; 8],
}

impl Idct {
    pub(crate) fn new() -> Self {
        let mut basis = [[0.0f32; 8]; 8];
        for (x, row) in basis.iter_mut().enumerate() {
            for (u, b) in row.iter_mut().enumerate() {
                let c = if u == 0 { FRAC_1_SQRT_2 } else { 1.0 };
                *b = c / 2.0 * cos16((2 * x + 1) * u);
            }
        }
        Self { basis }
    }

    /// Transform dequantized natural-order coefficients into samples.
    pub(crate) fn transform(&self, coef: &[i32; 64], out: &mut [u8; 64]) {
        if coef[1..].iter().all(|&c| c == 0) {
            out.fill(clamp_sample(coef[0] as f32 / 8.0));
            return;
        }

        // Rows: tmp[v][x] = sum_u basis[x][u] * F(v, u)
        let mut tmp = [[0.0f32; 8]; 8];
        for v in 0..8 {
            let row = &coef[v * 8..v * 8 + 8];
            if row.iter().all(|&c| c == 0) {
                continue;
            }
            for x in 0..8 {
                let mut acc = 0.0;
                for (u, &c) in row.iter().enumerate() {
                    acc += self.basis[x][u] * c as f32;
                }
                tmp[v][x] = acc;
            }
        }

        // Columns: f(y, x) = sum_v basis[y][v] * tmp[v][x]
        for y in 0..8 {
            for x in 0..8 {
                let mut acc = 0.0;
                for (v, t) in tmp.iter().enumerate() {
                    acc += self.basis[y][v] * t[x];
                }
                out[y * 8 + x] = clamp_sample(acc);
            }
        }
    }
}

/// Undo the level shift, round to nearest, clamp to 0..=255.
fn clamp_sample(v: f32) -> u8 {
    let v = v + 128.0;
    if v <= 0.0 {
        0
    } else if v >= 255.0 {
        255
    } else {
        (v + 0.5) as u8
    }
}
