//! The quantized-float codec.
//!
//! Values in `[low, high)` are mapped to integer pixels on a uniform grid
//! of `pixels` cells, `dx = (high - low) / pixels` wide each, and the pixel
//! stream is handed to the integer codec. Reconstruction adds a uniform
//! dither in `[0, dx)` so that round-tripped data is unbiased and keeps its
//! statistical moments to O(dx).
//!
//! On a periodic axis the pixel values live on a torus: a cloud of points
//! hugging the wrap boundary would naively span almost the whole axis. The
//! wrap normalization below finds the shortest arc containing every pixel
//! and shifts the wrapped points up by one period, so the integer codec
//! sees a narrow contiguous range and its stored minimum doubles as the arc
//! origin.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use rand::Rng;

use crate::compact::CompactCodec;
use crate::error::Result;

#[derive(Debug)]
pub(crate) struct QuantCodec {
    inner: CompactCodec,
    low: f32,
    high: f32,
    pixels: i64,
    periodic: bool,
    pix: Vec<i64>,
}

impl QuantCodec {
    /// Callers must have checked `pixels > 0` and `low < high`.
    pub fn new(start_block: usize, n: usize, low: f32, high: f32, pixels: i64, periodic: bool) -> Self {
        Self {
            inner: CompactCodec::new(start_block, n),
            low,
            high,
            pixels,
            periodic,
            pix: Vec::new(),
        }
    }

    pub fn block_len(&self) -> usize {
        self.inner.block_len()
    }

    pub fn block_offset(&self, block: usize) -> Result<i64> {
        self.inner.block_offset(block)
    }

    fn dx(&self) -> f32 {
        (self.high - self.low) / self.pixels as f32
    }

    pub fn write_f32s<W: Write>(&mut self, f: &mut W, xs: &[f32]) -> Result<()> {
        let dx = self.dx();
        self.pix.clear();
        self.pix
            .extend(xs.iter().map(|&x| ((x - self.low) / dx).floor() as i64));

        if self.periodic {
            for p in &mut self.pix {
                *p = p.rem_euclid(self.pixels);
            }
            let x0 = wrap_origin(&self.pix, self.pixels);
            if x0 != 0 {
                // Lift points on the far side of the wrap by one period so
                // the arc [x0, x0 + width) is monotone. The integer codec's
                // per-block minimum then records x0 for the reader.
                for p in &mut self.pix {
                    *p = x0 + (*p - x0).rem_euclid(self.pixels);
                }
            }
        } else {
            for p in &mut self.pix {
                *p = (*p).clamp(0, self.pixels - 1);
            }
        }

        self.inner.write_i64s(f, &self.pix)
    }

    pub fn read_f32s<R: Read>(&mut self, f: &mut R, block: usize, out: &mut [f32]) -> Result<()> {
        self.pix.clear();
        self.pix.resize(out.len(), 0);
        self.inner.read_i64s(f, block, &mut self.pix)?;

        let dx = self.dx();
        let low = self.low;
        let pixels = self.pixels;
        let periodic = self.periodic;
        let mut rng = rand::thread_rng();

        for (o, &p) in out.iter_mut().zip(self.pix.iter()) {
            let p = if periodic { p.rem_euclid(pixels) } else { p };
            *o = dx * (p as f32 + rng.gen::<f32>()) + low;
        }
        Ok(())
    }

    /// Tail record: the integer codec's tail, then the quantization
    /// parameters `{low:f32, high:f32, pixels:i64, periodic:u8}`.
    pub fn write_tail<W: Write>(&mut self, f: &mut W) -> Result<()> {
        self.inner.write_tail(f)?;
        f.write_f32::<LittleEndian>(self.low)?;
        f.write_f32::<LittleEndian>(self.high)?;
        f.write_i64::<LittleEndian>(self.pixels)?;
        f.write_u8(self.periodic as u8)?;
        Ok(())
    }

    pub fn from_tail<R: Read>(f: &mut R) -> Result<Self> {
        let inner = CompactCodec::from_tail(f)?;
        let low = f.read_f32::<LittleEndian>()?;
        let high = f.read_f32::<LittleEndian>()?;
        let pixels = f.read_i64::<LittleEndian>()?;
        let periodic = f.read_u8()? != 0;
        Ok(Self {
            inner,
            low,
            high,
            pixels,
            periodic,
            pix: Vec::new(),
        })
    }
}

/// Signed shortest distance from `x0` to `x` on a torus of size `pixels`.
fn pdist(x: i64, x0: i64, pixels: i64) -> i64 {
    let d = x - x0;
    if d >= 0 && d > pixels - d {
        d - pixels
    } else if d < 0 && d < -(d + pixels) {
        pixels + d
    } else {
        d
    }
}

/// Origin of the shortest arc covering every element of `p` on a torus of
/// size `pixels`, or 0 when the points span more than half the torus and
/// wrapping is not worth it.
///
/// Grows an arc `[x0, x0 + width)` one point at a time, extending whichever
/// end is cheaper in torus distance.
fn wrap_origin(p: &[i64], pixels: i64) -> i64 {
    let Some((&first, rest)) = p.split_first() else {
        return 0;
    };
    let mut x0 = first;
    let mut width = 1i64;

    for &pi in rest {
        let x1 = (x0 + width - 1).rem_euclid(pixels);
        let d0 = pdist(pi, x0, pixels);
        let d1 = pdist(pi, x1, pixels);

        if d0 > 0 && d1 < 0 {
            continue; // already inside the arc
        } else if d1 > -d0 {
            width += d1;
        } else {
            x0 = (x0 + d0).rem_euclid(pixels);
            width -= d0;
        }

        if width > pixels / 2 {
            return 0;
        }
    }
    x0
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn pdist_crosses_the_wrap() {
        assert_eq!(pdist(3, 2, 100), 1);
        assert_eq!(pdist(2, 3, 100), -1);
        assert_eq!(pdist(2, 97, 100), 5);
        assert_eq!(pdist(97, 2, 100), -5);
        assert_eq!(pdist(50, 0, 100), 50);
        assert_eq!(pdist(0, 50, 100), -50);
        assert_eq!(pdist(7, 7, 100), 0);
    }

    #[test]
    fn wrap_finds_the_short_arc() {
        // Points straddling the boundary: the short arc starts at 97.
        assert_eq!(wrap_origin(&[2, 3, 97, 98], 100), 97);
        assert_eq!(wrap_origin(&[97, 98, 2, 3], 100), 97);
        // A contiguous run away from the boundary keeps its own start.
        assert_eq!(wrap_origin(&[10, 11, 12], 100), 10);
        // A single point is its own arc.
        assert_eq!(wrap_origin(&[42], 100), 42);
    }

    #[test]
    fn wrap_gives_up_past_half_the_torus() {
        assert_eq!(wrap_origin(&[0, 50], 100), 0);
        assert_eq!(wrap_origin(&[0, 30, 60, 90], 100), 0);
    }

    #[test]
    fn periodic_block_packs_to_the_arc_width() {
        let mut codec = QuantCodec::new(0, 4, 0.0, 100.0, 100, true);
        let mut file = Cursor::new(Vec::new());
        codec
            .write_f32s(&mut file, &[2.5, 3.5, 97.5, 98.5])
            .unwrap();

        // Residuals span [0, 7), so three bits per element suffice.
        assert_eq!(codec.inner.widths()[0], 3);
        assert_eq!(codec.inner.mins()[0], 97);
    }

    #[test]
    fn non_periodic_clamps_out_of_range_pixels() {
        let mut codec = QuantCodec::new(0, 3, 0.0, 10.0, 10, false);
        let mut file = Cursor::new(Vec::new());
        codec.write_f32s(&mut file, &[-5.0, 5.0, 25.0]).unwrap();
        assert_eq!(codec.inner.mins()[0], 0);
        // Clamped pixels: 0, 5, 9.
        assert_eq!(codec.inner.widths()[0], 4);
    }

    #[test]
    fn round_trip_stays_within_one_cell() {
        let mut codec = QuantCodec::new(0, 4, 100.0, 200.0, 100, false);
        let mut file = Cursor::new(Vec::new());
        let input = [100.3f32, 150.7, 199.9, 100.0];
        codec.write_f32s(&mut file, &input).unwrap();

        file.set_position(0);
        let mut out = [0f32; 4];
        codec.read_f32s(&mut file, 0, &mut out).unwrap();
        for (i, (&x, &y)) in input.iter().zip(out.iter()).enumerate() {
            assert!(
                (x - y).abs() < 1.0,
                "element {}: wrote {} but read {}",
                i,
                x,
                y
            );
        }
    }

    #[test]
    fn periodic_round_trip_recovers_torus_positions() {
        let mut codec = QuantCodec::new(0, 4, 0.0, 100.0, 100, true);
        let mut file = Cursor::new(Vec::new());
        let input = [2.2f32, 3.7, 97.1, 98.9];
        codec.write_f32s(&mut file, &input).unwrap();

        file.set_position(0);
        let mut out = [0f32; 4];
        codec.read_f32s(&mut file, 0, &mut out).unwrap();
        for (&x, &y) in input.iter().zip(out.iter()) {
            assert!((x - y).abs() < 1.0, "wrote {} but read {}", x, y);
            assert!((0.0..100.0).contains(&y));
        }
    }

    #[test]
    fn tail_round_trip() {
        let mut codec = QuantCodec::new(5, 4, -1.0, 1.0, 1 << 20, true);
        let mut file = Cursor::new(Vec::new());
        codec.write_f32s(&mut file, &[-0.5, 0.0, 0.5, 0.99]).unwrap();

        let mut tail = Cursor::new(Vec::new());
        codec.write_tail(&mut tail).unwrap();
        tail.set_position(0);

        let back = QuantCodec::from_tail(&mut tail).unwrap();
        assert_eq!(back.low, -1.0);
        assert_eq!(back.high, 1.0);
        assert_eq!(back.pixels, 1 << 20);
        assert!(back.periodic);
        assert_eq!(back.block_len(), 4);
        assert_eq!(back.block_offset(5).unwrap(), 0);
    }
}
