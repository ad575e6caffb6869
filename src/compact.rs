//! The min-subtract integer codec.
//!
//! Each block of i64 values is stored as the block minimum plus bit-packed
//! non-negative residuals at the smallest width that fits. The per-block
//! minima and widths live in memory while writing and are persisted in the
//! group tail, themselves min-subtracted and bit-packed so a group with
//! hundreds of blocks still has a tail of a few dozen bytes.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::bits::{array_bytes, width_needed, BitBuffer};
use crate::error::{Error, Result};
use crate::index::BlockIndex;

#[derive(Debug)]
pub(crate) struct CompactCodec {
    n: usize,
    index: BlockIndex,
    /// Per-block minimum, in block order.
    mins: Vec<i64>,
    /// Per-block residual bit width, in block order.
    widths: Vec<i64>,
    residuals: Vec<u64>,
    bits: BitBuffer,
}

impl CompactCodec {
    pub fn new(start_block: usize, n: usize) -> Self {
        Self {
            n,
            index: BlockIndex::new(start_block),
            mins: Vec::new(),
            widths: Vec::new(),
            residuals: Vec::new(),
            bits: BitBuffer::new(),
        }
    }

    pub fn block_len(&self) -> usize {
        self.n
    }

    pub fn block_offset(&self, block: usize) -> Result<i64> {
        self.index.block_offset(block)
    }

    /// Per-block minima, in block order.
    pub fn mins(&self) -> &[i64] {
        &self.mins
    }

    /// Per-block residual bit widths, in block order.
    pub fn widths(&self) -> &[i64] {
        &self.widths
    }

    pub fn write_i64s<W: Write>(&mut self, f: &mut W, xs: &[i64]) -> Result<()> {
        let min = xs.iter().copied().min().unwrap_or(0);

        // wrapping_sub: the full i64 range minus the minimum always fits in
        // a u64, even when the subtraction overflows i64.
        self.residuals.clear();
        self.residuals
            .extend(xs.iter().map(|&x| x.wrapping_sub(min) as u64));

        let width = width_needed(&self.residuals);
        self.bits.write(f, &self.residuals, width)?;

        self.mins.push(min);
        self.widths.push(width as i64);
        self.index.add_block(array_bytes(width, xs.len()) as i64);
        Ok(())
    }

    pub fn read_i64s<R: Read>(&mut self, f: &mut R, block: usize, out: &mut [i64]) -> Result<()> {
        let i = self.index.relative(block)?;
        let width = self.widths[i];
        let min = self.mins[i];
        if !(0..=64).contains(&width) {
            return Err(Error::BitWidthOutOfRange(width));
        }

        let residuals = self.bits.read(f, width as u32, out.len())?;
        for (o, &r) in out.iter_mut().zip(residuals) {
            *o = min.wrapping_add(r as i64);
        }
        Ok(())
    }

    /// Tail record: `N`, `start_block`, `block_count`, then the `mins` and
    /// `widths` tables, each as a compact sub-block.
    pub fn write_tail<W: Write>(&mut self, f: &mut W) -> Result<()> {
        f.write_i64::<LittleEndian>(self.n as i64)?;
        f.write_i64::<LittleEndian>(self.index.start_block() as i64)?;
        f.write_i64::<LittleEndian>(self.index.block_count() as i64)?;

        write_compact_vec(f, &self.mins, &mut self.bits, &mut self.residuals)?;
        write_compact_vec(f, &self.widths, &mut self.bits, &mut self.residuals)?;
        Ok(())
    }

    pub fn from_tail<R: Read>(f: &mut R) -> Result<Self> {
        let n = f.read_i64::<LittleEndian>()? as usize;
        let start_block = f.read_i64::<LittleEndian>()? as usize;
        let block_count = f.read_i64::<LittleEndian>()? as usize;

        let mut codec = Self::new(start_block, n);
        codec.mins = read_compact_vec(f, block_count, &mut codec.bits)?;
        codec.widths = read_compact_vec(f, block_count, &mut codec.bits)?;

        for &w in &codec.widths {
            if !(0..=64).contains(&w) {
                return Err(Error::BitWidthOutOfRange(w));
            }
            codec.index.add_block(array_bytes(w as u32, n) as i64);
        }
        Ok(codec)
    }
}

/// Store an i64 table as `{min:i64, width:i64, packed residuals}`.
///
/// This is the integer codec's own strategy applied to its bookkeeping; an
/// empty table degenerates to `min = 0, width = 0` with no payload.
fn write_compact_vec<W: Write>(
    f: &mut W,
    values: &[i64],
    bits: &mut BitBuffer,
    scratch: &mut Vec<u64>,
) -> Result<()> {
    let min = values.iter().copied().min().unwrap_or(0);

    scratch.clear();
    scratch.extend(values.iter().map(|&v| v.wrapping_sub(min) as u64));
    let width = width_needed(scratch);

    f.write_i64::<LittleEndian>(min)?;
    f.write_i64::<LittleEndian>(width as i64)?;
    bits.write(f, scratch, width)?;
    Ok(())
}

/// Inverse of [`write_compact_vec`] for a table of known length.
fn read_compact_vec<R: Read>(f: &mut R, count: usize, bits: &mut BitBuffer) -> Result<Vec<i64>> {
    let min = f.read_i64::<LittleEndian>()?;
    let width = f.read_i64::<LittleEndian>()?;
    if !(0..=64).contains(&width) {
        return Err(Error::BitWidthOutOfRange(width));
    }

    let residuals = bits.read(f, width as u32, count)?;
    Ok(residuals
        .iter()
        .map(|&r| min.wrapping_add(r as i64))
        .collect())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn write_blocks(blocks: &[&[i64]]) -> (CompactCodec, Cursor<Vec<u8>>) {
        let n = blocks[0].len();
        let mut codec = CompactCodec::new(0, n);
        let mut file = Cursor::new(Vec::new());
        for block in blocks {
            codec.write_i64s(&mut file, block).unwrap();
        }
        (codec, file)
    }

    #[test]
    fn round_trip_with_negatives() {
        let blocks: &[&[i64]] = &[&[-1_000_000, -500_000, 0], &[7, 7, 7], &[i64::MIN, 0, i64::MAX]];
        let (mut codec, mut file) = write_blocks(blocks);

        for (b, block) in blocks.iter().enumerate() {
            let offset = codec.block_offset(b).unwrap() as u64;
            file.set_position(offset);
            let mut out = vec![0i64; 3];
            codec.read_i64s(&mut file, b, &mut out).unwrap();
            assert_eq!(&out, block, "block {} did not round trip", b);
        }
    }

    #[test]
    fn records_minimal_widths() {
        // Ranges 0..4, 0, 0..1023, 0..500_000.
        let mut codec = CompactCodec::new(0, 0);
        let mut file = Cursor::new(Vec::new());

        let cases: &[(&[i64], i64, i64)] = &[
            (&[100, 101, 102, 104], 100, 3),
            (&[1024, 1024, 1024], 1024, 0),
            (&[0, 1023, 500], 0, 10),
            (&[-1_000_000, -500_000], -1_000_000, 19),
        ];
        for (block, _, _) in cases {
            codec.write_i64s(&mut file, block).unwrap();
        }

        for (i, &(_, min, width)) in cases.iter().enumerate() {
            assert_eq!(codec.mins[i], min, "block {} minimum", i);
            assert_eq!(codec.widths[i], width, "block {} width", i);
        }
    }

    #[test]
    fn zero_width_blocks_store_no_bytes() {
        let (codec, file) = write_blocks(&[&[42, 42, 42, 42]]);
        assert_eq!(codec.widths[0], 0);
        assert!(file.get_ref().is_empty());

        let mut file = file;
        let mut out = vec![0i64; 4];
        let mut codec = codec;
        file.set_position(0);
        codec.read_i64s(&mut file, 0, &mut out).unwrap();
        assert_eq!(out, vec![42; 4]);
    }

    #[test]
    fn tail_round_trip() {
        let blocks: &[&[i64]] = &[&[100, 101, 102, 104], &[5000, 5001, 5002, 5003]];
        let (mut codec, _file) = write_blocks(blocks);

        let mut tail = Cursor::new(Vec::new());
        codec.write_tail(&mut tail).unwrap();
        tail.set_position(0);

        let back = CompactCodec::from_tail(&mut tail).unwrap();
        assert_eq!(back.block_len(), 4);
        assert_eq!(back.mins, codec.mins);
        assert_eq!(back.widths, codec.widths);
        assert_eq!(back.index.block_count(), 2);
        assert_eq!(
            back.block_offset(1).unwrap(),
            array_bytes(3, 4) as i64,
            "second block starts after the first block's packed bytes"
        );
    }

    #[test]
    fn empty_group_tail() {
        let mut codec = CompactCodec::new(3, 16);
        let mut tail = Cursor::new(Vec::new());
        codec.write_tail(&mut tail).unwrap();

        // N + start + count + two empty sub-blocks (min + width each).
        assert_eq!(tail.get_ref().len(), 3 * 8 + 2 * 16);

        tail.set_position(0);
        let back = CompactCodec::from_tail(&mut tail).unwrap();
        assert_eq!(back.index.block_count(), 0);
        assert!(back.mins.is_empty());
        assert!(back.widths.is_empty());
    }
}
