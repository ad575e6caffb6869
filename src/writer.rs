use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::codec::{Codec, Scalar};
use crate::compact::CompactCodec;
use crate::error::{Error, Result};
use crate::fixed::FixedCodec;
use crate::format::{FileHeader, Kind, HEADER_SIZE};
use crate::quant::QuantCodec;

/// Streaming writer for block files.
///
/// # Write contract
/// Interleave [`header`] and `start_*_group` calls freely; after a group is
/// started, each [`write_block`] appends one block of exactly `N` elements
/// to it. Starting the next group finalizes the previous one. [`close`]
/// writes the footer and seals the file; a writer dropped without `close`
/// leaves behind a stub header that no reader will accept.
///
/// A group's blocks must be contiguous on disk: write all of a group's
/// blocks before inserting the next header or group.
///
/// # Layout written
/// ```text
/// [LEADING HEADER: 56 bytes, stub until close]
/// [user headers and group bodies, in call order]
/// [FOOTER: header_offsets[] header_sizes[] group_offsets[]
///          group_kinds[] group_block_counts[]   (i64 arrays)
///          codec tails, in group order]
/// <- seek back to 0, overwrite the leading header with real values
/// ```
///
/// [`header`]: Writer::header
/// [`write_block`]: Writer::write_block
/// [`close`]: Writer::close
#[derive(Debug)]
pub struct Writer {
    f: File,
    header_offsets: Vec<i64>,
    header_sizes: Vec<i64>,
    group_offsets: Vec<i64>,
    group_blocks: Vec<i64>,
    codecs: Vec<Codec>,
    blocks: usize,
}

impl Writer {
    /// Create a new block file at `path`, overwriting any existing file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let mut f = File::create(path)?;
        // Stub header; overwritten with the real one in close().
        f.write_all(&[0u8; HEADER_SIZE])?;
        Ok(Self {
            f,
            header_offsets: Vec::new(),
            header_sizes: Vec::new(),
            group_offsets: Vec::new(),
            group_blocks: Vec::new(),
            codecs: Vec::new(),
            blocks: 0,
        })
    }

    /// Append an opaque user header and return its ordinal index.
    ///
    /// The payload is stored byte-verbatim; the footer records its offset
    /// and size so readers can fetch it by index.
    pub fn header(&mut self, payload: &[u8]) -> Result<usize> {
        let pos = self.f.stream_position()? as i64;
        self.f.write_all(payload)?;
        self.header_offsets.push(pos);
        self.header_sizes.push(payload.len() as i64);
        Ok(self.header_offsets.len() - 1)
    }

    /// Start a group of verbatim fixed-width blocks of `n` elements each.
    ///
    /// `kind` must be one of the ten fixed-width kinds; the compact kinds
    /// have their own entry points below.
    pub fn start_fixed_group(&mut self, kind: Kind, n: usize) -> Result<()> {
        if !kind.is_fixed() {
            return Err(Error::TypeMismatch {
                kind,
                buffer: "a fixed-width group",
            });
        }
        self.start_group(Codec::Fixed(FixedCodec::new(kind, self.blocks, n)))
    }

    /// Start a min-subtract bit-packed group of `n` i64 elements per block.
    pub fn start_int_group(&mut self, n: usize) -> Result<()> {
        self.start_group(Codec::Compact(CompactCodec::new(self.blocks, n)))
    }

    /// Start a quantized-float group of `n` f32 elements per block.
    ///
    /// Values are quantized onto `pixels` uniform cells over `[low, high)`.
    /// With `periodic` set, each block is first normalized onto the
    /// shortest arc of the `pixels`-cell torus.
    ///
    /// # Panics
    ///
    /// Panics unless `pixels > 0` and `low < high`.
    pub fn start_float_group(
        &mut self,
        n: usize,
        low: f32,
        high: f32,
        pixels: i64,
        periodic: bool,
    ) -> Result<()> {
        assert!(pixels > 0, "quantized-float group needs pixels > 0");
        assert!(low < high, "quantized-float group needs low < high");
        self.start_group(Codec::Quant(QuantCodec::new(
            self.blocks,
            n,
            low,
            high,
            pixels,
            periodic,
        )))
    }

    fn start_group(&mut self, codec: Codec) -> Result<()> {
        let pos = self.f.stream_position()? as i64;
        self.group_offsets.push(pos);
        self.group_blocks.push(0);
        self.codecs.push(codec);
        Ok(())
    }

    /// Append one block to the current group and return its global index.
    ///
    /// The buffer's element type must match the group's codec and its
    /// length must equal the group's `N`.
    pub fn write_block<T: Scalar>(&mut self, xs: &[T]) -> Result<usize> {
        let gi = self.codecs.len().checked_sub(1).ok_or(Error::NoActiveGroup)?;
        let codec = &mut self.codecs[gi];

        if xs.len() != codec.block_len() {
            return Err(Error::SizeMismatch {
                expected: codec.block_len(),
                found: xs.len(),
            });
        }

        codec.write_data(&mut self.f, T::view(xs))?;
        self.group_blocks[gi] += 1;
        self.blocks += 1;
        Ok(self.blocks - 1)
    }

    /// Number of blocks written so far, across all groups.
    pub fn block_count(&self) -> usize {
        self.blocks
    }

    /// Number of user headers written so far.
    pub fn header_count(&self) -> usize {
        self.header_offsets.len()
    }

    /// Write the footer, rewrite the leading header, and seal the file.
    pub fn close(mut self) -> Result<()> {
        let footer_start = self.f.stream_position()? as i64;

        // ── Index arrays ───────────────────────────────────────────────
        for &v in &self.header_offsets {
            self.f.write_i64::<LittleEndian>(v)?;
        }
        for &v in &self.header_sizes {
            self.f.write_i64::<LittleEndian>(v)?;
        }
        for &v in &self.group_offsets {
            self.f.write_i64::<LittleEndian>(v)?;
        }
        for codec in &self.codecs {
            self.f.write_i64::<LittleEndian>(codec.kind() as i64)?;
        }
        for &v in &self.group_blocks {
            self.f.write_i64::<LittleEndian>(v)?;
        }

        // ── Codec tails, in group order ────────────────────────────────
        for codec in &mut self.codecs {
            codec.write_tail(&mut self.f)?;
        }

        // ── Real leading header ────────────────────────────────────────
        let header = FileHeader {
            groups: self.codecs.len() as u64,
            headers: self.header_offsets.len() as u64,
            blocks: self.blocks as u64,
            footer_start,
        };
        self.f.seek(SeekFrom::Start(0))?;
        self.f.write_all(&header.to_bytes())?;
        self.f.flush()?;
        Ok(())
    }
}
