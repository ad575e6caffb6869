use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::codec::{Codec, Scalar};
use crate::error::{Error, Result};
use crate::format::{FileHeader, Kind, HEADER_SIZE};

/// Random-access reader for block files.
///
/// # Open sequence
/// 1. Read and validate the 56-byte leading header (magic, version).
/// 2. Seek to `footer_start`; read the five index arrays.
/// 3. Rehydrate each group's codec from its tail record, in group order.
/// 4. Build the dense block-to-group table.
///
/// After that every metadata query is a table lookup, and [`read_block`]
/// seeks straight to the requested block; no other block is touched.
///
/// The file handle is released when the reader is dropped.
///
/// [`read_block`]: Reader::read_block
#[derive(Debug)]
pub struct Reader {
    f: File,
    header_offsets: Vec<i64>,
    header_sizes: Vec<i64>,
    group_offsets: Vec<i64>,
    codecs: Vec<Codec>,
    /// Dense map from global block index to group index.
    block_group: Vec<usize>,
}

impl Reader {
    /// Open an existing block file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut f = File::open(path)?;

        let mut buf = [0u8; HEADER_SIZE];
        f.read_exact(&mut buf)?;
        let hd = FileHeader::from_bytes(&buf)?;

        let groups = hd.groups as usize;
        let headers = hd.headers as usize;
        let blocks = hd.blocks as usize;

        // ── Index arrays ───────────────────────────────────────────────
        f.seek(SeekFrom::Start(hd.footer_start as u64))?;

        let mut header_offsets = Vec::with_capacity(headers);
        for _ in 0..headers {
            header_offsets.push(f.read_i64::<LittleEndian>()?);
        }
        let mut header_sizes = Vec::with_capacity(headers);
        for _ in 0..headers {
            header_sizes.push(f.read_i64::<LittleEndian>()?);
        }
        let mut group_offsets = Vec::with_capacity(groups);
        for _ in 0..groups {
            group_offsets.push(f.read_i64::<LittleEndian>()?);
        }
        let mut group_kinds = Vec::with_capacity(groups);
        for _ in 0..groups {
            group_kinds.push(Kind::from_i64(f.read_i64::<LittleEndian>()?)?);
        }
        let mut group_blocks = Vec::with_capacity(groups);
        for _ in 0..groups {
            group_blocks.push(f.read_i64::<LittleEndian>()?);
        }

        // ── Codec rehydration, consuming each tail in group order ──────
        let mut codecs = Vec::with_capacity(groups);
        for &kind in &group_kinds {
            codecs.push(Codec::from_tail(&mut f, kind)?);
        }

        // ── Dense block-to-group table ─────────────────────────────────
        let mut block_group = Vec::with_capacity(blocks);
        for (g, &count) in group_blocks.iter().enumerate() {
            for _ in 0..count {
                block_group.push(g);
            }
        }
        if block_group.len() != blocks {
            return Err(Error::SizeMismatch {
                expected: blocks,
                found: block_group.len(),
            });
        }

        Ok(Self {
            f,
            header_offsets,
            header_sizes,
            group_offsets,
            codecs,
            block_group,
        })
    }

    /// Number of user headers in the file.
    pub fn header_count(&self) -> usize {
        self.header_offsets.len()
    }

    /// Number of data blocks in the file, across all groups.
    pub fn block_count(&self) -> usize {
        self.block_group.len()
    }

    /// Number of groups in the file.
    pub fn group_count(&self) -> usize {
        self.codecs.len()
    }

    /// Byte size of the `i`-th user header.
    pub fn header_size(&self, i: usize) -> Result<usize> {
        self.check_header(i)?;
        Ok(self.header_sizes[i] as usize)
    }

    /// Read the `i`-th user header into `out`, which must be exactly the
    /// recorded header size.
    pub fn read_header(&mut self, i: usize, out: &mut [u8]) -> Result<()> {
        self.check_header(i)?;
        if out.len() != self.header_sizes[i] as usize {
            return Err(Error::SizeMismatch {
                expected: self.header_sizes[i] as usize,
                found: out.len(),
            });
        }
        self.f.seek(SeekFrom::Start(self.header_offsets[i] as u64))?;
        self.f.read_exact(out)?;
        Ok(())
    }

    /// Read the `i`-th user header into a fresh byte vector.
    pub fn header_bytes(&mut self, i: usize) -> Result<Vec<u8>> {
        let mut out = vec![0u8; self.header_size(i)?];
        self.read_header(i, &mut out)?;
        Ok(out)
    }

    /// Codec kind of block `b`.
    pub fn block_kind(&self, b: usize) -> Result<Kind> {
        Ok(self.codecs[self.check_block(b)?].kind())
    }

    /// Element count of block `b`.
    pub fn block_length(&self, b: usize) -> Result<usize> {
        Ok(self.codecs[self.check_block(b)?].block_len())
    }

    /// Read block `b` into `out`.
    ///
    /// The buffer's element type must match the block's codec kind and its
    /// length must equal the block's element count. Only this block is
    /// read from disk.
    pub fn read_block<T: Scalar>(&mut self, b: usize, out: &mut [T]) -> Result<()> {
        let g = self.check_block(b)?;
        let codec = &mut self.codecs[g];

        if out.len() != codec.block_len() {
            return Err(Error::SizeMismatch {
                expected: codec.block_len(),
                found: out.len(),
            });
        }

        let offset = self.group_offsets[g] + codec.block_offset(b)?;
        self.f.seek(SeekFrom::Start(offset as u64))?;
        codec.read_data(&mut self.f, b, T::view_mut(out))
    }

    fn check_header(&self, i: usize) -> Result<()> {
        if i >= self.header_offsets.len() {
            return Err(Error::IndexOutOfRange {
                index: i,
                lo: 0,
                hi: self.header_offsets.len(),
            });
        }
        Ok(())
    }

    fn check_block(&self, b: usize) -> Result<usize> {
        self.block_group
            .get(b)
            .copied()
            .ok_or(Error::IndexOutOfRange {
                index: b,
                lo: 0,
                hi: self.block_group.len(),
            })
    }
}
