//! Plain little-endian storage for the ten fixed-width kinds.

use std::io::{Read, Write};

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::codec::{Scalars, ScalarsMut};
use crate::error::{Error, Result};
use crate::format::Kind;
use crate::index::BlockIndex;

/// Verbatim codec: each block is `element_bytes * N` little-endian bytes.
#[derive(Debug)]
pub(crate) struct FixedCodec {
    kind: Kind,
    n: usize,
    width: usize,
    index: BlockIndex,
    scratch: Vec<u8>,
}

impl FixedCodec {
    /// `kind` must be one of the ten fixed-width kinds.
    pub fn new(kind: Kind, start_block: usize, n: usize) -> Self {
        debug_assert!(kind.is_fixed());
        Self {
            kind,
            n,
            width: kind.element_bytes(),
            index: BlockIndex::new(start_block),
            scratch: Vec::new(),
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn block_len(&self) -> usize {
        self.n
    }

    pub fn block_offset(&self, block: usize) -> Result<i64> {
        self.index.block_offset(block)
    }

    fn block_bytes(&self) -> usize {
        self.width * self.n
    }

    pub fn write_data<W: Write>(&mut self, f: &mut W, xs: Scalars) -> Result<()> {
        if xs.kind() != self.kind {
            return Err(Error::TypeMismatch {
                kind: self.kind,
                buffer: xs.type_name(),
            });
        }

        self.scratch.clear();
        self.scratch.resize(self.block_bytes(), 0);
        match xs {
            Scalars::Int64(v) => LittleEndian::write_i64_into(v, &mut self.scratch),
            Scalars::Int32(v) => LittleEndian::write_i32_into(v, &mut self.scratch),
            Scalars::Int16(v) => LittleEndian::write_i16_into(v, &mut self.scratch),
            Scalars::Int8(v) => {
                for (dst, &src) in self.scratch.iter_mut().zip(v) {
                    *dst = src as u8;
                }
            }
            Scalars::Uint64(v) => LittleEndian::write_u64_into(v, &mut self.scratch),
            Scalars::Uint32(v) => LittleEndian::write_u32_into(v, &mut self.scratch),
            Scalars::Uint16(v) => LittleEndian::write_u16_into(v, &mut self.scratch),
            Scalars::Uint8(v) => self.scratch.copy_from_slice(v),
            Scalars::Float64(v) => LittleEndian::write_f64_into(v, &mut self.scratch),
            Scalars::Float32(v) => LittleEndian::write_f32_into(v, &mut self.scratch),
        }

        f.write_all(&self.scratch)?;
        self.index.add_block(self.block_bytes() as i64);
        Ok(())
    }

    pub fn read_data<R: Read>(&mut self, f: &mut R, out: ScalarsMut) -> Result<()> {
        if out.kind() != self.kind {
            return Err(Error::TypeMismatch {
                kind: self.kind,
                buffer: out.type_name(),
            });
        }

        self.scratch.clear();
        self.scratch.resize(self.block_bytes(), 0);
        f.read_exact(&mut self.scratch)?;

        match out {
            ScalarsMut::Int64(v) => LittleEndian::read_i64_into(&self.scratch, v),
            ScalarsMut::Int32(v) => LittleEndian::read_i32_into(&self.scratch, v),
            ScalarsMut::Int16(v) => LittleEndian::read_i16_into(&self.scratch, v),
            ScalarsMut::Int8(v) => {
                for (dst, &src) in v.iter_mut().zip(self.scratch.iter()) {
                    *dst = src as i8;
                }
            }
            ScalarsMut::Uint64(v) => LittleEndian::read_u64_into(&self.scratch, v),
            ScalarsMut::Uint32(v) => LittleEndian::read_u32_into(&self.scratch, v),
            ScalarsMut::Uint16(v) => LittleEndian::read_u16_into(&self.scratch, v),
            ScalarsMut::Uint8(v) => v.copy_from_slice(&self.scratch),
            ScalarsMut::Float64(v) => LittleEndian::read_f64_into(&self.scratch, v),
            ScalarsMut::Float32(v) => LittleEndian::read_f32_into(&self.scratch, v),
        }
        Ok(())
    }

    /// Tail record: `N`, `start_block`, `block_count`, each as i64.
    pub fn write_tail<W: Write>(&mut self, f: &mut W) -> Result<()> {
        f.write_i64::<LittleEndian>(self.n as i64)?;
        f.write_i64::<LittleEndian>(self.index.start_block() as i64)?;
        f.write_i64::<LittleEndian>(self.index.block_count() as i64)?;
        Ok(())
    }

    /// Rebuild from a tail record; every block has the same byte size, so
    /// the index is just `block_count` equal strides.
    pub fn from_tail<R: Read>(f: &mut R, kind: Kind) -> Result<Self> {
        let n = f.read_i64::<LittleEndian>()?;
        let start_block = f.read_i64::<LittleEndian>()?;
        let block_count = f.read_i64::<LittleEndian>()?;

        let mut codec = Self::new(kind, start_block as usize, n as usize);
        for _ in 0..block_count {
            codec.index.add_block(codec.block_bytes() as i64);
        }
        Ok(codec)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn round_trip_i32_blocks() {
        let mut codec = FixedCodec::new(Kind::Int32, 0, 4);
        let mut file = Cursor::new(Vec::new());

        codec
            .write_data(&mut file, Scalars::Int32(&[1, -2, 3, -4]))
            .unwrap();
        codec
            .write_data(&mut file, Scalars::Int32(&[5, 6, 7, 8]))
            .unwrap();

        assert_eq!(file.get_ref().len(), 2 * 4 * 4);
        assert_eq!(codec.block_offset(0).unwrap(), 0);
        assert_eq!(codec.block_offset(1).unwrap(), 16);

        file.set_position(16);
        let mut out = [0i32; 4];
        codec
            .read_data(&mut file, ScalarsMut::Int32(&mut out))
            .unwrap();
        assert_eq!(out, [5, 6, 7, 8]);
    }

    #[test]
    fn rejects_wrong_element_type() {
        let mut codec = FixedCodec::new(Kind::Float64, 0, 2);
        let mut file = Cursor::new(Vec::new());
        let err = codec.write_data(&mut file, Scalars::Int64(&[1, 2]));
        assert!(matches!(err, Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn tail_round_trip() {
        let mut codec = FixedCodec::new(Kind::Uint16, 7, 3);
        let mut file = Cursor::new(Vec::new());
        codec
            .write_data(&mut file, Scalars::Uint16(&[10, 20, 30]))
            .unwrap();
        codec
            .write_data(&mut file, Scalars::Uint16(&[40, 50, 60]))
            .unwrap();

        let mut tail = Cursor::new(Vec::new());
        codec.write_tail(&mut tail).unwrap();
        tail.set_position(0);

        let back = FixedCodec::from_tail(&mut tail, Kind::Uint16).unwrap();
        assert_eq!(back.block_len(), 3);
        assert_eq!(back.index.start_block(), 7);
        assert_eq!(back.index.block_count(), 2);
        assert_eq!(back.block_offset(8).unwrap(), 6);
    }
}
