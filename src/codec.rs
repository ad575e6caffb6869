//! Codec dispatch: the closed set of block codecs and the typed views that
//! connect caller buffers to them.
//!
//! Every group is driven by exactly one [`Codec`]. The enum is deliberately
//! closed: adding a kind means touching every match below, and the compiler
//! points at each one.

use std::io::{Read, Write};

use crate::compact::CompactCodec;
use crate::error::{Error, Result};
use crate::fixed::FixedCodec;
use crate::format::Kind;
use crate::quant::QuantCodec;

// ── Typed views over caller buffers ────────────────────────────────────────

/// A borrowed caller buffer with its element type made explicit.
///
/// The writer's generic entry point erases `&[T]` into this enum; codecs
/// then match on `(codec, view)` so a type mismatch is a single narrow
/// runtime check per block, not a per-element one.
#[derive(Debug, Clone, Copy)]
pub enum Scalars<'a> {
    Int64(&'a [i64]),
    Int32(&'a [i32]),
    Int16(&'a [i16]),
    Int8(&'a [i8]),
    Uint64(&'a [u64]),
    Uint32(&'a [u32]),
    Uint16(&'a [u16]),
    Uint8(&'a [u8]),
    Float64(&'a [f64]),
    Float32(&'a [f32]),
}

/// Mutable counterpart of [`Scalars`], used on the read path.
#[derive(Debug)]
pub enum ScalarsMut<'a> {
    Int64(&'a mut [i64]),
    Int32(&'a mut [i32]),
    Int16(&'a mut [i16]),
    Int8(&'a mut [i8]),
    Uint64(&'a mut [u64]),
    Uint32(&'a mut [u32]),
    Uint16(&'a mut [u16]),
    Uint8(&'a mut [u8]),
    Float64(&'a mut [f64]),
    Float32(&'a mut [f32]),
}

impl Scalars<'_> {
    /// The fixed-width kind that stores this element type verbatim.
    pub fn kind(&self) -> Kind {
        match self {
            Scalars::Int64(_) => Kind::Int64,
            Scalars::Int32(_) => Kind::Int32,
            Scalars::Int16(_) => Kind::Int16,
            Scalars::Int8(_) => Kind::Int8,
            Scalars::Uint64(_) => Kind::Uint64,
            Scalars::Uint32(_) => Kind::Uint32,
            Scalars::Uint16(_) => Kind::Uint16,
            Scalars::Uint8(_) => Kind::Uint8,
            Scalars::Float64(_) => Kind::Float64,
            Scalars::Float32(_) => Kind::Float32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Scalars::Int64(v) => v.len(),
            Scalars::Int32(v) => v.len(),
            Scalars::Int16(v) => v.len(),
            Scalars::Int8(v) => v.len(),
            Scalars::Uint64(v) => v.len(),
            Scalars::Uint32(v) => v.len(),
            Scalars::Uint16(v) => v.len(),
            Scalars::Uint8(v) => v.len(),
            Scalars::Float64(v) => v.len(),
            Scalars::Float32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalars::Int64(_) => "i64",
            Scalars::Int32(_) => "i32",
            Scalars::Int16(_) => "i16",
            Scalars::Int8(_) => "i8",
            Scalars::Uint64(_) => "u64",
            Scalars::Uint32(_) => "u32",
            Scalars::Uint16(_) => "u16",
            Scalars::Uint8(_) => "u8",
            Scalars::Float64(_) => "f64",
            Scalars::Float32(_) => "f32",
        }
    }
}

impl ScalarsMut<'_> {
    pub fn kind(&self) -> Kind {
        match self {
            ScalarsMut::Int64(_) => Kind::Int64,
            ScalarsMut::Int32(_) => Kind::Int32,
            ScalarsMut::Int16(_) => Kind::Int16,
            ScalarsMut::Int8(_) => Kind::Int8,
            ScalarsMut::Uint64(_) => Kind::Uint64,
            ScalarsMut::Uint32(_) => Kind::Uint32,
            ScalarsMut::Uint16(_) => Kind::Uint16,
            ScalarsMut::Uint8(_) => Kind::Uint8,
            ScalarsMut::Float64(_) => Kind::Float64,
            ScalarsMut::Float32(_) => Kind::Float32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ScalarsMut::Int64(v) => v.len(),
            ScalarsMut::Int32(v) => v.len(),
            ScalarsMut::Int16(v) => v.len(),
            ScalarsMut::Int8(v) => v.len(),
            ScalarsMut::Uint64(v) => v.len(),
            ScalarsMut::Uint32(v) => v.len(),
            ScalarsMut::Uint16(v) => v.len(),
            ScalarsMut::Uint8(v) => v.len(),
            ScalarsMut::Float64(v) => v.len(),
            ScalarsMut::Float32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarsMut::Int64(_) => "i64",
            ScalarsMut::Int32(_) => "i32",
            ScalarsMut::Int16(_) => "i16",
            ScalarsMut::Int8(_) => "i8",
            ScalarsMut::Uint64(_) => "u64",
            ScalarsMut::Uint32(_) => "u32",
            ScalarsMut::Uint16(_) => "u16",
            ScalarsMut::Uint8(_) => "u8",
            ScalarsMut::Float64(_) => "f64",
            ScalarsMut::Float32(_) => "f32",
        }
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for i64 {}
    impl Sealed for i32 {}
    impl Sealed for i16 {}
    impl Sealed for i8 {}
    impl Sealed for u64 {}
    impl Sealed for u32 {}
    impl Sealed for u16 {}
    impl Sealed for u8 {}
    impl Sealed for f64 {}
    impl Sealed for f32 {}
}

/// The scalar element types a block buffer may hold.
///
/// Sealed: the accepted set is part of the format, not an extension point.
pub trait Scalar: sealed::Sealed + Copy + Default {
    /// The fixed-width kind that stores this type verbatim.
    const KIND: Kind;

    fn view(xs: &[Self]) -> Scalars<'_>;
    fn view_mut(xs: &mut [Self]) -> ScalarsMut<'_>;
}

impl Scalar for i64 {
    const KIND: Kind = Kind::Int64;
    fn view(xs: &[Self]) -> Scalars<'_> {
        Scalars::Int64(xs)
    }
    fn view_mut(xs: &mut [Self]) -> ScalarsMut<'_> {
        ScalarsMut::Int64(xs)
    }
}

impl Scalar for i32 {
    const KIND: Kind = Kind::Int32;
    fn view(xs: &[Self]) -> Scalars<'_> {
        Scalars::Int32(xs)
    }
    fn view_mut(xs: &mut [Self]) -> ScalarsMut<'_> {
        ScalarsMut::Int32(xs)
    }
}

impl Scalar for i16 {
    const KIND: Kind = Kind::Int16;
    fn view(xs: &[Self]) -> Scalars<'_> {
        Scalars::Int16(xs)
    }
    fn view_mut(xs: &mut [Self]) -> ScalarsMut<'_> {
        ScalarsMut::Int16(xs)
    }
}

impl Scalar for i8 {
    const KIND: Kind = Kind::Int8;
    fn view(xs: &[Self]) -> Scalars<'_> {
        Scalars::Int8(xs)
    }
    fn view_mut(xs: &mut [Self]) -> ScalarsMut<'_> {
        ScalarsMut::Int8(xs)
    }
}

impl Scalar for u64 {
    const KIND: Kind = Kind::Uint64;
    fn view(xs: &[Self]) -> Scalars<'_> {
        Scalars::Uint64(xs)
    }
    fn view_mut(xs: &mut [Self]) -> ScalarsMut<'_> {
        ScalarsMut::Uint64(xs)
    }
}

impl Scalar for u32 {
    const KIND: Kind = Kind::Uint32;
    fn view(xs: &[Self]) -> Scalars<'_> {
        Scalars::Uint32(xs)
    }
    fn view_mut(xs: &mut [Self]) -> ScalarsMut<'_> {
        ScalarsMut::Uint32(xs)
    }
}

impl Scalar for u16 {
    const KIND: Kind = Kind::Uint16;
    fn view(xs: &[Self]) -> Scalars<'_> {
        Scalars::Uint16(xs)
    }
    fn view_mut(xs: &mut [Self]) -> ScalarsMut<'_> {
        ScalarsMut::Uint16(xs)
    }
}

impl Scalar for u8 {
    const KIND: Kind = Kind::Uint8;
    fn view(xs: &[Self]) -> Scalars<'_> {
        Scalars::Uint8(xs)
    }
    fn view_mut(xs: &mut [Self]) -> ScalarsMut<'_> {
        ScalarsMut::Uint8(xs)
    }
}

impl Scalar for f64 {
    const KIND: Kind = Kind::Float64;
    fn view(xs: &[Self]) -> Scalars<'_> {
        Scalars::Float64(xs)
    }
    fn view_mut(xs: &mut [Self]) -> ScalarsMut<'_> {
        ScalarsMut::Float64(xs)
    }
}

impl Scalar for f32 {
    const KIND: Kind = Kind::Float32;
    fn view(xs: &[Self]) -> Scalars<'_> {
        Scalars::Float32(xs)
    }
    fn view_mut(xs: &mut [Self]) -> ScalarsMut<'_> {
        ScalarsMut::Float32(xs)
    }
}

// ── Codec dispatch ─────────────────────────────────────────────────────────

/// One group's codec, with all its in-memory bookkeeping.
///
/// Writers allocate one per `start_*_group` call; readers rehydrate one per
/// group from the footer via [`Codec::from_tail`].
#[derive(Debug)]
pub(crate) enum Codec {
    Fixed(FixedCodec),
    Compact(CompactCodec),
    Quant(QuantCodec),
}

impl Codec {
    pub fn kind(&self) -> Kind {
        match self {
            Codec::Fixed(c) => c.kind(),
            Codec::Compact(_) => Kind::IntCompact,
            Codec::Quant(_) => Kind::FloatQuantized,
        }
    }

    /// Element count of every block in the group.
    pub fn block_len(&self) -> usize {
        match self {
            Codec::Fixed(c) => c.block_len(),
            Codec::Compact(c) => c.block_len(),
            Codec::Quant(c) => c.block_len(),
        }
    }

    /// Serialize one block from `xs` and update the block index.
    pub fn write_data<W: Write>(&mut self, f: &mut W, xs: Scalars) -> Result<()> {
        match (self, xs) {
            (Codec::Fixed(c), xs) => c.write_data(f, xs),
            (Codec::Compact(c), Scalars::Int64(v)) => c.write_i64s(f, v),
            (Codec::Compact(_), other) => Err(Error::TypeMismatch {
                kind: Kind::IntCompact,
                buffer: other.type_name(),
            }),
            (Codec::Quant(c), Scalars::Float32(v)) => c.write_f32s(f, v),
            (Codec::Quant(_), other) => Err(Error::TypeMismatch {
                kind: Kind::FloatQuantized,
                buffer: other.type_name(),
            }),
        }
    }

    /// Deserialize global block `block` into `out`. The stream must already
    /// be positioned at the block's first byte.
    pub fn read_data<R: Read>(&mut self, f: &mut R, block: usize, out: ScalarsMut) -> Result<()> {
        match (self, out) {
            (Codec::Fixed(c), out) => c.read_data(f, out),
            (Codec::Compact(c), ScalarsMut::Int64(v)) => c.read_i64s(f, block, v),
            (Codec::Compact(_), other) => Err(Error::TypeMismatch {
                kind: Kind::IntCompact,
                buffer: other.type_name(),
            }),
            (Codec::Quant(c), ScalarsMut::Float32(v)) => c.read_f32s(f, block, v),
            (Codec::Quant(_), other) => Err(Error::TypeMismatch {
                kind: Kind::FloatQuantized,
                buffer: other.type_name(),
            }),
        }
    }

    /// Append this codec's tail record to the footer stream.
    pub fn write_tail<W: Write>(&mut self, f: &mut W) -> Result<()> {
        match self {
            Codec::Fixed(c) => c.write_tail(f),
            Codec::Compact(c) => c.write_tail(f),
            Codec::Quant(c) => c.write_tail(f),
        }
    }

    /// Byte offset of global block `block` relative to the group start.
    pub fn block_offset(&self, block: usize) -> Result<i64> {
        match self {
            Codec::Fixed(c) => c.block_offset(block),
            Codec::Compact(c) => c.block_offset(block),
            Codec::Quant(c) => c.block_offset(block),
        }
    }

    /// Reconstruct a codec from its tail record in the footer stream.
    pub fn from_tail<R: Read>(f: &mut R, kind: Kind) -> Result<Codec> {
        match kind {
            Kind::Int64
            | Kind::Int32
            | Kind::Int16
            | Kind::Int8
            | Kind::Uint64
            | Kind::Uint32
            | Kind::Uint16
            | Kind::Uint8
            | Kind::Float64
            | Kind::Float32 => Ok(Codec::Fixed(FixedCodec::from_tail(f, kind)?)),
            Kind::IntCompact => Ok(Codec::Compact(CompactCodec::from_tail(f)?)),
            Kind::FloatQuantized => Ok(Codec::Quant(QuantCodec::from_tail(f)?)),
        }
    }
}
