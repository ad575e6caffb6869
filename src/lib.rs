//! `shale` is a self-describing columnar container for large numeric
//! archives, built for cosmological simulation output (particle snapshots,
//! halo catalogs) but agnostic to what the numbers mean.
//!
//! A block file is an ordered mix of opaque user *headers* and typed
//! *groups* of fixed-length *blocks*. Each group is written through one
//! codec:
//!
//! - the ten **fixed-width** kinds store scalars verbatim in little-endian,
//! - **int-compact** stores i64 blocks as a per-block minimum plus
//!   bit-packed residuals at the smallest width that fits,
//! - **float-quantized** maps f32 values onto an integer pixel grid
//!   (optionally periodic) and feeds the pixels to int-compact, restoring
//!   them later with an unbiasing dither.
//!
//! A footer written at close time indexes every header and block, so
//! reopening a file costs one footer parse and each block is then a single
//! seek away, in any order.
//!
//! ```no_run
//! use shale::{Kind, Reader, Writer};
//!
//! # fn main() -> shale::Result<()> {
//! let mut w = Writer::create("halos.shale")?;
//! w.header(b"snapshot z=0.0")?;
//! w.start_int_group(3)?;
//! w.write_block(&[101i64, 102, 104])?;
//! w.close()?;
//!
//! let mut r = Reader::open("halos.shale")?;
//! assert_eq!(r.block_count(), 1);
//! assert_eq!(r.block_kind(0)?, Kind::IntCompact);
//! let mut out = [0i64; 3];
//! r.read_block(0, &mut out)?;
//! # Ok(())
//! # }
//! ```
//!
//! One writer or one reader per file; handles on different files are
//! independent. Scratch returned by read methods is valid until the next
//! call on the same object.

pub mod bits;
pub mod codec;
pub mod error;
pub mod format;
pub mod reader;
pub mod writer;

mod compact;
mod fixed;
mod index;
mod quant;

pub use codec::{Scalar, Scalars, ScalarsMut};
pub use error::{Error, Result};
pub use format::{FileHeader, Kind, HEADER_SIZE, MAGIC, VERSION};
pub use reader::Reader;
pub use writer::Writer;
