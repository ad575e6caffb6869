use std::io;

use thiserror::Error;

use crate::format::{Kind, MAGIC, VERSION};

/// Everything that can go wrong inside the container core.
///
/// All of these are fatal to the operation that raised them: the file and
/// the writer/reader object are left at the last successful operation, and
/// no recovery is attempted.
#[derive(Error, Debug)]
pub enum Error {
    #[error("bad magic number {0:#x} (expected {expected:#x}); not a block file", expected = MAGIC)]
    BadMagic(u64),

    #[error("file has format version {0}, but this reader has version {expected}", expected = VERSION)]
    BadVersion(u64),

    #[error("footer declares unknown codec kind {0}")]
    UnknownKind(i64),

    #[error("type mismatch: a {name} group cannot take a buffer of {buffer}", name = .kind.name())]
    TypeMismatch { kind: Kind, buffer: &'static str },

    #[error("size mismatch: expected {expected} but got {found}")]
    SizeMismatch { expected: usize, found: usize },

    #[error("bit width {0} is outside the packable range [0, 64]")]
    BitWidthOutOfRange(i64),

    #[error("index {index} outside valid range [{lo}, {hi})")]
    IndexOutOfRange { index: usize, lo: usize, hi: usize },

    #[error("no group has been started; call a start_*_group method first")]
    NoActiveGroup,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
