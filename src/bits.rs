//! Fixed-width bit packing: arrays of `N` integers stored at `b` bits each.
//!
//! Values are packed little-endian-wise across the byte stream: bit 0 of
//! element 0 lands in bit 0 of byte 0, and element `i` occupies the bit
//! range `[i*b, (i+1)*b)` with no alignment padding anywhere. This is what
//! makes integer columns with known value ranges (grid indices, counts,
//! quantized positions) cheap to store when `b` is well below 64.
//!
//! The layer is usable on its own; the container's compact codecs build on
//! it via [`BitBuffer`].

use std::io::{Read, Write};

use crate::error::{Error, Result};

/// Number of bytes needed to store `len` elements at `bits` bits each.
pub fn array_bytes(bits: u32, len: usize) -> usize {
    (bits as usize * len + 7) / 8
}

/// Minimum bit width that can represent `max`: `ceil(log2(max + 1))`.
///
/// `precision_needed(0) == 0`: a value set that is all zeros needs no
/// payload bits at all.
pub fn precision_needed(max: u64) -> u32 {
    64 - max.leading_zeros()
}

/// Minimum bit width that can represent every element of `x`.
pub fn width_needed(x: &[u64]) -> u32 {
    precision_needed(x.iter().copied().max().unwrap_or(0))
}

/// Pack each element of `x`, masked to `bits` bits, into `out`.
///
/// `out` must be exactly `array_bytes(bits, x.len())` long and
/// zero-initialized: packing ORs bits in, it never clears them.
///
/// # Panics
///
/// Panics if `bits > 64` or `out` has the wrong length. Both are
/// programming errors, not data errors.
pub fn pack(x: &[u64], bits: u32, out: &mut [u8]) {
    assert!(bits <= 64, "cannot pack {} bits per element", bits);
    assert_eq!(
        out.len(),
        array_bytes(bits, x.len()),
        "pack buffer has the wrong length"
    );
    if bits == 0 {
        return;
    }

    let mask = mask_of(bits);
    let bits = bits as usize;

    for (i, &xi) in x.iter().enumerate() {
        let start_bit = (i * bits % 8) as u32;
        let first = i * bits / 8;
        let last = ((i + 1) * bits - 1) / 8;

        // A 64-bit value at an arbitrary bit offset touches up to 9 bytes,
        // so the shifted value is staged in 128 bits and drained bytewise.
        let mut acc = ((xi & mask) as u128) << start_bit;
        for byte in &mut out[first..=last] {
            *byte |= (acc & 0xff) as u8;
            acc >>= 8;
        }
    }
}

/// Unpack `out.len()` elements of `bits` bits each from `data` into `out`.
///
/// Bits outside each element's `[i*bits, (i+1)*bits)` range never influence
/// the reconstructed value.
///
/// # Panics
///
/// Panics if `bits > 64` or `data` has the wrong length.
pub fn unpack(data: &[u8], bits: u32, out: &mut [u64]) {
    assert!(bits <= 64, "cannot unpack {} bits per element", bits);
    assert_eq!(
        data.len(),
        array_bytes(bits, out.len()),
        "unpack buffer has the wrong length"
    );
    if bits == 0 {
        out.fill(0);
        return;
    }

    let mask = mask_of(bits);
    let bits = bits as usize;

    for (i, oi) in out.iter_mut().enumerate() {
        let start_bit = (i * bits % 8) as u32;
        let first = i * bits / 8;
        let last = ((i + 1) * bits - 1) / 8;

        let mut acc: u128 = 0;
        for (k, &byte) in data[first..=last].iter().enumerate() {
            acc |= (byte as u128) << (8 * k);
        }
        *oi = ((acc >> start_bit) as u64) & mask;
    }
}

fn mask_of(bits: u32) -> u64 {
    if bits == 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

// ── BitBuffer ──────────────────────────────────────────────────────────────

/// Reusable scratch for streaming packed arrays to and from files.
///
/// Holds a byte buffer and a u64 buffer that grow once and are reused for
/// every block, so the per-block hot path does not allocate. Each codec owns
/// one for the lifetime of its file.
#[derive(Debug, Default)]
pub struct BitBuffer {
    bytes: Vec<u8>,
    words: Vec<u64>,
}

impl BitBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pack `x` at `bits` bits per element and write the payload to `f`.
    ///
    /// A width of zero writes nothing: the element count alone encodes the
    /// content (all zeros).
    pub fn write<W: Write>(&mut self, f: &mut W, x: &[u64], bits: u32) -> Result<()> {
        if bits > 64 {
            return Err(Error::BitWidthOutOfRange(bits as i64));
        }
        if bits == 0 {
            return Ok(());
        }

        self.bytes.clear();
        self.bytes.resize(array_bytes(bits, x.len()), 0);
        pack(x, bits, &mut self.bytes);
        f.write_all(&self.bytes)?;
        Ok(())
    }

    /// Read `n` elements of `bits` bits each from `f`.
    ///
    /// The returned slice borrows this buffer's scratch and is valid only
    /// until the next call on the same buffer.
    pub fn read<R: Read>(&mut self, f: &mut R, bits: u32, n: usize) -> Result<&[u64]> {
        if bits > 64 {
            return Err(Error::BitWidthOutOfRange(bits as i64));
        }

        self.words.clear();
        self.words.resize(n, 0);
        if bits == 0 {
            return Ok(&self.words);
        }

        self.bytes.clear();
        self.bytes.resize(array_bytes(bits, n), 0);
        f.read_exact(&mut self.bytes)?;
        unpack(&self.bytes, bits, &mut self.words);
        Ok(&self.words)
    }
}
