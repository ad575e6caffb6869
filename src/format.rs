use crate::error::{Error, Result};

/// Magic number identifying a block file.
pub const MAGIC: u64 = 0xb10c_f11e;

/// Format version. Bumped on any change to the byte layout.
pub const VERSION: u64 = 1;

/// Fixed size of the leading file header in bytes.
///   magic:u64 + version:u64 + groups:u64 + headers:u64
///   + blocks:u64 + footer_start:i64 + reserved[8]
///   = 6*8 + 8 = 56
pub const HEADER_SIZE: usize = 56;

// ── Leading header ─────────────────────────────────────────────────────────

/// Decoded representation of the 56-byte leading header.
///
/// Written twice: a zeroed stub when the file is created, and the real
/// values when the writer closes and the footer offset is finally known.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileHeader {
    pub groups: u64,
    pub headers: u64,
    pub blocks: u64,
    /// Absolute offset of the first footer byte.
    pub footer_start: i64,
}

impl FileHeader {
    /// Serialize to exactly `HEADER_SIZE` bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..8].copy_from_slice(&MAGIC.to_le_bytes());
        buf[8..16].copy_from_slice(&VERSION.to_le_bytes());
        buf[16..24].copy_from_slice(&self.groups.to_le_bytes());
        buf[24..32].copy_from_slice(&self.headers.to_le_bytes());
        buf[32..40].copy_from_slice(&self.blocks.to_le_bytes());
        buf[40..48].copy_from_slice(&self.footer_start.to_le_bytes());
        // reserved[8] stays zero
        buf
    }

    /// Deserialize from `HEADER_SIZE` bytes, validating magic and version.
    pub fn from_bytes(buf: &[u8; HEADER_SIZE]) -> Result<Self> {
        let field = |at: usize| {
            let mut b = [0u8; 8];
            b.copy_from_slice(&buf[at..at + 8]);
            u64::from_le_bytes(b)
        };

        let magic = field(0);
        if magic != MAGIC {
            return Err(Error::BadMagic(magic));
        }
        let version = field(8);
        if version != VERSION {
            return Err(Error::BadVersion(version));
        }
        Ok(Self {
            groups: field(16),
            headers: field(24),
            blocks: field(32),
            footer_start: field(40) as i64,
        })
    }
}

// ── Codec kinds ────────────────────────────────────────────────────────────

/// The closed set of codec kinds a group can be written with.
///
/// The numeric values are part of the on-disk format (they appear in the
/// footer's `group_kinds` array) and must never be reordered. The first ten
/// form a contiguous range of fixed-width kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i64)]
pub enum Kind {
    Int64 = 0,
    Int32 = 1,
    Int16 = 2,
    Int8 = 3,
    Uint64 = 4,
    Uint32 = 5,
    Uint16 = 6,
    Uint8 = 7,
    Float64 = 8,
    Float32 = 9,
    /// Per-block min-subtract + minimum-width bit packing of i64 values.
    IntCompact = 10,
    /// Quantized f32 values: affine map to integer pixels, then `IntCompact`.
    FloatQuantized = 11,
}

impl Kind {
    /// Decode a kind from its on-disk representation.
    pub fn from_i64(v: i64) -> Result<Kind> {
        Ok(match v {
            0 => Kind::Int64,
            1 => Kind::Int32,
            2 => Kind::Int16,
            3 => Kind::Int8,
            4 => Kind::Uint64,
            5 => Kind::Uint32,
            6 => Kind::Uint16,
            7 => Kind::Uint8,
            8 => Kind::Float64,
            9 => Kind::Float32,
            10 => Kind::IntCompact,
            11 => Kind::FloatQuantized,
            other => return Err(Error::UnknownKind(other)),
        })
    }

    /// True for the ten kinds stored verbatim at their natural width.
    pub fn is_fixed(self) -> bool {
        (self as i64) <= (Kind::Float32 as i64)
    }

    /// Byte width of one element of the caller buffer this kind accepts.
    pub fn element_bytes(self) -> usize {
        match self {
            Kind::Int64 | Kind::Uint64 | Kind::Float64 | Kind::IntCompact => 8,
            Kind::Int32 | Kind::Uint32 | Kind::Float32 | Kind::FloatQuantized => 4,
            Kind::Int16 | Kind::Uint16 => 2,
            Kind::Int8 | Kind::Uint8 => 1,
        }
    }

    /// Short human-readable name for error messages.
    pub fn name(self) -> &'static str {
        match self {
            Kind::Int64 => "int64",
            Kind::Int32 => "int32",
            Kind::Int16 => "int16",
            Kind::Int8 => "int8",
            Kind::Uint64 => "uint64",
            Kind::Uint32 => "uint32",
            Kind::Uint16 => "uint16",
            Kind::Uint8 => "uint8",
            Kind::Float64 => "float64",
            Kind::Float32 => "float32",
            Kind::IntCompact => "int-compact",
            Kind::FloatQuantized => "float-quantized",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trip() {
        let hd = FileHeader {
            groups: 3,
            headers: 2,
            blocks: 17,
            footer_start: 4096,
        };
        let bytes = hd.to_bytes();
        assert_eq!(bytes.len(), HEADER_SIZE);

        let back = FileHeader::from_bytes(&bytes).unwrap();
        assert_eq!(back.groups, 3);
        assert_eq!(back.headers, 2);
        assert_eq!(back.blocks, 17);
        assert_eq!(back.footer_start, 4096);
    }

    #[test]
    fn header_rejects_bad_magic() {
        let mut bytes = FileHeader::default().to_bytes();
        bytes[0] ^= 0xff;
        assert!(matches!(
            FileHeader::from_bytes(&bytes),
            Err(Error::BadMagic(_))
        ));
    }

    #[test]
    fn header_rejects_bad_version() {
        let mut bytes = FileHeader::default().to_bytes();
        bytes[8..16].copy_from_slice(&99u64.to_le_bytes());
        assert!(matches!(
            FileHeader::from_bytes(&bytes),
            Err(Error::BadVersion(99))
        ));
    }

    #[test]
    fn kind_codes_are_stable() {
        for v in 0..12 {
            assert_eq!(Kind::from_i64(v).unwrap() as i64, v);
        }
        assert!(matches!(Kind::from_i64(12), Err(Error::UnknownKind(12))));
        assert!(matches!(Kind::from_i64(-1), Err(Error::UnknownKind(-1))));
    }

    #[test]
    fn fixed_range_is_contiguous() {
        assert!(Kind::Int64.is_fixed());
        assert!(Kind::Float32.is_fixed());
        assert!(!Kind::IntCompact.is_fixed());
        assert!(!Kind::FloatQuantized.is_fixed());
    }
}
