//! Log format information shared by reader and writer.
//!
//! A log file is a sequence of 32KiB blocks.  Each block holds zero or
//! more physical records, each made of a 7 byte header and a payload:
//!
//! ```text
//!     +---------------------+-------------------+-------------+--------------+
//!     | masked crc32c 4b le | length 2b le      | type 1b     | payload      |
//!     +---------------------+-------------------+-------------+--------------+
//! ```
//!
//! The crc covers the type byte and the payload.  When fewer than
//! `HEADER_SIZE` bytes remain in a block they are filled with zeros and
//! never parsed as a record.

use once_cell::sync::Lazy;

use crate::util::crc32c::value;

pub const BLOCK_SIZE: usize = 32768;

// Header is checksum (4 bytes), length (2 bytes), type (1 byte).
pub const HEADER_SIZE: usize = 4 + 2 + 1;

pub const MAX_RECORD_TYPE: u8 = RecordType::Last as u8;

/// DO NOT CHANGE THESE VALUES: they are embedded in the on-disk data.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    // Zero is reserved for preallocated files
    Zero = 0,

    Full = 1,

    // For fragments
    First = 2,
    Middle = 3,
    Last = 4,
}

impl RecordType {
    pub fn from_u8(t: u8) -> Option<Self> {
        match t {
            0 => Some(Self::Zero),
            1 => Some(Self::Full),
            2 => Some(Self::First),
            3 => Some(Self::Middle),
            4 => Some(Self::Last),
            _ => None,
        }
    }
}

/// crc32c values for all supported record types.  These are
/// pre-computed to reduce the overhead of computing the crc of the
/// record type stored in the header.
pub(crate) static TYPE_CRC: Lazy<[u32; MAX_RECORD_TYPE as usize + 1]> = Lazy::new(|| {
    let mut type_crc = [0u32; MAX_RECORD_TYPE as usize + 1];
    for (i, crc) in type_crc.iter_mut().enumerate() {
        *crc = value(&[i as u8]);
    }
    type_crc
});
