//! Endian-neutral encoding:
//! * Fixed-length numbers are encoded with least-significant byte first

#[inline]
pub(crate) fn encode_fixed32(value: u32) -> [u8; 4] {
    value.to_le_bytes()
}

/// Decode the first four bytes of `bytes`.
/// REQUIRES: bytes.len() >= 4
#[inline]
pub(crate) fn decode_fixed32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[inline]
pub(crate) fn encode_fixed16(value: u16) -> [u8; 2] {
    value.to_le_bytes()
}

/// Decode the first two bytes of `bytes`.
/// REQUIRES: bytes.len() >= 2
#[inline]
pub(crate) fn decode_fixed16(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}
