pub(crate) mod coding;
pub(crate) mod crc32c;
pub mod env_posix;
