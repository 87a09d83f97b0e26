//! Write-ahead log framing for an embedded key-value store.
//!
//! Logical records are split into checksummed physical records laid out
//! in fixed-size blocks, so a log torn by a crash can be read back up to
//! the last fully written record.

pub mod db;
pub mod env;
pub mod options;
pub mod status;
pub mod util;

pub use db::{
    log_format::{RecordType, BLOCK_SIZE, HEADER_SIZE},
    log_reader::{LogReporter, Reader, Reporter},
    log_writer::Writer,
    new_log_reader, new_log_writer, recover_log,
};
pub use env::{Env, SequentialFile, WritableFile};
pub use options::Options;
pub use status::{Result, Status};
pub use util::env_posix::PosixEnv;
