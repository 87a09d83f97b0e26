//! A Status encapsulates the failure of an operation together with an
//! associated error message.  Successful operations return `Ok`, so the
//! "OK" status of the engine is simply the `Ok` arm of [`Result`].

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Status {
    #[error("NotFound: {0}")]
    NotFound(String),

    #[error("Corruption: {0}")]
    Corruption(String),

    #[error("Not implemented: {0}")]
    NotSupported(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {msg}")]
    IoError {
        msg: String,
        #[source]
        source: Option<io::Error>,
    },
}

impl Status {
    // Return error status of an appropriate type.
    pub fn not_found(msg: &str, msg2: &str) -> Self {
        Self::NotFound(join(msg, msg2))
    }
    pub fn corruption(msg: &str, msg2: &str) -> Self {
        Self::Corruption(join(msg, msg2))
    }
    pub fn not_supported(msg: &str, msg2: &str) -> Self {
        Self::NotSupported(join(msg, msg2))
    }
    pub fn invalid_argument(msg: &str, msg2: &str) -> Self {
        Self::InvalidArgument(join(msg, msg2))
    }
    pub fn io_error(msg: &str, msg2: &str) -> Self {
        Self::IoError { msg: join(msg, msg2), source: None }
    }

    /// Wrap an OS error, prefixing it with the name of the file involved.
    pub fn from_io(context: &str, err: io::Error) -> Self {
        Self::IoError { msg: join(context, &err.to_string()), source: Some(err) }
    }

    /// Returns true iff the status indicates a NotFound error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns true iff the status indicates a Corruption error.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Corruption(_))
    }

    /// Returns true iff the status indicates an IOError.
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::IoError { .. })
    }

    /// Returns true iff the status indicates an InvalidArgument error.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

impl From<io::Error> for Status {
    fn from(err: io::Error) -> Self {
        Self::IoError { msg: err.to_string(), source: Some(err) }
    }
}

fn join(msg: &str, msg2: &str) -> String {
    if msg2.is_empty() {
        msg.to_string()
    } else {
        format!("{}: {}", msg, msg2)
    }
}

pub type Result<T> = std::result::Result<T, Status>;
