//! An Env is an interface used by the log layer to access operating
//! system functionality like the filesystem.  Callers may wish to provide
//! a custom Env when opening logs to get fine grained control; e.g., to
//! inject faults in tests.

use std::io::{Cursor, Read, Seek, SeekFrom};

use crate::status::Result;

pub trait Env {
    /// Create an object that writes to a new file with the specified
    /// name.  Deletes any existing file with the same name and creates a
    /// new file.
    ///
    /// The returned file will only be accessed by one thread at a time.
    fn new_writable_file(&self, fname: &str) -> Result<Box<dyn WritableFile>>;

    /// Create an object that either appends to an existing file, or
    /// writes to a new file (if the file does not exist to begin with).
    fn new_appendable_file(&self, fname: &str) -> Result<Box<dyn WritableFile>>;

    /// Create an object that sequentially reads the file with the
    /// specified name.  Returns a NotFound status if the file does not
    /// exist.
    fn new_sequential_file(&self, fname: &str) -> Result<Box<dyn SequentialFile>>;

    /// Returns true iff the named file exists.
    fn file_exists(&self, fname: &str) -> bool;

    /// Returns the size of the named file.
    fn get_file_size(&self, fname: &str) -> Result<u64>;

    /// Delete the named file.
    fn remove_file(&self, fname: &str) -> Result<()>;

    /// Create the specified directory (and any missing parents).
    fn create_dir(&self, dirname: &str) -> Result<()>;
}

/// A file abstraction for sequential writing.  The implementation
/// must provide buffering since callers may append small fragments
/// at a time to the file.
pub trait WritableFile {
    fn append(&mut self, data: &[u8]) -> Result<()>;
    fn close(&mut self) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn sync(&mut self) -> Result<()>;
}

/// A file abstraction for reading sequentially through a file.
pub trait SequentialFile {
    /// Read up to `scratch.len()` bytes from the file.  Returns the number
    /// of bytes read; fewer than requested only at end of file.
    fn read(&mut self, scratch: &mut [u8]) -> Result<usize>;

    /// Skip "n" bytes from the file.  This is guaranteed to be no
    /// slower that reading the same data, but may be faster.
    ///
    /// If end of file is reached, skipping will stop at the end of the
    /// file, and Skip will return OK.
    fn skip(&mut self, n: u64) -> Result<()>;
}

impl<T: WritableFile + ?Sized> WritableFile for Box<T> {
    fn append(&mut self, data: &[u8]) -> Result<()> {
        (**self).append(data)
    }
    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
    fn sync(&mut self) -> Result<()> {
        (**self).sync()
    }
}

/// In-memory sink: appended bytes accumulate in the vector.
///
/// `Vec::append` is an inherent method, so on a concrete `Vec<u8>` the
/// call `sink.append(data)` does not reach this impl.  Call it as
/// `WritableFile::append(&mut sink, data)` or through a generic or
/// `dyn WritableFile` binding.
impl WritableFile for Vec<u8> {
    fn append(&mut self, data: &[u8]) -> Result<()> {
        self.extend_from_slice(data);
        Ok(())
    }
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
    fn sync(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T: SequentialFile + ?Sized> SequentialFile for Box<T> {
    fn read(&mut self, scratch: &mut [u8]) -> Result<usize> {
        (**self).read(scratch)
    }
    fn skip(&mut self, n: u64) -> Result<()> {
        (**self).skip(n)
    }
}

/// In-memory source over any byte buffer.
impl<T: AsRef<[u8]>> SequentialFile for Cursor<T> {
    fn read(&mut self, scratch: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < scratch.len() {
            let n = Read::read(self, &mut scratch[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }

    fn skip(&mut self, n: u64) -> Result<()> {
        let len = self.get_ref().as_ref().len() as u64;
        let target = self.position().saturating_add(n).min(len);
        self.seek(SeekFrom::Start(target))?;
        Ok(())
    }
}
