//! File-system backed Env built on `std::fs`.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::debug;

use crate::env::{Env, SequentialFile, WritableFile};
use crate::status::{Result, Status};

const WRITABLE_FILE_BUFFER_SIZE: usize = 65536;

#[derive(Debug, Default, Clone, Copy)]
pub struct PosixEnv;

impl PosixEnv {
    pub fn new() -> Self {
        Self
    }
}

impl Env for PosixEnv {
    fn new_writable_file(&self, fname: &str) -> Result<Box<dyn WritableFile>> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(fname)
            .map_err(|e| Status::from_io(fname, e))?;
        Ok(Box::new(PosixWritableFile::new(fname, file)))
    }

    fn new_appendable_file(&self, fname: &str) -> Result<Box<dyn WritableFile>> {
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(fname)
            .map_err(|e| Status::from_io(fname, e))?;
        Ok(Box::new(PosixWritableFile::new(fname, file)))
    }

    fn new_sequential_file(&self, fname: &str) -> Result<Box<dyn SequentialFile>> {
        match File::open(fname) {
            Ok(file) => Ok(Box::new(PosixSequentialFile { filename: fname.to_string(), file })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Status::not_found(fname, &e.to_string()))
            }
            Err(e) => Err(Status::from_io(fname, e)),
        }
    }

    fn file_exists(&self, fname: &str) -> bool {
        Path::new(fname).exists()
    }

    fn get_file_size(&self, fname: &str) -> Result<u64> {
        let meta = fs::metadata(fname).map_err(|e| Status::from_io(fname, e))?;
        Ok(meta.len())
    }

    fn remove_file(&self, fname: &str) -> Result<()> {
        fs::remove_file(fname).map_err(|e| Status::from_io(fname, e))?;
        debug!(file = fname, "removed file");
        Ok(())
    }

    fn create_dir(&self, dirname: &str) -> Result<()> {
        fs::create_dir_all(dirname).map_err(|e| Status::from_io(dirname, e))
    }
}

/// Buffers appends in user space; `flush` hands the buffer to the OS
/// and `sync` additionally forces it to stable storage.
pub struct PosixWritableFile {
    filename: String,
    file: Option<File>,
    buf: Vec<u8>,
}

impl PosixWritableFile {
    fn new(filename: &str, file: File) -> Self {
        Self {
            filename: filename.to_string(),
            file: Some(file),
            buf: Vec::with_capacity(WRITABLE_FILE_BUFFER_SIZE),
        }
    }

    fn file(&mut self) -> Result<&mut File> {
        match self.file.as_mut() {
            Some(f) => Ok(f),
            None => Err(Status::io_error(&self.filename, "file already closed")),
        }
    }

    fn flush_buffer(&mut self) -> Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let buf = std::mem::take(&mut self.buf);
        let res = self.write_unbuffered(&buf);
        self.buf = buf;
        self.buf.clear();
        res
    }

    fn write_unbuffered(&mut self, data: &[u8]) -> Result<()> {
        let filename = self.filename.clone();
        self.file()?.write_all(data).map_err(|e| Status::from_io(&filename, e))
    }
}

impl WritableFile for PosixWritableFile {
    fn append(&mut self, data: &[u8]) -> Result<()> {
        // Fit as much as possible into the buffer.
        let copy = data.len().min(WRITABLE_FILE_BUFFER_SIZE - self.buf.len());
        self.buf.extend_from_slice(&data[..copy]);
        let rest = &data[copy..];
        if rest.is_empty() {
            return Ok(());
        }

        // Can't fit the rest in the buffer: flush it, then either buffer
        // the remainder or write it straight through.
        self.flush_buffer()?;
        if rest.len() < WRITABLE_FILE_BUFFER_SIZE {
            self.buf.extend_from_slice(rest);
            return Ok(());
        }
        self.write_unbuffered(rest)
    }

    fn close(&mut self) -> Result<()> {
        if self.file.is_none() {
            return Ok(());
        }
        let res = self.flush_buffer();
        self.file = None;
        res
    }

    fn flush(&mut self) -> Result<()> {
        self.flush_buffer()
    }

    fn sync(&mut self) -> Result<()> {
        self.flush_buffer()?;
        let filename = self.filename.clone();
        self.file()?.sync_data().map_err(|e| Status::from_io(&filename, e))
    }
}

impl Drop for PosixWritableFile {
    fn drop(&mut self) {
        if self.file.is_some() {
            // Ignoring any potential errors
            let _ = self.close();
        }
    }
}

pub struct PosixSequentialFile {
    filename: String,
    file: File,
}

impl SequentialFile for PosixSequentialFile {
    fn read(&mut self, scratch: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < scratch.len() {
            match self.file.read(&mut scratch[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Status::from_io(&self.filename, e)),
            }
        }
        Ok(filled)
    }

    fn skip(&mut self, n: u64) -> Result<()> {
        let offset = i64::try_from(n)
            .map_err(|_| Status::invalid_argument(&self.filename, "skip distance too large"))?;
        self.file
            .seek(SeekFrom::Current(offset))
            .map_err(|e| Status::from_io(&self.filename, e))?;
        Ok(())
    }
}
