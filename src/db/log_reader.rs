use std::{cell::RefCell, rc::Rc};

use tracing::{debug, warn};

use crate::{
    env::SequentialFile,
    status::Status,
    util::{
        coding::{decode_fixed16, decode_fixed32},
        crc32c::{unmask, value},
    },
};

use super::log_format::{RecordType, BLOCK_SIZE, HEADER_SIZE};

/// Interface for reporting errors.
pub trait Reporter {
    /// Some corruption was detected.  "bytes" is the approximate number
    /// of bytes dropped due to the corruption.
    fn corruption(&mut self, bytes: usize, status: &Status);
}

/// A reporter shared with the caller, so it can be inspected while the
/// reader owns its handle.
impl<R: Reporter> Reporter for Rc<RefCell<R>> {
    fn corruption(&mut self, bytes: usize, status: &Status) {
        self.borrow_mut().corruption(bytes, status);
    }
}

/// Reporter that logs every dropped region and remembers the first error.
pub struct LogReporter {
    fname: String,
    first_error: Option<Status>,
}

impl LogReporter {
    pub fn new(fname: &str) -> Self {
        Self { fname: fname.to_string(), first_error: None }
    }

    /// The first corruption reported, if any.
    pub fn first_error(&self) -> Option<&Status> {
        self.first_error.as_ref()
    }

    pub fn take_first_error(&mut self) -> Option<Status> {
        self.first_error.take()
    }
}

impl Reporter for LogReporter {
    fn corruption(&mut self, bytes: usize, status: &Status) {
        warn!(file = %self.fname, bytes, error = %status, "dropping log bytes");
        if self.first_error.is_none() {
            // Status holds an io::Error, which is not Clone.
            let msg = format!("{}: dropped {} bytes", self.fname, bytes);
            self.first_error = Some(match status {
                Status::IoError { .. } => Status::io_error(&msg, &status.to_string()),
                _ => Status::corruption(&msg, &status.to_string()),
            });
        }
    }
}

enum PhysicalRecord {
    // Type byte and the payload's position in the backing store.
    Record { t: u8, start: usize, len: usize },
    Eof,
    // Returned whenever we find an invalid physical record.
    // Currently there are three situations in which this happens:
    // * The record has an invalid CRC (read_physical_record reports a drop)
    // * The record is a 0-length record (No drop is reported)
    // * The record is below the initial offset (No drop is reported)
    BadRecord,
}

pub struct Reader<F: SequentialFile> {
    file: F,
    reporter: Option<Box<dyn Reporter>>,
    checksum: bool,
    backing_store: Vec<u8>,
    // Unconsumed part of the current block: backing_store[buffer_start..buffer_end]
    buffer_start: usize,
    buffer_end: usize,
    eof: bool, // Last read() indicated EOF by returning < BLOCK_SIZE

    // Offset of the last record returned by read_record.
    last_record_offset: u64,
    // Offset of the first location past the end of the buffer.
    end_of_buffer_offset: u64,

    // Offset at which to start looking for the first record to return
    initial_offset: u64,

    // True if we are resynchronizing after a seek (initial_offset > 0). In
    // particular, a run of Middle and Last records can be silently skipped
    // in this mode
    resyncing: bool,
}

impl<F: SequentialFile> Reader<F> {
    /// Create a reader that will return log records from "file".
    ///
    /// If "reporter" is present, it is notified whenever some data is
    /// dropped due to a detected corruption.
    ///
    /// If "checksum" is true, verify checksums if available.
    ///
    /// The Reader will start reading at the first record located at physical
    /// position >= initial_offset within the file.
    pub fn new(file: F, reporter: Option<Box<dyn Reporter>>, checksum: bool, initial_offset: u64) -> Self {
        Self {
            file,
            reporter,
            checksum,
            backing_store: vec![0u8; BLOCK_SIZE],
            buffer_start: 0,
            buffer_end: 0,
            eof: false,
            last_record_offset: 0,
            end_of_buffer_offset: 0,
            initial_offset,
            resyncing: initial_offset > 0,
        }
    }

    /// Read the next record.  Returns None at end of input.
    pub fn read_record(&mut self) -> Option<Vec<u8>> {
        if self.last_record_offset < self.initial_offset && !self.skip_to_initial_block() {
            return None;
        }

        let mut scratch = Vec::new();
        let mut in_fragmented_record = false;
        // Record offset of the logical record that we're reading
        let mut prospective_record_offset = 0u64;

        loop {
            let record = self.read_physical_record();
            let (t, start, len) = match record {
                PhysicalRecord::Record { t, start, len } => (Some(t), start, len),
                _ => (None, 0, 0),
            };

            // read_physical_record may have only had an empty trailer remaining
            // in its internal buffer.  Calculate the offset of the next physical
            // record now that it has returned, properly accounting for its
            // header size.
            let physical_record_offset = self
                .end_of_buffer_offset
                .wrapping_sub(self.buffer_len() as u64)
                .wrapping_sub(HEADER_SIZE as u64)
                .wrapping_sub(len as u64);

            if self.resyncing {
                match t.and_then(RecordType::from_u8) {
                    Some(RecordType::Middle) => continue,
                    Some(RecordType::Last) => {
                        self.resyncing = false;
                        continue;
                    }
                    _ => self.resyncing = false,
                }
            }

            match record {
                PhysicalRecord::Eof => {
                    // This can be caused by the writer dying immediately after
                    // writing a physical record but before completing the next;
                    // don't treat it as a corruption, just ignore the entire
                    // logical record.
                    return None;
                }
                PhysicalRecord::BadRecord => {
                    if in_fragmented_record {
                        self.report_corruption(scratch.len(), "error in middle of record");
                        in_fragmented_record = false;
                        scratch.clear();
                    }
                }
                PhysicalRecord::Record { t, .. } => {
                    match RecordType::from_u8(t) {
                        Some(RecordType::Full) => {
                            if in_fragmented_record && !scratch.is_empty() {
                                // An empty First fragment at the tail end of a
                                // block is not a partial record.
                                self.report_corruption(scratch.len(), "partial record without end(1)");
                            }
                            let record = self.backing_store[start..start + len].to_vec();
                            self.last_record_offset = physical_record_offset;
                            return Some(record);
                        }
                        Some(RecordType::First) => {
                            if in_fragmented_record && !scratch.is_empty() {
                                self.report_corruption(scratch.len(), "partial record without end(2)");
                            }
                            prospective_record_offset = physical_record_offset;
                            scratch.clear();
                            scratch.extend_from_slice(&self.backing_store[start..start + len]);
                            in_fragmented_record = true;
                        }
                        Some(RecordType::Middle) => {
                            if !in_fragmented_record {
                                self.report_corruption(len, "missing start of fragmented record(1)");
                            } else {
                                scratch.extend_from_slice(&self.backing_store[start..start + len]);
                            }
                        }
                        Some(RecordType::Last) => {
                            if !in_fragmented_record {
                                self.report_corruption(len, "missing start of fragmented record(2)");
                            } else {
                                scratch.extend_from_slice(&self.backing_store[start..start + len]);
                                self.last_record_offset = prospective_record_offset;
                                return Some(scratch);
                            }
                        }
                        _ => {
                            let dropped = len + if in_fragmented_record { scratch.len() } else { 0 };
                            self.report_corruption(dropped, &format!("unknown record type {}", t));
                            in_fragmented_record = false;
                            scratch.clear();
                        }
                    }
                }
            }
        }
    }

    /// Returns the physical offset of the last record returned by read_record.
    ///
    /// Undefined before the first call to read_record.
    pub fn last_record_offset(&self) -> u64 {
        self.last_record_offset
    }

    pub fn into_file(self) -> F {
        self.file
    }

    fn buffer_len(&self) -> usize {
        self.buffer_end - self.buffer_start
    }

    fn clear_buffer(&mut self) {
        self.buffer_start = 0;
        self.buffer_end = 0;
    }

    /// Skips all blocks that are completely before "initial_offset".
    ///
    /// Returns true on success. Handles reporting.
    fn skip_to_initial_block(&mut self) -> bool {
        let offset_in_block = self.initial_offset % BLOCK_SIZE as u64;
        let mut block_start_location = self.initial_offset - offset_in_block;

        // Don't search a block if we'd be in the trailer
        if offset_in_block > (BLOCK_SIZE - 6) as u64 {
            block_start_location += BLOCK_SIZE as u64;
        }

        self.end_of_buffer_offset = block_start_location;

        // Skip to start of first block that can contain the initial record
        if block_start_location > 0 {
            debug!(initial_offset = self.initial_offset, block_start_location, "skipping to initial block");
            if let Err(e) = self.file.skip(block_start_location) {
                self.report_drop(block_start_location as usize, &e);
                return false;
            }
        }

        true
    }

    fn read_physical_record(&mut self) -> PhysicalRecord {
        loop {
            if self.buffer_len() < HEADER_SIZE {
                if !self.eof {
                    // Last read was a full read, so this is a trailer to skip
                    self.clear_buffer();
                    match self.file.read(&mut self.backing_store) {
                        Ok(n) => {
                            self.buffer_end = n;
                            self.end_of_buffer_offset += n as u64;
                            if n < BLOCK_SIZE {
                                self.eof = true;
                            }
                        }
                        Err(e) => {
                            self.report_drop(BLOCK_SIZE, &e);
                            self.eof = true;
                            return PhysicalRecord::Eof;
                        }
                    }
                    continue;
                } else {
                    // Note that if buffer is non-empty, we have a truncated header at the
                    // end of the file, which can be caused by the writer crashing in the
                    // middle of writing the header. Instead of considering this an error,
                    // just report EOF.
                    self.clear_buffer();
                    return PhysicalRecord::Eof;
                }
            }

            // Parse the header
            let header = &self.backing_store[self.buffer_start..self.buffer_start + HEADER_SIZE];
            let length = decode_fixed16(&header[4..]) as usize;
            let t = header[6];
            let expected_crc = unmask(decode_fixed32(header));

            if HEADER_SIZE + length > self.buffer_len() {
                let drop_size = self.buffer_len();
                self.clear_buffer();
                if !self.eof {
                    self.report_corruption(drop_size, "bad record length");
                    return PhysicalRecord::BadRecord;
                }
                // If the end of the file has been reached without reading |length| bytes
                // of payload, assume the writer died in the middle of writing the record.
                // Don't report a corruption.
                return PhysicalRecord::Eof;
            }

            if t == RecordType::Zero as u8 && length == 0 {
                // Skip zero length record without reporting any drops since
                // such records are produced by writers that preallocate file
                // regions.
                self.clear_buffer();
                return PhysicalRecord::BadRecord;
            }

            // Check crc
            if self.checksum {
                let covered = &self.backing_store[self.buffer_start + 6..self.buffer_start + HEADER_SIZE + length];
                if value(covered) != expected_crc {
                    // Drop the rest of the buffer since "length" itself may have
                    // been corrupted and if we trust it, we could find some
                    // fragment of a real log record that just happens to look
                    // like a valid log record.
                    let drop_size = self.buffer_len();
                    self.clear_buffer();
                    self.report_corruption(drop_size, "checksum mismatch");
                    return PhysicalRecord::BadRecord;
                }
            }

            let start = self.buffer_start + HEADER_SIZE;
            self.buffer_start += HEADER_SIZE + length;

            // Skip physical record that started before initial_offset
            let record_offset =
                self.end_of_buffer_offset - self.buffer_len() as u64 - HEADER_SIZE as u64 - length as u64;
            if record_offset < self.initial_offset {
                return PhysicalRecord::BadRecord;
            }

            return PhysicalRecord::Record { t, start, len: length };
        }
    }

    /// Reports dropped bytes to the reporter.
    fn report_corruption(&mut self, bytes: usize, reason: &str) {
        self.report_drop(bytes, &Status::corruption(reason, ""));
    }

    fn report_drop(&mut self, bytes: usize, reason: &Status) {
        let dropped_from = self
            .end_of_buffer_offset
            .wrapping_sub(self.buffer_len() as u64)
            .wrapping_sub(bytes as u64);
        if dropped_from >= self.initial_offset {
            if let Some(reporter) = self.reporter.as_mut() {
                reporter.corruption(bytes, reason);
            }
        }
    }
}
