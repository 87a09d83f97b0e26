use tracing::{debug, warn};

use crate::{
    env::WritableFile,
    status::{Result, Status},
    util::{
        coding::{encode_fixed16, encode_fixed32},
        crc32c::{extend, mask},
    },
};

use super::log_format::{RecordType, BLOCK_SIZE, HEADER_SIZE, MAX_RECORD_TYPE, TYPE_CRC};

// Trailer filler; a trailer is always shorter than a header.
const ZEROES: [u8; HEADER_SIZE - 1] = [0; HEADER_SIZE - 1];

pub struct Writer<W: WritableFile> {
    dest: W,
    block_offset: usize, // Current offset in block

    // crc32c values for all supported record types.
    type_crc: [u32; MAX_RECORD_TYPE as usize + 1],
}

impl<W: WritableFile> Writer<W> {
    /// Create a writer that will append data to "dest".
    /// "dest" must be initially empty.
    pub fn new(dest: W) -> Self {
        Self { dest, block_offset: 0, type_crc: *TYPE_CRC }
    }

    /// Create a writer that will append data to "dest".
    /// "dest" must have initial length "dest_length".
    pub fn new_with_dest_length(dest: W, dest_length: u64) -> Self {
        let block_offset = (dest_length % BLOCK_SIZE as u64) as usize;
        if block_offset != 0 {
            debug!(dest_length, block_offset, "resuming log in the middle of a block");
        }
        Self { dest, block_offset, type_crc: *TYPE_CRC }
    }

    /// Fragment "slice" into physical records and append them to the
    /// destination, flushing after each one.
    ///
    /// On error the tail of the destination is indeterminate; the reader
    /// treats a torn final record as end of log.
    pub fn add_record(&mut self, slice: &[u8]) -> Result<()> {
        let mut left = slice;

        // Fragment the record if necessary and emit it.  Note that if slice
        // is empty, we still want to iterate once to emit a single
        // zero-length record
        let mut begin = true;
        loop {
            let leftover = BLOCK_SIZE - self.block_offset;
            if leftover < HEADER_SIZE {
                // Switch to a new block
                self.block_offset = 0;
                if leftover > 0 {
                    debug!(leftover, "padding block trailer");
                    self.dest.append(&ZEROES[..leftover]).map_err(|e| {
                        warn!(error = %e, "failed to write block trailer");
                        e
                    })?;
                }
            }

            // Invariant: we never leave < HEADER_SIZE bytes in a block.
            debug_assert!(BLOCK_SIZE - self.block_offset >= HEADER_SIZE);

            let avail = BLOCK_SIZE - self.block_offset - HEADER_SIZE;
            let fragment_length = left.len().min(avail);
            let end = left.len() == fragment_length;

            let t = match (begin, end) {
                (true, true) => RecordType::Full,
                (true, false) => RecordType::First,
                (false, true) => RecordType::Last,
                (false, false) => RecordType::Middle,
            };

            let (fragment, rest) = left.split_at(fragment_length);
            self.emit_physical_record(t, fragment).map_err(|e| {
                warn!(error = %e, record_type = ?t, len = fragment_length, "failed to emit log record");
                e
            })?;
            left = rest;
            begin = false;

            if left.is_empty() {
                return Ok(());
            }
        }
    }

    /// Force the destination to stable storage.
    pub fn sync(&mut self) -> Result<()> {
        self.dest.sync()
    }

    pub fn block_offset(&self) -> usize {
        self.block_offset
    }

    pub fn dest(&self) -> &W {
        &self.dest
    }

    pub fn into_dest(self) -> W {
        self.dest
    }

    fn emit_physical_record(&mut self, t: RecordType, data: &[u8]) -> Result<()> {
        let n = data.len();
        // Must fit in two bytes
        let length = u16::try_from(n).map_err(|_| {
            Status::invalid_argument("log record fragment too large", &n.to_string())
        })?;
        debug_assert!(self.block_offset + HEADER_SIZE + n <= BLOCK_SIZE);

        // Compute the crc of the record type and the payload.
        let crc = mask(extend(self.type_crc[t as usize], data)); // Adjust for storage

        // Format the header
        let mut buf = [0u8; HEADER_SIZE];
        buf[..4].copy_from_slice(&encode_fixed32(crc));
        buf[4..6].copy_from_slice(&encode_fixed16(length));
        buf[6] = t as u8;

        // The offset tracks the intended position even if the write fails.
        self.block_offset += HEADER_SIZE + n;

        // Write the header and the payload
        self.dest.append(&buf)?;
        self.dest.append(data)?;
        self.dest.flush()
    }
}
