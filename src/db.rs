pub mod filename;
pub mod log_format;
pub mod log_reader;
pub mod log_writer;


use std::{cell::RefCell, rc::Rc};

use tracing::{debug, info};

use crate::{
    env::{Env, SequentialFile, WritableFile},
    options::Options,
    status::{Result, Status},
};

use self::{
    filename::log_file_name,
    log_reader::{LogReporter, Reader, Reporter},
    log_writer::Writer,
};

fn checked_log_file_name(dbname: &str, number: u64) -> Result<String> {
    if number == 0 {
        return Err(Status::invalid_argument(dbname, "log file number must be positive"));
    }
    Ok(log_file_name(dbname, number))
}

/// Open log file "number" under "dbname" for writing.
///
/// If `options.reuse_logs` is set and the file already exists, new
/// records are appended after its current contents.  Otherwise the file
/// is created (or truncated) and the writer starts at offset 0.
pub fn new_log_writer(
    env: &dyn Env,
    options: &Options,
    dbname: &str,
    number: u64,
) -> Result<Writer<Box<dyn WritableFile>>> {
    let fname = checked_log_file_name(dbname, number)?;
    if options.reuse_logs && env.file_exists(&fname) {
        let size = env.get_file_size(&fname)?;
        let file = env.new_appendable_file(&fname)?;
        debug!(file = %fname, size, "reusing log file");
        return Ok(Writer::new_with_dest_length(file, size));
    }
    let file = env.new_writable_file(&fname)?;
    debug!(file = %fname, "created log file");
    Ok(Writer::new(file))
}

/// Open log file "number" under "dbname" for reading from the start.
/// Checksums are always verified; corrupted regions are dropped and
/// reported to "reporter".
pub fn new_log_reader(
    env: &dyn Env,
    _options: &Options,
    dbname: &str,
    number: u64,
    reporter: Option<Box<dyn Reporter>>,
) -> Result<Reader<Box<dyn SequentialFile>>> {
    let fname = checked_log_file_name(dbname, number)?;
    let file = env.new_sequential_file(&fname)?;
    Ok(Reader::new(file, reporter, true, 0))
}

/// Read every record of log file "number", handing each to "f" in order.
/// Returns the number of records delivered.
///
/// With `options.paranoid_checks` set, the first corruption found stops
/// recovery and is returned.  Otherwise damaged regions are logged and
/// skipped.
pub fn recover_log<F>(env: &dyn Env, options: &Options, dbname: &str, number: u64, mut f: F) -> Result<usize>
where
    F: FnMut(Vec<u8>) -> Result<()>,
{
    let fname = checked_log_file_name(dbname, number)?;
    let reporter = Rc::new(RefCell::new(LogReporter::new(&fname)));
    let mut reader = new_log_reader(env, options, dbname, number, Some(Box::new(reporter.clone())))?;
    info!(file = %fname, "recovering log");

    let mut count = 0;
    loop {
        if options.paranoid_checks {
            if let Some(err) = reporter.borrow_mut().take_first_error() {
                return Err(err);
            }
        }
        match reader.read_record() {
            Some(record) => {
                f(record)?;
                count += 1;
            }
            None => break,
        }
    }
    if options.paranoid_checks {
        if let Some(err) = reporter.borrow_mut().take_first_error() {
            return Err(err);
        }
    }
    Ok(count)
}
