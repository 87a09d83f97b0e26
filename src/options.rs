/// Options to control how log files are opened for writing and reading.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// If true, recovery stops at the first corruption reported by the log
    /// reader and returns it as an error.  Otherwise corrupted regions are
    /// dropped and recovery continues.  Checksums are always verified.
    /// Default: false
    pub paranoid_checks: bool,

    /// If true, an existing log file is reopened for append instead of
    /// being truncated, and the writer resumes at the file's current
    /// block offset.
    /// Default: false
    pub reuse_logs: bool,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_test() {
        let options = Options::new();
        assert!(!options.paranoid_checks);
        assert!(!options.reuse_logs);
    }
}
