//! File names used by the log layer.

pub fn log_file_name(dbname: &str, number: u64) -> String {
    assert!(number > 0);
    format!("{}/{:06}.log", dbname, number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_name_test() {
        assert_eq!(log_file_name("test", 7), "test/000007.log");
        assert_eq!(log_file_name("test", 1234567), "test/1234567.log");
    }

    #[test]
    #[should_panic]
    fn zero_file_number_test() {
        log_file_name("test", 0);
    }
}
