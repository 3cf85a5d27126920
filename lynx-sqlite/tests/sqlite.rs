#[cfg(test)]
mod tests {
    use lynx_sqlite::SqliteDriver;
    use lynx_tests::{execute_tests, init_logs};
    use std::{fs, path::Path, sync::Arc, sync::Mutex};

    static MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn sqlite() {
        init_logs();
        const DB_PATH: &'static str = "../target/debug/tests.sqlite";
        let _guard = MUTEX.lock().unwrap();
        if Path::new(DB_PATH).exists() {
            fs::remove_file(DB_PATH).expect(
                format!("Failed to remove existing test database file {}", DB_PATH).as_str(),
            );
        }
        assert!(
            !Path::new(DB_PATH).exists(),
            "Database file should not exist before test"
        );
        execute_tests(
            Arc::new(SqliteDriver::new()),
            &format!("sqlite://{}?mode=rwc", DB_PATH),
        );
        assert!(
            Path::new(DB_PATH).exists(),
            "Database file should be created after connection"
        );
    }
}
