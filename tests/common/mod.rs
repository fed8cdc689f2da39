// Every storage test gets its own database file, removed afterwards even
// when the test panics.
macro_rules! storage_test {(
    fn $fname:ident ($storage:ident : &SqliteStorage)
    $body:block
) => {
    #[test]
    fn $fname () {
        fn __storage_test_body__ ($storage: &SqliteStorage)
        $body

        let path = std::env::temp_dir()
            .join(format!("mtgdms-{}-{}.sqlite3", std::process::id(), stringify!($fname)));
        let _ = std::fs::remove_file(&path);
        let result = std::panic::catch_unwind(|| {
            let storage = SqliteStorage::open(&path).unwrap();
            __storage_test_body__(&storage);
        });
        std::fs::remove_file(&path).unwrap();
        if let Err(e) = result {
            std::panic::resume_unwind(e);
        }
    }
}}
