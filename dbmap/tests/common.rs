use dbmap::{Handle, sqlite::SqliteDriver};

/// Key value pairs stored in the `kv` table by [`key_value_store`].
pub const TEST_MAP: [(&str, &str); 4] = [
    ("speed", "88mph"),
    ("power", "1.21 gigawatts"),
    ("make", "DeLorean"),
    ("destination", "1985"),
];

/// Handle to a fresh in-memory database. Also routes log output of the library to the test
/// harness.
pub fn handle() -> Handle<SqliteDriver> {
    let _ = env_logger::builder().is_test(true).try_init();
    Handle::new(SqliteDriver::open_in_memory().unwrap())
}

/// In-memory database with a table `kv` holding the entries of [`TEST_MAP`].
pub fn key_value_store() -> Result<Handle<SqliteDriver>, dbmap::Error> {
    let handle = handle();
    handle.execute("CREATE TABLE kv (k VARCHAR, v VARCHAR)", ())?;
    for (key, value) in TEST_MAP {
        handle.execute("INSERT INTO kv VALUES (?, ?)", (key, value))?;
    }
    Ok(handle)
}
