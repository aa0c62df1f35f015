//! Database schema for the SQLite sink

/// SQL schema for the records table
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS books (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT,
    price TEXT,
    availability TEXT,
    rating TEXT
);
"#;

/// Inserts one record, fields in column order
pub const INSERT_RECORD_SQL: &str =
    "INSERT INTO books (title, price, availability, rating) VALUES (?1, ?2, ?3, ?4)";

/// Initializes the database schema
///
/// Safe to run against an existing database: rows already present are kept.
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
