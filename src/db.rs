use rusqlite::Connection;
use std::path::Path;

pub const DB_FILE: &str = "rollcall.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(db_path)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_store(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;

    Ok(conn)
}
