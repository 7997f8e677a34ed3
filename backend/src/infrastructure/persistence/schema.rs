use crate::domain::Alias;
use rusqlite::{params, Connection, Result};

/// Initialize the SQLite database with the required schema.
/// This function is idempotent and can be safely called multiple times.
pub fn initialize_database(conn: &Connection) -> Result<()> {
    // Enable foreign key constraints
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    // Content types and containers share one id space
    conn.execute(
        "CREATE TABLE IF NOT EXISTS nodes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            unique_id TEXT NOT NULL UNIQUE,
            object_type TEXT NOT NULL,
            parent_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            alias TEXT,
            alias_key TEXT,
            is_container INTEGER NOT NULL DEFAULT 0,
            extra TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_nodes_parent ON nodes(parent_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_nodes_object_type ON nodes(object_type)",
        [],
    )?;

    migrate_alias_key(conn)?;

    // Aliases are unique across every content type family, ignoring case.
    // SQLite only folds ASCII, so the folded key is computed on write.
    conn.execute("DROP INDEX IF EXISTS idx_nodes_alias", [])?;
    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_nodes_alias_key ON nodes(alias_key) WHERE alias_key IS NOT NULL",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS node_compositions (
            type_id INTEGER NOT NULL,
            composed_id INTEGER NOT NULL,
            PRIMARY KEY (type_id, composed_id),
            FOREIGN KEY (type_id) REFERENCES nodes(id) ON DELETE CASCADE,
            FOREIGN KEY (composed_id) REFERENCES nodes(id) ON DELETE CASCADE
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_compositions_composed ON node_compositions(composed_id)",
        [],
    )?;

    Ok(())
}

/// Add and backfill `alias_key` on databases created before it existed
fn migrate_alias_key(conn: &Connection) -> Result<()> {
    let has_column: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM pragma_table_info('nodes') WHERE name = 'alias_key'",
        [],
        |row| row.get(0),
    )?;
    if !has_column {
        conn.execute("ALTER TABLE nodes ADD COLUMN alias_key TEXT", [])?;
    }

    let pending = conn
        .prepare("SELECT id, alias FROM nodes WHERE alias IS NOT NULL AND alias_key IS NULL")?
        .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>>>()?;
    for (id, alias) in pending {
        conn.execute(
            "UPDATE nodes SET alias_key = ?1 WHERE id = ?2",
            params![Alias::normalize(&alias), id],
        )?;
    }
    Ok(())
}
