use crate::application::repositories::{NodeCommand, NodeQuery, NodeRow, NodeStore};
use crate::domain::{Alias, DomainError, DomainResult, NodeId, ObjectType};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::types::{Type, Value as SqlValue};
use rusqlite::{params, params_from_iter, Connection, ErrorCode, Result as SqliteResult, Row, Transaction};
use serde_json::Value;
use uuid::Uuid;

const NODE_COLUMNS: &str = "id, unique_id, object_type, parent_id, name, alias, is_container, extra, created_at, updated_at";

/// SQLite-based implementation of the NodeStore trait
pub struct SqliteNodeStore {
    conn: Mutex<Connection>,
}

impl SqliteNodeStore {
    /// Create a new SQLite store with the given connection
    pub fn new(conn: Connection) -> Self {
        SqliteNodeStore {
            conn: Mutex::new(conn),
        }
    }

    /// Create a new in-memory SQLite store (useful for testing)
    pub fn new_in_memory() -> SqliteResult<Self> {
        let conn = Connection::open_in_memory()?;
        super::schema::initialize_database(&conn)?;
        Ok(SqliteNodeStore::new(conn))
    }

    /// Create a new file-based SQLite store
    pub fn new_with_path(path: impl AsRef<std::path::Path>) -> SqliteResult<Self> {
        let conn = Connection::open(path)?;
        super::schema::initialize_database(&conn)?;
        Ok(SqliteNodeStore::new(conn))
    }

    fn load_rows(&self, query: &NodeQuery) -> SqliteResult<Vec<NodeRow>> {
        let (clause, values) = where_clause(query);
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM nodes WHERE {} ORDER BY id",
            NODE_COLUMNS, clause
        ))?;
        let mut rows = stmt
            .query_map(params_from_iter(values), row_to_node)?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut composition_stmt = conn.prepare(
            "SELECT composed_id FROM node_compositions WHERE type_id = ?1 ORDER BY composed_id",
        )?;
        for row in &mut rows {
            row.composition_ids = composition_stmt
                .query_map(params![row.id.value()], |r| Ok(NodeId::new(r.get(0)?)))?
                .collect::<SqliteResult<Vec<_>>>()?;
        }

        Ok(rows)
    }

    fn count_rows(&self, query: &NodeQuery) -> SqliteResult<usize> {
        let (clause, values) = where_clause(query);
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM nodes WHERE {}", clause),
            params_from_iter(values),
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn insert_transaction(&self, row: &NodeRow) -> SqliteResult<NodeId> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO nodes (unique_id, object_type, parent_id, name, alias, alias_key, is_container, extra, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                row.key.hyphenated().to_string(),
                row.object_type.as_uuid().hyphenated().to_string(),
                row.parent_id.value(),
                row.name,
                row.alias,
                alias_key(row),
                row.is_container,
                extra_column(&row.extra),
                row.created_at.to_rfc3339(),
                row.updated_at.to_rfc3339(),
            ],
        )?;
        let rowid = tx.last_insert_rowid();
        let id = i32::try_from(rowid)
            .map(NodeId::new)
            .map_err(|_| rusqlite::Error::IntegralValueOutOfRange(0, rowid))?;
        write_compositions(&tx, id, &row.composition_ids)?;

        tx.commit()?;
        Ok(id)
    }

    fn update_transaction(&self, row: &NodeRow) -> SqliteResult<usize> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let affected = tx.execute(
            "UPDATE nodes
             SET unique_id = ?1, object_type = ?2, parent_id = ?3, name = ?4, alias = ?5,
                 alias_key = ?6, is_container = ?7, extra = ?8, updated_at = ?9
             WHERE id = ?10",
            params![
                row.key.hyphenated().to_string(),
                row.object_type.as_uuid().hyphenated().to_string(),
                row.parent_id.value(),
                row.name,
                row.alias,
                alias_key(row),
                row.is_container,
                extra_column(&row.extra),
                row.updated_at.to_rfc3339(),
                row.id.value(),
            ],
        )?;
        if affected > 0 {
            tx.execute(
                "DELETE FROM node_compositions WHERE type_id = ?1",
                params![row.id.value()],
            )?;
            write_compositions(&tx, row.id, &row.composition_ids)?;
        }

        tx.commit()?;
        Ok(affected)
    }

    fn delete_transaction(&self, id: NodeId) -> SqliteResult<usize> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM node_compositions WHERE type_id = ?1 OR composed_id = ?1",
            params![id.value()],
        )?;
        let affected = tx.execute("DELETE FROM nodes WHERE id = ?1", params![id.value()])?;

        tx.commit()?;
        Ok(affected)
    }
}

impl NodeStore for SqliteNodeStore {
    fn find(&self, query: &NodeQuery) -> DomainResult<Vec<NodeRow>> {
        self.load_rows(query).map_err(db_error)
    }

    fn count(&self, query: &NodeQuery) -> DomainResult<usize> {
        self.count_rows(query).map_err(db_error)
    }

    fn insert(&self, row: &NodeRow) -> DomainResult<NodeId> {
        self.insert_transaction(row)
            .map_err(|e| write_error(e, row))
    }

    fn execute(&self, command: &NodeCommand) -> DomainResult<usize> {
        match command {
            NodeCommand::Update(row) => self
                .update_transaction(row)
                .map_err(|e| write_error(e, row)),
            NodeCommand::SetParent { id, parent_id } => {
                let conn = self.conn.lock();
                conn.execute(
                    "UPDATE nodes SET parent_id = ?1, updated_at = ?2 WHERE id = ?3",
                    params![parent_id.value(), Utc::now().to_rfc3339(), id.value()],
                )
                .map_err(db_error)
            }
            NodeCommand::Delete(id) => self.delete_transaction(*id).map_err(db_error),
        }
    }
}

fn where_clause(query: &NodeQuery) -> (&'static str, Vec<SqlValue>) {
    match query {
        NodeQuery::ById(id) => ("id = ?1", vec![SqlValue::Integer(id.value() as i64)]),
        NodeQuery::ByKey(key) => (
            "unique_id = ?1",
            vec![SqlValue::Text(key.hyphenated().to_string())],
        ),
        NodeQuery::ByAlias(alias) => (
            "alias_key = ?1",
            vec![SqlValue::Text(Alias::normalize(alias))],
        ),
        NodeQuery::OfObjectType(object_type) => (
            "object_type = ?1",
            vec![SqlValue::Text(object_type.as_uuid().hyphenated().to_string())],
        ),
        NodeQuery::ChildrenOf(parent_id) => (
            "parent_id = ?1",
            vec![SqlValue::Integer(parent_id.value() as i64)],
        ),
        NodeQuery::ComposedOf(id) => (
            "id IN (SELECT type_id FROM node_compositions WHERE composed_id = ?1)",
            vec![SqlValue::Integer(id.value() as i64)],
        ),
        NodeQuery::AliasStartsWith(prefix) => {
            let prefix = Alias::normalize(prefix);
            let length = prefix.chars().count() as i64;
            (
                "substr(alias_key, 1, ?2) = ?1",
                vec![SqlValue::Text(prefix), SqlValue::Integer(length)],
            )
        }
        NodeQuery::ListViewTypes => ("is_container = 1", Vec::new()),
    }
}

fn alias_key(row: &NodeRow) -> Option<String> {
    row.alias.as_deref().map(Alias::normalize)
}

fn row_to_node(row: &Row) -> SqliteResult<NodeRow> {
    let key: String = row.get(1)?;
    let object_type: String = row.get(2)?;
    let extra: Option<Value> = row.get(7)?;

    Ok(NodeRow {
        id: NodeId::new(row.get(0)?),
        key: Uuid::parse_str(&key).map_err(|e| conversion_error(1, e))?,
        object_type: ObjectType::from_uuid(
            Uuid::parse_str(&object_type).map_err(|e| conversion_error(2, e))?,
        ),
        parent_id: NodeId::new(row.get(3)?),
        name: row.get(4)?,
        alias: row.get(5)?,
        is_container: row.get(6)?,
        composition_ids: Vec::new(),
        extra: extra.unwrap_or(Value::Null),
        created_at: parse_timestamp(row, 8)?,
        updated_at: parse_timestamp(row, 9)?,
    })
}

fn parse_timestamp(row: &Row, column: usize) -> SqliteResult<DateTime<Utc>> {
    let raw: String = row.get(column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, e))
}

fn extra_column(extra: &Value) -> Option<&Value> {
    if extra.is_null() {
        None
    } else {
        Some(extra)
    }
}

fn write_compositions(tx: &Transaction, id: NodeId, composition_ids: &[NodeId]) -> SqliteResult<()> {
    for composed in composition_ids {
        tx.execute(
            "INSERT INTO node_compositions (type_id, composed_id) VALUES (?1, ?2)",
            params![id.value(), composed.value()],
        )?;
    }
    Ok(())
}

fn conversion_error<E>(column: usize, error: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(error))
}

fn db_error(e: rusqlite::Error) -> DomainError {
    DomainError::Storage(format!("Database error: {}", e))
}

/// The unique alias index backs up the repository's own collision check
fn write_error(e: rusqlite::Error, row: &NodeRow) -> DomainError {
    if let rusqlite::Error::SqliteFailure(failure, Some(message)) = &e {
        if failure.code == ErrorCode::ConstraintViolation && message.contains("nodes.alias_key") {
            return DomainError::AliasCollision(row.alias.clone().unwrap_or_default());
        }
    }
    db_error(e)
}
