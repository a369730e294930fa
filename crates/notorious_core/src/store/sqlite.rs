//! SQLite-backed document store.
//!
//! # Responsibility
//! - Persist JSON documents in the `documents` table, one row per document.
//! - Compile `Predicate` trees to SQL over `json_extract` and `json_type`,
//!   binding both the JSON paths and the compared values.
//!
//! # Invariants
//! - `(collection, id)` is unique; violations surface as `DuplicateKey`.
//! - Cursor order is `seq ASC` (insertion order).
//! - `insert_many` is all-or-nothing.
//! - Predicates select exactly what `Predicate::matches` selects in memory.

use super::{document_id, Document, DocumentStore, FindOptions, Predicate, StoreError, StoreResult};
use log::debug;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, ErrorCode};
use serde_json::Value;

const DOCUMENTS_TABLE: &str = "documents";

/// Document store over a migrated connection (see `crate::db::open_db`).
pub struct SqliteDocumentStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDocumentStore<'conn> {
    /// Wraps a connection after checking the documents table exists.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [DOCUMENTS_TABLE],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(StoreError::MissingRequiredTable(DOCUMENTS_TABLE));
        }
        Ok(Self { conn })
    }
}

impl DocumentStore for SqliteDocumentStore<'_> {
    fn insert_many(&self, collection: &str, documents: Vec<Document>) -> StoreResult<()> {
        let count = documents.len();
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3);")?;
            for document in &documents {
                let id = document_id(document)?;
                let body = serde_json::to_string(document)?;
                stmt.execute(params![collection, id, body])
                    .map_err(|err| map_write_error(err, collection, id))?;
            }
        }
        tx.commit()?;

        debug!("event=store_insert module=store backend=sqlite collection={collection} count={count}");
        Ok(())
    }

    fn delete_many(&self, collection: &str, predicate: &Predicate) -> StoreResult<u64> {
        let mut sql = String::from("DELETE FROM documents WHERE collection = ?");
        let mut binds = vec![SqlValue::Text(collection.to_string())];
        push_condition(&mut sql, &mut binds, predicate);

        let changed = self.conn.execute(&sql, params_from_iter(binds))?;
        Ok(changed as u64)
    }

    fn replace_one(
        &self,
        collection: &str,
        predicate: &Predicate,
        document: Document,
    ) -> StoreResult<u64> {
        let id = document_id(&document)?;
        let body = serde_json::to_string(&document)?;

        let mut sql = String::from(
            "UPDATE documents
             SET id = ?, body = ?
             WHERE seq = (
                SELECT seq FROM documents WHERE collection = ?",
        );
        let mut binds = vec![
            SqlValue::Text(id.to_string()),
            SqlValue::Text(body),
            SqlValue::Text(collection.to_string()),
        ];
        push_condition(&mut sql, &mut binds, predicate);
        sql.push_str(" ORDER BY seq ASC LIMIT 1);");

        let changed = self
            .conn
            .execute(&sql, params_from_iter(binds))
            .map_err(|err| map_write_error(err, collection, id))?;
        Ok(changed as u64)
    }

    fn find(
        &self,
        collection: &str,
        predicate: &Predicate,
        options: FindOptions,
    ) -> StoreResult<Vec<Document>> {
        let mut sql = String::from("SELECT body FROM documents WHERE collection = ?");
        let mut binds = vec![SqlValue::Text(collection.to_string())];
        push_condition(&mut sql, &mut binds, predicate);

        // SQLite only accepts OFFSET after LIMIT; -1 means unbounded.
        sql.push_str(" ORDER BY seq ASC LIMIT ? OFFSET ?;");
        binds.push(SqlValue::Integer(
            options.limit.map_or(-1, clamp_to_i64),
        ));
        binds.push(SqlValue::Integer(clamp_to_i64(options.skip)));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            let body: String = row.get(0)?;
            documents.push(serde_json::from_str(&body)?);
        }
        Ok(documents)
    }

    fn count(&self, collection: &str, predicate: &Predicate) -> StoreResult<u64> {
        let mut sql = String::from("SELECT COUNT(*) FROM documents WHERE collection = ?");
        let mut binds = vec![SqlValue::Text(collection.to_string())];
        push_condition(&mut sql, &mut binds, predicate);

        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(binds), |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

fn push_condition(sql: &mut String, binds: &mut Vec<SqlValue>, predicate: &Predicate) {
    if matches!(predicate, Predicate::All) {
        return;
    }
    sql.push_str(" AND ");
    compile_predicate(sql, binds, predicate);
}

fn compile_predicate(sql: &mut String, binds: &mut Vec<SqlValue>, predicate: &Predicate) {
    match predicate {
        Predicate::All => sql.push_str("1 = 1"),
        Predicate::Eq { field, value } => {
            compile_membership(sql, binds, field, std::slice::from_ref(value));
        }
        Predicate::In { field, values } => compile_membership(sql, binds, field, values),
        Predicate::And(parts) if parts.is_empty() => sql.push_str("1 = 1"),
        Predicate::And(parts) => {
            sql.push('(');
            for (idx, part) in parts.iter().enumerate() {
                if idx > 0 {
                    sql.push_str(" AND ");
                }
                compile_predicate(sql, binds, part);
            }
            sql.push(')');
        }
    }
}

/// Matches `field` against `values` with JSON equality.
///
/// Values are grouped by `json_type` so that `1`, `true` and `"1"` stay
/// distinct, and a `null` member matches both JSON `null` and a missing field.
fn compile_membership(
    sql: &mut String,
    binds: &mut Vec<SqlValue>,
    field: &str,
    values: &[Value],
) {
    let mut groups: Vec<(&'static str, Vec<&Value>)> = Vec::new();
    for value in values {
        let kind = json_type_of(value);
        match groups.iter_mut().find(|(existing, _)| *existing == kind) {
            Some((_, members)) => members.push(value),
            None => groups.push((kind, vec![value])),
        }
    }

    if groups.is_empty() {
        sql.push_str("0 = 1");
        return;
    }
    if groups.len() > 1 {
        sql.push('(');
    }
    for (idx, (kind, members)) in groups.iter().enumerate() {
        if idx > 0 {
            sql.push_str(" OR ");
        }
        match *kind {
            "null" => {
                sql.push_str("json_extract(body, ?) IS NULL");
                binds.push(json_path(field));
            }
            "true" | "false" => {
                sql.push_str("json_type(body, ?) = ?");
                binds.push(json_path(field));
                binds.push(SqlValue::Text((*kind).to_string()));
            }
            _ => {
                sql.push_str("(json_type(body, ?) = ? AND json_extract(body, ?) IN (");
                binds.push(json_path(field));
                binds.push(SqlValue::Text((*kind).to_string()));
                binds.push(json_path(field));
                for (member_idx, member) in members.iter().enumerate() {
                    if member_idx > 0 {
                        sql.push_str(", ");
                    }
                    sql.push('?');
                    binds.push(to_sql_value(member));
                }
                sql.push_str("))");
            }
        }
    }
    if groups.len() > 1 {
        sql.push(')');
    }
}

fn json_path(field: &str) -> SqlValue {
    SqlValue::Text(format!("$.{field}"))
}

/// Name SQLite's `json_type` reports for `value`.
fn json_type_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(true) => "true",
        Value::Bool(false) => "false",
        Value::Number(number) if number.is_f64() => "real",
        Value::Number(_) => "integer",
        Value::String(_) => "text",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Maps a JSON scalar to what `json_extract` yields for it.
fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(flag) => SqlValue::Integer(i64::from(*flag)),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => SqlValue::Integer(integer),
            None => SqlValue::Real(number.as_f64().unwrap_or_default()),
        },
        Value::String(text) => SqlValue::Text(text.clone()),
        // json_extract returns arrays and objects as minified JSON text.
        other => SqlValue::Text(other.to_string()),
    }
}

fn clamp_to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn map_write_error(err: rusqlite::Error, collection: &str, id: &str) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            StoreError::DuplicateKey {
                collection: collection.to_string(),
                id: id.to_string(),
            }
        }
        _ => StoreError::Sqlite(err),
    }
}

#[cfg(test)]
mod tests {
    use super::{compile_predicate, SqlValue};
    use crate::store::Predicate;
    use serde_json::{json, Value};

    #[test]
    fn compiles_conjunction_with_bound_paths_and_values() {
        let predicate = Predicate::eq("content", "abc") & Predicate::any_of("id", ["a", "b"]);
        let mut sql = String::new();
        let mut binds = Vec::new();

        compile_predicate(&mut sql, &mut binds, &predicate);

        assert_eq!(
            sql,
            "((json_type(body, ?) = ? AND json_extract(body, ?) IN (?)) \
             AND (json_type(body, ?) = ? AND json_extract(body, ?) IN (?, ?)))"
        );
        assert_eq!(binds.len(), 9);
        assert_eq!(binds[0], SqlValue::Text("$.content".to_string()));
        assert_eq!(binds[1], SqlValue::Text("text".to_string()));
        assert_eq!(binds[3], SqlValue::Text("abc".to_string()));
        assert_eq!(binds[4], SqlValue::Text("$.id".to_string()));
    }

    #[test]
    fn null_member_compiles_to_is_null_alongside_typed_values() {
        let predicate = Predicate::any_of("owner", vec![Value::Null, json!("u1")]);
        let mut sql = String::new();
        let mut binds = Vec::new();

        compile_predicate(&mut sql, &mut binds, &predicate);

        assert_eq!(
            sql,
            "(json_extract(body, ?) IS NULL \
             OR (json_type(body, ?) = ? AND json_extract(body, ?) IN (?)))"
        );
        assert_eq!(binds.len(), 5);
    }

    #[test]
    fn booleans_compile_to_json_type_checks() {
        let mut sql = String::new();
        let mut binds = Vec::new();

        compile_predicate(&mut sql, &mut binds, &Predicate::eq("flag", true));

        assert_eq!(sql, "json_type(body, ?) = ?");
        assert_eq!(binds[1], SqlValue::Text("true".to_string()));
    }

    #[test]
    fn empty_membership_compiles_to_false() {
        let mut sql = String::new();
        let mut binds = Vec::new();
        compile_predicate(&mut sql, &mut binds, &Predicate::any_of("id", Vec::<String>::new()));
        assert_eq!(sql, "0 = 1");
        assert!(binds.is_empty());
    }
}
