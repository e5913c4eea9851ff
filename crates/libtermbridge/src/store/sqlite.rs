use std::{
  path::Path,
  sync::{Arc, Mutex},
};

use anyhow::Context;
use jiff::Timestamp;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter, types::Value};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
  error::TermBridgeError,
  model::{HasText, Mapping, MappingFilter, SourceCode, StoredMapping, TargetCode},
  store::{CodeStore, MappingStore, Upsert},
};

const SOURCE_TABLE: &str = "namaste_codes";
const TARGET_TABLE: &str = "icd11_codes";

const SCHEMA: &str = r#"
  CREATE TABLE IF NOT EXISTS namaste_codes (
    code TEXT PRIMARY KEY NOT NULL,
    payload TEXT NOT NULL
  );

  CREATE TABLE IF NOT EXISTS icd11_codes (
    code TEXT PRIMARY KEY NOT NULL,
    payload TEXT NOT NULL
  );

  CREATE TABLE IF NOT EXISTS concept_mappings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_code TEXT NOT NULL,
    target_code TEXT NOT NULL,
    target_display TEXT,
    score REAL NOT NULL,
    confidence TEXT NOT NULL,
    equivalence TEXT NOT NULL,
    details TEXT NOT NULL,
    source_text TEXT NOT NULL,
    target_text TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (source_code, target_code)
  );

  CREATE INDEX IF NOT EXISTS concept_mappings_target_code ON concept_mappings (target_code);
"#;

const INSERT_MAPPING: &str = r#"
  INSERT INTO concept_mappings (source_code, target_code, target_display, score, confidence, equivalence, details, source_text, target_text, created_at, updated_at)
  VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
"#;

const ON_CONFLICT_UPDATE: &str = r#"
  ON CONFLICT (source_code, target_code) DO UPDATE SET
    target_display = excluded.target_display,
    score = excluded.score,
    confidence = excluded.confidence,
    equivalence = excluded.equivalence,
    details = excluded.details,
    source_text = excluded.source_text,
    target_text = excluded.target_text,
    updated_at = excluded.updated_at
"#;

const ON_CONFLICT_IGNORE: &str = "ON CONFLICT (source_code, target_code) DO NOTHING";

const SELECT_MAPPINGS: &str = r#"
  SELECT id, source_code, target_code, target_display, score, confidence, equivalence, details, source_text, target_text, created_at, updated_at
  FROM concept_mappings
  WHERE 1 = 1
"#;

/// Store backed by a single SQLite database file.
///
/// All statements go through one connection, run on the blocking thread pool.
#[derive(Clone, Debug)]
pub struct SqliteStore {
  conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
  pub fn open(path: impl AsRef<Path>) -> Result<SqliteStore, TermBridgeError> {
    let path = path.as_ref();

    tracing::debug!(path = %path.display(), "opening database");

    SqliteStore::init(Connection::open(path)?)
  }

  pub fn in_memory() -> Result<SqliteStore, TermBridgeError> {
    SqliteStore::init(Connection::open_in_memory()?)
  }

  fn init(conn: Connection) -> Result<SqliteStore, TermBridgeError> {
    conn.execute_batch(SCHEMA)?;

    Ok(SqliteStore { conn: Arc::new(Mutex::new(conn)) })
  }

  async fn with_connection<T, F>(&self, func: F) -> Result<T, TermBridgeError>
  where
    T: Send + 'static,
    F: FnOnce(&mut Connection) -> Result<T, TermBridgeError> + Send + 'static,
  {
    let conn = Arc::clone(&self.conn);

    tokio::task::spawn_blocking(move || {
      let mut conn = conn.lock().map_err(|_| anyhow::anyhow!("database connection lock is poisoned"))?;

      func(&mut conn)
    })
    .await
    .context("database task failed")?
  }
}

fn put_codes<T: HasText + Serialize>(conn: &mut Connection, table: &str, codes: &[T]) -> Result<usize, TermBridgeError> {
  let tx = conn.transaction()?;

  {
    let mut stmt = tx.prepare(&format!("INSERT INTO {table} (code, payload) VALUES (?1, ?2) ON CONFLICT (code) DO UPDATE SET payload = excluded.payload"))?;

    for code in codes {
      stmt.execute(params![code.code(), serde_json::to_string(code)?])?;
    }
  }

  tx.commit()?;

  Ok(codes.len())
}

fn load_codes<T: DeserializeOwned>(conn: &Connection, table: &str) -> Result<Vec<T>, TermBridgeError> {
  let mut stmt = conn.prepare(&format!("SELECT payload FROM {table} ORDER BY rowid"))?;
  let payloads = stmt.query_map([], |row| row.get::<_, String>(0))?.collect::<Result<Vec<_>, _>>()?;

  payloads.iter().map(|payload| Ok(serde_json::from_str(payload)?)).collect()
}

fn load_code<T: DeserializeOwned>(conn: &Connection, table: &str, code: &str) -> Result<Option<T>, TermBridgeError> {
  let payload = conn
    .query_row(&format!("SELECT payload FROM {table} WHERE code = ?1"), [code], |row| row.get::<_, String>(0))
    .optional()?;

  match payload {
    Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
    None => Ok(None),
  }
}

struct MappingRow {
  id: i64,
  source_code: String,
  target_code: String,
  target_display: Option<String>,
  score: f64,
  confidence: String,
  equivalence: String,
  details: String,
  source_text: String,
  target_text: String,
  created_at: String,
  updated_at: String,
}

impl MappingRow {
  fn from_row(row: &Row<'_>) -> rusqlite::Result<MappingRow> {
    Ok(MappingRow {
      id: row.get(0)?,
      source_code: row.get(1)?,
      target_code: row.get(2)?,
      target_display: row.get(3)?,
      score: row.get(4)?,
      confidence: row.get(5)?,
      equivalence: row.get(6)?,
      details: row.get(7)?,
      source_text: row.get(8)?,
      target_text: row.get(9)?,
      created_at: row.get(10)?,
      updated_at: row.get(11)?,
    })
  }
}

impl TryFrom<MappingRow> for StoredMapping {
  type Error = TermBridgeError;

  fn try_from(row: MappingRow) -> Result<Self, Self::Error> {
    Ok(StoredMapping {
      id: row.id,
      mapping: Mapping {
        source_code: row.source_code,
        target_code: row.target_code,
        target_display: row.target_display,
        score: row.score,
        confidence: row.confidence.parse()?,
        equivalence: row.equivalence.parse()?,
        details: serde_json::from_str(&row.details)?,
        source_text: row.source_text,
        target_text: row.target_text,
      },
      created_at: row.created_at.parse().context("invalid creation timestamp")?,
      updated_at: row.updated_at.parse().context("invalid update timestamp")?,
    })
  }
}

fn select_mappings(conn: &Connection, filter: &MappingFilter) -> Result<Vec<StoredMapping>, TermBridgeError> {
  let mut sql = String::from(SELECT_MAPPINGS);
  let mut values = Vec::<Value>::new();

  if let Some(code) = &filter.source_code {
    sql.push_str(" AND source_code = ?");
    values.push(Value::Text(code.clone()));
  }
  if let Some(code) = &filter.target_code {
    sql.push_str(" AND target_code = ?");
    values.push(Value::Text(code.clone()));
  }
  if let Some(confidence) = filter.confidence {
    sql.push_str(" AND confidence = ?");
    values.push(Value::Text(confidence.as_str().to_string()));
  }
  if let Some(min_score) = filter.min_score {
    sql.push_str(" AND score >= ?");
    values.push(Value::Real(min_score));
  }

  sql.push_str(" ORDER BY id LIMIT ? OFFSET ?");
  values.push(Value::Integer(filter.limit.map_or(-1, |limit| limit as i64)));
  values.push(Value::Integer(filter.offset.unwrap_or(0) as i64));

  let mut stmt = conn.prepare(&sql)?;
  let rows = stmt.query_map(params_from_iter(values), MappingRow::from_row)?.collect::<Result<Vec<_>, _>>()?;

  rows.into_iter().map(StoredMapping::try_from).collect()
}

impl MappingStore for SqliteStore {
  async fn health(&self) -> Result<bool, TermBridgeError> {
    self.with_connection(|conn| Ok(conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))? == 1)).await
  }

  async fn upsert_mapping(&self, mapping: &Mapping, overwrite: bool) -> Result<Upsert, TermBridgeError> {
    let mapping = mapping.clone();

    self
      .with_connection(move |conn| {
        let sql = format!("{INSERT_MAPPING} {}", if overwrite { ON_CONFLICT_UPDATE } else { ON_CONFLICT_IGNORE });

        let changed = conn.execute(
          &sql,
          params![
            mapping.source_code,
            mapping.target_code,
            mapping.target_display,
            mapping.score,
            mapping.confidence.as_str(),
            mapping.equivalence.as_str(),
            serde_json::to_string(&mapping.details)?,
            mapping.source_text,
            mapping.target_text,
            Timestamp::now().to_string(),
          ],
        )?;

        Ok(if changed > 0 { Upsert::Written } else { Upsert::Skipped })
      })
      .await
  }

  async fn query_mappings(&self, filter: &MappingFilter) -> Result<Vec<StoredMapping>, TermBridgeError> {
    let filter = filter.clone();

    self.with_connection(move |conn| select_mappings(conn, &filter)).await
  }
}

impl CodeStore for SqliteStore {
  async fn put_source_codes(&self, codes: Vec<SourceCode>) -> Result<usize, TermBridgeError> {
    self.with_connection(move |conn| put_codes(conn, SOURCE_TABLE, &codes)).await
  }

  async fn put_target_codes(&self, codes: Vec<TargetCode>) -> Result<usize, TermBridgeError> {
    self.with_connection(move |conn| put_codes(conn, TARGET_TABLE, &codes)).await
  }

  async fn source_codes(&self) -> Result<Vec<SourceCode>, TermBridgeError> {
    self.with_connection(|conn| load_codes(conn, SOURCE_TABLE)).await
  }

  async fn target_codes(&self) -> Result<Vec<TargetCode>, TermBridgeError> {
    self.with_connection(|conn| load_codes(conn, TARGET_TABLE)).await
  }

  async fn source_code(&self, code: &str) -> Result<Option<SourceCode>, TermBridgeError> {
    let code = code.to_string();

    self.with_connection(move |conn| load_code(conn, SOURCE_TABLE, &code)).await
  }

  async fn target_code(&self, code: &str) -> Result<Option<TargetCode>, TermBridgeError> {
    let code = code.to_string();

    self.with_connection(move |conn| load_code(conn, TARGET_TABLE, &code)).await
  }
}
