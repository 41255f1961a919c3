// Boundary store module
// DuckDB-backed lookups against the GeoParquet dataset

use duckdb::types::Value;
use duckdb::{params_from_iter, Connection};
use std::path::Path;
use std::sync::Mutex;

use super::columns::ColumnWhitelist;
use super::query::{self, Bind};
use super::request::ReverseRequest;
use crate::config::DatasetConfig;
use crate::error::StoreError;

/// One matching boundary, columns in projection order
pub type Boundary = serde_json::Map<String, serde_json::Value>;

/// Source of boundaries containing a point.
///
/// Implementations block; callers run them on the blocking thread pool.
pub trait BoundaryStore: Send + Sync {
    fn lookup(&self, request: &ReverseRequest) -> Result<Vec<Boundary>, StoreError>;
}

/// DuckDB store reading the dataset with `read_parquet` on every lookup.
///
/// The connection kept here is never queried concurrently. Each call clones
/// it into a fresh connection on the same in-memory database, so lookups
/// from different requests do not share a handle.
pub struct DuckDbStore {
    path: String,
    schema: Vec<String>,
    conn: Mutex<Connection>,
}

impl DuckDbStore {
    /// Open an in-memory database, load the spatial extension and read the schema
    pub fn open(config: &DatasetConfig) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        if config.install_spatial {
            conn.execute_batch("INSTALL spatial;")?;
        }
        conn.execute_batch("LOAD spatial;")?;
        tracing::info!("DuckDB initialized with spatial extension");

        Self::with_connection(conn, &config.path)
    }

    /// Wrap an existing connection; extensions are the caller's business
    pub fn with_connection(conn: Connection, path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_string_lossy().into_owned();
        let schema = read_schema(&conn, &path)?;
        tracing::info!(
            "Loaded {} column names from parquet file {}",
            schema.len(),
            path
        );

        Ok(Self {
            path,
            schema,
            conn: Mutex::new(conn),
        })
    }

    /// Whitelist of the dataset's column names
    pub fn columns(&self) -> ColumnWhitelist {
        ColumnWhitelist::new(self.schema.iter().cloned())
    }

    fn connection(&self) -> Result<Connection, StoreError> {
        let guard = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.try_clone()?)
    }

    fn bind_values(&self, request: &ReverseRequest) -> Vec<Value> {
        query::bind_order()
            .iter()
            .map(|bind| match bind {
                Bind::Path => Value::Text(self.path.clone()),
                Bind::Lon => Value::Double(request.lon),
                Bind::Lat => Value::Double(request.lat),
            })
            .collect()
    }
}

/// Column names of the dataset, in file order, from a zero-row query
fn read_schema(conn: &Connection, path: &str) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare(query::SCHEMA_SQL)?;
    let rows = stmt.query([path])?;
    let names = rows
        .as_ref()
        .map(|stmt| stmt.column_names())
        .unwrap_or_default();
    Ok(names)
}

impl BoundaryStore for DuckDbStore {
    fn lookup(&self, request: &ReverseRequest) -> Result<Vec<Boundary>, StoreError> {
        let columns = query::output_columns(&request.projection, &self.schema);
        let conn = self.connection()?;
        let sql = query::reverse_sql(&columns);
        let mut stmt = conn.prepare(&sql)?;

        let rows = stmt.query_map(params_from_iter(self.bind_values(request)), |row| {
            (0..columns.len())
                .map(|i| row.get::<_, Option<String>>(i))
                .collect::<duckdb::Result<Vec<_>>>()
        })?;

        let mut boundaries = Vec::new();
        for row in rows {
            boundaries.push(to_boundary(&columns, row?)?);
        }
        Ok(boundaries)
    }
}

/// Pair column names with their JSON values; a repeated name keeps one key
fn to_boundary(columns: &[&str], values: Vec<Option<String>>) -> Result<Boundary, StoreError> {
    let mut boundary = Boundary::new();
    for (name, json) in columns.iter().zip(values) {
        let value = match json {
            Some(json) => serde_json::from_str(&json)?,
            None => serde_json::Value::Null,
        };
        boundary.insert((*name).to_string(), value);
    }
    Ok(boundary)
}
