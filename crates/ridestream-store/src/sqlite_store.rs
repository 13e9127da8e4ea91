use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode};
use ridestream_schema::{TripRow, TIMESTAMP_FORMAT};
use tokio::sync::Mutex;

use crate::{InsertError, TripStore};

pub const DEFAULT_TABLE: &str = "rides";

/// SQLite table of trips keyed by ride id
pub struct SqliteTripStore {
    conn: Arc<Mutex<Connection>>,
    table: String,
}

impl SqliteTripStore {
    /// Open or create the database at the given path
    pub fn open(db_path: &Path, table: &str) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::with_connection(conn, table)
    }

    pub fn open_in_memory(table: &str) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, table)
    }

    fn with_connection(conn: Connection, table: &str) -> Result<Self> {
        if !is_valid_table_name(table) {
            bail!("invalid table name: {table:?}");
        }
        ensure_table(&conn, table)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            table: table.to_string(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub async fn count(&self) -> Result<u64> {
        let conn = self.conn.lock().await;
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", self.table), [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

#[async_trait]
impl TripStore for SqliteTripStore {
    async fn insert(&self, row: &TripRow) -> Vec<InsertError> {
        let conn = self.conn.lock().await;
        let result = conn.execute(
            &format!(
                r#"INSERT INTO {}
                   (ride_id, timestamp, source, destination, cab_type, name,
                    distance, surge_multiplier, temperature, precip_intensity, alert_trigger)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"#,
                self.table
            ),
            params![
                row.ride_id,
                row.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                row.source,
                row.destination,
                row.cab_type,
                row.name,
                row.distance,
                row.surge_multiplier,
                row.temperature,
                row.precip_intensity,
                row.alert_trigger,
            ],
        );

        match result {
            Ok(_) => Vec::new(),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                vec![InsertError::Duplicate(row.ride_id.clone())]
            }
            Err(e) => vec![InsertError::Backend {
                ride_id: row.ride_id.clone(),
                reason: e.to_string(),
            }],
        }
    }

    async fn recent(&self, limit: usize) -> Result<Vec<TripRow>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            r#"SELECT ride_id, timestamp, source, destination, cab_type, name,
                      distance, surge_multiplier, temperature, precip_intensity, alert_trigger
               FROM {}
               ORDER BY timestamp DESC, rowid DESC
               LIMIT ?1"#,
            self.table
        ))?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map([limit], |row| {
            let timestamp: String = row.get(1)?;
            let timestamp = NaiveDateTime::parse_from_str(&timestamp, TIMESTAMP_FORMAT).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e))
            })?;
            Ok(TripRow {
                ride_id: row.get(0)?,
                timestamp,
                source: row.get(2)?,
                destination: row.get(3)?,
                cab_type: row.get(4)?,
                name: row.get(5)?,
                distance: row.get(6)?,
                surge_multiplier: row.get(7)?,
                temperature: row.get(8)?,
                precip_intensity: row.get(9)?,
                alert_trigger: row.get(10)?,
            })
        })?;

        let mut trips = Vec::new();
        for row in rows {
            trips.push(row?);
        }
        Ok(trips)
    }
}

/// Plain SQL identifier: ASCII letter or underscore, then letters, digits or underscores.
pub fn is_valid_table_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name.len() <= 64 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn ensure_table(conn: &Connection, table: &str) -> Result<()> {
    conn.execute_batch(&format!(
        r#"CREATE TABLE IF NOT EXISTS {table} (
            ride_id TEXT PRIMARY KEY,
            timestamp TEXT NOT NULL,
            source TEXT NOT NULL,
            destination TEXT NOT NULL,
            cab_type TEXT NOT NULL,
            name TEXT NOT NULL,
            distance REAL,
            surge_multiplier REAL,
            temperature REAL NOT NULL,
            precip_intensity REAL NOT NULL,
            alert_trigger TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_{table}_timestamp ON {table}(timestamp DESC);"#
    ))?;
    Ok(())
}
