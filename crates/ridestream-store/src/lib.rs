//! Persistence for normalized trip rows.

use anyhow::Result;
use async_trait::async_trait;
use ridestream_schema::TripRow;
use thiserror::Error;

mod sqlite_store;

pub use sqlite_store::{is_valid_table_name, SqliteTripStore, DEFAULT_TABLE};

/// A single reason the store refused a row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsertError {
    #[error("ride {0} is already stored")]
    Duplicate(String),
    #[error("storage backend rejected ride {ride_id}: {reason}")]
    Backend { ride_id: String, reason: String },
}

#[async_trait]
pub trait TripStore: Send + Sync {
    /// Inserts one row. An empty result means the row was stored.
    async fn insert(&self, row: &TripRow) -> Vec<InsertError>;

    /// Most recent rows first, by simulated timestamp.
    async fn recent(&self, limit: usize) -> Result<Vec<TripRow>>;
}
