use std::sync::Arc;

use ridestream_alerts::{evaluate, render, AlertCategory, Notifier};
use ridestream_schema::{DecodeError, TripEvent, TripRow};
use ridestream_store::{InsertError, TripStore};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("failed to persist ride {ride_id}: {}", join_errors(.errors))]
    Persistence {
        ride_id: String,
        errors: Vec<InsertError>,
    },
}

fn join_errors(errors: &[InsertError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestAck {
    pub ride_id: String,
    pub alert: Option<AlertCategory>,
    pub notified: bool,
}

/// Flattens the trigger tags into the stored string form.
pub fn normalize(event: TripEvent) -> TripRow {
    TripRow::from(event)
}

pub struct IngestionHandler {
    store: Arc<dyn TripStore>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl IngestionHandler {
    /// Without a notifier, alerts are still evaluated but never sent.
    pub fn new(store: Arc<dyn TripStore>, notifier: Option<Arc<dyn Notifier>>) -> Self {
        Self { store, notifier }
    }

    pub async fn handle(&self, payload: &[u8]) -> Result<IngestAck, IngestError> {
        let event = TripEvent::decode(payload)?;
        if let Err(e) = event.validate() {
            tracing::warn!(ride_id = %event.ride_id, "trip breaks record invariants: {e}");
        }

        let row = normalize(event);
        let errors = self.store.insert(&row).await;
        if !errors.is_empty() {
            return Err(IngestError::Persistence {
                ride_id: row.ride_id,
                errors,
            });
        }

        let alert = evaluate(&row);
        let notified = match alert {
            Some(category) => self.notify(category, &row).await,
            None => false,
        };

        Ok(IngestAck {
            ride_id: row.ride_id,
            alert,
            notified,
        })
    }

    async fn notify(&self, category: AlertCategory, row: &TripRow) -> bool {
        let Some(notifier) = &self.notifier else {
            tracing::debug!(ride_id = %row.ride_id, %category, "notifications disabled, skipping alert");
            return false;
        };

        match notifier.send(&render(category, row)).await {
            Ok(()) => {
                tracing::info!(ride_id = %row.ride_id, %category, "alert sent");
                true
            }
            Err(e) => {
                tracing::error!(ride_id = %row.ride_id, %category, "alert delivery failed: {e:#}");
                false
            }
        }
    }
}
