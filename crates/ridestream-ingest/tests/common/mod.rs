#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use ridestream_alerts::{Notifier, WebhookPayload};
use ridestream_schema::TripRow;
use ridestream_store::{InsertError, TripStore};

#[derive(Default)]
pub struct MemoryStore {
    pub rows: Mutex<Vec<TripRow>>,
    pub reject: bool,
}

impl MemoryStore {
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl TripStore for MemoryStore {
    async fn insert(&self, row: &TripRow) -> Vec<InsertError> {
        if self.reject {
            return vec![InsertError::Backend {
                ride_id: row.ride_id.clone(),
                reason: "no such table: rides".into(),
            }];
        }
        self.rows.lock().unwrap().push(row.clone());
        Vec::new()
    }

    async fn recent(&self, limit: usize) -> Result<Vec<TripRow>> {
        Ok(self.rows.lock().unwrap().iter().rev().take(limit).cloned().collect())
    }
}

#[derive(Default)]
pub struct CountingNotifier {
    pub calls: AtomicUsize,
    pub sent: Mutex<Vec<WebhookPayload>>,
    pub fail: bool,
}

impl CountingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for CountingNotifier {
    async fn send(&self, payload: &WebhookPayload) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("webhook returned 500 Internal Server Error");
        }
        self.sent.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

pub fn trip_json(ride_id: &str, surge: Option<f64>, trigger: serde_json::Value) -> Vec<u8> {
    let distance = surge.map(|_| 2.2);
    serde_json::to_vec(&serde_json::json!({
        "ride_id": ride_id,
        "timestamp": "2024-03-04 17:42:10",
        "source": "Theatre District",
        "destination": "South Station",
        "cab_type": "Uber",
        "name": "UberX",
        "distance": distance,
        "surge_multiplier": surge,
        "temperature": 44.1,
        "precipIntensity": 0.0,
        "alert_trigger": trigger,
    }))
    .unwrap()
}
