use std::sync::Arc;

use ridestream_bus::{BusMessage, EventBus, Topic};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::IngestionHandler;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListenerStats {
    pub received: u64,
    pub stored: u64,
    pub alerts: u64,
    pub notified: u64,
    pub dead_lettered: u64,
}

/// Feeds every payload on `topic` through the handler. Rejected payloads go
/// to the dead-letter topic with the error text; nothing is retried here.
///
/// The subscription exists once this returns. The task ends after the topic
/// is closed and its queue drained.
pub async fn spawn_trip_listener(
    handler: Arc<IngestionHandler>,
    bus: &EventBus,
    topic: Topic,
) -> JoinHandle<ListenerStats> {
    let mut rx = bus.subscribe(&topic).await;
    let dead_letters = bus.publisher();
    let dlq = topic.dead_letter();

    tokio::spawn(async move {
        let mut stats = ListenerStats::default();
        while let Some(msg) = rx.recv().await {
            let BusMessage::Payload { message_id, data, .. } = msg else {
                continue;
            };
            stats.received += 1;

            match handler.handle(&data).await {
                Ok(ack) => {
                    stats.stored += 1;
                    if ack.alert.is_some() {
                        stats.alerts += 1;
                    }
                    if ack.notified {
                        stats.notified += 1;
                    }
                }
                Err(e) => {
                    tracing::error!(topic = %topic, %message_id, "ingestion failed: {e}");
                    let msg = BusMessage::dead_letter(message_id, data, e.to_string());
                    match dead_letters.publish(&dlq, msg).await {
                        Ok(()) => stats.dead_lettered += 1,
                        Err(e) => tracing::error!(topic = %dlq, "dead-letter publish failed: {e}"),
                    }
                }
            }
        }
        stats
    })
}
