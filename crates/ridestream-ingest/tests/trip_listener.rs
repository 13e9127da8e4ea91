mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{trip_json, CountingNotifier, MemoryStore};
use ridestream_alerts::WebhookNotifier;
use ridestream_bus::{BusMessage, EventBus, EventPublisher, Topic};
use ridestream_ingest::{spawn_trip_listener, IngestionHandler, ListenerStats};
use ridestream_store::{SqliteTripStore, TripStore};
use serde_json::json;
use tokio::time::timeout;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn topic() -> Topic {
    Topic::new("uber-ride-topic")
}

#[tokio::test]
async fn rejected_payloads_reach_the_dead_letter_topic() {
    let bus = EventBus::new(16);
    let mut dlq = bus.subscribe(&topic().dead_letter()).await;
    let store = Arc::new(MemoryStore::default());
    let notifier = Arc::new(CountingNotifier::default());
    let handler = Arc::new(IngestionHandler::new(store.clone(), Some(notifier.clone())));
    let listener = spawn_trip_listener(handler, &bus, topic()).await;

    let publisher = bus.publisher().for_topic(topic());
    publisher.publish(trip_json("ok-1", Some(2.1), json!(null))).await.unwrap();
    publisher.publish(b"not json".to_vec()).await.unwrap();
    publisher.publish(trip_json("ok-2", Some(1.0), json!(null))).await.unwrap();

    let dead = timeout(Duration::from_secs(1), dlq.recv()).await.unwrap().unwrap();
    match dead {
        BusMessage::DeadLetter { data, error, .. } => {
            assert_eq!(data, b"not json");
            assert!(error.contains("malformed trip payload"), "{error}");
        }
        other => panic!("unexpected {other:?}"),
    }

    bus.close(&topic()).await;
    let stats = timeout(Duration::from_secs(1), listener).await.unwrap().unwrap();
    assert_eq!(
        stats,
        ListenerStats {
            received: 3,
            stored: 2,
            alerts: 1,
            notified: 1,
            dead_lettered: 1,
        }
    );
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn duplicate_delivery_is_dead_lettered_without_second_alert() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let bus = EventBus::new(16);
    let mut dlq = bus.subscribe(&topic().dead_letter()).await;
    let store = Arc::new(SqliteTripStore::open_in_memory("rides").unwrap());
    let notifier = Arc::new(WebhookNotifier::new(server.uri()));
    let handler = Arc::new(IngestionHandler::new(store.clone(), Some(notifier)));
    let listener = spawn_trip_listener(handler, &bus, topic()).await;

    let payload = trip_json("dup-1", None, json!(["DQ: MISSING DATA"]));
    let publisher = bus.publisher().for_topic(topic());
    publisher.publish(payload.clone()).await.unwrap();
    publisher.publish(payload).await.unwrap();

    let dead = timeout(Duration::from_secs(2), dlq.recv()).await.unwrap().unwrap();
    assert!(matches!(dead, BusMessage::DeadLetter { ref error, .. } if error.contains("already stored")));

    bus.close(&topic()).await;
    let stats = timeout(Duration::from_secs(2), listener).await.unwrap().unwrap();
    assert_eq!(stats.stored, 1);
    assert_eq!(stats.notified, 1);
    assert_eq!(stats.dead_lettered, 1);
    assert_eq!(store.recent(10).await.unwrap().len(), 1);
}
