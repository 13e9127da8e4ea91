use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct Topic(String);

impl Topic {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Companion topic that receives payloads the consumer rejected.
    pub fn dead_letter(&self) -> Topic {
        Topic(format!("{}.dead-letter", self.0))
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub enum BusMessage {
    Payload {
        message_id: Uuid,
        data: Vec<u8>,
        published_at: DateTime<Utc>,
    },
    DeadLetter {
        message_id: Uuid,
        data: Vec<u8>,
        error: String,
        failed_at: DateTime<Utc>,
    },
}

impl BusMessage {
    pub fn payload(data: Vec<u8>) -> Self {
        BusMessage::Payload {
            message_id: Uuid::new_v4(),
            data,
            published_at: Utc::now(),
        }
    }

    pub fn dead_letter(message_id: Uuid, data: Vec<u8>, error: impl Into<String>) -> Self {
        BusMessage::DeadLetter {
            message_id,
            data,
            error: error.into(),
            failed_at: Utc::now(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("subscriber queue full on topic {0}")]
    QueueFull(String),
    #[error("subscriber on topic {0} has gone away")]
    Closed(String),
}

type Subscriber = mpsc::Sender<BusMessage>;
type Subscribers = Arc<RwLock<HashMap<Topic, Vec<Subscriber>>>>;

pub struct EventBus {
    subscribers: Subscribers,
    capacity: usize,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    pub async fn subscribe(&self, topic: &Topic) -> mpsc::Receiver<BusMessage> {
        let (tx, rx) = mpsc::channel(self.capacity);
        let mut subs = self.subscribers.write().await;
        subs.entry(topic.clone()).or_default().push(tx);
        rx
    }

    pub async fn publish(&self, topic: &Topic, msg: BusMessage) -> Result<(), TransportError> {
        deliver(&self.subscribers, topic, msg).await
    }

    pub fn publisher(&self) -> BusPublisher {
        BusPublisher {
            subscribers: self.subscribers.clone(),
        }
    }

    /// Drops every subscription on `topic`. Receivers drain what is already
    /// queued and then end.
    pub async fn close(&self, topic: &Topic) {
        self.subscribers.write().await.remove(topic);
    }
}

#[derive(Clone)]
pub struct BusPublisher {
    subscribers: Subscribers,
}

impl BusPublisher {
    pub async fn publish(&self, topic: &Topic, msg: BusMessage) -> Result<(), TransportError> {
        deliver(&self.subscribers, topic, msg).await
    }

    pub fn for_topic(&self, topic: Topic) -> TopicPublisher {
        TopicPublisher {
            publisher: self.clone(),
            topic,
        }
    }
}

/// Fans a message out without waiting on any consumer. A topic without
/// subscribers silently drops the message.
async fn deliver(subscribers: &Subscribers, topic: &Topic, msg: BusMessage) -> Result<(), TransportError> {
    let subs = subscribers.read().await;
    let Some(subscribers) = subs.get(topic) else {
        return Ok(());
    };

    let mut first_error = None;
    for tx in subscribers {
        let outcome = tx.try_send(msg.clone());
        if let Err(err) = outcome {
            let err = match err {
                TrySendError::Full(_) => TransportError::QueueFull(topic.to_string()),
                TrySendError::Closed(_) => TransportError::Closed(topic.to_string()),
            };
            tracing::debug!(topic = %topic, "bus delivery failed: {err}");
            first_error.get_or_insert(err);
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Hands serialized records to a transport. Implementations must not block
/// on consumer acknowledgement and must not retry internally.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, payload: Vec<u8>) -> Result<(), TransportError>;
}

#[derive(Clone)]
pub struct TopicPublisher {
    publisher: BusPublisher,
    topic: Topic,
}

impl TopicPublisher {
    pub fn topic(&self) -> &Topic {
        &self.topic
    }
}

#[async_trait]
impl EventPublisher for TopicPublisher {
    async fn publish(&self, payload: Vec<u8>) -> Result<(), TransportError> {
        self.publisher
            .publish(&self.topic, BusMessage::payload(payload))
            .await
    }
}
