//! Decode, persist, then alert: the consumer side of the trip stream.

mod handler;
mod listener;

pub use handler::{normalize, IngestAck, IngestError, IngestionHandler};
pub use listener::{spawn_trip_listener, ListenerStats};
