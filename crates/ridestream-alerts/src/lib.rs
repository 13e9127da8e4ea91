//! Alert selection for persisted trips and delivery to a webhook channel.

mod category;
mod notifier;
mod render;

pub use category::{classify, evaluate, should_alert, AlertCategory, SURGE_ALERT_THRESHOLD};
pub use notifier::{Notifier, WebhookNotifier};
pub use render::{render, Embed, EmbedField, EmbedFooter, WebhookPayload};
