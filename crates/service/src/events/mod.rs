//! Durable topic publish/subscribe over an AMQP topic exchange.
//!
//! Publishing is fire-and-forget; at-least-once delivery is the broker's
//! contract, so every consumer handler must be idempotent. The subscription
//! side lives in [`consume`] and is supervised: it reconnects on any
//! connection-level error and never takes the process down.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub mod consume;
pub mod exchange;
pub mod messages;

pub use consume::spawn_consumer;
pub use exchange::ExchangeClient;

#[derive(Debug, Error)]
pub enum EventBusError {
    #[error("broker connection error: {0}")]
    Connection(String),
    #[error("exchange '{0}' not declared")]
    ExchangeNotDeclared(String),
    #[error("event serialization error: {0}")]
    Serialization(String),
    #[error("publish failed: {0}")]
    Publish(String),
}

/// A committed fact, bound at compile time to the exchange it is routed on
/// and the topic string used as its routing key.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + 'static {
    const EXCHANGE: &'static str;
    const TOPIC: &'static str;
}

/// Publishing seam; the broker-backed implementation is [`ExchangeClient`],
/// tests use [`mock::RecordingPublisher`].
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish_raw(
        &self,
        exchange: &str,
        topic: &str,
        body: Vec<u8>,
    ) -> Result<(), EventBusError>;
}

/// Serialize `event` and route it by its topic on its exchange.
pub async fn publish_event<E: DomainEvent>(
    publisher: &dyn EventPublisher,
    event: &E,
) -> Result<(), EventBusError> {
    let body =
        serde_json::to_vec(event).map_err(|e| EventBusError::Serialization(e.to_string()))?;
    publisher.publish_raw(E::EXCHANGE, E::TOPIC, body).await
}

/// In-memory publishers for tests and doc examples.
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Records every published message instead of touching a broker.
    #[derive(Default)]
    pub struct RecordingPublisher {
        pub published: Mutex<Vec<(String, String, Vec<u8>)>>,
    }

    impl RecordingPublisher {
        pub fn messages_for(&self, topic: &str) -> Vec<Vec<u8>> {
            self.published
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, t, _)| t == topic)
                .map(|(_, _, body)| body.clone())
                .collect()
        }
    }

    #[async_trait]
    impl EventPublisher for RecordingPublisher {
        async fn publish_raw(
            &self,
            exchange: &str,
            topic: &str,
            body: Vec<u8>,
        ) -> Result<(), EventBusError> {
            self.published
                .lock()
                .unwrap()
                .push((exchange.to_string(), topic.to_string(), body));
            Ok(())
        }
    }

    /// Fails every publish; exercises the best-effort paths.
    #[derive(Default)]
    pub struct FailingPublisher;

    #[async_trait]
    impl EventPublisher for FailingPublisher {
        async fn publish_raw(
            &self,
            _exchange: &str,
            _topic: &str,
            _body: Vec<u8>,
        ) -> Result<(), EventBusError> {
            Err(EventBusError::Publish("broker unavailable".into()))
        }
    }
}
