use async_trait::async_trait;
use lapin::{
    options::{BasicPublishOptions, ExchangeDeclareOptions},
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind,
};
use std::collections::HashSet;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{EventBusError, EventPublisher};

/// Publisher half of the event bus: one connection, one logical channel,
/// explicitly constructed at the composition root and passed by reference.
/// Lifetime is an explicit `connect`/`close` pair; there is no lazily
/// initialized global handle.
pub struct ExchangeClient {
    connection: Connection,
    channel: Channel,
    declared: RwLock<HashSet<String>>,
}

impl ExchangeClient {
    /// Establish the transport connection and channel. Fails fast when the
    /// broker is unreachable; supervised loops that must outlive broker
    /// downtime wrap this in their own retry (see [`super::consume`]).
    pub async fn connect(url: &str) -> Result<Self, EventBusError> {
        let connection = Connection::connect(url, ConnectionProperties::default())
            .await
            .map_err(|e| EventBusError::Connection(e.to_string()))?;
        let channel = connection
            .create_channel()
            .await
            .map_err(|e| EventBusError::Connection(e.to_string()))?;
        info!("broker connection established");
        Ok(Self { connection, channel, declared: RwLock::new(HashSet::new()) })
    }

    /// Idempotently declare a topic exchange. Must run once per exchange
    /// name before anything is published on it.
    pub async fn declare_exchange(&self, name: &str) -> Result<(), EventBusError> {
        self.channel
            .exchange_declare(
                name,
                ExchangeKind::Topic,
                ExchangeDeclareOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| EventBusError::Connection(e.to_string()))?;
        self.declared.write().await.insert(name.to_string());
        debug!(exchange = name, "topic exchange declared");
        Ok(())
    }

    /// Close channel and connection. Must not run while subscriptions that
    /// share the process are still being added.
    pub async fn close(&self) -> Result<(), EventBusError> {
        self.channel
            .close(200, "shutdown")
            .await
            .map_err(|e| EventBusError::Connection(e.to_string()))?;
        self.connection
            .close(200, "shutdown")
            .await
            .map_err(|e| EventBusError::Connection(e.to_string()))?;
        info!("broker connection closed");
        Ok(())
    }
}

#[async_trait]
impl EventPublisher for ExchangeClient {
    /// Route `body` by `topic` on a previously declared exchange.
    /// Fire-and-forget: the publisher confirmation is not awaited, delivery
    /// is the broker's at-least-once contract.
    async fn publish_raw(
        &self,
        exchange: &str,
        topic: &str,
        body: Vec<u8>,
    ) -> Result<(), EventBusError> {
        if !self.declared.read().await.contains(exchange) {
            return Err(EventBusError::ExchangeNotDeclared(exchange.to_string()));
        }
        let _confirm = self
            .channel
            .basic_publish(
                exchange,
                topic,
                BasicPublishOptions::default(),
                &body,
                BasicProperties::default(),
            )
            .await
            .map_err(|e| EventBusError::Publish(e.to_string()))?;
        debug!(exchange, topic, "event published");
        Ok(())
    }
}
