use futures_util::StreamExt;
use lapin::{
    options::{
        BasicAckOptions, BasicConsumeOptions, BasicNackOptions, ExchangeDeclareOptions,
        QueueBindOptions, QueueDeclareOptions,
    },
    types::FieldTable,
    Connection, ConnectionProperties, ExchangeKind,
};
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use configs::BrokerConfig;

use super::{DomainEvent, EventBusError};

/// Spawn a supervised consumer for one `(exchange, topic, queue)` binding.
///
/// The task owns its own connection, declares the exchange and a durable
/// queue, and acknowledges a delivery only after the handler returns Ok.
/// Connection-level errors tear the subscription down and the loop
/// reconnects after `config.reconnect_delay_secs`; the durable queue means
/// no message is lost across reconnects, though unacknowledged ones are
/// redelivered. Handler errors nack-with-requeue and pause for the same
/// delay. With `max_attempts` unset the loop runs for the lifetime of the
/// process; when set, consecutive connection failures beyond the budget end
/// the task with a loud error so a supervisor can restart it.
pub fn spawn_consumer<E, F, Fut>(
    config: BrokerConfig,
    queue_name: &str,
    handler: F,
) -> JoinHandle<()>
where
    E: DomainEvent,
    F: Fn(E) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    let queue_name = queue_name.to_string();
    tokio::spawn(async move { consume_loop::<E, F, Fut>(config, queue_name, handler).await })
}

async fn consume_loop<E, F, Fut>(config: BrokerConfig, queue_name: String, handler: F)
where
    E: DomainEvent,
    F: Fn(E) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    let delay = Duration::from_secs(config.reconnect_delay_secs);
    let mut attempts: u32 = 0;
    loop {
        match run_subscription::<E, F, Fut>(&config.url, &queue_name, delay, &handler, &mut attempts)
            .await
        {
            Ok(()) => {
                info!(queue = %queue_name, "subscription stream ended; resubscribing");
            }
            Err(e) => {
                attempts = attempts.saturating_add(1);
                if let Some(max) = config.max_attempts {
                    if attempts >= max {
                        error!(
                            queue = %queue_name,
                            attempts,
                            error = %e,
                            "consumer exhausted its attempt budget; stopping"
                        );
                        return;
                    }
                }
                warn!(
                    queue = %queue_name,
                    attempt = attempts,
                    delay_secs = delay.as_secs(),
                    error = %e,
                    "broker subscription lost; reconnecting"
                );
            }
        }
        tokio::time::sleep(delay).await;
    }
}

async fn run_subscription<E, F, Fut>(
    url: &str,
    queue_name: &str,
    delay: Duration,
    handler: &F,
    attempts: &mut u32,
) -> Result<(), EventBusError>
where
    E: DomainEvent,
    F: Fn(E) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    let conn_err = |e: lapin::Error| EventBusError::Connection(e.to_string());

    let connection = Connection::connect(url, ConnectionProperties::default())
        .await
        .map_err(conn_err)?;
    let channel = connection.create_channel().await.map_err(conn_err)?;

    // The publisher usually declares the exchange first, but a consumer that
    // starts before any producer must not fail its binding.
    channel
        .exchange_declare(
            E::EXCHANGE,
            ExchangeKind::Topic,
            ExchangeDeclareOptions::default(),
            FieldTable::default(),
        )
        .await
        .map_err(conn_err)?;
    channel
        .queue_declare(
            queue_name,
            QueueDeclareOptions { durable: true, ..Default::default() },
            FieldTable::default(),
        )
        .await
        .map_err(conn_err)?;
    channel
        .queue_bind(
            queue_name,
            E::EXCHANGE,
            E::TOPIC,
            QueueBindOptions::default(),
            FieldTable::default(),
        )
        .await
        .map_err(conn_err)?;

    let mut consumer = channel
        .basic_consume(
            queue_name,
            "",
            BasicConsumeOptions::default(),
            FieldTable::default(),
        )
        .await
        .map_err(conn_err)?;

    info!(queue = queue_name, exchange = E::EXCHANGE, topic = E::TOPIC, "consumer subscribed");
    *attempts = 0;

    while let Some(delivery) = consumer.next().await {
        let delivery = delivery.map_err(conn_err)?;
        match serde_json::from_slice::<E>(&delivery.data) {
            Ok(event) => match handler(event).await {
                Ok(()) => {
                    delivery.ack(BasicAckOptions::default()).await.map_err(conn_err)?;
                }
                Err(e) => {
                    error!(queue = queue_name, error = %e, "handler failed; requeueing delivery");
                    delivery
                        .nack(BasicNackOptions { requeue: true, ..Default::default() })
                        .await
                        .map_err(conn_err)?;
                    // Pause so a persistently failing handler cannot spin on
                    // its own redeliveries.
                    tokio::time::sleep(delay).await;
                }
            },
            Err(e) => {
                // Redelivery cannot fix a decode failure; ack and drop.
                warn!(queue = queue_name, error = %e, "dropping undecodable message");
                delivery.ack(BasicAckOptions::default()).await.map_err(conn_err)?;
            }
        }
    }
    Ok(())
}
