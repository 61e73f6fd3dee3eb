//! Composition root for the long-lived infrastructure handles.
//!
//! Everything process-wide (broker client, cache pool, consumer tasks) is
//! constructed here exactly once and owned by [`Runtime`]; lifetime is the
//! explicit `start`/`shutdown` pair. No component reaches for a global.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use configs::AppConfig;

use crate::cache::redis::RedisCache;
use crate::consumers;
use crate::events::messages::{
    UserCreated, UserCredentialsCreated, USERS_EXCHANGE, USER_CREDENTIALS_EXCHANGE,
};
use crate::events::{spawn_consumer, ExchangeClient};

pub struct Runtime {
    pub bus: Arc<ExchangeClient>,
    pub cache: Arc<RedisCache>,
    consumers: Vec<JoinHandle<()>>,
}

impl Runtime {
    /// Connect the shared handles and spawn the consumer fleet.
    pub async fn start(cfg: &AppConfig) -> anyhow::Result<Self> {
        let cache = Arc::new(RedisCache::connect(&cfg.cache.url).await?);
        let bus = Arc::new(ExchangeClient::connect(&cfg.broker.url).await?);
        bus.declare_exchange(USERS_EXCHANGE).await?;
        bus.declare_exchange(USER_CREDENTIALS_EXCHANGE).await?;

        let view_ttl = Duration::from_secs(cfg.cache.view_ttl_secs);
        let consumers = vec![
            spawn_consumer::<UserCreated, _, _>(
                cfg.broker.clone(),
                consumers::USER_CREATED_QUEUE,
                {
                    let cache = cache.clone();
                    move |event| {
                        let cache = cache.clone();
                        async move {
                            consumers::handle_user_created(cache.as_ref(), view_ttl, event).await
                        }
                    }
                },
            ),
            spawn_consumer::<UserCredentialsCreated, _, _>(
                cfg.broker.clone(),
                consumers::USER_CREDENTIALS_CREATED_QUEUE,
                {
                    let cache = cache.clone();
                    move |event| {
                        let cache = cache.clone();
                        async move {
                            consumers::handle_user_credentials_created(
                                cache.as_ref(),
                                view_ttl,
                                event,
                            )
                            .await
                        }
                    }
                },
            ),
        ];

        info!(consumers = consumers.len(), "runtime started");
        Ok(Self { bus, cache, consumers })
    }

    /// Tear down in reverse order: stop the consumers, then close the
    /// broker connection. Must not run while subscriptions are still being
    /// added.
    pub async fn shutdown(self) {
        for handle in &self.consumers {
            handle.abort();
        }
        for handle in self.consumers {
            let _ = handle.await;
        }
        if let Err(e) = self.bus.close().await {
            warn!(error = %e, "broker close failed during shutdown");
        }
        info!("runtime stopped");
    }
}
