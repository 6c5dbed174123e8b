use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::events::{self, EventBus};
use crate::mailer::{HttpMailer, Mailer, NoopMailer};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub mailer: Arc<dyn Mailer>,

    pub event_bus: EventBus,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::with_event_bus(config, events::event_bus()).await
    }

    pub async fn with_event_bus(config: Config, event_bus: EventBus) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await?;

        let mailer: Arc<dyn Mailer> = if config.mail.enabled {
            Arc::new(HttpMailer::new(&config.mail)?)
        } else {
            Arc::new(NoopMailer)
        };

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            mailer,
            event_bus,
        })
    }
}
