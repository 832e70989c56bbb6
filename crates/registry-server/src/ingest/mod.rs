//! Broadcast ingestion listener
//!
//! Subscribes to a fan-out pub/sub channel and records every payload
//! verbatim as a received username. Every subscriber to the channel sees
//! every message; there are no consumer groups. Delivery is at-most-once:
//! a payload that fails to persist is logged and dropped, never redelivered.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use registry_core::ports::UserStore;
use registry_core::{RegistryError, Result};
use tokio::time::sleep;
use tracing::{error, info, warn};

const MAX_BACKOFF: Duration = Duration::from_secs(60);

fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(MAX_BACKOFF)
}

pub struct BroadcastListener {
    broker_url: String,
    channel: String,
    store: Arc<dyn UserStore>,
}

impl BroadcastListener {
    pub fn new(broker_url: String, channel: String, store: Arc<dyn UserStore>) -> Self {
        Self {
            broker_url,
            channel,
            store,
        }
    }

    /// Run the subscription loop for the lifetime of the process.
    ///
    /// Every resubscribe is delayed, including after a clean stream end; a
    /// broker that keeps accepting and closing the subscription would
    /// otherwise be hammered in a tight loop. The task only stops when it
    /// is aborted at shutdown.
    pub async fn run(self) {
        let mut backoff = Duration::from_secs(1);

        loop {
            match self.subscribe_loop().await {
                Ok(()) => {
                    warn!(
                        backoff_secs = backoff.as_secs(),
                        "broadcast subscription ended, resubscribing"
                    );
                    sleep(backoff).await;
                    backoff = Duration::from_secs(1);
                }
                Err(e) => {
                    error!(
                        error = %e,
                        backoff_secs = backoff.as_secs(),
                        "broadcast listener error, reconnecting"
                    );
                    sleep(backoff).await;
                    backoff = next_backoff(backoff);
                }
            }
        }
    }

    async fn subscribe_loop(&self) -> Result<()> {
        // Pub/sub needs a dedicated connection; the shared managed
        // connection cannot SUBSCRIBE.
        let client = redis::Client::open(self.broker_url.as_str())
            .map_err(|e| RegistryError::Broadcast(e.to_string()))?;
        let conn = client
            .get_async_connection()
            .await
            .map_err(|e| RegistryError::Broadcast(e.to_string()))?;
        let mut pubsub = conn.into_pubsub();

        pubsub
            .subscribe(&self.channel)
            .await
            .map_err(|e| RegistryError::Broadcast(e.to_string()))?;

        info!(channel = %self.channel, "subscribed to broadcast channel");

        let mut stream = pubsub.on_message();
        while let Some(msg) = stream.next().await {
            let username: String = match msg.get_payload() {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(error = %e, "ignoring undecodable broadcast payload");
                    continue;
                }
            };
            self.record(&username).await;
        }

        Ok(())
    }

    /// Persist one received username. A failed write is logged and the
    /// message dropped; the channel has no redelivery.
    async fn record(&self, username: &str) {
        match self.store.add_received(username).await {
            Ok(()) => info!(username = %username, "recorded received user"),
            Err(e) => {
                error!(username = %username, error = %e, "failed to record received user");
            }
        }
    }
}
