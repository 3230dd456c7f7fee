//! LeaseRenewer processor.
//!
//! Push-mode consumer of the lease-expiring watch list: asks the hub to
//! (re)subscribe this service's callback to each channel's feed. The hub
//! then confirms through the verification endpoint, which records the new
//! lease.

use crate::events::{WatchedChannel, WatchedChannelReceiver};
use crate::utils::pacing::shutdown_requested;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use streamwatch_sdk::client::{ClientError, HubClient};
use streamwatch_sdk::objects::SubscribeRequest;
use tokio::sync::watch;
use tracing::{debug, error, info};

#[derive(Debug, thiserror::Error)]
pub enum RenewError {
    #[error("hub request failed: {0}")]
    Hub(#[from] ClientError),

    #[error("hub request timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait HubSubscriber: Send + Sync {
    async fn subscribe(&self, channel_id: &str, callback: &str) -> Result<(), RenewError>;
}

/// [`HubSubscriber`] talking to a WebSub hub over HTTP.
#[derive(Debug, Clone)]
pub struct HttpHubSubscriber {
    client: HubClient,
    timeout: Duration,
}

impl HttpHubSubscriber {
    pub fn new(client: HubClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl HubSubscriber for HttpHubSubscriber {
    async fn subscribe(&self, channel_id: &str, callback: &str) -> Result<(), RenewError> {
        let request = SubscribeRequest::subscribe(channel_id, callback);
        tokio::time::timeout(self.timeout, self.client.subscribe(&request))
            .await
            .map_err(|_| RenewError::Timeout(self.timeout))??;
        Ok(())
    }
}

pub struct LeaseRenewer {
    hub: Arc<dyn HubSubscriber>,
    callback: String,
    channel_rx: WatchedChannelReceiver,
    shutdown_rx: watch::Receiver<bool>,
}

impl LeaseRenewer {
    /// `callback` is the public URL of the feed endpoint.
    pub fn new(
        hub: Arc<dyn HubSubscriber>,
        callback: String,
        channel_rx: WatchedChannelReceiver,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            hub,
            callback,
            channel_rx,
            shutdown_rx,
        }
    }

    pub async fn run(mut self) {
        info!(callback = %self.callback, "LeaseRenewer started");

        loop {
            tokio::select! {
                biased;

                _ = shutdown_requested(&mut self.shutdown_rx) => {
                    info!("LeaseRenewer received shutdown signal");
                    break;
                }

                Some(channel) = self.channel_rx.recv() => {
                    self.renew(&channel).await;
                }

                else => {
                    info!("Watch list channel closed");
                    break;
                }
            }
        }

        info!("LeaseRenewer shutdown complete");
    }

    async fn renew(&self, channel: &WatchedChannel) {
        match self.hub.subscribe(&channel.id, &self.callback).await {
            Ok(()) => debug!(channel_id = %channel.id, "Subscription renewal requested"),
            Err(e) => error!(channel_id = %channel.id, error = %e, "Subscription renewal failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::watched_channel_channel;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingHub {
        requests: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl HubSubscriber for RecordingHub {
        async fn subscribe(&self, channel_id: &str, callback: &str) -> Result<(), RenewError> {
            self.requests
                .lock()
                .unwrap()
                .push((channel_id.to_string(), callback.to_string()));
            if channel_id == "UCbroken" {
                return Err(RenewError::Timeout(Duration::from_secs(5)));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_renews_every_channel_despite_failures() {
        let hub = Arc::new(RecordingHub::default());
        let (tx, rx) = watched_channel_channel();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let renewer = LeaseRenewer::new(
            hub.clone(),
            "http://bot.example.com/video".to_string(),
            rx,
            shutdown_rx,
        );
        let handle = tokio::spawn(renewer.run());

        for id in ["UCbroken", "UC2"] {
            tx.send(WatchedChannel {
                id: id.to_string(),
                title: String::new(),
            })
            .await
            .unwrap();
        }
        drop(tx);
        handle.await.unwrap();

        let requests = hub.requests.lock().unwrap().clone();
        assert_eq!(
            requests,
            [
                ("UCbroken".to_string(), "http://bot.example.com/video".to_string()),
                ("UC2".to_string(), "http://bot.example.com/video".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_exits_when_shutdown_sender_dropped() {
        let hub = Arc::new(RecordingHub::default());
        let (_tx, rx) = watched_channel_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let renewer = LeaseRenewer::new(
            hub.clone(),
            "http://bot.example.com/video".to_string(),
            rx,
            shutdown_rx,
        );
        drop(shutdown_tx);

        tokio::time::timeout(Duration::from_secs(1), renewer.run())
            .await
            .unwrap();
        assert!(hub.requests.lock().unwrap().is_empty());
    }
}
