//! WebSub hub client.

use reqwest::Client;
use url::Url;

use super::ClientError;
use crate::objects::websub::{HUB_URL, SubscribeRequest};

#[derive(Debug, Clone)]
pub struct HubClient {
    http: Client,
    hub_url: Url,
}

impl HubClient {
    pub fn new() -> Result<Self, ClientError> {
        Ok(Self {
            http: Client::new(),
            hub_url: Url::parse(HUB_URL)?,
        })
    }

    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    pub fn with_hub_url(mut self, hub_url: Url) -> Self {
        self.hub_url = hub_url;
        self
    }

    /// Form-POST a subscription request. Any non-2xx answer is an error.
    ///
    /// With `hub.verify=async` the hub answers `202 Accepted` and verifies
    /// the intent later through a GET on the callback.
    pub async fn subscribe(&self, request: &SubscribeRequest) -> Result<(), ClientError> {
        let resp = self
            .http
            .post(self.hub_url.clone())
            .form(request)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Api { status, body });
        }
        Ok(())
    }
}
