//! Telegram Bot API client, limited to sending text messages.

use reqwest::Client;
use url::Url;

use super::ClientError;
use crate::objects::telegram::{ApiResponse, SendMessage, SentMessage};

#[derive(Debug, Clone)]
pub struct TelegramClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl TelegramClient {
    pub const DEFAULT_BASE_URL: &str = "https://api.telegram.org/";

    pub fn new(token: impl Into<String>) -> Result<Self, ClientError> {
        Ok(Self {
            http: Client::new(),
            base_url: Url::parse(Self::DEFAULT_BASE_URL)?,
            token: token.into(),
        })
    }

    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Endpoint of a Bot API method. Tokens look like `123456:secret`, so the
    /// path is joined as `./bot…` to keep the token from parsing as a scheme.
    fn method_url(&self, method: &str) -> Result<Url, ClientError> {
        Ok(self
            .base_url
            .join(&format!("./bot{}/{method}", self.token))?)
    }

    /// `POST bot<token>/sendMessage`
    ///
    /// Telegram reports failures both through the status code and the
    /// `ok` flag of the envelope, so the body is parsed either way.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<i64, ClientError> {
        let url = self.method_url("sendMessage")?;
        let body = SendMessage {
            chat_id,
            text,
            disable_web_page_preview: None,
        };
        let resp = self.http.post(url).json(&body).send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;
        let envelope: ApiResponse<SentMessage> = match serde_json::from_slice(&bytes) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(ClientError::Api {
                    status,
                    body: String::from_utf8_lossy(&bytes).into_owned(),
                });
            }
            Err(e) => return Err(ClientError::Json(e)),
        };
        match envelope {
            ApiResponse {
                ok: true,
                result: Some(message),
                ..
            } => Ok(message.message_id),
            ApiResponse {
                error_code,
                description,
                ..
            } => Err(ClientError::Telegram {
                code: error_code,
                description: description.unwrap_or_else(|| status.to_string()),
            }),
        }
    }
}
