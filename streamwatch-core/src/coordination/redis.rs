use super::{LockError, LockLease, LockService};
use async_trait::async_trait;
use fred::clients::RedisClient;
use fred::interfaces::{ClientLike, KeysInterface, LuaInterface};
use fred::types::{Expiration, RedisConfig, SetOptions};
use std::time::Duration;
use uuid::Uuid;

/// Deletes the key only while it still holds the caller's token.
const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

/// [`LockService`] on a single Redis instance using `SET NX PX`.
#[derive(Clone)]
pub struct RedisLockService {
    client: RedisClient,
    timeout: Duration,
}

impl RedisLockService {
    /// Connect to `url` and wait for the connection to come up.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, LockError> {
        let config = RedisConfig::from_url(url)?;
        let client = RedisClient::new(config, None, None, None);
        client.init().await?;
        tracing::info!("Connected to Redis");
        Ok(Self { client, timeout })
    }

    pub async fn quit(&self) -> Result<(), LockError> {
        self.client.quit().await?;
        Ok(())
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, fred::error::RedisError>>,
    ) -> Result<T, LockError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(LockError::Timeout(self.timeout)),
        }
    }
}

#[async_trait]
impl LockService for RedisLockService {
    async fn try_acquire(&self, key: &str, ttl: Duration) -> Result<Option<LockLease>, LockError> {
        let token = Uuid::new_v4().to_string();
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let reply: Option<String> = self
            .bounded(self.client.set(
                key.to_owned(),
                token.clone(),
                Some(Expiration::PX(ttl_ms)),
                Some(SetOptions::NX),
                false,
            ))
            .await?;
        Ok(reply.map(|_| LockLease {
            key: key.to_owned(),
            token,
        }))
    }

    async fn release(&self, lease: &LockLease) -> Result<bool, LockError> {
        let removed: i64 = self
            .bounded(self.client.eval(
                RELEASE_SCRIPT,
                vec![lease.key.clone()],
                vec![lease.token.clone()],
            ))
            .await?;
        Ok(removed > 0)
    }
}
