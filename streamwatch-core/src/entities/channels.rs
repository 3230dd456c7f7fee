use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;

/// A YouTube channel on the watch list.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Channel {
    pub id: String,
    pub title: String,
    /// Lease granted by the hub on the last verified subscription.
    pub lease_seconds: Option<i32>,
    pub last_update: time::OffsetDateTime,
}

/// Channels that at least one chat subscribes to.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListActiveChannels;

impl Processor<ListActiveChannels> for DatabaseProcessor {
    type Output = Vec<Channel>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListActiveChannels")]
    async fn process(&self, _query: ListActiveChannels) -> Result<Vec<Channel>, sqlx::Error> {
        sqlx::query_as::<_, Channel>(
            r#"
            SELECT c.id, c.title, c.lease_seconds, c.last_update
            FROM channels c
            WHERE EXISTS (SELECT 1 FROM subscriptions s WHERE s.channel_id = c.id)
            ORDER BY c.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }
}

/// Subscribed channels whose hub lease is unknown or ends within `margin`.
#[derive(Debug, Clone, Copy)]
pub struct ListLeaseExpiringChannels {
    pub margin: std::time::Duration,
}

impl Processor<ListLeaseExpiringChannels> for DatabaseProcessor {
    type Output = Vec<Channel>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListLeaseExpiringChannels")]
    async fn process(&self, query: ListLeaseExpiringChannels) -> Result<Vec<Channel>, sqlx::Error> {
        sqlx::query_as::<_, Channel>(
            r#"
            SELECT c.id, c.title, c.lease_seconds, c.last_update
            FROM channels c
            WHERE EXISTS (SELECT 1 FROM subscriptions s WHERE s.channel_id = c.id)
              AND (
                c.lease_seconds IS NULL
                OR c.last_update + make_interval(secs => c.lease_seconds)
                   < NOW() + make_interval(secs => $1::double precision)
              )
            ORDER BY c.id
            "#,
        )
        .bind(query.margin.as_secs_f64())
        .fetch_all(&self.pool)
        .await
    }
}

/// Record a freshly verified lease. Output is the number of rows touched,
/// zero when the channel is not on the watch list.
#[derive(Debug, Clone)]
pub struct StoreChannelLease {
    pub channel_id: String,
    pub lease_seconds: i32,
}

impl Processor<StoreChannelLease> for DatabaseProcessor {
    type Output = u64;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:StoreChannelLease")]
    async fn process(&self, update: StoreChannelLease) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE channels SET lease_seconds = $2, last_update = NOW() WHERE id = $1",
        )
        .bind(update.channel_id)
        .bind(update.lease_seconds)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
