use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;

/// A Telegram chat that receives announcements.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Chat {
    pub id: i64,
    /// IANA zone name used to render scheduled start times.
    pub time_zone: Option<String>,
    pub enabled: bool,
}

/// Enabled chats subscribed to a channel, in subscription order.
#[derive(Debug, Clone)]
pub struct GetSubscribedChats {
    pub channel_id: String,
}

impl Processor<GetSubscribedChats> for DatabaseProcessor {
    type Output = Vec<Chat>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetSubscribedChats")]
    async fn process(&self, query: GetSubscribedChats) -> Result<Vec<Chat>, sqlx::Error> {
        sqlx::query_as::<_, Chat>(
            r#"
            SELECT ch.id, ch.time_zone, ch.enabled
            FROM chats ch
            JOIN subscriptions s ON s.chat_id = ch.id
            WHERE s.channel_id = $1 AND ch.enabled
            ORDER BY s.id
            "#,
        )
        .bind(query.channel_id)
        .fetch_all(&self.pool)
        .await
    }
}
