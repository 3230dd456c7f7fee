use crate::entities::StreamPhase;
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;

/// Completion record of a stream. `done_live` implies `done_upcoming`.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct DoneStream {
    pub id: String,
    pub done_upcoming: bool,
    pub done_live: bool,
}

impl DoneStream {
    pub fn is_done(&self, phase: StreamPhase) -> bool {
        match phase {
            StreamPhase::Upcoming => self.done_upcoming,
            StreamPhase::Live => self.done_live,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GetDoneStream {
    pub stream_id: String,
}

impl Processor<GetDoneStream> for DatabaseProcessor {
    type Output = Option<DoneStream>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetDoneStream")]
    async fn process(&self, query: GetDoneStream) -> Result<Option<DoneStream>, sqlx::Error> {
        sqlx::query_as::<_, DoneStream>(
            "SELECT id, done_upcoming, done_live FROM done_streams WHERE id = $1",
        )
        .bind(query.stream_id)
        .fetch_optional(&self.pool)
        .await
    }
}

/// Mark a phase complete. Flags only ever flip to `true`; marking the live
/// phase marks the upcoming phase as well.
#[derive(Debug, Clone)]
pub struct MarkStreamDone {
    pub stream_id: String,
    pub phase: StreamPhase,
}

impl Processor<MarkStreamDone> for DatabaseProcessor {
    type Output = ();
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:MarkStreamDone")]
    async fn process(&self, update: MarkStreamDone) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO done_streams (id, done_upcoming, done_live)
            VALUES ($1, TRUE, $2)
            ON CONFLICT (id) DO UPDATE
            SET done_upcoming = TRUE,
                done_live = done_streams.done_live OR EXCLUDED.done_live
            "#,
        )
        .bind(update.stream_id)
        .bind(update.phase == StreamPhase::Live)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
