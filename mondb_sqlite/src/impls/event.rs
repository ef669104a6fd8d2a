use async_trait::async_trait;
use moncore::{
    error::BackendError,
    event::{
        Event,
        EventAction,
        Events,
        traits::EventBackend,
    },
};
use textwrap_macros::dedent;

use crate::{
    SqliteBackend,
    chrono::Utc,
};

#[derive(sqlx::FromRow)]
struct EventRow {
    id: i64,
    action: String,
    user: String,
    request: Option<String>,
    message: String,
    context: String,
    created_ts: i64,
}

impl TryFrom<EventRow> for Event {
    type Error = BackendError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            action: row.action.parse::<EventAction>()
                .map_err(|e| BackendError::AppInvariantViolation(e.to_string()))?,
            user: serde_json::from_str(&row.user)?,
            request: row.request
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            message: row.message,
            context: serde_json::from_str(&row.context)?,
            created_ts: row.created_ts,
        })
    }
}

async fn record_event_sqlite(
    sqlite: &SqliteBackend,
    event: &Event,
) -> Result<i64, BackendError> {
    let created_ts = Utc::now().timestamp();
    let user = serde_json::to_string(&event.user)?;
    let request = event.request
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    let context = serde_json::to_string(&event.context)?;

    let id = sqlx::query(dedent!(r#"
        INSERT INTO event (
            action,
            user,
            request,
            message,
            context,
            created_ts
        )
        VALUES ( ?1, ?2, ?3, ?4, ?5, ?6 )
        "#))
        .bind(event.action.as_str())
        .bind(user)
        .bind(request)
        .bind(&event.message)
        .bind(context)
        .bind(created_ts)
        .execute(&*sqlite.pool)
        .await?
        .last_insert_rowid();
    log::trace!("recorded event {id} ({})", event.action.as_str());
    Ok(id)
}

async fn list_events_sqlite(
    sqlite: &SqliteBackend,
    action: Option<EventAction>,
) -> Result<Events, BackendError> {
    let rows = sqlx::query_as::<_, EventRow>(dedent!(r#"
        SELECT
            id,
            action,
            user,
            request,
            message,
            context,
            created_ts
        FROM event
        WHERE ?1 IS NULL OR action = ?1
        ORDER BY id
        "#))
        .bind(action.map(|action| action.as_str()))
        .fetch_all(&*sqlite.pool)
        .await?;
    Ok(rows.into_iter()
        .map(Event::try_from)
        .collect::<Result<Vec<_>, _>>()?
        .into())
}

#[async_trait]
impl EventBackend for SqliteBackend {
    async fn record_event(
        &self,
        event: &Event,
    ) -> Result<i64, BackendError> {
        record_event_sqlite(&self, event).await
    }

    async fn list_events(
        &self,
        action: Option<EventAction>,
    ) -> Result<Events, BackendError> {
        list_events_sqlite(&self, action).await
    }
}

#[cfg(test)]
mod tests {
    use moncore::event::{
        Event,
        EventAction,
        EventRequest,
        EventUser,
        traits::EventBackend,
    };
    use serde_json::json;
    use test_mon::chrono::set_timestamp;
    use crate::impls::tests::backend;

    #[async_std::test]
    async fn test_record_list() -> anyhow::Result<()> {
        let backend = backend().await?;
        let failure = Event::new(EventAction::SystemTaskException)
            .message("Task sync encountered an error: boom");
        let id = EventBackend::record_event(&backend, &failure).await?;
        assert_eq!(id, 1);

        set_timestamp(1234567900);
        let update = Event::new(EventAction::ModelUpdated)
            .user(EventUser::new(1, "admin"))
            .request(EventRequest {
                request_id: Some("abc".into()),
                method: "PATCH".into(),
                path: "/api/users/1/".into(),
            })
            .context("diff", json!({"values_changed": {}}));
        let id = EventBackend::record_event(&backend, &update).await?;
        assert_eq!(id, 2);

        let events = EventBackend::list_events(&backend, None).await?;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].created_ts, 1234567890);
        assert_eq!(events[0].user, EventUser::system());
        assert_eq!(events[0].request, None);
        assert_eq!(events[1], Event {
            id: 2,
            created_ts: 1234567900,
            .. update
        });

        let failures = EventBackend::list_events(
            &backend, Some(EventAction::SystemTaskException),
        ).await?;
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].message, "Task sync encountered an error: boom");
        assert!(EventBackend::list_events(
            &backend, Some(EventAction::ModelCreated),
        ).await?.is_empty());
        Ok(())
    }
}
