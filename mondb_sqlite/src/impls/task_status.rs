use async_trait::async_trait;
use moncore::{
    error::{
        BackendError,
        task::TaskStatusError,
    },
    task_status::{
        TaskStatus,
        TaskStatusFilter,
        TaskStatusKey,
        TaskStatusRecord,
        TaskStatusRecords,
        traits::TaskStatusBackend,
    },
};
use textwrap_macros::dedent;

use crate::SqliteBackend;

#[derive(sqlx::FromRow)]
struct TaskStatusRow {
    name: String,
    uid: String,
    status: i64,
    messages: String,
    description: String,
    start_ts: Option<i64>,
    finish_ts: Option<i64>,
    call_module: String,
    call_func: String,
    call_args: String,
    call_kwargs: String,
    expires_ts: Option<i64>,
    expiring: bool,
}

impl TryFrom<TaskStatusRow> for TaskStatusRecord {
    type Error = BackendError;

    fn try_from(row: TaskStatusRow) -> Result<Self, Self::Error> {
        Ok(Self {
            name: row.name,
            uid: (!row.uid.is_empty()).then_some(row.uid),
            status: TaskStatus::from_i64(row.status)
                .map_err(|e| BackendError::AppInvariantViolation(e.to_string()))?,
            messages: serde_json::from_str(&row.messages)?,
            description: row.description,
            start_ts: row.start_ts,
            finish_ts: row.finish_ts,
            call_module: row.call_module,
            call_func: row.call_func,
            call_args: serde_json::from_str(&row.call_args)?,
            call_kwargs: serde_json::from_str(&row.call_kwargs)?,
            expires_ts: row.expires_ts,
            expiring: row.expiring,
        })
    }
}

// the absent uid is stored as the empty string.
fn uid_column(uid: Option<&str>) -> &str {
    uid.unwrap_or("")
}

async fn upsert_task_status_sqlite(
    sqlite: &SqliteBackend,
    record: &TaskStatusRecord,
) -> Result<(), TaskStatusError> {
    if record.name.is_empty() {
        return Err(TaskStatusError::MissingName);
    }
    let messages = serde_json::to_string(&record.messages)
        .map_err(BackendError::from)?;
    let call_args = serde_json::to_string(&record.call_args)
        .map_err(BackendError::from)?;
    let call_kwargs = serde_json::to_string(&record.call_kwargs)
        .map_err(BackendError::from)?;

    // a single statement so a concurrent upsert of the same key never
    // observes a partially written record.
    sqlx::query(dedent!(r#"
        INSERT INTO task_status (
            name,
            uid,
            status,
            messages,
            description,
            start_ts,
            finish_ts,
            call_module,
            call_func,
            call_args,
            call_kwargs,
            expires_ts,
            expiring
        )
        VALUES ( ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13 )
        ON CONFLICT ( name, uid ) DO UPDATE SET
            status = excluded.status,
            messages = excluded.messages,
            description = excluded.description,
            start_ts = excluded.start_ts,
            finish_ts = excluded.finish_ts,
            call_module = excluded.call_module,
            call_func = excluded.call_func,
            call_args = excluded.call_args,
            call_kwargs = excluded.call_kwargs,
            expires_ts = excluded.expires_ts,
            expiring = excluded.expiring
        "#))
        .bind(&record.name)
        .bind(uid_column(record.uid.as_deref()))
        .bind(i64::from(record.status))
        .bind(messages)
        .bind(&record.description)
        .bind(record.start_ts)
        .bind(record.finish_ts)
        .bind(&record.call_module)
        .bind(&record.call_func)
        .bind(call_args)
        .bind(call_kwargs)
        .bind(record.expires_ts)
        .bind(record.expiring)
        .execute(&*sqlite.pool)
        .await
        .map_err(BackendError::from)?;
    Ok(())
}

async fn delete_task_status_sqlite(
    sqlite: &SqliteBackend,
    key: &TaskStatusKey,
) -> Result<bool, BackendError> {
    let rows_affected = sqlx::query(dedent!(r#"
        DELETE FROM task_status
        WHERE name = ?1 AND uid = ?2
        "#))
        .bind(&key.name)
        .bind(uid_column(key.uid()))
        .execute(&*sqlite.pool)
        .await?
        .rows_affected();
    Ok(rows_affected > 0)
}

async fn get_task_status_sqlite(
    sqlite: &SqliteBackend,
    key: &TaskStatusKey,
) -> Result<Option<TaskStatusRecord>, BackendError> {
    sqlx::query_as::<_, TaskStatusRow>(dedent!(r#"
        SELECT
            name,
            uid,
            status,
            messages,
            description,
            start_ts,
            finish_ts,
            call_module,
            call_func,
            call_args,
            call_kwargs,
            expires_ts,
            expiring
        FROM task_status
        WHERE name = ?1 AND uid = ?2
        "#))
        .bind(&key.name)
        .bind(uid_column(key.uid()))
        .fetch_optional(&*sqlite.pool)
        .await?
        .map(TaskStatusRecord::try_from)
        .transpose()
}

async fn first_task_status_by_name_sqlite(
    sqlite: &SqliteBackend,
    name: &str,
) -> Result<Option<TaskStatusRecord>, BackendError> {
    sqlx::query_as::<_, TaskStatusRow>(dedent!(r#"
        SELECT
            name,
            uid,
            status,
            messages,
            description,
            start_ts,
            finish_ts,
            call_module,
            call_func,
            call_args,
            call_kwargs,
            expires_ts,
            expiring
        FROM task_status
        WHERE name = ?1
        ORDER BY id
        LIMIT 1
        "#))
        .bind(name)
        .fetch_optional(&*sqlite.pool)
        .await?
        .map(TaskStatusRecord::try_from)
        .transpose()
}

async fn list_task_status_sqlite(
    sqlite: &SqliteBackend,
    filter: &TaskStatusFilter,
) -> Result<TaskStatusRecords, BackendError> {
    let rows = sqlx::query_as::<_, TaskStatusRow>(dedent!(r#"
        SELECT
            name,
            uid,
            status,
            messages,
            description,
            start_ts,
            finish_ts,
            call_module,
            call_func,
            call_args,
            call_kwargs,
            expires_ts,
            expiring
        FROM task_status
        WHERE
            (?1 IS NULL OR name = ?1)
            AND (?2 IS NULL OR status = ?2)
        ORDER BY name, uid
        "#))
        .bind(filter.name.as_deref())
        .bind(filter.status.map(i64::from))
        .fetch_all(&*sqlite.pool)
        .await?;
    Ok(rows.into_iter()
        .map(TaskStatusRecord::try_from)
        .collect::<Result<Vec<_>, _>>()?
        .into())
}

#[async_trait]
impl TaskStatusBackend for SqliteBackend {
    async fn upsert_task_status(
        &self,
        record: &TaskStatusRecord,
    ) -> Result<(), TaskStatusError> {
        upsert_task_status_sqlite(&self, record).await
    }

    async fn delete_task_status(
        &self,
        key: &TaskStatusKey,
    ) -> Result<bool, BackendError> {
        delete_task_status_sqlite(&self, key).await
    }

    async fn get_task_status(
        &self,
        key: &TaskStatusKey,
    ) -> Result<Option<TaskStatusRecord>, BackendError> {
        get_task_status_sqlite(&self, key).await
    }

    async fn first_task_status_by_name(
        &self,
        name: &str,
    ) -> Result<Option<TaskStatusRecord>, BackendError> {
        first_task_status_by_name_sqlite(&self, name).await
    }

    async fn list_task_status(
        &self,
        filter: &TaskStatusFilter,
    ) -> Result<TaskStatusRecords, BackendError> {
        list_task_status_sqlite(&self, filter).await
    }
}
