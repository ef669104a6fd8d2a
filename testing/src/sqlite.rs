use moncore::platform::ConnectorOption;
use mondb_sqlite::SqliteBackend;

pub async fn create_sqlite_backend() -> anyhow::Result<SqliteBackend> {
    Ok(SqliteBackend::connect(ConnectorOption::from("sqlite::memory:"))
        .await?
        .migrate()
        .await?)
}
