//! PostgreSQL connection pool and the JSONB document sink.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};

use filepipe_core::config::PostgresConfig;
use filepipe_core::Record;
use filepipe_queue::{DocumentSink, SinkError};

/// Create a PostgreSQL connection pool and ensure the target table exists.
/// Returns None if credentials are not configured or the connect fails —
/// the server still starts, and jobs fail at their first bulk write.
pub async fn init_pg_pool(config: &PostgresConfig) -> Option<PgPool> {
    if !config.is_configured() {
        warn!("PG_USERNAME not set — ingestion jobs will fail until PostgreSQL is configured");
        return None;
    }

    match PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.connection_string())
        .await
    {
        Ok(pool) => {
            info!("PostgreSQL connected: {}", config.host);
            if let Err(e) = ensure_table(&pool, &config.table).await {
                warn!("failed to create table '{}': {} — ingestion jobs will fail at write time", config.table, e);
            }
            Some(pool)
        }
        Err(e) => {
            warn!("failed to connect to PostgreSQL: {} — ingestion jobs will fail at write time", e);
            None
        }
    }
}

async fn ensure_table(pool: &PgPool, table: &str) -> Result<(), sqlx::Error> {
    let ddl = format!(
        "CREATE TABLE IF NOT EXISTS {} (id BIGSERIAL PRIMARY KEY, doc JSONB NOT NULL)",
        table
    );
    sqlx::query(&ddl).execute(pool).await?;
    Ok(())
}

/// Document sink writing record batches as JSONB rows.
pub struct PgSink {
    pool: Option<PgPool>,
}

impl PgSink {
    pub fn new(pool: Option<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentSink for PgSink {
    async fn bulk_insert(&self, collection: &str, records: &[Record]) -> Result<(), SinkError> {
        let pool = self
            .pool
            .as_ref()
            .ok_or_else(|| SinkError::NotConfigured("PostgreSQL".into()))?;

        if records.is_empty() {
            return Ok(());
        }

        let docs: Vec<serde_json::Value> = records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<_, _>>()
            .map_err(|e| SinkError::BulkInsert(format!("serialize record: {}", e)))?;

        let mut builder = sqlx::QueryBuilder::<sqlx::Postgres>::new(format!(
            "INSERT INTO {} (doc) ",
            collection
        ));
        builder.push_values(docs, |mut row, doc| {
            row.push_bind(doc);
        });
        builder
            .build()
            .execute(pool)
            .await
            .map_err(|e| SinkError::BulkInsert(e.to_string()))?;
        Ok(())
    }
}
