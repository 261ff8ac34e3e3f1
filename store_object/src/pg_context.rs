//! PostgreSQL storage backend
//!
//! Rows travel as JSONB: reads wrap the generated query in `to_jsonb`, writes go
//! through `jsonb_populate_record` so column types come from the table itself.
//! Writes run inside a transaction opened lazily by the first write and
//! finished by `apply_changes` or `discard_changes`.

use crate::errors::StoreError;
use crate::identifier::SqlIdentifier;
use crate::key_value::KeyValue;
use crate::query_builder::QueryBuilder;
use crate::traits::{DataContext, TableRef};
use async_trait::async_trait;
use config::DatabaseConfig;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

// Macro for the shared parameter binding logic
macro_rules! bind_json_param {
    ($query:expr, $param:expr) => {
        match $param {
            serde_json::Value::String(s) => {
                // Try to parse as RFC3339 timestamp first
                if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(&s) {
                    $query.bind(dt.with_timezone(&chrono::Utc))
                // Try to parse as UUID
                } else if let Ok(uuid) = uuid::Uuid::parse_str(&s) {
                    $query.bind(uuid)
                } else {
                    $query.bind(s)
                }
            }
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    if i >= i32::MIN as i64 && i <= i32::MAX as i64 {
                        $query.bind(i as i32)
                    } else {
                        $query.bind(i)
                    }
                } else if let Some(f) = n.as_f64() {
                    $query.bind(f)
                } else {
                    $query.bind(n.to_string())
                }
            }
            serde_json::Value::Bool(b) => $query.bind(b),
            serde_json::Value::Null => $query.bind(Option::<String>::None),
            other => $query.bind(other),
        }
    };
}

/// Build a connection pool from the `[database]` configuration section
pub async fn connect_pool(config: &DatabaseConfig) -> Result<PgPool, StoreError> {
    let mut pool_options = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.idle_timeout_seconds));

    if config.max_lifetime_seconds > 0 {
        pool_options = pool_options.max_lifetime(Duration::from_secs(config.max_lifetime_seconds));
    }

    pool_options
        .connect(&config.connection_string())
        .await
        .map_err(|e| StoreError::database_operation(&config.database, "connect", e))
}

pub struct PgContext {
    pool: PgPool,
    transaction: Mutex<Option<Transaction<'static, Postgres>>>,
    pending: AtomicU64,
}

impl std::fmt::Debug for PgContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgContext")
            .field("pending", &self.pending.load(Ordering::SeqCst))
            .finish()
    }
}

fn bind_all<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: Vec<Value>,
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = bind_json_param!(query, param);
    }
    query
}

fn checked(name: &str) -> Result<SqlIdentifier, StoreError> {
    Ok(SqlIdentifier::column(name)?)
}

fn decode_row(row: &PgRow, table: &str) -> Result<Value, StoreError> {
    row.try_get::<Value, _>("row")
        .map_err(|e| StoreError::database_operation(table, "decode", e))
}

/// Non-key columns of a JSON row, validated
fn row_columns(row: &Value, skip: Option<&str>, keep_nulls: bool) -> Result<Vec<String>, StoreError> {
    let Value::Object(fields) = row else {
        return Err(StoreError::SerializationError(
            "rows must serialize to JSON objects".to_string(),
        ));
    };

    fields
        .iter()
        .filter(|(name, value)| Some(name.as_str()) != skip && (keep_nulls || !value.is_null()))
        .map(|(name, _)| checked(name).map(|id| id.as_str().to_string()))
        .collect()
}

impl PgContext {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            transaction: Mutex::new(None),
            pending: AtomicU64::new(0),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn validate(table: &TableRef, query: &QueryBuilder) -> Result<SqlIdentifier, StoreError> {
        let table_name = SqlIdentifier::table(table.name)?;
        for field in query.referenced_fields() {
            checked(field)?;
        }
        Ok(table_name)
    }

    /// Run a read, inside the open transaction when there is one
    async fn read(&self, table: &str, sql: &str, params: Vec<Value>) -> Result<Vec<PgRow>, StoreError> {
        tracing::trace!(table, sql, "executing read");
        let query = bind_all(sqlx::query(sql), params);
        let mut transaction = self.transaction.lock().await;
        let result = match transaction.as_mut() {
            Some(tx) => query.fetch_all(&mut **tx).await,
            None => query.fetch_all(&self.pool).await,
        };
        result.map_err(|e| StoreError::query_execution(table, sql, e))
    }

    /// Run a write inside the context transaction, opening it first if needed
    async fn write(
        &self,
        table: &str,
        sql: &str,
        query: Query<'_, Postgres, PgArguments>,
    ) -> Result<Option<PgRow>, StoreError> {
        let mut transaction = self.transaction.lock().await;
        if transaction.is_none() {
            tracing::debug!(table, "opening write transaction");
            let tx = self
                .pool
                .begin()
                .await
                .map_err(|e| StoreError::TransactionError(format!("Failed to begin transaction: {}", e)))?;
            *transaction = Some(tx);
        }
        tracing::trace!(table, sql, "executing write");
        let tx = transaction
            .as_mut()
            .ok_or_else(|| StoreError::TransactionError("transaction not open".to_string()))?;

        query
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| StoreError::query_execution(table, sql, e))
    }
}

#[async_trait]
impl DataContext for PgContext {
    async fn fetch(&self, table: &TableRef, query: &QueryBuilder) -> Result<Vec<Value>, StoreError> {
        let table_name = Self::validate(table, query)?;
        let (select, params) = query.build_select(table_name.as_str());
        let sql = format!("SELECT to_jsonb(q) AS row FROM ({}) AS q", select);

        let rows = self.read(table.name, &sql, params).await?;
        rows.iter().map(|row| decode_row(row, table.name)).collect()
    }

    async fn count(&self, table: &TableRef, query: &QueryBuilder) -> Result<u64, StoreError> {
        let table_name = Self::validate(table, query)?;
        let (sql, params) = query.build_count(table_name.as_str());

        let rows = self.read(table.name, &sql, params).await?;
        let total: i64 = match rows.first() {
            Some(row) => row
                .try_get("total")
                .map_err(|e| StoreError::database_operation(table.name, "count", e))?,
            None => 0,
        };
        Ok(total.max(0) as u64)
    }

    async fn insert(&self, table: &TableRef, row: Value) -> Result<Value, StoreError> {
        let table_name = SqlIdentifier::table(table.name)?;
        let columns = row_columns(&row, None, false)?.join(", ");
        let sql = format!(
            "INSERT INTO {t} ({c}) SELECT {c} FROM jsonb_populate_record(NULL::{t}, $1) RETURNING to_jsonb({t}.*) AS row",
            t = table_name,
            c = columns
        );

        let stored = self
            .write(table.name, &sql, sqlx::query(&sql).bind(row))
            .await?
            .ok_or_else(|| StoreError::database_operation(table.name, "insert", "no row returned"))?;

        self.pending.fetch_add(1, Ordering::SeqCst);
        decode_row(&stored, table.name)
    }

    async fn update(&self, table: &TableRef, row: Value) -> Result<Value, StoreError> {
        let table_name = SqlIdentifier::table(table.name)?;
        let primary_key = checked(table.primary_key)?;
        let key = KeyValue::from_row(&row, table.primary_key);
        let columns = row_columns(&row, Some(table.primary_key), true)?;

        let assignment = match columns.len() {
            0 => format!("{pk} = {pk}", pk = primary_key),
            1 => format!(
                "{c} = (SELECT {c} FROM jsonb_populate_record(NULL::{t}, $1))",
                c = columns[0],
                t = table_name
            ),
            _ => format!(
                "({c}) = (SELECT {c} FROM jsonb_populate_record(NULL::{t}, $1))",
                c = columns.join(", "),
                t = table_name
            ),
        };
        let sql = format!(
            "UPDATE {t} SET {a} WHERE {pk} = $2 RETURNING to_jsonb({t}.*) AS row",
            t = table_name,
            a = assignment,
            pk = primary_key
        );

        let query = sqlx::query(&sql).bind(row);
        let query = bind_json_param!(query, key.to_json());
        let stored = self
            .write(table.name, &sql, query)
            .await?
            .ok_or_else(|| StoreError::not_found(table.name, &key))?;

        self.pending.fetch_add(1, Ordering::SeqCst);
        decode_row(&stored, table.name)
    }

    async fn delete(&self, table: &TableRef, key: &KeyValue) -> Result<bool, StoreError> {
        let table_name = SqlIdentifier::table(table.name)?;
        let primary_key = checked(table.primary_key)?;
        let sql = format!(
            "DELETE FROM {} WHERE {} = $1 RETURNING {}",
            table_name, primary_key, primary_key
        );

        let query = sqlx::query(&sql);
        let query = bind_json_param!(query, key.to_json());
        let deleted = self.write(table.name, &sql, query).await?.is_some();

        if deleted {
            self.pending.fetch_add(1, Ordering::SeqCst);
        }
        Ok(deleted)
    }

    async fn apply_changes(&self) -> Result<u64, StoreError> {
        if let Some(tx) = self.transaction.lock().await.take() {
            tx.commit()
                .await
                .map_err(|e| StoreError::TransactionError(format!("Failed to commit transaction: {}", e)))?;
        }
        Ok(self.pending.swap(0, Ordering::SeqCst))
    }

    async fn discard_changes(&self) -> Result<(), StoreError> {
        self.pending.store(0, Ordering::SeqCst);
        if let Some(tx) = self.transaction.lock().await.take() {
            tx.rollback()
                .await
                .map_err(|e| StoreError::TransactionError(format!("Failed to rollback transaction: {}", e)))?;
        }
        Ok(())
    }
}
