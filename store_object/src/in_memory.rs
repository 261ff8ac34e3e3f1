//! In-memory storage backend
//!
//! [`InMemoryDatabase`] holds committed tables shared by every context created
//! from it. An [`InMemoryContext`] copies the committed tables on its first write
//! and records each staged write. `apply_changes` replays those writes against
//! the tables as committed at that moment, so commits made by other contexts in
//! the meantime are kept.

use crate::errors::StoreError;
use crate::key_value::KeyValue;
use crate::query_builder::QueryBuilder;
use crate::traits::{DataContext, TableRef};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

type Tables = HashMap<String, Vec<Value>>;

#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new unit of work
    pub fn context(&self) -> InMemoryContext {
        InMemoryContext {
            database: self.clone(),
            working: Mutex::new(None),
        }
    }

    /// Replace the committed rows of `table`
    pub async fn seed(&self, table: &str, rows: Vec<Value>) {
        self.tables.write().await.insert(table.to_string(), rows);
    }

    /// Committed rows of `table`
    pub async fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .read()
            .await
            .get(table)
            .cloned()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
enum StagedWrite {
    Insert { table: TableRef, row: Value },
    Update { table: TableRef, row: Value },
    Delete { table: TableRef, key: KeyValue },
}

impl StagedWrite {
    fn apply(&self, tables: &mut Tables) -> Result<(), StoreError> {
        match self {
            StagedWrite::Insert { table, row } => {
                let rows = tables.entry(table.name.to_string()).or_default();
                let key = KeyValue::from_row(row, table.primary_key);
                if position_of(rows, table.primary_key, &key).is_some() {
                    return Err(StoreError::DuplicateKey {
                        table: table.name.to_string(),
                        key: key.to_string(),
                    });
                }
                rows.push(row.clone());
            }
            StagedWrite::Update { table, row } => {
                let rows = tables.entry(table.name.to_string()).or_default();
                let key = KeyValue::from_row(row, table.primary_key);
                let index = position_of(rows, table.primary_key, &key)
                    .ok_or_else(|| StoreError::not_found(table.name, &key))?;
                rows[index] = row.clone();
            }
            StagedWrite::Delete { table, key } => {
                let rows = tables.entry(table.name.to_string()).or_default();
                let index = position_of(rows, table.primary_key, key)
                    .ok_or_else(|| StoreError::not_found(table.name, key))?;
                rows.remove(index);
            }
        }
        Ok(())
    }
}

/// Private copy of the tables plus the writes that produced it
#[derive(Debug)]
struct Working {
    tables: Tables,
    staged: Vec<StagedWrite>,
}

#[derive(Debug)]
pub struct InMemoryContext {
    database: InMemoryDatabase,
    working: Mutex<Option<Working>>,
}

impl InMemoryContext {
    async fn read_table(&self, table: &str) -> Vec<Value> {
        if let Some(working) = self.working.lock().await.as_ref() {
            return working.tables.get(table).cloned().unwrap_or_default();
        }
        self.database.rows(table).await
    }

    /// Build a write from the working copy of `table`, apply it there and record it
    async fn stage<T>(
        &self,
        table: &str,
        build: impl FnOnce(&[Value]) -> Result<(Option<StagedWrite>, T), StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.working.lock().await;
        if guard.is_none() {
            let tables = self.database.tables.read().await.clone();
            *guard = Some(Working {
                tables,
                staged: Vec::new(),
            });
        }
        let working = guard.get_or_insert_with(|| Working {
            tables: Tables::new(),
            staged: Vec::new(),
        });

        let rows = working.tables.get(table).map(Vec::as_slice).unwrap_or_default();
        let (write, output) = build(rows)?;
        if let Some(write) = write {
            write.apply(&mut working.tables)?;
            working.staged.push(write);
        }
        Ok(output)
    }

    pub async fn has_pending_changes(&self) -> bool {
        self.working
            .lock()
            .await
            .as_ref()
            .is_some_and(|working| !working.staged.is_empty())
    }
}

fn next_numeric_key(rows: &[Value], primary_key: &str) -> i64 {
    rows.iter()
        .filter_map(|row| row.get(primary_key).and_then(Value::as_i64))
        .max()
        .unwrap_or(0)
        + 1
}

fn position_of(rows: &[Value], primary_key: &str, key: &KeyValue) -> Option<usize> {
    rows.iter()
        .position(|row| &KeyValue::from_row(row, primary_key) == key)
}

#[async_trait]
impl DataContext for InMemoryContext {
    async fn fetch(&self, table: &TableRef, query: &QueryBuilder) -> Result<Vec<Value>, StoreError> {
        Ok(query.apply(self.read_table(table.name).await))
    }

    async fn count(&self, table: &TableRef, query: &QueryBuilder) -> Result<u64, StoreError> {
        Ok(query.count(self.read_table(table.name).await) as u64)
    }

    async fn insert(&self, table: &TableRef, mut row: Value) -> Result<Value, StoreError> {
        self.stage(table.name, |rows| {
            if KeyValue::from_row(&row, table.primary_key).is_null() {
                let next = next_numeric_key(rows, table.primary_key);
                if let Value::Object(fields) = &mut row {
                    fields.insert(table.primary_key.to_string(), Value::from(next));
                }
            }
            let write = StagedWrite::Insert {
                table: *table,
                row: row.clone(),
            };
            Ok((Some(write), row))
        })
        .await
    }

    async fn update(&self, table: &TableRef, row: Value) -> Result<Value, StoreError> {
        self.stage(table.name, |rows| {
            let key = KeyValue::from_row(&row, table.primary_key);
            if position_of(rows, table.primary_key, &key).is_none() {
                return Err(StoreError::not_found(table.name, &key));
            }
            let write = StagedWrite::Update {
                table: *table,
                row: row.clone(),
            };
            Ok((Some(write), row))
        })
        .await
    }

    async fn delete(&self, table: &TableRef, key: &KeyValue) -> Result<bool, StoreError> {
        self.stage(table.name, |rows| {
            let write = position_of(rows, table.primary_key, key).map(|_| StagedWrite::Delete {
                table: *table,
                key: key.clone(),
            });
            let removed = write.is_some();
            Ok((write, removed))
        })
        .await
    }

    async fn apply_changes(&self) -> Result<u64, StoreError> {
        let Some(working) = self.working.lock().await.take() else {
            return Ok(0);
        };

        let mut committed = self.database.tables.write().await;
        let mut replayed = committed.clone();
        for write in &working.staged {
            write.apply(&mut replayed)?;
        }
        *committed = replayed;
        Ok(working.staged.len() as u64)
    }

    async fn discard_changes(&self) -> Result<(), StoreError> {
        self.working.lock().await.take();
        Ok(())
    }
}
