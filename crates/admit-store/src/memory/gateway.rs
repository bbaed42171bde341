//! In-memory persistence gateway.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{RwLock, watch};

use crate::error::{GatewayError, Result};
use crate::gateway::PersistenceGateway;
use crate::table::{Filter, Operation, Row, Table};

/// Serializable contents of a [`MemoryGateway`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreSnapshot {
    tables: BTreeMap<Table, Vec<Row>>,
}

impl StoreSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self, table: Table) -> &[Row] {
        self.tables.get(&table).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn push(&mut self, table: Table, row: Row) {
        self.tables.entry(table).or_default().push(row);
    }

    pub fn row_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone)]
struct Fault {
    operation: Operation,
    table: Table,
    message: String,
}

/// Row store held in memory.
///
/// Behaves like the hosted store from the core's point of view: filters are
/// column equalities, writes overlay columns, nothing is transactional.
/// Faults can be injected per operation and table, and writes can be held
/// back to observe in-flight saves.
#[derive(Debug)]
pub struct MemoryGateway {
    tables: RwLock<BTreeMap<Table, Vec<Row>>>,
    faults: Mutex<Vec<Fault>>,
    write_gate: watch::Sender<bool>,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGateway {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::from_snapshot(StoreSnapshot::default())
    }

    /// Create a store pre-filled with the snapshot's rows.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let (write_gate, _) = watch::channel(true);
        Self {
            tables: RwLock::new(snapshot.tables),
            faults: Mutex::new(Vec::new()),
            write_gate,
        }
    }

    /// Copy the current contents out.
    pub async fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            tables: self.tables.read().await.clone(),
        }
    }

    /// Make every `operation` on `table` fail with `message` until cleared.
    pub fn fail_on(&self, operation: Operation, table: Table, message: impl Into<String>) {
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Fault {
                operation,
                table,
                message: message.into(),
            });
    }

    pub fn clear_faults(&self) {
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Hold every write until [`resume_writes`](Self::resume_writes).
    pub fn pause_writes(&self) {
        self.write_gate.send_replace(false);
    }

    pub fn resume_writes(&self) {
        self.write_gate.send_replace(true);
    }

    fn check_fault(&self, operation: Operation, table: Table) -> Result<()> {
        let faults = self.faults.lock().unwrap_or_else(PoisonError::into_inner);
        match faults
            .iter()
            .find(|fault| fault.operation == operation && fault.table == table)
        {
            Some(fault) => Err(GatewayError::backend(
                operation,
                table,
                fault.message.clone(),
            )),
            None => Ok(()),
        }
    }

    async fn wait_for_write_gate(&self) {
        let mut gate = self.write_gate.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = gate.wait_for(|open| *open).await;
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn read_row(&self, table: Table, filter: &Filter) -> Result<Option<Row>> {
        self.check_fault(Operation::Read, table)?;
        let tables = self.tables.read().await;
        Ok(tables
            .get(&table)
            .and_then(|rows| rows.iter().find(|row| filter.matches(row)))
            .cloned())
    }

    async fn read_rows(&self, table: Table, filter: &Filter) -> Result<Vec<Row>> {
        self.check_fault(Operation::Read, table)?;
        let tables = self.tables.read().await;
        Ok(tables
            .get(&table)
            .map(|rows| rows.iter().filter(|row| filter.matches(row)).cloned().collect())
            .unwrap_or_default())
    }

    async fn write_row(&self, table: Table, filter: &Filter, patch: Row) -> Result<()> {
        self.wait_for_write_gate().await;
        self.check_fault(Operation::Write, table)?;
        let mut tables = self.tables.write().await;
        let mut updated = 0usize;
        for row in tables
            .entry(table)
            .or_default()
            .iter_mut()
            .filter(|row| filter.matches(row))
        {
            for (column, value) in &patch {
                row.insert(column.clone(), value.clone());
            }
            updated += 1;
        }
        tracing::debug!(table = %table, updated, "write_row");
        Ok(())
    }

    async fn insert_row(&self, table: Table, mut values: Row) -> Result<Row> {
        self.wait_for_write_gate().await;
        self.check_fault(Operation::Insert, table)?;
        if !values.get("id").is_some_and(Value::is_string) {
            values.insert(
                "id".to_string(),
                Value::String(uuid::Uuid::new_v4().to_string()),
            );
        }
        let mut tables = self.tables.write().await;
        tables.entry(table).or_default().push(values.clone());
        tracing::debug!(table = %table, "insert_row");
        Ok(values)
    }

    async fn delete_rows(&self, table: Table, filter: &Filter) -> Result<u64> {
        self.wait_for_write_gate().await;
        self.check_fault(Operation::Delete, table)?;
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table).or_default();
        let before = rows.len();
        rows.retain(|row| !filter.matches(row));
        let deleted = (before - rows.len()) as u64;
        tracing::debug!(table = %table, deleted, "delete_rows");
        Ok(deleted)
    }

    async fn count(&self, table: Table, filter: &Filter) -> Result<u64> {
        self.check_fault(Operation::Count, table)?;
        let tables = self.tables.read().await;
        Ok(tables
            .get(&table)
            .map(|rows| rows.iter().filter(|row| filter.matches(row)).count() as u64)
            .unwrap_or(0))
    }
}
