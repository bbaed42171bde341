//! The persistence gateway seam.

use async_trait::async_trait;

use crate::error::Result;
use crate::table::{Filter, Row, Table};

/// A transactional store with row-level access rules.
///
/// Every call is an independent request that may fail on its own. Nothing is
/// grouped into a transaction: callers that read, merge and write a row race
/// with any other writer of that row.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// First row matching the filter, or `None`.
    async fn read_row(&self, table: Table, filter: &Filter) -> Result<Option<Row>>;

    /// Every row matching the filter.
    async fn read_rows(&self, table: Table, filter: &Filter) -> Result<Vec<Row>>;

    /// Overlay `patch` onto every matching row. Matching nothing is not an error.
    async fn write_row(&self, table: Table, filter: &Filter, patch: Row) -> Result<()>;

    /// Insert a row and return it as stored.
    async fn insert_row(&self, table: Table, values: Row) -> Result<Row>;

    /// Delete matching rows and return how many went away.
    async fn delete_rows(&self, table: Table, filter: &Filter) -> Result<u64>;

    /// Number of matching rows.
    async fn count(&self, table: Table, filter: &Filter) -> Result<u64>;
}
