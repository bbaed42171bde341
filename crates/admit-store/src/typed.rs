//! Typed helpers over raw gateway rows.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{GatewayError, Result};
use crate::gateway::PersistenceGateway;
use crate::table::{Filter, Row, Table};

/// Decode a raw row into a model type.
pub fn decode_row<T: DeserializeOwned>(table: Table, row: Row) -> Result<T> {
    serde_json::from_value(Value::Object(row)).map_err(|e| GatewayError::Decode { table, source: e })
}

/// Encode a model value as a raw row.
pub fn encode_row<T: Serialize>(table: Table, value: &T) -> Result<Row> {
    match serde_json::to_value(value) {
        Ok(Value::Object(row)) => Ok(row),
        Ok(other) => Err(GatewayError::Decode {
            table,
            source: serde::de::Error::custom(format!("expected an object, got {other}")),
        }),
        Err(e) => Err(GatewayError::Decode { table, source: e }),
    }
}

/// Read and decode the first matching row.
pub async fn fetch_one<T: DeserializeOwned>(
    gateway: &dyn PersistenceGateway,
    table: Table,
    filter: &Filter,
) -> Result<Option<T>> {
    gateway
        .read_row(table, filter)
        .await?
        .map(|row| decode_row(table, row))
        .transpose()
}

/// Read and decode every matching row.
pub async fn fetch_all<T: DeserializeOwned>(
    gateway: &dyn PersistenceGateway,
    table: Table,
    filter: &Filter,
) -> Result<Vec<T>> {
    gateway
        .read_rows(table, filter)
        .await?
        .into_iter()
        .map(|row| decode_row(table, row))
        .collect()
}

/// Insert a model value and decode the stored row back.
pub async fn insert_record<T>(gateway: &dyn PersistenceGateway, table: Table, value: &T) -> Result<T>
where
    T: Serialize + DeserializeOwned + Sync,
{
    let row = encode_row(table, value)?;
    let stored = gateway.insert_row(table, row).await?;
    decode_row(table, stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryGateway;
    use admit_model::{Program, ProgramId, UniversityId};

    fn program() -> Program {
        Program {
            id: ProgramId::new("p1"),
            university_id: UniversityId::new("u1"),
            name: "Civil Engineering".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_then_fetch() {
        let gateway = MemoryGateway::new();
        insert_record(&gateway, Table::Programs, &program())
            .await
            .unwrap();

        let loaded: Option<Program> = fetch_one(&gateway, Table::Programs, &Filter::by_id("p1"))
            .await
            .unwrap();
        assert_eq!(loaded, Some(program()));

        let all: Vec<Program> = fetch_all(&gateway, Table::Programs, &Filter::new())
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn test_decode_reports_table() {
        let mut row = Row::new();
        row.insert("id".to_string(), Value::from("p1"));
        let err = decode_row::<Program>(Table::Programs, row).unwrap_err();
        assert!(matches!(err, GatewayError::Decode { table: Table::Programs, .. }));
    }
}
