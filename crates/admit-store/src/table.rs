//! Tables, rows and filters understood by the gateway.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A raw row: column name to JSON value.
pub type Row = Map<String, Value>;

/// Tables the core reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Applications,
    Documents,
    DocumentTypes,
    OfferLetters,
    Programs,
    BankAccounts,
    Students,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Applications => "applications",
            Table::Documents => "documents",
            Table::DocumentTypes => "document_types",
            Table::OfferLetters => "offer_letters",
            Table::Programs => "programs",
            Table::BankAccounts => "bank_accounts",
            Table::Students => "students",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gateway operation, used in error reports and fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Write,
    Insert,
    Delete,
    Count,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::Write => "write",
            Operation::Insert => "insert",
            Operation::Delete => "delete",
            Operation::Count => "count",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single column condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String, Value),
    NotEq(String, Value),
    In(String, Vec<Value>),
}

impl Condition {
    fn matches(&self, row: &Row) -> bool {
        let column = |name: &str| row.get(name).unwrap_or(&Value::Null);
        match self {
            Condition::Eq(name, value) => column(name) == value,
            Condition::NotEq(name, value) => column(name) != value,
            Condition::In(name, values) => values.contains(column(name)),
        }
    }
}

/// Conjunction of column conditions. An empty filter matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for `Filter::new().eq("id", id)`.
    pub fn by_id(id: &str) -> Self {
        Self::new().eq("id", id)
    }

    #[must_use]
    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::Eq(column.to_string(), value.into()));
        self
    }

    #[must_use]
    pub fn neq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::NotEq(column.to_string(), value.into()));
        self
    }

    #[must_use]
    pub fn is_in<I, V>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.conditions.push(Condition::In(
            column.to_string(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.conditions.iter().all(|condition| condition.matches(row))
    }
}
