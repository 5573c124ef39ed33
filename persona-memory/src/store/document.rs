//! Generic document-store interface.
//!
//! Items travel as `serde_json::Value` objects; typed records convert with
//! `serde_json::to_value` / `from_value` at the call site. The interface is
//! the small subset of a managed key-value store this subsystem needs: point
//! lookups, puts, partial last-writer-wins updates with counter increments,
//! and index-backed equality queries.

use serde_json::{Map, Value};

use crate::store::error::StoreError;

/// Primary key of one document: a partition attribute plus an optional sort
/// attribute, both strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentKey {
    pub partition: (String, String),
    pub sort: Option<(String, String)>,
}

impl DocumentKey {
    pub fn simple(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            partition: (name.into(), value.into()),
            sort: None,
        }
    }

    pub fn composite(
        partition_name: impl Into<String>,
        partition_value: impl Into<String>,
        sort_name: impl Into<String>,
        sort_value: impl Into<String>,
    ) -> Self {
        Self {
            partition: (partition_name.into(), partition_value.into()),
            sort: Some((sort_name.into(), sort_value.into())),
        }
    }
}

/// Partial update: `set` fields overwrite, `increment` fields are bumped by
/// one with absent values treated as zero (the store-native
/// `if_not_exists(field, 0) + 1` expression).
#[derive(Debug, Clone, Default)]
pub struct Patch {
    pub set: Map<String, Value>,
    pub increment: Vec<String>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: Value) -> Self {
        self.set.insert(field.into(), value);
        self
    }

    pub fn increment(mut self, field: impl Into<String>) -> Self {
        self.increment.push(field.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.increment.is_empty()
    }
}

/// Equality query against a table or one of its secondary indexes.
#[derive(Debug, Clone)]
pub struct Query {
    /// Secondary index to read; `None` reads the base table.
    pub index: Option<String>,
    /// Partition-key equality (attribute name, value).
    pub partition: (String, String),
    /// Optional sort-key equality on the chosen index.
    pub key_eq: Option<(String, String)>,
    /// Post-read attribute equality filters.
    pub filter_eq: Vec<(String, Value)>,
    /// Sort direction along the index sort key.
    pub descending: bool,
    pub limit: Option<usize>,
}

impl Query {
    pub fn partition(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            index: None,
            partition: (name.into(), value.into()),
            key_eq: None,
            filter_eq: Vec::new(),
            descending: false,
            limit: None,
        }
    }

    pub fn index(mut self, name: impl Into<String>) -> Self {
        self.index = Some(name.into());
        self
    }

    pub fn key_eq(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.key_eq = Some((name.into(), value.into()));
        self
    }

    pub fn filter_eq(mut self, name: impl Into<String>, value: Value) -> Self {
        self.filter_eq.push((name.into(), value));
        self
    }

    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, table: &str, key: &DocumentKey) -> Result<Option<Value>, StoreError>;

    async fn put(&self, table: &str, item: Value) -> Result<(), StoreError>;

    async fn update(&self, table: &str, key: &DocumentKey, patch: Patch) -> Result<(), StoreError>;

    async fn query(&self, table: &str, query: Query) -> Result<Vec<Value>, StoreError>;
}
