//! In-memory document and blob stores.
//!
//! Used by the test suite (and usable as a local dev backend). Tables and
//! secondary indexes are declared up front, mirroring the production schema,
//! so queries behave like their DynamoDB counterparts. Per-operation fault
//! injection lets tests drive the partial-failure paths of the save pipeline.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use serde_json::Value;

use crate::store::{
    blob::BlobStore,
    document::{DocumentKey, DocumentStore, Patch, Query},
    error::StoreError,
};

#[derive(Debug, Clone)]
struct IndexSchema {
    partition_attr: String,
    sort_attr: String,
}

#[derive(Debug, Default)]
struct Table {
    partition_attr: String,
    sort_attr: Option<String>,
    indexes: HashMap<String, IndexSchema>,
    /// Keyed by (partition value, sort value) so puts overwrite.
    items: BTreeMap<(String, String), Value>,
}

#[derive(Default)]
pub struct InMemoryDocumentStore {
    tables: Mutex<HashMap<String, Table>>,
    fail_gets: AtomicBool,
    fail_puts: AtomicBool,
    fail_updates: AtomicBool,
    fail_queries: AtomicBool,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_table(
        &self,
        name: impl Into<String>,
        partition_attr: impl Into<String>,
        sort_attr: Option<&str>,
    ) {
        let mut tables = self.tables.lock().unwrap();
        tables.insert(
            name.into(),
            Table {
                partition_attr: partition_attr.into(),
                sort_attr: sort_attr.map(str::to_string),
                indexes: HashMap::new(),
                items: BTreeMap::new(),
            },
        );
    }

    pub fn define_index(
        &self,
        table: &str,
        index: impl Into<String>,
        partition_attr: impl Into<String>,
        sort_attr: impl Into<String>,
    ) {
        let mut tables = self.tables.lock().unwrap();
        if let Some(table) = tables.get_mut(table) {
            table.indexes.insert(
                index.into(),
                IndexSchema {
                    partition_attr: partition_attr.into(),
                    sort_attr: sort_attr.into(),
                },
            );
        }
    }

    pub fn set_fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of every item in a table, for test assertions.
    pub fn dump(&self, table: &str) -> Vec<Value> {
        let tables = self.tables.lock().unwrap();
        tables
            .get(table)
            .map(|t| t.items.values().cloned().collect())
            .unwrap_or_default()
    }

    fn injected(flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Transport(anyhow::anyhow!(
                "injected store failure"
            )));
        }
        Ok(())
    }

    fn string_attr(item: &Value, attr: &str) -> String {
        item.get(attr)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }
}

#[async_trait::async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, table: &str, key: &DocumentKey) -> Result<Option<Value>, StoreError> {
        Self::injected(&self.fail_gets)?;
        let tables = self.tables.lock().unwrap();
        let table = tables
            .get(table)
            .ok_or_else(|| StoreError::Transport(anyhow::anyhow!("unknown table: {table}")))?;

        let sort_value = key.sort.as_ref().map(|(_, v)| v.clone()).unwrap_or_default();
        Ok(table
            .items
            .get(&(key.partition.1.clone(), sort_value))
            .cloned())
    }

    async fn put(&self, table: &str, item: Value) -> Result<(), StoreError> {
        Self::injected(&self.fail_puts)?;
        let mut tables = self.tables.lock().unwrap();
        let table = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::Transport(anyhow::anyhow!("unknown table: {table}")))?;

        let partition_value = Self::string_attr(&item, &table.partition_attr);
        let sort_value = table
            .sort_attr
            .as_deref()
            .map(|attr| Self::string_attr(&item, attr))
            .unwrap_or_default();
        table.items.insert((partition_value, sort_value), item);
        Ok(())
    }

    async fn update(&self, table: &str, key: &DocumentKey, patch: Patch) -> Result<(), StoreError> {
        Self::injected(&self.fail_updates)?;
        let mut tables = self.tables.lock().unwrap();
        let table = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::Transport(anyhow::anyhow!("unknown table: {table}")))?;

        let sort_value = key.sort.as_ref().map(|(_, v)| v.clone()).unwrap_or_default();
        let item = table
            .items
            .get_mut(&(key.partition.1.clone(), sort_value))
            .ok_or_else(|| StoreError::Transport(anyhow::anyhow!("item not found")))?;

        let Some(object) = item.as_object_mut() else {
            return Err(StoreError::Decode(anyhow::anyhow!("item is not an object")));
        };

        for (field, value) in patch.set {
            object.insert(field, value);
        }
        for field in patch.increment {
            let current = object.get(&field).and_then(Value::as_u64).unwrap_or(0);
            object.insert(field, Value::from(current + 1));
        }
        Ok(())
    }

    async fn query(&self, table: &str, query: Query) -> Result<Vec<Value>, StoreError> {
        Self::injected(&self.fail_queries)?;
        let tables = self.tables.lock().unwrap();
        let table = tables
            .get(table)
            .ok_or_else(|| StoreError::Transport(anyhow::anyhow!("unknown table: {table}")))?;

        let sort_attr = match &query.index {
            Some(index) => {
                let schema = table.indexes.get(index).ok_or_else(|| {
                    StoreError::Transport(anyhow::anyhow!("unknown index: {index}"))
                })?;
                Some(schema.sort_attr.clone())
            }
            None => table.sort_attr.clone(),
        };

        let mut matches: Vec<Value> = table
            .items
            .values()
            .filter(|item| Self::string_attr(item, &query.partition.0) == query.partition.1)
            .filter(|item| match &query.key_eq {
                Some((name, value)) => &Self::string_attr(item, name) == value,
                None => true,
            })
            .cloned()
            .collect();

        if let Some(sort_attr) = sort_attr {
            matches.sort_by_key(|item| Self::string_attr(item, &sort_attr));
        }
        if query.descending {
            matches.reverse();
        }
        // DynamoDB counts `Limit` against items scanned, then evaluates the
        // filter expression on that window; filtered-out items still consume
        // the limit.
        if let Some(limit) = query.limit {
            matches.truncate(limit);
        }
        matches.retain(|item| {
            query
                .filter_eq
                .iter()
                .all(|(name, value)| item.get(name) == Some(value))
        });
        Ok(matches)
    }
}

#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: Mutex<BTreeMap<String, (String, Vec<u8>)>>,
    fail_puts: AtomicBool,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn blob_count(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StoreError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StoreError::Transport(anyhow::anyhow!(
                "injected blob store failure"
            )));
        }
        let mut blobs = self.blobs.lock().unwrap();
        blobs.insert(key.to_string(), (content_type.to_string(), bytes));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let blobs = self.blobs.lock().unwrap();
        Ok(blobs.get(key).map(|(_, bytes)| bytes.clone()))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let blobs = self.blobs.lock().unwrap();
        Ok(blobs
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}
