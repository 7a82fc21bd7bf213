//! In-memory drivers for the store ports.
//!
//! Suitable for tests and the CLI, where durability is not required.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use futures::FutureExt;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use crate::error::StoreError;
use crate::functions::CloudFunctions;
use crate::query::Query;
use crate::record::Record;
use crate::store::ObjectStore;

type ClassTable = IndexMap<String, Record>;

/// Object store backed by a map per class.
///
/// Records keep their insertion order, so unsorted queries return them in
/// the order they were created.
#[derive(Debug, Default)]
pub struct MemoryStore {
    classes: RwLock<HashMap<String, ClassTable>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record exactly as given, assigning an id and timestamps only
    /// if they are missing.
    pub fn insert(&self, mut record: Record) -> Record {
        let now = Utc::now();
        let id = record.object_id.get_or_insert_with(new_object_id).clone();
        record.created_at.get_or_insert(now);
        record.updated_at.get_or_insert(now);
        self.classes
            .write()
            .entry(record.class_name.clone())
            .or_default()
            .insert(id, record.clone());
        record
    }

    /// Load a seed document of the form `{"ClassName": [{...}, ...], ...}`.
    ///
    /// Returns the number of records inserted.
    pub fn load_seed(&self, seed: &Value) -> Result<usize, StoreError> {
        let classes = seed
            .as_object()
            .ok_or_else(|| StoreError::Invalid("seed: expected an object of classes".into()))?;

        let mut loaded = 0;
        for (class_name, rows) in classes {
            let rows = rows.as_array().ok_or_else(|| {
                StoreError::Invalid(format!("seed: class {class_name} must be an array"))
            })?;
            for row in rows {
                let mut row = row.clone();
                let object = row.as_object_mut().ok_or_else(|| {
                    StoreError::Invalid(format!("seed: {class_name} rows must be objects"))
                })?;
                object.insert("className".into(), Value::String(class_name.clone()));
                let record: Record = serde_json::from_value(row)?;
                self.insert(record);
                loaded += 1;
            }
        }
        tracing::info!(records = loaded, "loaded seed data");
        Ok(loaded)
    }

    /// Number of records in a class.
    pub fn len(&self, class_name: &str) -> usize {
        self.classes.read().get(class_name).map_or(0, IndexMap::len)
    }

    /// Class names with at least one record, sorted.
    pub fn class_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .classes
            .read()
            .iter()
            .filter(|(_, table)| !table.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn find(&self, query: &Query) -> Result<Vec<Record>, StoreError> {
        let classes = self.classes.read();
        Ok(classes
            .get(query.class_name())
            .map(|table| query.apply(table.values()))
            .unwrap_or_default())
    }

    async fn count(&self, query: &Query) -> Result<usize, StoreError> {
        let classes = self.classes.read();
        Ok(classes
            .get(query.class_name())
            .map_or(0, |table| query.count(table.values())))
    }

    async fn get(&self, class_name: &str, object_id: &str) -> Result<Record, StoreError> {
        self.classes
            .read()
            .get(class_name)
            .and_then(|table| table.get(object_id))
            .cloned()
            .ok_or_else(|| StoreError::not_found(class_name, object_id))
    }

    async fn save(&self, record: Record) -> Result<Record, StoreError> {
        if record.class_name.is_empty() {
            return Err(StoreError::Invalid("record: class name is empty".into()));
        }

        let Some(object_id) = record.object_id.clone() else {
            let saved = self.insert(Record {
                created_at: None,
                updated_at: None,
                ..record
            });
            tracing::debug!(class_name = %saved.class_name, object_id = ?saved.object_id, "created record");
            return Ok(saved);
        };

        let mut classes = self.classes.write();
        let stored = classes
            .get_mut(&record.class_name)
            .and_then(|table| table.get_mut(&object_id))
            .ok_or_else(|| StoreError::not_found(&record.class_name, &object_id))?;
        stored.merge(&record.fields);
        stored.updated_at = Some(Utc::now());
        tracing::debug!(class_name = %record.class_name, %object_id, "updated record");
        Ok(stored.clone())
    }

    async fn increment(
        &self,
        class_name: &str,
        object_id: &str,
        field: &str,
        amount: i64,
    ) -> Result<Record, StoreError> {
        let mut classes = self.classes.write();
        let stored = classes
            .get_mut(class_name)
            .and_then(|table| table.get_mut(object_id))
            .ok_or_else(|| StoreError::not_found(class_name, object_id))?;

        let current = match stored.fields.get(field) {
            None | Some(Value::Null) => 0,
            Some(value) => value.as_i64().ok_or_else(|| {
                StoreError::Invalid(format!("increment: {class_name}.{field} is not an integer"))
            })?,
        };
        stored.set(field, current.saturating_add(amount));
        stored.updated_at = Some(Utc::now());
        Ok(stored.clone())
    }

    async fn destroy(&self, class_name: &str, object_id: &str) -> Result<bool, StoreError> {
        let removed = self
            .classes
            .write()
            .get_mut(class_name)
            .and_then(|table| table.shift_remove(object_id))
            .is_some();
        Ok(removed)
    }
}

fn new_object_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

type Handler = Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Value, StoreError>> + Send + Sync>;

/// Cloud functions backed by registered async closures.
///
/// Every invocation is recorded, so tests can assert on what was called.
#[derive(Default)]
pub struct MemoryFunctions {
    handlers: DashMap<String, Handler>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl MemoryFunctions {
    /// No functions registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a function.
    pub fn register<F, Fut>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, StoreError>> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |payload| handler(payload).boxed());
        self.handlers.insert(name.into(), handler);
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_function<F, Fut>(self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, StoreError>> + Send + 'static,
    {
        self.register(name, handler);
        self
    }

    /// Whether a function is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered function names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Every `(name, payload)` passed to [`run`](CloudFunctions::run).
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }
}

impl std::fmt::Debug for MemoryFunctions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryFunctions")
            .field("functions", &self.names())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CloudFunctions for MemoryFunctions {
    async fn run(&self, name: &str, payload: Value) -> Result<Value, StoreError> {
        self.calls.lock().push((name.to_owned(), payload.clone()));
        let handler = self
            .handlers
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::FunctionNotFound(name.to_owned()))?;
        handler(payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn create_update_destroy() {
        let store = MemoryStore::new();
        let created = store
            .save(Record::new("Customer").with_field("name", "Ada"))
            .await
            .unwrap();
        let id = created.object_id.clone().unwrap();
        assert!(created.created_at.is_some());

        let updated = store
            .save(Record::with_id("Customer", &id).with_field("tier", 2))
            .await
            .unwrap();
        assert_eq!(updated.get("name"), Some(json!("Ada")));
        assert_eq!(updated.get("tier"), Some(json!(2)));
        assert_eq!(updated.created_at, created.created_at);

        assert!(store.destroy("Customer", &id).await.unwrap());
        assert!(!store.destroy("Customer", &id).await.unwrap());
        assert_eq!(
            store.get("Customer", &id).await.unwrap_err(),
            StoreError::not_found("Customer", &id)
        );
    }

    #[tokio::test]
    async fn saving_unknown_id_fails() {
        let store = MemoryStore::new();
        let err = store.save(Record::with_id("Customer", "ghost")).await.unwrap_err();
        assert_eq!(err, StoreError::not_found("Customer", "ghost"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_increments_are_not_lost() {
        let store = Arc::new(MemoryStore::new());
        let id = store.insert(Record::new("Workflow")).object_id.unwrap();

        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let store = store.clone();
                let id = id.clone();
                tokio::spawn(async move { store.increment("Workflow", &id, "runCount", 1).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let stored = store.get("Workflow", &id).await.unwrap();
        assert_eq!(stored.get("runCount"), Some(json!(50)));
    }

    #[tokio::test]
    async fn increment_rejects_non_integers() {
        let store = MemoryStore::new();
        let id = store
            .insert(Record::new("Workflow").with_field("runCount", "many"))
            .object_id
            .unwrap();
        let err = store.increment("Workflow", &id, "runCount", 1).await.unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));

        let err = store.increment("Workflow", "ghost", "runCount", 1).await.unwrap_err();
        assert_eq!(err, StoreError::not_found("Workflow", "ghost"));
    }

    #[test]
    fn generated_ids_are_unique_full_uuids() {
        let store = MemoryStore::new();
        let ids: std::collections::HashSet<String> = (0..200)
            .map(|_| store.insert(Record::new("Customer")).object_id.unwrap())
            .collect();
        assert_eq!(ids.len(), 200);
        assert!(ids.iter().all(|id| id.len() == 32));
        assert_eq!(store.len("Customer"), 200);
    }

    #[tokio::test]
    async fn seed_and_query() {
        let store = MemoryStore::new();
        let loaded = store
            .load_seed(&json!({
                "Customer": [
                    {"objectId": "c1", "organizationId": "org-1", "name": "Ada"},
                    {"objectId": "c2", "organizationId": "org-2", "name": "Grace"}
                ],
                "Invoice": []
            }))
            .unwrap();
        assert_eq!(loaded, 2);
        assert_eq!(store.class_names(), vec!["Customer"]);

        let query = Query::new("Customer").equal_to("organizationId", "org-1");
        assert_eq!(store.count(&query).await.unwrap(), 1);
        let first = store.first(&query).await.unwrap().unwrap();
        assert_eq!(first.object_id.as_deref(), Some("c1"));
        assert!(store.first(&Query::new("Nope")).await.unwrap().is_none());
    }

    #[test]
    fn seed_rejects_bad_shapes() {
        let store = MemoryStore::new();
        assert!(matches!(store.load_seed(&json!([])), Err(StoreError::Invalid(_))));
        assert!(matches!(
            store.load_seed(&json!({"Customer": {}})),
            Err(StoreError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn functions_run_and_record_calls() {
        let functions = MemoryFunctions::new()
            .with_function("echo", |payload| async move { Ok::<_, StoreError>(payload) });

        let out = functions.run("echo", json!({"a": 1})).await.unwrap();
        assert_eq!(out, json!({"a": 1}));
        assert_eq!(
            functions.run("missing", Value::Null).await.unwrap_err(),
            StoreError::FunctionNotFound("missing".into())
        );
        assert_eq!(functions.calls().len(), 2);
        assert_eq!(functions.names(), vec!["echo"]);
    }
}
