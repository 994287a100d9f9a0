//! A normalized in-memory store for query results.
//!
//! Objects carrying a `__typename` and an `id` (or `_id`) are stored once, under
//! `Typename:id`, and referenced from everywhere else with `{"__ref": "Typename:id"}`.
//! Objects without an identity are embedded in their parent. Root fields are
//! stored under `ROOT_QUERY` and `ROOT_MUTATION`.

mod selection;

use std::sync::{Arc, Mutex, PoisonError};

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::{operation::DocumentError, Operation, OperationKind};

use self::selection::SelectionWalker;

pub const ROOT_QUERY: &str = "ROOT_QUERY";
pub const ROOT_MUTATION: &str = "ROOT_MUTATION";
pub const ROOT_SUBSCRIPTION: &str = "ROOT_SUBSCRIPTION";

#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("unknown fragment `{0}`")]
    UnknownFragment(String),
    #[error("invalid argument value: {0}")]
    InvalidArgument(String),
    #[error("query results must be JSON objects")]
    InvalidData,
}

type Entity = Map<String, Value>;

#[derive(Debug, Default)]
struct Store {
    entities: IndexMap<String, Entity>,
}

impl Store {
    fn merge(&mut self, id: &str, fields: Entity) {
        match self.entities.get_mut(id) {
            Some(entity) => entity.extend(fields),
            None => {
                self.entities.insert(id.to_string(), fields);
            }
        }
    }
}

/// The client-side store. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCache {
    store: Arc<Mutex<Store>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether both handles point to the same store.
    pub fn ptr_eq(&self, other: &InMemoryCache) -> bool {
        Arc::ptr_eq(&self.store, &other.store)
    }

    pub fn write_query(&self, query: &str, variables: Value, data: &Value) -> Result<(), CacheError> {
        let operation = Operation::new(query)?.with_variables(variables)?;
        self.write(&operation, data)
    }

    /// `None` when the cache does not hold every field the query selects.
    pub fn read_query(&self, query: &str, variables: Value) -> Result<Option<Value>, CacheError> {
        let operation = Operation::new(query)?.with_variables(variables)?;
        self.read(&operation)
    }

    pub fn write(&self, operation: &Operation, data: &Value) -> Result<(), CacheError> {
        let Value::Object(data) = data else {
            return Err(CacheError::InvalidData);
        };

        let walker = SelectionWalker::new(operation)?;
        let mut store = self.lock();

        let fields = walker.normalize_object(&mut store, walker.root_selection_set()?, data)?;
        store.merge(root_id(operation.kind()), fields);

        tracing::debug!(
            operation = %operation.display_name(),
            entities = store.entities.len(),
            "wrote operation result to the cache"
        );

        Ok(())
    }

    pub fn read(&self, operation: &Operation) -> Result<Option<Value>, CacheError> {
        let walker = SelectionWalker::new(operation)?;
        let store = self.lock();

        let Some(root) = store.entities.get(root_id(operation.kind())) else {
            return Ok(None);
        };

        let root_typename = match operation.kind() {
            OperationKind::Query => "Query",
            OperationKind::Mutation => "Mutation",
            OperationKind::Subscription => "Subscription",
        };

        let result = walker.read_object(&store, walker.root_selection_set()?, root, Some(root_typename))?;
        Ok(result.map(Value::Object))
    }

    /// A snapshot of the normalized store.
    pub fn extract(&self) -> Value {
        let store = self.lock();
        Value::Object(
            store
                .entities
                .iter()
                .map(|(id, entity)| (id.clone(), Value::Object(entity.clone())))
                .collect(),
        )
    }

    pub fn reset(&self) {
        self.lock().entities.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entities.is_empty()
    }

    /// The key an object is normalized under, if it has an identity.
    pub fn identify(value: &Value) -> Option<String> {
        identify_object(value.as_object()?)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// `data` reduced to the fields `operation` selects.
pub(crate) fn project(operation: &Operation, data: &Value) -> Result<Value, CacheError> {
    let Value::Object(object) = data else {
        return Ok(data.clone());
    };

    let walker = SelectionWalker::new(operation)?;
    walker
        .project_object(walker.root_selection_set()?, object)
        .map(Value::Object)
}

fn root_id(kind: OperationKind) -> &'static str {
    match kind {
        OperationKind::Query => ROOT_QUERY,
        OperationKind::Mutation => ROOT_MUTATION,
        OperationKind::Subscription => ROOT_SUBSCRIPTION,
    }
}

fn identify_object(object: &Map<String, Value>) -> Option<String> {
    let typename = object.get("__typename")?.as_str()?;
    let id = object.get("id").or_else(|| object.get("_id"))?;

    match id {
        Value::String(id) => Some(format!("{typename}:{id}")),
        Value::Number(id) => Some(format!("{typename}:{id}")),
        _ => None,
    }
}

fn reference(id: &str) -> Value {
    json!({ "__ref": id })
}

fn as_reference(object: &Map<String, Value>) -> Option<&str> {
    if object.len() != 1 {
        return None;
    }
    object.get("__ref")?.as_str()
}
