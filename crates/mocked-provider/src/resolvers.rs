//! Mock resolver sets: what the mocked schema answers instead of a real backend.

use std::{
    any::Any,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// An error raised by a mock resolver. It ends up as a field error in the response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ResolverError {
    message: String,
}

impl ResolverError {
    pub fn new(message: impl Into<String>) -> Self {
        ResolverError {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// What a resolver gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct MockContext<'a> {
    /// The type owning the field being resolved.
    pub parent_type: &'a str,
    pub field_name: &'a str,
    pub arguments: &'a Map<String, Value>,
    /// The value resolved for the parent object, `null` on root types.
    pub parent: &'a Value,
}

type ResolverFn = dyn Fn(&MockContext<'_>) -> Result<Value, ResolverError> + Send + Sync;

#[derive(Clone)]
pub struct MockResolver(Arc<ResolverFn>);

impl MockResolver {
    pub fn new<F>(resolver: F) -> Self
    where
        F: Fn(&MockContext<'_>) -> Result<Value, ResolverError> + Send + Sync + 'static,
    {
        MockResolver(Arc::new(resolver))
    }

    pub fn value(value: Value) -> Self {
        Self::new(move |_| Ok(value.clone()))
    }

    /// A resolver that always fails with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        let error = ResolverError::new(message);
        Self::new(move |_| Err(error.clone()))
    }

    /// Runs the resolver. A panic is reported as an error carrying the panic message.
    pub fn resolve(&self, context: &MockContext<'_>) -> Result<Value, ResolverError> {
        panic::catch_unwind(AssertUnwindSafe(|| (self.0)(context))).unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref())
                .unwrap_or_else(|| format!("mock resolver for {}.{} panicked", context.parent_type, context.field_name));

            tracing::debug!("mock resolver for {}.{} panicked: {message}", context.parent_type, context.field_name);
            Err(ResolverError::new(message))
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> Option<String> {
    match (payload.downcast_ref::<&'static str>(), payload.downcast_ref::<String>()) {
        (Some(&message), None) => Some(message.to_string()),
        (None, Some(message)) => Some(message.clone()),
        _ => None,
    }
}

impl From<Value> for MockResolver {
    fn from(value: Value) -> Self {
        MockResolver::value(value)
    }
}

impl fmt::Debug for MockResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MockResolver")
    }
}

pub type FieldMocks = IndexMap<String, MockResolver>;

/// Mocks registered for one type.
#[derive(Debug, Clone)]
pub enum TypeMock {
    /// One resolver per field.
    Fields(FieldMocks),
    /// A resolver for the whole value of the type: an object whose keys are
    /// used as field values, or the value itself for scalars and enums.
    Value(MockResolver),
}

/// A two-level mapping `type name -> TypeMock`.
///
/// Merging is a shallow override at the type key: see [`MockResolvers::merge`].
#[derive(Debug, Clone, Default)]
pub struct MockResolvers {
    types: IndexMap<String, TypeMock>,
}

impl MockResolvers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a resolver for `type_name.field_name`.
    ///
    /// If the type was mocked as a whole with [`MockResolvers::with_type`], that mock is replaced.
    #[must_use]
    pub fn with_field(
        mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        resolver: impl Into<MockResolver>,
    ) -> Self {
        let type_name = type_name.into();
        let entry = self
            .types
            .entry(type_name.clone())
            .or_insert_with(|| TypeMock::Fields(FieldMocks::new()));

        if let TypeMock::Value(_) = entry {
            tracing::debug!("replacing the value mock of `{type_name}` with field mocks");
            *entry = TypeMock::Fields(FieldMocks::new());
        }

        if let TypeMock::Fields(fields) = entry {
            fields.insert(field_name.into(), resolver.into());
        }

        self
    }

    /// Mocks every value of `type_name` with a single resolver.
    #[must_use]
    pub fn with_type(mut self, type_name: impl Into<String>, resolver: impl Into<MockResolver>) -> Self {
        self.types.insert(type_name.into(), TypeMock::Value(resolver.into()));
        self
    }

    pub fn insert(&mut self, type_name: impl Into<String>, mock: TypeMock) -> Option<TypeMock> {
        self.types.insert(type_name.into(), mock)
    }

    pub fn get(&self, type_name: &str) -> Option<&TypeMock> {
        self.types.get(type_name)
    }

    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&MockResolver> {
        match self.types.get(type_name)? {
            TypeMock::Fields(fields) => fields.get(field_name),
            TypeMock::Value(_) => None,
        }
    }

    pub fn type_value(&self, type_name: &str) -> Option<&MockResolver> {
        match self.types.get(type_name)? {
            TypeMock::Value(resolver) => Some(resolver),
            TypeMock::Fields(_) => None,
        }
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.types.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Combines the factory level resolvers with the ones given at render time.
    ///
    /// A type present in `render` replaces the whole entry of that type in
    /// `global`, fields are not merged one by one. Types only present in
    /// `global` are kept.
    pub fn merge(global: &MockResolvers, render: &MockResolvers) -> MockResolvers {
        let mut types = global.types.clone();
        for (type_name, mock) in &render.types {
            types.insert(type_name.clone(), mock.clone());
        }
        MockResolvers { types }
    }
}
