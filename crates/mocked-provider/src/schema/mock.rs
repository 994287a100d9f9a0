use std::sync::Arc;

use async_graphql::{dynamic::FieldValue, Name, Value as ConstValue};
use serde_json::{json, Map, Value};

use super::model::{FieldModel, SchemaModel, TypeModel, TypeShape};
use crate::resolvers::{MockContext, MockResolvers, ResolverError, TypeMock};

const DEFAULT_LIST_LENGTH: usize = 2;

/// Decides the value of every field of the mocked schema.
///
/// A field takes, in order: the value the parent object carries for it, the
/// field mock of the parent type, the mock of its return type, a default.
pub(super) struct MockEngine {
    model: Arc<SchemaModel>,
    resolvers: MockResolvers,
}

impl MockEngine {
    pub(super) fn new(model: Arc<SchemaModel>, resolvers: MockResolvers) -> Self {
        MockEngine { model, resolvers }
    }

    pub(super) fn field_value(
        &self,
        parent_type: &str,
        field_name: &str,
        field: &FieldModel,
        parent: &Value,
        arguments: &Map<String, Value>,
    ) -> Result<Value, ResolverError> {
        if let Some(value) = parent.as_object().and_then(|object| object.get(field_name)) {
            return Ok(value.clone());
        }

        let context = MockContext {
            parent_type,
            field_name,
            arguments,
            parent,
        };

        match self.resolvers.get(parent_type) {
            Some(TypeMock::Fields(fields)) => {
                if let Some(resolver) = fields.get(field_name) {
                    return resolver.resolve(&context);
                }
            }
            Some(TypeMock::Value(resolver)) => {
                if let Some(value) = resolver.resolve(&context)?.get(field_name) {
                    return Ok(value.clone());
                }
            }
            None => {}
        }

        self.mock(&field.ty, &context)
    }

    fn mock(&self, shape: &TypeShape, context: &MockContext<'_>) -> Result<Value, ResolverError> {
        match shape {
            TypeShape::NonNull(inner) => self.mock(inner, context),
            TypeShape::List(inner) => (0..DEFAULT_LIST_LENGTH)
                .map(|_| self.mock(inner, context))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            TypeShape::Named(name) => self.mock_named(name, context),
        }
    }

    fn mock_named(&self, name: &str, context: &MockContext<'_>) -> Result<Value, ResolverError> {
        if let Some(resolver) = self.resolvers.type_value(name) {
            return resolver.resolve(context);
        }

        match self.model.get(name) {
            Some(TypeModel::Object { .. }) => Ok(Value::Object(Map::new())),
            Some(TypeModel::Interface { .. } | TypeModel::Union { .. }) => {
                let concrete = self.first_possible_type(name)?;
                let mut value = self.mock_named(concrete, context)?;

                if let Value::Object(object) = &mut value {
                    object
                        .entry("__typename")
                        .or_insert_with(|| Value::String(concrete.to_string()));
                }

                Ok(value)
            }
            Some(TypeModel::Enum { values }) => values
                .first()
                .map(|value| json!(value))
                .ok_or_else(|| ResolverError::new(format!("The enum \"{name}\" has no value to mock"))),
            Some(TypeModel::Scalar | TypeModel::InputObject { .. }) | None => builtin_scalar(name)
                .ok_or_else(|| ResolverError::new(format!("No mock defined for type \"{name}\""))),
        }
    }

    fn first_possible_type(&self, name: &str) -> Result<&str, ResolverError> {
        self.model
            .possible_types(name)
            .first()
            .copied()
            .ok_or_else(|| ResolverError::new(format!("No object type implements \"{name}\"")))
    }

    /// Turns a resolved JSON value into what the executor expects for `shape`.
    pub(super) fn to_field_value<'a>(&self, shape: &TypeShape, value: Value) -> Result<FieldValue<'a>, ResolverError> {
        match (shape, value) {
            (TypeShape::NonNull(inner), value) => self.to_field_value(inner, value),
            (_, Value::Null) => Ok(FieldValue::NULL),
            (TypeShape::List(inner), Value::Array(items)) => items
                .into_iter()
                .map(|item| self.to_field_value(inner, item))
                .collect::<Result<Vec<_>, _>>()
                .map(FieldValue::list),
            (TypeShape::List(_), value) => Err(ResolverError::new(format!("Expected a list, got {value}"))),
            (TypeShape::Named(name), value) => self.named_field_value(name, value),
        }
    }

    fn named_field_value<'a>(&self, name: &str, value: Value) -> Result<FieldValue<'a>, ResolverError> {
        match self.model.get(name) {
            Some(TypeModel::Object { .. }) => Ok(FieldValue::owned_any(value)),
            Some(TypeModel::Interface { .. } | TypeModel::Union { .. }) => {
                let possible_types = self.model.possible_types(name);
                let concrete = match value.get("__typename").and_then(Value::as_str) {
                    Some(typename) if possible_types.contains(&typename) => typename.to_string(),
                    Some(typename) => {
                        return Err(ResolverError::new(format!(
                            "\"{typename}\" is not a possible type of \"{name}\""
                        )))
                    }
                    None => self.first_possible_type(name)?.to_string(),
                };

                Ok(FieldValue::owned_any(value).with_type(concrete))
            }
            Some(TypeModel::Enum { .. }) => match value {
                Value::String(item) => Ok(FieldValue::value(ConstValue::Enum(Name::new(item)))),
                other => Err(ResolverError::new(format!(
                    "Expected a value of the enum \"{name}\", got {other}"
                ))),
            },
            _ => ConstValue::from_json(value)
                .map(FieldValue::value)
                .map_err(|err| ResolverError::new(err.to_string())),
        }
    }
}

fn builtin_scalar(name: &str) -> Option<Value> {
    let value = match name {
        "Int" => json!(42),
        "Float" => json!(4.2),
        "String" => json!("Hello World"),
        "Boolean" => json!(true),
        "ID" => json!(uuid::Uuid::new_v4().to_string()),
        _ => return None,
    };

    Some(value)
}
