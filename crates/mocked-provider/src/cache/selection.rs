use std::collections::BTreeMap;

use async_graphql_parser::types::{Field, Selection, SelectionSet};
use async_graphql_value::{ConstValue, Name};
use serde_json::{Map, Value};

use super::{as_reference, identify_object, reference, CacheError, Entity, Store};
use crate::Operation;

/// Walks the selection sets of one operation against result data or the store.
///
/// Fragments apply when their type condition equals the `__typename` of the
/// object, or when that typename is not known. A fragment on another type, an
/// interface the object implements for instance, applies when every field it
/// selects is present.
pub(super) struct SelectionWalker<'a> {
    operation: &'a Operation,
    variables: Map<String, Value>,
}

impl<'a> SelectionWalker<'a> {
    pub(super) fn new(operation: &'a Operation) -> Result<Self, CacheError> {
        Ok(SelectionWalker {
            operation,
            variables: operation.variables_with_defaults()?,
        })
    }

    pub(super) fn root_selection_set(&self) -> Result<&'a SelectionSet, CacheError> {
        Ok(&self.operation.definition()?.selection_set.node)
    }

    pub(super) fn normalize_object(
        &self,
        store: &mut Store,
        selection_set: &'a SelectionSet,
        data: &Map<String, Value>,
    ) -> Result<Entity, CacheError> {
        let typename = data.get("__typename").and_then(Value::as_str);
        let mut entity = Entity::new();

        for field in self.collect_fields(selection_set, typename, Presence::Result(data))? {
            let Some(value) = data.get(field.response_key().node.as_str()) else {
                continue;
            };

            let value = self.normalize_value(store, &field.selection_set.node, value)?;
            insert_merged(&mut entity, self.store_key(field)?, value);
        }

        Ok(entity)
    }

    fn normalize_value(
        &self,
        store: &mut Store,
        selection_set: &'a SelectionSet,
        value: &Value,
    ) -> Result<Value, CacheError> {
        match value {
            Value::Array(items) => items
                .iter()
                .map(|item| self.normalize_value(store, selection_set, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(object) if !selection_set.items.is_empty() => {
                let fields = self.normalize_object(store, selection_set, object)?;

                match identify_object(object) {
                    Some(id) => {
                        store.merge(&id, fields);
                        Ok(reference(&id))
                    }
                    None => Ok(Value::Object(fields)),
                }
            }
            other => Ok(other.clone()),
        }
    }

    /// `None` as soon as one selected field is missing from the store.
    pub(super) fn read_object(
        &self,
        store: &Store,
        selection_set: &'a SelectionSet,
        entity: &Entity,
        fallback_typename: Option<&str>,
    ) -> Result<Option<Map<String, Value>>, CacheError> {
        let typename = entity.get("__typename").and_then(Value::as_str).or(fallback_typename);
        let mut result = Map::new();

        for field in self.collect_fields(selection_set, typename, Presence::Store(entity))? {
            let response_key = field.response_key().node.to_string();

            let value = match entity.get(&self.store_key(field)?) {
                Some(value) => value,
                None => match typename {
                    Some(typename) if field.name.node.as_str() == "__typename" => {
                        result.insert(response_key, Value::String(typename.to_string()));
                        continue;
                    }
                    _ => return Ok(None),
                },
            };

            let Some(value) = self.read_value(store, &field.selection_set.node, value)? else {
                return Ok(None);
            };

            insert_merged(&mut result, response_key, value);
        }

        Ok(Some(result))
    }

    fn read_value(
        &self,
        store: &Store,
        selection_set: &'a SelectionSet,
        value: &Value,
    ) -> Result<Option<Value>, CacheError> {
        match value {
            Value::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    match self.read_value(store, selection_set, item)? {
                        Some(value) => values.push(value),
                        None => return Ok(None),
                    }
                }
                Ok(Some(Value::Array(values)))
            }
            Value::Object(object) if !selection_set.items.is_empty() => {
                let entity = match as_reference(object) {
                    Some(id) => match store.entities.get(id) {
                        Some(entity) => entity,
                        None => return Ok(None),
                    },
                    None => object,
                };

                Ok(self.read_object(store, selection_set, entity, None)?.map(Value::Object))
            }
            other => Ok(Some(other.clone())),
        }
    }

    /// Keeps only the fields this operation selects, dropping anything a link added.
    pub(super) fn project_object(
        &self,
        selection_set: &'a SelectionSet,
        data: &Map<String, Value>,
    ) -> Result<Map<String, Value>, CacheError> {
        let mut result = Map::new();

        for field in self.collect_fields(selection_set, None, Presence::Result(data))? {
            let response_key = field.response_key().node.as_str();
            let Some(value) = data.get(response_key) else {
                continue;
            };

            let value = self.project_value(&field.selection_set.node, value)?;
            insert_merged(&mut result, response_key.to_string(), value);
        }

        Ok(result)
    }

    fn project_value(&self, selection_set: &'a SelectionSet, value: &Value) -> Result<Value, CacheError> {
        match value {
            Value::Array(items) => items
                .iter()
                .map(|item| self.project_value(selection_set, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(object) if !selection_set.items.is_empty() => {
                self.project_object(selection_set, object).map(Value::Object)
            }
            other => Ok(other.clone()),
        }
    }

    fn collect_fields(
        &self,
        selection_set: &'a SelectionSet,
        typename: Option<&str>,
        presence: Presence<'_>,
    ) -> Result<Vec<&'a Field>, CacheError> {
        let mut fields = Vec::new();
        self.collect_fields_into(selection_set, typename, presence, &mut fields)?;
        Ok(fields)
    }

    fn collect_fields_into(
        &self,
        selection_set: &'a SelectionSet,
        typename: Option<&str>,
        presence: Presence<'_>,
        fields: &mut Vec<&'a Field>,
    ) -> Result<(), CacheError> {
        for selection in &selection_set.items {
            match &selection.node {
                Selection::Field(field) => fields.push(&field.node),
                Selection::InlineFragment(fragment) => {
                    let fragment = &fragment.node;
                    let condition = fragment.type_condition.as_ref().map(|condition| condition.node.on.node.as_str());
                    self.collect_fragment(condition, &fragment.selection_set.node, typename, presence, fields)?;
                }
                Selection::FragmentSpread(spread) => {
                    let name = spread.node.fragment_name.node.as_str();
                    let Some(fragment) = self.operation.document().fragments.get(name) else {
                        return Err(CacheError::UnknownFragment(name.to_string()));
                    };

                    let condition = fragment.node.type_condition.node.on.node.as_str();
                    self.collect_fragment(Some(condition), &fragment.node.selection_set.node, typename, presence, fields)?;
                }
            }
        }

        Ok(())
    }

    fn collect_fragment(
        &self,
        condition: Option<&str>,
        selection_set: &'a SelectionSet,
        typename: Option<&str>,
        presence: Presence<'_>,
        fields: &mut Vec<&'a Field>,
    ) -> Result<(), CacheError> {
        if condition.is_none() || typename.is_none() || typename == condition {
            return self.collect_fields_into(selection_set, typename, presence, fields);
        }

        let mut candidates = Vec::new();
        self.collect_fields_into(selection_set, typename, presence, &mut candidates)?;

        for field in &candidates {
            if !self.is_present(field, presence)? {
                return Ok(());
            }
        }

        fields.extend(candidates);
        Ok(())
    }

    fn is_present(&self, field: &Field, presence: Presence<'_>) -> Result<bool, CacheError> {
        Ok(match presence {
            Presence::Result(data) => data.contains_key(field.response_key().node.as_str()),
            Presence::Store(entity) => {
                field.name.node.as_str() == "__typename" || entity.contains_key(&self.store_key(field)?)
            }
        })
    }

    /// The field name, followed by its arguments sorted by name when there are any:
    /// `todo({"id":"1"})`.
    fn store_key(&self, field: &Field) -> Result<String, CacheError> {
        let name = field.name.node.as_str();
        if field.arguments.is_empty() {
            return Ok(name.to_string());
        }

        let mut arguments = BTreeMap::new();
        for (argument, value) in &field.arguments {
            let value = value
                .node
                .clone()
                .into_const_with(|variable| self.variable(&variable))?
                .into_json()
                .map_err(|err| CacheError::InvalidArgument(err.to_string()))?;

            arguments.insert(argument.node.to_string(), value);
        }

        let arguments = serde_json::to_string(&arguments).map_err(|err| CacheError::InvalidArgument(err.to_string()))?;
        Ok(format!("{name}({arguments})"))
    }

    fn variable(&self, name: &Name) -> Result<ConstValue, CacheError> {
        match self.variables.get(name.as_str()) {
            Some(value) => {
                ConstValue::from_json(value.clone()).map_err(|err| CacheError::InvalidArgument(err.to_string()))
            }
            None => Ok(ConstValue::Null),
        }
    }
}

/// Where the fields of a fragment on another type are looked for.
#[derive(Clone, Copy)]
enum Presence<'m> {
    /// Result data, by response key.
    Result(&'m Map<String, Value>),
    /// A stored entity, by store key.
    Store(&'m Entity),
}

fn insert_merged(target: &mut Map<String, Value>, key: String, value: Value) {
    match (target.get_mut(&key), value) {
        (Some(Value::Object(existing)), Value::Object(value)) => existing.extend(value),
        (_, value) => {
            target.insert(key, value);
        }
    }
}
