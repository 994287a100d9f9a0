use std::sync::Arc;

use async_graphql::dynamic::{
    Enum, EnumItem, Field, FieldFuture, FieldValue, InputObject, InputValue, Interface, InterfaceField, Object,
    ResolverContext, Scalar, Schema, TypeRef, Union,
};
use serde_json::{Map, Value};

use super::{
    mock::MockEngine,
    model::{FieldModel, InputValueModel, SchemaModel, TypeModel, TypeShape, BUILTIN_SCALARS},
    SchemaError,
};
use crate::{resolvers::ResolverError, MockResolvers};

static NULL: Value = Value::Null;

pub(super) fn build(model: &Arc<SchemaModel>, resolvers: MockResolvers) -> Result<Schema, SchemaError> {
    let engine = Arc::new(MockEngine::new(Arc::clone(model), resolvers));
    let mut schema = Schema::build(&model.query_type, model.mutation_type.as_deref(), None);

    if let Some(subscription) = &model.subscription_type {
        tracing::warn!("subscriptions are not mocked, `{subscription}` is only exposed as an object type");
    }

    for (name, ty) in &model.types {
        schema = match ty {
            TypeModel::Scalar if BUILTIN_SCALARS.contains(&name.as_str()) => schema,
            TypeModel::Scalar => schema.register(Scalar::new(name)),
            TypeModel::Object { fields, interfaces } => {
                let object = interfaces
                    .iter()
                    .fold(Object::new(name), |object, interface| object.implement(interface));

                let object = fields.iter().fold(object, |object, (field_name, field)| {
                    object.field(object_field(&engine, name, field_name, field))
                });

                schema.register(object)
            }
            TypeModel::Interface { fields } => {
                let interface = fields.iter().fold(Interface::new(name), |interface, (field_name, field)| {
                    let interface_field = field
                        .arguments
                        .iter()
                        .fold(InterfaceField::new(field_name, type_ref(&field.ty)), |f, argument| {
                            f.argument(input_value(argument))
                        });
                    interface.field(interface_field)
                });

                schema.register(interface)
            }
            TypeModel::Union { members } => {
                let union = members
                    .iter()
                    .fold(Union::new(name), |union, member| union.possible_type(member));
                schema.register(union)
            }
            TypeModel::Enum { values } => {
                let enm = values
                    .iter()
                    .fold(Enum::new(name), |enm, value| enm.item(EnumItem::new(value)));
                schema.register(enm)
            }
            TypeModel::InputObject { fields } => {
                let input = fields
                    .iter()
                    .fold(InputObject::new(name), |input, field| input.field(input_value(field)));
                schema.register(input)
            }
        };
    }

    schema.finish().map_err(|err| SchemaError::Invalid(err.to_string()))
}

fn object_field(engine: &Arc<MockEngine>, parent_type: &str, field_name: &str, field: &FieldModel) -> Field {
    let engine = Arc::clone(engine);
    let parent_type = parent_type.to_string();
    let name = field_name.to_string();
    let model = field.clone();

    let dynamic_field = Field::new(field_name, type_ref(&field.ty), move |ctx| {
        let result = resolve(&engine, &parent_type, &name, &model, &ctx);

        FieldFuture::new(async move {
            result
                .map(Some)
                .map_err(|err| async_graphql::Error::new(err.message()))
        })
    });

    field
        .arguments
        .iter()
        .fold(dynamic_field, |dynamic_field, argument| dynamic_field.argument(input_value(argument)))
}

fn resolve<'a>(
    engine: &MockEngine,
    parent_type: &str,
    field_name: &str,
    field: &FieldModel,
    ctx: &ResolverContext<'a>,
) -> Result<FieldValue<'a>, ResolverError> {
    let arguments = ctx
        .args
        .iter()
        .map(|(name, value)| {
            serde_json::to_value(value.as_value())
                .map(|value| (name.to_string(), value))
                .map_err(|err| ResolverError::new(err.to_string()))
        })
        .collect::<Result<Map<String, Value>, _>>()?;

    let parent = ctx.parent_value.try_downcast_ref::<Value>().unwrap_or(&NULL);
    let value = engine.field_value(parent_type, field_name, field, parent, &arguments)?;

    engine.to_field_value(&field.ty, value)
}

fn input_value(input: &InputValueModel) -> InputValue {
    InputValue::new(&input.name, type_ref(&input.ty))
}

fn type_ref(shape: &TypeShape) -> TypeRef {
    match shape {
        TypeShape::Named(name) => TypeRef::named(name),
        TypeShape::NonNull(inner) => TypeRef::NonNull(Box::new(type_ref(inner))),
        TypeShape::List(inner) => TypeRef::List(Box::new(type_ref(inner))),
    }
}
