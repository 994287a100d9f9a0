//! Owned description of the type definitions, extracted once from the SDL.

use cynic_parser::{common::WrappingType, type_system as ast};
use indexmap::IndexMap;

use super::SchemaError;

pub(crate) const BUILTIN_SCALARS: &[&str] = &["Boolean", "Float", "ID", "Int", "String"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TypeShape {
    Named(String),
    NonNull(Box<TypeShape>),
    List(Box<TypeShape>),
}

impl TypeShape {
    fn from_ast(ty: ast::Type<'_>) -> Self {
        // Wrappers come outermost first.
        let wrappers: Vec<_> = ty.wrappers().collect();

        wrappers
            .into_iter()
            .rev()
            .fold(TypeShape::Named(ty.name().to_string()), |inner, wrapper| match wrapper {
                WrappingType::NonNull => TypeShape::NonNull(Box::new(inner)),
                WrappingType::List => TypeShape::List(Box::new(inner)),
            })
    }

    pub(crate) fn named_type(&self) -> &str {
        match self {
            TypeShape::Named(name) => name,
            TypeShape::NonNull(inner) | TypeShape::List(inner) => inner.named_type(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct InputValueModel {
    pub(crate) name: String,
    pub(crate) ty: TypeShape,
}

#[derive(Debug, Clone)]
pub(crate) struct FieldModel {
    pub(crate) ty: TypeShape,
    pub(crate) arguments: Vec<InputValueModel>,
}

#[derive(Debug, Clone)]
pub(crate) enum TypeModel {
    Scalar,
    Object {
        fields: IndexMap<String, FieldModel>,
        interfaces: Vec<String>,
    },
    Interface {
        fields: IndexMap<String, FieldModel>,
    },
    Union {
        members: Vec<String>,
    },
    Enum {
        values: Vec<String>,
    },
    InputObject {
        fields: Vec<InputValueModel>,
    },
}

impl TypeModel {
    fn kind(&self) -> &'static str {
        match self {
            TypeModel::Scalar => "scalar",
            TypeModel::Object { .. } => "object",
            TypeModel::Interface { .. } => "interface",
            TypeModel::Union { .. } => "union",
            TypeModel::Enum { .. } => "enum",
            TypeModel::InputObject { .. } => "input object",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SchemaModel {
    pub(crate) query_type: String,
    pub(crate) mutation_type: Option<String>,
    pub(crate) subscription_type: Option<String>,
    pub(crate) types: IndexMap<String, TypeModel>,
}

impl SchemaModel {
    pub(crate) fn parse(sdl: &str) -> Result<Self, SchemaError> {
        let document = cynic_parser::parse_type_system_document(sdl).map_err(|err| SchemaError::Parse(err.to_string()))?;

        let mut types: IndexMap<String, TypeModel> = IndexMap::new();
        let mut roots = RootNames::default();

        for definition in document.definitions() {
            match definition {
                ast::Definition::Schema(schema) | ast::Definition::SchemaExtension(schema) => roots.ingest(schema),
                ast::Definition::Directive(directive) => {
                    tracing::debug!("ignoring directive definition @{}", directive.name());
                }
                ast::Definition::Type(typedef) => {
                    let name = typedef.name().to_string();
                    if types.contains_key(&name) {
                        return Err(SchemaError::Invalid(format!("the type `{name}` is defined twice")));
                    }
                    types.insert(name, ingest_type(&typedef));
                }
                ast::Definition::TypeExtension(typedef) => {
                    let name = typedef.name();
                    let Some(existing) = types.get_mut(name) else {
                        return Err(SchemaError::Invalid(format!("cannot extend the undefined type `{name}`")));
                    };
                    extend_type(name, existing, ingest_type(&typedef))?;
                }
            }
        }

        let query_type = roots.query.unwrap_or_else(|| "Query".to_string());
        if !matches!(types.get(&query_type), Some(TypeModel::Object { .. })) {
            return Err(SchemaError::MissingQueryType(query_type));
        }

        let mutation_type = roots
            .mutation
            .or_else(|| types.contains_key("Mutation").then(|| "Mutation".to_string()));
        let subscription_type = roots
            .subscription
            .or_else(|| types.contains_key("Subscription").then(|| "Subscription".to_string()));

        Ok(SchemaModel {
            query_type,
            mutation_type,
            subscription_type,
            types,
        })
    }

    pub(crate) fn get(&self, name: &str) -> Option<&TypeModel> {
        self.types.get(name)
    }

    /// Object types a value of `name` can be, in definition order.
    pub(crate) fn possible_types(&self, name: &str) -> Vec<&str> {
        match self.types.get(name) {
            Some(TypeModel::Union { members }) => members.iter().map(String::as_str).collect(),
            Some(TypeModel::Interface { .. }) => self
                .types
                .iter()
                .filter_map(|(object_name, ty)| match ty {
                    TypeModel::Object { interfaces, .. } if interfaces.iter().any(|i| i == name) => {
                        Some(object_name.as_str())
                    }
                    _ => None,
                })
                .collect(),
            Some(TypeModel::Object { .. }) => self
                .types
                .get_key_value(name)
                .map(|(object_name, _)| vec![object_name.as_str()])
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }
}

#[derive(Default)]
struct RootNames {
    query: Option<String>,
    mutation: Option<String>,
    subscription: Option<String>,
}

impl RootNames {
    fn ingest(&mut self, schema: ast::SchemaDefinition<'_>) {
        if let Some(query) = schema.query_type() {
            self.query = Some(query.named_type().to_string());
        }
        if let Some(mutation) = schema.mutation_type() {
            self.mutation = Some(mutation.named_type().to_string());
        }
        if let Some(subscription) = schema.subscription_type() {
            self.subscription = Some(subscription.named_type().to_string());
        }
    }
}

fn ingest_type(typedef: &ast::TypeDefinition<'_>) -> TypeModel {
    match typedef {
        ast::TypeDefinition::Scalar(_) => TypeModel::Scalar,
        ast::TypeDefinition::Object(object) => TypeModel::Object {
            fields: ingest_fields(object.fields()),
            interfaces: object.implements_interfaces().map(str::to_string).collect(),
        },
        ast::TypeDefinition::Interface(interface) => {
            if interface.implements_interfaces().next().is_some() {
                tracing::warn!(
                    "interface `{}` implements other interfaces, only its own fields are mocked",
                    interface.name()
                );
            }
            TypeModel::Interface {
                fields: ingest_fields(interface.fields()),
            }
        }
        ast::TypeDefinition::Union(union) => TypeModel::Union {
            members: union.members().map(|member| member.name().to_string()).collect(),
        },
        ast::TypeDefinition::Enum(enm) => TypeModel::Enum {
            values: enm.values().map(|value| value.value().to_string()).collect(),
        },
        ast::TypeDefinition::InputObject(input) => TypeModel::InputObject {
            fields: input.fields().map(ingest_input_value).collect(),
        },
    }
}

fn ingest_fields<'a>(fields: impl Iterator<Item = ast::FieldDefinition<'a>>) -> IndexMap<String, FieldModel> {
    fields
        .map(|field| {
            let model = FieldModel {
                ty: TypeShape::from_ast(field.ty()),
                arguments: field.arguments().map(ingest_input_value).collect(),
            };
            (field.name().to_string(), model)
        })
        .collect()
}

fn ingest_input_value(value: ast::InputValueDefinition<'_>) -> InputValueModel {
    InputValueModel {
        name: value.name().to_string(),
        ty: TypeShape::from_ast(value.ty()),
    }
}

fn extend_type(name: &str, existing: &mut TypeModel, extension: TypeModel) -> Result<(), SchemaError> {
    match (existing, extension) {
        (
            TypeModel::Object { fields, interfaces },
            TypeModel::Object {
                fields: new_fields,
                interfaces: new_interfaces,
            },
        ) => {
            fields.extend(new_fields);
            interfaces.extend(new_interfaces);
        }
        (TypeModel::Interface { fields }, TypeModel::Interface { fields: new_fields }) => fields.extend(new_fields),
        (TypeModel::Union { members }, TypeModel::Union { members: new_members }) => members.extend(new_members),
        (TypeModel::Enum { values }, TypeModel::Enum { values: new_values }) => values.extend(new_values),
        (TypeModel::InputObject { fields }, TypeModel::InputObject { fields: new_fields }) => fields.extend(new_fields),
        (TypeModel::Scalar, TypeModel::Scalar) => {}
        (existing, extension) => {
            return Err(SchemaError::Invalid(format!(
                "cannot extend the {} `{name}` with an {} extension",
                existing.kind(),
                extension.kind()
            )))
        }
    }

    Ok(())
}
