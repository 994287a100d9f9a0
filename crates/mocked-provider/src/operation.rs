use std::{collections::HashMap, fmt, sync::Arc};

use async_graphql_parser::{
    types::{DocumentOperations, ExecutableDocument, OperationDefinition, OperationType, Selection, SelectionSet},
    Pos, Positioned,
};
use serde_json::{Map, Value};

#[derive(Debug, Clone, thiserror::Error)]
pub enum DocumentError {
    #[error("could not parse the GraphQL document: {0}")]
    Parse(String),
    #[error("no operation named `{0}` in the document")]
    UnknownOperation(String),
    #[error("the document contains several operations, an operation name is required")]
    OperationNameRequired,
    #[error("the document does not contain any operation")]
    NoOperation,
    #[error("variables must be a JSON object")]
    InvalidVariables,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
            OperationKind::Subscription => "subscription",
        }
    }
}

impl From<OperationType> for OperationKind {
    fn from(ty: OperationType) -> Self {
        match ty {
            OperationType::Query => OperationKind::Query,
            OperationType::Mutation => OperationKind::Mutation,
            OperationType::Subscription => OperationKind::Subscription,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outgoing GraphQL operation, as seen by every link in a chain.
///
/// The document is parsed once on construction so links, the cache and the
/// client can all inspect it without re-parsing.
#[derive(Clone)]
pub struct Operation {
    query: Arc<str>,
    document: Arc<ExecutableDocument>,
    operation_name: Option<String>,
    variables: Map<String, Value>,
    kind: OperationKind,
    context: HashMap<String, Value>,
}

impl Operation {
    pub fn new(query: impl Into<String>) -> Result<Self, DocumentError> {
        let query: String = query.into();
        let document =
            async_graphql_parser::parse_query(&query).map_err(|error| DocumentError::Parse(error.to_string()))?;
        let kind = match select_operation(&document, None) {
            Ok(operation) => operation.node.ty.into(),
            // Settled by `with_operation_name`.
            Err(DocumentError::OperationNameRequired) => OperationKind::Query,
            Err(error) => return Err(error),
        };

        Ok(Operation {
            query: query.into(),
            document: Arc::new(document),
            operation_name: None,
            variables: Map::new(),
            kind,
            context: HashMap::new(),
        })
    }

    pub fn with_operation_name(mut self, name: impl Into<String>) -> Result<Self, DocumentError> {
        let name = name.into();
        self.kind = select_operation(&self.document, Some(&name))?.node.ty.into();
        self.operation_name = Some(name);
        Ok(self)
    }

    /// Sets the variables. `null` clears them, anything else than an object is rejected.
    pub fn with_variables(mut self, variables: Value) -> Result<Self, DocumentError> {
        self.variables = match variables {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            _ => return Err(DocumentError::InvalidVariables),
        };
        Ok(self)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn document(&self) -> &ExecutableDocument {
        &self.document
    }

    pub fn operation_name(&self) -> Option<&str> {
        self.operation_name.as_deref()
    }

    /// Name used in logs: the explicit operation name, the name declared in the document, or `<anonymous>`.
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.operation_name {
            return name.clone();
        }

        match &self.document.operations {
            DocumentOperations::Multiple(operations) if operations.len() == 1 => {
                operations.keys().next().map(ToString::to_string).unwrap_or_default()
            }
            _ => "<anonymous>".to_string(),
        }
    }

    pub fn variables(&self) -> &Map<String, Value> {
        &self.variables
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn definition(&self) -> Result<&OperationDefinition, DocumentError> {
        select_operation(&self.document, self.operation_name.as_deref()).map(|operation| &operation.node)
    }

    /// Free-form per-operation data links can use to talk to each other.
    pub fn context(&self) -> &HashMap<String, Value> {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut HashMap<String, Value> {
        &mut self.context
    }

    /// The same operation with `__typename` selected on every object below the root, so
    /// results carry what the cache needs to identify entities.
    pub fn with_typenames(&self) -> Result<Self, DocumentError> {
        let mut positions = Vec::new();

        match &self.document.operations {
            DocumentOperations::Single(operation) => {
                typename_insertions(&operation.node.selection_set.node, &mut positions);
            }
            DocumentOperations::Multiple(operations) => {
                for operation in operations.values() {
                    typename_insertions(&operation.node.selection_set.node, &mut positions);
                }
            }
        }

        for fragment in self.document.fragments.values() {
            typename_insertions(&fragment.node.selection_set.node, &mut positions);
        }

        if positions.is_empty() {
            return Ok(self.clone());
        }

        let mut query = self.query.to_string();
        for offset in byte_offsets(&query, positions).into_iter().rev() {
            query.insert_str(offset + 1, " __typename");
        }

        let document =
            async_graphql_parser::parse_query(&query).map_err(|error| DocumentError::Parse(error.to_string()))?;

        Ok(Operation {
            query: query.into(),
            document: Arc::new(document),
            ..self.clone()
        })
    }

    /// Variables with the defaults declared in the operation filled in.
    pub(crate) fn variables_with_defaults(&self) -> Result<Map<String, Value>, DocumentError> {
        let mut variables = self.variables.clone();

        for definition in &self.definition()?.variable_definitions {
            let name = definition.node.name.node.as_str();
            if variables.contains_key(name) {
                continue;
            }

            if let Some(default) = &definition.node.default_value {
                let value = default
                    .node
                    .clone()
                    .into_json()
                    .map_err(|_| DocumentError::InvalidVariables)?;
                variables.insert(name.to_string(), value);
            }
        }

        Ok(variables)
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("kind", &self.kind)
            .field("operation_name", &self.operation_name)
            .field("query", &self.query)
            .field("variables", &self.variables)
            .finish_non_exhaustive()
    }
}

fn select_operation<'a>(
    document: &'a ExecutableDocument,
    name: Option<&str>,
) -> Result<&'a Positioned<OperationDefinition>, DocumentError> {
    match (&document.operations, name) {
        (DocumentOperations::Single(operation), None) => Ok(operation),
        (DocumentOperations::Single(_), Some(name)) => Err(DocumentError::UnknownOperation(name.to_string())),
        (DocumentOperations::Multiple(operations), Some(name)) => operations
            .iter()
            .find(|(operation_name, _)| operation_name.as_str() == name)
            .map(|(_, operation)| operation)
            .ok_or_else(|| DocumentError::UnknownOperation(name.to_string())),
        (DocumentOperations::Multiple(operations), None) => {
            let mut operations = operations.values();
            match (operations.next(), operations.next()) {
                (Some(operation), None) => Ok(operation),
                (Some(_), Some(_)) => Err(DocumentError::OperationNameRequired),
                (None, _) => Err(DocumentError::NoOperation),
            }
        }
    }
}

/// Positions of the `{` opening each field selection set lacking a `__typename`.
fn typename_insertions(selection_set: &SelectionSet, positions: &mut Vec<Pos>) {
    for selection in &selection_set.items {
        match &selection.node {
            Selection::Field(field) => {
                let selection_set = &field.node.selection_set;
                if selection_set.node.items.is_empty() {
                    continue;
                }

                if !selection_set.node.items.iter().any(|selection| is_typename(&selection.node)) {
                    positions.push(selection_set.pos);
                }

                typename_insertions(&selection_set.node, positions);
            }
            Selection::InlineFragment(fragment) => typename_insertions(&fragment.node.selection_set.node, positions),
            Selection::FragmentSpread(_) => {}
        }
    }
}

fn is_typename(selection: &Selection) -> bool {
    match selection {
        Selection::Field(field) => field.node.alias.is_none() && field.node.name.node.as_str() == "__typename",
        _ => false,
    }
}

/// Byte offsets of parser positions, in ascending order. Columns count characters.
fn byte_offsets(query: &str, mut positions: Vec<Pos>) -> Vec<usize> {
    positions.sort_unstable_by_key(|pos| (pos.line, pos.column));
    positions.dedup_by_key(|pos| (pos.line, pos.column));

    let mut offsets = Vec::with_capacity(positions.len());
    let mut pending = positions.into_iter().peekable();
    let (mut line, mut column) = (1, 1);

    for (offset, ch) in query.char_indices() {
        while pending.next_if(|pos| (pos.line, pos.column) == (line, column)).is_some() {
            offsets.push(offset);
        }

        match ch {
            '\r' => column = 1,
            '\n' => {
                line += 1;
                column = 1;
            }
            _ => column += 1,
        }
    }

    offsets
}
