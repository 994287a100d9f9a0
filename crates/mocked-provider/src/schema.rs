//! The schema mocking engine: type definitions plus mock resolvers give an executable schema.

mod build;
mod mock;
mod model;

use std::{fmt, sync::Arc};

use async_graphql::{dynamic, Variables};
use serde_json::Value;

use crate::{link::LinkError, GraphqlResponse, MockResolvers, Operation};

use self::model::SchemaModel;

#[derive(Debug, Clone, thiserror::Error)]
pub enum SchemaError {
    #[error("could not parse the type definitions: {0}")]
    Parse(String),
    #[error("the type definitions do not define the query type `{0}`")]
    MissingQueryType(String),
    #[error("invalid type definitions: {0}")]
    Invalid(String),
}

/// Parsed and validated type definitions.
///
/// Cheap to clone, the parsed model is shared.
#[derive(Clone)]
pub struct TypeDefs {
    sdl: Arc<str>,
    model: Arc<SchemaModel>,
}

impl TypeDefs {
    pub fn parse(sdl: impl AsRef<str>) -> Result<Self, SchemaError> {
        let sdl = sdl.as_ref();
        let model = SchemaModel::parse(sdl)?;

        Ok(TypeDefs {
            sdl: sdl.into(),
            model: Arc::new(model),
        })
    }

    pub fn sdl(&self) -> &str {
        &self.sdl
    }

    pub fn query_type(&self) -> &str {
        &self.model.query_type
    }

    pub fn mutation_type(&self) -> Option<&str> {
        self.model.mutation_type.as_deref()
    }
}

impl fmt::Debug for TypeDefs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDefs")
            .field("query_type", &self.model.query_type)
            .field("mutation_type", &self.model.mutation_type)
            .field("types", &self.model.types.len())
            .finish()
    }
}

/// An executable schema whose fields are answered by mocks.
#[derive(Clone)]
pub struct MockedSchema {
    schema: dynamic::Schema,
    type_defs: TypeDefs,
}

impl MockedSchema {
    pub fn build(type_defs: &TypeDefs, resolvers: &MockResolvers) -> Result<Self, SchemaError> {
        let schema = build::build(&type_defs.model, resolvers.clone())?;

        Ok(MockedSchema {
            schema,
            type_defs: type_defs.clone(),
        })
    }

    pub fn type_defs(&self) -> &TypeDefs {
        &self.type_defs
    }

    /// The executable schema, printed back as SDL.
    pub fn sdl(&self) -> String {
        self.schema.sdl()
    }

    /// Runs the operation. Resolver failures become errors in the response, next to
    /// whatever data could still be resolved.
    pub async fn execute(&self, operation: &Operation) -> Result<GraphqlResponse, LinkError> {
        let mut request = async_graphql::Request::new(operation.query())
            .variables(Variables::from_json(Value::Object(operation.variables().clone())));

        if let Some(name) = operation.operation_name() {
            request = request.operation_name(name);
        }

        let response = self.schema.execute(request).await;

        if response.is_err() {
            tracing::debug!(
                operation = %operation.display_name(),
                errors = response.errors.len(),
                "mocked schema answered with errors"
            );
        }

        let response = serde_json::to_value(&response).map_err(|err| LinkError::InvalidResponse(err.to_string()))?;
        let mut response: GraphqlResponse =
            serde_json::from_value(response).map_err(|err| LinkError::InvalidResponse(err.to_string()))?;

        // Requests failing validation never produce data.
        if response.data == Some(Value::Null) && response.has_errors() {
            response.data = None;
        }

        Ok(response)
    }
}

impl fmt::Debug for MockedSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockedSchema")
            .field("type_defs", &self.type_defs)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use indoc::indoc;
    use serde_json::json;

    use super::*;
    use crate::{MockResolver, ResolverError};

    const TODO_SCHEMA: &str = indoc! {r"
        type Todo {
          id: ID!
          text: String!
          createdTs: Int!
          done: Boolean
          score: Float
          status: Status!
          tags: [String!]!
        }

        enum Status {
          OPEN
          CLOSED
        }

        input AddTodoInput {
          text: String!
        }

        type Query {
          todo(id: ID!): Todo
          todos: [Todo!]!
        }

        type Mutation {
          addTodo(input: AddTodoInput): Todo
        }
    "};

    async fn run(resolvers: MockResolvers, query: &str) -> GraphqlResponse {
        let type_defs = TypeDefs::parse(TODO_SCHEMA).unwrap();
        let schema = MockedSchema::build(&type_defs, &resolvers).unwrap();
        schema.execute(&Operation::new(query).unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn default_mocks() {
        let response = run(
            MockResolvers::new(),
            "{ todo(id: \"1\") { text createdTs done score status tags } }",
        )
        .await;

        insta::assert_json_snapshot!(response, @r###"
        {
          "data": {
            "todo": {
              "text": "Hello World",
              "createdTs": 42,
              "done": true,
              "score": 4.2,
              "status": "OPEN",
              "tags": [
                "Hello World",
                "Hello World"
              ]
            }
          }
        }
        "###);
    }

    #[tokio::test]
    async fn ids_are_unique() {
        let response = run(MockResolvers::new(), "{ todos { id } }").await;
        let todos = response.data.unwrap()["todos"].as_array().unwrap().clone();

        assert_eq!(todos.len(), 2);
        assert_ne!(todos[0]["id"], todos[1]["id"]);
    }

    #[tokio::test]
    async fn resolver_values_take_precedence_and_missing_fields_are_mocked() {
        let resolvers = MockResolvers::new().with_field(
            "Query",
            "todos",
            json!([{ "text": "First Todo" }, { "text": "Second Todo" }]),
        );

        let response = run(resolvers, "{ todos { text createdTs } }").await;

        insta::assert_json_snapshot!(response, @r###"
        {
          "data": {
            "todos": [
              {
                "text": "First Todo",
                "createdTs": 42
              },
              {
                "text": "Second Todo",
                "createdTs": 42
              }
            ]
          }
        }
        "###);
    }

    #[tokio::test]
    async fn type_mocks_apply_to_every_value_of_the_type() {
        let resolvers = MockResolvers::new()
            .with_type("Todo", json!({ "text": "from type mock", "done": false }))
            .with_type("Query", json!({ "todo": { "text": "from parent" } }));

        let response = run(resolvers, "{ todo(id: \"1\") { text done } }").await;

        assert_eq!(
            response.data,
            Some(json!({ "todo": { "text": "from parent", "done": false } }))
        );
    }

    #[tokio::test]
    async fn resolvers_receive_arguments() {
        let resolvers = MockResolvers::new().with_field(
            "Query",
            "todo",
            MockResolver::new(|context| Ok(json!({ "id": context.arguments["id"], "text": "found" }))),
        );

        let response = run(resolvers, "{ todo(id: \"abc\") { id text } }").await;

        assert_eq!(response.data, Some(json!({ "todo": { "id": "abc", "text": "found" } })));
    }

    #[tokio::test]
    async fn failing_resolvers_produce_field_errors() {
        let resolvers = MockResolvers::new()
            .with_field("Query", "todo", MockResolver::error("Boom"))
            .with_field("Query", "todos", json!([{ "text": "Success" }]));

        let response = run(resolvers, "{ todo(id: \"fake\") { text } todos { text } }").await;

        insta::assert_json_snapshot!(response, @r###"
        {
          "data": {
            "todo": null,
            "todos": [
              {
                "text": "Success"
              }
            ]
          },
          "errors": [
            {
              "message": "Boom",
              "locations": [
                {
                  "line": 1,
                  "column": 3
                }
              ],
              "path": [
                "todo"
              ]
            }
          ]
        }
        "###);
    }

    #[tokio::test]
    #[allow(clippy::panic)]
    async fn panicking_resolvers_produce_field_errors() {
        let resolvers = MockResolvers::new()
            .with_field("Query", "todo", MockResolver::new(|_| panic!("Boom")))
            .with_field("Query", "todos", json!([{ "text": "Success" }]));

        let response = run(resolvers, "{ todo(id: \"fake\") { text } todos { text } }").await;

        assert_eq!(
            response.data,
            Some(json!({ "todo": null, "todos": [{ "text": "Success" }] }))
        );
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].message, "Boom");
    }

    #[tokio::test]
    async fn failing_mutations_keep_the_message() {
        let resolvers = MockResolvers::new().with_field(
            "Mutation",
            "addTodo",
            MockResolver::new(|_| Err(ResolverError::new("Boom"))),
        );

        let response = run(
            resolvers,
            "mutation { addTodo(input: { text: \"hardcoded\" }) { id } }",
        )
        .await;

        assert_eq!(response.data, Some(json!({ "addTodo": null })));
        assert_eq!(response.errors[0].message, "Boom");
    }

    #[tokio::test]
    async fn variables_are_passed_to_the_schema() {
        let seen = Arc::new(AtomicUsize::new(0));
        let resolvers = {
            let seen = Arc::clone(&seen);
            MockResolvers::new().with_field(
                "Mutation",
                "addTodo",
                MockResolver::new(move |context| {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Ok(json!({ "text": context.arguments["input"]["text"] }))
                }),
            )
        };

        let type_defs = TypeDefs::parse(TODO_SCHEMA).unwrap();
        let schema = MockedSchema::build(&type_defs, &resolvers).unwrap();
        let operation = Operation::new("mutation add($input: AddTodoInput) { addTodo(input: $input) { text } }")
            .unwrap()
            .with_variables(json!({ "input": { "text": "from variables" } }))
            .unwrap();

        let response = schema.execute(&operation).await.unwrap();

        assert_eq!(response.data, Some(json!({ "addTodo": { "text": "from variables" } })));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalid_operations_have_no_data() {
        let response = run(MockResolvers::new(), "{ doesNotExist }").await;

        assert_eq!(response.data, None);
        assert_eq!(response.errors.len(), 1);
    }

    #[tokio::test]
    async fn abstract_types_resolve_to_a_concrete_type() {
        let type_defs = TypeDefs::parse(indoc! {r"
            type Query { node: Node search: [SearchResult!]! }
            interface Node { id: ID! }
            type Todo implements Node { id: ID! text: String }
            type User implements Node { id: ID! name: String }
            union SearchResult = Todo | User
        "})
        .unwrap();

        let resolvers = MockResolvers::new().with_field(
            "Query",
            "search",
            json!([{ "__typename": "User", "name": "Ada" }, { "text": "defaults to the first member" }]),
        );
        let schema = MockedSchema::build(&type_defs, &resolvers).unwrap();

        let operation = Operation::new(
            "{ node { __typename } search { __typename ... on User { name } ... on Todo { text } } }",
        )
        .unwrap();
        let response = schema.execute(&operation).await.unwrap();

        assert_eq!(
            response.data,
            Some(json!({
                "node": { "__typename": "Todo" },
                "search": [
                    { "__typename": "User", "name": "Ada" },
                    { "__typename": "Todo", "text": "defaults to the first member" }
                ]
            }))
        );
    }

    #[tokio::test]
    async fn custom_scalars_need_a_mock() {
        let type_defs = TypeDefs::parse("scalar DateTime type Query { now: DateTime later: DateTime }").unwrap();
        let resolvers = MockResolvers::new().with_type("DateTime", json!("2024-01-01T00:00:00Z"));
        let schema = MockedSchema::build(&type_defs, &resolvers).unwrap();
        let response = schema.execute(&Operation::new("{ now }").unwrap()).await.unwrap();
        assert_eq!(response.data, Some(json!({ "now": "2024-01-01T00:00:00Z" })));

        let schema = MockedSchema::build(&type_defs, &MockResolvers::new()).unwrap();
        let response = schema.execute(&Operation::new("{ later }").unwrap()).await.unwrap();
        assert_eq!(response.data, Some(json!({ "later": null })));
        assert_eq!(response.errors[0].message, "No mock defined for type \"DateTime\"");
    }

    #[test]
    fn sdl_is_printed_back() {
        let type_defs = TypeDefs::parse(TODO_SCHEMA).unwrap();
        let schema = MockedSchema::build(&type_defs, &MockResolvers::new()).unwrap();

        let sdl = schema.sdl();
        assert!(sdl.contains("type Todo"));
        assert!(sdl.contains("addTodo(input: AddTodoInput): Todo"));
    }

    #[test]
    fn unknown_types_are_rejected() {
        let type_defs = TypeDefs::parse("type Query { todo: Todo }").unwrap();
        let error = MockedSchema::build(&type_defs, &MockResolvers::new()).unwrap_err();
        assert!(matches!(error, SchemaError::Invalid(_)));
    }
}
