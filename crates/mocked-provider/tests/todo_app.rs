#![allow(unused_crate_dependencies)]

use std::{
    future::Future,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use futures::StreamExt as _;
use graphql_mocked_provider::{
    current_client, Client, ClientScope, ContextProvider, ErrorProvider, ErrorRenderProps, GraphqlError,
    InMemoryCache, Link, LinkArgs, LoadingProvider, LoadingRenderProps, MockResolver, MockResolvers, MockedProvider,
    MockedRenderProps, Operation, ProviderOptions, QueryState, Request, ResultSource, DEFAULT_ERROR_MESSAGE,
};
use serde_json::{json, Value};

const SCHEMA: &str = include_str!("fixtures/simple_schema.graphql");

const GET_TODOS: &str = r"
    query getTodos {
      todos {
        id
        text
        createdTs
      }
    }
";

const GET_TODO: &str = r"
    query getTodo($id: ID!) {
      todo(id: $id) {
        id
        text
      }
    }
";

const ADD_TODO: &str = r"
    mutation addTodo($input: AddTodoInput) {
      addTodo(input: $input) {
        id
        createdTs
      }
    }
";

/// Lines "rendered" by the consumers below.
#[derive(Clone, Default)]
struct Screen(Arc<Mutex<Vec<String>>>);

impl Screen {
    fn print(&self, line: impl Into<String>) {
        self.0.lock().unwrap().push(line.into());
    }

    fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn text(&self) -> String {
        self.lines().join("\n")
    }
}

/// Renders the todo list the way a query consumer would, one line per todo.
async fn todo_list(screen: Screen) {
    let client = current_client().unwrap();
    let mut states = client.watch_query(Request::new(GET_TODOS));

    while let Some(state) = states.next().await {
        match state {
            QueryState::Loading => screen.print("Loading..."),
            QueryState::Failed(error) => screen.print(format!("Error! {error}")),
            QueryState::Ready(result) => {
                let data = result.data.unwrap_or_default();
                for todo in data["todos"].as_array().into_iter().flatten() {
                    screen.print(todo["text"].as_str().unwrap_or_default());
                }
            }
        }
    }
}

async fn todo_item(screen: Screen, id: &str) {
    let client = current_client().unwrap();
    let request = Request::new(GET_TODO).with_variables(json!({ "id": id }));

    match client.query(request).await {
        Ok(result) => screen.print(result.data.unwrap_or_default()["todo"]["text"].to_string()),
        Err(error) => screen.print(error.to_string()),
    }
}

/// The todo list, then a click on "Add todo".
async fn todo_app(screen: Screen) {
    todo_list(screen.clone()).await;

    let client = current_client().unwrap();
    let request = Request::new(ADD_TODO).with_variables(json!({ "input": { "text": "hardcoded" } }));

    match client.mutate(request).await {
        Ok(result) if !result.errors.is_empty() => {
            for error in result.errors {
                screen.print(error.message);
            }
        }
        Ok(result) => screen.print(format!("Successfully added {}", result.data.unwrap_or_default()["addTodo"]["id"])),
        Err(error) => screen.print(error.to_string()),
    }
}

fn global_todos() -> Value {
    json!({
        "todos": [
            { "id": "46e28ed9-1b92-4e1f-9fdf-f1e773dd5448", "text": "First Global Todo", "createdTs": 10, "__typename": "Todo" },
            { "id": "5451e580-291c-4a90-bb28-7602bfef64f1", "text": "Second Global Todo", "createdTs": -11, "__typename": "Todo" }
        ]
    })
}

fn first_and_second() -> MockResolvers {
    MockResolvers::new().with_field(
        "Query",
        "todos",
        json!([{ "text": "First Todo" }, { "text": "Second Todo" }]),
    )
}

#[tokio::test]
async fn works_with_defaults() {
    let provider = MockedProvider::new(SCHEMA, ProviderOptions::new()).unwrap();
    let screen = Screen::default();

    provider
        .render(MockedRenderProps::new(), todo_list(screen.clone()))
        .await
        .unwrap();

    assert_eq!(screen.lines(), ["Loading...", "Hello World", "Hello World"]);
}

#[tokio::test]
async fn works_with_custom_resolvers() {
    let provider = MockedProvider::new(SCHEMA, ProviderOptions::new()).unwrap();
    let screen = Screen::default();

    provider
        .render(
            MockedRenderProps::new().with_resolvers(first_and_second()),
            todo_list(screen.clone()),
        )
        .await
        .unwrap();

    assert_eq!(screen.lines(), ["Loading...", "First Todo", "Second Todo"]);
}

#[tokio::test]
async fn whole_type_mocks_work_like_field_mocks() {
    let provider = MockedProvider::new(SCHEMA, ProviderOptions::new()).unwrap();
    let screen = Screen::default();

    let resolvers = MockResolvers::new().with_type("Query", json!({ "todos": [{ "text": "Only Todo" }] }));

    provider
        .render(MockedRenderProps::new().with_resolvers(resolvers), todo_list(screen.clone()))
        .await
        .unwrap();

    assert_eq!(screen.lines(), ["Loading...", "Only Todo"]);
}

#[tokio::test]
async fn render_resolvers_replace_global_ones() {
    let global = MockResolvers::new()
        .with_field("Query", "todos", json!([{ "text": "Global Todo" }]))
        .with_field("Todo", "createdTs", json!(7));

    let provider = MockedProvider::new(SCHEMA, ProviderOptions::new().with_global_resolvers(global)).unwrap();

    let screen = Screen::default();
    provider
        .render(MockedRenderProps::new(), todo_list(screen.clone()))
        .await
        .unwrap();
    assert_eq!(screen.lines(), ["Loading...", "Global Todo"]);

    let screen = Screen::default();
    let client = provider
        .render(
            MockedRenderProps::new().with_resolvers(first_and_second()),
            async {
                todo_list(screen.clone()).await;
                current_client().unwrap()
            },
        )
        .await
        .unwrap();
    assert_eq!(screen.lines(), ["Loading...", "First Todo", "Second Todo"]);

    // `Todo` was not overridden at render time, the global mock still applies.
    let todos = client.query(Request::new(GET_TODOS)).await.unwrap().data.unwrap();
    assert_eq!(todos["todos"][0]["createdTs"], json!(7));
}

#[tokio::test]
async fn works_with_custom_links() {
    let calls = Arc::new(AtomicUsize::new(0));
    let cache = InMemoryCache::new();

    let options = ProviderOptions::new().with_cache(cache.clone()).with_links({
        let calls = Arc::clone(&calls);
        let expected_cache = cache.clone();

        move |args: LinkArgs<'_>| {
            assert!(args.cache.ptr_eq(&expected_cache));
            assert!(args.schema.sdl().contains("addTodo"));

            let calls = Arc::clone(&calls);
            let link = graphql_mocked_provider::link_fn(move |operation: Operation, forward| {
                calls.fetch_add(1, Ordering::SeqCst);
                forward.run(operation)
            });

            vec![link]
        }
    });

    let provider = MockedProvider::new(SCHEMA, options).unwrap();
    let resolvers = MockResolvers::new().with_field("Query", "todos", json!([]));
    let screen = Screen::default();

    provider
        .render(MockedRenderProps::new().with_resolvers(resolvers), todo_list(screen.clone()))
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(screen.lines(), ["Loading..."]);
}

#[tokio::test]
async fn custom_links_run_before_the_schema() {
    let options = ProviderOptions::new().with_links(|_| {
        let answer: Arc<dyn Link> = graphql_mocked_provider::link_fn(|_, _| {
            let response = graphql_mocked_provider::GraphqlResponse::from_data(json!({
                "todos": [{ "id": "1", "text": "From a link", "createdTs": 1 }]
            }));
            futures::stream::once(async move { Ok(response) }).boxed()
        });
        vec![answer]
    });

    let provider = MockedProvider::new(SCHEMA, options).unwrap();
    let screen = Screen::default();

    provider
        .render(MockedRenderProps::new(), todo_list(screen.clone()))
        .await
        .unwrap();

    assert_eq!(screen.lines(), ["Loading...", "From a link"]);
}

#[tokio::test]
async fn query_errors_are_surfaced() {
    let provider = MockedProvider::new(SCHEMA, ProviderOptions::new()).unwrap();
    let screen = Screen::default();

    let resolvers = MockResolvers::new()
        .with_field("Query", "todo", MockResolver::error("Boom"))
        .with_field("Query", "todos", json!([{ "text": "Success" }]));

    provider
        .render(MockedRenderProps::new().with_resolvers(resolvers), async {
            todo_list(screen.clone()).await;
            todo_item(screen.clone(), "fake").await;
        })
        .await
        .unwrap();

    let text = screen.text();
    assert!(text.contains("Success"), "{text}");
    assert!(text.contains("Boom"), "{text}");
}

#[tokio::test]
#[allow(clippy::panic)]
async fn panicking_resolvers_do_not_abort_the_render() {
    let provider = MockedProvider::new(SCHEMA, ProviderOptions::new()).unwrap();
    let screen = Screen::default();

    let resolvers = MockResolvers::new()
        .with_field("Query", "todo", MockResolver::new(|_| panic!("Boom")))
        .with_field("Query", "todos", json!([{ "text": "Success" }]));

    provider
        .render(MockedRenderProps::new().with_resolvers(resolvers), async {
            todo_list(screen.clone()).await;
            todo_item(screen.clone(), "fake").await;
        })
        .await
        .unwrap();

    assert_eq!(screen.lines(), ["Loading...", "Success", "Boom"]);
}

#[tokio::test]
async fn mutation_errors_are_surfaced() {
    let provider = MockedProvider::new(SCHEMA, ProviderOptions::new()).unwrap();
    let screen = Screen::default();

    let resolvers = first_and_second().with_field("Mutation", "addTodo", MockResolver::error("Boom"));

    provider
        .render(MockedRenderProps::new().with_resolvers(resolvers), todo_app(screen.clone()))
        .await
        .unwrap();

    assert_eq!(screen.lines(), ["Loading...", "First Todo", "Second Todo", "Boom"]);
}

#[tokio::test]
async fn successful_mutations() {
    let provider = MockedProvider::new(SCHEMA, ProviderOptions::new()).unwrap();
    let screen = Screen::default();

    let resolvers = first_and_second().with_field("Mutation", "addTodo", json!({ "id": "new" }));

    provider
        .render(MockedRenderProps::new().with_resolvers(resolvers), todo_app(screen.clone()))
        .await
        .unwrap();

    assert_eq!(screen.lines().last().unwrap(), "Successfully added \"new\"");
}

#[tokio::test]
async fn mutation_results_update_cached_queries() {
    let provider = MockedProvider::new(SCHEMA, ProviderOptions::new()).unwrap();
    let cache = InMemoryCache::new();

    let resolvers = MockResolvers::new()
        .with_field("Query", "todos", json!([{ "id": "1", "text": "Write tests", "createdTs": 1 }]))
        .with_field("Mutation", "addTodo", json!({ "id": "1", "createdTs": 99 }));

    let props = MockedRenderProps::new().with_resolvers(resolvers).with_cache(cache.clone());
    let result = provider
        .render(props, async {
            let client = current_client().unwrap();
            client.query(Request::new(GET_TODOS)).await.unwrap();

            let request = Request::new(ADD_TODO).with_variables(json!({ "input": { "text": "Write tests" } }));
            client.mutate(request).await.unwrap();

            client.query(Request::new(GET_TODOS)).await.unwrap()
        })
        .await
        .unwrap();

    assert_eq!(result.source, ResultSource::Cache);
    assert_eq!(
        result.data,
        Some(json!({ "todos": [{ "id": "1", "text": "Write tests", "createdTs": 99 }] }))
    );
    assert_eq!(cache.extract()["Todo:1"]["createdTs"], json!(99));
}

#[tokio::test]
async fn a_global_cache_is_shared_between_providers() {
    let cache = InMemoryCache::new();
    cache.write_query(GET_TODOS, Value::Null, &global_todos()).unwrap();

    let resolver_calls = Arc::new(AtomicUsize::new(0));
    let resolvers = MockResolvers::new().with_field("Query", "todos", {
        let resolver_calls = Arc::clone(&resolver_calls);
        MockResolver::new(move |_| {
            resolver_calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!([{ "text": "From the resolver" }]))
        })
    });

    let first = MockedProvider::new(SCHEMA, ProviderOptions::new().with_cache(cache.clone())).unwrap();
    let screen = Screen::default();
    first
        .render(MockedRenderProps::new().with_resolvers(resolvers), todo_list(screen.clone()))
        .await
        .unwrap();
    assert_eq!(screen.lines(), ["First Global Todo", "Second Global Todo"]);

    let second = MockedProvider::new(SCHEMA, ProviderOptions::new().with_cache(cache)).unwrap();
    let screen = Screen::default();
    second
        .render(MockedRenderProps::new(), todo_list(screen.clone()))
        .await
        .unwrap();
    assert_eq!(screen.lines(), ["First Global Todo", "Second Global Todo"]);

    // Cached data wins, the resolver never ran.
    assert_eq!(resolver_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn a_render_cache_wins_over_the_global_one() {
    let global = InMemoryCache::new();
    global.write_query(GET_TODOS, Value::Null, &global_todos()).unwrap();

    let local = InMemoryCache::new();
    local
        .write_query(
            GET_TODOS,
            Value::Null,
            &json!({
                "todos": [{ "id": "1", "text": "First Local Todo", "createdTs": 1, "__typename": "Todo" }]
            }),
        )
        .unwrap();

    let provider = MockedProvider::new(SCHEMA, ProviderOptions::new().with_cache(global)).unwrap();
    let screen = Screen::default();

    provider
        .render(MockedRenderProps::new().with_cache(local), todo_list(screen.clone()))
        .await
        .unwrap();

    assert_eq!(screen.lines(), ["First Local Todo"]);
}

#[tokio::test]
async fn network_results_land_in_the_render_cache() {
    let provider = MockedProvider::new(SCHEMA, ProviderOptions::new()).unwrap();
    let cache = InMemoryCache::new();

    provider
        .render(
            MockedRenderProps::new()
                .with_resolvers(first_and_second())
                .with_cache(cache.clone()),
            todo_list(Screen::default()),
        )
        .await
        .unwrap();

    let cached = cache.read_query("{ todos { text } }", Value::Null).unwrap();
    assert_eq!(
        cached,
        Some(json!({ "todos": [{ "text": "First Todo" }, { "text": "Second Todo" }] }))
    );
}

#[tokio::test]
async fn invalid_type_definitions_fail_at_construction() {
    let error = MockedProvider::new("type Query {", ProviderOptions::new()).unwrap_err();
    assert!(error.to_string().starts_with("could not parse the type definitions"));
}

#[tokio::test]
async fn error_provider_defaults_to_an_unspecified_error() {
    let provider = ErrorProvider::new(ProviderOptions::new());
    let screen = Screen::default();

    provider
        .render(ErrorRenderProps::new(Vec::new()), todo_list(screen.clone()))
        .await;

    assert_eq!(
        screen.lines(),
        ["Loading...".to_string(), format!("Error! {DEFAULT_ERROR_MESSAGE}")]
    );
    assert!(screen.text().contains("Unspecified error from ErrorProvider."));
}

#[tokio::test]
async fn error_provider_returns_errors_in_order() {
    let provider = ErrorProvider::new(ProviderOptions::new());
    let screen = Screen::default();

    let errors = vec![GraphqlError::new("Something went wrong"), GraphqlError::new("And again")];
    provider
        .render(ErrorRenderProps::new(errors), todo_list(screen.clone()))
        .await;

    assert_eq!(screen.lines(), ["Loading...", "Error! Something went wrong\nAnd again"]);
}

#[tokio::test]
async fn loading_provider_never_leaves_the_loading_state() {
    let provider = LoadingProvider::new(ProviderOptions::new());
    let screen = Screen::default();

    let rendered = tokio::time::timeout(
        Duration::from_millis(100),
        provider.render(LoadingRenderProps::default(), todo_list(screen.clone())),
    )
    .await;

    assert!(rendered.is_err());
    assert_eq!(screen.lines(), ["Loading..."]);
}

#[tokio::test]
async fn loading_provider_uses_the_factory_cache() {
    let cache = InMemoryCache::new();
    cache.write_query(GET_TODOS, Value::Null, &global_todos()).unwrap();

    let provider = LoadingProvider::new(ProviderOptions::new().with_cache(cache));
    let screen = Screen::default();

    provider
        .render(LoadingRenderProps::default(), todo_list(screen.clone()))
        .await;

    assert_eq!(screen.lines(), ["First Global Todo", "Second Global Todo"]);
}

struct RecordingScope(Arc<AtomicBool>);

impl ContextProvider for RecordingScope {
    fn provide<F>(&self, client: Client, children: F) -> impl Future<Output = F::Output> + Send
    where
        F: Future + Send,
        F::Output: Send,
    {
        self.0.store(true, Ordering::SeqCst);
        ClientScope.provide(client, children)
    }
}

#[tokio::test]
async fn the_context_provider_can_be_replaced() {
    let used = Arc::new(AtomicBool::new(false));
    let options = ProviderOptions::new().with_provider(RecordingScope(Arc::clone(&used)));

    let provider = MockedProvider::with_provider_options(SCHEMA, options).unwrap();
    let screen = Screen::default();

    provider
        .render(
            MockedRenderProps::new().with_resolvers(first_and_second()),
            todo_list(screen.clone()),
        )
        .await
        .unwrap();

    assert!(used.load(Ordering::SeqCst));
    assert_eq!(screen.lines(), ["Loading...", "First Todo", "Second Todo"]);
}
