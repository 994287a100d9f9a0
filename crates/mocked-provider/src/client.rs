//! The GraphQL client handed to consumers: a link chain in front of a cache.

use std::{fmt, sync::Arc};

use futures::{
    future,
    stream::{self, BoxStream},
    StreamExt as _,
};
use serde_json::Value;

use crate::{
    cache::{self, CacheError, InMemoryCache},
    link::{LinkChain, LinkError},
    operation::DocumentError,
    GraphqlError, GraphqlResponse, Operation,
};

#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    #[error("{}", join_messages(.0))]
    GraphQl(Vec<GraphqlError>),
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("the link chain completed without a response")]
    NoResponse,
    #[error("no client is in scope, the consumer must run inside a provider")]
    MissingClient,
}

fn join_messages(errors: &[GraphqlError]) -> String {
    errors
        .iter()
        .map(|error| error.message.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Where a query looks for its data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchPolicy {
    /// The cache when it holds every selected field, the link chain otherwise.
    #[default]
    CacheFirst,
    /// Never the link chain. A miss gives no data.
    CacheOnly,
    /// Always the link chain, the result is written to the cache.
    NetworkOnly,
    /// Always the link chain, the cache is left untouched.
    NoCache,
}

/// What happens to GraphQL errors in a response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Any error fails the whole request with [`ClientError::GraphQl`].
    #[default]
    None,
    /// Errors are dropped, data is kept.
    Ignore,
    /// Data and errors are both returned.
    All,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationOptions {
    pub fetch_policy: FetchPolicy,
    pub error_policy: ErrorPolicy,
}

impl OperationOptions {
    #[must_use]
    pub fn with_fetch_policy(mut self, fetch_policy: FetchPolicy) -> Self {
        self.fetch_policy = fetch_policy;
        self
    }

    #[must_use]
    pub fn with_error_policy(mut self, error_policy: ErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }
}

/// Client wide defaults, overridable per request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultOptions {
    pub query: OperationOptions,
    pub mutate: OperationOptions,
}

/// A query or a mutation to send through the client.
#[derive(Debug, Clone)]
pub struct Request {
    query: String,
    variables: Value,
    operation_name: Option<String>,
    fetch_policy: Option<FetchPolicy>,
    error_policy: Option<ErrorPolicy>,
}

impl Request {
    pub fn new(query: impl Into<String>) -> Self {
        Request {
            query: query.into(),
            variables: Value::Null,
            operation_name: None,
            fetch_policy: None,
            error_policy: None,
        }
    }

    #[must_use]
    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = variables;
        self
    }

    #[must_use]
    pub fn with_operation_name(mut self, operation_name: impl Into<String>) -> Self {
        self.operation_name = Some(operation_name.into());
        self
    }

    #[must_use]
    pub fn with_fetch_policy(mut self, fetch_policy: FetchPolicy) -> Self {
        self.fetch_policy = Some(fetch_policy);
        self
    }

    #[must_use]
    pub fn with_error_policy(mut self, error_policy: ErrorPolicy) -> Self {
        self.error_policy = Some(error_policy);
        self
    }

    fn operation(&self) -> Result<Operation, DocumentError> {
        let mut operation = Operation::new(self.query.as_str())?.with_variables(self.variables.clone())?;
        if let Some(name) = &self.operation_name {
            operation = operation.with_operation_name(name.as_str())?;
        }
        Ok(operation)
    }

    fn options(&self, defaults: OperationOptions) -> OperationOptions {
        OperationOptions {
            fetch_policy: self.fetch_policy.unwrap_or(defaults.fetch_policy),
            error_policy: self.error_policy.unwrap_or(defaults.error_policy),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultSource {
    Cache,
    Network,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub data: Option<Value>,
    /// Only ever filled with [`ErrorPolicy::All`].
    pub errors: Vec<GraphqlError>,
    pub source: ResultSource,
}

impl QueryResult {
    fn cached(data: Option<Value>) -> Self {
        QueryResult {
            data,
            errors: Vec::new(),
            source: ResultSource::Cache,
        }
    }
}

/// What a consumer watching a query gets to render.
#[derive(Debug, Clone)]
pub enum QueryState {
    Loading,
    Ready(QueryResult),
    Failed(ClientError),
}

impl QueryState {
    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading)
    }
}

impl From<Result<QueryResult, ClientError>> for QueryState {
    fn from(result: Result<QueryResult, ClientError>) -> Self {
        match result {
            Ok(result) => QueryState::Ready(result),
            Err(error) => QueryState::Failed(error),
        }
    }
}

struct ClientInner {
    link: LinkChain,
    cache: InMemoryCache,
    default_options: DefaultOptions,
}

/// A cheaply cloneable handle; clones share the link chain and the cache.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    pub fn new(link: LinkChain, cache: InMemoryCache) -> Self {
        Self::with_default_options(link, cache, DefaultOptions::default())
    }

    pub fn with_default_options(link: LinkChain, cache: InMemoryCache, default_options: DefaultOptions) -> Self {
        Client {
            inner: Arc::new(ClientInner {
                link,
                cache,
                default_options,
            }),
        }
    }

    pub fn cache(&self) -> &InMemoryCache {
        &self.inner.cache
    }

    pub fn link(&self) -> &LinkChain {
        &self.inner.link
    }

    pub fn default_options(&self) -> DefaultOptions {
        self.inner.default_options
    }

    /// Runs a query.
    ///
    /// With [`FetchPolicy::CacheFirst`] a cache hit is returned without calling
    /// the link chain at all, so data already in the cache takes precedence over
    /// whatever the chain would answer.
    pub async fn query(&self, request: Request) -> Result<QueryResult, ClientError> {
        let options = request.options(self.inner.default_options.query);
        let operation = request.operation()?;

        if let Some(result) = self.from_cache(&operation, options.fetch_policy)? {
            return Ok(result);
        }

        self.fetch(operation, options).await
    }

    /// Runs a mutation. The link chain is always used.
    pub async fn mutate(&self, request: Request) -> Result<QueryResult, ClientError> {
        let mut options = request.options(self.inner.default_options.mutate);
        if options.fetch_policy != FetchPolicy::NoCache {
            options.fetch_policy = FetchPolicy::NetworkOnly;
        }

        self.fetch(request.operation()?, options).await
    }

    /// Runs a query and reports its progress: [`QueryState::Loading`] first,
    /// unless the cache answers straight away, then the outcome.
    pub fn watch_query(&self, request: Request) -> BoxStream<'static, QueryState> {
        let options = request.options(self.inner.default_options.query);

        let operation = match request.operation() {
            Ok(operation) => operation,
            Err(error) => return stream::once(future::ready(QueryState::Failed(error.into()))).boxed(),
        };

        match self.from_cache(&operation, options.fetch_policy) {
            Ok(Some(result)) => return stream::once(future::ready(QueryState::Ready(result))).boxed(),
            Err(error) => return stream::once(future::ready(QueryState::Failed(error))).boxed(),
            Ok(None) => {}
        }

        let client = self.clone();
        let outcome = async move { QueryState::from(client.fetch(operation, options).await) };

        stream::once(future::ready(QueryState::Loading))
            .chain(stream::once(outcome))
            .boxed()
    }

    fn from_cache(&self, operation: &Operation, fetch_policy: FetchPolicy) -> Result<Option<QueryResult>, ClientError> {
        match fetch_policy {
            FetchPolicy::CacheFirst | FetchPolicy::CacheOnly => {
                if let Some(data) = self.inner.cache.read(operation)? {
                    tracing::debug!(operation = %operation.display_name(), "answered from the cache");
                    return Ok(Some(QueryResult::cached(Some(data))));
                }

                if fetch_policy == FetchPolicy::CacheOnly {
                    tracing::debug!(operation = %operation.display_name(), "cache miss with a cache-only policy");
                    return Ok(Some(QueryResult::cached(None)));
                }

                Ok(None)
            }
            FetchPolicy::NetworkOnly | FetchPolicy::NoCache => Ok(None),
        }
    }

    async fn fetch(&self, operation: Operation, options: OperationOptions) -> Result<QueryResult, ClientError> {
        // Entities are only normalized when results carry their `__typename`.
        let request = operation.with_typenames()?;

        let mut responses = self.inner.link.execute(request.clone());
        let GraphqlResponse { data, errors, .. } = responses.next().await.ok_or(ClientError::NoResponse)??;

        let errors = match options.error_policy {
            ErrorPolicy::None if !errors.is_empty() => return Err(ClientError::GraphQl(errors)),
            ErrorPolicy::None | ErrorPolicy::Ignore => Vec::new(),
            ErrorPolicy::All => errors,
        };

        if options.fetch_policy != FetchPolicy::NoCache {
            if let Some(data) = data.as_ref().filter(|data| data.is_object()) {
                self.inner.cache.write(&request, data)?;
            }
        }

        let data = data.map(|data| cache::project(&operation, &data)).transpose()?;

        Ok(QueryResult {
            data,
            errors,
            source: ResultSource::Network,
        })
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("link", &self.inner.link)
            .field("default_options", &self.inner.default_options)
            .finish_non_exhaustive()
    }
}
