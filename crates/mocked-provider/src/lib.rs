//! GraphQL clients wired to mock transports, for testing code that consumes a GraphQL client.
//!
//! Three providers build such clients and run the code under test with the client in context:
//!
//! - [`MockedProvider`] answers from a schema mocked after type definitions, with optional
//!   [`MockResolvers`] per provider and per render.
//! - [`LoadingProvider`] never answers.
//! - [`ErrorProvider`] always answers with the same GraphQL errors.
//!
//! The code under test reaches the client with [`current_client()`].

mod cache;
mod client;
mod error_provider;
mod link;
mod loading;
mod mocked;
mod operation;
mod options;
mod provider;
mod resolvers;
mod response;
mod schema;

pub use {
    cache::{CacheError, InMemoryCache, ROOT_MUTATION, ROOT_QUERY, ROOT_SUBSCRIPTION},
    client::{
        Client, ClientError, DefaultOptions, ErrorPolicy, FetchPolicy, OperationOptions, QueryResult, QueryState,
        Request, ResultSource,
    },
    error_provider::{ErrorProvider, ErrorRenderProps},
    link::{
        link_fn, ErrorLink, ErrorReport, Link, LinkChain, LinkError, LinkResult, LoadingLink, NextLink, OnErrorLink,
        ResponseStream, SchemaLink, DEFAULT_ERROR_MESSAGE,
    },
    loading::{LoadingProvider, LoadingRenderProps},
    mocked::{MockedProvider, MockedRenderProps},
    operation::{DocumentError, Operation, OperationKind},
    options::{LinkArgs, ProviderOptions},
    provider::{current_client, ClientScope, ContextProvider},
    resolvers::{FieldMocks, MockContext, MockResolver, MockResolvers, ResolverError, TypeMock},
    response::{GraphqlError, GraphqlResponse, Location, PathSegment},
    schema::{MockedSchema, SchemaError, TypeDefs},
};
