use std::future::Future;

use crate::{
    provider::ClientScope, Client, ContextProvider, ErrorLink, GraphqlError, InMemoryCache, LinkChain, ProviderOptions,
};

#[derive(Debug, Clone, Default)]
pub struct ErrorRenderProps {
    /// Returned as is, in order. When empty, a single
    /// [`DEFAULT_ERROR_MESSAGE`](crate::DEFAULT_ERROR_MESSAGE) error is returned instead.
    pub graphql_errors: Vec<GraphqlError>,
    pub cache: Option<InMemoryCache>,
}

impl ErrorRenderProps {
    pub fn new(graphql_errors: Vec<GraphqlError>) -> Self {
        ErrorRenderProps {
            graphql_errors,
            cache: None,
        }
    }

    #[must_use]
    pub fn with_cache(mut self, cache: InMemoryCache) -> Self {
        self.cache = Some(cache);
        self
    }
}

/// Answers every operation with the same GraphQL errors.
#[derive(Debug, Clone)]
pub struct ErrorProvider<P = ClientScope> {
    options: ProviderOptions<P>,
}

impl ErrorProvider {
    pub fn new(options: ProviderOptions) -> Self {
        ErrorProvider { options }
    }
}

impl<P: ContextProvider> ErrorProvider<P> {
    pub fn with_provider_options(options: ProviderOptions<P>) -> Self {
        ErrorProvider { options }
    }

    pub fn client(&self, props: &ErrorRenderProps) -> Client {
        Client::new(
            LinkChain::single(ErrorLink::new(props.graphql_errors.clone())),
            self.options.select_cache(props.cache.as_ref()),
        )
    }

    pub async fn render<F>(&self, props: ErrorRenderProps, children: F) -> F::Output
    where
        F: Future + Send,
        F::Output: Send,
    {
        let client = self.client(&props);
        self.options.provider().provide(client, children).await
    }
}
