use std::future::Future;

use crate::{provider::ClientScope, Client, ContextProvider, InMemoryCache, LinkChain, LoadingLink, ProviderOptions};

#[derive(Debug, Clone, Default)]
pub struct LoadingRenderProps {
    pub cache: Option<InMemoryCache>,
}

/// Keeps every operation in flight forever.
#[derive(Debug, Clone)]
pub struct LoadingProvider<P = ClientScope> {
    options: ProviderOptions<P>,
}

impl LoadingProvider {
    pub fn new(options: ProviderOptions) -> Self {
        LoadingProvider { options }
    }
}

impl<P: ContextProvider> LoadingProvider<P> {
    pub fn with_provider_options(options: ProviderOptions<P>) -> Self {
        LoadingProvider { options }
    }

    pub fn client(&self, props: &LoadingRenderProps) -> Client {
        Client::new(
            LinkChain::single(LoadingLink),
            self.options.select_cache(props.cache.as_ref()),
        )
    }

    pub async fn render<F>(&self, props: LoadingRenderProps, children: F) -> F::Output
    where
        F: Future + Send,
        F::Output: Send,
    {
        let client = self.client(&props);
        self.options.provider().provide(client, children).await
    }
}
