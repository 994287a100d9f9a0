use std::{future::Future, sync::Arc};

use crate::{
    options::LinkArgs, provider::ClientScope, Client, ContextProvider, DefaultOptions, ErrorPolicy, InMemoryCache,
    Link, LinkChain, MockResolvers, MockedSchema, OnErrorLink, OperationOptions, ProviderOptions, SchemaError,
    SchemaLink, TypeDefs,
};

/// Per render overrides of a [`MockedProvider`].
#[derive(Debug, Clone, Default)]
pub struct MockedRenderProps {
    /// Replaces the global resolvers type by type.
    pub custom_resolvers: MockResolvers,
    pub cache: Option<InMemoryCache>,
}

impl MockedRenderProps {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_resolvers(mut self, resolvers: MockResolvers) -> Self {
        self.custom_resolvers = resolvers;
        self
    }

    #[must_use]
    pub fn with_cache(mut self, cache: InMemoryCache) -> Self {
        self.cache = Some(cache);
        self
    }
}

/// Answers every operation from a schema mocked after the given type definitions.
#[derive(Debug, Clone)]
pub struct MockedProvider<P = ClientScope> {
    type_defs: TypeDefs,
    options: ProviderOptions<P>,
}

impl MockedProvider {
    /// Fails right away on type definitions that cannot be mocked.
    pub fn new(type_defs: impl AsRef<str>, options: ProviderOptions) -> Result<Self, SchemaError> {
        Self::with_provider_options(type_defs, options)
    }
}

impl<P: ContextProvider> MockedProvider<P> {
    pub fn with_provider_options(type_defs: impl AsRef<str>, options: ProviderOptions<P>) -> Result<Self, SchemaError> {
        let type_defs = TypeDefs::parse(type_defs)?;
        MockedSchema::build(&type_defs, options.global_resolvers())?;

        Ok(MockedProvider { type_defs, options })
    }

    pub fn type_defs(&self) -> &TypeDefs {
        &self.type_defs
    }

    pub fn options(&self) -> &ProviderOptions<P> {
        &self.options
    }

    /// Builds the client of one render: a fresh mocked schema behind
    /// `[error reporting, custom links.., schema]`.
    pub fn client(&self, props: &MockedRenderProps) -> Result<Client, SchemaError> {
        let resolvers = MockResolvers::merge(self.options.global_resolvers(), &props.custom_resolvers);
        let schema = MockedSchema::build(&self.type_defs, &resolvers)?;
        let cache = self.options.select_cache(props.cache.as_ref());

        let custom_links = self.options.extra_links(LinkArgs {
            cache: &cache,
            schema: &schema,
        });

        tracing::debug!(
            resolvers = resolvers.len(),
            custom_links = custom_links.len(),
            "building a mocked client"
        );

        let mut links: Vec<Arc<dyn Link>> = Vec::with_capacity(custom_links.len() + 2);
        links.push(Arc::new(OnErrorLink::quiet()));
        links.extend(custom_links);
        links.push(Arc::new(SchemaLink::new(schema)));

        let default_options = self.options.default_options().unwrap_or(DefaultOptions {
            query: OperationOptions::default(),
            mutate: OperationOptions::default().with_error_policy(ErrorPolicy::All),
        });

        Ok(Client::with_default_options(LinkChain::from(links), cache, default_options))
    }

    /// Runs `children` with the client of this render in context.
    pub async fn render<F>(&self, props: MockedRenderProps, children: F) -> Result<F::Output, SchemaError>
    where
        F: Future + Send,
        F::Output: Send,
    {
        let client = self.client(&props)?;
        Ok(self.options.provider().provide(client, children).await)
    }
}
