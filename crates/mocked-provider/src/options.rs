use std::{fmt, sync::Arc};

use crate::{provider::ClientScope, ContextProvider, DefaultOptions, InMemoryCache, Link, MockResolvers, MockedSchema};

/// What a [`ProviderOptions::with_links`] closure gets to build its links from.
#[derive(Debug, Clone, Copy)]
pub struct LinkArgs<'a> {
    /// The cache the client of this render uses.
    pub cache: &'a InMemoryCache,
    pub schema: &'a MockedSchema,
}

type LinksFn = dyn Fn(LinkArgs<'_>) -> Vec<Arc<dyn Link>> + Send + Sync;

/// Factory level configuration, shared by every render of a provider.
///
/// Only [`MockedProvider`](crate::MockedProvider) uses the links, the default
/// options and the global resolvers. The other providers only look at the cache.
#[derive(Clone)]
pub struct ProviderOptions<P = ClientScope> {
    cache: Option<InMemoryCache>,
    links: Option<Arc<LinksFn>>,
    default_options: Option<DefaultOptions>,
    global_resolvers: MockResolvers,
    provider: P,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        ProviderOptions {
            cache: None,
            links: None,
            default_options: None,
            global_resolvers: MockResolvers::new(),
            provider: ClientScope,
        }
    }
}

impl ProviderOptions {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P> ProviderOptions<P> {
    /// A cache shared by every render that does not bring its own.
    #[must_use]
    pub fn with_cache(mut self, cache: InMemoryCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Extra links, placed between the error reporting link and the schema.
    /// Called once per render.
    #[must_use]
    pub fn with_links<F>(mut self, links: F) -> Self
    where
        F: Fn(LinkArgs<'_>) -> Vec<Arc<dyn Link>> + Send + Sync + 'static,
    {
        self.links = Some(Arc::new(links));
        self
    }

    #[must_use]
    pub fn with_default_options(mut self, default_options: DefaultOptions) -> Self {
        self.default_options = Some(default_options);
        self
    }

    /// Resolvers applied to every render, under the ones given at render time.
    #[must_use]
    pub fn with_global_resolvers(mut self, resolvers: MockResolvers) -> Self {
        self.global_resolvers = resolvers;
        self
    }

    #[deprecated(note = "use `with_global_resolvers`")]
    #[must_use]
    pub fn with_client_resolvers(self, resolvers: MockResolvers) -> Self {
        self.with_global_resolvers(resolvers)
    }

    /// Replaces the way the client is exposed to the wrapped code.
    pub fn with_provider<Q: ContextProvider>(self, provider: Q) -> ProviderOptions<Q> {
        ProviderOptions {
            cache: self.cache,
            links: self.links,
            default_options: self.default_options,
            global_resolvers: self.global_resolvers,
            provider,
        }
    }

    pub fn cache(&self) -> Option<&InMemoryCache> {
        self.cache.as_ref()
    }

    pub fn default_options(&self) -> Option<DefaultOptions> {
        self.default_options
    }

    pub fn global_resolvers(&self) -> &MockResolvers {
        &self.global_resolvers
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The render cache, else the factory cache, else a fresh one.
    pub(crate) fn select_cache(&self, render_cache: Option<&InMemoryCache>) -> InMemoryCache {
        render_cache.or(self.cache.as_ref()).cloned().unwrap_or_default()
    }

    pub(crate) fn extra_links(&self, args: LinkArgs<'_>) -> Vec<Arc<dyn Link>> {
        self.links.as_ref().map(|links| links(args)).unwrap_or_default()
    }
}

impl<P: fmt::Debug> fmt::Debug for ProviderOptions<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderOptions")
            .field("cache", &self.cache.is_some())
            .field("links", &self.links.is_some())
            .field("default_options", &self.default_options)
            .field("global_resolvers", &self.global_resolvers)
            .field("provider", &self.provider)
            .finish()
    }
}
