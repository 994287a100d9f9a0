//! The request pipeline between a [`Client`](crate::Client) and whatever answers its operations.
//!
//! A chain is an ordered list of links. Each link receives the operation and a
//! [`NextLink`] continuation: it may inspect or modify the operation and forward
//! it, or answer it itself. The last link of a chain is expected to answer.

mod error;
mod loading;
mod on_error;
mod schema;

use std::{fmt, sync::Arc};

use futures::{
    future,
    stream::{self, BoxStream},
    StreamExt as _,
};

use crate::{operation::DocumentError, GraphqlResponse, Operation};

pub use self::{
    error::{ErrorLink, DEFAULT_ERROR_MESSAGE},
    loading::LoadingLink,
    on_error::{ErrorReport, OnErrorLink},
    schema::SchemaLink,
};

#[derive(Debug, Clone, thiserror::Error)]
pub enum LinkError {
    #[error("the operation reached the end of the link chain without being answered")]
    NoTerminatingLink,
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("{0}")]
    Transport(String),
}

impl LinkError {
    pub fn transport(error: impl ToString) -> Self {
        LinkError::Transport(error.to_string())
    }
}

pub type LinkResult = Result<GraphqlResponse, LinkError>;

pub type ResponseStream = BoxStream<'static, LinkResult>;

pub trait Link: Send + Sync {
    fn request(&self, operation: Operation, forward: NextLink) -> ResponseStream;
}

impl<F> Link for F
where
    F: Fn(Operation, NextLink) -> ResponseStream + Send + Sync,
{
    fn request(&self, operation: Operation, forward: NextLink) -> ResponseStream {
        self(operation, forward)
    }
}

/// Wraps a closure into a link that can be put in a chain.
pub fn link_fn<F>(f: F) -> Arc<dyn Link>
where
    F: Fn(Operation, NextLink) -> ResponseStream + Send + Sync + 'static,
{
    Arc::new(f)
}

/// The rest of the chain, from the point of view of the link currently running.
#[derive(Clone)]
pub struct NextLink {
    links: Arc<[Arc<dyn Link>]>,
    position: usize,
}

impl NextLink {
    pub fn run(self, operation: Operation) -> ResponseStream {
        let Some(link) = self.links.get(self.position).cloned() else {
            tracing::debug!(operation = %operation.display_name(), "operation forwarded past the last link");
            return stream::once(future::ready(Err(LinkError::NoTerminatingLink))).boxed();
        };

        let next = NextLink {
            links: self.links,
            position: self.position + 1,
        };

        link.request(operation, next)
    }

    /// Number of links left after the current one.
    pub fn remaining(&self) -> usize {
        self.links.len().saturating_sub(self.position)
    }
}

/// An ordered, immutable composition of links.
#[derive(Clone)]
pub struct LinkChain {
    links: Arc<[Arc<dyn Link>]>,
}

impl LinkChain {
    pub fn new(links: impl IntoIterator<Item = Arc<dyn Link>>) -> Self {
        LinkChain {
            links: links.into_iter().collect(),
        }
    }

    pub fn single(link: impl Link + 'static) -> Self {
        Self::new([Arc::new(link) as Arc<dyn Link>])
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn execute(&self, operation: Operation) -> ResponseStream {
        tracing::debug!(
            operation = %operation.display_name(),
            kind = %operation.kind(),
            links = self.links.len(),
            "executing operation"
        );

        NextLink {
            links: Arc::clone(&self.links),
            position: 0,
        }
        .run(operation)
    }
}

impl From<Vec<Arc<dyn Link>>> for LinkChain {
    fn from(links: Vec<Arc<dyn Link>>) -> Self {
        LinkChain::new(links)
    }
}

impl fmt::Debug for LinkChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkChain").field("links", &self.links.len()).finish()
    }
}
