use std::{fmt, sync::Arc};

use futures::StreamExt as _;

use super::{Link, LinkError, NextLink, ResponseStream};
use crate::{GraphqlError, Operation};

pub enum ErrorReport<'a> {
    GraphQl {
        operation: &'a Operation,
        errors: &'a [GraphqlError],
    },
    Transport {
        operation: &'a Operation,
        error: &'a LinkError,
    },
}

impl ErrorReport<'_> {
    pub fn operation(&self) -> &Operation {
        match self {
            ErrorReport::GraphQl { operation, .. } | ErrorReport::Transport { operation, .. } => operation,
        }
    }
}

type Handler = Arc<dyn Fn(ErrorReport<'_>) + Send + Sync>;

/// Reports the errors coming back from the rest of the chain to a handler.
///
/// Responses are passed on untouched: the handler only observes them.
#[derive(Clone)]
pub struct OnErrorLink {
    handler: Handler,
}

impl OnErrorLink {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(ErrorReport<'_>) + Send + Sync + 'static,
    {
        OnErrorLink {
            handler: Arc::new(handler),
        }
    }

    /// Only logs the errors at debug level.
    pub fn quiet() -> Self {
        Self::new(|report| match report {
            ErrorReport::GraphQl { operation, errors } => {
                tracing::debug!(operation = %operation.display_name(), errors = errors.len(), "operation returned errors");
            }
            ErrorReport::Transport { operation, error } => {
                tracing::debug!(operation = %operation.display_name(), "operation failed: {error}");
            }
        })
    }
}

impl Link for OnErrorLink {
    fn request(&self, operation: Operation, forward: NextLink) -> ResponseStream {
        let handler = Arc::clone(&self.handler);
        let reported = operation.clone();

        forward
            .run(operation)
            .inspect(move |result| match result {
                Ok(response) if response.has_errors() => handler(ErrorReport::GraphQl {
                    operation: &reported,
                    errors: &response.errors,
                }),
                Ok(_) => {}
                Err(error) => handler(ErrorReport::Transport {
                    operation: &reported,
                    error,
                }),
            })
            .boxed()
    }
}

impl fmt::Debug for OnErrorLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnErrorLink").finish_non_exhaustive()
    }
}
