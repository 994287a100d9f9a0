use futures::{future, stream, StreamExt as _};

use super::{Link, NextLink, ResponseStream};
use crate::{GraphqlError, GraphqlResponse, Operation};

pub const DEFAULT_ERROR_MESSAGE: &str = "Unspecified error from ErrorProvider.";

/// Terminating link answering every operation with the same GraphQL errors.
#[derive(Debug, Clone)]
pub struct ErrorLink {
    errors: Vec<GraphqlError>,
}

impl ErrorLink {
    /// An empty list is replaced by a single [`DEFAULT_ERROR_MESSAGE`] error.
    pub fn new(errors: Vec<GraphqlError>) -> Self {
        let errors = if errors.is_empty() {
            vec![GraphqlError::new(DEFAULT_ERROR_MESSAGE)]
        } else {
            errors
        };

        ErrorLink { errors }
    }

    pub fn errors(&self) -> &[GraphqlError] {
        &self.errors
    }
}

impl Link for ErrorLink {
    fn request(&self, operation: Operation, _forward: NextLink) -> ResponseStream {
        tracing::debug!(
            operation = %operation.display_name(),
            errors = self.errors.len(),
            "answering operation with errors"
        );

        let response = GraphqlResponse::from_errors(self.errors.clone());
        stream::once(future::ready(Ok(response))).boxed()
    }
}
