use futures::{stream, StreamExt as _};

use super::{Link, NextLink, ResponseStream};
use crate::Operation;

/// Terminating link whose responses never arrive.
///
/// Anything awaiting the result stays pending until it is dropped, which keeps
/// consumers in their loading state for as long as the test runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadingLink;

impl Link for LoadingLink {
    fn request(&self, operation: Operation, _forward: NextLink) -> ResponseStream {
        tracing::debug!(operation = %operation.display_name(), "holding operation forever");
        stream::pending().boxed()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::LinkChain;

    #[tokio::test]
    async fn never_answers() {
        let chain = LinkChain::single(LoadingLink);
        let mut responses = chain.execute(Operation::new("{ todos { id } }").unwrap());

        let waited = tokio::time::timeout(Duration::from_millis(50), responses.next()).await;
        assert!(waited.is_err());
    }
}
