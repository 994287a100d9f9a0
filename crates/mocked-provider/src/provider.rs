use std::future::Future;

use crate::{Client, ClientError};

tokio::task_local! {
    static CURRENT_CLIENT: Client;
}

/// How a provider makes its client reachable from the code it wraps.
pub trait ContextProvider: Send + Sync {
    fn provide<F>(&self, client: Client, children: F) -> impl Future<Output = F::Output> + Send
    where
        F: Future + Send,
        F::Output: Send;
}

/// Exposes the client to the wrapped future through a task local, see [`current_client`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientScope;

impl ContextProvider for ClientScope {
    fn provide<F>(&self, client: Client, children: F) -> impl Future<Output = F::Output> + Send
    where
        F: Future + Send,
        F::Output: Send,
    {
        CURRENT_CLIENT.scope(client, children)
    }
}

/// The client of the innermost enclosing [`ClientScope`].
pub fn current_client() -> Result<Client, ClientError> {
    CURRENT_CLIENT
        .try_with(Client::clone)
        .map_err(|_| ClientError::MissingClient)
}
