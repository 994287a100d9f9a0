use futures::{stream, StreamExt as _};

use super::{Link, NextLink, ResponseStream};
use crate::{MockedSchema, Operation};

/// Terminating link answering every operation by executing it against a mocked schema.
#[derive(Clone)]
pub struct SchemaLink {
    schema: MockedSchema,
}

impl SchemaLink {
    pub fn new(schema: MockedSchema) -> Self {
        SchemaLink { schema }
    }
}

impl Link for SchemaLink {
    fn request(&self, operation: Operation, _forward: NextLink) -> ResponseStream {
        let schema = self.schema.clone();
        stream::once(async move { schema.execute(&operation).await }).boxed()
    }
}
