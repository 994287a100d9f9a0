use cynic::{http::ReqwestExt as _, QueryBuilder as _};
use cynic_introspection::IntrospectionQuery;
use reqwest::header::USER_AGENT;

use crate::USER_AGENT_VALUE;

pub(super) async fn introspect(
    client: &reqwest::Client,
    url: &str,
    headers: &[(impl AsRef<str>, impl AsRef<str>)],
) -> Result<String, String> {
    let mut request_builder = client.post(url).header(USER_AGENT, USER_AGENT_VALUE);

    for (name, value) in headers {
        request_builder = request_builder.header(name.as_ref(), value.as_ref());
    }

    let response = request_builder
        .run_graphql(IntrospectionQuery::build(()))
        .await
        .map_err(|err| err.to_string())?;

    if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
        let messages: Vec<_> = errors.into_iter().map(|error| error.message).collect();
        return Err(messages.join(", "));
    }

    let Some(data) = response.data else {
        return Err("the introspection response contains no data".to_string());
    };

    let schema = data.into_schema().map_err(|err| err.to_string())?;

    Ok(schema.to_sdl())
}
