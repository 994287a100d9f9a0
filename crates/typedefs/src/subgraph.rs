//! Federation subgraphs expose their SDL, directives included, through `_service`.

use reqwest::header::{ACCEPT, USER_AGENT};

use crate::USER_AGENT_VALUE;

#[derive(serde::Deserialize)]
struct Service {
    sdl: String,
}

#[derive(serde::Deserialize)]
struct ServiceData {
    #[serde(rename = "_service")]
    service: Service,
}

#[derive(serde::Deserialize)]
struct ServiceResponse {
    data: Option<ServiceData>,
}

#[derive(serde::Serialize)]
struct ServiceRequest {
    query: &'static str,
}

pub(super) async fn introspect(
    client: &reqwest::Client,
    url: &str,
    headers: &[(impl AsRef<str>, impl AsRef<str>)],
) -> Result<String, String> {
    let request = ServiceRequest {
        query: indoc::indoc! {r"
            query {
              _service {
                sdl
              }
            }
        "},
    };

    let mut request_builder = client
        .post(url)
        .header(USER_AGENT, USER_AGENT_VALUE)
        .header(ACCEPT, "application/json")
        .json(&request);

    for (name, value) in headers {
        request_builder = request_builder.header(name.as_ref(), value.as_ref());
    }

    let response = request_builder
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|err| err.to_string())?;

    let response: ServiceResponse = response.json().await.map_err(|err| err.to_string())?;

    response
        .data
        .map(|data| data.service.sdl)
        .ok_or_else(|| "the server does not expose `_service`".to_string())
}
