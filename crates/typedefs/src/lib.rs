//! Fetches the schema of a running GraphQL server and writes it as a module exporting its type
//! definitions, ready to be handed to a mocked provider:
//!
//! ```text
//! export const typeDefs = `
//! type Query { ... }
//! `
//! ```

mod standard;
mod subgraph;

use std::path::PathBuf;

pub const DEFAULT_URI: &str = "http://localhost:4000/graphql";

const USER_AGENT_VALUE: &str = "graphql-typedefs";

#[derive(Debug, thiserror::Error)]
pub enum TypeDefsError {
    #[error("introspection of {uri} failed: {message}")]
    Introspection { uri: String, message: String },
    #[error("could not determine the current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
    #[error("could not write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct FetchTypeDefsOptions {
    pub uri: String,
    /// Writes `typeDefs.ts` when set, `typeDefs.js` otherwise. Only matters without an output path.
    pub typed_output: bool,
    /// Defaults to `typeDefs.ts` or `typeDefs.js` in the current directory.
    pub output_path: Option<PathBuf>,
    /// Extra headers sent with the introspection requests.
    pub headers: Vec<(String, String)>,
}

impl Default for FetchTypeDefsOptions {
    fn default() -> Self {
        FetchTypeDefsOptions {
            uri: DEFAULT_URI.to_string(),
            typed_output: true,
            output_path: None,
            headers: Vec::new(),
        }
    }
}

impl FetchTypeDefsOptions {
    pub fn output_path(&self) -> Result<PathBuf, TypeDefsError> {
        if let Some(path) = &self.output_path {
            return Ok(path.clone());
        }

        let file_name = if self.typed_output { "typeDefs.ts" } else { "typeDefs.js" };
        let current_dir = std::env::current_dir().map_err(TypeDefsError::CurrentDir)?;

        Ok(current_dir.join(file_name))
    }
}

/// Introspects the server at `url` and returns its schema as SDL.
///
/// The federation `_service { sdl }` query is tried first since it keeps directives, then the
/// standard introspection query.
pub async fn introspect(url: &str, headers: &[(impl AsRef<str>, impl AsRef<str>)]) -> Result<String, TypeDefsError> {
    let client = reqwest::Client::new();

    match subgraph::introspect(&client, url, headers).await {
        Ok(sdl) => return Ok(prettify(sdl)),
        Err(message) => tracing::debug!("`_service` introspection of {url} failed, falling back: {message}"),
    }

    standard::introspect(&client, url, headers)
        .await
        .map(prettify)
        .map_err(|message| TypeDefsError::Introspection {
            uri: url.to_string(),
            message,
        })
}

fn prettify(graphql: String) -> String {
    match cynic_parser::parse_type_system_document(&graphql) {
        Ok(parsed) => parsed.to_sdl_pretty(),
        // Still worth writing out, it can be fixed by hand.
        Err(_) => graphql,
    }
}

/// The source of a module exporting `sdl` as a template literal.
pub fn render_type_defs_module(sdl: &str) -> String {
    let escaped = sdl.replace('\\', "\\\\").replace('`', "\\`").replace("${", "\\${");
    format!("export const typeDefs = `\n{escaped}`")
}

/// Fetches the schema and writes the type definitions module. Returns the path written to.
///
/// Nothing is written when the introspection fails.
pub async fn fetch_and_write_type_defs(options: &FetchTypeDefsOptions) -> Result<PathBuf, TypeDefsError> {
    let path = options.output_path()?;
    tracing::info!("writing typeDefs to: {}", path.display());

    let sdl = introspect(&options.uri, options.headers.as_slice()).await?;

    tokio::fs::write(&path, render_type_defs_module(&sdl))
        .await
        .map_err(|source| TypeDefsError::Write {
            path: path.clone(),
            source,
        })?;

    Ok(path)
}
