use std::path::PathBuf;

use clap::Parser;
use graphql_typedefs::{FetchTypeDefsOptions, DEFAULT_URI};

mod log;

pub(crate) use log::LogLevel;

#[derive(Debug, Parser)]
#[command(name = "fetch-typedefs", version)]
/// Introspects a GraphQL server and writes its schema as a module exporting `typeDefs`
pub struct Args {
    /// The GraphQL endpoint to introspect
    #[arg(env = "FETCH_TYPEDEFS_URI", default_value = DEFAULT_URI)]
    pub uri: String,
    /// Write a JavaScript module instead of a TypeScript one
    #[arg(long, env = "FETCH_TYPEDEFS_JS")]
    pub js: bool,
    /// Path of the written module. Defaults to typeDefs.ts, or typeDefs.js with --js, in the current directory.
    #[arg(long, short, env = "FETCH_TYPEDEFS_OUTPUT")]
    pub output: Option<PathBuf>,
    /// A header to send with the introspection requests, as `name: value`. Can be repeated.
    #[arg(long = "header", short = 'H', value_parser = parse_header)]
    pub headers: Vec<(String, String)>,
    /// Set the logging level
    #[arg(long = "log", env = "FETCH_TYPEDEFS_LOG", value_enum, default_value_t)]
    pub log_level: LogLevel,
}

impl Args {
    pub fn options(&self) -> FetchTypeDefsOptions {
        FetchTypeDefsOptions {
            uri: self.uri.clone(),
            typed_output: !self.js,
            output_path: self.output.clone(),
            headers: self.headers.clone(),
        }
    }
}

fn parse_header(header: &str) -> Result<(String, String), String> {
    let Some((name, value)) = header.split_once(':') else {
        return Err(format!("expected `name: value`, got `{header}`"));
    };

    Ok((name.trim().to_string(), value.trim().to_string()))
}

pub(crate) fn parse() -> Args {
    Args::parse()
}
