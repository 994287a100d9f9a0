use clap::ValueEnum;

/// How much of the fetch gets logged.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub(crate) enum LogLevel {
    Off,
    Error,
    Warn,
    /// The written path and failures
    #[default]
    Info,
    /// Also the introspection fallbacks
    Debug,
    /// Everything, HTTP client included
    Trace,
}

impl LogLevel {
    /// An `EnvFilter` directive. Only `trace` lets dependency logs through.
    pub(crate) fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "fetch_typedefs=error,graphql_typedefs=error,off",
            LogLevel::Warn => "fetch_typedefs=warn,graphql_typedefs=warn,off",
            LogLevel::Info => "fetch_typedefs=info,graphql_typedefs=info,off",
            LogLevel::Debug => "fetch_typedefs=debug,graphql_typedefs=debug,off",
            LogLevel::Trace => "trace",
        }
    }
}
