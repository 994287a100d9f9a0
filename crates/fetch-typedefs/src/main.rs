#![cfg_attr(test, allow(unused_crate_dependencies))]

use clap::crate_version;
use tokio::runtime;
use tracing_subscriber::EnvFilter;

mod args;

fn main() -> anyhow::Result<()> {
    let args = self::args::parse();

    let filter = EnvFilter::try_new(args.log_level.as_filter_str()).unwrap_or_default();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let crate_version = crate_version!();
    tracing::debug!("fetch-typedefs {crate_version}");

    let runtime = runtime::Builder::new_current_thread().enable_all().build()?;
    let path = runtime.block_on(graphql_typedefs::fetch_and_write_type_defs(&args.options()))?;

    tracing::debug!("done writing {}", path.display());

    Ok(())
}
