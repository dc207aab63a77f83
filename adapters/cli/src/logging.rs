//! Global logging setup.

use std::{env, io};

use anyhow::{Context, Result};
use tracing::trace;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

/// Default logging environment filter.
///
/// Map writes and CLI progress are info, everything else is warn.
const DEFAULT_FILTER: &str = "warn,stoon_world=info,stoon_cli=info";

/// Installs a `tracing` backend writing to stderr so stdout stays machine readable.
///
/// `RUST_LOG` directives are appended to the defaults, and `verbose` raises our
/// own crates to debug.
pub(crate) fn init_logging(verbose: bool) -> Result<()> {
    let mut filter = DEFAULT_FILTER.to_owned();
    if verbose {
        filter.push_str(",stoon_world=debug,stoon_system_sync=debug,stoon_cli=debug");
    }
    if let Ok(directives) = env::var(EnvFilter::DEFAULT_ENV) {
        filter.push(',');
        filter.push_str(&directives);
    }

    let stderr_log = fmt::layer()
        .compact()
        .with_target(true)
        .with_writer(io::stderr);
    let env_filter =
        EnvFilter::try_new(&filter).with_context(|| format!("invalid log filter `{filter}`"))?;
    let subscriber = Registry::default().with(env_filter).with(stderr_log);
    tracing::subscriber::set_global_default(subscriber)
        .context("unable to install log subscriber")?;
    trace!("installed log subscriber");
    Ok(())
}
