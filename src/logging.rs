use anyhow::Context as _;

/// Progress goes to stderr at `info`; `quiet` lowers the default to `warn`. `RUST_LOG` wins.
pub fn init(quiet: bool) -> anyhow::Result<()> {
    let default_directive = if quiet { "warn" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(default_directive))
        .context("build log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    Ok(())
}
