use anyhow::Result;
use ipcascraper::{pipeline, Config};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    // ─── 2) fetch → transform → export ───────────────────────────────
    let config = Config::default();
    debug!(table = config.table_id, url = %config.endpoint(), "startup");
    let output = pipeline::run(&config)?;

    debug!("done: {}", output.display());
    Ok(())
}
