use anyhow::Result;
use clap::Parser;
use visa_hunt::admin_cli::{handle_admin_command, AdminCli};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().without_time().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new("info")))
        .init();

    let cli = AdminCli::parse();
    handle_admin_command(cli).await
}
