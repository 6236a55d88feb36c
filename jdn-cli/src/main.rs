//! JDN CLI - Command line tool for exploring garden harvest statistics.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "jdn-cli",
    version,
    about = "Garden harvest dashboard toolkit"
)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the harvest sheets and GeoJSON datasets
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: jdn_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = jdn_cmd::DashboardConfig::resolve(cli.config.as_deref(), cli.data_dir)?;
    jdn_cmd::run(config, cli.command).await
}
