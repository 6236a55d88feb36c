//! Command implementations for the JDN CLI.
//!
//! Provides the dashboard session ([`session::DashboardState`]) and the
//! subcommands built on it: garden statistics, exports, layer overview,
//! snapshot timeline and user preferences.

use clap::Subcommand;
use std::path::PathBuf;

pub mod commands;
pub mod config;
pub mod events;
pub mod layers;
pub mod preferences;
pub mod session;
pub mod timeline;

pub use config::DashboardConfig;
pub use session::{DashboardState, GardenView};

#[derive(Subcommand)]
pub enum Command {
    /// Show harvest statistics for one garden
    Stats {
        /// Garden name, as shown on the map
        garden: String,

        /// Rank the detail top-N and list every year
        #[arg(long)]
        detail: bool,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export one garden's statistics to a file
    Export {
        /// Garden name, as shown on the map
        garden: String,

        /// Directory the export file is written to
        #[arg(short = 'o', long, default_value = "exports")]
        out_dir: PathBuf,

        #[arg(long, value_enum, default_value_t = commands::ExportFormat::Csv)]
        format: commands::ExportFormat,
    },

    /// Load every geographic layer and print garden counts
    Layers {
        #[arg(long)]
        json: bool,
    },

    /// Step through the family-garden snapshots (Ctrl-C to stop)
    Timeline {
        /// Milliseconds between two snapshots
        #[arg(long, default_value_t = 2000)]
        interval_ms: u64,

        /// Stop after this many ticks
        #[arg(long)]
        ticks: Option<usize>,
    },

    /// Show or change user preferences
    Preferences {
        #[arg(long, value_enum)]
        theme: Option<preferences::Theme>,

        #[arg(long, conflicts_with = "theme")]
        toggle_theme: bool,

        #[arg(long)]
        sidebar_open: Option<bool>,

        #[arg(long)]
        tutorial_shown: Option<bool>,
    },
}

pub async fn run(config: DashboardConfig, command: Command) -> anyhow::Result<()> {
    config.validate()?;
    match command {
        Command::Stats {
            garden,
            detail,
            json,
        } => commands::run_stats(config, &garden, detail, json).await,
        Command::Export {
            garden,
            out_dir,
            format,
        } => commands::run_export(config, &garden, &out_dir, format).await,
        Command::Layers { json } => commands::run_layers(config, json).await,
        Command::Timeline { interval_ms, ticks } => {
            commands::run_timeline(config, interval_ms, ticks).await
        }
        Command::Preferences {
            theme,
            toggle_theme,
            sidebar_open,
            tutorial_shown,
        } => commands::run_preferences(
            &config,
            theme,
            toggle_theme,
            sidebar_open,
            tutorial_shown,
        ),
    }
}
