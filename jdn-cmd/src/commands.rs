//! Subcommand implementations.

use crate::config::DashboardConfig;
use crate::events::DashboardEvent;
use crate::preferences::{Preferences, Theme};
use crate::session::{require_garden_name, DashboardState, GardenView};
use crate::timeline::Timeline;
use chrono::Utc;
use clap::ValueEnum;
use jdn_export::{CsvReportSink, JsonReportSink, ReportSink};
use jdn_utils::format::{format_kg, format_number, format_percentage};
use log::info;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

fn print_view(view: &GardenView, detail: bool) {
    let entry = &view.entry;
    let trend = &view.derived.trend;
    println!("{} ({})", view.name, view.key());
    println!("  total      {}", format_kg(entry.variety_totals.total()));
    println!("  varieties  {}", entry.variety_totals.len());
    println!(
        "  trend      {} ({})",
        trend.direction,
        trend
            .total_growth_percent
            .map(format_percentage)
            .unwrap_or_else(|| "n/a".to_string())
    );
    if let Some(peak) = trend.peak_year {
        println!("  peak year  {} ({})", peak.year, format_kg(peak.value));
    }

    let ranked = if detail { &view.top_detail } else { &view.top_summary };
    println!("  top {}:", ranked.len());
    for variety in ranked {
        let share = view
            .derived
            .percentages
            .get(&variety.variety)
            .unwrap_or(0.0);
        println!(
            "    {:<20} {:>12} {:>8}",
            variety.variety,
            format_kg(variety.value),
            format_percentage(share)
        );
    }

    if detail {
        println!("  per year:");
        for (year, total) in entry.year_totals.iter() {
            println!("    {}  {}", year, format_kg(total));
        }
    }
}

/// Print the statistics of one garden.
pub async fn run_stats(
    config: DashboardConfig,
    garden: &str,
    detail: bool,
    json: bool,
) -> anyhow::Result<()> {
    let garden = require_garden_name(garden)?;
    let state = DashboardState::init(config)?;
    if json {
        let report = state.garden_report(garden, Utc::now()).await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let view = state.select_garden(garden).await?;
        print_view(&view, detail);
    }
    state.shutdown()?;
    Ok(())
}

/// Write the export file of one garden into `out_dir`.
pub async fn run_export(
    config: DashboardConfig,
    garden: &str,
    out_dir: &Path,
    format: ExportFormat,
) -> anyhow::Result<()> {
    let garden = require_garden_name(garden)?;
    let state = DashboardState::init(config)?;
    let sink: Box<dyn ReportSink> = match format {
        ExportFormat::Csv => Box::new(CsvReportSink::new(out_dir)),
        ExportFormat::Json => Box::new(JsonReportSink::new(out_dir)),
    };
    let path = state.export_garden(garden, sink.as_ref(), Utc::now()).await?;
    info!("Export complete. Output: {}", path.display());
    println!("{}", path.display());
    state.shutdown()?;
    Ok(())
}

/// Load every layer and print the overview figures.
pub async fn run_layers(config: DashboardConfig, json: bool) -> anyhow::Result<()> {
    let mut state = DashboardState::init(config)?;
    let overview = state.load_layers().await.overview();
    if json {
        println!("{}", serde_json::to_string_pretty(&overview)?);
    } else {
        println!("private gardens  {}", overview.private_gardens);
        println!("shared gardens   {}", overview.shared_gardens);
        println!("total            {}", overview.total_gardens);
        println!("total area       {} m²", format_number(overview.total_area_m2, 0));
        println!("family gardens   {}", overview.family_gardens);
        for snapshot in &overview.evolution {
            println!("  {}  {}", snapshot.year, snapshot.count);
        }
        for layer in state.layers().iter() {
            println!("layer {:<24} {:>6}  {}", layer.kind.to_string(), layer.len(), layer.kind.colour());
        }
        for (kind, error) in state.layers().failures() {
            println!("unavailable: {} ({})", kind, error);
        }
    }
    state.shutdown()?;
    Ok(())
}

/// Play the snapshot timeline until `ticks` ticks or Ctrl-C.
pub async fn run_timeline(
    config: DashboardConfig,
    interval_ms: u64,
    ticks: Option<usize>,
) -> anyhow::Result<()> {
    let mut state = DashboardState::init(config)?;
    let counts: HashMap<i32, usize> = state
        .load_layers()
        .await
        .overview()
        .evolution
        .into_iter()
        .map(|snapshot| (snapshot.year, snapshot.count))
        .collect();
    state.events_mut().register("cli", move |event: &DashboardEvent| {
        if let DashboardEvent::TimelineTick { year } = event {
            match counts.get(year) {
                Some(count) => println!("{year}: {count} family gardens"),
                None => println!("{year}: no data"),
            }
        }
    });

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    let emitted = Timeline::default()
        .play(Duration::from_millis(interval_ms), ticks, cancel_rx, state.events())
        .await;
    info!("Timeline stopped after {} ticks", emitted);
    state.shutdown()?;
    Ok(())
}

/// Show the preferences, applying any given change first.
pub fn run_preferences(
    config: &DashboardConfig,
    theme: Option<Theme>,
    toggle_theme: bool,
    sidebar_open: Option<bool>,
    tutorial_shown: Option<bool>,
) -> anyhow::Result<()> {
    let path = &config.preferences_path;
    let mut preferences = Preferences::load(path);
    let before = preferences.clone();

    if let Some(theme) = theme {
        preferences.theme = theme;
    }
    if toggle_theme {
        preferences.theme = preferences.theme.toggled();
    }
    if let Some(open) = sidebar_open {
        preferences.sidebar_open = open;
    }
    if let Some(shown) = tutorial_shown {
        preferences.tutorial_shown = shown;
    }
    if preferences != before {
        preferences.save(path)?;
    }

    println!("theme           {}", preferences.theme);
    println!("sidebar open    {}", preferences.sidebar_open);
    println!("tutorial shown  {}", preferences.tutorial_shown);
    match preferences.last_visit {
        Some(visit) => println!("last visit      {}", visit.format("%Y-%m-%d %H:%M")),
        None => println!("last visit      never"),
    }
    Ok(())
}
