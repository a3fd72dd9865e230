//! Pressure-plate console entry point.
//!
//! Loads the configuration, opens the data directory and runs one command
//! against the shared [`AppState`] through the `infrastructure::ui_bridge`
//! commands.  Results are printed to stdout as JSON (the position diagram
//! can also be printed as a text grid); logs go to stderr.
//!
//! # Usage
//!
//! ```text
//! plate-console [--config <PATH>] [--data-dir <DIR>] <COMMAND>
//!
//! Commands:
//!   list          Inventory table, filtered and paged
//!   show          One device record
//!   adjust        Switch a plate on or off
//!   screens       Distinct protection-screen names
//!   diagram       Position diagram for one screen
//!   logs          Update-log viewer
//!   hide-logs     Hide log entries by id or by device/date range
//!   restore-logs  Restore hidden log entries
//!   terminology   Show or change the label field order
//!   export        Write the device set as JSON
//!   import        Replace the device set from a JSON file
//!   reset         Restore the seeded data set
//!   init-config   Write the default config file
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable             | Description                        |
//! |----------------------|------------------------------------|
//! | `PLATE_CONFIG`       | Config file path                   |
//! | `PLATE_DATA_DIR`     | Data directory (overrides config)  |
//! | `RUST_LOG`           | Log filter (overrides config)      |

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use plate_console::application::adjust_status::StatusAdjustment;
use plate_console::application::update_logs::{day_range, ChangeType, LogId, LogQuery};
use plate_console::infrastructure::storage::config::{
    config_file_path, load_config, load_config_from, save_config, save_config_to, AppConfig,
};
use plate_console::infrastructure::ui_bridge::{self, AppState, CommandResult};
use plate_core::{
    DeviceFilter, DeviceId, PlateStatus, PlateType, TerminologyConfig, TerminologyKey, Viewport,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Pressure-plate inventory console.
#[derive(Debug, Parser)]
#[command(
    name = "plate-console",
    about = "Inventory, update logs and position diagrams for protection-screen pressure plates",
    version
)]
struct Cli {
    /// Config file path; defaults to the platform config directory.
    #[arg(long, env = "PLATE_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory; overrides `[storage] data_dir` from the config file.
    #[arg(long, env = "PLATE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Inventory table, filtered and paged.
    List {
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        page: PageArgs,
    },
    /// One device record.
    Show { id: DeviceId },
    /// Switch a plate on or off.
    Adjust {
        id: DeviceId,
        /// `on` or `off`.
        status: PlateStatus,
        /// Who made the change; defaults to the configured operator.
        #[arg(long)]
        changer: Option<String>,
        #[arg(long)]
        remarks: Option<String>,
    },
    /// Distinct protection-screen names.
    Screens,
    /// Position diagram for one screen.
    Diagram {
        screen: String,
        /// Window width; defaults to the configured viewport.
        #[arg(long, requires = "height")]
        width: Option<f64>,
        #[arg(long, requires = "width")]
        height: Option<f64>,
        /// Print the resolved diagram as JSON instead of a text grid.
        #[arg(long)]
        json: bool,
    },
    /// Update-log viewer, newest first.
    Logs {
        #[arg(long)]
        device: Option<DeviceId>,
        /// `manual` or `other`.
        #[arg(long)]
        change_type: Option<ChangeType>,
        #[arg(long)]
        status: Option<PlateStatus>,
        /// Substring of the change source.
        #[arg(long)]
        source: Option<String>,
        #[command(flatten)]
        range: DateRangeArgs,
        #[arg(long)]
        include_hidden: bool,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Hide log entries by id, or by device and date range.
    HideLogs(LogSelection),
    /// Restore hidden log entries by id, or by device and date range.
    RestoreLogs(LogSelection),
    /// Show the label field order, or replace it.
    Terminology {
        /// Comma-separated keys for hard plates, e.g. `bay,plate_name`.
        #[arg(long, value_delimiter = ',')]
        hard: Option<Vec<TerminologyKey>>,
        /// Comma-separated keys for soft plates.
        #[arg(long, value_delimiter = ',')]
        soft: Option<Vec<TerminologyKey>>,
    },
    /// Write the device set as JSON to a file or stdout.
    Export {
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Replace the device set from a JSON file.
    Import { path: PathBuf },
    /// Discard devices and logs and restore the seeded data set.
    Reset,
    /// Write the default config file (does not overwrite).
    InitConfig,
}

#[derive(Debug, Args)]
struct FilterArgs {
    #[arg(long)]
    screen: Option<String>,
    #[arg(long)]
    bay: Option<String>,
    #[arg(long)]
    name: Option<String>,
    /// `hard` or `soft`.
    #[arg(long = "type")]
    plate_type: Option<PlateType>,
    #[arg(long)]
    status: Option<PlateStatus>,
    #[arg(long)]
    changer: Option<String>,
}

impl From<FilterArgs> for DeviceFilter {
    fn from(args: FilterArgs) -> Self {
        DeviceFilter {
            protection_screen: args.screen,
            bay: args.bay,
            plate_name: args.name,
            plate_type: args.plate_type,
            status: args.status,
            last_changed_by: args.changer,
        }
    }
}

#[derive(Debug, Args)]
struct PageArgs {
    #[arg(long, default_value_t = 1)]
    page: usize,
    /// One of 10, 20, 50, 100; defaults to the configured page size.
    #[arg(long)]
    page_size: Option<usize>,
}

#[derive(Debug, Args)]
struct DateRangeArgs {
    /// First day (inclusive), `YYYY-MM-DD`.
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Last day (inclusive), `YYYY-MM-DD`.
    #[arg(long)]
    to: Option<NaiveDate>,
}

impl DateRangeArgs {
    fn bounds(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        (
            self.from.map(|d| day_range(d, d).0),
            self.to.map(|d| day_range(d, d).1),
        )
    }
}

#[derive(Debug, Args)]
struct LogSelection {
    /// Comma-separated log ids.  When given, device and dates are ignored.
    #[arg(long, value_delimiter = ',')]
    ids: Vec<LogId>,
    #[arg(long)]
    device: Option<DeviceId>,
    #[command(flatten)]
    range: DateRangeArgs,
}

// ── Output helpers ────────────────────────────────────────────────────────────

/// Unwraps a command result, turning a failure into an `anyhow` error.
fn unwrap_result<T: Serialize>(result: CommandResult<T>) -> anyhow::Result<T> {
    if result.success {
        result
            .data
            .ok_or_else(|| anyhow!("command succeeded without data"))
    } else {
        Err(anyhow!(result.error.unwrap_or_else(|| "command failed".to_string())))
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn set_logs_hidden(
    state: Arc<AppState>,
    selection: LogSelection,
    hidden: bool,
) -> anyhow::Result<usize> {
    let result = if selection.ids.is_empty() {
        let (from, to) = selection.range.bounds();
        ui_bridge::set_logs_hidden_in_range(state, selection.device, from, to, hidden).await
    } else {
        ui_bridge::set_logs_hidden_by_ids(state, selection.ids, hidden).await
    };
    unwrap_result(result)
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config_file_path()?,
    };
    let mut config = match &cli.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
    .with_context(|| format!("loading config from {}", config_path.display()))?;
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = Some(dir);
    }

    // Structured logging on stderr.  Level is overridden by `RUST_LOG`.
    let level = config.console.log_level.clone();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Command::InitConfig = cli.command {
        if config_path.exists() {
            info!(path = %config_path.display(), "config file already exists");
        } else {
            match &cli.config {
                Some(path) => save_config_to(&AppConfig::default(), path)?,
                None => save_config(&AppConfig::default())?,
            }
            info!(path = %config_path.display(), "default config written");
        }
        return Ok(());
    }

    let state = AppState::open(config).context("opening console data")?;

    match cli.command {
        Command::List { filter, page } => {
            let result =
                ui_bridge::list_devices(state, filter.into(), page.page, page.page_size).await;
            print_json(&unwrap_result(result)?)?;
        }
        Command::Show { id } => {
            print_json(&unwrap_result(ui_bridge::get_device(state, id).await)?)?;
        }
        Command::Adjust {
            id,
            status,
            changer,
            remarks,
        } => {
            let adjustment = StatusAdjustment {
                device_id: id,
                status,
                changer,
                remarks,
            };
            let result = ui_bridge::adjust_plate_status(state, adjustment).await;
            print_json(&unwrap_result(result)?)?;
        }
        Command::Screens => {
            print_json(&unwrap_result(ui_bridge::list_screens(state).await)?)?;
        }
        Command::Diagram {
            screen,
            width,
            height,
            json,
        } => {
            let viewport = width.zip(height).map(|(w, h)| Viewport::new(w, h));
            let diagram =
                unwrap_result(ui_bridge::get_position_diagram(state, screen, viewport).await)?;
            if json {
                print_json(&diagram)?;
            } else {
                print!("{}", diagram.render_text());
            }
        }
        Command::Logs {
            device,
            change_type,
            status,
            source,
            range,
            include_hidden,
            page,
        } => {
            let (from, to) = range.bounds();
            let query = LogQuery {
                device_id: device,
                change_type,
                status,
                source,
                from,
                to,
                include_hidden,
            };
            let result = ui_bridge::get_update_logs(state, query, page.page, page.page_size).await;
            print_json(&unwrap_result(result)?)?;
        }
        Command::HideLogs(selection) => {
            let changed = set_logs_hidden(state, selection, true).await?;
            print_json(&serde_json::json!({ "hidden": changed }))?;
        }
        Command::RestoreLogs(selection) => {
            let changed = set_logs_hidden(state, selection, false).await?;
            print_json(&serde_json::json!({ "restored": changed }))?;
        }
        Command::Terminology { hard, soft } => {
            let current = unwrap_result(ui_bridge::get_terminology(Arc::clone(&state)).await)?;
            let config = if hard.is_none() && soft.is_none() {
                current
            } else {
                let updated = TerminologyConfig {
                    hard: hard.unwrap_or(current.hard),
                    soft: soft.unwrap_or(current.soft),
                };
                unwrap_result(ui_bridge::update_terminology(state, updated).await)?
            };
            print_json(&config)?;
        }
        Command::Export { output } => {
            let json = unwrap_result(ui_bridge::export_devices(state).await)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!(path = %path.display(), "device set exported");
                }
                None => println!("{json}"),
            }
        }
        Command::Import { path } => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let count = unwrap_result(ui_bridge::import_devices(state, json).await)?;
            print_json(&serde_json::json!({ "imported": count }))?;
        }
        Command::Reset => {
            let count = unwrap_result(ui_bridge::reset_data(state).await)?;
            print_json(&serde_json::json!({ "devices": count }))?;
        }
        Command::InitConfig => {}
    }

    Ok(())
}
