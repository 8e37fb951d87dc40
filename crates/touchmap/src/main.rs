//! touchmap: command-line front end.
//!
//! Lists touchscreens and monitors, shows the current mapping table, and
//! assigns a monitor to a touchscreen.
//!
//! # Usage
//!
//! ```text
//! touchmap [OPTIONS] <COMMAND>
//!
//! Commands:
//!   list    [--json]                     Numbered touchscreens and displays
//!   show    [--json]                     Current touchscreen → display table
//!   assign  <TOUCHSCREEN> <DISPLAY>      Map a touchscreen onto a display
//!
//! Options:
//!   --config <PATH>      Config file [default: platform config dir]
//!   --log-level <LEVEL>  Log level when RUST_LOG is unset [env: TOUCHMAP_LOG]
//! ```
//!
//! `TOUCHSCREEN` and `DISPLAY` are either the 1-based numbers printed by
//! `list` or full device ids.  Writing the mapping needs an elevated prompt.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use touchmap::application::apply_trigger::{ApplyError, ApplyTrigger, ProcessControl};
use touchmap::application::assign_display::{AssignError, MappingEngine};
use touchmap::application::device_catalog::{DeviceCatalog, DeviceDiscovery};
use touchmap::application::mapping_store::{ConfigStore, MappingStore};
use touchmap::application::selection_cache::SelectionCache;
use touchmap::infrastructure::storage::config::{self, AppConfig};
use touchmap_core::{AssignmentOutcome, CatalogSnapshot};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Maps touchscreens onto the monitors they are attached to.
#[derive(Debug, Parser)]
#[command(name = "touchmap", version)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level used when `RUST_LOG` is not set.  Overrides the config file.
    #[arg(long, global = true, env = "TOUCHMAP_LOG")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List touchscreens and displays.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show the current touchscreen-to-display mappings.
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Assign a display to a touchscreen and apply it.
    Assign {
        /// Touchscreen number from `list`, or a device id.
        touchscreen: String,
        /// Display number from `list`, or a device id.
        display: String,
    },
}

// ── Wiring ────────────────────────────────────────────────────────────────────

struct Backends {
    discovery: Arc<dyn DeviceDiscovery>,
    store: Arc<dyn ConfigStore>,
    processes: Arc<dyn ProcessControl>,
}

#[cfg(target_os = "windows")]
fn native_backends() -> anyhow::Result<Backends> {
    use touchmap::infrastructure::config_store::NativeConfigStore;
    use touchmap::infrastructure::device_discovery::NativeDeviceDiscovery;
    use touchmap::infrastructure::process_control::NativeProcessControl;

    Ok(Backends {
        discovery: Arc::new(NativeDeviceDiscovery::new()),
        store: Arc::new(NativeConfigStore::new()),
        processes: Arc::new(NativeProcessControl::new()),
    })
}

#[cfg(not(target_os = "windows"))]
fn native_backends() -> anyhow::Result<Backends> {
    bail!("touch mapping is only supported on Windows")
}

struct App {
    catalog: DeviceCatalog,
    engine: MappingEngine,
}

impl App {
    fn new(cfg: &AppConfig, backends: Backends) -> Self {
        let catalog = DeviceCatalog::new(backends.discovery, cfg.digitizer.selector());
        let engine = MappingEngine::new(
            MappingStore::new(backends.store, &cfg.store.key_path, cfg.store.match_policy),
            ApplyTrigger::new(backends.processes, &cfg.compositor.process_name),
            Arc::new(SelectionCache::new()),
        );
        Self { catalog, engine }
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => config::load_config_from(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => config::load_config().context("loading config"),
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_ref())?;

    let level = cli.log_level.as_deref().unwrap_or(&cfg.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    debug!(?cfg, "configuration loaded");
    let app = App::new(&cfg, native_backends()?);

    match cli.command {
        Command::List { json } => list(&app, json).await,
        Command::Show { json } => show(&app, json),
        Command::Assign {
            touchscreen,
            display,
        } => assign(&app, &touchscreen, &display).await,
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

async fn list(app: &App, json: bool) -> anyhow::Result<()> {
    let snapshot = app.catalog.refresh().await.context("enumerating devices")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("Touchscreens:");
    for (i, d) in snapshot.digitizers.iter().enumerate() {
        println!("  {}. {}\n     {}", i + 1, d.display_label, d.id);
    }
    println!("Displays:");
    for (i, d) in snapshot.displays.iter().enumerate() {
        println!("  {}. {}\n     {}", i + 1, d.display_label, d.id);
    }
    Ok(())
}

fn show(app: &App, json: bool) -> anyhow::Result<()> {
    let table = app
        .engine
        .mapping_table()
        .context("reading the touch mapping store")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }

    if table.is_empty() {
        println!("No touchscreens are registered in the mapping store.");
    }
    for entry in table.entries() {
        println!("{}\n  -> {}", entry.store_key, entry.display_id);
    }
    Ok(())
}

async fn assign(app: &App, touchscreen: &str, display: &str) -> anyhow::Result<()> {
    let snapshot = app.catalog.refresh().await.context("enumerating devices")?;
    let digitizer_id = pick(touchscreen, "touchscreen", &snapshot, |s, sel| {
        s.select_digitizer(sel).map(|d| d.id.clone())
    })?;
    let display_id = pick(display, "display", &snapshot, |s, sel| {
        s.select_display(sel).map(|d| d.id.clone())
    })?;
    info!(digitizer_id = %digitizer_id, display_id = %display_id, "assigning display");

    match app.engine.assign(&digitizer_id, &display_id).await {
        Ok(outcome @ AssignmentOutcome::WrittenAndApplied { .. }) => {
            println!("Touchscreen mapped to {}.", outcome.display_id());
            Ok(())
        }
        Ok(AssignmentOutcome::Written { apply_error, .. }) => {
            println!("{}", partial_apply_message(&apply_error));
            Ok(())
        }
        Err(e) => {
            let hint = user_message(&e);
            Err(anyhow::Error::new(e).context(hint))
        }
    }
}

/// The write stays in the store; the compositor reads it when it next starts.
fn partial_apply_message(err: &ApplyError) -> String {
    format!(
        "Mapping saved but not applied ({err}). \
         It takes effect the next time the compositor restarts."
    )
}

/// Resolves a `list` number or device id against the snapshot.  Ids that are
/// not in the snapshot are passed through unchanged; numbers must exist.
/// Surrounding whitespace is ignored.
fn pick(
    selector: &str,
    kind: &str,
    snapshot: &CatalogSnapshot,
    find: impl Fn(&CatalogSnapshot, &str) -> Option<String>,
) -> anyhow::Result<String> {
    let selector = selector.trim();
    match find(snapshot, selector) {
        Some(id) => Ok(id),
        None if selector.parse::<usize>().is_ok() => {
            bail!("no {kind} #{selector}; run `touchmap list` to see the numbers")
        }
        None => Ok(selector.to_string()),
    }
}

fn user_message(err: &AssignError) -> &'static str {
    match err {
        AssignError::StoreUnavailable { .. } | AssignError::DigitizerNotRegistered { .. } => {
            "touch mapping is not supported for this touchscreen on this machine"
        }
        e if e.needs_elevation() => "run touchmap from an administrator prompt",
        AssignError::Ambiguous { .. } => {
            "the touchscreen id is ambiguous; set store.match_policy = \"first-match\" to accept the first key"
        }
        _ => "the mapping could not be saved",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use touchmap_core::{DeviceRecord, DisplayDevice};

    fn snapshot() -> CatalogSnapshot {
        CatalogSnapshot {
            digitizers: Vec::new(),
            displays: vec![
                DisplayDevice::from_record(&DeviceRecord::new(r"\\.\DISPLAY1", "Monitor"), None, 0),
                DisplayDevice::from_record(&DeviceRecord::new(r"\\.\DISPLAY2", "Monitor"), None, 1),
            ],
        }
    }

    fn pick_display(selector: &str) -> anyhow::Result<String> {
        pick(selector, "display", &snapshot(), |s, sel| {
            s.select_display(sel).map(|d| d.id.clone())
        })
    }

    #[test]
    fn test_pick_padded_number_resolves_position() {
        assert_eq!(pick_display(" 2 ").unwrap(), r"\\.\DISPLAY2");
    }

    #[test]
    fn test_pick_padded_number_out_of_range_is_error() {
        // Arrange / Act
        let err = pick_display(" 3").unwrap_err();

        // Assert
        assert!(err.to_string().contains("no display #3"), "got: {err}");
    }

    #[test]
    fn test_pick_unknown_id_passes_through() {
        assert_eq!(pick_display(r"\\.\DISPLAY9").unwrap(), r"\\.\DISPLAY9");
    }

    #[test]
    fn test_partial_apply_message_points_at_compositor_restart() {
        // Arrange
        let err = ApplyError::CompositorProcessNotFound {
            name: "dwm.exe".to_string(),
        };

        // Act
        let msg = partial_apply_message(&err);

        // Assert
        assert!(msg.contains("dwm.exe"));
        assert!(msg.contains("compositor restarts"));
        assert!(!msg.contains("sign-in"));
    }
}
