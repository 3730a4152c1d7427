//! vlanscope CLI - port-level VLAN inventory for a fleet of switches
//!
//! This binary:
//! - Logs into every switch in the device list and collects access-VLAN ports
//! - Lets the operator filter that snapshot by VLAN id, interactively or once
//! - Resolves the MAC address (or link state) behind the selected ports

mod interactive;
mod print;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use vlanscope_core::config::{self, Overrides, Settings};
use vlanscope_core::query::{self, QueryResult, VlanFilter};
use vlanscope_core::scanner::{self, ProgressCallback, ScanOptions, ScanProgress, VlanInventory};
use vlanscope_core::session::{Credentials, SshConnector};

#[derive(Parser)]
#[command(name = "vlanscope")]
#[command(version)]
#[command(about = "Find which switch ports carry a VLAN and what is attached to them")]
#[command(long_about = "
vlanscope logs into every switch listed in the device file, reads the
access VLAN of each interface from the running configuration, and lets
you filter the result by VLAN id. For the ports you pick it can look up
the learned MAC address, or the line protocol state when nothing is learned.

Quick start:
  1. List switches, one per line:         input.txt
  2. Username and password on two lines:  credentials.txt
  3. Run:                                 vlanscope
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Device list file (one address per line)
    #[arg(short, long, global = true)]
    pub devices: Option<PathBuf>,

    /// Credentials file (username, then password)
    #[arg(short, long, global = true)]
    pub credentials: Option<PathBuf>,

    /// Number of switches polled at once
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    /// Skip MAC vendor lookup
    #[arg(long, global = true)]
    pub no_vendor: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan the fleet, then filter it interactively (default)
    Query,

    /// Scan the fleet and print one filtered view
    Scan {
        /// VLAN id to show, or "all"
        #[arg(long, default_value = "all")]
        vlan: String,

        /// Look up MAC address or link state for the shown ports
        #[arg(short, long)]
        resolve: bool,
    },

    /// Show configuration paths and settings
    Config,
}

/// Everything a command needs once the fleet has been scanned.
pub struct App {
    pub connector: Arc<SshConnector>,
    pub credentials: Arc<Credentials>,
    pub options: ScanOptions,
    pub format: OutputFormat,
    pub inventory: VlanInventory,
}

impl App {
    /// Resolve endpoints for `ports` and print them.
    pub async fn resolve_and_print(&self, ports: &[&scanner::VlanAssignment]) {
        let ports: Vec<scanner::VlanAssignment> = ports.iter().map(|p| (*p).clone()).collect();
        let report = scanner::resolve_endpoints(
            &self.connector,
            &ports,
            &self.credentials,
            &self.options,
            progress_callback(self.format, "ports"),
        )
        .await;

        print::failures(report.failures());
        print::records(self.format, &report.into_records());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is kept for results
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("vlanscope={},vlanscope_core={}", log_level, log_level).into()
            }),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let settings = config::load_settings(&Overrides {
        devices_file: cli.devices.clone(),
        credentials_file: cli.credentials.clone(),
        concurrency: cli.concurrency,
        no_vendor: cli.no_vendor,
    });

    match cli.command {
        Some(Commands::Config) => cmd_config(&cli, &settings),
        Some(Commands::Scan { ref vlan, resolve }) => {
            let app = build_app(&cli, &settings).await?;
            cmd_scan(&app, vlan, resolve).await;
            Ok(())
        }
        Some(Commands::Query) | None => {
            let app = build_app(&cli, &settings).await?;
            interactive::run(&app).await
        }
    }
}

/// Load inventory files and scan the fleet. Only file problems abort here.
async fn build_app(cli: &Cli, settings: &Settings) -> Result<App> {
    let devices_path = &settings.devices_file.value;
    let credentials_path = &settings.credentials_file.value;

    let switches = config::load_device_list(devices_path)
        .with_context(|| format!("Failed to load device list ({})", settings.devices_file.source))?;
    let credentials = config::load_credentials(credentials_path).with_context(|| {
        format!("Failed to load credentials ({})", settings.credentials_file.source)
    })?;

    let connector = Arc::new(SshConnector::new(settings.ssh.clone()));
    let credentials = Arc::new(credentials);
    let options = settings.scan_options();

    if cli.format == OutputFormat::Text {
        eprintln!("Scanning {} switches...", switches.len());
    }

    let scan = scanner::scan_fleet(
        &connector,
        &switches,
        &credentials,
        &options,
        progress_callback(cli.format, "switches"),
    )
    .await;

    print::failures(scan.failures());
    let reachable = scan.reachable_count();
    let inventory = scan.into_inventory();

    if cli.format == OutputFormat::Text {
        eprintln!(
            "Found {} access ports on {}/{} switches (snapshot {})",
            inventory.len(),
            reachable,
            switches.len(),
            inventory
                .taken_at()
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
        );
    }

    Ok(App {
        connector,
        credentials,
        options,
        format: cli.format,
        inventory,
    })
}

fn progress_callback(format: OutputFormat, unit: &'static str) -> Option<ProgressCallback> {
    match format {
        OutputFormat::Text => Some(Box::new(move |progress: ScanProgress| {
            eprintln!(
                "  [{:>3}/{}] {} polled ({} failed)",
                progress.completed, progress.total, unit, progress.failed
            );
        })),
        OutputFormat::Json => None,
    }
}

async fn cmd_scan(app: &App, vlan: &str, resolve: bool) {
    let filter = VlanFilter::parse(vlan);

    match query::query(&app.inventory, &filter) {
        QueryResult::NoMatch(counts) => print::vlan_counts(app.format, &filter, &counts),
        result => {
            let ports = result.assignments().unwrap_or_default();
            if resolve {
                app.resolve_and_print(&ports).await;
            } else {
                print::assignments(app.format, &ports);
            }
        }
    }
}

fn cmd_config(cli: &Cli, settings: &Settings) -> Result<()> {
    let config_path = config::get_config_file_path_string();

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration");
            println!("=============");
            println!();
            println!("Config file:      {}", config_path);
            println!(
                "Device list:      {} (from {})",
                settings.devices_file.value.display(),
                settings.devices_file.source
            );
            println!(
                "Credentials:      {} (from {})",
                settings.credentials_file.value.display(),
                settings.credentials_file.source
            );
            println!(
                "Concurrency:      {} (from {})",
                settings.concurrency.value, settings.concurrency.source
            );
            println!("Vendor lookup:    {}", settings.vendor_lookup);
            println!(
                "SSH:              port {}, connect timeout {}s, session timeout {}s",
                settings.ssh.port, settings.ssh.connect_timeout_secs, settings.ssh.session_timeout_secs
            );
            println!();
            println!("Environment variables:");
            println!("  VLANSCOPE_DEVICES     - Override device list path");
            println!("  VLANSCOPE_CREDENTIALS - Override credentials path");
            println!("  VLANSCOPE_CONCURRENCY - Override concurrency");
            println!();
            println!("Example config.toml:");
            println!();
            println!("{}", config::generate_example_config());
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "config_file": config_path,
                    "devices_file": settings.devices_file.value,
                    "devices_source": settings.devices_file.source.to_string(),
                    "credentials_file": settings.credentials_file.value,
                    "credentials_source": settings.credentials_file.source.to_string(),
                    "concurrency": settings.concurrency.value,
                    "concurrency_source": settings.concurrency.source.to_string(),
                    "vendor_lookup": settings.vendor_lookup,
                    "ssh_port": settings.ssh.port,
                    "connect_timeout_secs": settings.ssh.connect_timeout_secs,
                    "session_timeout_secs": settings.ssh.session_timeout_secs,
                })
            );
        }
    }

    Ok(())
}
