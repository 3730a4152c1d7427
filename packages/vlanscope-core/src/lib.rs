//! vlanscope Core Library
//!
//! This crate answers "which switch ports carry VLAN X, and what is plugged
//! into them?" across a fleet of IOS-style switches:
//! - Fleet scanning (running-config scraping over SSH, one session per switch)
//! - Endpoint resolution (MAC address table, falling back to line protocol state)
//! - Snapshot queries (exact VLAN id, `all`, or a per-VLAN census on a miss)
//! - Inventory and configuration loading
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use vlanscope_core::{config, query, scanner, session};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let switches = config::load_device_list(Path::new("input.txt"))?;
//!     let credentials = Arc::new(config::load_credentials(Path::new("credentials.txt"))?);
//!     let connector = Arc::new(session::SshConnector::default());
//!     let options = scanner::ScanOptions::default();
//!
//!     // Build the snapshot once
//!     let scan = scanner::scan_fleet(&connector, &switches, &credentials, &options, None).await;
//!     let inventory = scan.into_inventory();
//!
//!     // Filter it as often as needed
//!     let filter = query::VlanFilter::parse("10");
//!     if let Some(ports) = query::query(&inventory, &filter).assignments() {
//!         let ports: Vec<_> = ports.into_iter().cloned().collect();
//!         let report =
//!             scanner::resolve_endpoints(&connector, &ports, &credentials, &options, None).await;
//!         println!("Resolved {} ports", report.records().count());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod query;
pub mod scanner;
pub mod session;

// Re-export commonly used types
pub use config::{InventoryError, Settings};
pub use query::{QueryResult, VlanCount, VlanFilter};
pub use scanner::{
    FleetScan, MacOrStatusRecord, PortEndpoint, ResolveReport, ScanOptions, ScanProgress,
    VlanAssignment, VlanInventory,
};
pub use session::{Credentials, FaultKind, SessionConnector, SessionError, SshConnector};
