//! Switch polling module.
//!
//! Collects access-VLAN assignments from every switch in the inventory and
//! resolves what is attached to selected ports:
//! - running configuration scraping (`show run | b interface`)
//! - MAC address table / line protocol scraping
//! - MAC OUI vendor lookup

mod mac_table;
pub mod oui;
mod resolver;
mod running_config;

pub use mac_table::{PortEndpoint, UNKNOWN_STATUS, find_mac_address, parse_line_protocol};
pub use resolver::{ResolveReport, resolve_endpoints};
pub use running_config::{AccessPort, parse_access_vlans};

use crate::session::{Credentials, DeviceSession, SessionConnector, SessionError, with_session};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Configuration dump from the first interface block onward.
pub const SHOW_RUN_INTERFACES: &str = "show run | b interface";

/// MAC address table restricted to one interface.
pub fn show_mac_table(interface: &str) -> String {
    format!("show mac address-table interface {interface}")
}

/// Single-line interface status filter.
pub fn show_interface_status(interface: &str) -> String {
    format!("sh int {interface} | i {interface}")
}

/// One interface's access VLAN, discovered on one switch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VlanAssignment {
    pub switch_address: String,
    pub interface: String,
    /// Kept as text so user input matches it exactly
    pub vlan_id: String,
}

/// Live endpoint state of one assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MacOrStatusRecord {
    #[serde(flatten)]
    pub assignment: VlanAssignment,
    #[serde(flatten)]
    pub endpoint: PortEndpoint,
    /// Manufacturer of the learned MAC, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
}

/// Result of polling one device (or one port), tagged with its address.
#[derive(Debug)]
pub struct PollOutcome<T> {
    pub address: String,
    pub result: Result<T, SessionError>,
}

/// Polling knobs shared by fleet scans and port resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Maximum number of sessions open at once; 1 polls strictly in sequence
    pub concurrency: usize,
    /// Look up the manufacturer of resolved MAC addresses
    pub vendor_lookup: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            vendor_lookup: true,
        }
    }
}

/// Progress updates during a fleet scan or port resolution
#[derive(Debug, Clone, Serialize)]
pub struct ScanProgress {
    pub completed: usize,
    pub total: usize,
    pub failed: usize,
}

/// Callback type for progress updates
pub type ProgressCallback = Box<dyn Fn(ScanProgress) + Send + Sync>;

/// Immutable snapshot of every access-VLAN assignment found by one fleet scan.
#[derive(Debug, Clone, Serialize)]
pub struct VlanInventory {
    assignments: Vec<VlanAssignment>,
    taken_at: DateTime<Utc>,
}

impl VlanInventory {
    pub fn new(assignments: Vec<VlanAssignment>) -> Self {
        Self {
            assignments,
            taken_at: Utc::now(),
        }
    }

    pub fn assignments(&self) -> &[VlanAssignment] {
        &self.assignments
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// Per-device results of a fleet scan, in inventory order.
#[derive(Debug)]
pub struct FleetScan {
    pub outcomes: Vec<PollOutcome<Vec<VlanAssignment>>>,
}

impl FleetScan {
    pub fn failures(&self) -> impl Iterator<Item = &SessionError> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }

    pub fn reachable_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Concatenate the successful outcomes into a snapshot.
    pub fn into_inventory(self) -> VlanInventory {
        let assignments = self
            .outcomes
            .into_iter()
            .filter_map(|o| o.result.ok())
            .flatten()
            .collect();
        VlanInventory::new(assignments)
    }
}

/// Scan every device for access-VLAN assignments.
///
/// Devices that cannot be reached or fail mid-session contribute no records;
/// their failure is reported in the returned outcome list instead.
pub async fn scan_fleet<C: SessionConnector>(
    connector: &Arc<C>,
    addresses: &[String],
    credentials: &Arc<Credentials>,
    options: &ScanOptions,
    on_progress: Option<ProgressCallback>,
) -> FleetScan {
    tracing::info!(
        "Scanning {} switches ({} at a time)",
        addresses.len(),
        options.concurrency.max(1)
    );

    let jobs: Vec<(String, Arc<Credentials>)> = addresses
        .iter()
        .map(|address| (address.clone(), Arc::clone(credentials)))
        .collect();

    let outcomes = poll_devices(
        connector,
        jobs,
        options.concurrency,
        on_progress,
        |connector, address, credentials: Arc<Credentials>| {
            collect_access_vlans(connector, address, &credentials)
        },
    )
    .await;

    for outcome in &outcomes {
        match &outcome.result {
            Ok(assignments) => tracing::info!(
                "{}: {} access ports",
                outcome.address,
                assignments.len()
            ),
            Err(e) => tracing::debug!("{}", e),
        }
    }

    FleetScan { outcomes }
}

fn collect_access_vlans<C: SessionConnector + ?Sized>(
    connector: &C,
    address: &str,
    credentials: &Credentials,
) -> Result<Vec<VlanAssignment>, SessionError> {
    let config = with_session(connector, address, credentials, |session| {
        session.run(SHOW_RUN_INTERFACES)
    })?;

    let ports = parse_access_vlans(&config);
    if ports.is_empty() {
        tracing::debug!("{}: no access-VLAN interfaces in running config", address);
    }

    Ok(ports
        .into_iter()
        .map(|port| VlanAssignment {
            switch_address: address.to_string(),
            interface: port.interface,
            vlan_id: port.vlan_id,
        })
        .collect())
}

/// Run `work` once per job on blocking workers, at most `concurrency` at a
/// time, and return the outcomes in job order.
async fn poll_devices<C, J, T, F>(
    connector: &Arc<C>,
    jobs: Vec<(String, J)>,
    concurrency: usize,
    on_progress: Option<ProgressCallback>,
    work: F,
) -> Vec<PollOutcome<T>>
where
    C: SessionConnector,
    J: Send + 'static,
    T: Send + 'static,
    F: Fn(&C, &str, J) -> Result<T, SessionError> + Send + Sync + 'static,
{
    let total = jobs.len();
    let work = Arc::new(work);
    let mut outcomes: Vec<PollOutcome<T>> = Vec::with_capacity(total);
    let mut jobs = jobs.into_iter().peekable();

    while jobs.peek().is_some() {
        let batch: Vec<_> = jobs
            .by_ref()
            .take(concurrency.max(1))
            .map(|(address, job)| {
                let connector = Arc::clone(connector);
                let work = Arc::clone(&work);
                let worker_address = address.clone();
                let handle = tokio::task::spawn_blocking(move || {
                    (*work)(&*connector, &worker_address, job)
                });

                async move {
                    let result = match handle.await {
                        Ok(result) => result,
                        Err(e) => Err(SessionError::session(
                            &address,
                            format!("worker task failed: {e}"),
                        )),
                    };
                    PollOutcome { address, result }
                }
            })
            .collect();

        outcomes.extend(futures::future::join_all(batch).await);

        if let Some(ref callback) = on_progress {
            callback(ScanProgress {
                completed: outcomes.len(),
                total,
                failed: outcomes.iter().filter(|o| o.result.is_err()).count(),
            });
        }
    }

    outcomes
}
