//! MAC / link status resolution for selected access ports

use super::{
    MacOrStatusRecord, PollOutcome, ProgressCallback, ScanOptions, VlanAssignment, mac_table, oui,
    poll_devices, show_interface_status, show_mac_table,
};
use crate::session::{Credentials, DeviceSession, SessionConnector, SessionError, with_session};
use std::sync::Arc;

/// Per-port results of a resolution pass, in the order the ports were given.
#[derive(Debug)]
pub struct ResolveReport {
    pub outcomes: Vec<PollOutcome<MacOrStatusRecord>>,
}

impl ResolveReport {
    /// Successfully resolved ports; may be shorter than the input.
    pub fn records(&self) -> impl Iterator<Item = &MacOrStatusRecord> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &SessionError> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }

    pub fn into_records(self) -> Vec<MacOrStatusRecord> {
        self.outcomes
            .into_iter()
            .filter_map(|o| o.result.ok())
            .collect()
    }
}

/// Resolve the MAC address (or link status) behind each assignment.
///
/// Every assignment gets its own session, even when several share a switch.
/// The caller decides which assignments are worth looking up.
pub async fn resolve_endpoints<C: SessionConnector>(
    connector: &Arc<C>,
    assignments: &[VlanAssignment],
    credentials: &Arc<Credentials>,
    options: &ScanOptions,
    on_progress: Option<ProgressCallback>,
) -> ResolveReport {
    tracing::info!("Resolving endpoints for {} ports", assignments.len());

    let jobs: Vec<(String, (VlanAssignment, Arc<Credentials>))> = assignments
        .iter()
        .map(|a| {
            (
                a.switch_address.clone(),
                (a.clone(), Arc::clone(credentials)),
            )
        })
        .collect();

    let mut outcomes = poll_devices(
        connector,
        jobs,
        options.concurrency,
        on_progress,
        |connector, address, (assignment, credentials): (VlanAssignment, Arc<Credentials>)| {
            resolve_one(connector, address, &credentials, assignment)
        },
    )
    .await;

    for outcome in &outcomes {
        if let Err(e) = &outcome.result {
            tracing::debug!("{}", e);
        }
    }

    if options.vendor_lookup {
        oui::enrich_with_vendor(outcomes.iter_mut().filter_map(|o| o.result.as_mut().ok()));
    }

    ResolveReport { outcomes }
}

fn resolve_one<C: SessionConnector + ?Sized>(
    connector: &C,
    address: &str,
    credentials: &Credentials,
    assignment: VlanAssignment,
) -> Result<MacOrStatusRecord, SessionError> {
    let interface = assignment.interface.as_str();

    let endpoint = with_session(connector, address, credentials, |session| {
        let mac_table = session.run(&show_mac_table(interface))?;
        mac_table::resolve_endpoint(&mac_table, || {
            session.run(&show_interface_status(interface))
        })
    })?;

    tracing::debug!("{} {}: {:?}", address, interface, endpoint);

    Ok(MacOrStatusRecord {
        assignment,
        endpoint,
        vendor: None,
    })
}
