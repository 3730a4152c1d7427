//! Result rendering for text and JSON output

use crate::OutputFormat;
use serde::Serialize;
use vlanscope_core::query::{VlanCount, VlanFilter};
use vlanscope_core::scanner::{MacOrStatusRecord, PortEndpoint, VlanAssignment};
use vlanscope_core::session::SessionError;

/// JSON body printed when a VLAN id has no ports.
#[derive(Serialize)]
struct NoMatch<'a> {
    requested_vlan: String,
    vlan_counts: &'a [VlanCount],
}

/// One diagnostic line per device or port that could not be polled.
pub fn failures<'a>(errors: impl Iterator<Item = &'a SessionError>) {
    for e in errors {
        eprintln!("{}", failure_line(e));
    }
}

pub fn failure_line(e: &SessionError) -> String {
    format!("{}: {}: {}", e.address(), e.kind(), e.detail())
}

pub fn match_header(format: OutputFormat, filter: &VlanFilter, count: usize) {
    if format == OutputFormat::Text {
        match filter {
            VlanFilter::All => println!("All VLANs: {} ports", count),
            VlanFilter::Vlan(id) => println!("Filtered results for VLAN ID {}: {} ports", id, count),
        }
    }
}

pub fn assignment_row(a: &VlanAssignment) -> String {
    format!(
        "switch_ip: {}, Interface: {}, VLAN ID: {}",
        a.switch_address, a.interface, a.vlan_id
    )
}

pub fn record_row(r: &MacOrStatusRecord) -> String {
    let base = assignment_row(&r.assignment);
    match (&r.endpoint, &r.vendor) {
        (PortEndpoint::MacAddress(mac), Some(vendor)) => {
            format!("{base}, mac_address: {mac} ({vendor})")
        }
        (PortEndpoint::MacAddress(mac), None) => format!("{base}, mac_address: {mac}"),
        (PortEndpoint::InterfaceStatus(status), _) => format!("{base}, int_status: {status}"),
    }
}

pub fn assignments(format: OutputFormat, rows: &[&VlanAssignment]) {
    match format {
        OutputFormat::Text => {
            for a in rows {
                println!("{}", assignment_row(a));
            }
        }
        OutputFormat::Json => print_json(&rows),
    }
}

pub fn records(format: OutputFormat, rows: &[MacOrStatusRecord]) {
    match format {
        OutputFormat::Text => {
            for r in rows {
                println!("{}", record_row(r));
            }
        }
        OutputFormat::Json => print_json(&rows),
    }
}

pub fn vlan_counts(format: OutputFormat, filter: &VlanFilter, counts: &[VlanCount]) {
    match format {
        OutputFormat::Text => {
            println!(
                "No interfaces found with VLAN ID {}. Showing VLAN counts:",
                filter
            );
            for c in counts {
                println!("VLAN {}: {}", c.vlan_id, c.count);
            }
        }
        OutputFormat::Json => print_json(&NoMatch {
            requested_vlan: filter.to_string(),
            vlan_counts: counts,
        }),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::error!("Failed to serialize output: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment() -> VlanAssignment {
        VlanAssignment {
            switch_address: "10.20.0.5".to_string(),
            interface: "Gi1/0/12".to_string(),
            vlan_id: "120".to_string(),
        }
    }

    #[test]
    fn test_assignment_row() {
        assert_eq!(
            assignment_row(&assignment()),
            "switch_ip: 10.20.0.5, Interface: Gi1/0/12, VLAN ID: 120"
        );
    }

    #[test]
    fn test_failure_line() {
        let e = SessionError::authentication("10.20.0.7", "Authentication failed (username/password)");
        assert_eq!(
            failure_line(&e),
            "10.20.0.7: authentication failure: Authentication failed (username/password)"
        );
        assert_eq!(failure_line(&e).lines().count(), 1);
    }

    #[test]
    fn test_record_rows() {
        let mut record = MacOrStatusRecord {
            assignment: assignment(),
            endpoint: PortEndpoint::MacAddress("0011.2233.4455".to_string()),
            vendor: None,
        };
        assert!(record_row(&record).ends_with(", mac_address: 0011.2233.4455"));

        record.vendor = Some("Cisco Systems, Inc".to_string());
        assert!(record_row(&record).ends_with("0011.2233.4455 (Cisco Systems, Inc)"));

        record.endpoint = PortEndpoint::InterfaceStatus("down".to_string());
        assert!(record_row(&record).ends_with(", int_status: down"));
        assert!(!record_row(&record).contains("mac_address"));
    }
}
