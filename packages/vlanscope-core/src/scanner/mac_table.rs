//! MAC address table and interface status scraping

use serde::{Deserialize, Serialize};

/// Status reported when neither a MAC nor a line-protocol state could be found.
pub const UNKNOWN_STATUS: &str = "unknown";

const LINE_PROTOCOL: &str = "line protocol is";

/// What is on the far end of an access port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortEndpoint {
    /// A MAC address learned on the port, as printed by the switch
    MacAddress(String),
    /// Nothing learned; the interface's line protocol state instead
    InterfaceStatus(String),
}

impl PortEndpoint {
    pub fn mac_address(&self) -> Option<&str> {
        match self {
            PortEndpoint::MacAddress(mac) => Some(mac),
            PortEndpoint::InterfaceStatus(_) => None,
        }
    }

    pub fn interface_status(&self) -> Option<&str> {
        match self {
            PortEndpoint::MacAddress(_) => None,
            PortEndpoint::InterfaceStatus(status) => Some(status),
        }
    }
}

/// Decide the endpoint of a port from its MAC table output.
///
/// `status_output` is only invoked when the MAC table has no address, so the
/// caller can defer the second device command until it is actually needed.
pub fn resolve_endpoint<E>(
    mac_table: &str,
    status_output: impl FnOnce() -> Result<String, E>,
) -> Result<PortEndpoint, E> {
    if let Some(mac) = find_mac_address(mac_table) {
        return Ok(PortEndpoint::MacAddress(mac.to_string()));
    }

    let status_text = status_output()?;
    let status = match parse_line_protocol(&status_text) {
        Some(status) => status.to_string(),
        None => {
            tracing::warn!(
                "Neither a MAC address nor a line protocol state found; reporting '{}'",
                UNKNOWN_STATUS
            );
            UNKNOWN_STATUS.to_string()
        }
    };

    Ok(PortEndpoint::InterfaceStatus(status))
}

/// Find the leftmost MAC-shaped token: `hhhh.hhhh.hhhh` or `hh:hh:hh:hh:hh:hh`.
pub fn find_mac_address(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();

    (0..bytes.len()).find_map(|start| {
        let rest = &bytes[start..];
        [(4usize, b'.'), (2usize, b':')]
            .into_iter()
            .find_map(|(group, sep)| {
                let len = if sep == b'.' { 14 } else { 17 };
                let candidate = rest.get(..len)?;
                is_grouped_hex(candidate, group, sep).then(|| &text[start..start + len])
            })
    })
}

/// Check that `candidate` is hex groups of `group` digits joined by `sep`.
fn is_grouped_hex(candidate: &[u8], group: usize, sep: u8) -> bool {
    candidate.iter().enumerate().all(|(i, &b)| {
        if i % (group + 1) == group {
            b == sep
        } else {
            b.is_ascii_hexdigit()
        }
    })
}

/// Extract the word(s) after `line protocol is`, minus any `(...)` qualifier.
pub fn parse_line_protocol(text: &str) -> Option<&str> {
    text.lines().find_map(|line| {
        let after = &line[line.find(LINE_PROTOCOL)? + LINE_PROTOCOL.len()..];
        let mut status = after.trim();
        if status.ends_with(')') {
            if let Some(open) = status.find('(') {
                status = status[..open].trim_end();
            }
        }
        (!status.is_empty()).then_some(status)
    })
}
