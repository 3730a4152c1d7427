//! Access-VLAN extraction from `show run | b interface` output

/// One interface's access VLAN, before it is tagged with its switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPort {
    pub interface: String,
    pub vlan_id: String,
}

enum State {
    OutsideBlock,
    InBlock {
        interface: String,
        vlan_id: Option<String>,
    },
}

impl State {
    /// Close the current block, yielding its port if a VLAN was seen.
    fn finish(self) -> Option<AccessPort> {
        match self {
            State::InBlock {
                interface,
                vlan_id: Some(vlan_id),
            } => Some(AccessPort { interface, vlan_id }),
            State::InBlock { interface, .. } => {
                tracing::trace!("{} has no access VLAN", interface);
                None
            }
            State::OutsideBlock => None,
        }
    }
}

/// Extract (interface, access VLAN) pairs from a running configuration.
///
/// Each `interface <name>` line opens a block that runs until the next
/// interface header or the end of the text. The first
/// `switchport access vlan <id>` inside a block wins; blocks without one
/// produce nothing.
pub fn parse_access_vlans(config: &str) -> Vec<AccessPort> {
    let mut ports = Vec::new();
    let mut state = State::OutsideBlock;

    for line in config.lines() {
        let line = line.trim();

        if let Some(interface) = interface_header(line) {
            ports.extend(state.finish());
            state = State::InBlock {
                interface: interface.to_string(),
                vlan_id: None,
            };
            continue;
        }

        if let State::InBlock { vlan_id, .. } = &mut state {
            if vlan_id.is_none() {
                *vlan_id = access_vlan(line).map(String::from);
            }
        }
    }

    ports.extend(state.finish());
    ports
}

fn interface_header(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("interface")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    rest.split_whitespace().next()
}

fn access_vlan(line: &str) -> Option<&str> {
    let mut words = line.split_whitespace();
    if words.next()? != "switchport" || words.next()? != "access" || words.next()? != "vlan" {
        return None;
    }

    let token = words.next()?;
    let end = token
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(token.len());
    let digits = &token[..end];
    (!digits.is_empty()).then_some(digits)
}
