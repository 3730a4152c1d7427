//! MAC OUI (Organizationally Unique Identifier) vendor lookup
//!
//! Uses the IEEE OUI database to name the manufacturer of whatever is plugged
//! into a port.

use super::MacOrStatusRecord;

/// Lookup the vendor/manufacturer name for a MAC address.
///
/// Accepts the switch's dotted form (`0011.2233.4455`) as well as colon or dash
/// separated addresses.
pub fn lookup_vendor(mac: &str) -> Option<String> {
    let normalized = normalize_mac(mac)?;

    match oui_data::lookup(&normalized) {
        Some(record) => {
            let vendor_name = record.organization().to_string();
            tracing::debug!(
                "OUI lookup for {}: found {} (registry: {:?})",
                mac,
                vendor_name,
                record.registry()
            );
            Some(vendor_name)
        }
        None => {
            tracing::debug!("OUI lookup for {}: not found in database", mac);
            None
        }
    }
}

/// Normalize a full 48-bit MAC address to `XX:XX:XX:XX:XX:XX`.
pub fn normalize_mac(mac: &str) -> Option<String> {
    let cleaned: String = mac.replace([':', '-', '.'], "").to_uppercase();

    if cleaned.len() != 12 || !cleaned.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let octets: Vec<&str> = (0..12).step_by(2).map(|i| &cleaned[i..i + 2]).collect();
    Some(octets.join(":"))
}

/// Attach vendor names to every record that carries a MAC address.
pub fn enrich_with_vendor<'a>(records: impl IntoIterator<Item = &'a mut MacOrStatusRecord>) {
    let mut lookup_count = 0;
    let mut found_count = 0;

    for record in records {
        if record.vendor.is_some() {
            continue;
        }
        let Some(mac) = record.endpoint.mac_address() else {
            continue;
        };

        lookup_count += 1;
        match lookup_vendor(mac) {
            Some(vendor) => {
                found_count += 1;
                record.vendor = Some(vendor);
            }
            None => tracing::debug!(
                "OUI: {} {} ({}) -> NOT FOUND",
                record.assignment.switch_address,
                record.assignment.interface,
                mac
            ),
        }
    }

    if lookup_count > 0 {
        tracing::info!(
            "OUI enrichment complete: looked up {} MACs, found {} vendors",
            lookup_count,
            found_count
        );
    }
}
