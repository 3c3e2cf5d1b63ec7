// Routes module - the `show route protocol bgp` reply: schema, JSON form and
// the family's capability impls. XML mapping lives in `parser`, CLI text in
// `render`.

pub mod parser;
pub mod render;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::reply::{self, Consumable, Family, Producible};
use crate::wire::xml;
use crate::wire::{self, Presence, RpcError};

pub const ROOT: &str = "route-information";

/// One forwarding choice for a route entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct NextHop {
    /// Set when the device marked this next hop as the one in use
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_next_hop: Option<Presence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Egress interface
    #[serde(skip_serializing_if = "Option::is_none")]
    pub via: Option<String>,
    /// Label-switched path carrying the traffic, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lsp_name: Option<String>,
}

/// Route age, as a seconds count and as the device's human-readable string.
///
/// XML carries the count in a `seconds` attribute and the string as the
/// element text. Devices send the count as text, so it is kept as text.
/// Empty age text is the same as none on every path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Age {
    #[serde(rename = "age-seconds", skip_serializing_if = "Option::is_none")]
    pub seconds: Option<String>,
    #[serde(
        rename = "age",
        deserialize_with = "wire::non_empty",
        skip_serializing_if = "Option::is_none"
    )]
    pub text: Option<String>,
}

/// One candidate path for a destination
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RouteTableEntry {
    /// Printed verbatim: `*`, `-`, `+`, `@`, `#` or empty
    #[serde(alias = "active-date", skip_serializing_if = "Option::is_none")]
    pub active_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_active: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_active: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preference: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<Age>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub med: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_preference: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learned_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_state: Option<String>,
    #[serde(rename = "nh", skip_serializing_if = "Vec::is_empty")]
    pub next_hops: Vec<NextHop>,
}

impl RouteTableEntry {
    /// Selected next hops, in device order
    pub fn selected_next_hops(&self) -> impl Iterator<Item = &NextHop> {
        self.next_hops
            .iter()
            .filter(|nh| nh.selected_next_hop.is_some())
    }
}

/// A destination prefix and its candidate paths
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RouteDestination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rt_destination: Option<String>,
    #[serde(rename = "rt-entry", skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<RouteTableEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RouteTable {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_route_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_route_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holddown_route_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden_route_count: Option<u64>,
    #[serde(rename = "rt", skip_serializing_if = "Vec::is_empty")]
    pub destinations: Vec<RouteDestination>,
}

/// Complete `<route-information>` reply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RouteInformation {
    /// Default namespace of the XML root; never part of the JSON form
    #[serde(skip)]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_table: Option<RouteTable>,
    #[serde(rename = "rpc-error", skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<RpcError>,
    #[serde(rename = "originhost", skip_serializing_if = "Option::is_none")]
    pub origin_host: Option<String>,
    #[serde(rename = "originip", skip_serializing_if = "Option::is_none")]
    pub origin_ip: Option<String>,
}

impl RouteInformation {
    fn destination_count(&self) -> usize {
        self.route_table
            .as_ref()
            .map(|t| t.destinations.len())
            .unwrap_or_default()
    }
}

impl Consumable for RouteInformation {
    fn read_xml(input: &[u8]) -> Result<Self> {
        let root = xml::parse_root(input, ROOT)?;
        let info = RouteInformation::from_element(&root)?;
        tracing::debug!(
            "Parsed {} with {} destination(s)",
            ROOT,
            info.destination_count()
        );
        Ok(info)
    }

    fn read_json(input: &[u8]) -> Result<Self> {
        reply::read_family_json(Family::Route, input)
    }
}

impl Producible for RouteInformation {
    fn write_xml(&self) -> Result<Vec<u8>> {
        let mut w = xml::XmlWriter::new();
        self.write_element(&mut w)?;
        Ok(w.into_bytes())
    }

    fn write_json(&self) -> Result<Vec<u8>> {
        wire::json_bytes(ROOT, self)
    }

    fn write_cli_text(&self) -> Result<String> {
        let text = render::render(self)?;
        tracing::debug!(
            "Rendered {} destination(s) as {} bytes of CLI text",
            self.destination_count(),
            text.len()
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUTE_JSON: &str = r#"{"route-table":{"table-name":"inet.0","destination-count":1,"total-route-count":2,"active-route-count":1,"holddown-route-count":0,"hidden-route-count":0,"rt":[{"rt-destination":"192.0.2.0/24","rt-entry":[{"active-tag":"*","protocol-name":"BGP","preference":170,"age":{"age-seconds":"60","age":"1:00"},"med":0,"local-preference":100,"learned-from":"198.51.100.1","as-path":"64500 I","validation-state":"unverified","nh":[{"selected-next-hop":"","to":"198.51.100.1","via":"ge-0/0/0.0"}]},{"protocol-name":"BGP","nh":[{"to":"198.51.100.2","via":"ge-0/0/1.0"}]}]}]}}"#;

    #[test]
    fn test_read_json() {
        let info = RouteInformation::read_json(ROUTE_JSON.as_bytes()).unwrap();
        let table = info.route_table.as_ref().unwrap();

        assert_eq!(table.table_name.as_deref(), Some("inet.0"));
        assert_eq!(table.holddown_route_count, Some(0));
        assert_eq!(table.destinations.len(), 1);

        let entries = &table.destinations[0].entries;
        assert_eq!(entries[0].active_tag.as_deref(), Some("*"));
        assert_eq!(
            entries[0].age,
            Some(Age {
                seconds: Some("60".to_string()),
                text: Some("1:00".to_string()),
            })
        );
        assert_eq!(entries[0].selected_next_hops().count(), 1);
        assert_eq!(entries[1].active_tag, None);
        assert_eq!(entries[1].selected_next_hops().count(), 0);
        assert_eq!(info.namespace, None);
    }

    #[test]
    fn test_json_byte_stable() {
        let info = RouteInformation::read_json(ROUTE_JSON.as_bytes()).unwrap();
        let json = info.write_json().unwrap();
        assert_eq!(String::from_utf8(json).unwrap(), ROUTE_JSON);
    }

    #[test]
    fn test_active_date_alias_accepted() {
        let json = br#"{"route-table":{"rt":[{"rt-entry":[{"active-date":"*"}]}]}}"#;
        let info = RouteInformation::read_json(json).unwrap();
        let entry = &info.route_table.unwrap().destinations[0].entries[0];

        assert_eq!(entry.active_tag.as_deref(), Some("*"));
    }

    #[test]
    fn test_origin_written_after_table() {
        let mut info = RouteInformation::read_json(ROUTE_JSON.as_bytes()).unwrap();
        info.origin_host = Some("edge1".to_string());

        let text = String::from_utf8(info.write_json().unwrap()).unwrap();
        assert!(text.ends_with(r#"]}]}]},"originhost":"edge1"}"#));

        let xml = String::from_utf8(info.write_xml().unwrap()).unwrap();
        assert!(!xml.contains("edge1"));
    }

    #[test]
    fn test_json_rejects_wrong_shape() {
        let err = RouteInformation::read_json(br#"{"route-table":[]}"#).unwrap_err();
        assert!(err.is_input_error());
    }
}
