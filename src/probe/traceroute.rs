// Traceroute results - schema, XML/JSON codec and CLI rendering for
// `traceroute` replies
//
// A reply lists the hops from the device towards the target. Each hop groups
// the probes sent with one TTL value, and each probe reports who answered and
// how long it took.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::error::Result;
use crate::reply::{self, Consumable, Family, Producible};
use crate::wire::xml::{self, Element, XmlWriter};
use crate::wire::{self, Presence, RpcError, format_ms_trimmed, rpc_error, shown};

pub const ROOT: &str = "traceroute-results";

/// A single probe sent at a hop's TTL
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ProbeResult {
    /// Unix time the result was recorded; an XML attribute of `<probe-result>`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_determined: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe_success: Option<Presence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe_failure: Option<Presence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe_reached: Option<String>,
    /// Round-trip time in microseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtt: Option<u64>,
}

/// Represents a single hop in a traceroute
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Hop {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_value: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_ip_address: Option<String>,
    /// Stored as the device sent it, padding included
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_host_name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub probe_result: Vec<ProbeResult>,
}

impl Hop {
    /// Host name with the device's padding removed, for display
    pub fn trimmed_last_host_name(&self) -> &str {
        self.last_host_name.as_deref().map(str::trim).unwrap_or_default()
    }
}

/// Complete `<traceroute-results>` reply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Traceroute {
    /// Default namespace of the XML root; never part of the JSON form
    #[serde(skip)]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_hop_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packet_size: Option<u32>,
    #[serde(rename = "hop", skip_serializing_if = "Vec::is_empty")]
    pub hops: Vec<Hop>,
    #[serde(rename = "rpc-error", skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<RpcError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceroute_failure: Option<String>,
    /// Set by the caller, not the device; JSON only
    #[serde(rename = "originhost", skip_serializing_if = "Option::is_none")]
    pub origin_host: Option<String>,
    #[serde(rename = "originip", skip_serializing_if = "Option::is_none")]
    pub origin_ip: Option<String>,
}

impl ProbeResult {
    fn from_element(el: &Element) -> Result<Self> {
        Ok(ProbeResult {
            date_determined: el.attribute_number("date-determined")?,
            probe_index: el.child_number("probe-index")?,
            ip_address: el.child_text("ip-address"),
            host_name: el.child_text("host-name"),
            probe_success: el.child_marker("probe-success"),
            probe_failure: el.child_marker("probe-failure"),
            probe_reached: el.child_text("probe-reached"),
            rtt: el.child_number("rtt")?,
        })
    }

    fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        let date = self.date_determined.map(|d| d.to_string());
        w.open_with("probe-result", date.as_deref().map(|d| ("date-determined", d)))?;
        w.leaf("probe-index", self.probe_index)?;
        w.leaf("ip-address", self.ip_address.as_deref())?;
        w.leaf("host-name", self.host_name.as_deref())?;
        w.marker("probe-success", self.probe_success)?;
        w.marker("probe-failure", self.probe_failure)?;
        w.leaf("probe-reached", self.probe_reached.as_deref())?;
        w.leaf("rtt", self.rtt)?;
        w.close("probe-result")
    }
}

impl Hop {
    fn from_element(el: &Element) -> Result<Self> {
        let probe_result = el
            .children_named("probe-result")
            .map(ProbeResult::from_element)
            .collect::<Result<Vec<_>>>()?;

        Ok(Hop {
            ttl_value: el.child_number("ttl-value")?,
            last_ip_address: el.child_text("last-ip-address"),
            last_host_name: el.child_text("last-host-name"),
            probe_result,
        })
    }

    fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        w.open("hop", &[])?;
        w.leaf("ttl-value", self.ttl_value)?;
        w.leaf("last-ip-address", self.last_ip_address.as_deref())?;
        w.leaf("last-host-name", self.last_host_name.as_deref())?;
        for probe in &self.probe_result {
            probe.write_xml(w)?;
        }
        w.close("hop")
    }
}

impl Traceroute {
    pub(crate) fn from_element(root: &Element) -> Result<Self> {
        let hops = root
            .children_named("hop")
            .map(Hop::from_element)
            .collect::<Result<Vec<_>>>()?;

        Ok(Traceroute {
            namespace: root.attribute("xmlns").map(str::to_string),
            target_host: root.child_text("target-host"),
            target_ip: root.child_text("target-ip"),
            max_hop_index: root.child_number("max-hop-index")?,
            packet_size: root.child_number("packet-size")?,
            hops,
            errors: rpc_error::collect(root)?,
            traceroute_failure: root.child_text("traceroute-failure"),
            origin_host: None,
            origin_ip: None,
        })
    }
}

impl Consumable for Traceroute {
    fn read_xml(input: &[u8]) -> Result<Self> {
        let root = xml::parse_root(input, ROOT)?;
        let traceroute = Traceroute::from_element(&root)?;
        tracing::debug!(
            "Parsed {} for {:?} with {} hop(s)",
            ROOT,
            traceroute.target_host,
            traceroute.hops.len()
        );
        Ok(traceroute)
    }

    fn read_json(input: &[u8]) -> Result<Self> {
        reply::read_family_json(Family::Traceroute, input)
    }
}

impl Producible for Traceroute {
    fn write_xml(&self) -> Result<Vec<u8>> {
        let mut w = XmlWriter::new();
        w.open_with(ROOT, self.namespace.as_deref().map(|ns| ("xmlns", ns)))?;
        w.leaf("target-host", self.target_host.as_deref())?;
        w.leaf("target-ip", self.target_ip.as_deref())?;
        w.leaf("max-hop-index", self.max_hop_index)?;
        w.leaf("packet-size", self.packet_size)?;
        for hop in &self.hops {
            hop.write_xml(&mut w)?;
        }
        for err in &self.errors {
            err.write_xml(&mut w)?;
        }
        w.leaf("traceroute-failure", self.traceroute_failure.as_deref())?;
        w.close(ROOT)?;
        Ok(w.into_bytes())
    }

    fn write_json(&self) -> Result<Vec<u8>> {
        wire::json_bytes(ROOT, self)
    }

    fn write_cli_text(&self) -> Result<String> {
        let mut out = String::new();
        writeln!(
            out,
            "traceroute to {} ({}), {} hops max, {} byte packets",
            shown(&self.target_host),
            shown(&self.target_ip),
            shown(&self.max_hop_index),
            shown(&self.packet_size)
        )?;

        for hop in &self.hops {
            write!(
                out,
                " {}  {} ({})  ",
                shown(&hop.ttl_value),
                hop.trimmed_last_host_name(),
                shown(&hop.last_ip_address)
            )?;
            for probe in &hop.probe_result {
                match probe.rtt {
                    Some(rtt) => write!(out, "{} ms  ", format_ms_trimmed(rtt))?,
                    None => out.push_str("*  "),
                }
            }
            out.push('\n');
        }

        Ok(out)
    }
}
