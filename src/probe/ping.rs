// Ping results - schema, XML/JSON codec and CLI rendering for `ping` replies

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::error::Result;
use crate::reply::{self, Consumable, Family, Producible};
use crate::wire::xml::{self, Element, XmlWriter};
use crate::wire::{self, Presence, RpcError, format_ms_fixed, rpc_error, shown};

pub const ROOT: &str = "ping-results";

/// One echo request and its reply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ProbeResult {
    /// Unix time the result was recorded; an XML attribute of `<probe-result>`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_determined: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe_success: Option<Presence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe_failure: Option<Presence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_live: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe_reached: Option<String>,
    /// Round-trip time in microseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtt: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ProbeResultsSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probes_sent: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responses_received: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packet_loss: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtt_minimum: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtt_maximum: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtt_average: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtt_stddev: Option<u64>,
}

/// Complete `<ping-results>` reply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Ping {
    /// Default namespace of the XML root; never part of the JSON form
    #[serde(skip)]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packet_size: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub probe_result: Vec<ProbeResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe_results_summary: Option<ProbeResultsSummary>,
    #[serde(rename = "rpc-error", skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<RpcError>,
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
            probe_success: el.child_marker("probe-success"),
            probe_failure: el.child_marker("probe-failure"),
            sequence_number: el.child_number("sequence-number")?,
            ip_address: el.child_text("ip-address"),
            time_to_live: el.child_number("time-to-live")?,
            response_size: el.child_number("response-size")?,
            probe_reached: el.child_text("probe-reached"),
            rtt: el.child_number("rtt")?,
        })
    }

    fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        let date = self.date_determined.map(|d| d.to_string());
        w.open_with("probe-result", date.as_deref().map(|d| ("date-determined", d)))?;
        w.leaf("probe-index", self.probe_index)?;
        w.marker("probe-success", self.probe_success)?;
        w.marker("probe-failure", self.probe_failure)?;
        w.leaf("sequence-number", self.sequence_number)?;
        w.leaf("ip-address", self.ip_address.as_deref())?;
        w.leaf("time-to-live", self.time_to_live)?;
        w.leaf("response-size", self.response_size)?;
        w.leaf("probe-reached", self.probe_reached.as_deref())?;
        w.leaf("rtt", self.rtt)?;
        w.close("probe-result")
    }
}

impl ProbeResultsSummary {
    fn from_element(el: &Element) -> Result<Self> {
        Ok(ProbeResultsSummary {
            probes_sent: el.child_number("probes-sent")?,
            responses_received: el.child_number("responses-received")?,
            packet_loss: el.child_number("packet-loss")?,
            rtt_minimum: el.child_number("rtt-minimum")?,
            rtt_maximum: el.child_number("rtt-maximum")?,
            rtt_average: el.child_number("rtt-average")?,
            rtt_stddev: el.child_number("rtt-stddev")?,
        })
    }

    fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        w.open("probe-results-summary", &[])?;
        w.leaf("probes-sent", self.probes_sent)?;
        w.leaf("responses-received", self.responses_received)?;
        w.leaf("packet-loss", self.packet_loss)?;
        w.leaf("rtt-minimum", self.rtt_minimum)?;
        w.leaf("rtt-maximum", self.rtt_maximum)?;
        w.leaf("rtt-average", self.rtt_average)?;
        w.leaf("rtt-stddev", self.rtt_stddev)?;
        w.close("probe-results-summary")
    }
}

impl Ping {
    pub(crate) fn from_element(root: &Element) -> Result<Self> {
        let probe_result = root
            .children_named("probe-result")
            .map(ProbeResult::from_element)
            .collect::<Result<Vec<_>>>()?;
        let probe_results_summary = root
            .child("probe-results-summary")
            .map(ProbeResultsSummary::from_element)
            .transpose()?;

        Ok(Ping {
            namespace: root.attribute("xmlns").map(str::to_string),
            target_host: root.child_text("target-host"),
            target_ip: root.child_text("target-ip"),
            packet_size: root.child_number("packet-size")?,
            probe_result,
            probe_results_summary,
            errors: rpc_error::collect(root)?,
            origin_host: None,
            origin_ip: None,
        })
    }
}

impl Consumable for Ping {
    fn read_xml(input: &[u8]) -> Result<Self> {
        let root = xml::parse_root(input, ROOT)?;
        let ping = Ping::from_element(&root)?;
        tracing::debug!(
            "Parsed {} for {:?} with {} probe result(s)",
            ROOT,
            ping.target_host,
            ping.probe_result.len()
        );
        Ok(ping)
    }

    fn read_json(input: &[u8]) -> Result<Self> {
        reply::read_family_json(Family::Ping, input)
    }
}

impl Producible for Ping {
    fn write_xml(&self) -> Result<Vec<u8>> {
        let mut w = XmlWriter::new();
        w.open_with(ROOT, self.namespace.as_deref().map(|ns| ("xmlns", ns)))?;
        w.leaf("target-host", self.target_host.as_deref())?;
        w.leaf("target-ip", self.target_ip.as_deref())?;
        w.leaf("packet-size", self.packet_size)?;
        for probe in &self.probe_result {
            probe.write_xml(&mut w)?;
        }
        if let Some(summary) = &self.probe_results_summary {
            summary.write_xml(&mut w)?;
        }
        for err in &self.errors {
            err.write_xml(&mut w)?;
        }
        w.close(ROOT)?;
        Ok(w.into_bytes())
    }

    fn write_json(&self) -> Result<Vec<u8>> {
        wire::json_bytes(ROOT, self)
    }

    /// Renders the way the device prints `ping` on its console:
    ///
    /// ```text
    /// PING 8.8.8.8 (8.8.8.8): 1200 data bytes
    /// 1208 bytes from 8.8.8.8: icmp_seq=0 ttl=62 time=0.690 ms
    /// ```
    fn write_cli_text(&self) -> Result<String> {
        let mut out = String::new();
        writeln!(
            out,
            "PING {} ({}): {} data bytes",
            shown(&self.target_host),
            shown(&self.target_ip),
            shown(&self.packet_size)
        )?;

        for probe in &self.probe_result {
            writeln!(
                out,
                "{} bytes from {}: icmp_seq={} ttl={} time={} ms",
                shown(&probe.response_size),
                shown(&probe.ip_address),
                shown(&probe.sequence_number),
                shown(&probe.time_to_live),
                shown(&probe.rtt.map(format_ms_fixed))
            )?;
        }

        Ok(out)
    }
}
