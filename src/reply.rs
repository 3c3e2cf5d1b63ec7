// Reply contract - the operations every reply family offers, and a wrapper
// for callers that only learn the family from the data

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

use crate::error::{ConvertError, Result};
use crate::probe::ping::Ping;
use crate::probe::traceroute::Traceroute;
use crate::routes::RouteInformation;
use crate::wire::{self, xml};

/// A record that can be written as XML, JSON or device-style CLI text.
///
/// Each `*_to` method renders the whole record into a buffer before touching
/// the sink, so a failed conversion never leaves half a record behind.
pub trait Producible {
    fn write_xml(&self) -> Result<Vec<u8>>;
    fn write_json(&self) -> Result<Vec<u8>>;
    fn write_cli_text(&self) -> Result<String>;

    /// Returns the number of bytes written
    fn write_xml_to(&self, sink: &mut dyn Write) -> Result<u64> {
        let buf = self.write_xml()?;
        sink.write_all(&buf)?;
        Ok(buf.len() as u64)
    }

    /// Returns the number of bytes written
    fn write_json_to(&self, sink: &mut dyn Write) -> Result<u64> {
        let buf = self.write_json()?;
        sink.write_all(&buf)?;
        Ok(buf.len() as u64)
    }

    fn write_cli_to(&self, sink: &mut dyn Write) -> Result<()> {
        let text = self.write_cli_text()?;
        sink.write_all(text.as_bytes())?;
        Ok(())
    }
}

/// A record that can be read from a device's XML reply or its JSON form
pub trait Consumable: Sized {
    fn read_xml(input: &[u8]) -> Result<Self>;
    fn read_json(input: &[u8]) -> Result<Self>;

    fn read_xml_from(source: &mut dyn Read) -> Result<Self> {
        Self::read_xml(&wire::read_all(source)?)
    }

    fn read_json_from(source: &mut dyn Read) -> Result<Self> {
        Self::read_json(&wire::read_all(source)?)
    }
}

/// Read a family's JSON record, refusing objects whose keys name another family.
///
/// Keys only some families carry (`hop`, `route-table`, `probe-result`, ...)
/// decide; an object without any of them is accepted as the requested family.
pub(crate) fn read_family_json<T: DeserializeOwned>(family: Family, input: &[u8]) -> Result<T> {
    let context = family.root_element();
    let value: Value = wire::json_record(context, input)?;
    if let Some(found) = Family::sniff_json(&value).filter(|found| *found != family) {
        return Err(ConvertError::MalformedInput(format!(
            "{}: JSON reply looks like {}, not {}",
            context, found, family
        )));
    }
    serde_json::from_value(value).map_err(|e| ConvertError::malformed(context, e))
}

/// The three reply families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Ping,
    Traceroute,
    Route,
}

impl Family {
    pub fn root_element(self) -> &'static str {
        match self {
            Family::Ping => crate::probe::ping::ROOT,
            Family::Traceroute => crate::probe::traceroute::ROOT,
            Family::Route => crate::routes::ROOT,
        }
    }

    pub fn from_root_element(name: &str) -> Option<Self> {
        [Family::Ping, Family::Traceroute, Family::Route]
            .into_iter()
            .find(|f| f.root_element() == name)
    }

    /// Guess the family of a JSON reply from its top-level keys
    pub fn sniff_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let has = |key: &str| object.contains_key(key);

        if has("route-table") {
            Some(Family::Route)
        } else if has("hop") || has("max-hop-index") || has("traceroute-failure") {
            Some(Family::Traceroute)
        } else if has("probe-result") || has("probe-results-summary") {
            Some(Family::Ping)
        } else {
            None
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Family::Ping => "ping",
            Family::Traceroute => "traceroute",
            Family::Route => "route",
        };
        f.write_str(name)
    }
}

impl FromStr for Family {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ping" => Ok(Family::Ping),
            "traceroute" => Ok(Family::Traceroute),
            "route" | "bgp" => Ok(Family::Route),
            other => Err(ConvertError::MalformedInput(format!(
                "unknown reply family: {}",
                other
            ))),
        }
    }
}

/// A reply of any family
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Ping(Ping),
    Traceroute(Traceroute),
    Route(RouteInformation),
}

impl Reply {
    pub fn family(&self) -> Family {
        match self {
            Reply::Ping(_) => Family::Ping,
            Reply::Traceroute(_) => Family::Traceroute,
            Reply::Route(_) => Family::Route,
        }
    }

    /// Read an XML reply, choosing the family from its root element
    pub fn read_xml(input: &[u8]) -> Result<Self> {
        let root = xml::parse(input)?;
        match Family::from_root_element(&root.name) {
            Some(Family::Ping) => Ok(Reply::Ping(Ping::from_element(&root)?)),
            Some(Family::Traceroute) => Ok(Reply::Traceroute(Traceroute::from_element(&root)?)),
            Some(Family::Route) => Ok(Reply::Route(RouteInformation::from_element(&root)?)),
            None => Err(ConvertError::MalformedInput(format!(
                "unsupported reply root element <{}>",
                root.name
            ))),
        }
    }

    /// Read a JSON reply. Without a family, it is guessed from the top-level keys.
    pub fn read_json(input: &[u8], family: Option<Family>) -> Result<Self> {
        let Some(family) = family else {
            let value: Value = wire::json_record("json reply", input)?;
            let family = Family::sniff_json(&value).ok_or_else(|| {
                ConvertError::MalformedInput(
                    "cannot tell the reply family from its JSON keys".to_string(),
                )
            })?;
            tracing::warn!("JSON reply family not given, guessed {}", family);
            return Reply::from_json_value(family, value);
        };

        match family {
            Family::Ping => Ping::read_json(input).map(Reply::Ping),
            Family::Traceroute => Traceroute::read_json(input).map(Reply::Traceroute),
            Family::Route => RouteInformation::read_json(input).map(Reply::Route),
        }
    }

    fn from_json_value(family: Family, value: Value) -> Result<Self> {
        let context = family.root_element();
        let reply = match family {
            Family::Ping => Reply::Ping(
                serde_json::from_value(value).map_err(|e| ConvertError::malformed(context, e))?,
            ),
            Family::Traceroute => Reply::Traceroute(
                serde_json::from_value(value).map_err(|e| ConvertError::malformed(context, e))?,
            ),
            Family::Route => Reply::Route(
                serde_json::from_value(value).map_err(|e| ConvertError::malformed(context, e))?,
            ),
        };
        Ok(reply)
    }

    pub fn read_xml_as(family: Family, input: &[u8]) -> Result<Self> {
        match family {
            Family::Ping => Ping::read_xml(input).map(Reply::Ping),
            Family::Traceroute => Traceroute::read_xml(input).map(Reply::Traceroute),
            Family::Route => RouteInformation::read_xml(input).map(Reply::Route),
        }
    }

    /// Tag the reply with the managed device it came from. Only JSON output carries these.
    pub fn set_origin(&mut self, host: Option<String>, ip: Option<String>) {
        let (origin_host, origin_ip) = match self {
            Reply::Ping(r) => (&mut r.origin_host, &mut r.origin_ip),
            Reply::Traceroute(r) => (&mut r.origin_host, &mut r.origin_ip),
            Reply::Route(r) => (&mut r.origin_host, &mut r.origin_ip),
        };
        if host.is_some() {
            *origin_host = host;
        }
        if ip.is_some() {
            *origin_ip = ip;
        }
    }

    fn inner(&self) -> &dyn Producible {
        match self {
            Reply::Ping(r) => r,
            Reply::Traceroute(r) => r,
            Reply::Route(r) => r,
        }
    }
}

impl Producible for Reply {
    fn write_xml(&self) -> Result<Vec<u8>> {
        self.inner().write_xml()
    }

    fn write_json(&self) -> Result<Vec<u8>> {
        self.inner().write_json()
    }

    fn write_cli_text(&self) -> Result<String> {
        self.inner().write_cli_text()
    }
}
