// RPC error records reported by the device inside any reply

use serde::{Deserialize, Serialize};

use super::xml::{self, Element, XmlWriter};
use crate::error::Result;

/// A structured `<rpc-error>` returned by the device's management protocol.
///
/// These are ordinary reply data, not failures of the conversion itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcError {
    #[serde(rename = "error-type", skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(rename = "error-tag", skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(rename = "error-severity", skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(rename = "error-path", skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(rename = "error-message", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Everything between `<rpc-error>` and `</rpc-error>`, verbatim, when it
    /// says more than the fields above. `None` when the element held exactly
    /// the fields, in the order they are written.
    #[serde(rename = "error-info", skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

pub const ELEMENT: &str = "rpc-error";

impl RpcError {
    pub fn from_element(element: &Element) -> Result<Self> {
        let mut err = RpcError {
            error_type: element.child_text("error-type"),
            tag: element.child_text("error-tag"),
            severity: element.child_text("error-severity"),
            path: element.child_text("error-path"),
            message: element.child_text("error-message"),
            info: None,
        };
        if err.fields_markup()? != element.inner {
            err.info = Some(element.inner.clone());
        }
        Ok(err)
    }

    /// Writes the captured markup when there is one, so a parsed error
    /// comes back byte for byte; otherwise writes the structured fields.
    ///
    /// Captured markup that is not well-formed element content, such as plain
    /// text with a bare `<` or a stray `</rpc-error>`, is escaped and written
    /// as text. It then reads back as its escaped form.
    pub fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        w.open(ELEMENT, &[])?;
        match self.info.as_deref() {
            Some(info) if is_element_content(info) => w.raw(info)?,
            Some(info) => {
                tracing::warn!("rpc-error info is not well-formed markup, writing it as text");
                w.text(info)?;
            }
            None => self.write_fields(w)?,
        }
        w.close(ELEMENT)
    }

    fn write_fields(&self, w: &mut XmlWriter) -> Result<()> {
        w.leaf("error-type", self.error_type.as_deref())?;
        w.leaf("error-tag", self.tag.as_deref())?;
        w.leaf("error-severity", self.severity.as_deref())?;
        w.leaf("error-path", self.path.as_deref())?;
        w.leaf("error-message", self.message.as_deref())
    }

    fn fields_markup(&self) -> Result<String> {
        let mut w = XmlWriter::new();
        self.write_fields(&mut w)?;
        Ok(String::from_utf8_lossy(&w.into_bytes()).into_owned())
    }
}

/// True when `markup` parses as the content of a single `<rpc-error>`
fn is_element_content(markup: &str) -> bool {
    let wrapped = format!("<{0}>{1}</{0}>", ELEMENT, markup);
    xml::parse(wrapped.as_bytes()).is_ok_and(|root| root.name == ELEMENT)
}

pub(crate) fn collect(parent: &Element) -> Result<Vec<RpcError>> {
    parent
        .children_named(ELEMENT)
        .map(RpcError::from_element)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLY: &[u8] = b"<ping-results><rpc-error>\n<error-type>protocol</error-type>\n<error-tag>operation-failed</error-tag>\n<error-severity>error</error-severity>\n<error-message>\nno route to host\n</error-message>\n<error-info><bad-element>ping</bad-element></error-info>\n</rpc-error></ping-results>";

    #[test]
    fn test_rpc_error_from_xml() {
        let root = xml::parse(REPLY).unwrap();
        let errors = collect(&root).unwrap();

        assert_eq!(errors.len(), 1);
        let err = &errors[0];
        assert_eq!(err.error_type.as_deref(), Some("protocol"));
        assert_eq!(err.tag.as_deref(), Some("operation-failed"));
        assert_eq!(err.severity.as_deref(), Some("error"));
        assert_eq!(err.path, None);
        assert_eq!(err.message.as_deref(), Some("no route to host"));
        assert!(err.info.as_deref().unwrap().contains("<bad-element>ping</bad-element>"));
    }

    #[test]
    fn test_rpc_error_xml_round_trip() {
        let root = xml::parse(REPLY).unwrap();
        let parsed = collect(&root).unwrap().remove(0);

        let mut w = XmlWriter::new();
        parsed.write_xml(&mut w).unwrap();
        let again = RpcError::from_element(&xml::parse(&w.into_bytes()).unwrap()).unwrap();

        assert_eq!(again, parsed);
    }

    #[test]
    fn test_rpc_error_without_info_writes_fields() {
        let err = RpcError {
            severity: Some("warning".to_string()),
            message: Some("statistics unavailable".to_string()),
            ..Default::default()
        };
        let mut w = XmlWriter::new();
        err.write_xml(&mut w).unwrap();

        assert_eq!(
            String::from_utf8(w.into_bytes()).unwrap(),
            "<rpc-error><error-severity>warning</error-severity><error-message>statistics unavailable</error-message></rpc-error>"
        );
    }

    #[test]
    fn test_rpc_error_json_keys() {
        let err = RpcError {
            tag: Some("operation-failed".to_string()),
            info: Some("<x/>".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, r#"{"error-tag":"operation-failed","error-info":"<x/>"}"#);
        assert_eq!(serde_json::from_str::<RpcError>(&json).unwrap(), err);
    }

    fn round_trip(err: &RpcError) -> (String, RpcError) {
        let mut w = XmlWriter::new();
        err.write_xml(&mut w).unwrap();
        let bytes = w.into_bytes();
        let again = RpcError::from_element(&xml::parse(&bytes).unwrap()).unwrap();
        (String::from_utf8(bytes).unwrap(), again)
    }

    #[test]
    fn test_rpc_error_fields_only_round_trip() {
        let err: RpcError =
            serde_json::from_str(r#"{"error-severity":"error","error-message":"no route"}"#).unwrap();
        let (_, again) = round_trip(&err);

        assert_eq!(again.info, None);
        assert_eq!(again, err);
    }

    #[test]
    fn test_rpc_error_extra_markup_kept_as_info() {
        let root = xml::parse(b"<rpc-error><error-message>x</error-message><error-info><name>y</name></error-info></rpc-error>").unwrap();
        let err = RpcError::from_element(&root).unwrap();

        assert_eq!(err.message.as_deref(), Some("x"));
        assert_eq!(
            err.info.as_deref(),
            Some("<error-message>x</error-message><error-info><name>y</name></error-info>")
        );
        assert_eq!(round_trip(&err).1, err);
    }

    #[test]
    fn test_rpc_error_plain_text_info_escaped() {
        let err = RpcError {
            info: Some("a < b & c".to_string()),
            ..Default::default()
        };
        let (written, again) = round_trip(&err);

        assert_eq!(written, "<rpc-error>a &lt; b &amp; c</rpc-error>");
        assert_eq!(again.info.as_deref(), Some("a &lt; b &amp; c"));
        assert_eq!(round_trip(&again).1, again);
    }

    #[test]
    fn test_rpc_error_info_cannot_close_element() {
        let err = RpcError {
            info: Some("</rpc-error><target-host>evil</target-host><rpc-error>".to_string()),
            ..Default::default()
        };
        let (written, _) = round_trip(&err);

        assert!(written.starts_with("<rpc-error>&lt;/rpc-error&gt;&lt;target-host&gt;"));
        assert_eq!(xml::parse(written.as_bytes()).unwrap().children.len(), 0);
    }
}
