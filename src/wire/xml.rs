// XML element tree reader and writer built on quick-xml events
//
// Replies are small, so each document is read into an owned element tree and
// the families map that tree onto their records. Element and attribute names
// are kept by local name, so `junos:seconds` is looked up as `seconds`.

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use std::fmt::Display;
use std::str::FromStr;

use super::Presence;
use crate::error::{ConvertError, Result};

/// One element of a parsed reply
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    /// Local name of the element
    pub name: String,
    /// Attributes in document order; namespace bindings keep their full name
    pub attributes: Vec<(String, String)>,
    /// Child elements in document order
    pub children: Vec<Element>,
    /// Concatenated, unescaped character data directly inside this element
    pub text: String,
    /// Raw markup between the start and end tags, exactly as read
    pub inner: String,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| ConvertError::malformed("xml attribute", e))?;
            let raw_key = attr.key.as_ref();
            let key = if raw_key == b"xmlns" || raw_key.starts_with(b"xmlns:") {
                String::from_utf8_lossy(raw_key).into_owned()
            } else {
                String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned()
            };
            let value = attr
                .unescape_value()
                .map_err(|e| ConvertError::malformed("xml attribute value", e))?;
            attributes.push((key, value.into_owned()));
        }

        Ok(Element {
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            attributes,
            ..Default::default()
        })
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given name, in document order
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.child(name).is_some()
    }

    /// Text of the named child, verbatim; `None` when the child is absent
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).map(|c| c.text.clone())
    }

    /// Presence of an empty marker child such as `<probe-success/>`
    pub fn child_marker(&self, name: &str) -> Option<Presence> {
        self.has_child(name).then_some(Presence)
    }

    /// Numeric content of the named child; surrounding whitespace is ignored
    pub fn child_number<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.child(name) {
            Some(child) => parse_number(name, &child.text).map(Some),
            None => Ok(None),
        }
    }

    pub fn attribute_number<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.attribute(name) {
            Some(value) => parse_number(name, value).map(Some),
            None => Ok(None),
        }
    }
}

fn parse_number<T>(name: &str, text: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    text.trim()
        .parse()
        .map_err(|e| ConvertError::MalformedInput(format!("<{}> value {:?}: {}", name, text, e)))
}

/// Parse a document and check its root element name
pub fn parse_root(input: &[u8], root: &str) -> Result<Element> {
    let element = parse(input)?;
    if element.name != root {
        return Err(ConvertError::MalformedInput(format!(
            "expected root element <{}>, found <{}>",
            root, element.name
        )));
    }
    Ok(element)
}

/// Parse a document into its root element.
///
/// Newlines are stripped before parsing: devices embed them inside text
/// content (AS paths, ages) and no field depends on them.
pub fn parse(input: &[u8]) -> Result<Element> {
    let normalized: Vec<u8> = input.iter().copied().filter(|b| *b != b'\n').collect();
    let source =
        std::str::from_utf8(&normalized).map_err(|e| ConvertError::malformed("xml encoding", e))?;

    let mut reader = Reader::from_str(source);
    let mut open: Vec<(Element, usize)> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let before = reader.buffer_position() as usize;
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                let element = Element::from_start(&start)?;
                open.push((element, reader.buffer_position() as usize));
            }
            Ok(Event::Empty(start)) => {
                let element = Element::from_start(&start)?;
                attach(&mut open, &mut root, element)?;
            }
            Ok(Event::End(_)) => {
                let (mut element, inner_start) = open
                    .pop()
                    .ok_or_else(|| ConvertError::MalformedInput("unbalanced end tag".to_string()))?;
                element.inner = source[inner_start..before].to_string();
                attach(&mut open, &mut root, element)?;
            }
            Ok(Event::Text(text)) => {
                if let Some((element, _)) = open.last_mut() {
                    let text = text
                        .unescape()
                        .map_err(|e| ConvertError::malformed("xml text", e))?;
                    element.text.push_str(&text);
                }
            }
            Ok(Event::CData(data)) => {
                if let Some((element, _)) = open.last_mut() {
                    element.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ConvertError::malformed(
                    &format!("xml at byte {}", reader.error_position()),
                    e,
                ));
            }
        }
    }

    if let Some((element, _)) = open.last() {
        return Err(ConvertError::MalformedInput(format!(
            "unclosed element <{}>",
            element.name
        )));
    }
    root.ok_or_else(|| ConvertError::MalformedInput("document has no root element".to_string()))
}

fn attach(open: &mut [(Element, usize)], root: &mut Option<Element>, element: Element) -> Result<()> {
    match open.last_mut() {
        Some((parent, _)) => parent.children.push(element),
        None if root.is_some() => {
            return Err(ConvertError::MalformedInput(format!(
                "second root element <{}>",
                element.name
            )));
        }
        None => *root = Some(element),
    }
    Ok(())
}

/// Serializer for replies; emits compact XML without a declaration
pub struct XmlWriter {
    writer: Writer<Vec<u8>>,
}

impl XmlWriter {
    pub fn new() -> Self {
        XmlWriter {
            writer: Writer::new(Vec::new()),
        }
    }

    fn emit(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| ConvertError::malformed("xml writer", e))
    }

    pub fn open(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let start = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.emit(Event::Start(start))
    }

    /// Open an element carrying at most one attribute, such as a root `xmlns`
    pub fn open_with(&mut self, name: &str, attribute: Option<(&str, &str)>) -> Result<()> {
        match attribute {
            Some(attribute) => self.open(name, &[attribute]),
            None => self.open(name, &[]),
        }
    }

    pub fn close(&mut self, name: &str) -> Result<()> {
        self.emit(Event::End(BytesEnd::new(name)))
    }

    pub fn text(&mut self, content: &str) -> Result<()> {
        if content.is_empty() {
            return Ok(());
        }
        self.emit(Event::Text(BytesText::new(content)))
    }

    /// Write markup verbatim; the caller vouches for it being well formed
    pub fn raw(&mut self, markup: &str) -> Result<()> {
        if markup.is_empty() {
            return Ok(());
        }
        self.emit(Event::Text(BytesText::from_escaped(markup)))
    }

    /// `<name>value</name>`, or nothing at all when the value is absent
    pub fn leaf<T: Display>(&mut self, name: &str, value: Option<T>) -> Result<()> {
        let Some(value) = value else {
            return Ok(());
        };
        self.open(name, &[])?;
        self.text(&value.to_string())?;
        self.close(name)
    }

    /// `<name/>` when the marker is present
    pub fn marker(&mut self, name: &str, marker: Option<Presence>) -> Result<()> {
        if marker.is_some() {
            self.emit(Event::Empty(BytesStart::new(name)))?;
        }
        Ok(())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}

impl Default for XmlWriter {
    fn default() -> Self {
        XmlWriter::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tree_and_attributes() {
        let xml = br#"<route-information xmlns="http://xml.juniper.net/junos/12.3R6/junos-routing" xmlns:junos="http://xml.juniper.net/junos/*/junos"><age junos:seconds="585128">6d 18:32:08</age><selected-next-hop/></route-information>"#;
        let root = parse(xml).unwrap();

        assert_eq!(root.name, "route-information");
        assert_eq!(
            root.attribute("xmlns"),
            Some("http://xml.juniper.net/junos/12.3R6/junos-routing")
        );
        assert!(root.attribute("xmlns:junos").is_some());

        let age = root.child("age").unwrap();
        assert_eq!(age.attribute("seconds"), Some("585128"));
        assert_eq!(age.text, "6d 18:32:08");
        assert_eq!(root.child_marker("selected-next-hop"), Some(Presence));
        assert_eq!(root.child_marker("current-active"), None);
    }

    #[test]
    fn test_newlines_stripped_but_text_kept() {
        let xml = b"<hop>\n<as-path>15169\n I\n</as-path>\n<last-host-name> 10.226.0.1 </last-host-name>\n</hop>";
        let root = parse(xml).unwrap();

        assert_eq!(root.child_text("as-path").as_deref(), Some("15169 I"));
        assert_eq!(root.child_text("last-host-name").as_deref(), Some(" 10.226.0.1 "));
    }

    #[test]
    fn test_inner_markup_captured_verbatim() {
        let xml = b"<rpc-error><error-severity>error</error-severity><error-message>bad &amp; worse</error-message></rpc-error>";
        let root = parse(xml).unwrap();

        assert_eq!(
            root.inner,
            "<error-severity>error</error-severity><error-message>bad &amp; worse</error-message>"
        );
        assert_eq!(root.child_text("error-message").as_deref(), Some("bad & worse"));
    }

    #[test]
    fn test_child_number() {
        let root = parse(b"<r><rtt> 690 </rtt><ttl>x</ttl></r>").unwrap();
        assert_eq!(root.child_number::<u64>("rtt").unwrap(), Some(690));
        assert_eq!(root.child_number::<u64>("missing").unwrap(), None);
        assert!(root.child_number::<u32>("ttl").is_err());
    }

    #[test]
    fn test_malformed_documents_rejected() {
        assert!(parse(b"<a><b></a>").is_err());
        assert!(parse(b"<a>").is_err());
        assert!(parse(b"").is_err());
        assert!(parse(b"<a/><b/>").is_err());
        assert!(parse_root(b"<a/>", "ping-results").is_err());
    }

    #[test]
    fn test_writer_omits_absent_values() {
        let mut w = XmlWriter::new();
        w.open("probe-result", &[("date-determined", "1447350764")]).unwrap();
        w.leaf("probe-index", Some(1)).unwrap();
        w.marker("probe-success", Some(Presence)).unwrap();
        w.marker("probe-failure", None).unwrap();
        w.leaf::<&str>("ip-address", None).unwrap();
        w.leaf("host-name", Some("a<b")).unwrap();
        w.close("probe-result").unwrap();

        let out = String::from_utf8(w.into_bytes()).unwrap();
        assert_eq!(
            out,
            r#"<probe-result date-determined="1447350764"><probe-index>1</probe-index><probe-success/><host-name>a&lt;b</host-name></probe-result>"#
        );
    }
}
