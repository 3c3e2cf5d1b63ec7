// BGP route XML mapping - `<route-information>` element tree to records and back

use super::{Age, NextHop, ROOT, RouteDestination, RouteInformation, RouteTable, RouteTableEntry};
use crate::error::Result;
use crate::wire::rpc_error;
use crate::wire::xml::{Element, XmlWriter};

impl NextHop {
    fn from_element(el: &Element) -> Self {
        NextHop {
            selected_next_hop: el.child_marker("selected-next-hop"),
            to: el.child_text("to"),
            via: el.child_text("via"),
            lsp_name: el.child_text("lsp-name"),
        }
    }

    fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        w.open("nh", &[])?;
        w.marker("selected-next-hop", self.selected_next_hop)?;
        w.leaf("to", self.to.as_deref())?;
        w.leaf("via", self.via.as_deref())?;
        w.leaf("lsp-name", self.lsp_name.as_deref())?;
        w.close("nh")
    }
}

impl Age {
    /// `<age junos:seconds="585128">6d 18:32:08</age>`; the prefix is ignored
    fn from_element(el: &Element) -> Self {
        Age {
            seconds: el.attribute("seconds").map(str::to_string),
            text: (!el.text.is_empty()).then(|| el.text.clone()),
        }
    }

    /// Written as `<age seconds="…">`. The `junos:` prefix is dropped because
    /// its `xmlns:junos` declaration is not kept; this reader accepts both.
    fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        w.open_with("age", self.seconds.as_deref().map(|s| ("seconds", s)))?;
        if let Some(text) = &self.text {
            w.text(text)?;
        }
        w.close("age")
    }
}

impl RouteTableEntry {
    fn from_element(el: &Element) -> Result<Self> {
        Ok(RouteTableEntry {
            active_tag: el.child_text("active-tag"),
            current_active: el.child_text("current-active"),
            last_active: el.child_text("last-active"),
            protocol_name: el.child_text("protocol-name"),
            preference: el.child_number("preference")?,
            age: el.child("age").map(Age::from_element),
            med: el.child_number("med")?,
            local_preference: el.child_number("local-preference")?,
            learned_from: el.child_text("learned-from"),
            as_path: el.child_text("as-path"),
            validation_state: el.child_text("validation-state"),
            next_hops: el.children_named("nh").map(NextHop::from_element).collect(),
        })
    }

    fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        w.open("rt-entry", &[])?;
        w.leaf("active-tag", self.active_tag.as_deref())?;
        w.leaf("current-active", self.current_active.as_deref())?;
        w.leaf("last-active", self.last_active.as_deref())?;
        w.leaf("protocol-name", self.protocol_name.as_deref())?;
        w.leaf("preference", self.preference)?;
        if let Some(age) = &self.age {
            age.write_xml(w)?;
        }
        w.leaf("med", self.med)?;
        w.leaf("local-preference", self.local_preference)?;
        w.leaf("learned-from", self.learned_from.as_deref())?;
        w.leaf("as-path", self.as_path.as_deref())?;
        w.leaf("validation-state", self.validation_state.as_deref())?;
        for nh in &self.next_hops {
            nh.write_xml(w)?;
        }
        w.close("rt-entry")
    }
}

impl RouteDestination {
    fn from_element(el: &Element) -> Result<Self> {
        Ok(RouteDestination {
            rt_destination: el.child_text("rt-destination"),
            entries: el
                .children_named("rt-entry")
                .map(RouteTableEntry::from_element)
                .collect::<Result<Vec<_>>>()?,
        })
    }

    fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        w.open("rt", &[])?;
        w.leaf("rt-destination", self.rt_destination.as_deref())?;
        for entry in &self.entries {
            entry.write_xml(w)?;
        }
        w.close("rt")
    }
}

impl RouteTable {
    fn from_element(el: &Element) -> Result<Self> {
        Ok(RouteTable {
            table_name: el.child_text("table-name"),
            destination_count: el.child_number("destination-count")?,
            total_route_count: el.child_number("total-route-count")?,
            active_route_count: el.child_number("active-route-count")?,
            holddown_route_count: el.child_number("holddown-route-count")?,
            hidden_route_count: el.child_number("hidden-route-count")?,
            destinations: el
                .children_named("rt")
                .map(RouteDestination::from_element)
                .collect::<Result<Vec<_>>>()?,
        })
    }

    fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        w.open("route-table", &[])?;
        w.leaf("table-name", self.table_name.as_deref())?;
        w.leaf("destination-count", self.destination_count)?;
        w.leaf("total-route-count", self.total_route_count)?;
        w.leaf("active-route-count", self.active_route_count)?;
        w.leaf("holddown-route-count", self.holddown_route_count)?;
        w.leaf("hidden-route-count", self.hidden_route_count)?;
        for rt in &self.destinations {
            rt.write_xml(w)?;
        }
        w.close("route-table")
    }
}

impl RouteInformation {
    pub(crate) fn from_element(root: &Element) -> Result<Self> {
        Ok(RouteInformation {
            namespace: root.attribute("xmlns").map(str::to_string),
            route_table: root
                .child("route-table")
                .map(RouteTable::from_element)
                .transpose()?,
            errors: rpc_error::collect(root)?,
            origin_host: None,
            origin_ip: None,
        })
    }

    /// Compact XML without declaration. Only the default namespace survives:
    /// prefixed declarations and attributes such as `xmlns:junos` or
    /// `junos:style` are not part of the record.
    pub(crate) fn write_element(&self, w: &mut XmlWriter) -> Result<()> {
        w.open_with(ROOT, self.namespace.as_deref().map(|ns| ("xmlns", ns)))?;
        if let Some(table) = &self.route_table {
            table.write_xml(w)?;
        }
        for err in &self.errors {
            err.write_xml(w)?;
        }
        w.close(ROOT)
    }
}

#[cfg(test)]
mod tests {
    use crate::reply::{Consumable, Producible};
    use crate::routes::RouteInformation;
    use crate::wire::Presence;

    const ROUTE_XML: &str = r#"<route-information xmlns="http://xml.juniper.net/junos/12.3R6/junos-routing" xmlns:junos="http://xml.juniper.net/junos/*/junos">
<route-table>
<table-name>inet.0</table-name>
<destination-count>565525</destination-count>
<total-route-count>4400004</total-route-count>
<active-route-count>565520</active-route-count>
<holddown-route-count>0</holddown-route-count>
<hidden-route-count>14</hidden-route-count>
<rt junos:style="brief">
<rt-destination>8.8.8.0/24</rt-destination>
<rt-entry>
<active-tag>*</active-tag>
<current-active/>
<last-active/>
<protocol-name>BGP</protocol-name>
<preference>170</preference>
<age junos:seconds="585128">6d 18:32:08</age>
<med>0</med>
<local-preference>130</local-preference>
<learned-from>206.126.239.251</learned-from>
<as-path>15169 I
</as-path>
<validation-state>unverified</validation-state>
<nh>
<selected-next-hop/>
<to>206.126.236.21</to>
<via>ae0.0</via>
</nh>
</rt-entry>
<rt-entry>
<active-tag> </active-tag>
<protocol-name>BGP</protocol-name>
<preference>170</preference>
<age junos:seconds="762247">1w1d 19:44:07</age>
<learned-from>76.73.165.1</learned-from>
<nh>
<to>24.236.73.12</to>
<via>ae5.0</via>
<lsp-name>VAASHBPO1EDGJ01&gt;&gt;OHIOLAHUHEDGJ01-ECMP1</lsp-name>
</nh>
</rt-entry>
</rt>
</route-table>
</route-information>"#;

    fn sample() -> RouteInformation {
        RouteInformation::read_xml(ROUTE_XML.as_bytes()).unwrap()
    }

    #[test]
    fn test_read_xml() {
        let info = sample();
        assert_eq!(
            info.namespace.as_deref(),
            Some("http://xml.juniper.net/junos/12.3R6/junos-routing")
        );

        let table = info.route_table.as_ref().unwrap();
        assert_eq!(table.destination_count, Some(565525));
        assert_eq!(table.holddown_route_count, Some(0));
        assert_eq!(table.hidden_route_count, Some(14));

        let rt = &table.destinations[0];
        assert_eq!(rt.rt_destination.as_deref(), Some("8.8.8.0/24"));
        assert_eq!(rt.entries.len(), 2);

        let first = &rt.entries[0];
        assert_eq!(first.current_active.as_deref(), Some(""));
        assert_eq!(first.as_path.as_deref(), Some("15169 I"));
        let age = first.age.as_ref().unwrap();
        assert_eq!(age.seconds.as_deref(), Some("585128"));
        assert_eq!(age.text.as_deref(), Some("6d 18:32:08"));
        assert_eq!(first.next_hops[0].selected_next_hop, Some(Presence));

        let second = &rt.entries[1];
        assert_eq!(second.active_tag.as_deref(), Some(" "));
        assert_eq!(second.med, None);
        assert_eq!(second.next_hops[0].selected_next_hop, None);
        assert_eq!(
            second.next_hops[0].lsp_name.as_deref(),
            Some("VAASHBPO1EDGJ01>>OHIOLAHUHEDGJ01-ECMP1")
        );
    }

    #[test]
    fn test_xml_round_trip() {
        let info = sample();
        let xml = info.write_xml().unwrap();
        let again = RouteInformation::read_xml(&xml).unwrap();

        assert_eq!(again, info);
        assert_eq!(again.write_xml().unwrap(), xml);
    }

    #[test]
    fn test_write_xml_layout() {
        let xml = String::from_utf8(sample().write_xml().unwrap()).unwrap();

        assert!(xml.starts_with(
            r#"<route-information xmlns="http://xml.juniper.net/junos/12.3R6/junos-routing"><route-table><table-name>inet.0</table-name>"#
        ));
        assert!(xml.contains(r#"<age seconds="585128">6d 18:32:08</age>"#));
        assert!(xml.contains("<nh><selected-next-hop/><to>206.126.236.21</to><via>ae0.0</via></nh>"));
        assert!(xml.contains("<nh><to>24.236.73.12</to>"));
        assert!(xml.ends_with("</route-table></route-information>"));
    }

    #[test]
    fn test_empty_reply() {
        let info = RouteInformation::read_xml(b"<route-information/>").unwrap();
        assert_eq!(info.route_table, None);
        assert_eq!(
            String::from_utf8(info.write_xml().unwrap()).unwrap(),
            "<route-information></route-information>"
        );
    }

    #[test]
    fn test_bad_count_rejected() {
        let xml = b"<route-information><route-table><destination-count>many</destination-count></route-table></route-information>";
        let err = RouteInformation::read_xml(xml).unwrap_err();
        assert!(err.to_string().contains("destination-count"));
    }

    #[test]
    fn test_age_seconds_prefix_dropped_on_write() {
        let xml = br#"<route-information><route-table><rt><rt-entry><age junos:seconds="5">0:05</age></rt-entry><rt-entry><age seconds="7">0:07</age></rt-entry></rt></route-table></route-information>"#;
        let info = RouteInformation::read_xml(xml).unwrap();
        let entries = &info.route_table.as_ref().unwrap().destinations[0].entries;

        assert_eq!(entries[0].age.as_ref().unwrap().seconds.as_deref(), Some("5"));
        assert_eq!(entries[1].age.as_ref().unwrap().seconds.as_deref(), Some("7"));

        let written = String::from_utf8(info.write_xml().unwrap()).unwrap();
        assert!(written.contains(r#"<age seconds="5">0:05</age>"#));
        assert!(!written.contains("junos:"));
    }

    #[test]
    fn test_empty_age_text_round_trip() {
        let json = br#"{"route-table":{"rt":[{"rt-entry":[{"age":{"age-seconds":"5","age":""}}]}]}}"#;
        let info = RouteInformation::read_json(json).unwrap();
        let age = info.route_table.as_ref().unwrap().destinations[0].entries[0]
            .age
            .clone()
            .unwrap();
        assert_eq!(age.text, None);

        let again = RouteInformation::read_xml(&info.write_xml().unwrap()).unwrap();
        assert_eq!(again, info);

        let xml = RouteInformation::read_xml(
            b"<route-information><route-table><rt><rt-entry><age seconds=\"5\"></age></rt-entry></rt></route-table></route-information>",
        )
        .unwrap();
        assert_eq!(xml, info);
    }
}

