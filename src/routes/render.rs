// BGP route CLI rendering - reproduces `show route protocol bgp` console output

use std::fmt::Write as _;

use super::{RouteInformation, RouteTable, RouteTableEntry};
use crate::error::Result;
use crate::wire::{Presence, shown};

const LEGEND: &str = "@ = Routing Use Only, # = Forwarding Use Only\n\
                      + = Active Route, - = Last Active, * = Both\n\n";

/// Padding between the destination prefix and its first entry
const FIRST_ENTRY_INDENT: &str = "      ";
/// Column where later entries and all next hops start
const ENTRY_INDENT: &str = "                ";
const AS_PATH_INDENT: &str = "                  ";

/// `>` for the next hop in use, a space for the rest
pub fn next_hop_indicator(selected: Option<Presence>) -> char {
    match selected {
        Some(Presence) => '>',
        None => ' ',
    }
}

pub(super) fn render(info: &RouteInformation) -> Result<String> {
    let empty = RouteTable::default();
    let table = info.route_table.as_ref().unwrap_or(&empty);

    let mut out = String::new();
    writeln!(
        out,
        "{}: {} destinations, {} routes ({} active, {} holddown, {} hidden)",
        shown(&table.table_name),
        shown(&table.destination_count),
        shown(&table.total_route_count),
        shown(&table.active_route_count),
        shown(&table.holddown_route_count),
        shown(&table.hidden_route_count)
    )?;
    out.push_str(LEGEND);

    for rt in &table.destinations {
        out.push_str(rt.rt_destination.as_deref().unwrap_or_default());
        for (i, entry) in rt.entries.iter().enumerate() {
            out.push_str(if i == 0 { FIRST_ENTRY_INDENT } else { ENTRY_INDENT });
            render_entry(&mut out, entry)?;
        }
    }

    Ok(out)
}

fn render_entry(out: &mut String, entry: &RouteTableEntry) -> Result<()> {
    let age = entry
        .age
        .as_ref()
        .and_then(|a| a.text.as_deref())
        .unwrap_or_default();

    writeln!(
        out,
        "{}[{}/{}] {}, MED {}, localpref {}, from {}",
        shown(&entry.active_tag),
        shown(&entry.protocol_name),
        shown(&entry.preference),
        age,
        shown(&entry.med),
        shown(&entry.local_preference),
        shown(&entry.learned_from)
    )?;
    writeln!(
        out,
        "{}AS path: {}, validation-state: {}",
        AS_PATH_INDENT,
        shown(&entry.as_path),
        shown(&entry.validation_state)
    )?;

    for nh in &entry.next_hops {
        write!(
            out,
            "{}{} to {} via {}",
            ENTRY_INDENT,
            next_hop_indicator(nh.selected_next_hop),
            shown(&nh.to),
            shown(&nh.via)
        )?;
        match nh.lsp_name.as_deref() {
            Some(lsp) if !lsp.is_empty() => writeln!(out, ", label-switched-path {}", lsp)?,
            _ => out.push('\n'),
        }
    }

    Ok(())
}
