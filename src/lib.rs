// devreply - conversion of Junos operational replies between XML, JSON and CLI text
//
// Three reply families are supported: `ping`, `traceroute` and
// `show route protocol bgp`. Each family can be read from the device's XML
// reply or from JSON, and written as XML, JSON or the text the device's own
// CLI would print.

pub mod error;
pub mod probe;
pub mod reply;
pub mod routes;
pub mod wire;

pub use error::{ConvertError, Result};
pub use probe::{Ping, Traceroute};
pub use reply::{Consumable, Family, Producible, Reply};
pub use routes::RouteInformation;
pub use wire::{Presence, RpcError};
