// Probe module - replies to the `ping` and `traceroute` operational commands

pub mod ping;
pub mod traceroute;

pub use ping::{Ping, ProbeResultsSummary};
pub use traceroute::{Hop, Traceroute};
