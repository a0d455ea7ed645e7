//! Reachability checks against CDN URLs.

mod client;

pub use client::{HttpProbe, Probe, Reachability, build_client};

#[cfg(test)]
pub use client::MockProbe;
