//! Command layer: turns parsed arguments into actions and prints results.

pub mod config;
mod link;
mod list;
mod providers;
mod unlink;

pub use config::{Config, ConfigOverrides};
pub use link::{link, link_all};
pub use list::list;
pub use providers::providers;
pub use unlink::unlink;
