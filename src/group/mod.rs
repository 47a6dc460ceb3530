//! Groups
//!
//! A [`Group`] ties a local store, a getter, a peer router and a call
//! coalescer into one lookup path. Groups are created through a
//! [`GroupRegistry`] so the transport can resolve them by name.

#[allow(clippy::module_inception)]
mod group;
mod registry;

pub use group::{Group, GroupSnapshot};
pub use registry::GroupRegistry;
