//! Group Registry
//!
//! Name -> group mapping shared by the transport (to resolve incoming peer
//! requests) and the application. Groups live for the registry's lifetime.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::{info, warn};

use super::group::Group;
use crate::domain::Getter;

static GLOBAL: Lazy<Arc<GroupRegistry>> = Lazy::new(|| Arc::new(GroupRegistry::new()));

/// Registry of named groups; many concurrent readers, exclusive creation
#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: RwLock<HashMap<String, Arc<Group>>>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry, created on first use
    pub fn global() -> Arc<GroupRegistry> {
        Arc::clone(&GLOBAL)
    }

    /// Create a group and register it under `name`. A group already
    /// registered under that name is replaced.
    pub fn new_group(
        &self,
        name: impl Into<String>,
        cache_bytes: i64,
        getter: Arc<dyn Getter>,
    ) -> Arc<Group> {
        let name = name.into();
        let group = Arc::new(Group::new(name.clone(), cache_bytes, getter));

        let mut groups = self.groups.write();
        if groups.insert(name.clone(), Arc::clone(&group)).is_some() {
            warn!(group = %name, "replaced existing group");
        } else {
            info!(group = %name, cache_bytes, "registered group");
        }
        group
    }

    /// The group registered under `name`
    pub fn get_group(&self, name: &str) -> Option<Arc<Group>> {
        self.groups.read().get(name).cloned()
    }

    /// All registered groups, sorted by name
    pub fn groups(&self) -> Vec<Arc<Group>> {
        let mut groups: Vec<_> = self.groups.read().values().cloned().collect();
        groups.sort_by(|a, b| a.name().cmp(b.name()));
        groups
    }

    pub fn len(&self) -> usize {
        self.groups.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.read().is_empty()
    }
}
