//! Weak identity registry from host objects to their object nodes.

use std::collections::HashMap;

use tracing::trace;

use crate::value::{HostRef, WeakHost};

use super::NodeHandle;

/// Maps a live host object, by identity, to the node wrapping it.
///
/// Entries hold only a [`WeakHost`], so the registry never keeps a host
/// object alive. The weak handle also pins the allocation, so an address is
/// never reused while its entry exists.
#[derive(Debug, Default)]
pub(crate) struct IdentityRegistry {
    entries: HashMap<usize, (WeakHost, NodeHandle)>,
}

impl IdentityRegistry {
    /// Node registered for `host`, if its entry is still alive
    pub(crate) fn get(&self, host: &HostRef) -> Option<NodeHandle> {
        self.entries
            .get(&host.addr())
            .filter(|(weak, _)| weak.points_to(host) && !weak.is_released())
            .map(|(_, node)| *node)
    }

    /// Registers `node` for `host`, returning the handle it replaced
    pub(crate) fn insert(&mut self, host: &HostRef, node: NodeHandle) -> Option<NodeHandle> {
        self.entries
            .insert(host.addr(), (host.downgrade(), node))
            .map(|(_, previous)| previous)
    }

    /// Drops the entry of `host`
    pub(crate) fn remove(&mut self, host: &HostRef) -> Option<NodeHandle> {
        self.entries.remove(&host.addr()).map(|(_, node)| node)
    }

    /// Evicts every entry whose host was released, returning their nodes
    pub(crate) fn sweep(&mut self) -> Vec<NodeHandle> {
        let mut released = Vec::new();
        self.entries.retain(|_, (weak, node)| {
            if weak.is_released() {
                released.push(*node);
                false
            } else {
                true
            }
        });
        trace!(count = released.len(), "Swept identity registry");
        released
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
