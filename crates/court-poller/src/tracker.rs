use slot_types::SlotId;
use std::collections::HashSet;

/// Slot identities seen in the most recently completed cycle.
///
/// Holds exactly one cycle of history: every `observe` replaces the whole set,
/// so a slot that disappears for a cycle and comes back counts as new again.
#[derive(Debug, Default)]
pub struct KnownSlots {
    ids: HashSet<SlotId>,
}

impl KnownSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// `current - known`, sorted for stable logging.
    pub fn delta(&self, current: &HashSet<SlotId>) -> Vec<SlotId> {
        let mut new: Vec<SlotId> = current.difference(&self.ids).cloned().collect();
        new.sort();
        new
    }

    /// Compute the delta, then overwrite the known set with `current`.
    pub fn observe(&mut self, current: HashSet<SlotId>) -> Vec<SlotId> {
        let new = self.delta(&current);
        self.ids = current;
        new
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

#[cfg(test)]
impl KnownSlots {
    pub(crate) fn contains(&self, id: &SlotId) -> bool {
        self.ids.contains(id)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub(crate) fn ids(&self) -> &HashSet<SlotId> {
        &self.ids
    }
}
