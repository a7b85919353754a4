use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};

/// Which players can currently see which entities.
///
/// Entries are created when an entity is spawned into a world and dropped on
/// full removal, at which point the returned viewers are told to forget it.
#[derive(Debug, Default)]
pub struct EntityTracker {
    entries: RwLock<FxHashMap<i32, FxHashSet<i32>>>,
}

impl EntityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn track(&self, entity_id: i32) -> bool {
        let mut entries = self.entries.write();
        if entries.contains_key(&entity_id) {
            return false;
        }
        entries.insert(entity_id, FxHashSet::default());
        true
    }

    /// Stops tracking the entity, returning the players that could see it.
    pub(crate) fn untrack(&self, entity_id: i32) -> Vec<i32> {
        self.entries.write()
            .remove(&entity_id)
            .map(|viewers| viewers.into_iter().collect())
            .unwrap_or_default()
    }

    pub fn is_tracked(&self, entity_id: i32) -> bool {
        self.entries.read().contains_key(&entity_id)
    }

    pub fn tracked_count(&self) -> usize {
        self.entries.read().len()
    }

    pub(crate) fn add_viewer(&self, entity_id: i32, viewer_id: i32) -> bool {
        match self.entries.write().get_mut(&entity_id) {
            Some(viewers) => viewers.insert(viewer_id),
            None => false,
        }
    }

    pub(crate) fn remove_viewer(&self, entity_id: i32, viewer_id: i32) -> bool {
        match self.entries.write().get_mut(&entity_id) {
            Some(viewers) => viewers.remove(&viewer_id),
            None => false,
        }
    }

    /// Removes a player from every viewer set, as done when the player leaves.
    pub(crate) fn forget_viewer(&self, viewer_id: i32) {
        for viewers in self.entries.write().values_mut() {
            viewers.remove(&viewer_id);
        }
    }

    pub fn viewers(&self, entity_id: i32) -> Vec<i32> {
        self.entries.read()
            .get(&entity_id)
            .map(|viewers| viewers.iter().copied().collect())
            .unwrap_or_default()
    }
}

/// One player's side of the tracker: what the client has been told exists,
/// plus removals that could not be sent from the thread that caused them.
#[derive(Debug, Default)]
pub struct PlayerView {
    visible: Mutex<FxHashSet<i32>>,
    pending_removals: Mutex<Vec<i32>>,
}

impl PlayerView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self, entity_id: i32) -> bool {
        self.visible.lock().contains(&entity_id)
    }

    pub fn visible_ids(&self) -> Vec<i32> {
        self.visible.lock().iter().copied().collect()
    }

    pub fn visible_count(&self) -> usize {
        self.visible.lock().len()
    }

    pub(crate) fn mark_visible(&self, entity_id: i32) -> bool {
        self.visible.lock().insert(entity_id)
    }

    pub(crate) fn mark_hidden(&self, entity_id: i32) -> bool {
        self.visible.lock().remove(&entity_id)
    }

    pub(crate) fn queue_removal(&self, entity_id: i32) {
        self.pending_removals.lock().push(entity_id);
    }

    pub(crate) fn take_pending_removals(&self) -> Vec<i32> {
        std::mem::take(&mut *self.pending_removals.lock())
    }

    pub fn pending_removals(&self) -> Vec<i32> {
        self.pending_removals.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewers_follow_tracking() {
        let tracker = EntityTracker::new();
        assert!(!tracker.add_viewer(5, 1));

        assert!(tracker.track(5));
        assert!(!tracker.track(5));
        assert!(tracker.add_viewer(5, 1));
        assert!(tracker.add_viewer(5, 2));
        assert!(!tracker.add_viewer(5, 2));

        let mut viewers = tracker.untrack(5);
        viewers.sort();
        assert_eq!(viewers, vec![1, 2]);
        assert!(!tracker.is_tracked(5));
        assert!(tracker.untrack(5).is_empty());
    }

    #[test]
    fn forget_viewer_clears_every_entry() {
        let tracker = EntityTracker::new();
        tracker.track(1);
        tracker.track(2);
        tracker.add_viewer(1, 9);
        tracker.add_viewer(2, 9);
        tracker.add_viewer(2, 8);

        tracker.forget_viewer(9);
        assert!(tracker.viewers(1).is_empty());
        assert_eq!(tracker.viewers(2), vec![8]);
    }

    #[test]
    fn pending_removals_are_drained_once() {
        let view = PlayerView::new();
        view.queue_removal(3);
        view.queue_removal(4);
        assert_eq!(view.take_pending_removals(), vec![3, 4]);
        assert!(view.take_pending_removals().is_empty());
    }
}
