//! Snapshot-based undo/redo.
//!
//! History is a bounded sequence of scene snapshots with a cursor. Saving
//! truncates everything after the cursor (no branching), appends, and evicts
//! the oldest entry past capacity. Undo/redo move the cursor and restore;
//! at either end they are no-ops.
//!
//! Bursts of slider changes are collapsed by a [`Debouncer`]: the facade
//! marks the history dirty and saves once the burst has been quiet for the
//! configured window.

use std::collections::VecDeque;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::scene::{Scene, SceneSnapshot, SnapshotError};

/// One saved scene state.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySnapshot {
    pub scene: SceneSnapshot,
    pub timestamp: DateTime<Utc>,
}

/// Cursor summary for the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryInfo {
    pub total_states: usize,
    pub current_index: usize,
    pub can_undo: bool,
    pub can_redo: bool,
    pub capacity: usize,
}

pub struct History {
    entries: VecDeque<HistorySnapshot>,
    cursor: usize,
    capacity: usize,
}

impl History {
    /// Start a history whose only entry is `initial`.
    pub fn new(capacity: usize, initial: SceneSnapshot) -> Self {
        let capacity = capacity.max(1);
        let mut entries = VecDeque::with_capacity(capacity);
        entries.push_back(HistorySnapshot {
            scene: initial,
            timestamp: Utc::now(),
        });
        Self {
            entries,
            cursor: 0,
            capacity,
        }
    }

    /// Capture the scene and append it after the cursor.
    pub fn save_state(&mut self, scene: &Scene) -> Result<(), SnapshotError> {
        let snapshot = scene.to_snapshot()?;
        self.push(snapshot);
        Ok(())
    }

    /// Append a snapshot after the cursor, dropping any redo states.
    pub fn push(&mut self, snapshot: SceneSnapshot) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push_back(HistorySnapshot {
            scene: snapshot,
            timestamp: Utc::now(),
        });
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;
    }

    /// Step back one state. Returns `Ok(false)` at the oldest state.
    ///
    /// If the target snapshot cannot be restored the cursor and scene are
    /// left unchanged.
    pub fn undo(&mut self, scene: &mut Scene) -> Result<bool, SnapshotError> {
        if !self.can_undo() {
            return Ok(false);
        }
        self.step_to(self.cursor - 1, scene)
    }

    /// Step forward one state. Returns `Ok(false)` at the newest state.
    pub fn redo(&mut self, scene: &mut Scene) -> Result<bool, SnapshotError> {
        if !self.can_redo() {
            return Ok(false);
        }
        self.step_to(self.cursor + 1, scene)
    }

    fn step_to(&mut self, index: usize, scene: &mut Scene) -> Result<bool, SnapshotError> {
        match scene.restore_from_snapshot(&self.entries[index].scene) {
            Ok(()) => {
                self.cursor = index;
                Ok(true)
            }
            Err(e) => {
                log::error!("Failed to restore history state {}: {}", index, e);
                Err(e)
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The entry at the cursor.
    pub fn current(&self) -> Option<&HistorySnapshot> {
        self.entries.get(self.cursor)
    }

    pub fn info(&self) -> HistoryInfo {
        HistoryInfo {
            total_states: self.entries.len(),
            current_index: self.cursor,
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            capacity: self.capacity,
        }
    }

    /// Forget everything and keep `snapshot` as the single state.
    pub fn reset(&mut self, snapshot: SceneSnapshot) {
        self.entries.clear();
        self.entries.push_back(HistorySnapshot {
            scene: snapshot,
            timestamp: Utc::now(),
        });
        self.cursor = 0;
    }
}

/// Collapses bursts of changes into one save.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: TimeDelta,
    last_change: Option<DateTime<Utc>>,
}

impl Debouncer {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window: TimeDelta::milliseconds(window_ms.min(i64::MAX as u64) as i64),
            last_change: None,
        }
    }

    /// Record a change at `now`, restarting the quiet window.
    pub fn mark(&mut self, now: DateTime<Utc>) {
        self.last_change = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.last_change.is_some()
    }

    /// Whether the pending burst has been quiet for the full window.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.last_change
            .is_some_and(|last| now.signed_duration_since(last) >= self.window)
    }

    /// Clear the pending flag; returns whether anything was pending.
    pub fn take(&mut self) -> bool {
        self.last_change.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::render::RasterBackend;
    use crate::scene::{DrawableObject, ShapeKind};
    use crate::Color;

    fn setup(capacity: usize) -> (Scene, History) {
        let scene = Scene::new(Arc::new(RasterBackend::new()), 64, 64, Color::WHITE).unwrap();
        let history = History::new(capacity, scene.to_snapshot().unwrap());
        (scene, history)
    }

    fn add_and_save(scene: &mut Scene, history: &mut History) {
        scene.add_object(DrawableObject::shape(ShapeKind::Rect));
        history.save_state(scene).unwrap();
    }

    #[test]
    fn test_initial_state() {
        let (_, history) = setup(50);
        assert_eq!(history.len(), 1);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_at_start_is_noop() {
        let (mut scene, mut history) = setup(50);
        assert!(!history.undo(&mut scene).unwrap());
        assert!(!history.redo(&mut scene).unwrap());
        assert_eq!(history.cursor(), 0);
    }

    #[test]
    fn test_undo_redo_restores() {
        let (mut scene, mut history) = setup(50);
        add_and_save(&mut scene, &mut history);
        add_and_save(&mut scene, &mut history);
        assert_eq!(scene.objects().len(), 2);

        assert!(history.undo(&mut scene).unwrap());
        assert_eq!(scene.objects().len(), 1);
        assert!(history.can_redo());

        assert!(history.redo(&mut scene).unwrap());
        assert_eq!(scene.objects().len(), 2);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_save_after_undo_drops_redo() {
        let (mut scene, mut history) = setup(50);
        add_and_save(&mut scene, &mut history);
        add_and_save(&mut scene, &mut history);
        history.undo(&mut scene).unwrap();
        history.undo(&mut scene).unwrap();
        assert!(history.can_redo());

        add_and_save(&mut scene, &mut history);
        assert!(!history.can_redo());
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let (mut scene, mut history) = setup(3);
        for _ in 0..5 {
            add_and_save(&mut scene, &mut history);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.cursor(), 2);

        history.undo(&mut scene).unwrap();
        history.undo(&mut scene).unwrap();
        assert!(!history.can_undo());
        // Oldest surviving state has three objects
        assert_eq!(scene.objects().len(), 3);
    }

    #[test]
    fn test_failed_restore_keeps_cursor() {
        let (mut scene, mut history) = setup(50);
        history.push(SceneSnapshot::from_document("not json"));
        add_and_save(&mut scene, &mut history);
        let objects = scene.objects().len();

        assert!(history.undo(&mut scene).is_err());
        assert_eq!(history.cursor(), 2);
        assert_eq!(scene.objects().len(), objects);
    }

    #[test]
    fn test_info_and_reset() {
        let (mut scene, mut history) = setup(50);
        add_and_save(&mut scene, &mut history);
        let info = history.info();
        assert_eq!(info.total_states, 2);
        assert_eq!(info.current_index, 1);
        assert!(info.can_undo);
        assert_eq!(info.capacity, 50);

        history.reset(scene.to_snapshot().unwrap());
        assert_eq!(history.len(), 1);
        assert!(!history.can_undo());
    }

    #[test]
    fn test_debouncer_window() {
        let t0 = Utc::now();
        let mut d = Debouncer::new(500);
        assert!(!d.is_due(t0));

        d.mark(t0);
        assert!(d.is_pending());
        assert!(!d.is_due(t0 + TimeDelta::milliseconds(499)));
        assert!(d.is_due(t0 + TimeDelta::milliseconds(500)));

        // A new change restarts the window
        d.mark(t0 + TimeDelta::milliseconds(400));
        assert!(!d.is_due(t0 + TimeDelta::milliseconds(800)));
        assert!(d.take());
        assert!(!d.is_pending());
        assert!(!d.take());
    }
}
