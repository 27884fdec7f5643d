//! Stage enumeration and show progress: the single source of truth for
//! which stage is active, which have been visited, whether an advance is
//! currently permitted, and the durable resume point.

use std::collections::HashSet;

use crate::storage::KeyValueStore;

/// Durable key holding the last content stage the viewer reached.
pub const RESUME_KEY: &str = "stagehand.resume_stage";

/// The show's fixed, ordered stage list. Stage 0 is the intro/loading
/// stage and is never a valid resume target; stages 1..7 are content in
/// strict linear order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    Intro,
    Threshold,
    Gallery,
    Machines,
    Garden,
    Archive,
    Observatory,
    Finale,
}

impl StageId {
    /// All stages in presentation order.
    pub const ALL: &'static [StageId] = &[
        StageId::Intro,
        StageId::Threshold,
        StageId::Gallery,
        StageId::Machines,
        StageId::Garden,
        StageId::Archive,
        StageId::Observatory,
        StageId::Finale,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// First stage a reload may resume to.
    pub const FIRST_CONTENT: StageId = StageId::Threshold;

    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|&stage| stage == self)
            .unwrap_or(0)
    }

    pub fn from_index(index: usize) -> Option<StageId> {
        Self::ALL.get(index).copied()
    }

    pub fn next(self) -> Option<StageId> {
        Self::from_index(self.index() + 1)
    }

    pub fn is_intro(self) -> bool {
        self == StageId::Intro
    }

    /// Short human-readable label for overlay display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Intro => "Intro",
            Self::Threshold => "Threshold",
            Self::Gallery => "Gallery",
            Self::Machines => "Machines",
            Self::Garden => "Garden",
            Self::Archive => "Archive",
            Self::Observatory => "Observatory",
            Self::Finale => "Finale",
        }
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Shared progress state. Writer roles are split by convention and must
/// stay split: the controller is the only caller of `set_stage` /
/// `advance_to_next`; the active scene (and the overlay's Advance button)
/// are the only writers of the advance flag.
pub struct ProgressStore {
    current: StageId,
    visited: HashSet<StageId>,
    can_advance: bool,
    store: Box<dyn KeyValueStore>,
    stage_listener: Option<Box<dyn FnMut(StageId)>>,
}

impl ProgressStore {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        let mut visited = HashSet::new();
        visited.insert(StageId::Intro);
        Self {
            current: StageId::Intro,
            visited,
            can_advance: false,
            store,
            stage_listener: None,
        }
    }

    /// Register the progress-indicator callback, invoked on every stage
    /// change. One listener is enough; the overlay fans out display.
    pub fn set_stage_listener(&mut self, listener: Box<dyn FnMut(StageId)>) {
        self.stage_listener = Some(listener);
    }

    pub fn current(&self) -> StageId {
        self.current
    }

    pub fn visited(&self) -> &HashSet<StageId> {
        &self.visited
    }

    pub fn can_advance(&self) -> bool {
        self.can_advance
    }

    pub fn set_can_advance(&mut self, value: bool) {
        self.can_advance = value;
    }

    /// Switch the tracked stage. Out-of-range indices are silently
    /// ignored — defensive callers may probe past the end of the show.
    /// Content stages (index > 0) are persisted as the resume point.
    pub fn set_stage(&mut self, index: usize) {
        let Some(stage) = StageId::from_index(index) else {
            log::debug!("Ignoring out-of-range stage index {index}");
            return;
        };
        self.current = stage;
        self.visited.insert(stage);
        if index > 0 {
            self.store.set(RESUME_KEY, &index.to_string());
        }
        if let Some(listener) = self.stage_listener.as_mut() {
            listener(stage);
        }
    }

    /// Move to the next stage in order. Returns false (and changes
    /// nothing) when already on the final stage.
    pub fn advance_to_next(&mut self) -> bool {
        match self.current.next() {
            Some(next) => {
                self.set_stage(next.index());
                true
            }
            None => false,
        }
    }

    /// Resolve where a reload should land. The intro is never resurrected:
    /// absent, malformed, zero, or out-of-range stored values all fall
    /// back to the first content stage.
    pub fn resume_stage(&self) -> StageId {
        self.store
            .get(RESUME_KEY)
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|&index| index >= 1)
            .and_then(StageId::from_index)
            .unwrap_or(StageId::FIRST_CONTENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn store_with(value: Option<&str>) -> ProgressStore {
        let backing = match value {
            Some(value) => MemoryStore::with(RESUME_KEY, value),
            None => MemoryStore::new(),
        };
        ProgressStore::new(Box::new(backing))
    }

    #[test]
    fn stage_indices_are_dense_and_ordered() {
        for (index, &stage) in StageId::ALL.iter().enumerate() {
            assert_eq!(stage.index(), index);
            assert_eq!(StageId::from_index(index), Some(stage));
        }
        assert_eq!(StageId::from_index(StageId::COUNT), None);
        assert_eq!(StageId::Intro.index(), 0);
        assert_eq!(StageId::FIRST_CONTENT.index(), 1);
    }

    #[test]
    fn advance_walks_every_stage_without_skipping() {
        let mut progress = store_with(None);
        let mut seen = vec![progress.current().index()];
        while progress.advance_to_next() {
            seen.push(progress.current().index());
        }
        let expected: Vec<usize> = (0..StageId::COUNT).collect();
        assert_eq!(seen, expected);
        // At the end, further advances fail and change nothing.
        assert!(!progress.advance_to_next());
        assert_eq!(progress.current(), StageId::Finale);
    }

    #[test]
    fn out_of_range_set_stage_is_ignored() {
        let mut progress = store_with(None);
        progress.set_stage(3);
        progress.set_stage(99);
        assert_eq!(progress.current(), StageId::Machines);
    }

    #[test]
    fn visited_grows_monotonically() {
        let mut progress = store_with(None);
        progress.set_stage(2);
        progress.set_stage(1);
        assert!(progress.visited().contains(&StageId::Intro));
        assert!(progress.visited().contains(&StageId::Threshold));
        assert!(progress.visited().contains(&StageId::Gallery));
        assert_eq!(progress.visited().len(), 3);
    }

    #[test]
    fn resume_defaults_to_first_content_when_store_is_empty() {
        assert_eq!(store_with(None).resume_stage(), StageId::Threshold);
    }

    #[test]
    fn resume_never_returns_intro() {
        for bad in ["0", "-3", "garbage", "", "99", "8"] {
            let progress = store_with(Some(bad));
            let resume = progress.resume_stage();
            assert!(
                resume.index() >= 1,
                "stored {bad:?} resumed to {resume:?}"
            );
            assert_eq!(resume, StageId::Threshold, "stored {bad:?}");
        }
    }

    #[test]
    fn resume_honors_valid_stored_index() {
        let progress = store_with(Some("4"));
        assert_eq!(progress.resume_stage(), StageId::Garden);
        assert_eq!(progress.resume_stage().index(), 4);
    }

    #[test]
    fn intro_is_never_persisted_as_resume_point() {
        let mut progress = store_with(None);
        progress.set_stage(3);
        progress.set_stage(0);
        // Returning to the intro must not clobber the stored stage.
        assert_eq!(progress.resume_stage(), StageId::Machines);
    }

    #[test]
    fn persisting_survives_each_content_stage_change() {
        let mut progress = store_with(None);
        progress.set_stage(2);
        assert_eq!(progress.resume_stage(), StageId::Gallery);
        progress.set_stage(5);
        assert_eq!(progress.resume_stage(), StageId::Archive);
    }

    #[test]
    fn can_advance_is_a_plain_flag() {
        let mut progress = store_with(None);
        assert!(!progress.can_advance());
        progress.set_can_advance(true);
        assert!(progress.can_advance());
        progress.set_can_advance(false);
        assert!(!progress.can_advance());
    }

    #[test]
    fn stage_listener_sees_every_change() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut progress = store_with(None);
        progress.set_stage_listener(Box::new(move |stage| {
            sink.borrow_mut().push(stage);
        }));

        progress.set_stage(1);
        progress.set_stage(99); // ignored, no notification
        progress.advance_to_next();

        assert_eq!(
            *seen.borrow(),
            vec![StageId::Threshold, StageId::Gallery]
        );
    }
}
