//! Keeps the persisted day and the shareable reference in step with the
//! in-memory position.
//!
//! Every position a session moves to goes through `Synchronizer::observe`,
//! which, in order:
//!
//! 1. writes the day to the store (last write wins);
//! 2. replaces the shareable reference as a whole;
//! 3. issues the content request for the new position.
//!
//! A failed write is not an error for the caller. The synchronizer logs a
//! warning and stops persisting for the rest of the session, so navigation
//! carries on without durable storage.

use super::content::ContentRequest;
use super::plan::PlanIndex;
use super::position::Position;
use super::progress;
use super::reference::LocationRef;
use super::store::StateStore;

#[derive(Debug)]
pub struct Synchronizer<S: StateStore> {
    store: S,
    durable: bool,
    reference: LocationRef,
    request: Option<ContentRequest>,
}

impl<S: StateStore> Synchronizer<S> {
    pub fn new(store: S) -> Synchronizer<S> {
        Synchronizer {
            store: store,
            durable: true,
            reference: LocationRef::default(),
            request: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Returns false once a write has failed; positions are then only kept
    /// in memory.
    pub fn is_durable(&self) -> bool {
        self.durable
    }

    /// The shareable reference for the last observed position.
    pub fn reference(&self) -> &LocationRef {
        &self.reference
    }

    /// The content request issued for the last observed position.
    pub fn request(&self) -> Option<&ContentRequest> {
        self.request.as_ref()
    }

    /// Propagates a new position. `display_hint` overrides the sub-unit to
    /// fetch for this one request only.
    pub fn observe(
        &mut self,
        plan: &PlanIndex,
        position: Position,
        display_hint: Option<(u32, u32)>,
    ) -> ContentRequest {
        if self.durable {
            if let Err(e) = progress::save_last_day(&mut self.store, position.day) {
                warn!("{}; keeping position in memory only for this session", e);
                self.durable = false;
            }
        }

        self.reference = reference_for(plan, &position);

        let mut request = ContentRequest::for_position(position);
        if let Some((section, sub_unit)) = display_hint {
            request.section = section;
            request.sub_unit = sub_unit;
        }
        debug!("observed {} ({})", position, self.reference);
        self.request = Some(request);
        request
    }

    /// Returns whether a response to `request` may still be displayed,
    /// i.e. whether it was issued for the current position.
    pub fn is_current(&self, request: &ContentRequest) -> bool {
        match self.request {
            Some(ref current) => current.position == request.position,
            None => false,
        }
    }
}

/// Encodes the day, section and range of the segment holding `position`.
pub fn reference_for(plan: &PlanIndex, position: &Position) -> LocationRef {
    let range = plan
        .lookup(position.day)
        .ok()
        .and_then(|e| {
            e.segment_index(position.section, position.sub_unit)
                .map(|i| e.segments()[i])
        })
        .map(|s| (s.range_start(), s.range_end()))
        .unwrap_or((position.sub_unit, position.sub_unit));
    LocationRef::new(position.day, position.section, range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::*;
    use crate::plan::SegmentRef;
    use crate::store::MemoryStore;

    /// Accepts reads but refuses every write.
    struct ReadOnlyStore;

    impl StateStore for ReadOnlyStore {
        fn get(&self, _: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn set(&mut self, key: &str, _: &str) -> Result<()> {
            Err(ErrorKind::PersistenceWrite(key.into()).into())
        }
    }

    fn plan() -> PlanIndex {
        PlanIndex::from_entries(vec![
            (
                "day 1".to_owned(),
                vec![SegmentRef::new(1, 1, 7), SegmentRef::new(2, 1, 5)],
            ),
            ("day 2".to_owned(), vec![SegmentRef::new(2, 6, 9)]),
        ])
        .unwrap()
    }

    #[test]
    fn observe_persists_and_encodes() {
        let plan = plan();
        let mut sync = Synchronizer::new(MemoryStore::new());
        let request = sync.observe(&plan, Position::new(2, 2, 7), None);

        assert_eq!(progress::load_last_day(sync.store()), Some(2));
        assert_eq!(sync.reference().to_query(), "day=2&section=2&range=6-9");
        assert_eq!((request.section, request.sub_unit), (2, 7));
    }

    #[test]
    fn reference_is_replaced_as_a_whole() {
        let plan = plan();
        let mut sync = Synchronizer::new(MemoryStore::new());
        sync.observe(&plan, Position::new(2, 2, 7), None);
        sync.observe(&plan, Position::new(1, 1, 3), None);
        assert_eq!(*sync.reference(), LocationRef::new(1, 1, (1, 7)));
        assert_eq!(progress::load_last_day(sync.store()), Some(1));
    }

    #[test]
    fn display_hint_only_changes_the_fetch_key() {
        let plan = plan();
        let mut sync = Synchronizer::new(MemoryStore::new());
        let request = sync.observe(&plan, Position::new(1, 1, 1), Some((2, 4)));
        assert_eq!(request.position, Position::new(1, 1, 1));
        assert_eq!((request.section, request.sub_unit), (2, 4));
        assert_eq!(sync.reference().section, Some(1));
    }

    #[test]
    fn stale_requests_are_not_current() {
        let plan = plan();
        let mut sync = Synchronizer::new(MemoryStore::new());
        let old = sync.observe(&plan, Position::new(1, 1, 1), None);
        let new = sync.observe(&plan, Position::new(1, 1, 2), None);
        assert!(!sync.is_current(&old));
        assert!(sync.is_current(&new));
    }

    #[test]
    fn write_failure_downgrades_to_memory() {
        let plan = plan();
        let mut sync = Synchronizer::new(ReadOnlyStore);
        assert!(sync.is_durable());
        sync.observe(&plan, Position::new(1, 1, 1), None);
        assert!(!sync.is_durable());

        // Navigation-side state keeps moving
        sync.observe(&plan, Position::new(2, 2, 6), None);
        assert_eq!(sync.reference().day, Some(2));
    }
}
