//! A reading session: the current position, and everything that follows
//! it around.
//!
//! All mutation happens through `&mut self`, one event at a time. Moving
//! never waits for content; callers fetch the returned request whenever
//! they like and hand the result back with `deliver`, which ignores it if
//! the reader has moved on in the meantime.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use chrono::Utc;

use super::bookmarks::{self, Bookmark};
use super::content::{Content, ContentRequest, DisplayState};
use super::errors::*;
use super::navigate;
use super::plan::PlanIndex;
use super::position::{self, Hints, Position, Resolution};
use super::progress::{self, Progress};
use super::reference::LocationRef;
use super::store::StateStore;
use super::sync::Synchronizer;
use super::timer::AutoAdvance;

pub struct Session<S: StateStore> {
    plan: PlanIndex,
    sync: Synchronizer<S>,
    position: Position,
    display: DisplayState,
    auto: Option<AutoAdvance>,
}

impl<S: StateStore> Session<S> {
    /// Starts a session, resolving the initial position from the inbound
    /// reference (if any) and the day persisted in `store`.
    pub fn start(plan: PlanIndex, store: S, reference: Option<LocationRef>) -> Session<S> {
        let hints = Hints {
            reference: reference.filter(|r| !r.is_empty()),
            persisted_day: progress::load_last_day(&store),
        };
        let Resolution {
            position,
            display_hint,
            ..
        } = position::resolve_initial(&plan, &hints);

        let mut session = Session {
            plan: plan,
            sync: Synchronizer::new(store),
            position: position,
            display: DisplayState::Empty,
            auto: None,
        };
        session.move_to(position, display_hint);
        session
    }

    pub fn plan(&self) -> &PlanIndex {
        &self.plan
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn store(&self) -> &S {
        self.sync.store()
    }

    /// The shareable reference for the current position.
    pub fn reference(&self) -> &LocationRef {
        self.sync.reference()
    }

    /// Returns false once persisting has failed in this session.
    pub fn is_durable(&self) -> bool {
        self.sync.is_durable()
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    /// The request still waiting for content, if any.
    pub fn pending(&self) -> Option<ContentRequest> {
        match self.display {
            DisplayState::Pending(request) => Some(request),
            _ => None,
        }
    }

    pub fn is_at_start(&self) -> bool {
        self.position == self.plan.first_position()
    }

    pub fn is_at_end(&self) -> bool {
        self.position == self.plan.last_position()
    }

    /// Moves to the next sub-unit (a no-op at the end of the plan).
    pub fn next(&mut self) -> Position {
        self.manual_step(navigate::advance)
    }

    /// Moves to the previous sub-unit (a no-op at the start of the plan).
    pub fn previous(&mut self) -> Position {
        self.manual_step(navigate::retreat)
    }

    pub fn next_by(&mut self, count: u32) -> Position {
        self.manual_step(|plan, p| navigate::advance_by(plan, p, count))
    }

    pub fn previous_by(&mut self, count: u32) -> Position {
        self.manual_step(|plan, p| navigate::retreat_by(plan, p, count))
    }

    /// Jumps to the start of `day`. An invalid day is refused and the
    /// position is left as it was.
    pub fn jump_to_day(&mut self, day: u32) -> Result<Position> {
        let target = position::position_for_day(&self.plan, day)?;
        self.cancel_auto_advance();
        Ok(self.move_to(target, None))
    }

    /// Jumps to an exact sub-unit, on the earliest day containing it.
    pub fn jump_to_unit(&mut self, section: u32, sub_unit: u32) -> Result<Position> {
        let entry = self.plan.entry_containing(section, sub_unit)?;
        let target = Position::new(entry.day(), section, sub_unit);
        self.cancel_auto_advance();
        Ok(self.move_to(target, None))
    }

    /// Follows an inbound reference the way a session start would: its day
    /// first, then its section. A reference naming neither leaves the
    /// position alone.
    pub fn jump_to_reference(&mut self, reference: &LocationRef) -> Result<Position> {
        let hint = reference.unit();
        if let Some(day) = reference.day {
            match position::position_for_day(&self.plan, day) {
                Ok(target) => {
                    self.cancel_auto_advance();
                    return Ok(self.move_to(target, hint));
                }
                Err(e) => {
                    if hint.is_none() {
                        return Err(e);
                    }
                    warn!("ignoring reference day: {}", e);
                }
            }
        }
        if let Some((section, sub_unit)) = hint {
            let target = position::position_for_unit(&self.plan, section, sub_unit)?;
            self.cancel_auto_advance();
            return Ok(self.move_to(target, hint));
        }
        Ok(self.position)
    }

    /// Hands back the result of fetching `request`. Returns false (and
    /// changes nothing) if the request is stale.
    pub fn deliver(&mut self, request: &ContentRequest, result: Result<Content>, now: Instant) -> bool {
        if !self.sync.is_current(request) {
            debug!(
                "discarding content for {} (now at {})",
                request.position, self.position
            );
            return false;
        }
        match result {
            Ok(content) => {
                self.display = DisplayState::Ready(content);
                if let Some(ref mut timer) = self.auto {
                    timer.arm(now);
                }
            }
            Err(e) => {
                debug!("no content for {}: {}", request.position, e);
                self.display = DisplayState::Failed(e.to_string());
            }
        }
        true
    }

    /// Turns on auto-advance. The timer is armed on the next successful
    /// delivery.
    pub fn enable_auto_advance(&mut self, delay: Duration) {
        self.auto = Some(AutoAdvance::new(delay));
    }

    /// Returns when the auto-advance timer will fire, if it is armed.
    pub fn auto_advance_deadline(&self) -> Option<Instant> {
        self.auto.as_ref().and_then(AutoAdvance::deadline)
    }

    /// Lets time pass. If the auto-advance timer has fired, moves forward
    /// and returns the new position; returns `None` otherwise, including at
    /// the end of the plan.
    pub fn tick(&mut self, now: Instant) -> Option<Position> {
        let fired = match self.auto {
            Some(ref mut timer) => timer.fire(now),
            None => false,
        };
        if !fired || self.is_at_end() {
            return None;
        }
        Some(self.step(navigate::advance))
    }

    /// Stops any scheduled auto-advance. Called on teardown.
    pub fn close(&mut self) {
        self.cancel_auto_advance();
    }

    pub fn progress(&self) -> Progress {
        Progress::load(self.sync.store(), &self.plan)
    }

    pub fn completed_days(&self) -> BTreeSet<u32> {
        progress::load_completed(self.sync.store(), &self.plan)
    }

    pub fn mark_complete(&mut self, day: u32) -> Result<bool> {
        progress::mark_complete(self.sync.store_mut(), &self.plan, day)
    }

    pub fn unmark_complete(&mut self, day: u32) -> Result<bool> {
        progress::unmark_complete(self.sync.store_mut(), &self.plan, day)
    }

    /// Bookmarks the current sub-unit.
    pub fn bookmark_current(&mut self) -> Result<Bookmark> {
        let p = self.position;
        bookmarks::add(self.sync.store_mut(), &self.plan, p.section, p.sub_unit, Utc::now())
    }

    pub fn is_current_bookmarked(&self) -> bool {
        bookmarks::is_bookmarked(self.sync.store(), self.position.section, self.position.sub_unit)
    }

    pub fn bookmarks(&self) -> Vec<Bookmark> {
        bookmarks::list(self.sync.store())
    }

    pub fn remove_bookmark(&mut self, id: &str) -> Result<bool> {
        bookmarks::remove(self.sync.store_mut(), id)
    }

    fn cancel_auto_advance(&mut self) {
        if let Some(ref mut timer) = self.auto {
            timer.cancel();
        }
    }

    fn manual_step<F>(&mut self, step: F) -> Position
    where
        F: FnOnce(&PlanIndex, &Position) -> Result<Position>,
    {
        self.cancel_auto_advance();
        self.step(step)
    }

    fn step<F>(&mut self, step: F) -> Position
    where
        F: FnOnce(&PlanIndex, &Position) -> Result<Position>,
    {
        let target = match step(&self.plan, &self.position) {
            Ok(p) => p,
            Err(e) => {
                error!("{}; resetting to the start of the last persisted day", e);
                let hints = Hints {
                    reference: None,
                    persisted_day: progress::load_last_day(self.sync.store()),
                };
                position::resolve_initial(&self.plan, &hints).position
            }
        };
        if target == self.position {
            return target;
        }
        self.move_to(target, None)
    }

    fn move_to(&mut self, position: Position, display_hint: Option<(u32, u32)>) -> Position {
        self.position = position;
        let request = self.sync.observe(&self.plan, position, display_hint);
        self.display = DisplayState::Pending(request);
        position
    }
}

impl<S: StateStore> Drop for Session<S> {
    fn drop(&mut self) {
        self.close();
    }
}
