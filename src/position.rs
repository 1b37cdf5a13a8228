//! Reading positions, and resolution of the position a session starts at.
//!
//! Resolution looks at whichever hints are available, strictly in this
//! order, and the first one that yields a position wins:
//!
//! 1. a day given in the shareable location reference;
//! 2. a section and sub-unit given in the reference (without a usable day),
//!    mapped to the earliest day containing it;
//! 3. the day persisted by a previous session;
//! 4. the first day of the plan.
//!
//! Every path lands on the *start* of the chosen day. A section/sub-unit
//! hint in the reference is handed back separately as a display override
//! for the first content lookup; it never becomes the position itself.

use std::fmt;

use super::errors::*;
use super::plan::PlanIndex;
use super::reference::LocationRef;

/// A single sub-unit of the plan, together with the day it is read on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub day: u32,
    pub section: u32,
    pub sub_unit: u32,
}

impl Position {
    pub fn new(day: u32, section: u32, sub_unit: u32) -> Position {
        Position {
            day: day,
            section: section,
            sub_unit: sub_unit,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "day {}, {}:{}", self.day, self.section, self.sub_unit)
    }
}

/// The hints available when a session starts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Hints {
    /// The inbound shareable location reference, if any.
    pub reference: Option<LocationRef>,
    /// The day persisted by a previous session, if any.
    pub persisted_day: Option<u32>,
}

/// Which hint decided a resolved position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    ReferenceDay,
    ReferenceUnit,
    Persisted,
    Default,
}

/// The outcome of resolving the initial position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub position: Position,
    pub source: Source,
    /// `(section, sub_unit)` from the reference, to be displayed instead of
    /// `position` for one lookup only.
    pub display_hint: Option<(u32, u32)>,
}

/// Returns the start of the given day, or an error if there is no such day.
pub fn position_for_day(plan: &PlanIndex, day: u32) -> Result<Position> {
    plan.day_start(day)
}

/// Returns the start of the earliest day containing the given sub-unit.
pub fn position_for_unit(plan: &PlanIndex, section: u32, sub_unit: u32) -> Result<Position> {
    plan.entry_containing(section, sub_unit).map(|e| e.start())
}

/// Resolves the position a session starts at. This never fails: absent or
/// unusable hints fall through to the next rule, ending at day 1.
pub fn resolve_initial(plan: &PlanIndex, hints: &Hints) -> Resolution {
    let display_hint = hints.reference.as_ref().and_then(LocationRef::unit);

    if let Some(ref reference) = hints.reference {
        if let Some(day) = reference.day {
            match position_for_day(plan, day) {
                Ok(position) => {
                    debug!("resolved {} from reference day", position);
                    return Resolution {
                        position: position,
                        source: Source::ReferenceDay,
                        display_hint: display_hint,
                    };
                }
                Err(e) => warn!("ignoring reference day: {}", e),
            }
        }

        if let Some((section, sub_unit)) = reference.unit() {
            match position_for_unit(plan, section, sub_unit) {
                Ok(position) => {
                    debug!("resolved {} from reference section {}:{}", position, section, sub_unit);
                    return Resolution {
                        position: position,
                        source: Source::ReferenceUnit,
                        display_hint: display_hint,
                    };
                }
                Err(e) => warn!("ignoring reference section: {}", e),
            }
        }
    }

    if let Some(day) = hints.persisted_day {
        match position_for_day(plan, day) {
            Ok(position) => {
                debug!("resolved {} from persisted day", position);
                return Resolution {
                    position: position,
                    source: Source::Persisted,
                    display_hint: None,
                };
            }
            Err(e) => warn!("ignoring persisted day: {}", e),
        }
    }

    let position = plan.first_position();
    debug!("resolved {} by default", position);
    Resolution {
        position: position,
        source: Source::Default,
        display_hint: None,
    }
}
