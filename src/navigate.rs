//! Moving forward and backward through the plan, one sub-unit at a time.
//!
//! Both directions cross segment and day boundaries. At the very first and
//! very last position of the plan they return the position unchanged, so
//! repeated calls at either end are harmless.

use super::errors::*;
use super::plan::{PlanEntry, PlanIndex};
use super::position::Position;

/// Finds the entry for `position.day` and the index of the segment holding
/// the position within it.
fn locate<'a>(plan: &'a PlanIndex, position: &Position) -> Result<(&'a PlanEntry, usize)> {
    let inconsistent =
        || ErrorKind::InconsistentPosition(position.day, position.section, position.sub_unit);
    let entry = plan.lookup(position.day).chain_err(&inconsistent)?;
    match entry.segment_index(position.section, position.sub_unit) {
        Some(i) => Ok((entry, i)),
        None => Err(inconsistent().into()),
    }
}

/// Returns the position after `position`.
pub fn advance(plan: &PlanIndex, position: &Position) -> Result<Position> {
    let (entry, i) = locate(plan, position)?;
    let segments = entry.segments();
    let s = &segments[i];

    if position.sub_unit < s.range_end() {
        return Ok(Position::new(position.day, position.section, position.sub_unit + 1));
    }
    if let Some(next) = segments.get(i + 1) {
        return Ok(Position::new(position.day, next.section(), next.range_start()));
    }
    if position.day < plan.max_day() {
        return plan.day_start(position.day + 1);
    }
    Ok(*position)
}

/// Returns the position before `position`.
pub fn retreat(plan: &PlanIndex, position: &Position) -> Result<Position> {
    let (entry, i) = locate(plan, position)?;
    let segments = entry.segments();
    let s = &segments[i];

    if position.sub_unit > s.range_start() {
        return Ok(Position::new(position.day, position.section, position.sub_unit - 1));
    }
    if i > 0 {
        let previous = &segments[i - 1];
        return Ok(Position::new(position.day, previous.section(), previous.range_end()));
    }
    if position.day > 1 {
        return plan.day_end(position.day - 1);
    }
    Ok(*position)
}

/// Advances up to `count` times, stopping early at the end of the plan.
pub fn advance_by(plan: &PlanIndex, position: &Position, count: u32) -> Result<Position> {
    step_by(plan, position, count, advance)
}

/// Retreats up to `count` times, stopping early at the start of the plan.
pub fn retreat_by(plan: &PlanIndex, position: &Position, count: u32) -> Result<Position> {
    step_by(plan, position, count, retreat)
}

fn step_by<F>(plan: &PlanIndex, position: &Position, count: u32, step: F) -> Result<Position>
where
    F: Fn(&PlanIndex, &Position) -> Result<Position>,
{
    let mut current = *position;
    for _ in 0..count {
        let next = step(plan, &current)?;
        if next == current {
            break;
        }
        current = next;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::SegmentRef;

    fn plan() -> PlanIndex {
        PlanIndex::from_entries(vec![
            (
                "day 1".to_owned(),
                vec![SegmentRef::new(1, 1, 7), SegmentRef::new(2, 1, 5)],
            ),
            ("day 2".to_owned(), vec![SegmentRef::new(2, 6, 8)]),
            (
                "day 3".to_owned(),
                vec![SegmentRef::new(2, 9, 9), SegmentRef::new(3, 1, 2)],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn advance_within_segment() {
        let p = advance(&plan(), &Position::new(1, 1, 3)).unwrap();
        assert_eq!(p, Position::new(1, 1, 4));
    }

    #[test]
    fn advance_crosses_segment() {
        let p = advance(&plan(), &Position::new(1, 1, 7)).unwrap();
        assert_eq!(p, Position::new(1, 2, 1));
    }

    #[test]
    fn advance_crosses_day() {
        let p = advance(&plan(), &Position::new(1, 2, 5)).unwrap();
        assert_eq!(p, Position::new(2, 2, 6));
    }

    #[test]
    fn advance_stops_at_end_of_plan() {
        let plan = plan();
        let last = plan.last_position();
        assert_eq!(last, Position::new(3, 3, 2));
        assert_eq!(advance(&plan, &last).unwrap(), last);
        assert_eq!(advance(&plan, &advance(&plan, &last).unwrap()).unwrap(), last);
    }

    #[test]
    fn retreat_within_segment() {
        let p = retreat(&plan(), &Position::new(2, 2, 8)).unwrap();
        assert_eq!(p, Position::new(2, 2, 7));
    }

    #[test]
    fn retreat_starts_at_segment_range_not_one() {
        // 2:6 is the first sub-unit of day 2, even though it is not 2:1
        let p = retreat(&plan(), &Position::new(2, 2, 6)).unwrap();
        assert_eq!(p, Position::new(1, 2, 5));
    }

    #[test]
    fn retreat_crosses_segment_to_its_end() {
        let p = retreat(&plan(), &Position::new(3, 3, 1)).unwrap();
        assert_eq!(p, Position::new(3, 2, 9));
    }

    #[test]
    fn retreat_stops_at_start_of_plan() {
        let plan = plan();
        let first = plan.first_position();
        assert_eq!(retreat(&plan, &first).unwrap(), first);
    }

    #[test]
    fn unknown_section_is_inconsistent() {
        let plan = plan();
        for p in &[
            Position::new(1, 3, 1),
            Position::new(1, 2, 6),
            Position::new(9, 1, 1),
        ] {
            match advance(&plan, p) {
                Err(Error(ErrorKind::InconsistentPosition(..), _)) => {}
                other => panic!("unexpected result {:?}", other),
            }
            assert!(retreat(&plan, p).is_err());
        }
    }

    #[test]
    fn stepping_by_counts_stops_at_the_ends() {
        let plan = plan();
        let first = plan.first_position();
        assert_eq!(advance_by(&plan, &first, 8).unwrap(), Position::new(1, 2, 2));
        assert_eq!(advance_by(&plan, &first, 100).unwrap(), plan.last_position());
        assert_eq!(retreat_by(&plan, &plan.last_position(), 100).unwrap(), first);
    }

    #[test]
    fn walk_visits_every_sub_unit_once() {
        let plan = plan();
        let mut p = plan.first_position();
        let mut seen = vec![p];
        for _ in 1..plan.total_sub_units() {
            p = advance(&plan, &p).unwrap();
            seen.push(p);
        }
        assert_eq!(p, plan.last_position());
        assert_eq!(seen.len(), 18);
        for pair in seen.windows(2) {
            assert_ne!(pair[0], pair[1]);
            assert!(pair[0].day <= pair[1].day);
            assert_eq!(retreat(&plan, &pair[1]).unwrap(), pair[0]);
        }
    }
}
