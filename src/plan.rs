//! This module provides the fixed reading plan: an immutable table mapping
//! each day to the ordered list of segments read on that day.
//!
//! Plans are read from JSON, as an ordered list of entries of the form
//! `{ "name": "day 3", "segments": [...] }`. Each segment is either
//! `{ "sectionNumber": 2, "subUnitRange": [204, 286] }` or the compact
//! keyed form `{ "2": [204, 286] }`; the list may also be given under the
//! key `surah`. All validation happens here, so that everything handed out
//! by a `PlanIndex` can be trusted by the navigation code.

use std::collections::BTreeMap;
use std::io::Read;
use std::slice;

use super::errors::*;
use super::position::Position;

/// The number of sections in the corpus.
pub const SECTION_COUNT: u32 = 114;

/// The number of days in the bundled plan.
pub const PLAN_DAYS: u32 = 27;

/// The number of sub-units in each section, indexed by section number - 1.
const SECTION_LENGTHS: [u32; SECTION_COUNT as usize] = [
    7, 286, 200, 176, 120, 165, 206, 75, 129, 109, 123, 111, 43, 52, 99, 128, 111, 110, 98, 135,
    112, 78, 118, 64, 77, 227, 93, 88, 69, 60, 34, 30, 73, 54, 45, 83, 182, 88, 75, 85, 54, 53,
    89, 59, 37, 35, 38, 29, 18, 45, 60, 49, 62, 55, 78, 96, 29, 22, 24, 13, 14, 11, 11, 18, 12,
    12, 30, 52, 52, 44, 28, 28, 20, 56, 40, 31, 50, 40, 46, 42, 29, 19, 36, 25, 22, 17, 19, 26,
    30, 20, 15, 21, 11, 8, 8, 19, 5, 8, 8, 11, 11, 8, 3, 9, 5, 4, 7, 3, 6, 3, 5, 4, 5, 6,
];

/// The bundled 27-day plan.
const BUILTIN_PLAN: &str = include_str!("../data/plan-27.json");

/// Returns the number of sub-units in the given section, or `None` if
/// there is no such section.
pub fn section_length(section: u32) -> Option<u32> {
    if section == 0 {
        return None;
    }
    SECTION_LENGTHS.get(section as usize - 1).cloned()
}

/// Extracts the day number from an entry name by taking the first run of
/// decimal digits. Names without digits (or with an unrepresentable number)
/// fall back to the entry's 1-based ordinal, given its 0-based `index`.
pub fn day_number(name: &str, index: usize) -> u32 {
    let digits: String = name
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    match digits.parse() {
        Ok(n) => n,
        Err(_) => index as u32 + 1,
    }
}

/// A contiguous sub-unit range within one section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SegmentRef {
    section: u32,
    range_start: u32,
    range_end: u32,
}

impl SegmentRef {
    /// Returns a segment covering `range_start..=range_end` of `section`.
    /// Nothing is checked here; plans are validated as a whole when a
    /// `PlanIndex` is built.
    pub fn new(section: u32, range_start: u32, range_end: u32) -> SegmentRef {
        SegmentRef {
            section: section,
            range_start: range_start,
            range_end: range_end,
        }
    }

    pub fn section(&self) -> u32 {
        self.section
    }

    pub fn range_start(&self) -> u32 {
        self.range_start
    }

    pub fn range_end(&self) -> u32 {
        self.range_end
    }

    /// Returns whether `sub_unit` of `section` falls inside this segment.
    pub fn contains(&self, section: u32, sub_unit: u32) -> bool {
        self.section == section && self.range_start <= sub_unit && sub_unit <= self.range_end
    }

    /// Returns the number of sub-units in the segment.
    pub fn len(&self) -> u32 {
        self.range_end - self.range_start + 1
    }

    fn validate(&self, day: u32) -> Result<()> {
        let length = match section_length(self.section) {
            Some(l) => l,
            None => {
                return Err(ErrorKind::PlanFormat(format!(
                    "day {} names section {}, which does not exist",
                    day, self.section
                ))
                .into())
            }
        };
        if self.range_start == 0 || self.range_start > self.range_end || self.range_end > length {
            return Err(ErrorKind::PlanFormat(format!(
                "day {} has invalid range {}-{} for section {} (which has {} sub-units)",
                day, self.range_start, self.range_end, self.section, length
            ))
            .into());
        }
        Ok(())
    }
}

/// One day of the reading plan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanEntry {
    day: u32,
    /// Never empty; insertion order is reading order.
    segments: Vec<SegmentRef>,
}

impl PlanEntry {
    /// Returns the day number of the entry (1-based).
    pub fn day(&self) -> u32 {
        self.day
    }

    /// Returns the segments of the entry in reading order.
    pub fn segments(&self) -> &[SegmentRef] {
        &self.segments
    }

    pub fn first_segment(&self) -> &SegmentRef {
        &self.segments[0]
    }

    pub fn last_segment(&self) -> &SegmentRef {
        &self.segments[self.segments.len() - 1]
    }

    /// Returns the index of the segment containing the given sub-unit.
    pub fn segment_index(&self, section: u32, sub_unit: u32) -> Option<usize> {
        self.segments.iter().position(|s| s.contains(section, sub_unit))
    }

    /// The first sub-unit read on this day.
    pub fn start(&self) -> Position {
        let s = self.first_segment();
        Position::new(self.day, s.section, s.range_start)
    }

    /// The last sub-unit read on this day.
    pub fn end(&self) -> Position {
        let s = self.last_segment();
        Position::new(self.day, s.section, s.range_end)
    }

    /// Returns the total number of sub-units read on this day.
    pub fn sub_unit_count(&self) -> u32 {
        self.segments.iter().map(SegmentRef::len).sum()
    }
}

/// Raw plan entry, as found in plan files.
#[derive(Deserialize, Debug)]
struct RawEntry {
    name: String,
    #[serde(alias = "surah")]
    segments: Vec<RawSegment>,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum RawSegment {
    Explicit {
        #[serde(rename = "sectionNumber")]
        section_number: u32,
        #[serde(rename = "subUnitRange")]
        sub_unit_range: (u32, u32),
    },
    Named {
        number: u32,
        verses: (u32, u32),
    },
    Keyed(BTreeMap<String, (u32, u32)>),
}

impl RawSegment {
    fn into_segment(self, name: &str) -> Result<SegmentRef> {
        match self {
            RawSegment::Explicit {
                section_number,
                sub_unit_range: (start, end),
            } => Ok(SegmentRef::new(section_number, start, end)),
            RawSegment::Named {
                number,
                verses: (start, end),
            } => Ok(SegmentRef::new(number, start, end)),
            RawSegment::Keyed(map) => {
                let keys = map.len();
                let mut iter = map.into_iter();
                let (key, (start, end)) = match (iter.next(), iter.next()) {
                    (Some(only), None) => only,
                    _ => {
                        return Err(ErrorKind::PlanFormat(format!(
                            "entry '{}' has a segment with {} keys (expected exactly one)",
                            name, keys
                        ))
                        .into())
                    }
                };
                let section: u32 = key.trim().parse().chain_err(|| {
                    ErrorKind::PlanFormat(format!(
                        "entry '{}' has a segment keyed by '{}', which is not a section number",
                        name, key
                    ))
                })?;
                Ok(SegmentRef::new(section, start, end))
            }
        }
    }
}

/// The immutable day table. Entry `i` always describes day `i + 1`.
#[derive(Clone, Debug)]
pub struct PlanIndex {
    entries: Vec<PlanEntry>,
}

impl PlanIndex {
    /// Builds an index from named entries, extracting day numbers from the
    /// names and validating the whole table.
    ///
    /// The extracted days must be exactly `1..=N` (in any order); every
    /// entry must have at least one segment, and every segment must be a
    /// valid range of an existing section.
    pub fn from_entries(named: Vec<(String, Vec<SegmentRef>)>) -> Result<PlanIndex> {
        if named.is_empty() {
            return Err(ErrorKind::PlanFormat("cannot construct an empty plan".into()).into());
        }

        let mut entries = Vec::with_capacity(named.len());
        for (n, (name, segments)) in named.into_iter().enumerate() {
            let day = day_number(&name, n);
            if segments.is_empty() {
                return Err(ErrorKind::PlanFormat(format!("day {} has no segments", day)).into());
            }
            for s in &segments {
                s.validate(day)?;
            }
            entries.push(PlanEntry {
                day: day,
                segments: segments,
            });
        }

        entries.sort_by_key(|e| e.day);
        for (n, e) in entries.iter().enumerate() {
            let expected = n as u32 + 1;
            if e.day < expected {
                return Err(ErrorKind::PlanFormat(format!("day {} appears more than once", e.day)).into());
            }
            if e.day > expected {
                return Err(ErrorKind::PlanFormat(format!("day {} is missing", expected)).into());
            }
        }

        Ok(PlanIndex { entries: entries })
    }

    /// Reads a plan table in JSON format.
    pub fn from_json<T: Read>(input: T) -> Result<PlanIndex> {
        let raw: Vec<RawEntry> = serde_json::from_reader(input)
            .chain_err(|| ErrorKind::Json("could not parse plan table".into()))?;
        let mut named = Vec::with_capacity(raw.len());
        for entry in raw {
            let mut segments = Vec::with_capacity(entry.segments.len());
            for s in entry.segments {
                segments.push(s.into_segment(&entry.name)?);
            }
            named.push((entry.name, segments));
        }
        PlanIndex::from_entries(named)
    }

    /// Loads the bundled 27-day plan.
    pub fn builtin() -> Result<PlanIndex> {
        let plan = PlanIndex::from_json(BUILTIN_PLAN.as_bytes())?;
        if plan.max_day() != PLAN_DAYS {
            return Err(ErrorKind::PlanFormat(format!(
                "bundled plan has {} days (expected {})",
                plan.max_day(),
                PLAN_DAYS
            ))
            .into());
        }
        Ok(plan)
    }

    /// Returns the last day of the plan.
    pub fn max_day(&self) -> u32 {
        self.entries.len() as u32
    }

    /// Returns the entry for the given day.
    pub fn lookup(&self, day: u32) -> Result<&PlanEntry> {
        if day < 1 || day > self.max_day() {
            return Err(ErrorKind::OutOfRange(day, self.max_day()).into());
        }
        Ok(&self.entries[day as usize - 1])
    }

    /// Returns the first day (in ascending order) with a segment covering
    /// the given sub-unit. If several days match, the earliest wins.
    pub fn entry_containing(&self, section: u32, sub_unit: u32) -> Result<&PlanEntry> {
        self.entries
            .iter()
            .find(|e| e.segment_index(section, sub_unit).is_some())
            .ok_or_else(|| ErrorKind::NotFound(section, sub_unit).into())
    }

    /// Returns the first position of the given day.
    pub fn day_start(&self, day: u32) -> Result<Position> {
        self.lookup(day).map(PlanEntry::start)
    }

    /// Returns the last position of the given day.
    pub fn day_end(&self, day: u32) -> Result<Position> {
        self.lookup(day).map(PlanEntry::end)
    }

    /// The first position of the whole plan.
    pub fn first_position(&self) -> Position {
        self.entries[0].start()
    }

    /// The last position of the whole plan.
    pub fn last_position(&self) -> Position {
        self.entries[self.entries.len() - 1].end()
    }

    /// Returns the total number of sub-units across all days.
    pub fn total_sub_units(&self) -> u32 {
        self.entries.iter().map(PlanEntry::sub_unit_count).sum()
    }

    /// Returns an iterator over the days of the plan, in order.
    pub fn days(&self) -> slice::Iter<PlanEntry> {
        self.entries.iter()
    }
}
