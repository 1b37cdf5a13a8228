//! Shareable location references.
//!
//! A reference is a query string with up to three parameters:
//! `day=3&section=2&range=204-286`. `range` is either a single sub-unit or
//! a `start-end` pair, of which only the start is used for positioning.
//! Anything before a `?` is ignored, so whole links can be pasted in.
//! Unknown parameters are skipped, and values that are not numbers are
//! treated as absent.

use std::fmt;

/// A parsed (or to-be-encoded) location reference. All fields are optional.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LocationRef {
    pub day: Option<u32>,
    pub section: Option<u32>,
    /// `(start, end)`; a single sub-unit has `start == end`.
    pub range: Option<(u32, u32)>,
}

impl LocationRef {
    /// Returns a reference naming every field.
    pub fn new(day: u32, section: u32, range: (u32, u32)) -> LocationRef {
        LocationRef {
            day: Some(day),
            section: Some(section),
            range: Some(range),
        }
    }

    /// Parses a reference; this never fails, since malformed parameters are
    /// simply dropped.
    pub fn parse(input: &str) -> LocationRef {
        let query = match input.find('?') {
            Some(i) => &input[i + 1..],
            None => input,
        };
        // Fragments are not part of the reference
        let query = query.split('#').next().unwrap_or("");

        let mut reference = LocationRef::default();
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let mut kv = pair.splitn(2, '=');
            let key = kv.next().unwrap_or("").trim();
            let value = kv.next().unwrap_or("").trim();
            match key {
                "day" => reference.day = parse_number(key, value),
                "section" => reference.section = parse_number(key, value),
                "range" => reference.range = parse_range(value),
                _ => debug!("skipping unknown reference parameter '{}'", key),
            }
        }
        reference
    }

    /// Returns whether no field is set, meaning "use persisted or default".
    pub fn is_empty(&self) -> bool {
        self.day.is_none() && self.section.is_none() && self.range.is_none()
    }

    /// Returns the `(section, sub_unit)` the reference points at, if it
    /// names both a section and a range.
    pub fn unit(&self) -> Option<(u32, u32)> {
        match (self.section, self.range) {
            (Some(section), Some((start, _))) => Some((section, start)),
            _ => None,
        }
    }

    /// Encodes the reference as a query string (without the leading `?`).
    pub fn to_query(&self) -> String {
        let mut parts = Vec::new();
        if let Some(day) = self.day {
            parts.push(format!("day={}", day));
        }
        if let Some(section) = self.section {
            parts.push(format!("section={}", section));
        }
        match self.range {
            Some((start, end)) if start == end => parts.push(format!("range={}", start)),
            Some((start, end)) => parts.push(format!("range={}-{}", start, end)),
            None => {}
        }
        parts.join("&")
    }
}

impl fmt::Display for LocationRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "?{}", self.to_query())
    }
}

fn parse_number(key: &str, value: &str) -> Option<u32> {
    match value.parse() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!("ignoring reference parameter {}='{}'", key, value);
            None
        }
    }
}

fn parse_range(value: &str) -> Option<(u32, u32)> {
    let mut bounds = value.splitn(2, '-');
    let start = parse_number("range", bounds.next().unwrap_or(""))?;
    match bounds.next() {
        None => Some((start, start)),
        Some(end) => {
            let end = parse_number("range", end)?;
            if end < start {
                warn!("ignoring reversed range {}-{}", start, end);
                None
            } else {
                Some((start, end))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_parameters() {
        let r = LocationRef::parse("day=3&section=2&range=204-286");
        assert_eq!(r, LocationRef::new(3, 2, (204, 286)));
        assert_eq!(r.unit(), Some((2, 204)));
    }

    #[test]
    fn single_sub_unit_range() {
        let r = LocationRef::parse("?section=18&range=10");
        assert_eq!(r.range, Some((10, 10)));
        assert_eq!(r.to_query(), "section=18&range=10");
    }

    #[test]
    fn accepts_whole_links() {
        let r = LocationRef::parse("https://example.org/read?day=12#top");
        assert_eq!(r.day, Some(12));
        assert!(r.section.is_none());
    }

    #[test]
    fn garbage_values_are_absent() {
        let r = LocationRef::parse("day=soon&section=-4&range=9-2&colour=red");
        assert!(r.is_empty());
        assert!(LocationRef::parse("").is_empty());
    }

    #[test]
    fn encodes_in_a_fixed_order() {
        let r = LocationRef::new(27, 89, (10, 30));
        assert_eq!(r.to_string(), "?day=27&section=89&range=10-30");
        assert_eq!(LocationRef::parse(&r.to_string()), r);
    }
}
