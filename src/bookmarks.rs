//! Bookmarked sub-units, persisted as a JSON list.

use chrono::{DateTime, Utc};

use super::errors::*;
use super::plan::PlanIndex;
use super::store::StateStore;

/// Store key for the bookmark list.
pub const BOOKMARKS_KEY: &str = "bookmarks";

/// A single bookmarked sub-unit.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Bookmark {
    /// `{section}-{sub_unit}`; at most one bookmark exists per id.
    pub id: String,
    pub section: u32,
    #[serde(rename = "subUnit")]
    pub sub_unit: u32,
    pub created: DateTime<Utc>,
}

impl Bookmark {
    pub fn new(section: u32, sub_unit: u32, created: DateTime<Utc>) -> Bookmark {
        Bookmark {
            id: bookmark_id(section, sub_unit),
            section: section,
            sub_unit: sub_unit,
            created: created,
        }
    }
}

/// Returns the id of the bookmark for the given sub-unit.
pub fn bookmark_id(section: u32, sub_unit: u32) -> String {
    format!("{}-{}", section, sub_unit)
}

/// Returns all bookmarks, oldest first. Garbage in the store is treated
/// as an empty list.
pub fn list<S: StateStore + ?Sized>(store: &S) -> Vec<Bookmark> {
    let value = match store.get(BOOKMARKS_KEY) {
        Ok(Some(v)) => v,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!("could not read bookmarks: {}", e);
            return Vec::new();
        }
    };
    let mut bookmarks: Vec<Bookmark> = match serde_json::from_str(&value) {
        Ok(b) => b,
        Err(e) => {
            warn!("ignoring garbage bookmarks: {}", e);
            return Vec::new();
        }
    };
    bookmarks.sort_by(|a, b| a.created.cmp(&b.created));
    bookmarks
}

fn save<S: StateStore + ?Sized>(store: &mut S, bookmarks: &[Bookmark]) -> Result<()> {
    let value = serde_json::to_string(bookmarks)
        .chain_err(|| ErrorKind::Json("could not serialize bookmarks".into()))?;
    store.set(BOOKMARKS_KEY, &value)
}

/// Bookmarks a sub-unit of the plan at time `now`. An existing bookmark
/// for the same sub-unit is replaced.
pub fn add<S: StateStore + ?Sized>(
    store: &mut S,
    plan: &PlanIndex,
    section: u32,
    sub_unit: u32,
    now: DateTime<Utc>,
) -> Result<Bookmark> {
    plan.entry_containing(section, sub_unit)?;
    let bookmark = Bookmark::new(section, sub_unit, now);

    let mut bookmarks = list(&*store);
    bookmarks.retain(|b| b.id != bookmark.id);
    bookmarks.push(bookmark.clone());
    save(store, &bookmarks)?;
    Ok(bookmark)
}

/// Removes the bookmark with the given id. Returns whether it existed.
pub fn remove<S: StateStore + ?Sized>(store: &mut S, id: &str) -> Result<bool> {
    let mut bookmarks = list(&*store);
    let before = bookmarks.len();
    bookmarks.retain(|b| b.id != id);
    if bookmarks.len() == before {
        return Ok(false);
    }
    save(store, &bookmarks)?;
    Ok(true)
}

/// Returns whether the given sub-unit is bookmarked.
pub fn is_bookmarked<S: StateStore + ?Sized>(store: &S, section: u32, sub_unit: u32) -> bool {
    let id = bookmark_id(section, sub_unit);
    list(store).iter().any(|b| b.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::SegmentRef;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn plan() -> PlanIndex {
        PlanIndex::from_entries(vec![(
            "day 1".to_owned(),
            vec![SegmentRef::new(1, 1, 7), SegmentRef::new(2, 1, 10)],
        )])
        .unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn add_list_and_remove() {
        let plan = plan();
        let mut store = MemoryStore::new();
        add(&mut store, &plan, 2, 5, at(200)).unwrap();
        add(&mut store, &plan, 1, 7, at(100)).unwrap();

        let ids: Vec<_> = list(&store).into_iter().map(|b| b.id).collect();
        assert_eq!(ids, vec!["1-7", "2-5"]);
        assert!(is_bookmarked(&store, 2, 5));

        assert!(remove(&mut store, "2-5").unwrap());
        assert!(!remove(&mut store, "2-5").unwrap());
        assert!(!is_bookmarked(&store, 2, 5));
    }

    #[test]
    fn re_adding_refreshes_the_timestamp() {
        let plan = plan();
        let mut store = MemoryStore::new();
        add(&mut store, &plan, 1, 1, at(100)).unwrap();
        add(&mut store, &plan, 1, 2, at(200)).unwrap();
        add(&mut store, &plan, 1, 1, at(300)).unwrap();

        let bookmarks = list(&store);
        assert_eq!(bookmarks.len(), 2);
        assert_eq!(bookmarks[1].id, "1-1");
        assert_eq!(bookmarks[1].created, at(300));
    }

    #[test]
    fn units_outside_the_plan_cannot_be_bookmarked() {
        let mut store = MemoryStore::new();
        match add(&mut store, &plan(), 3, 1, at(0)) {
            Err(Error(ErrorKind::NotFound(3, 1), _)) => {}
            other => panic!("unexpected result {:?}", other),
        }
        assert!(list(&store).is_empty());
    }

    #[test]
    fn garbage_is_an_empty_list() {
        let mut store = MemoryStore::new();
        store.set(BOOKMARKS_KEY, "[{\"id\": 4}]").unwrap();
        assert!(list(&store).is_empty());
    }
}
