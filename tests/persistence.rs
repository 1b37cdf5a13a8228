extern crate dayreader;
extern crate tempfile;

use dayreader::errors::*;
use dayreader::progress;
use dayreader::store::{FileStore, StateStore};
use dayreader::{LocationRef, PlanIndex, Position, Session};
use tempfile::TempDir;

fn open(dir: &TempDir, reference: Option<&str>) -> Session<FileStore> {
    let store = FileStore::open(dir.path()).unwrap();
    Session::start(PlanIndex::builtin().unwrap(), store, reference.map(LocationRef::parse))
}

#[test]
fn next_session_resumes_at_the_start_of_the_last_day() {
    let tmp = TempDir::new().expect("tempdir");
    {
        let mut session = open(&tmp, None);
        session.jump_to_day(4).unwrap();
        session.next_by(20);
        assert_eq!(session.position().day, 4);
    }

    let session = open(&tmp, None);
    let start = session.plan().day_start(4).unwrap();
    assert_eq!(session.position(), start);
    assert_eq!(session.reference().day, Some(4));
}

#[test]
fn inbound_reference_overrides_and_is_persisted() {
    let tmp = TempDir::new().expect("tempdir");
    {
        let mut session = open(&tmp, None);
        session.jump_to_day(5).unwrap();
    }
    {
        let session = open(&tmp, Some("https://example.org/read?day=10"));
        assert_eq!(session.position().day, 10);
    }
    let store = FileStore::open(tmp.path()).unwrap();
    assert_eq!(progress::load_last_day(&store), Some(10));
}

#[test]
fn garbage_persisted_day_starts_at_day_one() {
    let tmp = TempDir::new().expect("tempdir");
    {
        let mut store = FileStore::open(tmp.path()).unwrap();
        store.set(progress::LAST_DAY_KEY, "yesterday").unwrap();
        store.set(progress::COMPLETED_KEY, "[[[").unwrap();
    }
    let session = open(&tmp, None);
    assert_eq!(session.position(), Position::new(1, 1, 1));
    assert_eq!(session.progress().completed_count(), 0);
}

#[test]
fn out_of_range_persisted_day_starts_at_day_one() {
    let tmp = TempDir::new().expect("tempdir");
    {
        let mut store = FileStore::open(tmp.path()).unwrap();
        progress::save_last_day(&mut store, 28).unwrap();
    }
    assert_eq!(open(&tmp, None).position(), Position::new(1, 1, 1));
}

/// Refuses every write, as a full disk or read-only profile would.
struct ReadOnly(FileStore);

impl StateStore for ReadOnly {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.0.get(key)
    }

    fn set(&mut self, key: &str, _: &str) -> Result<()> {
        Err(ErrorKind::PersistenceWrite(key.into()).into())
    }
}

#[test]
fn navigation_continues_without_durable_storage() {
    let tmp = TempDir::new().expect("tempdir");
    {
        let mut store = FileStore::open(tmp.path()).unwrap();
        progress::save_last_day(&mut store, 3).unwrap();
    }

    let store = ReadOnly(FileStore::open(tmp.path()).unwrap());
    let mut session = Session::start(PlanIndex::builtin().unwrap(), store, Some(LocationRef::parse("day=6")));
    assert!(!session.is_durable());
    assert_eq!(session.position().day, 6);

    let before = session.position();
    assert_ne!(session.next(), before);
    assert_eq!(session.reference().day, Some(6));
    assert!(session.mark_complete(6).is_err());

    let store = FileStore::open(tmp.path()).unwrap();
    assert_eq!(progress::load_last_day(&store), Some(3));
}

#[test]
fn completion_and_bookmarks_survive_sessions() {
    let tmp = TempDir::new().expect("tempdir");
    {
        let mut session = open(&tmp, None);
        session.mark_complete(1).unwrap();
        session.mark_complete(2).unwrap();
        session.jump_to_unit(2, 255).unwrap();
        session.bookmark_current().unwrap();
    }

    let session = open(&tmp, None);
    let progress = session.progress();
    assert_eq!(progress.completed_count(), 2);
    assert_eq!(progress.next_unread(), Some(3));
    let ids: Vec<String> = session.bookmarks().into_iter().map(|b| b.id).collect();
    assert_eq!(ids, vec!["2-255".to_owned()]);
}
