//! Content lookup for a position, and the display state fed by it.
//!
//! Fetching is a collaborator behind the `ContentSource` trait; any retrying
//! is the source's own business. Navigation never waits for content: each
//! move issues a new `ContentRequest`, and a response is only displayed if
//! its request still matches the current position.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use super::errors::*;
use super::position::Position;

/// The text of a single sub-unit.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Content {
    #[serde(rename = "surahName", default)]
    pub section_name: String,
    #[serde(rename = "ayahNo")]
    pub sub_unit: u32,
    #[serde(rename = "arabic1", default)]
    pub text: String,
    #[serde(rename = "english", default)]
    pub translation: String,
    /// Recitations of the sub-unit, keyed by reciter id.
    #[serde(default)]
    pub audio: BTreeMap<String, AudioRef>,
}

impl Content {
    /// The recitation listed first, if there is any.
    pub fn recitation(&self) -> Option<&AudioRef> {
        self.audio.values().next()
    }
}

/// Where a recitation of a sub-unit can be found. Only the location is
/// carried; playing it is up to the caller.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AudioRef {
    #[serde(default)]
    pub reciter: String,
    pub url: String,
}

/// Something able to look up the content of a sub-unit.
pub trait ContentSource {
    fn fetch(&mut self, section: u32, sub_unit: u32) -> Result<Content>;
}

/// Reads content from a directory laid out as `{section}/{sub_unit}.json`.
#[derive(Clone, Debug)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new<P: AsRef<Path>>(root: P) -> DirectorySource {
        DirectorySource {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl ContentSource for DirectorySource {
    fn fetch(&mut self, section: u32, sub_unit: u32) -> Result<Content> {
        let mut filename = self.root.clone();
        filename.push(section.to_string());
        filename.push(sub_unit.to_string());
        filename.set_extension("json");

        let f = File::open(&filename).chain_err(|| {
            ErrorKind::ContentFetch(format!("could not open '{}'", filename.display()))
        })?;
        serde_json::from_reader(f).chain_err(|| {
            ErrorKind::ContentFetch(format!("could not parse '{}'", filename.display()))
        })
    }
}

/// A source with nothing in it, for sessions without content.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoContent;

impl ContentSource for NoContent {
    fn fetch(&mut self, section: u32, sub_unit: u32) -> Result<Content> {
        Err(ErrorKind::ContentFetch(format!("no content source for {}:{}", section, sub_unit)).into())
    }
}

/// A pending lookup, issued whenever the position changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentRequest {
    /// The position that was current when the request was issued.
    pub position: Position,
    /// The section to fetch; usually `position.section`.
    pub section: u32,
    /// The sub-unit to fetch; usually `position.sub_unit`.
    pub sub_unit: u32,
}

impl ContentRequest {
    pub fn for_position(position: Position) -> ContentRequest {
        ContentRequest {
            position: position,
            section: position.section,
            sub_unit: position.sub_unit,
        }
    }

    /// Fetches the requested content from `source`.
    pub fn fetch<C: ContentSource + ?Sized>(&self, source: &mut C) -> Result<Content> {
        source.fetch(self.section, self.sub_unit)
    }
}

/// What is currently shown for the position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisplayState {
    /// Nothing requested yet.
    Empty,
    /// Waiting for content; this is not an error.
    Pending(ContentRequest),
    Ready(Content),
    Failed(String),
}

impl DisplayState {
    pub fn content(&self) -> Option<&Content> {
        match *self {
            DisplayState::Ready(ref c) => Some(c),
            _ => None,
        }
    }
}
