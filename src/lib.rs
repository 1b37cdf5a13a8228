// For `error_chain!`
#![recursion_limit = "1024"]

#[macro_use]
extern crate serde_derive;

extern crate chrono;
extern crate serde;
extern crate serde_json;

#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

extern crate app_dirs;

pub mod errors {
    error_chain! {
        errors {
            /// A day number outside `[1, max_day]` was requested.
            OutOfRange(day: u32, max_day: u32) {
                description("day out of range")
                display("day {} is out of range (the plan has days 1 to {})", day, max_day)
            }
            /// No day of the plan covers the requested sub-unit.
            NotFound(section: u32, sub_unit: u32) {
                description("position not found in plan")
                display("section {} sub-unit {} is not part of the plan", section, sub_unit)
            }
            /// A position names a section (or sub-unit) absent from its
            /// own day's entry.
            InconsistentPosition(day: u32, section: u32, sub_unit: u32) {
                description("inconsistent position")
                display("position day {} section {} sub-unit {} does not belong to its day",
                        day, section, sub_unit)
            }
            /// A persisted value could not be written (includes the key).
            PersistenceWrite(key: String) {
                description("persistence write failure")
                display("could not persist '{}'", key)
            }
            /// Content for a position could not be fetched.
            ContentFetch(t: String) {
                description("content fetch failure")
                display("could not fetch content: {}", t)
            }
            /// The plan table is malformed.
            PlanFormat(t: String) {
                description("plan format error")
                display("plan format error: {}", t)
            }
            /// The user's data directory could not be found or deduced.
            CannotLocateData {
                description("cannot locate data directory")
            }
            /// An IO error (usually caused by `std::io::Error`).
            Io(t: String) {
                description("io error")
                display("{}", t)
            }
            /// A JSON error (usually caused by `serde_json::Error`).
            Json(t: String) {
                description("json error")
                display("{}", t)
            }
        }
    }
}

pub use errors::*;

pub mod bookmarks;
pub mod config;
pub mod content;
pub mod navigate;
pub mod plan;
pub mod position;
pub mod progress;
pub mod reference;
pub mod session;
pub mod store;
pub mod sync;
pub mod timer;

pub use plan::{PlanEntry, PlanIndex, SegmentRef};
pub use position::{Hints, Position, Resolution};
pub use reference::LocationRef;
pub use session::Session;
