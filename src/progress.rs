//! Persisted reading progress: the last day read, and the set of days
//! marked complete.

use std::collections::BTreeSet;

use super::errors::*;
use super::plan::PlanIndex;
use super::store::StateStore;

/// Store key for the last day read.
pub const LAST_DAY_KEY: &str = "lastDay";
/// Store key for the completed days.
pub const COMPLETED_KEY: &str = "completedDays";

/// Reads the last day read. Missing, unreadable and garbage values all
/// come back as `None`.
pub fn load_last_day<S: StateStore + ?Sized>(store: &S) -> Option<u32> {
    let value = match store.get(LAST_DAY_KEY) {
        Ok(Some(v)) => v,
        Ok(None) => return None,
        Err(e) => {
            warn!("could not read last day: {}", e);
            return None;
        }
    };
    match value.trim().parse() {
        Ok(day) => Some(day),
        Err(_) => {
            warn!("ignoring garbage last day '{}'", value);
            None
        }
    }
}

/// Overwrites the last day read.
pub fn save_last_day<S: StateStore + ?Sized>(store: &mut S, day: u32) -> Result<()> {
    store.set(LAST_DAY_KEY, &day.to_string())
}

/// Reads the set of completed days, dropping anything that is not a day
/// of `plan`.
pub fn load_completed<S: StateStore + ?Sized>(store: &S, plan: &PlanIndex) -> BTreeSet<u32> {
    let value = match store.get(COMPLETED_KEY) {
        Ok(Some(v)) => v,
        Ok(None) => return BTreeSet::new(),
        Err(e) => {
            warn!("could not read completed days: {}", e);
            return BTreeSet::new();
        }
    };
    let days: Vec<u32> = match serde_json::from_str(&value) {
        Ok(days) => days,
        Err(e) => {
            warn!("ignoring garbage completed days: {}", e);
            return BTreeSet::new();
        }
    };
    days.into_iter().filter(|&d| d >= 1 && d <= plan.max_day()).collect()
}

fn save_completed<S: StateStore + ?Sized>(store: &mut S, days: &BTreeSet<u32>) -> Result<()> {
    let value = serde_json::to_string(days)
        .chain_err(|| ErrorKind::Json("could not serialize completed days".into()))?;
    store.set(COMPLETED_KEY, &value)
}

/// Marks a day as complete. Returns whether it was newly marked.
pub fn mark_complete<S: StateStore + ?Sized>(store: &mut S, plan: &PlanIndex, day: u32) -> Result<bool> {
    plan.lookup(day)?;
    let mut days = load_completed(&*store, plan);
    if !days.insert(day) {
        return Ok(false);
    }
    save_completed(store, &days)?;
    Ok(true)
}

/// Clears the completion mark of a day. Returns whether it was marked.
pub fn unmark_complete<S: StateStore + ?Sized>(store: &mut S, plan: &PlanIndex, day: u32) -> Result<bool> {
    plan.lookup(day)?;
    let mut days = load_completed(&*store, plan);
    if !days.remove(&day) {
        return Ok(false);
    }
    save_completed(store, &days)?;
    Ok(true)
}

/// A summary of how far through the plan the reader is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    pub completed: BTreeSet<u32>,
    pub total_days: u32,
}

impl Progress {
    pub fn load<S: StateStore + ?Sized>(store: &S, plan: &PlanIndex) -> Progress {
        Progress {
            completed: load_completed(store, plan),
            total_days: plan.max_day(),
        }
    }

    pub fn is_complete(&self, day: u32) -> bool {
        self.completed.contains(&day)
    }

    pub fn completed_count(&self) -> u32 {
        self.completed.len() as u32
    }

    /// Percentage of days completed, rounded down.
    pub fn percent(&self) -> u32 {
        if self.total_days == 0 {
            return 0;
        }
        self.completed_count() * 100 / self.total_days
    }

    /// The first day not yet completed, or `None` once every day is.
    pub fn next_unread(&self) -> Option<u32> {
        (1..=self.total_days).find(|d| !self.completed.contains(d))
    }

    /// The longest run of consecutive completed days.
    pub fn longest_run(&self) -> u32 {
        let mut longest = 0;
        let mut run = 0;
        let mut last = None;
        for &day in &self.completed {
            run = match last {
                Some(l) if l + 1 == day => run + 1,
                _ => 1,
            };
            longest = longest.max(run);
            last = Some(day);
        }
        longest
    }

    /// The run of consecutive completed days ending at the latest one.
    pub fn current_run(&self) -> u32 {
        let mut run = 0;
        let mut expected = None;
        for &day in self.completed.iter().rev() {
            match expected {
                Some(e) if e != day => break,
                _ => {}
            }
            run += 1;
            expected = day.checked_sub(1);
        }
        run
    }
}
