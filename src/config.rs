//! This module decides where things live: the state directory (found with
//! the `app_dirs` crate, which returns a path based on the operating
//! system), the plan table, and the optional content directory.

use std::fs::File;
use std::path::PathBuf;

use app_dirs::{self, AppDataType, AppDirsError, AppInfo};

use super::content::{ContentSource, DirectorySource, NoContent};
use super::errors::*;
use super::plan::PlanIndex;
use super::store::FileStore;

/// The information for app_dirs
const APP_INFO: AppInfo = AppInfo {
    name: "dayreader",
    author: "Ian Johnson",
};

/// Where the session's collaborators come from.
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// Overrides the platform state directory.
    pub data_dir: Option<PathBuf>,
    /// Replaces the bundled plan.
    pub plan_file: Option<PathBuf>,
    /// Offline content, laid out as `{section}/{sub_unit}.json`.
    pub content_dir: Option<PathBuf>,
}

impl Config {
    /// Returns the state directory, without creating it.
    pub fn state_dir(&self) -> Result<PathBuf> {
        match self.data_dir {
            Some(ref dir) => Ok(dir.clone()),
            None => default_state_dir(),
        }
    }

    /// Opens the state store, creating its directory if needed.
    pub fn open_store(&self) -> Result<FileStore> {
        let dir = self.state_dir()?;
        FileStore::open(&dir).chain_err(|| "could not open state store")
    }

    /// Loads the configured plan, or the bundled one.
    pub fn load_plan(&self) -> Result<PlanIndex> {
        match self.plan_file {
            Some(ref path) => {
                let f = File::open(path)
                    .chain_err(|| ErrorKind::Io(format!("could not open plan file '{}'", path.display())))?;
                PlanIndex::from_json(f).chain_err(|| format!("could not load plan '{}'", path.display()))
            }
            None => PlanIndex::builtin(),
        }
    }

    /// Returns the configured content source.
    pub fn content_source(&self) -> Box<dyn ContentSource> {
        match self.content_dir {
            Some(ref dir) => Box::new(DirectorySource::new(dir)),
            None => Box::new(NoContent),
        }
    }
}

/// Returns the platform location of the state directory.
pub fn default_state_dir() -> Result<PathBuf> {
    match app_dirs::get_app_dir(AppDataType::UserData, &APP_INFO, "state") {
        Ok(p) => Ok(p),
        Err(AppDirsError::NotSupported) => Err(ErrorKind::CannotLocateData.into()),
        Err(AppDirsError::Io(e)) => Err(e).chain_err(|| ErrorKind::Io("could not find state directory".into())),
        // This should properly be a panic, since there really isn't any way
        // this can happen (unless `app_dirs` changes in a breaking way).
        Err(AppDirsError::InvalidAppInfo) => panic!("invalid app info"),
    }
}
