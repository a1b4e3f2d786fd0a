use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::error::{Error, Result};

pub const LOCK_FILE: &str = ".tourinfo.lock";

/// Marks this process as the running instance for as long as it is held.
///
/// The lock file holds the owner's PID and is removed when the guard drops,
/// whether the holder returns normally, bails out with an error or is
/// interrupted and unwinds its scope. A process killed outright leaves the
/// file behind; delete it by hand in that case.
#[derive(Debug)]
pub struct InstanceLock {
    path: PathBuf,
}

impl InstanceLock {
    /// `Ok(None)` when another instance already holds the lock.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Option<Self>> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "Instance lock already held");
                return Ok(None);
            }
            Err(e) => return Err(Error::io(path, e)),
        };

        // Own the file before writing so a failed write still cleans up.
        let lock = Self { path };
        writeln!(file, "{}", std::process::id()).map_err(|e| Error::io(&lock.path, e))?;
        debug!(path = %lock.path.display(), "Instance lock acquired");
        Ok(Some(lock))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Instance lock released"),
            Err(e) => warn!(path = %self.path.display(), "Failed to remove lock file: {e}"),
        }
    }
}
