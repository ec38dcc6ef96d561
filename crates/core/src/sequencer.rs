//! Persisted, lock-protected version counter
//!
//! The counter file holds the next ordinal to hand out. Every `next()` call
//! takes an exclusive lock on a sibling lock file, reads the counter, writes
//! `value + 1` with an atomic rename and only then releases the lock, so
//! concurrent callers in any process receive distinct values.

use crate::error::{VersionError, VersionResult};
use crate::store::{atomic_write, StoreLayout};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Allocates version ordinals for one storage root.
#[derive(Debug, Clone)]
pub struct Sequencer {
    counter_path: PathBuf,
    lock_path: PathBuf,
}

impl Sequencer {
    /// Sequencer for a storage layout
    pub fn new(layout: &StoreLayout) -> Self {
        Self::at(layout.sequencer_path(), layout.sequencer_lock_path())
    }

    /// Sequencer with explicit counter and lock paths
    pub fn at(counter_path: impl Into<PathBuf>, lock_path: impl Into<PathBuf>) -> Self {
        Self {
            counter_path: counter_path.into(),
            lock_path: lock_path.into(),
        }
    }

    /// Path of the counter file
    pub fn counter_path(&self) -> &Path {
        &self.counter_path
    }

    /// Allocate the next ordinal and persist its successor.
    ///
    /// An absent or unparsable counter starts at 1.
    pub fn next(&self) -> VersionResult<u64> {
        if let Some(parent) = self.counter_path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.error(e))?;
        }

        let _lock = SequencerLock::acquire(&self.lock_path).map_err(|e| self.error(e))?;

        let value = self.read_counter().map_err(|e| self.error(e))?;
        let successor = value
            .checked_add(1)
            .ok_or_else(|| self.error(io::Error::new(io::ErrorKind::Other, "counter overflow")))?;

        atomic_write(&self.counter_path, format!("{}\n", successor).as_bytes())
            .map_err(|e| self.error(e))?;

        debug!(value, "Allocated version ordinal");
        Ok(value)
    }

    /// Read the next ordinal without allocating it.
    pub fn peek(&self) -> VersionResult<u64> {
        self.read_counter().map_err(|e| self.error(e))
    }

    fn read_counter(&self) -> io::Result<u64> {
        let raw = match fs::read_to_string(&self.counter_path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(1),
            Err(e) => return Err(e),
        };

        match raw.trim().parse::<u64>() {
            Ok(value) => Ok(value.max(1)),
            Err(_) => {
                warn!(
                    path = %self.counter_path.display(),
                    contents = raw.trim(),
                    "Unparsable version counter, restarting at 1"
                );
                Ok(1)
            }
        }
    }

    fn error(&self, source: io::Error) -> VersionError {
        VersionError::Sequencer {
            path: self.counter_path.clone(),
            source,
        }
    }
}

/// Exclusive lock held for the duration of one allocation.
struct SequencerLock {
    #[allow(dead_code)]
    file: File,
    #[cfg(not(unix))]
    path: PathBuf,
}

impl SequencerLock {
    /// Block until the exclusive lock on `path` is held.
    #[cfg(unix)]
    fn acquire(path: &Path) -> io::Result<Self> {
        use nix::fcntl::{flock, FlockArg};
        use std::os::unix::io::AsRawFd;

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;

        loop {
            match flock(file.as_raw_fd(), FlockArg::LockExclusive) {
                Ok(()) => return Ok(Self { file }),
                Err(nix::errno::Errno::EINTR) => continue,
                Err(e) => return Err(io::Error::from(e)),
            }
        }
    }

    /// Spin on create-new of the lock file until it succeeds.
    #[cfg(not(unix))]
    fn acquire(path: &Path) -> io::Result<Self> {
        use std::time::{Duration, Instant};

        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(file) => {
                    return Ok(Self {
                        file,
                        path: path.to_path_buf(),
                    })
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    if Instant::now() >= deadline {
                        return Err(io::Error::new(
                            io::ErrorKind::WouldBlock,
                            format!("sequencer lock held too long: {}", path.display()),
                        ));
                    }
                    std::thread::sleep(Duration::from_millis(5));
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(not(unix))]
impl Drop for SequencerLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
