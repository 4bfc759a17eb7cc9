use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex};

/// Process-wide registry of workspace directories claimed by an ongoing
/// checkout. At most one lease exists per directory; `acquire` blocks
/// until the current holder releases. Fairness between waiters is
/// whatever the condvar wakes.
#[derive(Clone, Default)]
pub struct WorkspaceLocks {
    inner: Arc<LockState>,
}

#[derive(Default)]
struct LockState {
    held: Mutex<HashSet<PathBuf>>,
    freed: Condvar,
}

impl WorkspaceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, dir: PathBuf) -> WorkspaceLease {
        let mut held = self.inner.held.lock().unwrap();
        while held.contains(&dir) {
            held = self.inner.freed.wait(held).unwrap();
        }
        held.insert(dir.clone());
        WorkspaceLease {
            dir,
            locks: Arc::clone(&self.inner),
            released: false,
        }
    }
}

/// Exclusive claim on one workspace directory. Released on drop; an
/// explicit `release` is idempotent.
pub struct WorkspaceLease {
    dir: PathBuf,
    locks: Arc<LockState>,
    released: bool,
}

impl WorkspaceLease {
    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let mut held = self.locks.held.lock().unwrap();
        held.remove(&self.dir);
        self.locks.freed.notify_all();
    }
}

impl Drop for WorkspaceLease {
    fn drop(&mut self) {
        self.release();
    }
}
