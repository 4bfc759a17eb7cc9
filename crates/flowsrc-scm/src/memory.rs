use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use anyhow::anyhow;
use flowsrc_core::RunContext;

use crate::types::{CheckoutError, ScmProvider, ViewError, VirtualView};

/// Scripted outcome for one checkout attempt.
#[derive(Clone, Debug)]
pub enum CheckoutOutcome {
    Succeed,
    Abort(Option<String>),
    Cancel,
    Fail(String),
}

/// In-memory provider for engine tests: a fixed set of revision files,
/// an optional virtual view over them, and a queue of scripted checkout
/// outcomes. Once the queue is drained, checkouts succeed.
pub struct InMemoryScm {
    key: String,
    files: HashMap<String, String>,
    view_supported: bool,
    outcomes: Mutex<VecDeque<CheckoutOutcome>>,
    attempts: AtomicU32,
}

impl InMemoryScm {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            files: HashMap::new(),
            view_supported: true,
            outcomes: Mutex::new(VecDeque::new()),
            attempts: AtomicU32::new(0),
        }
    }

    pub fn with_file(mut self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.files.insert(path.into(), text.into());
        self
    }

    pub fn with_virtual_view(mut self, supported: bool) -> Self {
        self.view_supported = supported;
        self
    }

    /// Queue an outcome for the next checkout attempt.
    pub fn push_outcome(&self, outcome: CheckoutOutcome) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    /// Checkout attempts observed so far.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    fn materialize(&self, dir: &Path) -> Result<(), CheckoutError> {
        for (rel, text) in &self.files {
            let dest = dir.join(rel);
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| CheckoutError::Other(anyhow!(e)))?;
            }
            std::fs::write(&dest, text).map_err(|e| CheckoutError::Other(anyhow!(e)))?;
        }
        Ok(())
    }
}

impl ScmProvider for InMemoryScm {
    fn key(&self) -> String {
        self.key.clone()
    }

    fn checkout(&self, _ctx: &RunContext, dir: &Path) -> Result<(), CheckoutError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let next = self.outcomes.lock().unwrap().pop_front();
        match next {
            None | Some(CheckoutOutcome::Succeed) => self.materialize(dir),
            Some(CheckoutOutcome::Abort(message)) => Err(CheckoutError::Abort { message }),
            Some(CheckoutOutcome::Cancel) => Err(CheckoutError::Canceled),
            Some(CheckoutOutcome::Fail(reason)) => Err(CheckoutError::Other(anyhow!(reason))),
        }
    }

    fn open_virtual_view(&self) -> Option<Box<dyn VirtualView>> {
        if !self.view_supported {
            return None;
        }
        Some(Box::new(MapView {
            files: self.files.clone(),
        }))
    }
}

struct MapView {
    files: HashMap<String, String>,
}

impl VirtualView for MapView {
    fn read_file(&self, path: &str) -> Result<String, ViewError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| ViewError::NotFound(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowsrc_core::JobId;
    use tempfile::tempdir;

    #[test]
    fn materializes_files_on_checkout() {
        let scm = InMemoryScm::new("mem test").with_file("ci/lib.groovy", "echo 'lib'");
        let ctx = RunContext::new(JobId::from_str("job"), "built-in");
        let dir = tempdir().unwrap();

        scm.checkout(&ctx, dir.path()).unwrap();
        let text = std::fs::read_to_string(dir.path().join("ci/lib.groovy")).unwrap();
        assert_eq!(text, "echo 'lib'");
        assert_eq!(scm.attempts(), 1);
    }

    #[test]
    fn scripted_outcomes_drain_in_order() {
        let scm = InMemoryScm::new("mem test");
        scm.push_outcome(CheckoutOutcome::Abort(Some("flaky".into())));
        scm.push_outcome(CheckoutOutcome::Cancel);
        let ctx = RunContext::new(JobId::from_str("job"), "built-in");
        let dir = tempdir().unwrap();

        assert!(matches!(
            scm.checkout(&ctx, dir.path()),
            Err(CheckoutError::Abort { .. })
        ));
        assert!(matches!(
            scm.checkout(&ctx, dir.path()),
            Err(CheckoutError::Canceled)
        ));
        scm.checkout(&ctx, dir.path()).unwrap();
        assert_eq!(scm.attempts(), 3);
    }

    #[test]
    fn view_reads_and_misses() {
        let scm = InMemoryScm::new("mem test").with_file("Jenkinsfile", "echo 'main'");
        let view = scm.open_virtual_view().unwrap();
        assert_eq!(view.read_file("Jenkinsfile").unwrap(), "echo 'main'");
        assert!(matches!(
            view.read_file("missing"),
            Err(ViewError::NotFound(_))
        ));

        let no_view = InMemoryScm::new("mem test").with_virtual_view(false);
        assert!(no_view.open_virtual_view().is_none());
    }
}
