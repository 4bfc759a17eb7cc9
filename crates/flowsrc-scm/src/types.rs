use std::path::Path;

use flowsrc_core::RunContext;
use thiserror::Error;

/// How a single checkout attempt failed. The retry loop treats each
/// variant differently: `Abort` and `Other` are retried, `Canceled`
/// propagates immediately.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Expected, tool-reported failure. The message, when present, is
    /// relayed to the run log before the next attempt.
    #[error("checkout aborted")]
    Abort { message: Option<String> },

    /// Interrupted while blocked on I/O.
    #[error("checkout interrupted")]
    Canceled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("no such file in revision: {0}")]
    NotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Read-only, non-materializing access to file contents at the pinned
/// revision. Resources are freed on drop.
pub trait VirtualView {
    fn read_file(&self, path: &str) -> Result<String, ViewError>;
}

/// A source-control location pinned to one revision. Immutable once
/// constructed; shared across concurrent resolutions.
pub trait ScmProvider: Send + Sync {
    /// Stable human-readable key used in log and error messages.
    fn key(&self) -> String;

    /// Materialize the pinned revision into `dir`. Idempotent enough to
    /// be safely retried against the same directory.
    fn checkout(&self, ctx: &RunContext, dir: &Path) -> Result<(), CheckoutError>;

    /// Probe for non-materializing read support. `None` means this source
    /// cannot serve individual files without a full checkout; the caller
    /// is expected to fall back.
    fn open_virtual_view(&self) -> Option<Box<dyn VirtualView>>;
}
