use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which of the two configured files an error is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileRole {
    Import,
    Script,
}

impl fmt::Display for FileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileRole::Import => write!(f, "import"),
            FileRole::Script => write!(f, "script"),
        }
    }
}

/// Fatal resolution failures surfaced to the caller. None of these are
/// retried; retryable checkout failures are consumed inside the retry
/// loop and only surface here once the budget is exhausted.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A virtual-view read missed. The view cannot say which of the two
    /// configured files was absent, so both are named.
    #[error("unable to find [{main}] or [{import}] from {scm_key}")]
    MissingInView {
        import: String,
        main: String,
        scm_key: String,
    },

    /// A configured path does not exist after a successful checkout.
    #[error("{role} file {} not found", path.display())]
    MissingFile { role: FileRole, path: PathBuf },

    /// A configured path resolves outside the checkout directory.
    #[error("{role} file {} is not inside {}", path.display(), base.display())]
    PathEscape {
        role: FileRole,
        path: PathBuf,
        base: PathBuf,
    },

    #[error("maximum checkout retry attempts reached, aborting")]
    MaxRetriesExceeded,

    /// Interrupted while blocked on checkout I/O. Propagated as-is so the
    /// host stays responsive to cancellation.
    #[error("checkout interrupted")]
    Canceled,

    /// The node has no workspace for the owning job.
    #[error("{node} may be offline")]
    Offline { node: String },

    #[error("read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Scm(#[from] anyhow::Error),
}
