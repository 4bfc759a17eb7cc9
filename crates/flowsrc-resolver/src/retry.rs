use std::path::Path;
use std::time::Duration;

use flowsrc_core::{ResolveError, RunContext};
use flowsrc_scm::{CheckoutError, ScmProvider};
use tracing::{error, info, warn};

/// Retry budget for the materializing checkout. `max_retries` counts
/// attempts after the first one; `backoff` is the fixed wait between
/// attempts.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::from_secs(10),
        }
    }
}

/// Drive the checkout through the bounded retry loop.
///
/// Abort-class and unexpected failures are logged and retried until the
/// budget runs out; cancellation propagates immediately without a retry
/// or a backoff sleep.
pub fn checkout_with_retry(
    scm: &dyn ScmProvider,
    ctx: &RunContext,
    dir: &Path,
    policy: RetryPolicy,
) -> Result<(), ResolveError> {
    let mut remaining = policy.max_retries;
    loop {
        match scm.checkout(ctx, dir) {
            Ok(()) => return Ok(()),
            Err(CheckoutError::Canceled) => return Err(ResolveError::Canceled),
            Err(CheckoutError::Abort { message }) => {
                // the tool may report a failure with no message; skip echoing it
                if let Some(msg) = message {
                    warn!("checkout of {} failed: {msg}", scm.key());
                }
            }
            Err(CheckoutError::Other(e)) => {
                error!("checkout of {} failed: {e:#}", scm.key());
            }
        }

        if remaining == 0 {
            return Err(ResolveError::MaxRetriesExceeded);
        }
        info!("retrying after {} seconds", policy.backoff.as_secs());
        std::thread::sleep(policy.backoff);
        remaining -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowsrc_scm::{CheckoutOutcome, InMemoryScm};
    use flowsrc_core::JobId;
    use tempfile::tempdir;

    fn ctx() -> RunContext {
        RunContext::new(JobId::from_str("job"), "built-in")
    }

    fn fast(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            backoff: Duration::ZERO,
        }
    }

    #[test]
    fn zero_retries_means_one_attempt() {
        let scm = InMemoryScm::new("mem");
        scm.push_outcome(CheckoutOutcome::Abort(None));
        let dir = tempdir().unwrap();

        let err = checkout_with_retry(&scm, &ctx(), dir.path(), fast(0)).unwrap_err();
        assert!(matches!(err, ResolveError::MaxRetriesExceeded));
        assert_eq!(scm.attempts(), 1);
    }

    #[test]
    fn exhausting_the_budget_makes_n_plus_one_attempts() {
        let scm = InMemoryScm::new("mem");
        for _ in 0..10 {
            scm.push_outcome(CheckoutOutcome::Abort(Some("network".into())));
        }
        let dir = tempdir().unwrap();

        let err = checkout_with_retry(&scm, &ctx(), dir.path(), fast(3)).unwrap_err();
        assert!(matches!(err, ResolveError::MaxRetriesExceeded));
        assert_eq!(scm.attempts(), 4);
    }

    #[test]
    fn succeeds_partway_through_the_budget() {
        let scm = InMemoryScm::new("mem").with_file("Jenkinsfile", "echo 'main'");
        scm.push_outcome(CheckoutOutcome::Abort(Some("flaky".into())));
        scm.push_outcome(CheckoutOutcome::Fail("disk hiccup".into()));
        let dir = tempdir().unwrap();

        checkout_with_retry(&scm, &ctx(), dir.path(), fast(3)).unwrap();
        assert_eq!(scm.attempts(), 3);
        assert!(dir.path().join("Jenkinsfile").exists());
    }

    #[test]
    fn cancellation_short_circuits() {
        let scm = InMemoryScm::new("mem");
        scm.push_outcome(CheckoutOutcome::Abort(None));
        scm.push_outcome(CheckoutOutcome::Cancel);
        let dir = tempdir().unwrap();

        let err = checkout_with_retry(&scm, &ctx(), dir.path(), fast(5)).unwrap_err();
        assert!(matches!(err, ResolveError::Canceled));
        // one abort, one cancellation, nothing after
        assert_eq!(scm.attempts(), 2);
    }
}
