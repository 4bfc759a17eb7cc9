use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;

/// Global engine settings, stored as TOML by the host application and
/// handed to the engine explicitly (never read from ambient state).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    pub checkout: CheckoutSettings,
    pub workspace: WorkspaceSettings,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutSettings {
    /// Retries after the first failed attempt. 0 means a single attempt.
    pub retry_count: u32,
    /// Fixed wait between attempts.
    pub retry_backoff_secs: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkspaceSettings {
    /// Separator between a job's workspace name and directories derived
    /// from it.
    pub combinator: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            checkout: CheckoutSettings {
                retry_count: 0,
                retry_backoff_secs: 10,
            },
            workspace: WorkspaceSettings {
                combinator: "@".to_string(),
            },
        }
    }
}

impl Settings {
    pub fn load_from(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))?;
        let settings: Settings = toml::from_str(&s).with_context(|| "parse settings toml")?;
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let s = toml::to_string_pretty(self).with_context(|| "serialize settings")?;
        std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.checkout.retry_count,
            backoff: Duration::from_secs(self.checkout.retry_backoff_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trips_through_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("flowsrc.toml");

        let mut settings = Settings::default();
        settings.checkout.retry_count = 3;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded.checkout.retry_count, 3);
        assert_eq!(loaded.checkout.retry_backoff_secs, 10);
        assert_eq!(loaded.workspace.combinator, "@");
    }

    #[test]
    fn default_is_single_attempt() {
        let policy = Settings::default().retry_policy();
        assert_eq!(policy.max_retries, 0);
        assert_eq!(policy.backoff, Duration::from_secs(10));
    }
}
