use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;

use flowsrc_core::{
    assemble, durability_for, ensure_contained, expand, DurabilityHint, DurabilityHintProvider,
    FileRole, ResolveError, RunContext,
};
use flowsrc_scm::ScmProvider;

use crate::lease::WorkspaceLocks;
use crate::lightweight::try_lightweight;
use crate::retry::checkout_with_retry;
use crate::settings::Settings;

/// A pipeline definition whose script lives in source control: an
/// optional import file concatenated before the main script file.
#[derive(Clone)]
pub struct ResolutionConfig {
    scm: Arc<dyn ScmProvider>,
    main_path: String,
    import_path: String,
    lightweight: bool,
}

impl ResolutionConfig {
    /// Paths are trimmed at construction; an empty path means "not
    /// configured", not an error.
    pub fn new(scm: Arc<dyn ScmProvider>, main_path: &str, import_path: &str) -> Self {
        Self {
            scm,
            main_path: main_path.trim().to_string(),
            import_path: import_path.trim().to_string(),
            lightweight: false,
        }
    }

    /// The only field settable after construction; must be set before
    /// resolution begins.
    pub fn set_lightweight(&mut self, lightweight: bool) {
        self.lightweight = lightweight;
    }

    pub fn scm(&self) -> &dyn ScmProvider {
        self.scm.as_ref()
    }

    pub fn main_path(&self) -> &str {
        &self.main_path
    }

    pub fn import_path(&self) -> &str {
        &self.import_path
    }

    pub fn lightweight(&self) -> bool {
        self.lightweight
    }
}

/// The sole output of a resolution. `checkout_dir` is present only when a
/// full checkout materialized the workspace, so callers can record
/// provenance; the text itself is identical on both paths.
#[derive(Clone, Debug, Serialize)]
pub struct ResolvedScript {
    pub text: String,
    /// sha256 of `text`, hex-encoded.
    pub digest: String,
    pub checkout_dir: Option<PathBuf>,
    pub durability: DurabilityHint,
}

/// Orchestrates the whole resolution: path expansion, the lightweight
/// fast path, and the leased full-checkout fallback.
pub struct Resolver {
    locks: WorkspaceLocks,
    settings: Settings,
    hint_providers: Vec<Box<dyn DurabilityHintProvider>>,
}

impl Resolver {
    pub fn new(settings: Settings) -> Self {
        Self {
            locks: WorkspaceLocks::new(),
            settings,
            hint_providers: Vec::new(),
        }
    }

    pub fn with_hint_provider(mut self, provider: Box<dyn DurabilityHintProvider>) -> Self {
        self.hint_providers.push(provider);
        self
    }

    pub fn resolve(
        &self,
        cfg: &ResolutionConfig,
        ctx: &RunContext,
    ) -> Result<ResolvedScript, ResolveError> {
        let main_path = expand(cfg.main_path(), &ctx.env);
        let import_path = expand(cfg.import_path(), &ctx.env);
        let durability = durability_for(&self.hint_providers, &ctx.job_id);

        if cfg.lightweight() {
            if let Some(text) = try_lightweight(cfg.scm(), &import_path, &main_path)? {
                return Ok(finish(text, None, durability));
            }
        }

        let base = ctx
            .base_workspace
            .clone()
            .ok_or_else(|| ResolveError::Offline {
                node: ctx.node_name.clone(),
            })?;
        let dir = script_workspace(&base, &self.settings.workspace.combinator);
        info!(
            "checking out {} into {} to read {}",
            cfg.scm().key(),
            dir.display(),
            main_path
        );

        let mut lease = self.locks.acquire(dir.clone());
        let outcome = self.checkout_and_read(cfg, ctx, &dir, &import_path, &main_path);
        lease.release();

        let text = outcome?;
        Ok(finish(text, Some(dir), durability))
    }

    fn checkout_and_read(
        &self,
        cfg: &ResolutionConfig,
        ctx: &RunContext,
        dir: &Path,
        import_path: &str,
        main_path: &str,
    ) -> Result<String, ResolveError> {
        checkout_with_retry(cfg.scm(), ctx, dir, self.settings.retry_policy())?;

        let mut import_text = None;
        if !import_path.is_empty() {
            import_text = Some(read_contained(dir, import_path, FileRole::Import)?);
        }
        let mut main_text = None;
        if !main_path.is_empty() {
            main_text = Some(read_contained(dir, main_path, FileRole::Script)?);
        }
        Ok(assemble(import_text.as_deref(), main_text.as_deref()))
    }
}

/// The directory a job's script checkout materializes into: the job's
/// base workspace name plus `<combinator>script`, alongside the base.
pub fn script_workspace(base: &Path, combinator: &str) -> PathBuf {
    let name = base
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    base.with_file_name(format!("{name}{combinator}script"))
}

fn read_contained(dir: &Path, rel: &str, role: FileRole) -> Result<String, ResolveError> {
    let path = ensure_contained(dir, rel, role)?;
    if !path.exists() {
        // Absent after a successful checkout: a misconfigured path, not a
        // transient fault, so it is not retried.
        return Err(ResolveError::MissingFile { role, path });
    }
    std::fs::read_to_string(&path).map_err(|source| ResolveError::Io { path, source })
}

fn finish(text: String, checkout_dir: Option<PathBuf>, durability: DurabilityHint) -> ResolvedScript {
    let digest = hex::encode(Sha256::digest(text.as_bytes()));
    ResolvedScript {
        text,
        digest,
        checkout_dir,
        durability,
    }
}
