use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::anyhow;
use flowsrc_core::RunContext;
use flowsrc_scm::{CheckoutError, ScmProvider, ViewError, VirtualView};

/// Git source pinned to one revision. `source` is a clone URL or a local
/// repository path; `rev` is a branch, tag, or commit.
#[derive(Clone, Debug)]
pub struct GitScm {
    pub source: String,
    pub rev: String,
}

impl GitScm {
    pub fn new(source: impl Into<String>, rev: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            rev: rev.into(),
        }
    }

    fn git(dir: &Path, args: &[&str]) -> Result<String, CheckoutError> {
        let out = Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .map_err(|e| {
                if e.kind() == ErrorKind::Interrupted {
                    CheckoutError::Canceled
                } else {
                    CheckoutError::Other(
                        anyhow::Error::new(e).context(format!("spawn git {args:?}")),
                    )
                }
            })?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
            return Err(CheckoutError::Abort {
                message: if stderr.is_empty() { None } else { Some(stderr) },
            });
        }
        Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
    }

    /// Resolve the pinned rev to a commit, trying the local name first and
    /// the remote-tracking name second (freshly cloned repos only have the
    /// latter for branches).
    fn resolve_rev(&self, dir: &Path) -> Result<String, CheckoutError> {
        let local = format!("{}^{{commit}}", self.rev);
        match Self::git(dir, &["rev-parse", "--verify", "--quiet", &local]) {
            Ok(sha) if !sha.is_empty() => return Ok(sha),
            Err(CheckoutError::Canceled) => return Err(CheckoutError::Canceled),
            _ => {}
        }
        let remote = format!("origin/{}^{{commit}}", self.rev);
        Self::git(dir, &["rev-parse", "--verify", &remote])
    }

    /// The repository to serve virtual reads from, if the source is local.
    /// Remote URLs have no object store on this node, so they decline.
    fn local_repo(&self) -> Option<PathBuf> {
        let p = Path::new(&self.source);
        if p.join(".git").exists() || p.join("HEAD").exists() {
            Some(p.to_path_buf())
        } else {
            None
        }
    }
}

impl ScmProvider for GitScm {
    fn key(&self) -> String {
        format!("git {}", self.source)
    }

    fn checkout(&self, _ctx: &RunContext, dir: &Path) -> Result<(), CheckoutError> {
        if dir.join(".git").exists() {
            Self::git(dir, &["fetch", "--tags", "origin"])?;
        } else {
            if let Some(parent) = dir.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| CheckoutError::Other(anyhow!(e)))?;
            }
            let dest = dir.to_string_lossy().to_string();
            let cwd = dir.parent().unwrap_or_else(|| Path::new("."));
            Self::git(cwd, &["clone", "--no-checkout", &self.source, &dest])?;
        }
        let sha = self.resolve_rev(dir)?;
        Self::git(dir, &["checkout", "--force", "--detach", &sha])?;
        Ok(())
    }

    fn open_virtual_view(&self) -> Option<Box<dyn VirtualView>> {
        let repo = self.local_repo()?;
        Some(Box::new(GitVirtualView {
            repo,
            rev: self.rev.clone(),
        }))
    }
}

/// Reads single blobs out of a local repository's object store with
/// `git show`, never touching a working tree.
struct GitVirtualView {
    repo: PathBuf,
    rev: String,
}

impl VirtualView for GitVirtualView {
    fn read_file(&self, path: &str) -> Result<String, ViewError> {
        let spec = format!("{}:{}", self.rev, path);
        let out = Command::new("git")
            .args(["show", &spec])
            .current_dir(&self.repo)
            .output()
            .map_err(|e| ViewError::Other(anyhow::Error::new(e).context("spawn git show")))?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            if stderr.contains("does not exist") || stderr.contains("but not in") {
                return Err(ViewError::NotFound(path.to_string()));
            }
            return Err(ViewError::Other(anyhow!(
                "git show {spec} failed: {}",
                stderr.trim()
            )));
        }
        // Blob content is returned byte-exact; no trimming.
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }
}

/// Initialize a minimal git repo fixture with one commit.
pub fn init_git_repo(dir: &Path, files: &[(&str, &str)]) -> anyhow::Result<()> {
    run(dir, &["git", "init"])?;
    run(dir, &["git", "config", "user.email", "flowsrc@example.com"])?;
    run(dir, &["git", "config", "user.name", "flowsrc"])?;
    for (rel, text) in files {
        let dest = dir.join(rel);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(dest, text)?;
    }
    run(dir, &["git", "add", "."])?;
    run(dir, &["git", "commit", "-m", "init"])?;
    Ok(())
}

fn run(dir: &Path, args: &[&str]) -> anyhow::Result<()> {
    let mut cmd = Command::new(args[0]);
    cmd.args(&args[1..]).current_dir(dir);
    let out = cmd.output().map_err(|e| anyhow!("run {args:?}: {e}"))?;
    if !out.status.success() {
        return Err(anyhow!(
            "command failed: {:?}\nstdout:{}\nstderr:{}",
            args,
            String::from_utf8_lossy(&out.stdout),
            String::from_utf8_lossy(&out.stderr)
        ));
    }
    Ok(())
}
