use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use flowsrc_core::{JobId, RunContext};
use flowsrc_resolver::{ResolutionConfig, Resolver, Settings};
use flowsrc_scm_git::GitScm;

#[derive(Parser)]
#[command(name = "flowsrc", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a pipeline script from a git source
    Resolve {
        /// Repository URL or local path
        #[arg(long)]
        repo: String,

        /// Revision to pin (branch, tag, or commit)
        #[arg(long, default_value = "HEAD")]
        rev: String,

        /// Main script path inside the repository
        #[arg(long = "main")]
        main_path: String,

        /// Import file concatenated before the main script
        #[arg(long = "import", default_value = "")]
        import_path: String,

        /// Try the non-materializing read path first
        #[arg(long)]
        lightweight: bool,

        /// Workspace root for full checkouts
        #[arg(long, default_value = "~/.flowsrc/workspaces")]
        workspace_root: String,

        /// Job identity used to derive the checkout directory
        #[arg(long, default_value = "adhoc")]
        job: String,

        /// Engine settings file (defaults apply when absent)
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Emit the resolution as JSON instead of raw script text
        #[arg(long)]
        json: bool,
    },

    /// Validate local tooling (git on PATH)
    Doctor,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Resolve {
            repo,
            rev,
            main_path,
            import_path,
            lightweight,
            workspace_root,
            job,
            settings,
            json,
        } => {
            let settings = match settings {
                Some(path) => Settings::load_from(&path)?,
                None => Settings::default(),
            };

            let scm = Arc::new(GitScm::new(repo, rev));
            let mut cfg = ResolutionConfig::new(scm, &main_path, &import_path);
            cfg.set_lightweight(lightweight);

            let root = PathBuf::from(shellexpand::tilde(&workspace_root).into_owned());
            let mut ctx = RunContext::new(JobId::from_str(job.as_str()), "local");
            ctx.base_workspace = Some(root.join(&job));
            ctx.env = std::env::vars().collect();

            let script = Resolver::new(settings).resolve(&cfg, &ctx)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&script)?);
            } else {
                print!("{}", script.text);
            }
        }
        Command::Doctor => {
            doctor()?;
            println!("OK");
        }
    }

    Ok(())
}

fn doctor() -> anyhow::Result<()> {
    let out = std::process::Command::new("git").arg("--version").output();
    match out {
        Ok(o) if o.status.success() => Ok(()),
        _ => Err(anyhow!("git not found on PATH")),
    }
}
