use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ids::{JobId, RunId};

/// Per-run state the resolution engine reads from: variable bindings for
/// path expansion, the identities used to derive the checkout directory,
/// and the base workspace the node assigned to the owning job.
#[derive(Clone, Debug)]
pub struct RunContext {
    pub job_id: JobId,
    pub run_id: RunId,
    pub node_name: String,
    pub env: HashMap<String, String>,
    /// `None` when the node has no workspace for the job (offline).
    pub base_workspace: Option<PathBuf>,
}

impl RunContext {
    pub fn new(job_id: JobId, node_name: impl Into<String>) -> Self {
        Self {
            job_id,
            run_id: RunId::new(),
            node_name: node_name.into(),
            env: HashMap::new(),
            base_workspace: None,
        }
    }
}

/// How aggressively the consuming execution engine should persist the run
/// built from a resolved script. Consulted once per resolution, purely to
/// tag the result.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum DurabilityHint {
    PerformanceOptimized,
    SurvivableNonatomic,
    MaxSurvivability,
}

impl DurabilityHint {
    pub const GLOBAL_DEFAULT: DurabilityHint = DurabilityHint::MaxSurvivability;
}

pub trait DurabilityHintProvider: Send + Sync {
    /// A hint for the given job, or `None` to defer to other providers.
    fn suggested_for(&self, job: &JobId) -> Option<DurabilityHint>;
}

/// First provider answer wins; the global default backstops.
pub fn durability_for(providers: &[Box<dyn DurabilityHintProvider>], job: &JobId) -> DurabilityHint {
    providers
        .iter()
        .find_map(|p| p.suggested_for(job))
        .unwrap_or(DurabilityHint::GLOBAL_DEFAULT)
}
