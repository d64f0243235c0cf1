use super::paths::ArtifactPaths;
use super::run::PipelineRun;
use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// Everything a downstream task needs; owned so it can move into a spawned task
#[derive(Debug, Clone)]
pub struct StageInput {
    pub run: PipelineRun,
    pub source: Arc<str>,
    pub paths: ArtifactPaths,
}

impl StageInput {
    pub fn contract_name(&self) -> String {
        self.run.contract_name()
    }
}

/// A remediation or reporting step that consumes gated artifacts
///
/// Returns the files it wrote. An empty list with `Ok` means the task had nothing to do.
#[async_trait]
pub trait StageTask: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, input: StageInput) -> Result<Vec<PathBuf>>;
}
