//! Pipeline context for managing dependencies

use std::sync::Arc;

use crate::agents::DEFAULT_BATCH_SIZE;
use crate::config::AuditConfig;
use crate::detect::{ReportFileAnalyzer, SlitherAnalyzer, StaticAnalyzer};
use crate::llm::LLMClient;

use super::paths::ArtifactPaths;

/// Context that owns all long-lived pipeline dependencies
#[derive(Clone)]
pub struct PipelineContext {
    /// Oracle client shared by every agent
    pub llm_client: Arc<dyn LLMClient>,

    /// Produces the raw findings in the Detect phase
    pub analyzer: Arc<dyn StaticAnalyzer>,

    /// Where artifacts of this run are written
    pub paths: ArtifactPaths,

    /// Findings per verification request
    pub batch_size: usize,
}

impl PipelineContext {
    pub fn new(
        llm_client: Arc<dyn LLMClient>,
        analyzer: Arc<dyn StaticAnalyzer>,
        paths: ArtifactPaths,
    ) -> Self {
        Self {
            llm_client,
            analyzer,
            paths,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Builds the context described by `config`, replaying a saved analyzer report when one is set
    pub fn from_config(config: &AuditConfig, llm_client: Arc<dyn LLMClient>) -> Self {
        let analyzer: Arc<dyn StaticAnalyzer> = match &config.analyzer_output {
            Some(path) => Arc::new(ReportFileAnalyzer::new(path.clone())),
            None => Arc::new(SlitherAnalyzer::new(
                config.analyzer_command.clone(),
                config.solc_select,
            )),
        };

        Self::new(llm_client, analyzer, ArtifactPaths::new(config.output_dir.clone()))
            .with_batch_size(config.batch_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLLMClient;
    use std::path::PathBuf;

    #[test]
    fn test_from_config_selects_analyzer() {
        let mut config = AuditConfig {
            batch_size: 7,
            output_dir: PathBuf::from("out"),
            ..AuditConfig::default()
        };

        let context = PipelineContext::from_config(&config, Arc::new(MockLLMClient::new()));
        assert_eq!(context.analyzer.name(), "slither");
        assert_eq!(context.batch_size, 7);
        assert_eq!(context.paths.root(), PathBuf::from("out").as_path());

        config.analyzer_output = Some(PathBuf::from("slither.json"));
        let context = PipelineContext::from_config(&config, Arc::new(MockLLMClient::new()));
        assert_eq!(context.analyzer.name(), "slither-report");
    }
}
