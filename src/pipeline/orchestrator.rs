use super::context::PipelineContext;
use super::run::{
    PhaseOutcome, PhaseTransitionError, PipelineRun, Phase, RunOutcome, RunSummary, TaskOutcome,
};
use super::task::{StageInput, StageTask};
use crate::agents::{BatchVerifier, DeepAuditOutcome, DeepAuditor, ExploitTask, RefactorTask, VerificationOutcome};
use crate::detect::DetectError;
use crate::findings::{write_json, ArtifactError, DetectorReport};
use crate::gate::{GateError, GateStats, Gatekeeper};
use crate::progress::{ProgressEvent, ProgressHandler};
use crate::report::MarkdownReportTask;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinError;
use tracing::{debug, info, warn};

/// Drives one audit run through Detect, Analysis, Gate, Remediation and Report
///
/// Only Detect can abort a run. Every later phase records its sub-task outcomes and the
/// run always proceeds to the next phase.
pub struct AuditPipeline {
    context: PipelineContext,
    refactor: Arc<dyn StageTask>,
    exploit: Arc<dyn StageTask>,
    report: Arc<dyn StageTask>,
    progress_handler: Option<Arc<dyn ProgressHandler>>,
}

impl AuditPipeline {
    pub fn new(context: PipelineContext) -> Self {
        let client = context.llm_client.clone();
        Self {
            context,
            refactor: Arc::new(RefactorTask::new(client.clone())),
            exploit: Arc::new(ExploitTask::new(client)),
            report: Arc::new(MarkdownReportTask),
            progress_handler: None,
        }
    }

    pub fn with_refactor_task(mut self, task: Arc<dyn StageTask>) -> Self {
        self.refactor = task;
        self
    }

    pub fn with_exploit_task(mut self, task: Arc<dyn StageTask>) -> Self {
        self.exploit = task;
        self
    }

    pub fn with_report_task(mut self, task: Arc<dyn StageTask>) -> Self {
        self.report = task;
        self
    }

    pub fn with_progress_handler(mut self, handler: Arc<dyn ProgressHandler>) -> Self {
        self.progress_handler = Some(handler);
        self
    }

    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    pub async fn run(&self, contract: &Path) -> Result<RunSummary, PhaseTransitionError> {
        let start = Instant::now();
        info!("Starting audit pipeline for: {}", contract.display());
        self.emit(ProgressEvent::Started {
            contract: contract.to_path_buf(),
        });

        let paths = &self.context.paths;
        self.emit(ProgressEvent::PhaseStarted {
            phase: Phase::Detect,
        });
        let phase_start = Instant::now();

        match paths.clear_stale() {
            Ok(0) => {}
            Ok(n) => debug!("Removed {} stale artifacts", n),
            Err(source) => {
                let error = DetectError::StaleArtifacts {
                    root: paths.root().to_path_buf(),
                    source,
                };
                return Ok(self.abort(PipelineRun::start(contract, ""), error, start));
            }
        }

        let source = match read_contract(contract).await {
            Ok(source) => source,
            Err(e) => {
                let run = PipelineRun::start(contract, "");
                return Ok(self.abort(run, e, start));
            }
        };
        let run = PipelineRun::start(contract, &source);
        let source: Arc<str> = Arc::from(source);

        let findings = match self.detect(&run, contract, &source).await {
            Ok(count) => count,
            Err(e) => return Ok(self.abort(run, e, start)),
        };

        let mut phases = vec![PhaseOutcome::Detect {
            outcome: TaskOutcome::succeeded(format!("{} analyzer findings", findings)),
            findings,
        }];
        let mut artifacts = vec![paths.detector_report()];
        self.finish_phase(Phase::Detect, &phases, phase_start);

        let run = run.advance(Phase::Analysis)?;
        let phase_start = self.begin_phase(Phase::Analysis);
        phases.push(self.analysis(&run, &source).await);
        artifacts.extend([paths.static_report(), paths.logic_report()].into_iter().filter(|p| p.exists()));
        self.finish_phase(Phase::Analysis, &phases, phase_start);

        let run = run.advance(Phase::Gate)?;
        let phase_start = self.begin_phase(Phase::Gate);
        phases.push(self.gate(&source));
        self.finish_phase(Phase::Gate, &phases, phase_start);

        let run = run.advance(Phase::Remediation)?;
        let phase_start = self.begin_phase(Phase::Remediation);
        let input = StageInput {
            run: run.clone(),
            source: source.clone(),
            paths: paths.clone(),
        };
        let (refactor, exploit) = tokio::join!(
            tokio::spawn(spawn_stage(self.refactor.clone(), input.clone())),
            tokio::spawn(spawn_stage(self.exploit.clone(), input.clone())),
        );
        phases.push(PhaseOutcome::Remediation {
            refactor: stage_outcome(self.refactor.name(), refactor, &mut artifacts),
            exploit: stage_outcome(self.exploit.name(), exploit, &mut artifacts),
        });
        self.finish_phase(Phase::Remediation, &phases, phase_start);

        let run = run.advance(Phase::Report)?;
        let phase_start = self.begin_phase(Phase::Report);
        let report = tokio::spawn(spawn_stage(
            self.report.clone(),
            StageInput {
                run: run.clone(),
                ..input
            },
        ))
        .await;
        phases.push(PhaseOutcome::Report {
            report: stage_outcome(self.report.name(), report, &mut artifacts),
        });
        self.finish_phase(Phase::Report, &phases, phase_start);

        let run = run.advance(Phase::Done)?;
        let total_time = start.elapsed();
        info!("Audit complete in {:.2}s", total_time.as_secs_f64());
        self.emit(ProgressEvent::Completed { total_time });

        Ok(RunSummary {
            run,
            outcome: RunOutcome::Completed,
            phases,
            artifacts,
            duration_ms: total_time.as_millis() as u64,
        })
    }

    async fn detect(
        &self,
        run: &PipelineRun,
        contract: &Path,
        source: &str,
    ) -> Result<usize, DetectError> {
        info!("Running static analyzer '{}'", self.context.analyzer.name());
        let issues = self.context.analyzer.analyze(contract, source).await?;
        let count = issues.len();

        write_json(
            &self.context.paths.detector_report(),
            &DetectorReport {
                contract: run.contract_name(),
                issues,
            },
        )?;

        info!("Analyzer reported {} findings", count);
        Ok(count)
    }

    async fn analysis(&self, run: &PipelineRun, source: &Arc<str>) -> PhaseOutcome {
        let paths = &self.context.paths;

        let verifier = BatchVerifier::new(self.context.llm_client.clone(), self.context.batch_size);
        let contract = run.contract_name();
        let verify_source = source.clone();
        let detector_report = paths.detector_report();
        let static_report = paths.static_report();
        let verify = tokio::spawn(async move {
            verifier
                .verify_artifact(&contract, &verify_source, &detector_report, &static_report)
                .await
        });

        let auditor = DeepAuditor::new(self.context.llm_client.clone());
        let audit_source = source.clone();
        let logic_report = paths.logic_report();
        let deep_audit =
            tokio::spawn(async move { auditor.audit_to(&audit_source, &logic_report).await });

        let (verify, deep_audit) = tokio::join!(verify, deep_audit);

        let verify = verify_outcome(verify);
        let deep_audit = deep_audit_outcome(deep_audit);
        self.emit_task(Phase::Analysis, "verify", &verify);
        self.emit_task(Phase::Analysis, "deep_audit", &deep_audit);

        PhaseOutcome::Analysis { verify, deep_audit }
    }

    fn gate(&self, source: &str) -> PhaseOutcome {
        let gatekeeper = Gatekeeper::new(source);
        let paths = &self.context.paths;
        let mut stats = Vec::new();

        let static_gate = gate_outcome(
            gatekeeper.validate_static_report(&paths.static_report()),
            &mut stats,
        );
        let logic_gate = gate_outcome(
            gatekeeper.validate_logic_report(&paths.logic_report()),
            &mut stats,
        );
        self.emit_task(Phase::Gate, "static_gate", &static_gate);
        self.emit_task(Phase::Gate, "logic_gate", &logic_gate);

        PhaseOutcome::Gate {
            static_gate,
            logic_gate,
            stats,
        }
    }

    fn abort(&self, run: PipelineRun, error: DetectError, start: Instant) -> RunSummary {
        let message = error.to_string();
        self.emit(ProgressEvent::Aborted {
            error: message.clone(),
        });

        RunSummary {
            run,
            outcome: RunOutcome::Aborted {
                error: message.clone(),
            },
            phases: vec![PhaseOutcome::Detect {
                outcome: TaskOutcome::Failed { error: message },
                findings: 0,
            }],
            artifacts: Vec::new(),
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn begin_phase(&self, phase: Phase) -> Instant {
        info!("Phase: {}", phase);
        self.emit(ProgressEvent::PhaseStarted { phase });
        Instant::now()
    }

    fn finish_phase(&self, phase: Phase, phases: &[PhaseOutcome], started: Instant) {
        if let Some(outcome) = phases.last().filter(|o| o.phase() == phase) {
            if matches!(phase, Phase::Remediation | Phase::Report) {
                for (task, task_outcome) in outcome.tasks() {
                    self.emit_task(phase, task, task_outcome);
                }
            }
        }

        self.emit(ProgressEvent::PhaseComplete {
            phase,
            duration: started.elapsed(),
        });
        debug!("Phase {} complete", phase);
    }

    fn emit_task(&self, phase: Phase, task: &str, outcome: &TaskOutcome) {
        self.emit(ProgressEvent::TaskFinished {
            phase,
            task: task.to_string(),
            outcome: outcome.clone(),
        });
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(handler) = &self.progress_handler {
            handler.on_progress(&event);
        }
    }
}

async fn read_contract(contract: &Path) -> Result<String, DetectError> {
    tokio::fs::read_to_string(contract)
        .await
        .map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => DetectError::ContractNotFound(contract.to_path_buf()),
            _ => DetectError::ContractUnreadable {
                path: contract.to_path_buf(),
                source,
            },
        })
}

async fn spawn_stage(task: Arc<dyn StageTask>, input: StageInput) -> anyhow::Result<Vec<PathBuf>> {
    task.run(input).await
}

fn panicked(error: JoinError) -> TaskOutcome {
    TaskOutcome::failed(format!("task did not complete: {}", error))
}

fn verify_outcome(result: Result<Result<VerificationOutcome, ArtifactError>, JoinError>) -> TaskOutcome {
    match result {
        Ok(Ok(outcome)) if outcome.is_degraded() => TaskOutcome::degraded(format!(
            "{} of {} verification chunks failed",
            outcome.failed_chunks, outcome.chunks
        )),
        Ok(Ok(outcome)) => TaskOutcome::succeeded(format!(
            "{} findings verified in {} chunks",
            outcome.findings.len(),
            outcome.chunks
        )),
        Ok(Err(e)) => TaskOutcome::failed(e),
        Err(e) => panicked(e),
    }
}

fn deep_audit_outcome(result: Result<Result<DeepAuditOutcome, ArtifactError>, JoinError>) -> TaskOutcome {
    match result {
        Ok(Ok(DeepAuditOutcome {
            failure: Some(reason),
            ..
        })) => TaskOutcome::degraded(format!("no logic findings: {}", reason)),
        Ok(Ok(outcome)) => {
            TaskOutcome::succeeded(format!("{} logic findings", outcome.findings.len()))
        }
        Ok(Err(e)) => TaskOutcome::failed(e),
        Err(e) => panicked(e),
    }
}

fn gate_outcome(result: Result<GateStats, GateError>, stats: &mut Vec<GateStats>) -> TaskOutcome {
    match result {
        Ok(s) => {
            stats.push(s);
            TaskOutcome::succeeded(format!(
                "{} kept ({} confident, {} manual review), {} dropped",
                s.kept(),
                s.confident,
                s.manual_review,
                s.dropped
            ))
        }
        Err(e) => {
            warn!("{}", e);
            TaskOutcome::failed(e)
        }
    }
}

fn stage_outcome(
    name: &str,
    result: Result<anyhow::Result<Vec<PathBuf>>, JoinError>,
    artifacts: &mut Vec<PathBuf>,
) -> TaskOutcome {
    match result {
        Ok(Ok(written)) if written.is_empty() => TaskOutcome::skipped("nothing to do"),
        Ok(Ok(written)) => {
            let detail = written
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            artifacts.extend(written);
            TaskOutcome::succeeded(detail)
        }
        Ok(Err(e)) => {
            warn!("{} failed: {:#}", name, e);
            TaskOutcome::failed(format!("{:#}", e))
        }
        Err(e) => {
            warn!("{} did not complete: {}", name, e);
            panicked(e)
        }
    }
}
