//! End-to-end pipeline runs against a scripted oracle and a fake analyzer

use async_trait::async_trait;
use serde_json::json;
use smartaudit::agents::prompts::{
    LOGIC_AUDIT_SYSTEM_PROMPT, RED_TEAM_SYSTEM_PROMPT, REFACTOR_SYSTEM_PROMPT,
    VERIFICATION_SYSTEM_PROMPT,
};
use smartaudit::detect::{DetectError, StaticAnalyzer};
use smartaudit::findings::{
    read_json, CandidateFinding, Confidence, Gated, LineLocation, LogicFinding, LogicReport,
    StaticReport, VerifiedFinding,
};
use smartaudit::llm::{BackendError, LLMRequest, MockLLMClient, MockResponse};
use smartaudit::pipeline::{
    ArtifactPaths, AuditPipeline, Phase, PhaseOutcome, PipelineContext, RunOutcome, StageInput,
    StageTask, TaskOutcome,
};
use smartaudit::progress::{ProgressEvent, ProgressHandler};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const VAULT: &str = r#"pragma solidity ^0.8.0;

contract Vault {
    address public owner;
    mapping(address => uint256) public balances;

    function init() public {
        owner = msg.sender;
    }

    function withdraw() public {
        uint256 amount = balances[msg.sender];
        (bool ok, ) = msg.sender.call{value: amount}("");
        require(ok);
        balances[msg.sender] = 0;
    }
}
"#;

struct FakeAnalyzer {
    result: Result<Vec<CandidateFinding>, String>,
}

impl FakeAnalyzer {
    fn findings() -> Self {
        Self {
            result: Ok(vec![
                CandidateFinding::new("reentrancy-eth", "Reentrancy in Vault.withdraw()"),
                CandidateFinding::new("solc-version", "Pragma version ^0.8.0 allows old versions"),
                CandidateFinding::new("arbitrary-send-eth", "Vault sends eth to arbitrary user"),
            ]),
        }
    }

    fn failing() -> Self {
        Self {
            result: Err("slither crashed".to_string()),
        }
    }
}

#[async_trait]
impl StaticAnalyzer for FakeAnalyzer {
    fn name(&self) -> &str {
        "fake"
    }

    async fn analyze(&self, _: &Path, _: &str) -> Result<Vec<CandidateFinding>, DetectError> {
        self.result.clone().map_err(|detail| DetectError::AnalyzerFailed {
            status: Some(1),
            detail,
        })
    }
}

struct FailingTask(&'static str);

#[async_trait]
impl StageTask for FailingTask {
    fn name(&self) -> &str {
        self.0
    }

    async fn run(&self, _input: StageInput) -> anyhow::Result<Vec<PathBuf>> {
        anyhow::bail!("{} exploded", self.0)
    }
}

#[derive(Default)]
struct RecordingHandler {
    events: Mutex<Vec<ProgressEvent>>,
}

impl ProgressHandler for RecordingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

fn system_prompt(request: &LLMRequest) -> &str {
    request
        .messages
        .first()
        .map(|m| m.content.as_str())
        .unwrap_or_default()
}

fn scripted_oracle() -> MockLLMClient {
    MockLLMClient::from_fn(scripted_response)
}

fn scripted_response(request: &LLMRequest) -> MockResponse {
    let system = system_prompt(request);
    if system == VERIFICATION_SYSTEM_PROMPT {
        MockResponse::json(json!({
            "verified_issues": [
                {
                    "original_check": "reentrancy-eth",
                    "is_vulnerability": true,
                    "true_impact": "High",
                    "explanation": "state is cleared after the external call",
                    "code_citation": "(bool ok, ) = msg.sender.call{value: amount}(\"\");",
                    "remediation": "zero the balance before calling"
                },
                {
                    "original_check": "solc-version",
                    "is_vulnerability": false,
                    "true_impact": "Informational",
                    "explanation": "floating pragma",
                    "code_citation": "N/A",
                    "remediation": "pin the compiler"
                },
                {
                    "original_check": "arbitrary-send-eth",
                    "is_vulnerability": true,
                    "true_impact": "High",
                    "explanation": "owner can drain",
                    "code_citation": "payable(owner).transfer(address(this).balance);",
                    "remediation": "remove"
                }
            ]
        }))
    } else if system == LOGIC_AUDIT_SYSTEM_PROMPT {
        MockResponse::json(json!({
            "logic_vulnerabilities": [
                {
                    "title": "Unprotected initializer",
                    "true_impact": "Critical",
                    "explanation": "anyone can call init and become owner",
                    "code_citation": "function init() public {",
                    "remediation": "restrict init to the deployer"
                },
                {
                    "title": "Accounting drift",
                    "true_impact": "Medium",
                    "explanation": "balances and contract funds can diverge",
                    "code_citation": "N/A",
                    "remediation": "track total deposits"
                }
            ]
        }))
    } else if system == REFACTOR_SYSTEM_PROMPT {
        MockResponse::text("```solidity\ncontract Vault { /* [Security Fix] */ }\n```")
    } else if system == RED_TEAM_SYSTEM_PROMPT {
        MockResponse::text("## Attack Scenario\n1. Call init()")
    } else {
        MockResponse::error(BackendError::Other {
            message: format!("unexpected prompt: {}", system),
        })
    }
}

fn setup(temp: &TempDir) -> (PathBuf, ArtifactPaths) {
    let contract = temp.path().join("Vault.sol");
    std::fs::write(&contract, VAULT).unwrap();
    (contract, ArtifactPaths::new(temp.path().join("SmartAudit")))
}

#[tokio::test]
async fn test_full_run_gates_findings_before_remediation() {
    let temp = TempDir::new().unwrap();
    let (contract, paths) = setup(&temp);
    let client = Arc::new(scripted_oracle());
    let handler = Arc::new(RecordingHandler::default());

    let context = PipelineContext::new(client.clone(), Arc::new(FakeAnalyzer::findings()), paths.clone());
    let summary = AuditPipeline::new(context)
        .with_progress_handler(handler.clone())
        .run(&contract)
        .await
        .unwrap();

    assert!(summary.is_completed(), "{:?}", summary.outcome);
    assert_eq!(summary.run.phase, Phase::Done);
    assert_eq!(summary.phases.len(), 5);

    let statics: StaticReport<Gated<VerifiedFinding>> = read_json(&paths.static_report()).unwrap();
    assert_eq!(statics.verified_vulnerabilities.len(), 1);
    let reentrancy = &statics.verified_vulnerabilities[0];
    assert_eq!(reentrancy.finding.original_check, "reentrancy-eth");
    assert_eq!(reentrancy.decision.confidence, Confidence::Confident);
    assert_eq!(reentrancy.decision.line_number, LineLocation::Line(13));

    let logic: LogicReport<Gated<LogicFinding>> = read_json(&paths.logic_report()).unwrap();
    assert_eq!(logic.logic_vulnerabilities.len(), 2);
    assert_eq!(logic.logic_vulnerabilities[0].decision.line_number, LineLocation::Line(7));
    assert_eq!(
        logic.logic_vulnerabilities[1].decision.confidence,
        Confidence::ManualReview
    );
    assert_eq!(logic.logic_vulnerabilities[1].decision.line_number, LineLocation::Global);

    match summary.phase(Phase::Gate) {
        Some(PhaseOutcome::Gate { stats, .. }) => {
            assert_eq!(stats[0].input, 3);
            assert_eq!(stats[0].dropped, 2);
            assert_eq!(stats[1].manual_review, 1);
        }
        other => panic!("unexpected gate outcome: {:?}", other),
    }

    let fixed = std::fs::read_to_string(paths.fixed_contracts_dir().join("Fixed_Vault.sol")).unwrap();
    assert!(fixed.contains("[Security Fix]"));
    assert!(!fixed.contains("```"));

    let manuals: Vec<_> = std::fs::read_dir(paths.red_team_dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(manuals, vec!["01_unprotected-initializer.md".to_string()]);

    let report = std::fs::read_to_string(paths.final_report()).unwrap();
    assert!(report.contains("# SmartAudit Security Report: Vault.sol"));
    assert!(report.contains("Unprotected initializer"));
    assert!(report.contains("Accounting drift"));
    assert!(!report.contains("arbitrary-send-eth"));
    assert!(!report.contains("solc-version"));
    assert!(summary.artifacts.contains(&paths.final_report()));

    let refactor_request = client
        .requests()
        .into_iter()
        .find(|r| system_prompt(r) == REFACTOR_SYSTEM_PROMPT)
        .unwrap();
    let prompt = refactor_request.full_text();
    assert!(prompt.contains("- [Slither] reentrancy-eth"));
    assert!(prompt.contains("- [Logic, unverified] Accounting drift"));
    assert!(!prompt.contains("arbitrary-send-eth"));

    let events = handler.events.lock().unwrap();
    assert!(matches!(events.first(), Some(ProgressEvent::Started { .. })));
    assert!(matches!(events.last(), Some(ProgressEvent::Completed { .. })));
}

#[tokio::test]
async fn test_detect_failure_aborts_without_artifacts() {
    let temp = TempDir::new().unwrap();
    let (contract, paths) = setup(&temp);

    std::fs::create_dir_all(paths.outputs_dir()).unwrap();
    std::fs::write(paths.static_report(), r#"{"verified_vulnerabilities": []}"#).unwrap();
    std::fs::write(paths.logic_report(), r#"{"logic_vulnerabilities": []}"#).unwrap();
    std::fs::write(paths.final_report(), "# Previous run").unwrap();
    std::fs::create_dir_all(paths.fixed_contracts_dir()).unwrap();
    std::fs::write(paths.fixed_contracts_dir().join("Fixed_Vault.sol"), "contract Vault {}").unwrap();
    std::fs::create_dir_all(paths.red_team_dir()).unwrap();
    std::fs::write(paths.red_team_dir().join("01_old.md"), "# Old manual").unwrap();

    let client = Arc::new(scripted_oracle());
    let handler = Arc::new(RecordingHandler::default());
    let context = PipelineContext::new(client.clone(), Arc::new(FakeAnalyzer::failing()), paths.clone());
    let summary = AuditPipeline::new(context)
        .with_progress_handler(handler.clone())
        .run(&contract)
        .await
        .unwrap();

    assert!(!summary.is_completed());
    assert!(matches!(
        &summary.outcome,
        RunOutcome::Aborted { error } if error.contains("slither crashed")
    ));
    assert_eq!(summary.run.phase, Phase::Detect);
    assert!(summary.phase(Phase::Analysis).is_none());

    assert_eq!(client.request_count(), 0);
    assert!(!paths.static_report().exists());
    assert!(!paths.logic_report().exists());
    assert!(!paths.detector_report().exists());
    assert!(!paths.final_report().exists());
    assert!(!paths.fixed_contracts_dir().exists());
    assert!(!paths.red_team_dir().exists());

    let events = handler.events.lock().unwrap();
    assert!(matches!(events.last(), Some(ProgressEvent::Aborted { .. })));
}

#[tokio::test]
async fn test_remediation_failures_do_not_block_report() {
    let temp = TempDir::new().unwrap();
    let (contract, paths) = setup(&temp);
    let client = Arc::new(scripted_oracle());

    let context = PipelineContext::new(client, Arc::new(FakeAnalyzer::findings()), paths.clone());
    let summary = AuditPipeline::new(context)
        .with_refactor_task(Arc::new(FailingTask("refactor")))
        .with_exploit_task(Arc::new(FailingTask("exploit")))
        .run(&contract)
        .await
        .unwrap();

    assert!(summary.is_completed());
    match summary.phase(Phase::Remediation) {
        Some(PhaseOutcome::Remediation { refactor, exploit }) => {
            assert!(matches!(refactor, TaskOutcome::Failed { error } if error.contains("refactor exploded")));
            assert!(matches!(exploit, TaskOutcome::Failed { error } if error.contains("exploit exploded")));
        }
        other => panic!("unexpected remediation outcome: {:?}", other),
    }
    assert!(matches!(
        summary.phase(Phase::Report),
        Some(PhaseOutcome::Report {
            report: TaskOutcome::Succeeded { .. }
        })
    ));
    assert!(paths.final_report().exists());
}

#[tokio::test]
async fn test_refactor_failure_still_writes_exploit_manuals() {
    let temp = TempDir::new().unwrap();
    let (contract, paths) = setup(&temp);
    let client = Arc::new(MockLLMClient::from_fn(|request| {
        if system_prompt(request) == REFACTOR_SYSTEM_PROMPT {
            MockResponse::error(BackendError::TimeoutError { seconds: 30 })
        } else {
            scripted_response(request)
        }
    }));

    let context = PipelineContext::new(client, Arc::new(FakeAnalyzer::findings()), paths.clone());
    let summary = AuditPipeline::new(context).run(&contract).await.unwrap();

    assert!(summary.is_completed());
    match summary.phase(Phase::Remediation) {
        Some(PhaseOutcome::Remediation { refactor, exploit }) => {
            assert!(refactor.is_failed());
            assert!(matches!(exploit, TaskOutcome::Succeeded { .. }));
        }
        other => panic!("unexpected remediation outcome: {:?}", other),
    }

    assert!(!paths.fixed_contracts_dir().join("Fixed_Vault.sol").exists());
    let manual = paths.red_team_dir().join("01_unprotected-initializer.md");
    assert!(std::fs::read_to_string(&manual).unwrap().contains("Attack Scenario"));
    assert!(summary.artifacts.contains(&manual));

    assert!(matches!(
        summary.phase(Phase::Report),
        Some(PhaseOutcome::Report {
            report: TaskOutcome::Succeeded { .. }
        })
    ));
    assert!(paths.final_report().exists());
}

#[tokio::test]
async fn test_oracle_outage_degrades_but_completes() {
    let temp = TempDir::new().unwrap();
    let (contract, paths) = setup(&temp);
    let client = Arc::new(MockLLMClient::from_fn(|_| {
        MockResponse::error(BackendError::TimeoutError { seconds: 1 })
    }));

    let context = PipelineContext::new(client, Arc::new(FakeAnalyzer::findings()), paths.clone())
        .with_batch_size(2);
    let summary = AuditPipeline::new(context).run(&contract).await.unwrap();

    assert!(summary.is_completed());
    match summary.phase(Phase::Analysis) {
        Some(PhaseOutcome::Analysis { verify, deep_audit }) => {
            assert_eq!(verify.status(), "degraded");
            assert!(verify.message().contains("2 of 2"));
            assert_eq!(deep_audit.status(), "degraded");
        }
        other => panic!("unexpected analysis outcome: {:?}", other),
    }

    let statics: StaticReport<Gated<VerifiedFinding>> = read_json(&paths.static_report()).unwrap();
    assert!(statics.verified_vulnerabilities.is_empty());

    let report = std::fs::read_to_string(paths.final_report()).unwrap();
    assert!(report.contains("**Total Findings:** 0"));
}
