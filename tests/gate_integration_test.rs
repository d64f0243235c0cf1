//! Evidence gate over on-disk artifacts

use smartaudit::findings::{
    read_json, write_json, Confidence, Gated, Impact, LineLocation, LogicFinding, LogicReport,
    StaticReport, VerifiedFinding,
};
use smartaudit::gate::{FindingKind, Gatekeeper, CONFIRMED_NOTE, MANUAL_REVIEW_NOTE};
use tempfile::TempDir;
use yare::parameterized;

const TOKEN: &str = "contract Token {
    mapping(address => uint256) balanceOf;

    function transfer(address to, uint256 amount) external {
        balanceOf[msg.sender] -= amount;
        balanceOf[to]   +=   amount;
    }
}
";

fn verified(check: &str, citation: Option<&str>) -> VerifiedFinding {
    VerifiedFinding {
        original_check: check.to_string(),
        is_vulnerability: true,
        true_impact: Impact::Medium,
        explanation: format!("{} explanation", check),
        code_citation: citation.map(str::to_string),
        remediation: "fix it".to_string(),
    }
}

fn logic(title: &str, citation: Option<&str>) -> LogicFinding {
    LogicFinding {
        title: title.to_string(),
        true_impact: Impact::High,
        explanation: String::new(),
        code_citation: citation.map(str::to_string),
        remediation: String::new(),
    }
}

#[parameterized(
    exact = { "balanceOf[msg.sender] -= amount;", Some(5) },
    collapsed_whitespace = { "balanceOf[to] += amount;", Some(6) },
    different_case = { "FUNCTION transfer(address to, uint256 amount)", Some(4) },
    spans_lines = { "balanceOf[msg.sender] -= amount; balanceOf[to]", Some(5) },
    regex_metacharacters_are_literal = { "balanceOf[.*] -= amount;", None },
    hallucinated = { "require(balanceOf[msg.sender] >= amount);", None },
)]
fn static_citation_decisions(citation: &str, expected_line: Option<usize>) {
    let gatekeeper = Gatekeeper::new(TOKEN);
    let decision = gatekeeper.decide(Some(citation), FindingKind::Static);

    match expected_line {
        Some(line) => {
            let decision = decision.expect("citation should be located");
            assert_eq!(decision.confidence, Confidence::Confident);
            assert_eq!(decision.line_number, LineLocation::Line(line));
            assert_eq!(decision.gatekeeper_note, CONFIRMED_NOTE);
        }
        None => assert!(decision.is_none()),
    }
}

#[test]
fn test_static_and_logic_policies_differ() {
    let gatekeeper = Gatekeeper::new(TOKEN);

    assert!(gatekeeper.decide(None, FindingKind::Static).is_none());

    let decision = gatekeeper
        .decide(Some("unchecked { total += 1; }"), FindingKind::Logic)
        .unwrap();
    assert_eq!(decision.confidence, Confidence::ManualReview);
    assert_eq!(decision.line_number, LineLocation::Global);
    assert_eq!(decision.gatekeeper_note, MANUAL_REVIEW_NOTE);
}

#[test]
fn test_validate_reports_in_place() {
    let temp = TempDir::new().unwrap();
    let static_path = temp.path().join("static.json");
    let logic_path = temp.path().join("logic.json");

    write_json(
        &static_path,
        &StaticReport {
            contract: "Token.sol".to_string(),
            verified_vulnerabilities: vec![
                verified("underflow", Some("balanceOf[msg.sender] -= amount;")),
                verified("phantom", Some("selfdestruct(payable(msg.sender));")),
                verified("uncited", None),
            ],
        },
    )
    .unwrap();
    write_json(
        &logic_path,
        &LogicReport {
            logic_vulnerabilities: vec![
                logic("Unchecked transfer", Some("function transfer(address to, uint256 amount) external")),
                logic("Supply inflation", None),
            ],
        },
    )
    .unwrap();

    let gatekeeper = Gatekeeper::new(TOKEN);
    let static_stats = gatekeeper.validate_static_report(&static_path).unwrap();
    let logic_stats = gatekeeper.validate_logic_report(&logic_path).unwrap();

    assert_eq!((static_stats.input, static_stats.confident, static_stats.dropped), (3, 1, 2));
    assert_eq!(
        (logic_stats.input, logic_stats.confident, logic_stats.manual_review, logic_stats.dropped),
        (2, 1, 1, 0)
    );

    let statics: StaticReport<Gated<VerifiedFinding>> = read_json(&static_path).unwrap();
    assert_eq!(statics.contract, "Token.sol");
    assert_eq!(statics.verified_vulnerabilities.len(), 1);
    assert_eq!(statics.verified_vulnerabilities[0].finding.original_check, "underflow");

    let logic: LogicReport<Gated<LogicFinding>> = read_json(&logic_path).unwrap();
    let titles: Vec<_> = logic
        .logic_vulnerabilities
        .iter()
        .map(|g| (g.finding.title.as_str(), g.decision.line_number))
        .collect();
    assert_eq!(
        titles,
        vec![
            ("Unchecked transfer", LineLocation::Line(4)),
            ("Supply inflation", LineLocation::Global),
        ]
    );

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&logic_path).unwrap()).unwrap();
    assert_eq!(raw["logic_vulnerabilities"][1]["line_number"], "Global/Logic");
    assert_eq!(raw["logic_vulnerabilities"][1]["confidence"], "Manual Review");
}

#[test]
fn test_regating_is_stable() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("logic.json");
    write_json(
        &path,
        &LogicReport {
            logic_vulnerabilities: vec![
                logic("Located", Some("balanceOf[to] += amount;")),
                logic("Unlocated", Some("mint(address(0), 1)")),
            ],
        },
    )
    .unwrap();

    let gatekeeper = Gatekeeper::new(TOKEN);
    gatekeeper.validate_logic_report(&path).unwrap();
    let first = std::fs::read_to_string(&path).unwrap();

    let stats = gatekeeper.validate_logic_report(&path).unwrap();
    let second = std::fs::read_to_string(&path).unwrap();

    assert_eq!(first, second);
    assert_eq!(stats.kept(), 2);
}

#[test]
fn test_missing_artifacts_are_empty() {
    let temp = TempDir::new().unwrap();
    let gatekeeper = Gatekeeper::new(TOKEN);

    let stats = gatekeeper
        .validate_static_report(&temp.path().join("absent.json"))
        .unwrap();
    assert_eq!(stats.input, 0);
    assert!(!temp.path().join("absent.json").exists());
}
