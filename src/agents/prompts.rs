//! Oracle instructions for every stage that talks to the LLM

/// Analyzer checks whose severity is always capped at Informational
pub const INFORMATIONAL_CHECKS: &[&str] = &["solc-version", "naming-convention"];

pub const VERIFICATION_SYSTEM_PROMPT: &str = "You are a lead smart contract security researcher. \
You triage static analyzer output and answer with a single JSON object only.";

pub const LOGIC_AUDIT_SYSTEM_PROMPT: &str = "You are a senior smart contract auditor who finds \
high-impact logic flaws that automated scanners miss. You answer with a single JSON object only.";

pub const REFACTOR_SYSTEM_PROMPT: &str = "You are an expert Solidity security engineer. \
You return complete, compilable Solidity source code and nothing else.";

pub const RED_TEAM_SYSTEM_PROMPT: &str = "You are an elite blockchain red teamer writing \
exploit manuals for the contract owner. You answer in Markdown only.";

const LOGIC_SCHEMA: &str = r#"{
  "logic_vulnerabilities": [
    {
      "true_impact": "Critical | High | Medium | Low | Informational",
      "title": "short descriptive title",
      "explanation": "concise explanation of the actual risk",
      "remediation": "specific code fix or recommendation",
      "code_citation": "code snippet copied exactly from the source"
    }
  ]
}"#;

const VERIFICATION_SCHEMA: &str = r#"{
  "verified_issues": [
    {
      "original_check": "check name from the input",
      "is_vulnerability": true,
      "true_impact": "Critical | High | Medium | Low | Informational",
      "explanation": "concise explanation of the risk",
      "code_citation": "exact code proving the issue, or \"N/A\" for a false positive",
      "remediation": "specific fix"
    }
  ]
}"#;

/// Batch triage request; `findings_json` is the minified `[{check, description}]` chunk
pub fn verification_prompt(source: &str, findings_json: &str) -> String {
    let capped = INFORMATIONAL_CHECKS
        .iter()
        .map(|c| format!("`{}`", c))
        .collect::<Vec<_>>()
        .join(" and ");

    format!(
        r#"Review this batch of static analyzer findings and filter out noise and false positives.

Rules:
1. Deduplicate: when several findings share one root cause, keep exactly ONE as a vulnerability and mark the others `"is_vulnerability": false`.
2. Severity caps: {capped} are ALWAYS "Informational", never "High" or "Critical".
3. Proof required: every finding you keep must carry a `code_citation` copied verbatim from the source. If you cannot quote the code, mark it `"is_vulnerability": false` with `"code_citation": "N/A"`.

Source code:
```solidity
{source}
```

Raw findings:
{findings_json}

Return a JSON object whose `verified_issues` follow the input order, using this schema:
{VERIFICATION_SCHEMA}"#
    )
}

/// Whole-contract deep audit request
pub fn logic_audit_prompt(source: &str) -> String {
    format!(
        r#"Find high-impact logic flaws in this contract.

Contract code:
```solidity
{source}
```

Analyze the contract through four lenses:

1. Storage: walk the storage layout slot by slot. Look for array length manipulation and for storage underflows that allow arbitrary writes over sensitive state such as `owner`.
2. State: name the contract's invariants (for example "only the owner can withdraw") and search for call sequences that break them. Look for tautologies in `require` statements.
3. Access: look beyond `onlyOwner`. Can a regular user gain administrative power through initialization flaws or storage collisions?
4. Economics: follow the money. Is there any path where a user withdraws more than they are entitled to?

Citation and format rules:
- Copy every `code_citation` exactly as it appears in the source.
- Do not report naming conventions or compiler version pragmas.
- Return ONLY a JSON object following this schema:
{LOGIC_SCHEMA}"#
    )
}

/// Full-source rewrite request; `fixes` is a bullet list
pub fn refactor_prompt(source: &str, fixes: &str) -> String {
    format!(
        r#"Fix this vulnerable smart contract.

Instructions:
1. Apply every fix listed under "Required fixes".
2. Do not change business logic unless a fix requires it.
3. Do not change function visibility or access control unless the vulnerability is explicitly about unauthorized access.
4. Mark each change with a `// [Security Fix] ...` comment.
5. Return ONLY the full fixed Solidity source. No markdown fences, no prose.

Required fixes:
{fixes}

Original code:
{source}"#
    )
}

/// Exploit manual request for one confirmed logic finding
pub fn red_team_prompt(source: &str, title: &str, explanation: &str) -> String {
    format!(
        r#"A critical vulnerability has been confirmed in the target contract. Explain to the client exactly how it can be exploited and how serious it is.

Vulnerability: {title}
Details: {explanation}

Target contract:
```solidity
{source}
```

Write a Red Team Exploit Manual in Markdown with these sections:
1. Severity & Impact: why this is critical.
2. Attack Scenario: a numbered, step-by-step list of attacker actions.
3. Proof of Concept: a complete Foundry test (`Test.sol`) that imports `forge-std/Test.sol`, defines `testExploit()`, and uses assertions such as `assertEq(attacker.balance, ...)` to prove the attack worked.

Return ONLY the Markdown content."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_prompt_carries_caps_and_payload() {
        let prompt = verification_prompt("contract A {}", r#"[{"check":"solc-version"}]"#);
        assert!(prompt.contains("`solc-version` and `naming-convention`"));
        assert!(prompt.contains(r#"[{"check":"solc-version"}]"#));
        assert!(prompt.contains("contract A {}"));
        assert!(prompt.contains("verified_issues"));
    }

    #[test]
    fn test_logic_prompt_embeds_schema() {
        let prompt = logic_audit_prompt("contract B {}");
        assert!(prompt.contains("logic_vulnerabilities"));
        assert!(prompt.contains("contract B {}"));
    }

    #[test]
    fn test_red_team_prompt_names_finding() {
        let prompt = red_team_prompt("contract C {}", "Owner takeover", "init is public");
        assert!(prompt.contains("Vulnerability: Owner takeover"));
        assert!(prompt.contains("Details: init is public"));
    }
}
