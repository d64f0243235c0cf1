//! Whitespace-tolerant evidence matching
//!
//! Locates a claimed code citation inside the audited source. Literal characters of
//! the citation are fixed; every run of whitespace inside it matches any run of one or
//! more whitespace characters in the source, newlines included. Matching ignores case.
//!
//! ```
//! use smartaudit::evidence::locate;
//!
//! let source = "function withdraw() public {\n    msg.sender.call{value: amount}(\"\");\n}";
//! let found = locate("msg.sender.call{value:   amount}", source).unwrap();
//! assert_eq!(found.line_in(source), 2);
//! ```

use crate::findings::NO_CITATION;
use regex::RegexBuilder;
use tracing::debug;

/// Upper bound on compiled pattern size; larger citations count as unmatched
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// Byte span of a located citation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvidenceMatch {
    pub start: usize,
    pub end: usize,
}

impl EvidenceMatch {
    /// 1-based line number of the match start within `source`
    pub fn line_in(&self, source: &str) -> usize {
        line_at(source, self.start)
    }
}

/// Finds the first occurrence of `snippet` in `source`
///
/// Returns `None` for empty citations, the `"N/A"` sentinel, citations that cannot be
/// compiled into a pattern, and citations that simply do not occur.
pub fn locate(snippet: &str, source: &str) -> Option<EvidenceMatch> {
    let pattern = citation_pattern(snippet)?;

    let regex = match RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()
    {
        Ok(regex) => regex,
        Err(e) => {
            debug!("Citation could not be compiled, treating as unmatched: {}", e);
            return None;
        }
    };

    regex.find(source).map(|m| EvidenceMatch {
        start: m.start(),
        end: m.end(),
    })
}

/// Newlines strictly before `offset`, plus one
pub fn line_at(source: &str, offset: usize) -> usize {
    source.as_bytes()[..offset.min(source.len())]
        .iter()
        .filter(|b| **b == b'\n')
        .count()
        + 1
}

fn citation_pattern(snippet: &str) -> Option<String> {
    let trimmed = snippet.trim();
    if trimmed.is_empty() || trimmed == NO_CITATION {
        return None;
    }

    Some(
        trimmed
            .split_whitespace()
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(r"\s+"),
    )
}
