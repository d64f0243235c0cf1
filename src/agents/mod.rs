//! Oracle-backed stages: batch verification, deep audit, refactoring and exploit manuals

mod exploit;
mod logic_audit;
pub mod prompts;
mod refactor;
mod verification;

pub use exploit::{exploit_targets, slugify, ExploitTask};
pub use logic_audit::{DeepAuditOutcome, DeepAuditor};
pub use refactor::{collect_fixes, strip_code_fences, RefactorTask};
pub use verification::{BatchVerifier, VerificationOutcome, DEFAULT_BATCH_SIZE};
