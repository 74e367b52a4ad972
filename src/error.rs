//! Typed error/warning taxonomy for the compilation core (§7).
//!
//! Every fatal failure surfaces as one `CoreError` variant; non-fatal optimizer
//! shape mismatches surface as `OptimizerWarning`s returned alongside the
//! optimized IR rather than aborting `resolve()` (§7: "a rule encountering an
//! unexpected shape leaves the op untouched and emits a warning").
//!
//! Grounded on the host crate's `ErrorCode`/`AXM_xxx` taxonomy (`diagnostics.rs`):
//! a stable numeric code plus a `help()` string per variant, via `miette`. Unlike
//! that taxonomy this one carries no source span — the input here is a
//! host-constructed `Expr` tree, not parsed text, so there is no byte range for
//! a span to anchor to.

use miette::Diagnostic;
use thiserror::Error;

/// The four error kinds from §7, unified behind one enum so the embedding layer
/// has a single type to match on.
#[derive(Debug, Error, Diagnostic)]
pub enum CoreError {
    #[error("type mismatch: expected {expected}, found {found}")]
    #[diagnostic(code(bolt_expr::type_mismatch), help("check the operand's nbt_type or readtype before using it in this position"))]
    TypeMismatch { expected: String, found: String },

    #[error("invalid literal: {reason}")]
    #[diagnostic(code(bolt_expr::invalid_literal), help("literal values must convert to one of NbtValue's variants (int, float, bool, string, list, compound)"))]
    InvalidLiteral { reason: String },

    #[error("invalid config option `{option}`: {reason}")]
    #[diagnostic(code(bolt_expr::invalid_config), help("objective/storage identifiers must be non-empty and contain no whitespace"))]
    InvalidConfig { option: String, reason: String },

    #[error("internal invariant violated: {detail}")]
    #[diagnostic(code(bolt_expr::internal_invariant), help("this is a compiler-core bug, not a misuse of the API; please report it with the offending expression"))]
    InternalInvariant { detail: String },
}

impl CoreError {
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        CoreError::TypeMismatch { expected: expected.into(), found: found.into() }
    }

    pub fn invalid_literal(reason: impl Into<String>) -> Self {
        CoreError::InvalidLiteral { reason: reason.into() }
    }

    pub fn invalid_config(option: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidConfig { option: option.into(), reason: reason.into() }
    }

    pub fn internal_invariant(detail: impl Into<String>) -> Self {
        CoreError::InternalInvariant { detail: detail.into() }
    }
}

/// A non-fatal shape mismatch a rewrite rule declined to act on (§4.3, §7).
/// Collected by the optimizer and returned alongside its output; never aborts
/// `resolve()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizerWarning {
    pub rule: &'static str,
    pub message: String,
}

impl OptimizerWarning {
    pub fn new(rule: &'static str, message: impl Into<String>) -> Self {
        OptimizerWarning { rule, message: message.into() }
    }
}

impl std::fmt::Display for OptimizerWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.rule, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_error_messages_are_human_readable() {
        let e = CoreError::type_mismatch("ScoreRef", "DataRef(Compound)");
        assert_eq!(
            e.to_string(),
            "type mismatch: expected ScoreRef, found DataRef(Compound)"
        );
    }

    #[test]
    fn optimizer_warning_display_includes_rule_name() {
        let w = OptimizerWarning::new("data_set_scaling", "temp read elsewhere, skipping fusion");
        assert_eq!(w.to_string(), "[data_set_scaling] temp read elsewhere, skipping fusion");
    }
}
