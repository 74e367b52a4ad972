//! Compilation-core configuration (§6).
//!
//! Unlike the host crate's `conf.rs` (a large property registry persisted to
//! `~/.axiom/conf.txt` and edited via a `conf` sub-command), this config is a
//! plain struct the embedding layer constructs in-process and hands to
//! [`crate::session::Session::new`] — there is no file format or CLI here, since
//! the core is a library invoked by a host toolchain, not a standalone program.

use crate::error::CoreError;

/// Validated configuration for one compilation session (§6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Objective for temp scores. Default: `bolt.expr.temp`.
    pub temp_objective: String,
    /// Objective for interned constants. Default: `bolt.expr.const`.
    pub const_objective: String,
    /// Target (storage) for temp data triples. Default: `bolt.expr:temp`.
    pub temp_storage: String,
    /// Location of the generated init function. Default: `init_expressions`.
    pub init_path: String,
    /// Prepended to `temp_objective` and `const_objective` at construction time.
    /// Default: empty.
    pub objective_prefix: String,
    /// Suppress command emission (dry run). Default: `false`.
    pub disable_commands: bool,
    /// Revalidate IR well-formedness between every optimizer rule (§4.3, §7).
    /// Meant for compiler-core development, not production use — it turns an
    /// `InternalInvariant` failure into a precise "which rule broke this"
    /// diagnosis instead of a post-hoc one. Default: `false`.
    pub debug_validate: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            temp_objective: "bolt.expr.temp".to_string(),
            const_objective: "bolt.expr.const".to_string(),
            temp_storage: "bolt.expr:temp".to_string(),
            init_path: "init_expressions".to_string(),
            objective_prefix: String::new(),
            disable_commands: false,
            debug_validate: false,
        }
    }
}

impl Config {
    /// Build a `Config`, applying `objective_prefix` and validating every
    /// identifier-shaped option. Returns `InvalidConfig` rather than panicking
    /// on a malformed option (§7).
    pub fn new(mut self) -> Result<Self, CoreError> {
        if !self.objective_prefix.is_empty() {
            self.temp_objective = format!("{}{}", self.objective_prefix, self.temp_objective);
            self.const_objective = format!("{}{}", self.objective_prefix, self.const_objective);
        }
        self.validate()?;
        Ok(self)
    }

    /// Re-check identifier-shaped options without re-applying the prefix.
    /// Called by `new` and safe to call again after manual field edits.
    pub fn validate(&self) -> Result<(), CoreError> {
        Self::check_token("temp_objective", &self.temp_objective)?;
        Self::check_token("const_objective", &self.const_objective)?;
        Self::check_token("temp_storage", &self.temp_storage)?;
        Self::check_token("init_path", &self.init_path)?;
        Ok(())
    }

    fn check_token(option: &str, value: &str) -> Result<(), CoreError> {
        if value.is_empty() {
            return Err(CoreError::invalid_config(option, "must not be empty"));
        }
        if value.chars().any(char::is_whitespace) {
            return Err(CoreError::invalid_config(option, "must not contain whitespace"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn prefix_applies_to_objectives_only() {
        let cfg = Config { objective_prefix: "ns.".to_string(), ..Config::default() }
            .new()
            .unwrap();
        assert_eq!(cfg.temp_objective, "ns.bolt.expr.temp");
        assert_eq!(cfg.const_objective, "ns.bolt.expr.const");
        assert_eq!(cfg.temp_storage, "bolt.expr:temp");
    }

    #[test]
    fn empty_objective_is_rejected() {
        let cfg = Config { temp_objective: String::new(), ..Config::default() };
        assert!(matches!(cfg.validate(), Err(CoreError::InvalidConfig { .. })));
    }

    #[test]
    fn whitespace_in_storage_target_is_rejected() {
        let cfg = Config { temp_storage: "bolt.expr: temp".to_string(), ..Config::default() };
        assert!(matches!(cfg.validate(), Err(CoreError::InvalidConfig { .. })));
    }
}
