//! `Session` — the per-compilation-run facade (§4.5).
//!
//! Grounded on the host crate's `runtime::Runtime`: the object that wires
//! configuration, compiler, and VM together for one invocation and exposes the
//! single entry point the embedding layer actually calls. This crate's `Session`
//! plays the same role over `TempAllocator` + `ConstAllocator` + `Optimizer`
//! instead of a VM, and additionally owns the `CommandSink`/`InitWriter`
//! collaborators the embedding layer implements (§6).

use crate::alloc::{ConstAllocator, TempAllocator};
use crate::config::Config;
use crate::error::{CoreError, OptimizerWarning};
use crate::expr::Expr;
use crate::optimizer::{OptCtx, Optimizer};
use crate::serialize::serialize;

/// Receives the command strings produced by one `resolve()` call, in order.
/// The embedding layer implements this over whatever command-parser/executor
/// it actually has; the core never touches a file descriptor or socket itself (§6).
pub trait CommandSink {
    fn accept(&mut self, command: String);
}

/// Receives the generated initialization function body at session end (§4.5, §6).
pub trait InitWriter {
    fn write_init(&mut self, path: &str, commands: Vec<String>);
}

/// A `CommandSink`/`InitWriter` that simply collects everything, useful for
/// tests and for embedding layers that want to batch rather than stream.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub commands: Vec<String>,
}

impl CommandSink for CollectingSink {
    fn accept(&mut self, command: String) {
        self.commands.push(command);
    }
}

impl InitWriter for CollectingSink {
    fn write_init(&mut self, _path: &str, commands: Vec<String>) {
        self.commands.extend(commands);
    }
}

/// Owns the allocators, the optimizer pipeline, and the configuration for one
/// compilation session (§4.5, §5: "Each `resolve()` is an independent unit of
/// work; state shared across resolves is only the ConstScore intern set").
pub struct Session {
    config: Config,
    temps: TempAllocator,
    consts: ConstAllocator,
    optimizer: Optimizer,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Session { config, temps: TempAllocator::new(), consts: ConstAllocator::new(), optimizer: Optimizer::new() }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compile one expression tree end to end: reset the temp counter, unroll,
    /// optimize, serialize, and hand the resulting commands to `sink` in order
    /// (unless `disable_commands` is set, in which case they're computed and
    /// returned but never handed off — a dry run). Returns the rendered
    /// commands plus any non-fatal optimizer warnings (§4.5, §7).
    pub fn resolve(&mut self, root: &Expr, sink: &mut dyn CommandSink) -> Result<(Vec<String>, Vec<OptimizerWarning>), CoreError> {
        self.temps.reset();
        let (ops, _tail) = root.unroll(&mut self.temps, &self.config.temp_objective)?;

        let mut ctx = OptCtx::new(&mut self.temps, &mut self.consts, &self.config);
        let optimized = self.optimizer.optimize(ops, &mut ctx)?;
        let warnings = ctx.warnings;

        let commands = serialize(&optimized)?;
        if !self.config.disable_commands {
            for command in &commands {
                sink.accept(command.clone());
            }
        }
        Ok((commands, warnings))
    }

    /// Flush the interned const set to the init function body: one
    /// `scoreboard players set <$v> <const-objective> <v>` per value, ascending,
    /// handed to `writer` at `config.init_path` (§3 Lifecycles, §4.5).
    pub fn generate_init(&self, writer: &mut dyn InitWriter) {
        let commands: Vec<String> = self
            .consts
            .values()
            .map(|v| format!("scoreboard players set ${v} {} {v}", self.config.const_objective))
            .collect();
        writer.write_init(&self.config.init_path, commands);
    }

    /// Register a hand-written `$k`-shaped const reference discovered in the
    /// host AST, per the §6 sanitizer contract.
    pub fn sanitize_consts<'a, I>(&mut self, pairs: I) -> usize
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        crate::sanitize::sanitize_consts(pairs, &self.config.const_objective, &mut self.consts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operand::{DataRef, Literal, Operand, ScoreRef, TargetKind};
    use crate::path::NbtPath;

    fn score(h: &str) -> Expr {
        Expr::score(h, "obj")
    }

    #[test]
    fn scenario_1_add_literal() {
        let mut session = Session::new(Config::default());
        let mut sink = CollectingSink::default();
        let expr = Expr::set(score("@s"), score("@s") + Expr::int(5));
        let (commands, warnings) = session.resolve(&expr, &mut sink).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(commands, vec!["scoreboard players add @s obj 5"]);
        assert_eq!(sink.commands, commands);
    }

    #[test]
    fn scenario_2_set_literal() {
        let mut session = Session::new(Config::default());
        let mut sink = CollectingSink::default();
        let expr = Expr::set(score("@s"), Expr::int(7));
        let (commands, _) = session.resolve(&expr, &mut sink).unwrap();
        assert_eq!(commands, vec!["scoreboard players set @s obj 7"]);
    }

    #[test]
    fn scenario_3_multiply_interns_constant_and_emits_init() {
        let mut session = Session::new(Config::default());
        let mut sink = CollectingSink::default();
        let expr = Expr::set(score("@s"), score("@s") * Expr::int(3));
        let (commands, _) = session.resolve(&expr, &mut sink).unwrap();
        assert_eq!(commands, vec!["scoreboard players operation @s obj *= $3 bolt.expr.const"]);

        let mut init_sink = CollectingSink::default();
        session.generate_init(&mut init_sink);
        assert_eq!(init_sink.commands, vec!["scoreboard players set $3 bolt.expr.const 3"]);
    }

    #[test]
    fn scenario_4_bare_data_to_data_set() {
        let mut session = Session::new(Config::default());
        let mut sink = CollectingSink::default();
        let lhs = DataRef::new(TargetKind::Storage, "ns:x", NbtPath::named("a"));
        let rhs = DataRef::new(TargetKind::Storage, "ns:y", NbtPath::named("b"));
        let expr = Expr::set(Expr::data(lhs), Expr::data(rhs));
        let (commands, _) = session.resolve(&expr, &mut sink).unwrap();
        assert_eq!(commands, vec!["data modify storage ns:x a set from storage ns:y b"]);
    }

    #[test]
    fn scenario_5_data_set_scaling_fusion() {
        let mut session = Session::new(Config::default());
        let mut sink = CollectingSink::default();
        let data = DataRef::new(TargetKind::Storage, "ns:x", NbtPath::named("a"));
        let expr = Expr::set(Expr::data(data), score("@s") * Expr::int(2));
        let (commands, _) = session.resolve(&expr, &mut sink).unwrap();
        assert_eq!(commands, vec!["execute store result storage ns:x a int 2 run scoreboard players get @s obj"]);
    }

    #[test]
    fn scenario_6_abs() {
        let mut session = Session::new(Config::default());
        let mut sink = CollectingSink::default();
        let expr = Expr::set(score("@s"), score("@s").abs());
        let (commands, _) = session.resolve(&expr, &mut sink).unwrap();
        assert_eq!(
            commands,
            vec![
                "scoreboard players operation $s0 bolt.expr.temp = @s obj",
                "execute if score $s0 bolt.expr.temp matches ..-1 run scoreboard players operation $s0 bolt.expr.temp *= $-1 bolt.expr.const",
                "scoreboard players operation @s obj = $s0 bolt.expr.temp",
            ]
        );
    }

    #[test]
    fn disable_commands_computes_but_does_not_emit_to_sink() {
        let mut session = Session::new(Config { disable_commands: true, ..Config::default() });
        let mut sink = CollectingSink::default();
        let expr = Expr::set(score("@s"), Expr::int(7));
        let (commands, _) = session.resolve(&expr, &mut sink).unwrap();
        assert_eq!(commands, vec!["scoreboard players set @s obj 7"]);
        assert!(sink.commands.is_empty());
    }

    #[test]
    fn temp_counter_resets_between_resolve_calls() {
        let mut session = Session::new(Config::default());
        let mut sink = CollectingSink::default();
        let first = Expr::set(score("@s"), score("@s").abs());
        let second = Expr::set(score("@s2"), score("@s2").abs());
        session.resolve(&first, &mut sink).unwrap();
        let (commands, _) = session.resolve(&second, &mut sink).unwrap();
        assert!(commands[0].contains("$s0"));
    }

    #[test]
    fn sanitize_consts_registers_hand_written_reference() {
        let mut session = Session::new(Config::default());
        let registered = session.sanitize_consts(vec![("$9", "bolt.expr.const")]);
        assert_eq!(registered, 1);
        let mut init_sink = CollectingSink::default();
        session.generate_init(&mut init_sink);
        assert_eq!(init_sink.commands, vec!["scoreboard players set $9 bolt.expr.const 9"]);
    }

    #[test]
    fn operand_helper_is_reachable_from_session_tests() {
        let op = Operand::from(Literal::int(1));
        assert_eq!(op.as_inline_int(), Some(1));
        let _ = ScoreRef::new("@s", "obj");
    }
}
