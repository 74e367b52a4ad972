//! IR → command-string rendering (§4.4). Pure and order-preserving: no
//! re-ordering, no optimization here — that already happened in `optimizer`.
//!
//! Grounded on the host crate's `bytecode`/disassembly rendering conventions
//! (`Instr::to_string`-style one-op-to-one-line mapping), adapted to this
//! domain's command-string target instead of a human-readable disassembly.

use crate::error::CoreError;
use crate::ir::{Cmp, IrOp};
use crate::operand::{DataRef, Operand, ScoreRef, TargetKind};

/// Render one operand the way it is spliced into a command body — a bare
/// holder/objective pair, an inline integer, or a nested `DataRef` triple.
fn render_operand(op: &Operand) -> String {
    match op {
        Operand::Score(s) => render_score(s),
        Operand::Data(d) => d.render(),
        Operand::Literal(lit) => lit.value.render(),
    }
}

fn render_score(s: &ScoreRef) -> String {
    format!("{} {}", s.holder, s.objective)
}

/// The target grammar expresses comparisons as `matches` ranges rather than a
/// bare relational operator, so each `Cmp` variant maps to the matching
/// one- or two-sided range form.
fn render_cmp(cmp: &Cmp) -> String {
    match cmp {
        Cmp::LessThan(a, b) => format!("if score {} matches ..{}", render_operand(a), bound_minus_one(b)),
        Cmp::LessEqual(a, b) => format!("if score {} matches ..{}", render_operand(a), render_operand(b)),
        Cmp::GreaterThan(a, b) => format!("if score {} matches {}..", render_operand(a), bound_plus_one(b)),
        Cmp::GreaterEqual(a, b) => format!("if score {} matches {}..", render_operand(a), render_operand(b)),
        Cmp::Equal(a, b) => format!("if score {} = {}", render_operand(a), render_operand(b)),
    }
}

/// `LessThan(x, k)` and `GreaterThan(x, k)` need an exclusive bound translated
/// to the VM's inclusive `matches` range grammar; only literal int bounds are
/// adjustable this way (matches scenario 6's `abs` desugaring, whose bound is
/// always the literal `0`).
fn bound_minus_one(b: &Operand) -> String {
    match b.as_inline_int() {
        Some(k) => (k - 1).to_string(),
        None => render_operand(b),
    }
}

fn bound_plus_one(b: &Operand) -> String {
    match b.as_inline_int() {
        Some(k) => (k + 1).to_string(),
        None => render_operand(b),
    }
}

fn render_op(op: &IrOp) -> Result<String, CoreError> {
    Ok(match op {
        IrOp::Set(dst, Operand::Literal(lit)) => {
            format!("scoreboard players set {} {}", render_score(dst), lit.value.render())
        }
        // A `Set` is score-refs only (§3 invariant); a `Data` source reaching
        // here means the unroller failed to route a data-leaf read through
        // `DataGet` upstream. Rather than render the invalid
        // `scoreboard players operation <a> = <data>`, surface the bug.
        IrOp::Set(dst, Operand::Data(_)) => {
            return Err(CoreError::internal_invariant(format!(
                "Set destination `{}` has a Data source; data reads into a score must go through DataGet",
                dst.holder
            )))
        }
        IrOp::Set(dst, src) => {
            format!("scoreboard players operation {} = {}", render_score(dst), render_operand(src))
        }
        IrOp::Add(dst, Operand::Literal(lit)) => render_add_sub_literal(dst, lit, true),
        IrOp::Sub(dst, Operand::Literal(lit)) => render_add_sub_literal(dst, lit, false),
        IrOp::Add(dst, src) => format!("scoreboard players operation {} += {}", render_score(dst), render_operand(src)),
        IrOp::Sub(dst, src) => format!("scoreboard players operation {} -= {}", render_score(dst), render_operand(src)),
        IrOp::Mul(dst, src) => format!("scoreboard players operation {} *= {}", render_score(dst), render_operand(src)),
        IrOp::Div(dst, src) => format!("scoreboard players operation {} /= {}", render_score(dst), render_operand(src)),
        IrOp::Mod(dst, src) => format!("scoreboard players operation {} %= {}", render_score(dst), render_operand(src)),
        IrOp::Min(dst, src) => format!("scoreboard players operation {} < {}", render_score(dst), render_operand(src)),
        IrOp::Max(dst, src) => format!("scoreboard players operation {} > {}", render_score(dst), render_operand(src)),

        IrOp::DataSet(dst, src) if dst.scale != 1.0 => render_scaled_store(dst, src),
        IrOp::DataSet(dst, Operand::Literal(lit)) => format!("data modify {} set value {}", dst.render(), lit.value.render()),
        IrOp::DataSet(dst, src @ Operand::Data(_)) => format!("data modify {} set from {}", dst.render(), render_data_source(src)),
        IrOp::DataSet(dst, src @ Operand::Score(_)) => render_scaled_store(dst, src),

        IrOp::DataGet(dst, src, scale) => {
            format!("execute store result score {} run data get {} {}", render_score(dst), src.render(), scale)
        }

        IrOp::DataMerge(dst, src) => format!("data merge {} {}", dst.render(), render_data_source(src)),
        IrOp::DataInsert(dst, idx, src) => format!("data modify {} insert {} {}", dst.render(), idx, render_data_source(src)),
        IrOp::DataAppend(dst, src) => format!("data modify {} append {}", dst.render(), render_data_source(src)),
        IrOp::DataPrepend(dst, src) => format!("data modify {} prepend {}", dst.render(), render_data_source(src)),
        IrOp::DataRemove(dst) => format!("data remove {}", dst.render()),

        IrOp::If(cond, body) => format!("execute {} run {}", render_cmp(cond), render_op(body)?),
    })
}

/// A score-or-literal `data modify ... set/insert/append/prepend` source renders
/// as `from <data>` for data and `value <v>` for literals; a lone helper keeps
/// that choice in one place across the data-family ops.
fn render_data_source(src: &Operand) -> String {
    match src {
        Operand::Data(_) => format!("from {}", render_operand(src)),
        Operand::Literal(lit) => format!("value {}", lit.value.render()),
        Operand::Score(_) => render_operand(src),
    }
}

fn render_add_sub_literal(dst: &ScoreRef, lit: &crate::operand::Literal, is_add: bool) -> String {
    match lit.as_inline_int() {
        Some(k) if k < 0 => {
            let verb = if is_add { "remove" } else { "add" };
            format!("scoreboard players {} {} {}", verb, render_score(dst), -k)
        }
        Some(k) => {
            let verb = if is_add { "add" } else { "remove" };
            format!("scoreboard players {} {} {}", verb, render_score(dst), k)
        }
        None => {
            let verb = if is_add { "+=" } else { "-=" };
            format!("scoreboard players operation {} {} {}", render_score(dst), verb, lit.value.render())
        }
    }
}

/// `Set`/`DataSet` writing a score into a data target with a non-default scale
/// renders as the VM's native score→data store command (§4.3#3, scenario 5).
fn render_scaled_store(dst: &DataRef, src: &Operand) -> String {
    let ty = match dst.target_kind {
        TargetKind::Storage | TargetKind::Block => "int",
        TargetKind::Entity => "int",
    };
    format!("execute store result {} {} {} run scoreboard players get {}", dst.render(), ty, dst.scale, render_operand(src))
}

/// Render an optimized IR list to command strings, one string per top-level op,
/// in order (§4.4). Fails with `CoreError::InternalInvariant` if an op reaches
/// here in a shape the command grammar can't express (§7) — a bug in the
/// unroller/optimizer upstream, not a user-facing condition.
pub fn serialize(ops: &[IrOp]) -> Result<Vec<String>, CoreError> {
    ops.iter().map(render_op).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operand::{Literal, ScoreRef};
    use crate::path::NbtPath;

    #[test]
    fn set_literal_renders_scoreboard_set() {
        let dst = ScoreRef::new("@s", "obj");
        let ops = vec![IrOp::Set(dst, Literal::int(7).into())];
        assert_eq!(serialize(&ops).unwrap(), vec!["scoreboard players set @s obj 7"]);
    }

    #[test]
    fn add_positive_literal_renders_add() {
        let dst = ScoreRef::new("@s", "obj");
        let ops = vec![IrOp::Add(dst, Literal::int(5).into())];
        assert_eq!(serialize(&ops).unwrap(), vec!["scoreboard players add @s obj 5"]);
    }

    #[test]
    fn mul_by_const_score_renders_operation() {
        let dst = ScoreRef::new("@s", "obj");
        let c = ScoreRef::new("$3", "bolt.expr.const");
        let ops = vec![IrOp::Mul(dst, Operand::Score(c))];
        assert_eq!(serialize(&ops).unwrap(), vec!["scoreboard players operation @s obj *= $3 bolt.expr.const"]);
    }

    #[test]
    fn bare_data_to_data_set_renders_from() {
        let dst = DataRef::storage("ns:x", NbtPath::named("a"));
        let src = DataRef::storage("ns:y", NbtPath::named("b"));
        let ops = vec![IrOp::DataSet(dst, Operand::Data(src))];
        assert_eq!(serialize(&ops).unwrap(), vec!["data modify storage ns:x a set from storage ns:y b"]);
    }

    #[test]
    fn scaled_data_set_renders_execute_store_result() {
        let dst = DataRef::storage("ns:x", NbtPath::named("a")).with_scale(2.0);
        let ops = vec![IrOp::DataSet(dst, Operand::Score(ScoreRef::new("@s", "obj")))];
        assert_eq!(serialize(&ops).unwrap(), vec!["execute store result storage ns:x a int 2 run scoreboard players get @s obj"]);
    }

    #[test]
    fn abs_if_chain_renders_matches_range() {
        let t0 = ScoreRef::new("$s0", "bolt.expr.temp");
        let c = ScoreRef::new("$-1", "bolt.expr.const");
        let body = IrOp::Mul(t0.clone(), Operand::Score(c));
        let cond = Cmp::LessThan(Operand::Score(t0), Literal::int(0).into());
        let ops = vec![IrOp::If(cond, Box::new(body))];
        assert_eq!(
            serialize(&ops).unwrap(),
            vec!["execute if score $s0 bolt.expr.temp matches ..-1 run scoreboard players operation $s0 bolt.expr.temp *= $-1 bolt.expr.const"]
        );
    }

    #[test]
    fn data_insert_renders_index_and_value() {
        let dst = DataRef::storage("ns:x", NbtPath::named("list"));
        let ops = vec![IrOp::DataInsert(dst, 0, Literal::int(9).into())];
        assert_eq!(serialize(&ops).unwrap(), vec!["data modify storage ns:x list insert 0 value 9"]);
    }

    #[test]
    fn set_with_data_source_is_an_internal_invariant_not_garbage_output() {
        let dst = ScoreRef::new("$s0", "bolt.expr.temp");
        let src = DataRef::storage("ns:x", NbtPath::named("a"));
        let ops = vec![IrOp::Set(dst, Operand::Data(src))];
        assert!(matches!(serialize(&ops), Err(CoreError::InternalInvariant { .. })));
    }

    #[test]
    fn set_with_data_source_nested_in_if_is_also_caught() {
        let dst = ScoreRef::new("$s0", "bolt.expr.temp");
        let src = DataRef::storage("ns:x", NbtPath::named("a"));
        let cond = Cmp::LessThan(Operand::Score(dst.clone()), Literal::int(0).into());
        let ops = vec![IrOp::If(cond, Box::new(IrOp::Set(dst, Operand::Data(src))))];
        assert!(matches!(serialize(&ops), Err(CoreError::InternalInvariant { .. })));
    }
}
