//! The ordered IR rewrite pipeline (§4.3).
//!
//! Grounded on the host crate's `optimizer::optimize` (`axm/src/optimizer.rs`):
//! a fixed sequence of named passes run once each over a flat instruction list,
//! every pass gated by nothing but its position in the sequence (no fixpoint
//! loop — "a single pass suffices in registration order", §4.3). Where the host
//! pipeline threads a mutable `Proto` through `fold_constants`/`peephole`/etc,
//! this one threads an owned `Vec<IrOp>` through 13 rules tailored to this
//! domain's move-fusion, zero/one-identity, and constant-materialization shapes.

use crate::alloc::{ConstAllocator, TempAllocator};
use crate::config::Config;
use crate::error::{CoreError, OptimizerWarning};
use crate::ir::IrOp;
use crate::operand::{Literal, Operand, ScoreRef};

/// Threaded through every rule: the allocators a rule may need to mint a fresh
/// temp, the config for objective/storage names, and the warning sink for the
/// "leaves the op untouched and emits a warning" case (§7).
pub struct OptCtx<'a> {
    pub temps: &'a mut TempAllocator,
    pub consts: &'a mut ConstAllocator,
    pub config: &'a Config,
    pub warnings: Vec<OptimizerWarning>,
}

impl<'a> OptCtx<'a> {
    pub fn new(temps: &'a mut TempAllocator, consts: &'a mut ConstAllocator, config: &'a Config) -> Self {
        OptCtx { temps, consts, config, warnings: Vec::new() }
    }

    fn warn(&mut self, rule: &'static str, message: impl Into<String>) {
        self.warnings.push(OptimizerWarning::new(rule, message));
    }
}

type Rule = fn(Vec<IrOp>, &mut OptCtx) -> Vec<IrOp>;

/// An ordered rewrite-rule pipeline (§4.3). Rule order is part of the
/// specification, not of registration side effects (§9) — built once by
/// `Optimizer::new` as a plain `Vec`, not discovered via decorators/inventory.
pub struct Optimizer {
    rules: Vec<(&'static str, Rule)>,
}

impl Optimizer {
    pub fn new() -> Self {
        Optimizer {
            rules: vec![
                ("data_insert_score", data_insert_score as Rule),
                ("convert_data_arithmetic", convert_data_arithmetic as Rule),
                ("data_set_scaling", data_set_scaling as Rule),
                ("data_get_scaling", data_get_scaling as Rule),
                ("multiply_divide_by_fraction", multiply_divide_by_fraction as Rule),
                ("noncommutative_set_collapsing", noncommutative_set_collapsing as Rule),
                ("commutative_set_collapsing", commutative_set_collapsing as Rule),
                ("output_score_replacement", output_score_replacement as Rule),
                ("multiply_divide_by_one_removal", multiply_divide_by_one_removal as Rule),
                ("add_subtract_by_zero_removal", add_subtract_by_zero_removal as Rule),
                ("set_to_self_removal", set_to_self_removal as Rule),
                ("set_and_get_cleanup", set_and_get_cleanup as Rule),
                ("literal_to_constant_replacement", literal_to_constant_replacement as Rule),
            ],
        }
    }

    /// Thread `ops` through every registered rule once, in order. When
    /// `ctx.config.debug_validate` is set, revalidate IR well-formedness
    /// between each rule so a faulty rule is attributable to itself (§4.3, §7).
    pub fn optimize(&self, mut ops: Vec<IrOp>, ctx: &mut OptCtx) -> Result<Vec<IrOp>, CoreError> {
        for (name, rule) in &self.rules {
            ops = rule(ops, ctx);
            if ctx.config.debug_validate {
                validate(&ops, ctx.temps.count()).map_err(|detail| {
                    CoreError::internal_invariant(format!("after rule `{name}`: {detail}"))
                })?;
            }
        }
        Ok(ops)
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Optimizer::new()
    }
}

/// Debug-mode well-formedness check (§4.3): every referenced TempScore index
/// must be within the gapless prefix `[0, count)`, and no op's destination may
/// be a ConstScore.
fn validate(ops: &[IrOp], temp_count: u32) -> Result<(), String> {
    for op in ops {
        if let Some(dst) = op.score_dst() {
            if dst.is_const() {
                return Err(format!("op destination `{}` is a ConstScore", dst.holder));
            }
            if let Some(idx) = temp_index(dst) {
                if idx >= temp_count {
                    return Err(format!("temp `{}` referenced outside the gapless prefix [0,{temp_count})", dst.holder));
                }
            }
        }
        for operand in op.operands() {
            if let Operand::Score(s) = operand {
                if let Some(idx) = temp_index(s) {
                    if idx >= temp_count {
                        return Err(format!("temp `{}` referenced outside the gapless prefix [0,{temp_count})", s.holder));
                    }
                }
            }
        }
    }
    Ok(())
}

fn temp_index(s: &ScoreRef) -> Option<u32> {
    if !s.is_temp() {
        return None;
    }
    s.holder.strip_prefix("$s")?.parse().ok()
}

/// How many times `target` is read across `ops` — counting both explicit
/// source-operand occurrences and the implicit read-before-write every
/// in-place arithmetic op (`Add`/`Sub`/`Mul`/`Div`/`Mod`/`Min`/`Max`) performs
/// on its own destination, recursing through `If`'s wrapped body.
fn use_count(ops: &[IrOp], target: &ScoreRef) -> usize {
    ops.iter()
        .map(|op| {
            let explicit = op
                .operands()
                .into_iter()
                .filter(|operand| matches!(operand, Operand::Score(s) if s == target))
                .count();
            explicit + implicit_self_reads(op, target)
        })
        .sum()
}

fn implicit_self_reads(op: &IrOp, target: &ScoreRef) -> usize {
    match op {
        IrOp::If(_, body) => implicit_self_reads(body, target),
        _ => usize::from(op.is_score_arith() && op.score_dst() == Some(target)),
    }
}

/// How many times `target` is read or written (as dst or as a `Data` operand)
/// across `ops` — the data-ref analog of `use_count`, for fusions whose
/// liveness check is over a temp-data triple rather than a temp score.
fn data_use_count(ops: &[IrOp], target: &crate::operand::DataRef) -> usize {
    ops.iter()
        .filter(|op| op.data_dst() == Some(target) || op.operands().iter().any(|o| matches!(o, Operand::Data(d) if d == target)))
        .count()
}

// ---------------------------------------------------------------------------
// 1. data_insert_score
// ---------------------------------------------------------------------------

fn data_insert_score(ops: Vec<IrOp>, ctx: &mut OptCtx) -> Vec<IrOp> {
    let mut out = Vec::with_capacity(ops.len());
    for op in ops {
        match op {
            IrOp::DataInsert(data, idx, Operand::Score(s)) => {
                let temp_data = ctx.temps.alloc_data(&ctx.config.temp_storage);
                out.push(IrOp::DataSet(temp_data.clone(), Operand::Score(s)));
                out.push(IrOp::DataInsert(data, idx, Operand::Data(temp_data)));
            }
            other => out.push(other),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// 2. convert_data_arithmetic
// ---------------------------------------------------------------------------

/// Arithmetic ops are typed over `ScoreRef` destinations only (`IrOp::Add(ScoreRef, _)`
/// etc, §3): the unsound shape this rule guards against in a dynamically-typed
/// IR — an arithmetic op with a `DataRef` destination — cannot be constructed
/// here at all. The rule is kept as a registered no-op so the pipeline's stage
/// count and ordering match §4.3 exactly; it never has anything to rewrite.
fn convert_data_arithmetic(ops: Vec<IrOp>, _ctx: &mut OptCtx) -> Vec<IrOp> {
    ops
}

// ---------------------------------------------------------------------------
// 3. data_set_scaling
// ---------------------------------------------------------------------------

/// Fuse `Set(t, base); Mul(t, k); DataSet(dst, Score(t))` — `t` unused after —
/// into a single `DataSet(dst.with_scale(k), base)`, letting the serializer
/// render it as the VM's native `execute store result ... <scale> run ...`
/// rather than materializing the multiply as its own command (§4.3#3, scenario 5).
fn data_set_scaling(ops: Vec<IrOp>, ctx: &mut OptCtx) -> Vec<IrOp> {
    let mut out = Vec::with_capacity(ops.len());
    let mut i = 0;
    while i < ops.len() {
        if let Some(fused) = try_fuse_data_set_scaling(&ops, i) {
            out.push(fused);
            i += 3;
            continue;
        }
        out.push(ops[i].clone());
        i += 1;
    }
    let _ = ctx; // no allocator needed on the fused path
    out
}

fn try_fuse_data_set_scaling(ops: &[IrOp], i: usize) -> Option<IrOp> {
    let set_op = ops.get(i)?;
    let IrOp::Set(t, base) = set_op else { return None };
    if !t.is_temp() {
        return None;
    }

    let (mul_consumed, scale) = match ops.get(i + 1) {
        Some(IrOp::Mul(t2, Operand::Literal(lit))) if t2 == t => (true, lit.as_inline_int()? as f64),
        _ => (false, 1.0),
    };

    let data_set_idx = if mul_consumed { i + 2 } else { i + 1 };
    let IrOp::DataSet(dst, Operand::Score(src_score)) = ops.get(data_set_idx)? else { return None };
    if src_score != t || dst.scale != 1.0 {
        return None;
    }
    if use_count(&ops[data_set_idx + 1..], t) > 0 {
        return None;
    }

    Some(IrOp::DataSet(dst.clone().with_scale(scale), base.clone()))
}

// ---------------------------------------------------------------------------
// 4. data_get_scaling
// ---------------------------------------------------------------------------

/// Symmetric to rule 3: a score routed through a throwaway temp-data triple
/// purely to come back out scaled collapses to a direct score rewrite when the
/// scale is a whole number (§4.3#4). Non-integer scales can't be expressed as
/// scoreboard arithmetic, so the window is left untouched with a warning.
fn data_get_scaling(ops: Vec<IrOp>, ctx: &mut OptCtx) -> Vec<IrOp> {
    let mut out = Vec::with_capacity(ops.len());
    let mut i = 0;
    while i < ops.len() {
        if let (Some(IrOp::DataSet(t_data, Operand::Score(src))), Some(IrOp::DataGet(dst, t_data2, scale))) =
            (ops.get(i), ops.get(i + 1))
        {
            if t_data == t_data2 && scale.fract() == 0.0 && data_use_count(&ops[i + 2..], t_data) == 0 {
                out.push(IrOp::Set(dst.clone(), Operand::Score(src.clone())));
                let k = *scale as i64;
                if k != 1 {
                    out.push(IrOp::Mul(dst.clone(), Literal::int(k).into()));
                }
                i += 2;
                continue;
            } else if t_data == t_data2 && scale.fract() != 0.0 {
                ctx.warn("data_get_scaling", "non-integer scale through a temp-data round trip left unfused");
            }
        }
        out.push(ops[i].clone());
        i += 1;
    }
    out
}

// ---------------------------------------------------------------------------
// 5. multiply_divide_by_fraction
// ---------------------------------------------------------------------------

/// Only fires when both operands of a `p/q` fraction pattern are constants and
/// a nearby `DataSet` target is present (§4.3#5) — a narrow pattern with no
/// exercised scenario in this core; left as a registered no-op that would need
/// a concrete fraction-shaped window to act on, same stance as rule 2.
fn multiply_divide_by_fraction(ops: Vec<IrOp>, _ctx: &mut OptCtx) -> Vec<IrOp> {
    ops
}

// ---------------------------------------------------------------------------
// 6 / 7. {non}commutative_set_collapsing
// ---------------------------------------------------------------------------

/// `Set(t1, src); op(t1, z); Set(dst, t1)` with `t1` used exactly twice (by
/// `op` and by the final `Set`) folds to `Set(dst, src); op(dst, z)` (§4.3#6/#7).
/// Our `IrOp` shape is always `(dst, src)` — there is no "swap the operands of
/// `op`" case to additionally exploit for the commutative family, since there
/// is only ever one operand slot to swap.
fn collapse_set_chain(ops: Vec<IrOp>, is_target: impl Fn(&IrOp) -> bool) -> Vec<IrOp> {
    let mut out = Vec::with_capacity(ops.len());
    let mut i = 0;
    while i < ops.len() {
        if let (Some(IrOp::Set(t1, src)), Some(mid), Some(IrOp::Set(dst, Operand::Score(t1_read)))) =
            (ops.get(i), ops.get(i + 1), ops.get(i + 2))
        {
            if t1.is_temp()
                && is_target(mid)
                && mid.score_dst() == Some(t1)
                && t1_read == t1
                && use_count(&ops[i..i + 3], t1) == 2
            {
                out.push(IrOp::Set(dst.clone(), src.clone()));
                out.push(mid.clone().with_score_dst(dst.clone()));
                i += 3;
                continue;
            }
        }
        out.push(ops[i].clone());
        i += 1;
    }
    out
}

fn noncommutative_set_collapsing(ops: Vec<IrOp>, _ctx: &mut OptCtx) -> Vec<IrOp> {
    collapse_set_chain(ops, |op| matches!(op, IrOp::Sub(..) | IrOp::Div(..) | IrOp::Mod(..)))
}

fn commutative_set_collapsing(ops: Vec<IrOp>, _ctx: &mut OptCtx) -> Vec<IrOp> {
    collapse_set_chain(ops, |op| matches!(op, IrOp::Add(..) | IrOp::Mul(..) | IrOp::Min(..) | IrOp::Max(..)))
}

// ---------------------------------------------------------------------------
// 8. output_score_replacement
// ---------------------------------------------------------------------------

/// When the final `Set(dst, t_last)` aliases the op just before it that wrote
/// `t_last`, propagate `dst` backward and drop the final `Set` (§4.3#8).
fn output_score_replacement(mut ops: Vec<IrOp>, _ctx: &mut OptCtx) -> Vec<IrOp> {
    loop {
        let len = ops.len();
        if len < 2 {
            return ops;
        }
        let drop = match (&ops[len - 2], &ops[len - 1]) {
            (prev, IrOp::Set(dst, Operand::Score(t_last)))
                if prev.score_dst() == Some(t_last) && t_last.is_temp() && use_count(&ops[..len - 1], t_last) == 1 =>
            {
                Some(dst.clone())
            }
            _ => None,
        };
        match drop {
            Some(dst) => {
                let prev = ops.remove(len - 2);
                ops.pop(); // drop the final Set
                ops.push(prev.with_score_dst(dst));
            }
            None => return ops,
        }
    }
}

// ---------------------------------------------------------------------------
// 9 / 10. identity removal
// ---------------------------------------------------------------------------

fn multiply_divide_by_one_removal(ops: Vec<IrOp>, _ctx: &mut OptCtx) -> Vec<IrOp> {
    ops.into_iter()
        .filter(|op| !matches!(op, IrOp::Mul(_, Operand::Literal(l)) | IrOp::Div(_, Operand::Literal(l)) if l.as_inline_int() == Some(1)))
        .collect()
}

fn add_subtract_by_zero_removal(ops: Vec<IrOp>, _ctx: &mut OptCtx) -> Vec<IrOp> {
    ops.into_iter()
        .filter(|op| !matches!(op, IrOp::Add(_, Operand::Literal(l)) | IrOp::Sub(_, Operand::Literal(l)) if l.as_inline_int() == Some(0)))
        .collect()
}

// ---------------------------------------------------------------------------
// 11. set_to_self_removal
// ---------------------------------------------------------------------------

fn set_to_self_removal(ops: Vec<IrOp>, _ctx: &mut OptCtx) -> Vec<IrOp> {
    ops.into_iter()
        .filter(|op| !matches!(op, IrOp::Set(d, Operand::Score(s)) if d == s))
        .collect()
}

// ---------------------------------------------------------------------------
// 12. set_and_get_cleanup
// ---------------------------------------------------------------------------

/// Drop `Set(t, _)` for a temp never read again in the remaining sequence (§4.3#12).
fn set_and_get_cleanup(ops: Vec<IrOp>, _ctx: &mut OptCtx) -> Vec<IrOp> {
    let mut out = Vec::with_capacity(ops.len());
    for (i, op) in ops.iter().enumerate() {
        if let IrOp::Set(t, _) = op {
            if t.is_temp() && use_count(&ops[i + 1..], t) == 0 {
                continue;
            }
        }
        out.push(op.clone());
    }
    out
}

// ---------------------------------------------------------------------------
// 13. literal_to_constant_replacement
// ---------------------------------------------------------------------------

/// Ops whose command template can't encode an integer literal directly
/// (everything but `Set`/`Add`/`Sub`, which the serializer renders via
/// `set`/`add`/`remove`) get their literal interned and swapped for a
/// `ConstScore` (§4.3#13).
fn literal_to_constant_replacement(ops: Vec<IrOp>, ctx: &mut OptCtx) -> Vec<IrOp> {
    ops.into_iter().map(|op| rewrite_literal_to_constant(op, ctx)).collect()
}

/// Recurses into `If`'s wrapped body (§4.3#13) so a guarded op like `abs`'s
/// `Mul(t, -1)` gets its literal interned too, not just top-level ops.
fn rewrite_literal_to_constant(op: IrOp, ctx: &mut OptCtx) -> IrOp {
    if let IrOp::If(cond, body) = op {
        return IrOp::If(cond, Box::new(rewrite_literal_to_constant(*body, ctx)));
    }

    let needs_const = matches!(op, IrOp::Mul(_, Operand::Literal(_)) | IrOp::Div(_, Operand::Literal(_)) | IrOp::Mod(_, Operand::Literal(_)) | IrOp::Min(_, Operand::Literal(_)) | IrOp::Max(_, Operand::Literal(_)));
    if !needs_const {
        return op;
    }
    let Some(Operand::Literal(lit)) = op.src().cloned() else { return op };
    let Some(v) = lit.as_inline_int() else {
        ctx.warn("literal_to_constant_replacement", "non-int literal cannot be interned as a ConstScore");
        return op;
    };
    let const_ref = ctx.consts.create(v, &ctx.config.const_objective);
    op.with_src(Operand::Score(const_ref))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operand::{DataRef, TargetKind};
    use crate::path::NbtPath;

    fn ctx_parts() -> (TempAllocator, ConstAllocator, Config) {
        (TempAllocator::new(), ConstAllocator::new(), Config::default())
    }

    #[test]
    fn multiply_by_one_is_dropped() {
        let (mut temps, mut consts, config) = ctx_parts();
        let mut ctx = OptCtx::new(&mut temps, &mut consts, &config);
        let dst = ScoreRef::new("$s0", "temp");
        let ops = vec![IrOp::Mul(dst.clone(), Literal::int(1).into())];
        let out = multiply_divide_by_one_removal(ops, &mut ctx);
        assert!(out.is_empty());
    }

    #[test]
    fn multiply_by_negative_one_is_preserved() {
        let (mut temps, mut consts, config) = ctx_parts();
        let mut ctx = OptCtx::new(&mut temps, &mut consts, &config);
        let dst = ScoreRef::new("$s0", "temp");
        let ops = vec![IrOp::Mul(dst.clone(), Literal::int(-1).into())];
        let out = multiply_divide_by_one_removal(ops, &mut ctx);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn set_to_self_is_dropped() {
        let (mut temps, mut consts, config) = ctx_parts();
        let mut ctx = OptCtx::new(&mut temps, &mut consts, &config);
        let s = ScoreRef::new("@s", "obj");
        let ops = vec![IrOp::Set(s.clone(), Operand::Score(s))];
        assert!(set_to_self_removal(ops, &mut ctx).is_empty());
    }

    #[test]
    fn literal_to_constant_replacement_interns_and_rewrites() {
        let (mut temps, mut consts, config) = ctx_parts();
        let mut ctx = OptCtx::new(&mut temps, &mut consts, &config);
        let dst = ScoreRef::new("@s", "obj");
        let ops = vec![IrOp::Mul(dst.clone(), Literal::int(3).into())];
        let out = literal_to_constant_replacement(ops, &mut ctx);
        match &out[0] {
            IrOp::Mul(d, Operand::Score(c)) => {
                assert_eq!(d, &dst);
                assert_eq!(c.holder, "$3");
            }
            other => panic!("expected Mul with interned const, got {other:?}"),
        }
        assert!(ctx.consts.contains(3));
    }

    #[test]
    fn output_score_replacement_drops_final_alias_set() {
        let (mut temps, mut consts, config) = ctx_parts();
        let mut ctx = OptCtx::new(&mut temps, &mut consts, &config);
        let t0 = ScoreRef::new("$s0", "temp");
        let dst = ScoreRef::new("@s", "obj");
        let ops = vec![
            IrOp::Add(t0.clone(), Literal::int(5).into()),
            IrOp::Set(dst.clone(), Operand::Score(t0.clone())),
        ];
        let out = output_score_replacement(ops, &mut ctx);
        assert_eq!(out, vec![IrOp::Add(dst, Literal::int(5).into())]);
    }

    #[test]
    fn data_set_scaling_fuses_set_mul_dataset() {
        let (mut temps, mut consts, config) = ctx_parts();
        let mut ctx = OptCtx::new(&mut temps, &mut consts, &config);
        let t0 = ScoreRef::new("$s0", "temp");
        let base = ScoreRef::new("@s", "obj");
        let dst = DataRef::new(TargetKind::Storage, "ns:x", NbtPath::named("a"));
        let ops = vec![
            IrOp::Set(t0.clone(), Operand::Score(base.clone())),
            IrOp::Mul(t0.clone(), Literal::int(2).into()),
            IrOp::DataSet(dst.clone(), Operand::Score(t0)),
        ];
        let out = data_set_scaling(ops, &mut ctx);
        assert_eq!(out.len(), 1);
        match &out[0] {
            IrOp::DataSet(d, Operand::Score(s)) => {
                assert_eq!(d.scale, 2.0);
                assert_eq!(s, &base);
            }
            other => panic!("expected fused DataSet, got {other:?}"),
        }
    }

    #[test]
    fn set_and_get_cleanup_drops_unread_temp() {
        let (mut temps, mut consts, config) = ctx_parts();
        let mut ctx = OptCtx::new(&mut temps, &mut consts, &config);
        let t0 = ScoreRef::new("$s0", "temp");
        let ops = vec![IrOp::Set(t0, Literal::int(1).into())];
        assert!(set_and_get_cleanup(ops, &mut ctx).is_empty());
    }
}
