//! The expression tree built by operator overloading (§4.1, §9), and `unroll()` —
//! lowering a tree to linear three-address IR.
//!
//! Grounded on the host crate's `compiler::Compiler::compile_expr`: a recursive
//! descent over an `Expr` tree that emits instructions and returns the operand
//! holding the subtree's value, with a small register allocator threaded through.
//! The destination-reuse trick there (reuse the left operand's register as `dst`
//! when it's already a temp, rather than always allocating fresh) is exactly
//! this module's `materialize` helper.

use crate::alloc::TempAllocator;
use crate::error::CoreError;
use crate::ir::{Cmp, IrOp};
use crate::operand::{DataRef, Literal, Operand, ScoreRef};
use crate::value::NbtValue;

/// The binary arithmetic family (§3/§4.3). `Min`/`Max` are included per the
/// newer-revision resolution of the Min/Max operand-swap open question (§9):
/// they share the commutative tie-break with `Add`/`Mul`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Min,
    Max,
}

impl BinOp {
    pub fn is_commutative(&self) -> bool {
        matches!(self, BinOp::Add | BinOp::Mul | BinOp::Min | BinOp::Max)
    }

    fn make_op(&self, dst: ScoreRef, src: Operand) -> IrOp {
        match self {
            BinOp::Add => IrOp::Add(dst, src),
            BinOp::Sub => IrOp::Sub(dst, src),
            BinOp::Mul => IrOp::Mul(dst, src),
            BinOp::Div => IrOp::Div(dst, src),
            BinOp::Mod => IrOp::Mod(dst, src),
            BinOp::Min => IrOp::Min(dst, src),
            BinOp::Max => IrOp::Max(dst, src),
        }
    }
}

/// The expression tree a host caller builds via operator overloading or the
/// builder methods below (§4.1, §9). Immutable after construction (§3 Lifecycles).
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Score(ScoreRef),
    Data(DataRef),
    Literal(Literal),
    BinOp(BinOp, Box<Expr>, Box<Expr>),
    /// Variadic `min`/`max` (§4.1): purely-literal operands collapse host-side
    /// before any IR is folded.
    MinMax(MinMaxKind, Vec<Expr>),
    Abs(Box<Expr>),
    Set(Box<Expr>, Box<Expr>),
    Insert(Box<Expr>, i32, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinMaxKind {
    Min,
    Max,
}

impl MinMaxKind {
    fn as_binop(&self) -> BinOp {
        match self {
            MinMaxKind::Min => BinOp::Min,
            MinMaxKind::Max => BinOp::Max,
        }
    }

    fn fold_literal(&self, a: i64, b: i64) -> i64 {
        match self {
            MinMaxKind::Min => a.min(b),
            MinMaxKind::Max => a.max(b),
        }
    }
}

impl Expr {
    pub fn score(holder: impl Into<String>, objective: impl Into<String>) -> Self {
        Expr::Score(ScoreRef::new(holder, objective))
    }

    pub fn data(data: DataRef) -> Self {
        Expr::Data(data)
    }

    pub fn int(v: i64) -> Self {
        Expr::Literal(Literal::int(v))
    }

    pub fn literal(value: NbtValue) -> Self {
        Expr::Literal(Literal::new(value))
    }

    pub fn set(lhs: Expr, rhs: Expr) -> Self {
        Expr::Set(Box::new(lhs), Box::new(rhs))
    }

    pub fn insert(data: Expr, index: i32, value: Expr) -> Self {
        Expr::Insert(Box::new(data), index, Box::new(value))
    }

    pub fn min(items: Vec<Expr>) -> Self {
        Expr::MinMax(MinMaxKind::Min, items)
    }

    pub fn max(items: Vec<Expr>) -> Self {
        Expr::MinMax(MinMaxKind::Max, items)
    }

    pub fn abs(self) -> Self {
        Expr::Abs(Box::new(self))
    }

    /// Is this a composite ("Operation") node rather than a leaf, per the
    /// commutative tie-break's vocabulary (§4.1)?
    fn is_operation(&self) -> bool {
        !matches!(self, Expr::Score(_) | Expr::Data(_) | Expr::Literal(_))
    }

    fn as_data_ref(&self) -> Option<&DataRef> {
        match self {
            Expr::Data(d) => Some(d),
            _ => None,
        }
    }

    /// Lower this expression to linear IR, returning the operand that holds
    /// its value once `ops` have executed (§4.1).
    pub fn unroll(&self, temps: &mut TempAllocator, temp_objective: &str) -> Result<(Vec<IrOp>, Operand), CoreError> {
        match self {
            Expr::Score(_) | Expr::Data(_) | Expr::Literal(_) => Ok((Vec::new(), self.leaf_operand())),

            Expr::BinOp(kind, a, b) => unroll_binop(*kind, a, b, temps, temp_objective),

            Expr::MinMax(kind, items) => unroll_minmax(*kind, items, temps, temp_objective),

            Expr::Abs(x) => unroll_abs(x, temps, temp_objective),

            Expr::Set(lhs, rhs) => {
                let ops = unroll_set(lhs, rhs, temps, temp_objective)?;
                // A `Set` is a statement, not a value-producing subexpression;
                // its "tail" is the (already-written) destination operand.
                let tail = lhs.leaf_operand();
                Ok((ops, tail))
            }

            Expr::Insert(data, idx, value) => {
                let data_ref = data
                    .as_data_ref()
                    .ok_or_else(|| CoreError::type_mismatch("DataRef", "non-data insert target"))?;
                let ops = unroll_insert(data_ref, *idx, value, temps, temp_objective)?;
                Ok((ops, Operand::Data(data_ref.clone())))
            }
        }
    }

    fn leaf_operand(&self) -> Operand {
        match self {
            Expr::Score(s) => Operand::Score(s.clone()),
            Expr::Data(d) => Operand::Data(d.clone()),
            Expr::Literal(l) => Operand::Literal(l.clone()),
            _ => unreachable!("leaf_operand called on a non-leaf Expr"),
        }
    }
}

/// Materialize `operand` into a writable `ScoreRef` destination, reusing it in
/// place when it is already a `TempScore` rather than allocating a fresh one
/// (§4.1 step 2) — the same reuse-if-already-a-temp trick as the host crate's
/// register allocator avoiding a redundant `Move`.
fn materialize(ops: &mut Vec<IrOp>, operand: Operand, temps: &mut TempAllocator, temp_objective: &str) -> ScoreRef {
    match operand {
        Operand::Score(s) if s.is_temp() => s,
        other => {
            let t = temps.alloc(temp_objective);
            write_score(ops, t.clone(), other);
            t
        }
    }
}

/// Emit the op that reads `src` into `dst` (a score). `Set` is score-refs only
/// (§3 invariant) — a bare data leaf read into a score must route through
/// `DataGet` instead, never a `Set` with a `Data` source.
fn write_score(ops: &mut Vec<IrOp>, dst: ScoreRef, src: Operand) {
    match src {
        Operand::Data(d) => ops.push(IrOp::DataGet(dst, d, 1.0)),
        other => ops.push(IrOp::Set(dst, other)),
    }
}

fn unroll_binop(
    kind: BinOp,
    a: &Expr,
    b: &Expr,
    temps: &mut TempAllocator,
    temp_objective: &str,
) -> Result<(Vec<IrOp>, Operand), CoreError> {
    // Commutative tie-break (§4.1): if exactly one operand is a leaf and the
    // other is an Operation, swap so the Operation is the former — this puts
    // the accumulator on the left, enabling more in-place fusion later.
    let (first, second) = if kind.is_commutative() && !a.is_operation() && b.is_operation() {
        (b, a)
    } else {
        (a, b)
    };

    let (mut ops, ta) = first.unroll(temps, temp_objective)?;
    let (ops_b, tb) = second.unroll(temps, temp_objective)?;
    ops.extend(ops_b);

    let dst = materialize(&mut ops, ta, temps, temp_objective);
    ops.push(kind.make_op(dst.clone(), tb));
    Ok((ops, Operand::Score(dst)))
}

fn unroll_minmax(
    kind: MinMaxKind,
    items: &[Expr],
    temps: &mut TempAllocator,
    temp_objective: &str,
) -> Result<(Vec<IrOp>, Operand), CoreError> {
    if items.is_empty() {
        return Err(CoreError::invalid_literal("min/max requires at least one operand"));
    }

    // Purely-literal tails collapse host-side (§4.1): fold every int literal
    // operand into one before building any IR.
    let mut literal_acc: Option<i64> = None;
    let mut rest: Vec<&Expr> = Vec::new();
    for item in items {
        if let Expr::Literal(lit) = item {
            if let Some(v) = lit.as_inline_int() {
                literal_acc = Some(match literal_acc {
                    None => v,
                    Some(acc) => kind.fold_literal(acc, v),
                });
                continue;
            }
        }
        rest.push(item);
    }

    let folded_literal = literal_acc.map(Expr::int);
    let mut chain: Vec<&Expr> = rest;
    if let Some(ref folded) = folded_literal {
        chain.push(folded);
    }

    let mut iter = chain.into_iter();
    let first = iter.next().expect("at least one operand survives literal folding");
    let (mut ops, mut acc) = first.unroll(temps, temp_objective)?;

    for next in iter {
        let (next_ops, tb) = next.unroll(temps, temp_objective)?;
        ops.extend(next_ops);
        let dst = materialize(&mut ops, acc, temps, temp_objective);
        ops.push(kind.as_binop().make_op(dst.clone(), tb));
        acc = Operand::Score(dst);
    }

    Ok((ops, acc))
}

fn unroll_abs(x: &Expr, temps: &mut TempAllocator, temp_objective: &str) -> Result<(Vec<IrOp>, Operand), CoreError> {
    // abs(x) desugars to If(LessThan(x, 0), Multiply(x, -1)) before unrolling (§4.1).
    let (mut ops, tx) = x.unroll(temps, temp_objective)?;
    let dst = materialize(&mut ops, tx, temps, temp_objective);
    let cond = Cmp::LessThan(Operand::Score(dst.clone()), Literal::int(0).into());
    let body = IrOp::Mul(dst.clone(), Literal::int(-1).into());
    ops.push(IrOp::If(cond, Box::new(body)));
    Ok((ops, Operand::Score(dst)))
}

fn unroll_set(lhs: &Expr, rhs: &Expr, temps: &mut TempAllocator, temp_objective: &str) -> Result<Vec<IrOp>, CoreError> {
    // If rhs is a bare DataRef and lhs is DataRef, emit a single DataSet (§4.1 step 2).
    if let (Expr::Data(lhs_data), Expr::Data(rhs_data)) = (lhs, rhs) {
        return Ok(vec![IrOp::DataSet(lhs_data.clone(), Operand::Data(rhs_data.clone()))]);
    }

    let (mut ops, tail) = rhs.unroll(temps, temp_objective)?;
    match lhs {
        Expr::Score(s) => write_score(&mut ops, s.clone(), tail),
        Expr::Data(d) => ops.push(IrOp::DataSet(d.clone(), tail)),
        _ => return Err(CoreError::type_mismatch("Score or Data assignment target", "composite expression")),
    }
    Ok(ops)
}

fn unroll_insert(
    data: &DataRef,
    idx: i32,
    value: &Expr,
    temps: &mut TempAllocator,
    temp_objective: &str,
) -> Result<Vec<IrOp>, CoreError> {
    match value {
        Expr::Data(d) => Ok(vec![IrOp::DataInsert(data.clone(), idx, Operand::Data(d.clone()))]),
        Expr::Literal(l) => Ok(vec![IrOp::DataInsert(data.clone(), idx, Operand::Literal(l.clone()))]),
        _ => {
            let (mut ops, tail) = value.unroll(temps, temp_objective)?;
            // Placeholder insert, then overwrite in place once the value is known (§4.1).
            ops.push(IrOp::DataInsert(data.clone(), idx, Operand::Literal(Literal::int(0))));
            ops.push(IrOp::DataSet(data.index(idx), tail));
            Ok(ops)
        }
    }
}

// ---------------------------------------------------------------------------
// Operator overloading (§9: Rust callers get `a + b` natively, not just a
// builder surface).
// ---------------------------------------------------------------------------

impl std::ops::Add for Expr {
    type Output = Expr;
    fn add(self, rhs: Expr) -> Expr {
        Expr::BinOp(BinOp::Add, Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Sub for Expr {
    type Output = Expr;
    fn sub(self, rhs: Expr) -> Expr {
        Expr::BinOp(BinOp::Sub, Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Mul for Expr {
    type Output = Expr;
    fn mul(self, rhs: Expr) -> Expr {
        Expr::BinOp(BinOp::Mul, Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Div for Expr {
    type Output = Expr;
    fn div(self, rhs: Expr) -> Expr {
        Expr::BinOp(BinOp::Div, Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Rem for Expr {
    type Output = Expr;
    fn rem(self, rhs: Expr) -> Expr {
        Expr::BinOp(BinOp::Mod, Box::new(self), Box::new(rhs))
    }
}
