//! Three-address IR operations (§3). Grounded on the host crate's `bytecode::Instr`
//! tagged-instruction shape, generalized from fixed-width register operands to the
//! typed `Operand` slots this domain needs (score-refs, data-refs, literals).

use crate::operand::{DataRef, Literal, Operand, ScoreRef};

/// A comparison over score-refs, used as the guard of an `IrOp::If` (§3).
#[derive(Debug, Clone, PartialEq)]
pub enum Cmp {
    LessThan(Operand, Operand),
    LessEqual(Operand, Operand),
    GreaterThan(Operand, Operand),
    GreaterEqual(Operand, Operand),
    Equal(Operand, Operand),
}

impl Cmp {
    /// Referenced operands, for use-count/liveness scans (§4.3 rules 6/7/12).
    pub fn operands(&self) -> [&Operand; 2] {
        match self {
            Cmp::LessThan(a, b)
            | Cmp::LessEqual(a, b)
            | Cmp::GreaterThan(a, b)
            | Cmp::GreaterEqual(a, b)
            | Cmp::Equal(a, b) => [a, b],
        }
    }
}

/// Three-address IR operation (§3). `dst` is always the first field where an
/// op has one; `Set`/arithmetic ops never have a `ConstScore` destination
/// (§3 invariant).
#[derive(Debug, Clone, PartialEq)]
pub enum IrOp {
    Set(ScoreRef, Operand),
    Add(ScoreRef, Operand),
    Sub(ScoreRef, Operand),
    Mul(ScoreRef, Operand),
    Div(ScoreRef, Operand),
    Mod(ScoreRef, Operand),
    Min(ScoreRef, Operand),
    Max(ScoreRef, Operand),

    DataSet(DataRef, Operand),
    DataGet(ScoreRef, DataRef, f64),
    DataMerge(DataRef, Operand),
    DataInsert(DataRef, i32, Operand),
    DataAppend(DataRef, Operand),
    DataPrepend(DataRef, Operand),
    DataRemove(DataRef),

    If(Cmp, Box<IrOp>),
}

impl IrOp {
    /// Is this a straight-line score arithmetic op (the family the optimizer's
    /// peepholes 9/10/13 fire on)?
    pub fn is_score_arith(&self) -> bool {
        matches!(
            self,
            IrOp::Add(..) | IrOp::Sub(..) | IrOp::Mul(..) | IrOp::Div(..) | IrOp::Mod(..) | IrOp::Min(..) | IrOp::Max(..)
        )
    }

    pub fn is_commutative_arith(&self) -> bool {
        matches!(self, IrOp::Add(..) | IrOp::Mul(..) | IrOp::Min(..) | IrOp::Max(..))
    }

    pub fn is_noncommutative_arith(&self) -> bool {
        matches!(self, IrOp::Sub(..) | IrOp::Div(..) | IrOp::Mod(..))
    }

    /// The score destination, when this op writes one (everything except the
    /// data-family ops and `If`, whose destination lives on the wrapped op).
    pub fn score_dst(&self) -> Option<&ScoreRef> {
        match self {
            IrOp::Set(d, _)
            | IrOp::Add(d, _)
            | IrOp::Sub(d, _)
            | IrOp::Mul(d, _)
            | IrOp::Div(d, _)
            | IrOp::Mod(d, _)
            | IrOp::Min(d, _)
            | IrOp::Max(d, _)
            | IrOp::DataGet(d, _, _) => Some(d),
            IrOp::If(_, body) => body.score_dst(),
            _ => None,
        }
    }

    pub fn data_dst(&self) -> Option<&DataRef> {
        match self {
            IrOp::DataSet(d, _)
            | IrOp::DataMerge(d, _)
            | IrOp::DataInsert(d, _, _)
            | IrOp::DataAppend(d, _)
            | IrOp::DataPrepend(d, _)
            | IrOp::DataRemove(d) => Some(d),
            IrOp::If(_, body) => body.data_dst(),
            _ => None,
        }
    }

    /// The `src`/`latter` operand, for ops that have a single source slot
    /// besides their destination. `None` for ops without a uniform single
    /// source (`If`, `DataInsert`'s index+src pair handled separately).
    pub fn src(&self) -> Option<&Operand> {
        match self {
            IrOp::Set(_, s)
            | IrOp::Add(_, s)
            | IrOp::Sub(_, s)
            | IrOp::Mul(_, s)
            | IrOp::Div(_, s)
            | IrOp::Mod(_, s)
            | IrOp::Min(_, s)
            | IrOp::Max(_, s)
            | IrOp::DataSet(_, s)
            | IrOp::DataMerge(_, s)
            | IrOp::DataAppend(_, s)
            | IrOp::DataPrepend(_, s) => Some(s),
            IrOp::DataInsert(_, _, s) => Some(s),
            _ => None,
        }
    }

    /// Every operand this op reads or writes, for liveness/use-count scans.
    pub fn operands(&self) -> Vec<&Operand> {
        match self {
            IrOp::If(cond, body) => {
                let mut ops: Vec<&Operand> = cond.operands().to_vec();
                ops.extend(body.operands());
                ops
            }
            other => other.src().into_iter().collect(),
        }
    }

    /// Rebuild this op with its score destination replaced, used by the
    /// optimizer's fold/collapse rules (§4.3#6-8) to retarget a chain onto
    /// the eventual output score without re-deriving the op's shape.
    pub fn with_score_dst(self, new_dst: ScoreRef) -> IrOp {
        match self {
            IrOp::Set(_, s) => IrOp::Set(new_dst, s),
            IrOp::Add(_, s) => IrOp::Add(new_dst, s),
            IrOp::Sub(_, s) => IrOp::Sub(new_dst, s),
            IrOp::Mul(_, s) => IrOp::Mul(new_dst, s),
            IrOp::Div(_, s) => IrOp::Div(new_dst, s),
            IrOp::Mod(_, s) => IrOp::Mod(new_dst, s),
            IrOp::Min(_, s) => IrOp::Min(new_dst, s),
            IrOp::Max(_, s) => IrOp::Max(new_dst, s),
            IrOp::DataGet(_, d, scale) => IrOp::DataGet(new_dst, d, scale),
            IrOp::If(cond, body) => IrOp::If(cond, Box::new(body.with_score_dst(new_dst))),
            other => other,
        }
    }

    /// Rebuild this op with its source operand replaced, used by the
    /// optimizer's `literal_to_constant_replacement` rule (§4.3#13).
    pub fn with_src(self, new_src: Operand) -> IrOp {
        match self {
            IrOp::Set(d, _) => IrOp::Set(d, new_src),
            IrOp::Add(d, _) => IrOp::Add(d, new_src),
            IrOp::Sub(d, _) => IrOp::Sub(d, new_src),
            IrOp::Mul(d, _) => IrOp::Mul(d, new_src),
            IrOp::Div(d, _) => IrOp::Div(d, new_src),
            IrOp::Mod(d, _) => IrOp::Mod(d, new_src),
            IrOp::Min(d, _) => IrOp::Min(d, new_src),
            IrOp::Max(d, _) => IrOp::Max(d, new_src),
            IrOp::DataSet(d, _) => IrOp::DataSet(d, new_src),
            IrOp::DataMerge(d, _) => IrOp::DataMerge(d, new_src),
            IrOp::DataAppend(d, _) => IrOp::DataAppend(d, new_src),
            IrOp::DataPrepend(d, _) => IrOp::DataPrepend(d, new_src),
            IrOp::DataInsert(d, i, _) => IrOp::DataInsert(d, i, new_src),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operand::Literal;

    #[test]
    fn classifies_commutative_vs_noncommutative() {
        let dst = ScoreRef::new("$s0", "obj");
        assert!(IrOp::Add(dst.clone(), Literal::int(1).into()).is_commutative_arith());
        assert!(IrOp::Sub(dst.clone(), Literal::int(1).into()).is_noncommutative_arith());
        assert!(!IrOp::Add(dst, Literal::int(1).into()).is_noncommutative_arith());
    }

    #[test]
    fn if_delegates_dst_to_body() {
        let dst = ScoreRef::new("$s0", "obj");
        let body = IrOp::Mul(dst.clone(), Literal::int(-1).into());
        let cmp = Cmp::LessThan(Operand::Score(dst.clone()), Literal::int(0).into());
        let wrapped = IrOp::If(cmp, Box::new(body));
        assert_eq!(wrapped.score_dst(), Some(&dst));
    }
}
