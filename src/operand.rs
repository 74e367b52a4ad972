//! Source operands — score-ref, data-ref, literal (§3).

use crate::path::NbtPath;
use crate::value::{NbtValue, TypeTag};

/// `(holder, objective)` pair addressing one scoreboard entry.
///
/// Two subflavors are distinguished purely by holder shape, matching §3/§6's
/// token-level grammar: `$s<n>` is a compiler temp, `$<int>` is an interned
/// constant. Both are represented uniformly here — the distinction only
/// matters to the allocators and the optimizer's `literal_to_constant_replacement`
/// rule, not to serialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScoreRef {
    pub holder: String,
    pub objective: String,
}

impl ScoreRef {
    pub fn new(holder: impl Into<String>, objective: impl Into<String>) -> Self {
        ScoreRef { holder: holder.into(), objective: objective.into() }
    }

    /// A `TempScore`'s holder always matches `$s<n>` (see `crate::alloc::TempAllocator`).
    pub fn is_temp(&self) -> bool {
        self.holder.strip_prefix("$s").is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
    }

    /// A `ConstScore`'s holder matches `$<int>` (see `crate::alloc::ConstAllocator`).
    /// Returns the carried integer value when it does.
    pub fn const_value(&self) -> Option<i64> {
        if !self.holder.starts_with('$') || self.is_temp() {
            return None;
        }
        self.holder[1..].parse::<i64>().ok()
    }

    pub fn is_const(&self) -> bool {
        self.const_value().is_some()
    }
}

/// A typed nested-tag data address (§3).
#[derive(Debug, Clone, PartialEq)]
pub struct DataRef {
    pub target_kind: TargetKind,
    pub target: String,
    pub path: NbtPath,
    pub scale: f64,
    pub nbt_type: TypeTag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Storage,
    Entity,
    Block,
}

impl TargetKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            TargetKind::Storage => "storage",
            TargetKind::Entity => "entity",
            TargetKind::Block => "block",
        }
    }
}

impl DataRef {
    pub fn new(target_kind: TargetKind, target: impl Into<String>, path: NbtPath) -> Self {
        DataRef { target_kind, target: target.into(), path, scale: 1.0, nbt_type: TypeTag::Any }
    }

    pub fn storage(target: impl Into<String>, path: NbtPath) -> Self {
        DataRef::new(TargetKind::Storage, target, path)
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_type(mut self, nbt_type: TypeTag) -> Self {
        self.nbt_type = nbt_type;
        self
    }

    /// Typed child accessor replacing dynamic attribute access (§9): returns a
    /// new `DataRef` with a `NamedKey` appended and the child's nbt_type looked
    /// up via `TypeTag::child_type`, defaulting to `Any` on failure (§3).
    pub fn child(&self, name: impl Into<String>) -> DataRef {
        let name = name.into();
        let child_type = self.nbt_type.child_type(&crate::path::Accessor::NamedKey(name.clone()));
        DataRef {
            target_kind: self.target_kind,
            target: self.target.clone(),
            path: self.path.child(name),
            scale: 1.0,
            nbt_type: child_type,
        }
    }

    pub fn index(&self, idx: i32) -> DataRef {
        DataRef {
            target_kind: self.target_kind,
            target: self.target.clone(),
            path: self.path.index(idx),
            scale: 1.0,
            nbt_type: TypeTag::Any,
        }
    }

    /// Render the `<kind> <target> <path>` triple as it appears embedded in a command.
    pub fn render(&self) -> String {
        if self.path.is_empty() {
            format!("{} {}", self.target_kind.keyword(), self.target)
        } else {
            format!("{} {} {}", self.target_kind.keyword(), self.target, self.path.render())
        }
    }
}

/// A literal value embedded directly in an expression (§3).
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: NbtValue,
}

impl Literal {
    pub fn new(value: NbtValue) -> Self {
        Literal { value }
    }

    pub fn int(v: i64) -> Self {
        Literal { value: NbtValue::Int(v) }
    }

    /// An integer literal that fits the command grammar's direct-int encoding,
    /// used by the optimizer's `literal_to_constant_replacement` rule (§4.3#13)
    /// to decide whether a literal needs interning.
    pub fn as_inline_int(&self) -> Option<i64> {
        match self.value {
            NbtValue::Int(i) => Some(i),
            _ => None,
        }
    }
}

/// The tagged union of every operand kind an IR op's slots can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Score(ScoreRef),
    Data(DataRef),
    Literal(Literal),
}

impl Operand {
    pub fn is_temp_score(&self) -> bool {
        matches!(self, Operand::Score(s) if s.is_temp())
    }

    pub fn is_const_score(&self) -> bool {
        matches!(self, Operand::Score(s) if s.is_const())
    }

    pub fn as_score(&self) -> Option<&ScoreRef> {
        match self {
            Operand::Score(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_data(&self) -> Option<&DataRef> {
        match self {
            Operand::Data(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_inline_int(&self) -> Option<i64> {
        match self {
            Operand::Literal(l) => l.as_inline_int(),
            _ => None,
        }
    }
}

impl From<ScoreRef> for Operand {
    fn from(s: ScoreRef) -> Self {
        Operand::Score(s)
    }
}

impl From<DataRef> for Operand {
    fn from(d: DataRef) -> Self {
        Operand::Data(d)
    }
}

impl From<Literal> for Operand {
    fn from(l: Literal) -> Self {
        Operand::Literal(l)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_score_holder_shape() {
        assert!(ScoreRef::new("$s0", "obj").is_temp());
        assert!(!ScoreRef::new("$s0", "obj").is_const());
        assert!(!ScoreRef::new("@s", "obj").is_temp());
    }

    #[test]
    fn const_score_carries_value() {
        let c = ScoreRef::new("$-1", "const");
        assert_eq!(c.const_value(), Some(-1));
        assert!(c.is_const());
        assert!(!c.is_temp());
    }

    #[test]
    fn plain_holder_is_neither_temp_nor_const() {
        let s = ScoreRef::new("@s", "obj");
        assert!(!s.is_temp());
        assert!(!s.is_const());
        assert_eq!(s.const_value(), None);
    }

    #[test]
    fn data_ref_render_includes_path() {
        let d = DataRef::storage("ns:x", NbtPath::named("a").child("b"));
        assert_eq!(d.render(), "storage ns:x a.b");
    }

    #[test]
    fn data_ref_render_without_path() {
        let d = DataRef::storage("ns:x", NbtPath::root());
        assert_eq!(d.render(), "storage ns:x");
    }
}
