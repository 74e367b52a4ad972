//! `NbtValue` — the literal payloads a [`crate::operand::Literal`] can carry, and the
//! `TypeTag` a [`crate::operand::DataRef`] propagates through its accessor chain.

use crate::error::CoreError;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// A typed-NBT-shaped literal value.
///
/// Unlike the host toolchain's third-party compound/list types, this enum is owned
/// end to end, so it derives `Hash`/`Eq` directly rather than needing a bolted-on
/// content-hash for map-key use (see DESIGN.md's note on the "monkey-patched hashing"
/// design flag). `content_hash` is kept anyway as a stable, algorithm-independent
/// fingerprint for callers that diff compiler output across runs.
#[derive(Debug, Clone, PartialEq)]
pub enum NbtValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    List(Vec<NbtValue>),
    Compound(Vec<(String, NbtValue)>),
}

impl Eq for NbtValue {}

impl Hash for NbtValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            NbtValue::Int(i) => i.hash(state),
            NbtValue::Float(f) => f.to_bits().hash(state),
            NbtValue::Bool(b) => b.hash(state),
            NbtValue::String(s) => s.hash(state),
            NbtValue::List(items) => items.hash(state),
            NbtValue::Compound(fields) => fields.hash(state),
        }
    }
}

impl NbtValue {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            NbtValue::Int(_) => TypeTag::Int,
            NbtValue::Float(_) => TypeTag::Float,
            NbtValue::Bool(_) => TypeTag::Bool,
            NbtValue::String(_) => TypeTag::String,
            NbtValue::List(_) => TypeTag::List,
            NbtValue::Compound(_) => TypeTag::Compound,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, NbtValue::Int(_) | NbtValue::Float(_) | NbtValue::Bool(_))
    }

    /// Convert a numeric-kinded value to `f64`, failing on non-numeric payloads.
    ///
    /// Grounded on the host crate's `AxValue::as_num` — a typed accessor returning
    /// a structured error rather than panicking on a mismatched variant.
    pub fn as_f64(&self) -> Result<f64, CoreError> {
        match self {
            NbtValue::Int(i) => Ok(*i as f64),
            NbtValue::Float(f) => Ok(*f),
            NbtValue::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            other => Err(CoreError::TypeMismatch {
                expected: "numeric NbtValue".to_string(),
                found: other.type_tag().name().to_string(),
            }),
        }
    }

    /// A stable fingerprint independent of `Hash`'s unspecified algorithm, useful for
    /// snapshot diffing compiler output across runs/processes.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    /// Render the literal the way it appears inside a command (e.g. `data modify ... value <v>`).
    pub fn render(&self) -> String {
        match self {
            NbtValue::Int(i) => format!("{i}"),
            NbtValue::Float(f) => format!("{f}f"),
            NbtValue::Bool(b) => (if *b { "1b" } else { "0b" }).to_string(),
            NbtValue::String(s) => format!("{s:?}"),
            NbtValue::List(items) => {
                let parts: Vec<String> = items.iter().map(NbtValue::render).collect();
                format!("[{}]", parts.join(","))
            }
            NbtValue::Compound(fields) => {
                let parts: Vec<String> = fields
                    .iter()
                    .map(|(k, v)| format!("{k}:{}", v.render()))
                    .collect();
                format!("{{{}}}", parts.join(","))
            }
        }
    }
}

/// The nbt-type tag a `DataRef` carries, propagated through accessors (§3). Defaults
/// to `Any` whenever child-type lookup fails — no type-inference beyond this
/// propagation is in scope (§1 non-goals).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TypeTag {
    Int,
    Float,
    Bool,
    String,
    List,
    Compound,
    #[default]
    Any,
}

impl TypeTag {
    pub fn name(&self) -> &'static str {
        match self {
            TypeTag::Int => "int",
            TypeTag::Float => "float",
            TypeTag::Bool => "bool",
            TypeTag::String => "string",
            TypeTag::List => "list",
            TypeTag::Compound => "compound",
            TypeTag::Any => "any",
        }
    }

    /// Look up the type of a named/indexed child, defaulting to `Any` on failure,
    /// per §3's DataRef `nbt_type` propagation rule (newer-revision semantics, §9).
    pub fn child_type(&self, _accessor: &crate::path::Accessor) -> TypeTag {
        // Only compound/list carry typed children in this core; anything else has
        // no child-type lookup and defaults to Any.
        match self {
            TypeTag::Compound | TypeTag::List => TypeTag::Any,
            _ => TypeTag::Any,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, TypeTag::Int | TypeTag::Float | TypeTag::Bool)
    }
}
