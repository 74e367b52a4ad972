//! `NbtPath` / `Accessor` — nested-tag path addressing (§3).

use crate::value::NbtValue;

/// A single path step. Paths compose by concatenation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Accessor {
    NamedKey(String),
    ListIndex(i32),
    /// `Path[:]` — the universal index accessor, modeled as `CompoundMatch` over
    /// an empty compound per §3.
    CompoundMatch(Vec<(String, NbtValue)>),
}

impl Accessor {
    pub fn all() -> Accessor {
        Accessor::CompoundMatch(Vec::new())
    }

    /// Render the accessor the way it is spliced into a data-path string.
    pub fn render(&self) -> String {
        match self {
            Accessor::NamedKey(name) => {
                if name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') && !name.is_empty() {
                    name.clone()
                } else {
                    format!("{name:?}")
                }
            }
            Accessor::ListIndex(i) => format!("[{i}]"),
            Accessor::CompoundMatch(fields) if fields.is_empty() => "[]".to_string(),
            Accessor::CompoundMatch(fields) => {
                let parts: Vec<String> = fields
                    .iter()
                    .map(|(k, v)| format!("{k}:{}", v.render()))
                    .collect();
                format!("[{{{}}}]", parts.join(","))
            }
        }
    }
}

/// An ordered sequence of `Accessor`s (§3). Immutable and cheap to clone/append.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NbtPath {
    steps: Vec<Accessor>,
}

impl NbtPath {
    pub fn root() -> Self {
        NbtPath { steps: Vec::new() }
    }

    pub fn from_steps(steps: Vec<Accessor>) -> Self {
        NbtPath { steps }
    }

    pub fn named(name: impl Into<String>) -> Self {
        NbtPath { steps: vec![Accessor::NamedKey(name.into())] }
    }

    /// Append `other`'s steps after this path's, returning a new path (§3:
    /// "Paths compose by concatenation").
    pub fn join(&self, other: &NbtPath) -> NbtPath {
        let mut steps = self.steps.clone();
        steps.extend(other.steps.iter().cloned());
        NbtPath { steps }
    }

    /// `child(name)` — the typed replacement for dynamic attribute access
    /// (`src.foo.bar`) called out in §9: a method, not `__getattr__` magic.
    pub fn child(&self, name: impl Into<String>) -> NbtPath {
        let mut steps = self.steps.clone();
        steps.push(Accessor::NamedKey(name.into()));
        NbtPath { steps }
    }

    pub fn index(&self, idx: i32) -> NbtPath {
        let mut steps = self.steps.clone();
        steps.push(Accessor::ListIndex(idx));
        NbtPath { steps }
    }

    pub fn steps(&self) -> &[Accessor] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Render the full path the way the target VM's data-path grammar expects:
    /// dot-joined named keys, bracket-joined index/compound-match accessors.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                Accessor::NamedKey(_) => {
                    if i != 0 {
                        out.push('.');
                    }
                    out.push_str(&step.render());
                }
                Accessor::ListIndex(_) | Accessor::CompoundMatch(_) => {
                    out.push_str(&step.render());
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_path_renders_dot_joined() {
        let p = NbtPath::named("a").child("b").child("c");
        assert_eq!(p.render(), "a.b.c");
    }

    #[test]
    fn index_accessor_renders_bracketed() {
        let p = NbtPath::named("items").index(0).child("count");
        assert_eq!(p.render(), "items[0].count");
    }

    #[test]
    fn join_concatenates_steps() {
        let a = NbtPath::named("a");
        let b = NbtPath::named("b").child("c");
        assert_eq!(a.join(&b).render(), "a.b.c");
    }

    #[test]
    fn universal_index_accessor_renders_empty_brackets() {
        let p = NbtPath::named("items").join(&NbtPath::from_steps(vec![Accessor::all()]));
        assert_eq!(p.render(), "items[]");
    }
}
