//! Temp/const allocators (§4.2). Grounded on the host crate's `compiler::RegAlloc`
//! (per-call counter-based register allocator) and `compiler::GlobalTable`
//! (session-lifetime name interning table) — the same two-tier shape this
//! domain needs, just over scoreboard holders instead of VM registers.

use crate::operand::{DataRef, ScoreRef, TargetKind};
use crate::path::NbtPath;
use std::collections::BTreeSet;

/// Issues fresh `TempScore`s for one `resolve()` call. Holder numbering is
/// gapless and monotonically increasing starting at 0 (§3 invariant); `reset`
/// restores that starting point for the next call.
#[derive(Debug, Default)]
pub struct TempAllocator {
    next: u32,
    next_data: u32,
}

impl TempAllocator {
    pub fn new() -> Self {
        TempAllocator { next: 0, next_data: 0 }
    }

    /// Allocate a fresh temp holder against `objective`.
    pub fn alloc(&mut self, objective: &str) -> ScoreRef {
        let holder = format!("$s{}", self.next);
        self.next += 1;
        ScoreRef::new(holder, objective)
    }

    /// Allocate a fresh temp data triple under `storage`, used by the optimizer's
    /// `data_insert_score`/`convert_data_arithmetic` rules (§4.3#1/#2) when a
    /// score needs a transient data-shaped home.
    pub fn alloc_data(&mut self, storage: &str) -> DataRef {
        let name = format!("$d{}", self.next_data);
        self.next_data += 1;
        DataRef::new(TargetKind::Storage, storage, NbtPath::named(name))
    }

    /// How many temps have been allocated since the last reset — the gapless
    /// prefix length `[0, k)` the debug validator checks against (§4.3).
    pub fn count(&self) -> u32 {
        self.next
    }

    /// Reset the counter to 0 for the next top-level `Set` (§4.1, §9 open question).
    pub fn reset(&mut self) {
        self.next = 0;
    }
}

/// Interns integer constants across the whole compilation session (§4.2,
/// append-only per §5). `create` is idempotent: re-interning the same value
/// returns the same `ConstScore`.
#[derive(Debug, Default)]
pub struct ConstAllocator {
    values: BTreeSet<i64>,
}

impl ConstAllocator {
    pub fn new() -> Self {
        ConstAllocator { values: BTreeSet::new() }
    }

    /// Intern `v`, returning its `ConstScore` against `objective`.
    pub fn create(&mut self, v: i64, objective: &str) -> ScoreRef {
        self.values.insert(v);
        ScoreRef::new(format!("${v}"), objective)
    }

    /// Record that `v` is already referenced (e.g. via the §6 AST sanitizer)
    /// without needing its `ScoreRef` back.
    pub fn register(&mut self, v: i64) {
        self.values.insert(v);
    }

    pub fn contains(&self, v: i64) -> bool {
        self.values.contains(&v)
    }

    /// Every interned value, ascending — the order `generate_init` emits in.
    pub fn values(&self) -> impl Iterator<Item = i64> + '_ {
        self.values.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
