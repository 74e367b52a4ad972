//! The AST-level const sanitizer (§6).
//!
//! Grounded on the host crate's `lexer.rs`, which leans on a handful of
//! `once_cell::sync::Lazy` compiled `Regex`es for token recognition rather than
//! re-compiling a pattern per call. This pass plays an analogous "recognize a
//! textual token shape, no matter what produced it" role, decoupled from any
//! particular host-language AST — it takes a plain iterator of `(holder, objective)`
//! string pairs, per §6's note that the host AST itself is out of scope.

use crate::alloc::ConstAllocator;
use once_cell::sync::Lazy;
use regex::Regex;

/// Matches a hand-written `ConstScore` holder: `$` followed by an optional
/// sign and decimal digits, anchored so `$s0` (a `TempScore`) never matches.
static CONST_HOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\$([-+]?\d+)\b").expect("static regex is valid"));

/// Scan `(holder, objective)` pairs for hand-written references to the const
/// objective and register their integer value, so a user-typed `$3` gets the
/// same init-function treatment as a compiler-interned one (§6).
///
/// Returns the number of distinct values newly registered (a value already
/// known to `consts` is not counted again).
pub fn sanitize_consts<'a, I>(pairs: I, const_objective: &str, consts: &mut ConstAllocator) -> usize
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut newly_registered = 0;
    for (holder, objective) in pairs {
        if objective != const_objective {
            continue;
        }
        if let Some(caps) = CONST_HOLDER.captures(holder) {
            if let Ok(v) = caps[1].parse::<i64>() {
                if !consts.contains(v) {
                    newly_registered += 1;
                }
                consts.register(v);
            }
        }
    }
    newly_registered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_matching_const_holder() {
        let mut consts = ConstAllocator::new();
        let registered = sanitize_consts(vec![("$3", "bolt.expr.const")], "bolt.expr.const", &mut consts);
        assert_eq!(registered, 1);
        assert!(consts.contains(3));
    }

    #[test]
    fn negative_value_is_parsed() {
        let mut consts = ConstAllocator::new();
        sanitize_consts(vec![("$-1", "bolt.expr.const")], "bolt.expr.const", &mut consts);
        assert!(consts.contains(-1));
    }

    #[test]
    fn temp_holder_is_not_mistaken_for_a_const() {
        let mut consts = ConstAllocator::new();
        sanitize_consts(vec![("$s0", "bolt.expr.const")], "bolt.expr.const", &mut consts);
        assert!(consts.is_empty());
    }

    #[test]
    fn wrong_objective_is_ignored() {
        let mut consts = ConstAllocator::new();
        sanitize_consts(vec![("$3", "some.other.objective")], "bolt.expr.const", &mut consts);
        assert!(consts.is_empty());
    }

    #[test]
    fn already_known_value_is_not_double_counted() {
        let mut consts = ConstAllocator::new();
        consts.register(3);
        let registered = sanitize_consts(vec![("$3", "bolt.expr.const")], "bolt.expr.const", &mut consts);
        assert_eq!(registered, 0);
    }
}
