//! bolt-expr-core — compilation core for an embedded scoreboard/data expression language.
//!
//! Module layout:
//!   - error      — typed error/warning taxonomy for every failure mode the core can hit
//!   - config     — validated `Config` (objective names, init path, debug toggles)
//!   - value      — `NbtValue` literal payloads
//!   - path       — `NbtPath` / `Accessor` for nested data addressing
//!   - operand    — `ScoreRef` / `DataRef` / `Literal` source operands
//!   - ir         — three-address `IrOp` instruction set
//!   - alloc      — `TempAllocator` (per-resolve) and `ConstAllocator` (per-session)
//!   - expr       — the `Expr` tree built by operator overloading, and `unroll()`
//!   - optimizer  — the ordered rewrite-rule pipeline
//!   - serialize  — `IrOp` sequence → command strings
//!   - sanitize   — the `$k` const-reference auto-registration pass
//!   - session    — `Session`, the per-compilation-run facade

pub mod alloc;
pub mod config;
pub mod error;
pub mod expr;
pub mod ir;
pub mod operand;
pub mod optimizer;
pub mod path;
pub mod sanitize;
pub mod serialize;
pub mod session;
pub mod value;

pub use config::Config;
pub use error::{CoreError, OptimizerWarning};
pub use expr::Expr;
pub use ir::IrOp;
pub use operand::{DataRef, Literal, Operand, ScoreRef};
pub use path::{Accessor, NbtPath};
pub use session::{CollectingSink, CommandSink, InitWriter, Session};
pub use value::{NbtValue, TypeTag};
