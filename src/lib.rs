//! A crate for binary and chain-reduced decision diagrams.
//!
//! One `DdBase` owns a hash-consed node pool, a computed table, and a
//! registry of the handles it has given out. Functions are built through
//! `ite` and friends, always canonically: within a manager, two handles
//! are equal exactly when they denote the same boolean function. The pool
//! is compacted on demand; outstanding handles are rewritten in place, so
//! their identity survives collection.

#![allow(clippy::many_single_char_names)]

#[macro_use] extern crate log;

/// Packed node ids (index + complement bit).
pub mod nid;

/// Error kinds and the crate-wide `Result`.
pub mod err;

/// The two node encodings behind one strategy trait.
pub mod node;

/// The collector's mark set.
mod mark;

/// The shared unique table.
mod pool;

/// The direct-mapped computed table.
mod cache;

/// Public handles and the registry the collector rewrites.
pub mod handle;

/// The manager: connectives, quantifiers, substitution, inspection.
pub mod base;

/// Mark-and-compact collection.
mod gc;

/// Variable allocation: booleans, integers, interleaved groups.
pub mod vars;

/// Helpers for working with arrays of bit handles as if they were integers.
pub mod int;

/// Satisfying assignments and typed decoding.
pub mod sat;

pub use base::{BddBase, CbddBase, DdBase, DdConfig};
pub use cache::CacheStats;
pub use err::{DdError, Result};
pub use handle::Bdd;
pub use int::Bitvec;
pub use node::{BddNode, CbddNode, NodeKind};
pub use sat::{Assignment, Value};
pub use vars::{BitOrder, Var, VarMap, VarSet};
