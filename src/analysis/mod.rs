//! Structural analysis of a Python module.
//!
//! ```text
//! ┌─────────────┐     ┌─────────────────┐     ┌──────────────────┐
//! │ SyntaxTree  │────▶│ PythonExtractor │────▶│ StructuralFacts  │
//! │ (or None)   │     └─────────────────┘     │ imports, vars,   │
//! └─────────────┘                             │ functions,       │
//!                                             │ classes          │
//!                                             └──────────────────┘
//! ```
//!
//! Two behaviors are approximations: variable occurrence lines are keyed
//! by raw identifier across the whole module, and function call sites match
//! any bare-name call with the same name.

mod extractor;
mod facts;

pub use extractor::PythonExtractor;
pub use facts::{Class, Function, Import, Scope, StructuralFacts, Variable};
