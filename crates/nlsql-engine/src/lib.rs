//! Token-level NFA matching engine.
//!
//! Compiles named [`Pattern`] definitions into a shared state graph, runs a
//! streamed run-set matcher over a token sequence, reconstructs surviving
//! matches into named capture trees, and resolves overlaps between
//! top-level patterns.

pub mod compile;
pub mod matcher;
pub mod nfa;
pub mod overlap;
pub mod pattern;
pub mod primitive;
pub mod reconstruct;
pub mod run;
pub mod trace;

pub use compile::{compile, CompiledGrammar};
pub use matcher::Matcher;
pub use overlap::{resolve_overlaps, Capture};
pub use pattern::{Definitions, Pattern, Quantifier};
pub use primitive::Primitive;
pub use reconstruct::{reconstruct, Span, Structure, StructureElem, TokenElem};
pub use run::{FrameArena, RunArena, RunId, RunKind};
pub use trace::{NoopTracer, PrintTracer, Tracer};
