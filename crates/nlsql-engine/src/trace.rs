//! Execution tracing for the match engine.
//!
//! Mirrors the reference architecture's `Tracer`/`NoopTracer` split rather
//! than a global `tracing` subscriber: the hot per-token transition loop
//! takes a `&mut dyn Tracer` argument, so tracing is opt-in per call and
//! never touches `Matcher`'s own state.

use nlsql_core::TokenIndex;

use crate::nfa::TransitionLabel;
use crate::run::RunId;

/// Execution events a [`Matcher`](crate::matcher::Matcher) reports while stepping.
pub trait Tracer {
    fn trace_feed(&mut self, index: TokenIndex);
    fn trace_transition(&mut self, label: &TransitionLabel, parent: Option<RunId>);
    fn trace_accept(&mut self, run: RunId);
}

/// Discards every event. The default tracer for `Matcher::feed`/`finish`.
pub struct NoopTracer;

impl Tracer for NoopTracer {
    #[inline(always)]
    fn trace_feed(&mut self, _index: TokenIndex) {}

    #[inline(always)]
    fn trace_transition(&mut self, _label: &TransitionLabel, _parent: Option<RunId>) {}

    #[inline(always)]
    fn trace_accept(&mut self, _run: RunId) {}
}

/// Collects one formatted line per event, for the CLI's `--trace` flag and tests.
#[derive(Default)]
pub struct PrintTracer {
    lines: Vec<String>,
}

impl PrintTracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl Tracer for PrintTracer {
    fn trace_feed(&mut self, index: TokenIndex) {
        self.lines.push(format!("feed {index}"));
    }

    fn trace_transition(&mut self, label: &TransitionLabel, parent: Option<RunId>) {
        let from = parent.map_or_else(|| "start".to_string(), |run| format!("run {run}"));
        self.lines.push(format!("{from} -> {label:?}"));
    }

    fn trace_accept(&mut self, run: RunId) {
        self.lines.push(format!("accept run {run}"));
    }
}
