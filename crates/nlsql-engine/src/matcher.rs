//! Streamed run-set matcher over a [`CompiledGrammar`].
//!
//! Grounded on the reference engine's VM loop (a frame-carrying thread set):
//! a `Matcher` is constructed per top-level pattern and owns its
//! own run/frame arenas — it shares only the read-only compiled graph with
//! other matchers, never mutable state.

use std::collections::HashSet;

use nlsql_core::{Token, TokenIndex};

use crate::compile::CompiledGrammar;
use crate::nfa::{StateId, TransitionLabel, TransitionRef};
use crate::run::{CaptureFrame, FrameArena, FrameId, RunArena, RunId, RunKind, RunNode};
use crate::trace::{NoopTracer, Tracer};

type SeenKey = (TransitionRef, Option<RunId>, Option<FrameId>);

/// One pattern's match state over a token stream.
pub struct Matcher<'g> {
    grammar: &'g CompiledGrammar,
    pattern_name: String,
    runs: RunArena,
    frames: FrameArena,
    current_runs: Vec<RunId>,
    final_runs: Vec<RunId>,
    seen_this_step: HashSet<SeenKey>,
}

impl<'g> Matcher<'g> {
    /// Builds a matcher for `pattern_name`. Panics if the grammar has no such
    /// definition — callers should validate pattern names against the
    /// grammar once, ahead of constructing matchers per input.
    pub fn new(grammar: &'g CompiledGrammar, pattern_name: impl Into<String>) -> Self {
        let pattern_name = pattern_name.into();
        assert!(
            grammar.fragment(&pattern_name).is_some(),
            "no such pattern definition: {pattern_name}"
        );
        Self {
            grammar,
            pattern_name,
            runs: RunArena::new(),
            frames: FrameArena::new(),
            current_runs: Vec::new(),
            final_runs: Vec::new(),
            seen_this_step: HashSet::new(),
        }
    }

    pub fn feed(&mut self, index: TokenIndex, token: &Token) {
        self.feed_with(index, token, &mut NoopTracer);
    }

    /// Flushes any pending matches that can complete without consuming
    /// further input (epsilon- and `Ref`-only closures). Does not seed new
    /// match attempts at the end of the stream.
    pub fn finish(&mut self) {
        self.finish_with(&mut NoopTracer);
    }

    /// Same as [`Matcher::feed`], reporting every transition/accept event to `tracer`.
    pub fn feed_with(&mut self, index: TokenIndex, token: &Token, tracer: &mut dyn Tracer) {
        tracer.trace_feed(index);
        self.step(Some((index, token)), true, tracer);
    }

    /// Same as [`Matcher::finish`], reporting every transition/accept event to `tracer`.
    pub fn finish_with(&mut self, tracer: &mut dyn Tracer) {
        self.step(None, false, tracer);
    }

    pub fn final_runs(&self) -> &[RunId] {
        &self.final_runs
    }

    pub fn runs(&self) -> &RunArena {
        &self.runs
    }

    pub fn frames(&self) -> &FrameArena {
        &self.frames
    }

    pub fn pattern_name(&self) -> &str {
        &self.pattern_name
    }

    pub fn grammar(&self) -> &CompiledGrammar {
        self.grammar
    }

    fn step(&mut self, token: Option<(TokenIndex, &Token)>, seed: bool, tracer: &mut dyn Tracer) {
        self.seen_this_step.clear();
        let snapshot = std::mem::take(&mut self.current_runs);
        for run_id in snapshot {
            let next_state = self
                .runs
                .get(run_id)
                .transition
                .next
                .expect("a pending run always has a continuation state");
            let outgoing: Vec<TransitionRef> = self.grammar.graph.outgoing(next_state).collect();
            for tref in outgoing {
                self.process_transition(tref, token, Some(run_id), tracer);
            }
        }
        if seed {
            let entry = self.grammar.fragment(&self.pattern_name).expect("validated at construction").entry;
            let outgoing: Vec<TransitionRef> = self.grammar.graph.outgoing(entry).collect();
            for tref in outgoing {
                self.process_transition(tref, token, None, tracer);
            }
        }
    }

    fn process_transition(
        &mut self,
        tref: TransitionRef,
        token: Option<(TokenIndex, &Token)>,
        parent: Option<RunId>,
        tracer: &mut dyn Tracer,
    ) {
        let transition = self.grammar.graph.transition(tref).clone();
        tracer.trace_transition(&transition.label, parent);
        match transition.label {
            TransitionLabel::Epsilon => match transition.next {
                Some(next_state) => {
                    let outgoing: Vec<TransitionRef> = self.grammar.graph.outgoing(next_state).collect();
                    for t2 in outgoing {
                        self.process_transition(t2, token, parent, tracer);
                    }
                }
                None => self.resolve_accept(parent, token, tracer),
            },
            TransitionLabel::Primitive(ref p) => {
                let Some((index, tok)) = token else { return };
                if !p.test(tok) {
                    return;
                }
                let frame = self.frame_of(parent);
                match transition.next {
                    Some(_) => {
                        let key = (tref, parent, frame);
                        if !self.seen_this_step.insert(key) {
                            return;
                        }
                        let run_id = self.runs.push(RunNode {
                            token: Some(index),
                            transition: tref,
                            parent,
                            frame,
                            kind: RunKind::Token,
                        });
                        self.current_runs.push(run_id);
                    }
                    None => {
                        let run_id = self.runs.push(RunNode {
                            token: Some(index),
                            transition: tref,
                            parent,
                            frame,
                            kind: RunKind::Token,
                        });
                        self.resolve_accept(Some(run_id), token, tracer);
                    }
                }
            }
            TransitionLabel::Ref(ref name) => {
                let parent_frame = self.frame_of(parent);
                let frame_id = self.frames.push(CaptureFrame {
                    name: name.clone(),
                    return_to: tref,
                    parent: parent_frame,
                });
                let run_id = self.runs.push(RunNode {
                    token: None,
                    transition: tref,
                    parent,
                    frame: Some(frame_id),
                    kind: RunKind::RefOpen,
                });
                let Some(sub_entry) = self.grammar.fragment(name).map(|f| f.entry) else {
                    return;
                };
                self.recurse_into(sub_entry, token, run_id, tracer);
            }
        }
    }

    fn recurse_into(&mut self, state: StateId, token: Option<(TokenIndex, &Token)>, parent: RunId, tracer: &mut dyn Tracer) {
        let outgoing: Vec<TransitionRef> = self.grammar.graph.outgoing(state).collect();
        for tref in outgoing {
            self.process_transition(tref, token, Some(parent), tracer);
        }
    }

    fn resolve_accept(&mut self, parent: Option<RunId>, token: Option<(TokenIndex, &Token)>, tracer: &mut dyn Tracer) {
        let mut parent = parent;
        loop {
            let Some(frame_id) = self.frame_of(parent) else {
                if let Some(run) = parent {
                    tracer.trace_accept(run);
                    self.final_runs.push(run);
                }
                return;
            };
            let frame = self.frames.get(frame_id);
            let return_to = frame.return_to;
            let grandparent_frame = frame.parent;
            let new_run = self.runs.push(RunNode {
                token: None,
                transition: return_to,
                parent,
                frame: grandparent_frame,
                kind: RunKind::RefClose,
            });
            match self.grammar.graph.transition(return_to).next {
                None => {
                    parent = Some(new_run);
                    continue;
                }
                Some(next_state) => {
                    self.recurse_into(next_state, token, new_run, tracer);
                    return;
                }
            }
        }
    }

    fn frame_of(&self, run: Option<RunId>) -> Option<FrameId> {
        run.and_then(|r| self.runs.get(r).frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile;
    use crate::pattern::{Definitions, Pattern};
    use crate::primitive::Primitive;
    use nlsql_core::TokenKind;

    fn tok(kind: TokenKind, lemma: &str, index: TokenIndex) -> Token {
        Token::new(lemma, kind, lemma, "", index)
    }

    #[test]
    fn matches_a_single_atom_at_every_start_position() {
        let mut defs = Definitions::new();
        defs.insert("x".into(), Pattern::atom(Primitive::TableToken));
        let grammar = compile(&defs);
        let mut matcher = Matcher::new(&grammar, "x");
        let t0 = tok(TokenKind::Column, "зарплата", 0);
        let t1 = tok(TokenKind::Table, "сотрудник", 1);
        matcher.feed(0, &t0);
        matcher.feed(1, &t1);
        matcher.finish();
        assert_eq!(matcher.final_runs().len(), 1);
        let run = matcher.runs().get(matcher.final_runs()[0]);
        assert_eq!(run.token, Some(1));
    }

    #[test]
    fn matches_a_sequence_across_two_tokens() {
        let mut defs = Definitions::new();
        defs.insert(
            "x".into(),
            Pattern::seq([Pattern::atom(Primitive::ColumnToken), Pattern::atom(Primitive::LemmaIs("и".into()))]),
        );
        let grammar = compile(&defs);
        let mut matcher = Matcher::new(&grammar, "x");
        let c = tok(TokenKind::Column, "зарплата", 0);
        let and = tok(TokenKind::Text, "и", 1);
        matcher.feed(0, &c);
        matcher.feed(1, &and);
        matcher.finish();
        assert_eq!(matcher.final_runs().len(), 1);
    }

    #[test]
    fn ref_transition_pushes_and_pops_a_capture_frame() {
        let mut defs = Definitions::new();
        defs.insert("inner".into(), Pattern::atom(Primitive::ColumnToken));
        defs.insert("outer".into(), Pattern::reference("inner"));
        let grammar = compile(&defs);
        let mut matcher = Matcher::new(&grammar, "outer");
        let c = tok(TokenKind::Column, "зарплата", 0);
        matcher.feed(0, &c);
        matcher.finish();
        assert_eq!(matcher.final_runs().len(), 1);
        let closing = matcher.runs().get(matcher.final_runs()[0]);
        assert_eq!(closing.kind, RunKind::RefClose);
    }

    #[test]
    fn no_match_yields_empty_final_runs() {
        let mut defs = Definitions::new();
        defs.insert("x".into(), Pattern::atom(Primitive::TableToken));
        let grammar = compile(&defs);
        let mut matcher = Matcher::new(&grammar, "x");
        let c = tok(TokenKind::Column, "зарплата", 0);
        matcher.feed(0, &c);
        matcher.finish();
        assert!(matcher.final_runs().is_empty());
    }

    #[test]
    fn feed_with_reports_a_feed_event_and_an_accept_event_to_the_tracer() {
        use crate::trace::PrintTracer;

        let mut defs = Definitions::new();
        defs.insert("x".into(), Pattern::atom(Primitive::TableToken));
        let grammar = compile(&defs);
        let mut matcher = Matcher::new(&grammar, "x");
        let mut tracer = PrintTracer::new();
        let t = tok(TokenKind::Table, "сотрудник", 0);
        matcher.feed_with(0, &t, &mut tracer);
        matcher.finish_with(&mut tracer);
        assert!(tracer.lines().contains(&"feed 0".to_string()));
        assert!(tracer.lines().iter().any(|l| l.starts_with("accept run")));
    }
}
