//! Compiles [`Definitions`] into a shared NFA arena.
//!
//! Grounded on the reference architecture's `BuildGraph`: every named pattern
//! compiles into one shared state arena, and a `Ref` is never inlined — it is
//! compiled as an indirection resolved by name at match time, which is what
//! lets mutually-recursive grammars terminate at compile time instead of
//! diverging into an infinite expansion.

use indexmap::IndexMap;

use crate::nfa::{Fragment, StateGraph, TransitionLabel, TransitionRef};
use crate::pattern::{Definitions, Pattern, Quantifier};

/// All named patterns compiled into one shared state arena.
#[derive(Debug, Clone)]
pub struct CompiledGrammar {
    pub graph: StateGraph,
    pub definitions: IndexMap<String, Fragment>,
}

impl CompiledGrammar {
    pub fn fragment(&self, name: &str) -> Option<&Fragment> {
        self.definitions.get(name)
    }
}

pub fn compile(defs: &Definitions) -> CompiledGrammar {
    let mut graph = StateGraph::new();
    let mut definitions = IndexMap::with_capacity(defs.len());
    for (name, pattern) in defs {
        let fragment = compile_pattern(&mut graph, pattern);
        definitions.insert(name.clone(), fragment);
    }
    CompiledGrammar { graph, definitions }
}

fn compile_pattern(graph: &mut StateGraph, pattern: &Pattern) -> Fragment {
    match pattern {
        Pattern::Atom(p) => {
            let state = graph.add_state();
            let tref = graph.add_transition(state, TransitionLabel::Primitive(p.clone()), None);
            Fragment::single(state, tref)
        }
        Pattern::Ref(name) => {
            let state = graph.add_state();
            let tref = graph.add_transition(state, TransitionLabel::Ref(name.clone()), None);
            Fragment::single(state, tref)
        }
        Pattern::Sequence(items) => compile_sequence(graph, items),
        Pattern::Alternation(alts) => compile_alternation(graph, alts),
        Pattern::Quantified(base, q) => compile_quantified(graph, base, *q),
    }
}

fn compile_sequence(graph: &mut StateGraph, items: &[Pattern]) -> Fragment {
    if items.is_empty() {
        let state = graph.add_state();
        let tref = graph.add_transition(state, TransitionLabel::Epsilon, None);
        return Fragment::single(state, tref);
    }
    let fragments: Vec<Fragment> = items.iter().map(|p| compile_pattern(graph, p)).collect();
    for window in fragments.windows(2) {
        let [left, right] = window else { unreachable!() };
        graph.connect_accepts(&left.accepts, right.entry);
    }
    Fragment {
        entry: fragments[0].entry,
        accepts: fragments.last().expect("non-empty").accepts.clone(),
    }
}

fn compile_alternation(graph: &mut StateGraph, alts: &[Pattern]) -> Fragment {
    let entry = graph.add_state();
    let mut accepts = Vec::new();
    for alt in alts {
        let frag = compile_pattern(graph, alt);
        let entry_trefs: Vec<TransitionRef> = graph.outgoing(frag.entry).collect();
        for tref in entry_trefs {
            let transition = graph.transition(tref).clone();
            let copy = graph.add_transition(entry, transition.label, transition.next);
            if frag.accepts.contains(&tref) {
                accepts.push(copy);
            }
        }
        for &accept in &frag.accepts {
            if accept.state != frag.entry {
                accepts.push(accept);
            }
        }
    }
    Fragment { entry, accepts }
}

fn compile_quantified(graph: &mut StateGraph, base: &Pattern, q: Quantifier) -> Fragment {
    let frag = compile_pattern(graph, base);
    match q {
        Quantifier::Optional => {
            let mut accepts = frag.accepts;
            add_epsilon_accept(graph, frag.entry, &mut accepts);
            Fragment { entry: frag.entry, accepts }
        }
        Quantifier::Plus => {
            let accepts = loop_back(graph, &frag);
            Fragment { entry: frag.entry, accepts }
        }
        Quantifier::Star => {
            let mut accepts = loop_back(graph, &frag);
            add_epsilon_accept(graph, frag.entry, &mut accepts);
            Fragment { entry: frag.entry, accepts }
        }
    }
}

/// For every accept-transition of `frag`, send it back to the fragment's
/// entry (one more repetition) while keeping a duplicate accept-edge open
/// (finish here). Returns the new set of accept-transitions.
fn loop_back(graph: &mut StateGraph, frag: &Fragment) -> Vec<TransitionRef> {
    let mut new_accepts = Vec::with_capacity(frag.accepts.len());
    for &accept in &frag.accepts {
        let label = graph.transition(accept).label.clone();
        graph.transition_mut(accept).next = Some(frag.entry);
        let owner = accept.state;
        let dup = graph.add_transition(owner, label, None);
        new_accepts.push(dup);
    }
    new_accepts
}

/// Adds an epsilon accept-transition out of `entry` unless one is already present.
fn add_epsilon_accept(graph: &mut StateGraph, entry: crate::nfa::StateId, accepts: &mut Vec<TransitionRef>) {
    for tref in graph.outgoing(entry) {
        let t = graph.transition(tref);
        if t.next.is_none() && t.label == TransitionLabel::Epsilon {
            if !accepts.contains(&tref) {
                accepts.push(tref);
            }
            return;
        }
    }
    let tref = graph.add_transition(entry, TransitionLabel::Epsilon, None);
    accepts.push(tref);
}
