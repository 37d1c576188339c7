//! NFA state graph: states, transitions, and fragments.
//!
//! Grounded on the reference architecture's own build-time graph
//! (`BuildGraph`/`Fragment`, entry + exit node per expression, combinators
//! that connect fragments by rewriting accept edges) — the same "fragment has
//! one entry, some exit edges; sequencing rewrites those edges" shape, applied
//! here to tokens instead of AST nodes.

use serde::{Deserialize, Serialize};

use crate::primitive::Primitive;

pub type StateId = u32;

/// What a transition does when it fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransitionLabel {
    Epsilon,
    Primitive(Primitive),
    /// Push/pop a named pattern's fragment around the current run.
    Ref(String),
}

/// One outgoing edge of a state. `next = None` denotes an accept-edge for its
/// local fragment — not yet connected to anything further.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub label: TransitionLabel,
    pub next: Option<StateId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct State {
    pub transitions: Vec<Transition>,
}

/// A reference to one specific transition: which state owns it, and its index
/// in that state's transition list. Used both to fire a transition and to
/// rewrite its `next` field during fragment composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransitionRef {
    pub state: StateId,
    pub index: u32,
}

/// A graph fragment with a single entry state and a set of accept-edges
/// (transitions whose `next` is still `None`).
#[derive(Debug, Clone)]
pub struct Fragment {
    pub entry: StateId,
    pub accepts: Vec<TransitionRef>,
}

impl Fragment {
    pub fn single(node: StateId, accept: TransitionRef) -> Self {
        Self { entry: node, accepts: vec![accept] }
    }
}

/// The full state arena for one compile, shared across all pattern definitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateGraph {
    states: Vec<State>,
}

impl StateGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_state(&mut self) -> StateId {
        let id = self.states.len() as StateId;
        self.states.push(State::default());
        id
    }

    /// Add a transition to `state`, returning a `TransitionRef` to it.
    pub fn add_transition(&mut self, state: StateId, label: TransitionLabel, next: Option<StateId>) -> TransitionRef {
        let st = &mut self.states[state as usize];
        let index = st.transitions.len() as u32;
        st.transitions.push(Transition { label, next });
        TransitionRef { state, index }
    }

    pub fn transition(&self, tref: TransitionRef) -> &Transition {
        &self.states[tref.state as usize].transitions[tref.index as usize]
    }

    pub fn transition_mut(&mut self, tref: TransitionRef) -> &mut Transition {
        &mut self.states[tref.state as usize].transitions[tref.index as usize]
    }

    pub fn outgoing(&self, state: StateId) -> impl Iterator<Item = TransitionRef> + '_ {
        let count = self.states[state as usize].transitions.len() as u32;
        (0..count).map(move |index| TransitionRef { state, index })
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Rewrite every accept-edge in `accepts` to point at `to`.
    pub fn connect_accepts(&mut self, accepts: &[TransitionRef], to: StateId) {
        for &tref in accepts {
            self.transition_mut(tref).next = Some(to);
        }
    }
}
