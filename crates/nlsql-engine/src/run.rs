//! Run and frame arenas backing the match engine.
//!
//! Grounded on the reference engine's index-based frame stack (`FrameArena`,
//! a "cactus stack" of parent pointers rather than an owned `Vec` per active
//! run): runs and frames are appended to flat arenas and referenced by index,
//! never owned or cloned across the match.

use nlsql_core::TokenIndex;

use crate::nfa::TransitionRef;

pub type RunId = u32;
pub type FrameId = u32;

/// Tags how a [`RunNode`] was produced, so capture reconstruction can walk
/// the run chain in one direction without inferring open/close from shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    /// A primitive consumed one token.
    Token,
    /// A `Ref` transition was entered; a new capture frame was pushed.
    RefOpen,
    /// A capture frame was popped on the way back out of a `Ref`.
    RefClose,
}

/// One node in the backward-walkable run chain.
#[derive(Debug, Clone)]
pub struct RunNode {
    pub token: Option<TokenIndex>,
    pub transition: TransitionRef,
    pub parent: Option<RunId>,
    pub frame: Option<FrameId>,
    pub kind: RunKind,
}

/// The active frame when a `Ref` is entered: where to resume once its
/// sub-pattern accepts, and which frame was active around it.
#[derive(Debug, Clone)]
pub struct CaptureFrame {
    pub name: String,
    pub return_to: TransitionRef,
    pub parent: Option<FrameId>,
}

#[derive(Debug, Clone, Default)]
pub struct RunArena {
    nodes: Vec<RunNode>,
}

impl RunArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: RunNode) -> RunId {
        let id = self.nodes.len() as RunId;
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: RunId) -> &RunNode {
        &self.nodes[id as usize]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FrameArena {
    frames: Vec<CaptureFrame>,
}

impl FrameArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: CaptureFrame) -> FrameId {
        let id = self.frames.len() as FrameId;
        self.frames.push(frame);
        id
    }

    pub fn get(&self, id: FrameId) -> &CaptureFrame {
        &self.frames[id as usize]
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
