//! Index-addressed node storage.
//!
//! Nodes live in a `Vec<Node>` and their parameter blocks in a shared `Vec<u32>` bump region.
//! Handles are indices tagged with the arena epoch, so growth never invalidates a live handle and
//! a handle from a previous compile is rejected instead of aliasing a new node.

use crate::compile::node::{Node, ParamRange};
use crate::foundation::config::DocumentConfig;
use crate::foundation::error::{OpforgeError, OpforgeResult};

/// Handle of a node in a [`NodeArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    epoch: u32,
}

impl NodeId {
    /// Slot in the arena.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Compile generation the handle belongs to.
    pub fn epoch(self) -> u32 {
        self.epoch
    }
}

/// Node storage for one compilation.
#[derive(Clone, Debug)]
pub struct NodeArena {
    nodes: Vec<Node>,
    words: Vec<u32>,
    epoch: u32,
    max_nodes: usize,
    max_words: usize,
}

impl NodeArena {
    /// Empty arena sized and limited by `cfg`.
    pub fn new(cfg: &DocumentConfig) -> Self {
        Self {
            nodes: Vec::with_capacity(cfg.arena_initial_nodes),
            words: Vec::new(),
            epoch: 0,
            max_nodes: cfg.max_nodes,
            max_words: cfg.max_words,
        }
    }

    /// Drop every node and start a new epoch.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.words.clear();
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Current epoch.
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Nodes allocated in this epoch.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// `true` if no node has been allocated in this epoch.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Parameter words allocated in this epoch.
    pub fn word_len(&self) -> usize {
        self.words.len()
    }

    /// Store a node and return its handle.
    pub fn alloc(&mut self, node: Node) -> OpforgeResult<NodeId> {
        let requested = self.nodes.len() + 1;
        if requested > self.max_nodes {
            return Err(OpforgeError::ArenaExhausted {
                unit: "nodes",
                requested,
                limit: self.max_nodes,
            });
        }
        let index = u32::try_from(self.nodes.len())
            .map_err(|_| OpforgeError::validation("node index overflows u32"))?;
        self.nodes.push(node);
        Ok(NodeId {
            index,
            epoch: self.epoch,
        })
    }

    /// Copy a parameter block into the word region.
    pub fn alloc_words(&mut self, block: &[u32]) -> OpforgeResult<ParamRange> {
        let requested = self.words.len() + block.len();
        if requested > self.max_words {
            return Err(OpforgeError::ArenaExhausted {
                unit: "words",
                requested,
                limit: self.max_words,
            });
        }
        let start = u32::try_from(self.words.len())
            .map_err(|_| OpforgeError::validation("word offset overflows u32"))?;
        self.words.extend_from_slice(block);
        Ok(ParamRange {
            start,
            len: block.len() as u32,
        })
    }

    fn check(&self, id: NodeId) -> OpforgeResult<usize> {
        if id.epoch != self.epoch {
            return Err(OpforgeError::StaleNode {
                handle_epoch: id.epoch,
                arena_epoch: self.epoch,
            });
        }
        let i = id.index as usize;
        if i >= self.nodes.len() {
            return Err(OpforgeError::validation(format!(
                "node {} out of range ({} nodes)",
                id.index,
                self.nodes.len()
            )));
        }
        Ok(i)
    }

    /// Borrow a node.
    pub fn get(&self, id: NodeId) -> OpforgeResult<&Node> {
        let i = self.check(id)?;
        Ok(&self.nodes[i])
    }

    /// Borrow a node mutably.
    pub fn get_mut(&mut self, id: NodeId) -> OpforgeResult<&mut Node> {
        let i = self.check(id)?;
        Ok(&mut self.nodes[i])
    }

    /// Parameter words of a block.
    pub fn words(&self, range: ParamRange) -> &[u32] {
        let start = range.start as usize;
        &self.words[start..start + range.len()]
    }

    /// Parameter words of the node behind `id`.
    pub fn params(&self, id: NodeId) -> OpforgeResult<&[u32]> {
        let range = self.get(id)?.params;
        Ok(self.words(range))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/arena.rs"]
mod tests;
