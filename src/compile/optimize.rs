//! The four rewrite passes run after the recursive compile.
//!
//! 1. Load resolution: every load node is replaced by the compiled subtree of its store.
//! 2. Pass-through removal: nop and store nodes are spliced out of their parents' slots.
//! 3. Sharing: child slots are patched to one canonical node per distinct structure.
//! 4. Indexing: distinct reachable nodes get post-order indices.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::compile::arena::{NodeArena, NodeId};
use crate::compile::compiler::Compiler;
use crate::compile::fingerprint::{Fingerprint, fingerprint_node};
use crate::compile::node::NodeKind;
use crate::foundation::error::{OpErrorKind, OpforgeResult};

impl Compiler<'_> {
    /// Pass 1. Returns the node that replaces `node`.
    ///
    /// `visiting` holds the nodes on the current path. A load that leads back onto the path
    /// is cut with a placeholder, so no slot ever points at an ancestor.
    pub(crate) fn resolve_loads(&mut self, node: NodeId) -> OpforgeResult<NodeId> {
        if let Some(&done) = self.resolved.get(&node) {
            return Ok(done);
        }
        let n = self.arena.get(node)?;
        let (kind, op, variant, target) = (n.kind, n.op, n.variant, n.load_target);
        let children = n.children.clone();
        if self.visiting.contains(&node) {
            if let Some(owner) = op {
                self.report(
                    owner,
                    OpErrorKind::CyclicLoad,
                    format!("load chain leads back into op {owner}"),
                );
            }
            return self.placeholder(op, variant);
        }
        let out = if kind == NodeKind::Load {
            match target {
                Some(store) if self.loading.contains(&store) => {
                    let owner = op.unwrap_or(store);
                    self.report(
                        owner,
                        OpErrorKind::CyclicLoad,
                        format!("load chain re-enters store {store}"),
                    );
                    self.placeholder(op, variant)?
                }
                Some(store) => {
                    self.loading.push(store);
                    let sub = self.make_node_r(store, variant).and_then(|sub| {
                        if self.visiting.contains(&sub) {
                            let owner = op.unwrap_or(store);
                            self.report(
                                owner,
                                OpErrorKind::CyclicLoad,
                                format!("store {store} contains this load"),
                            );
                            self.placeholder(op, variant)
                        } else {
                            self.resolve_loads(sub)
                        }
                    });
                    self.loading.pop();
                    sub?
                }
                None => self.placeholder(op, variant)?,
            }
        } else {
            self.visiting.insert(node);
            let walked = self.resolve_children(node, &children);
            self.visiting.remove(&node);
            walked?;
            node
        };
        self.resolved.insert(node, out);
        Ok(out)
    }

    fn resolve_children(&mut self, node: NodeId, children: &[NodeId]) -> OpforgeResult<()> {
        for (slot, &child) in children.iter().enumerate() {
            let replaced = self.resolve_loads(child)?;
            if replaced != child {
                self.arena.get_mut(node)?.children[slot] = replaced;
            }
        }
        Ok(())
    }
}

/// Pass 2. Returns the node that replaces `node`.
pub(crate) fn splice_passthrough(
    arena: &mut NodeArena,
    node: NodeId,
    memo: &mut HashMap<NodeId, NodeId>,
) -> OpforgeResult<NodeId> {
    if let Some(&done) = memo.get(&node) {
        return Ok(done);
    }
    let n = arena.get(node)?;
    let out = match n.kind {
        NodeKind::Nop | NodeKind::Store => match n.children.first().copied() {
            Some(child) => splice_passthrough(arena, child, memo)?,
            None => {
                arena.get_mut(node)?.kind = NodeKind::Placeholder;
                node
            }
        },
        _ => {
            let children = n.children.clone();
            for (slot, child) in children.into_iter().enumerate() {
                let replaced = splice_passthrough(arena, child, memo)?;
                if replaced != child {
                    arena.get_mut(node)?.children[slot] = replaced;
                }
            }
            node
        }
    };
    memo.insert(node, out);
    Ok(out)
}

/// Pass 3 state: hash-consing table over the forest.
#[derive(Debug, Default)]
pub(crate) struct Sharing {
    canonical: HashMap<NodeId, NodeId>,
    table: HashMap<Fingerprint, SmallVec<[NodeId; 1]>>,
    collapsed: usize,
}

impl Sharing {
    /// Nodes folded into an identical one.
    pub(crate) fn collapsed(&self) -> usize {
        self.collapsed
    }

    /// Canonicalize the subtree at `node` and return the node its parent slot should hold.
    pub(crate) fn canonical(&mut self, arena: &mut NodeArena, node: NodeId) -> OpforgeResult<NodeId> {
        if let Some(&done) = self.canonical.get(&node) {
            return Ok(done);
        }
        let children = arena.get(node)?.children.clone();
        for (slot, child) in children.into_iter().enumerate() {
            let c = self.canonical(arena, child)?;
            if c != child {
                arena.get_mut(node)?.children[slot] = c;
            }
        }

        let key = fingerprint_node(arena, node)?;
        let mut found = None;
        if let Some(candidates) = self.table.get(&key) {
            for &cand in candidates {
                if same_structure(arena, cand, node)? {
                    found = Some(cand);
                    break;
                }
            }
        }
        let out = match found {
            Some(c) => {
                self.collapsed += 1;
                c
            }
            None => {
                self.table.entry(key).or_default().push(node);
                node
            }
        };
        self.canonical.insert(node, out);
        Ok(out)
    }
}

fn same_structure(arena: &NodeArena, a: NodeId, b: NodeId) -> OpforgeResult<bool> {
    let (x, y) = (arena.get(a)?, arena.get(b)?);
    Ok(x.kind == y.kind
        && x.handler == y.handler
        && x.variant == y.variant
        && x.extent == y.extent
        && x.children == y.children
        && arena.words(x.params) == arena.words(y.params))
}

/// Pass 4. Appends every newly reached node to `order`, children first.
pub(crate) fn assign_indices(
    arena: &mut NodeArena,
    node: NodeId,
    order: &mut Vec<NodeId>,
) -> OpforgeResult<()> {
    let n = arena.get(node)?;
    if n.index.is_some() {
        return Ok(());
    }
    let children = n.children.clone();
    for child in children {
        assign_indices(arena, child, order)?;
    }
    arena.get_mut(node)?.index = Some(order.len() as u32);
    order.push(node);
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/compile/optimize.rs"]
mod tests;
