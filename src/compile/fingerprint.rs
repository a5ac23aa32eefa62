use crate::compile::arena::{NodeArena, NodeId};
use crate::compile::node::{Node, NodeKind};
use crate::foundation::error::{OpforgeError, OpforgeResult};
use xxhash_rust::xxh3::Xxh3;

const XXH3_SEED: u64 = 0x6f70_666f_7267_6501;

/// Stable 128-bit structural hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    /// High half.
    pub hi: u64,
    /// Low half.
    pub lo: u64,
}

/// Hash one node for sharing. Children are hashed by handle, so they must already be canonical.
pub(crate) fn fingerprint_node(arena: &NodeArena, id: NodeId) -> OpforgeResult<Fingerprint> {
    let node = arena.get(id)?;
    let mut h = StableHasher::new();
    write_header(&mut h, node);
    h.write_words(arena.words(node.params));
    h.write_u32(node.children.len() as u32);
    for c in &node.children {
        h.write_u32(c.index());
    }
    Ok(h.finish())
}

/// Hash an indexed forest. Children are hashed by post-order index, so the result does not
/// depend on arena layout.
pub(crate) fn fingerprint_forest(arena: &NodeArena, order: &[NodeId]) -> OpforgeResult<Fingerprint> {
    let mut h = StableHasher::new();
    h.write_u32(order.len() as u32);
    for &id in order {
        let node = arena.get(id)?;
        write_header(&mut h, node);
        h.write_words(arena.words(node.params));
        h.write_u32(node.children.len() as u32);
        for &c in &node.children {
            let index = arena
                .get(c)?
                .index
                .ok_or_else(|| OpforgeError::validation("child node was never indexed"))?;
            h.write_u32(index);
        }
    }
    Ok(h.finish())
}

fn write_header(h: &mut StableHasher, node: &Node) {
    h.write_u8(match node.kind {
        NodeKind::Regular => 0,
        NodeKind::Load => 1,
        NodeKind::Store => 2,
        NodeKind::Nop => 3,
        NodeKind::Placeholder => 4,
    });
    h.write_u32(node.handler.0);
    h.write_u32(node.variant.0);
    h.write_u32(node.extent.width);
    h.write_u32(node.extent.height);
}

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_words(&mut self, ws: &[u32]) {
        self.write_u32(ws.len() as u32);
        for &w in ws {
            self.write_u32(w);
        }
    }

    fn finish(self) -> Fingerprint {
        let v = self.inner.digest128();
        Fingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}
