use super::*;
use crate::compile::node::{Extent, Node};
use crate::foundation::config::DocumentConfig;
use crate::foundation::ids::VariantId;
use crate::schema::class::HandlerRef;

fn regular(arena: &mut NodeArena, handler: u32, params: &[u32], children: &[NodeId]) -> NodeId {
    let mut n = Node::new(NodeKind::Regular, None, VariantId(1), Extent::new(8, 8));
    n.handler = HandlerRef(handler);
    n.params = arena.alloc_words(params).unwrap();
    n.children = children.iter().copied().collect();
    arena.alloc(n).unwrap()
}

fn pass(arena: &mut NodeArena, kind: NodeKind, child: Option<NodeId>) -> NodeId {
    let mut n = Node::new(kind, None, VariantId(1), Extent::new(8, 8));
    n.children = child.into_iter().collect();
    arena.alloc(n).unwrap()
}

#[test]
fn nops_and_stores_are_spliced_into_parent_slots() {
    let mut arena = NodeArena::new(&DocumentConfig::default());
    let leaf = regular(&mut arena, 7, &[1], &[]);
    let nop = pass(&mut arena, NodeKind::Nop, Some(leaf));
    let store = pass(&mut arena, NodeKind::Store, Some(nop));
    let top = regular(&mut arena, 9, &[], &[store]);

    let mut memo = HashMap::new();
    let root = splice_passthrough(&mut arena, top, &mut memo).unwrap();
    assert_eq!(root, top);
    assert_eq!(arena.get(top).unwrap().children(), &[leaf]);
}

#[test]
fn passthrough_root_slot_is_replaced() {
    let mut arena = NodeArena::new(&DocumentConfig::default());
    let leaf = regular(&mut arena, 7, &[], &[]);
    let store = pass(&mut arena, NodeKind::Store, Some(leaf));
    let mut memo = HashMap::new();
    assert_eq!(splice_passthrough(&mut arena, store, &mut memo).unwrap(), leaf);
}

#[test]
fn childless_passthrough_becomes_placeholder() {
    let mut arena = NodeArena::new(&DocumentConfig::default());
    let nop = pass(&mut arena, NodeKind::Nop, None);
    let mut memo = HashMap::new();
    let out = splice_passthrough(&mut arena, nop, &mut memo).unwrap();
    assert_eq!(arena.get(out).unwrap().kind(), NodeKind::Placeholder);
}

#[test]
fn identical_subtrees_collapse() {
    let mut arena = NodeArena::new(&DocumentConfig::default());
    let a = regular(&mut arena, 7, &[1, 2], &[]);
    let b = regular(&mut arena, 7, &[1, 2], &[]);
    let c = regular(&mut arena, 7, &[1, 3], &[]);
    let fa = regular(&mut arena, 8, &[], &[a]);
    let fb = regular(&mut arena, 8, &[], &[b]);
    let top = regular(&mut arena, 9, &[], &[fa, fb, c]);

    let mut sharing = Sharing::default();
    let root = sharing.canonical(&mut arena, top).unwrap();
    assert_eq!(root, top);
    assert_eq!(arena.get(top).unwrap().children(), &[fa, fa, c]);
    assert_eq!(sharing.collapsed(), 2);
}

#[test]
fn indices_are_post_order_and_distinct() {
    let mut arena = NodeArena::new(&DocumentConfig::default());
    let leaf = regular(&mut arena, 1, &[], &[]);
    let mid = regular(&mut arena, 2, &[], &[leaf]);
    let top = regular(&mut arena, 3, &[], &[mid, leaf]);

    let mut order = Vec::new();
    assign_indices(&mut arena, top, &mut order).unwrap();
    assert_eq!(order, vec![leaf, mid, top]);
    assert_eq!(arena.get(leaf).unwrap().index(), Some(0));
    assert_eq!(arena.get(top).unwrap().index(), Some(2));

    assign_indices(&mut arena, mid, &mut order).unwrap();
    assert_eq!(order.len(), 3);
}
