use super::*;
use crate::compile::node::{Extent, NodeKind};
use crate::foundation::ids::VariantId;

fn cfg(max_nodes: usize, max_words: usize) -> DocumentConfig {
    DocumentConfig {
        arena_initial_nodes: 1,
        max_nodes,
        max_words,
        ..DocumentConfig::default()
    }
}

fn leaf() -> Node {
    Node::placeholder(None, VariantId(1), Extent::new(4, 4))
}

#[test]
fn handles_survive_growth() {
    let mut a = NodeArena::new(&cfg(1024, 1024));
    let first = a.alloc(leaf()).unwrap();
    let block = a.alloc_words(&[1, 2, 3]).unwrap();
    a.get_mut(first).unwrap().params = block;
    for _ in 0..500 {
        a.alloc(leaf()).unwrap();
        a.alloc_words(&[9]).unwrap();
    }
    assert_eq!(a.get(first).unwrap().kind(), NodeKind::Placeholder);
    assert_eq!(a.params(first).unwrap(), &[1, 2, 3]);
    assert_eq!(a.len(), 501);
    assert_eq!(a.word_len(), 503);
}

#[test]
fn reset_rejects_old_handles() {
    let mut a = NodeArena::new(&cfg(16, 16));
    let old = a.alloc(leaf()).unwrap();
    a.reset();
    assert!(a.is_empty());
    let fresh = a.alloc(leaf()).unwrap();
    assert_eq!(old.index(), fresh.index());
    assert_ne!(old.epoch(), fresh.epoch());
    match a.get(old) {
        Err(OpforgeError::StaleNode {
            handle_epoch,
            arena_epoch,
        }) => {
            assert_eq!(handle_epoch, old.epoch());
            assert_eq!(arena_epoch, a.epoch());
        }
        other => panic!("expected StaleNode, got {other:?}"),
    }
    assert!(a.get(fresh).is_ok());
}

#[test]
fn node_limit_is_enforced() {
    let mut a = NodeArena::new(&cfg(2, 16));
    a.alloc(leaf()).unwrap();
    a.alloc(leaf()).unwrap();
    match a.alloc(leaf()) {
        Err(OpforgeError::ArenaExhausted {
            unit,
            requested,
            limit,
        }) => {
            assert_eq!(unit, "nodes");
            assert_eq!(requested, 3);
            assert_eq!(limit, 2);
        }
        other => panic!("expected ArenaExhausted, got {other:?}"),
    }
}

#[test]
fn word_limit_is_enforced() {
    let mut a = NodeArena::new(&cfg(16, 4));
    a.alloc_words(&[1, 2, 3]).unwrap();
    let err = a.alloc_words(&[4, 5]).unwrap_err();
    assert!(matches!(
        err,
        OpforgeError::ArenaExhausted { unit: "words", requested: 5, limit: 4 }
    ));
    assert_eq!(a.word_len(), 3);
}
