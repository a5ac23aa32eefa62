use std::collections::HashMap;

use smallvec::SmallVec;

use crate::foundation::ids::{OpId, PageId};
use crate::graph::op::{Link, LinkSlot, Op};
use crate::schema::registry::Registry;

/// Store-name lookup built once per connect.
#[derive(Clone, Debug, Default)]
pub(crate) struct StoreIndex {
    per_page: Vec<HashMap<String, OpId>>,
    global: HashMap<String, OpId>,
}

impl StoreIndex {
    pub(crate) fn build(pages: &[Page], ops: &[Option<Op>]) -> Self {
        let mut index = Self::default();
        for page in pages {
            let mut local = HashMap::new();
            for &id in &page.stores {
                let Some(op) = ops.get(id.index()).and_then(Option::as_ref) else {
                    continue;
                };
                local.entry(op.store_name.clone()).or_insert(id);
                index.global.entry(op.store_name.clone()).or_insert(id);
            }
            index.per_page.push(local);
        }
        index
    }

    /// Page-local lookup, then the other pages when `cross_page` is set.
    pub(crate) fn resolve(&self, page: PageId, name: &str, cross_page: bool) -> Option<OpId> {
        if name.is_empty() {
            return None;
        }
        let local = self
            .per_page
            .get(page.index())
            .and_then(|m| m.get(name))
            .copied();
        match local {
            Some(id) => Some(id),
            None if cross_page => self.global.get(name).copied(),
            None => None,
        }
    }
}

/// Named group of ops.
#[derive(Clone, Debug, Default)]
pub struct Page {
    pub(crate) name: String,
    pub(crate) ops: Vec<OpId>,
    pub(crate) stores: Vec<OpId>,
}

impl Page {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }

    /// Page name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ops in placement order.
    pub fn ops(&self) -> &[OpId] {
        &self.ops
    }

    /// Named ops found by the last connect. These are the compile roots of the page.
    pub fn stores(&self) -> &[OpId] {
        &self.stores
    }

    /// First op on this page carrying `name` as its store name.
    pub fn find_op(&self, ops: &[Option<Op>], name: &str) -> Option<OpId> {
        if name.is_empty() {
            return None;
        }
        self.ops.iter().copied().find(|id| {
            ops.get(id.index())
                .and_then(Option::as_ref)
                .is_some_and(|op| op.store_name == name)
        })
    }

    /// Phase 1: collect named ops. Later duplicates of a name are listed but never resolved.
    pub(crate) fn collect_stores(&mut self, ops: &[Option<Op>]) {
        self.stores.clear();
        let mut seen: HashMap<&str, OpId> = HashMap::new();
        for &id in &self.ops {
            let Some(op) = ops.get(id.index()).and_then(Option::as_ref) else {
                continue;
            };
            if op.store_name.is_empty() {
                continue;
            }
            if let Some(first) = seen.get(op.store_name.as_str()) {
                tracing::warn!(
                    page = %self.name,
                    name = %op.store_name,
                    first = first.0,
                    duplicate = id.0,
                    "duplicate store name"
                );
            } else {
                seen.insert(&op.store_name, id);
            }
            self.stores.push(id);
        }
    }

    /// Phase 2: resolve every link name of every op. Returns `true` if any edge changed; ops
    /// whose edges changed are marked changed.
    pub(crate) fn connect_links(
        &self,
        page: PageId,
        ops: &mut [Option<Op>],
        registry: &Registry,
        stores: &StoreIndex,
        cross_page: bool,
    ) -> bool {
        let mut any = false;
        for &id in &self.ops {
            let Some(op) = ops.get_mut(id.index()).and_then(Option::as_mut) else {
                continue;
            };
            let class = registry.find_class(op.class);

            let mut inputs: SmallVec<[Link; 4]> = op
                .links
                .iter()
                .filter(|l| matches!(l.slot, LinkSlot::Input(_)))
                .cloned()
                .collect();
            if let Some(class) = class {
                // stable, so repeated inputs keep their order
                inputs.sort_by_key(|l| match l.slot {
                    LinkSlot::Input(p) => class
                        .inputs
                        .iter()
                        .position(|i| i.id == p)
                        .unwrap_or(usize::MAX),
                    LinkSlot::Param(_) => usize::MAX,
                });
            }
            let mut links: SmallVec<[Link; 2]> = inputs.into_iter().collect();
            links.extend(op.link_values().map(|(para, name)| Link {
                slot: LinkSlot::Param(para),
                name: name.to_owned(),
                target: None,
            }));
            for link in &mut links {
                link.target = stores.resolve(page, &link.name, cross_page);
            }

            if links != op.links {
                op.links = links;
                op.changed = true;
                any = true;
            }
        }
        any
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/page.rs"]
mod tests;
