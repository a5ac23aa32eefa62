use std::collections::{HashMap, HashSet};

use smallvec::SmallVec;

use crate::foundation::ids::{OpId, PageId};
use crate::graph::document::Document;
use crate::graph::page::StoreIndex;

impl Document {
    /// Resolve every link name, then mark every transitive consumer of a changed op as changed
    /// and drop its cached output. Returns `true` if any edge changed.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn connect(&mut self) -> bool {
        for page in &mut self.pages {
            page.collect_stores(&self.ops);
        }
        let index = StoreIndex::build(&self.pages, &self.ops);

        let mut changed = false;
        for (i, page) in self.pages.iter().enumerate() {
            changed |= page.connect_links(
                PageId(i as u32),
                &mut self.ops,
                &self.registry,
                &index,
                self.config.cross_page_links,
            );
        }

        let dirty = self.propagate_changes();
        tracing::debug!(changed, dirty, "connected");
        changed
    }

    /// Flood the changed mark along consumer edges. Returns the number of dirty ops.
    fn propagate_changes(&mut self) -> usize {
        let mut consumers: HashMap<OpId, SmallVec<[OpId; 4]>> = HashMap::new();
        for (id, op) in self.ops() {
            for target in op.links.iter().filter_map(|l| l.target) {
                consumers.entry(target).or_default().push(id);
            }
        }

        let mut queue: Vec<OpId> = self
            .ops()
            .filter(|(_, op)| op.changed)
            .map(|(id, _)| id)
            .collect();
        let mut dirty: HashSet<OpId> = queue.iter().copied().collect();
        while let Some(id) = queue.pop() {
            if let Some(op) = self.op_mut(id) {
                op.changed = true;
                op.cache = None;
            }
            for &c in consumers.get(&id).into_iter().flatten() {
                if dirty.insert(c) {
                    queue.push(c);
                }
            }
        }
        dirty.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/connect.rs"]
mod tests;
