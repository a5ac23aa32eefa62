use crate::compile::arena::{NodeArena, NodeId};
use crate::compile::compiler::{CompiledForest, Compiler};
use crate::compile::export::write_records;
use crate::compile::node::{Extent, Node};
use crate::foundation::config::DocumentConfig;
use crate::foundation::error::{OpErrorKind, OpforgeError, OpforgeResult};
use crate::foundation::ids::{ClassId, OpId, PageId, ParaId, VariantId};
use crate::foundation::words::WordWriter;
use crate::graph::op::{CachedOutput, Link, LinkSlot, Op};
use crate::graph::page::Page;
use crate::schema::class::InputFlags;
use crate::schema::registry::Registry;
use crate::schema::standard::standard_registry;
use crate::value::ValueData;
use crate::value::editor::ParamEditor;
use crate::value::legacy::LegacyWidths;

/// Editable op graph plus everything needed to compile and persist it.
///
/// All mutation goes through `&mut self`; the document is the only owner of its registry, pages,
/// ops and node arena.
#[derive(Clone, Debug)]
pub struct Document {
    pub(crate) registry: Registry,
    pub(crate) config: DocumentConfig,
    pub(crate) legacy: LegacyWidths,
    pub(crate) pages: Vec<Page>,
    pub(crate) ops: Vec<Option<Op>>,
    pub(crate) arena: NodeArena,
}

impl Document {
    /// Empty document over `registry`.
    pub fn new(registry: Registry, config: DocumentConfig) -> OpforgeResult<Self> {
        config.validate()?;
        Ok(Self {
            legacy: LegacyWidths::from_entries(&config.legacy_widths),
            arena: NodeArena::new(&config),
            registry,
            config,
            pages: Vec::new(),
            ops: Vec::new(),
        })
    }

    /// Empty document over the stock registry with default configuration.
    pub fn with_standard_registry() -> OpforgeResult<Self> {
        Self::new(standard_registry()?, DocumentConfig::default())
    }

    /// Class and type vocabulary.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Active configuration.
    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// Node storage of the latest compile.
    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    /// Pages in order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Look up a page.
    pub fn page(&self, id: PageId) -> Option<&Page> {
        self.pages.get(id.index())
    }

    /// Look up an op.
    pub fn op(&self, id: OpId) -> Option<&Op> {
        self.ops.get(id.index()).and_then(Option::as_ref)
    }

    /// Borrow an op for metadata edits (position, selection, bypass).
    pub fn op_mut(&mut self, id: OpId) -> Option<&mut Op> {
        self.ops.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Live ops with their ids, in id order.
    pub fn ops(&self) -> impl Iterator<Item = (OpId, &Op)> {
        self.ops
            .iter()
            .enumerate()
            .filter_map(|(i, op)| op.as_ref().map(|op| (OpId(i as u32), op)))
    }

    pub(crate) fn op_ref(&self, id: OpId) -> OpforgeResult<&Op> {
        self.op(id)
            .ok_or_else(|| OpforgeError::validation(format!("unknown op {id}")))
    }

    pub(crate) fn op_entry(&mut self, id: OpId) -> OpforgeResult<&mut Op> {
        self.op_mut(id)
            .ok_or_else(|| OpforgeError::validation(format!("unknown op {id}")))
    }

    /// Append an empty page.
    pub fn add_page(&mut self, name: &str) -> PageId {
        self.pages.push(Page::new(name));
        PageId((self.pages.len() - 1) as u32)
    }

    /// Place a new op of `class` with default values.
    pub fn add_op(&mut self, page: PageId, class: ClassId, x: i32, y: i32) -> OpforgeResult<OpId> {
        let desc = self
            .registry
            .find_class(class)
            .ok_or_else(|| OpforgeError::validation(format!("unknown class {class}")))?;
        let Some(p) = self.pages.get_mut(page.index()) else {
            return Err(OpforgeError::validation(format!("unknown page {page}")));
        };
        let mut op = Op::create(desc, page);
        op.set_position(x, y);
        let id = OpId(self.ops.len() as u32);
        self.ops.push(Some(op));
        p.ops.push(id);
        Ok(id)
    }

    /// Delete an op. Links naming it stop resolving at the next connect.
    pub fn remove_op(&mut self, id: OpId) -> OpforgeResult<()> {
        let page = self.op_ref(id)?.page;
        if let Some(p) = self.pages.get_mut(page.index()) {
            p.ops.retain(|o| *o != id);
            p.stores.retain(|o| *o != id);
        }
        self.ops[id.index()] = None;
        Ok(())
    }

    /// Rename the store an op publishes.
    pub fn set_store_name(&mut self, id: OpId, name: &str) -> OpforgeResult<()> {
        let op = self.op_entry(id)?;
        if op.store_name != name {
            op.store_name = name.to_owned();
            op.changed = true;
        }
        Ok(())
    }

    /// Replace the value of parameter `para`. The data must fit the descriptor.
    pub fn set_value(&mut self, id: OpId, para: ParaId, data: ValueData) -> OpforgeResult<()> {
        let class_id = self.op_ref(id)?.class;
        let desc = self
            .registry
            .find_class(class_id)
            .and_then(|c| c.param(para))
            .ok_or_else(|| {
                OpforgeError::validation(format!("op {id} has no parameter {para}"))
            })?;
        if !data.fits(desc) {
            return Err(OpforgeError::validation(format!(
                "value {data:?} does not fit parameter '{}'",
                desc.name
            )));
        }
        let op = self.op_entry(id)?;
        match op.find_value_mut(para) {
            Some(v) => v.data = data,
            None => op.values.push(crate::value::Value { para, data }),
        }
        op.changed = true;
        Ok(())
    }

    /// Connect input `input` to the op stored as `name`. Repeatable inputs append, others
    /// replace.
    pub fn link_input(&mut self, id: OpId, input: ParaId, name: &str) -> OpforgeResult<()> {
        let class_id = self.op_ref(id)?.class;
        let desc = self
            .registry
            .find_class(class_id)
            .and_then(|c| c.input(input))
            .ok_or_else(|| OpforgeError::validation(format!("op {id} has no input {input}")))?;
        let multiple = desc.flags.contains(InputFlags::MULTIPLE);
        let op = self.op_entry(id)?;
        if !multiple {
            op.links.retain(|l| l.slot != LinkSlot::Input(input));
        }
        op.links.push(Link::input(input, name));
        op.changed = true;
        Ok(())
    }

    /// Disconnect every link of input `input`.
    pub fn unlink_input(&mut self, id: OpId, input: ParaId) -> OpforgeResult<()> {
        let op = self.op_entry(id)?;
        let before = op.links.len();
        op.links.retain(|l| l.slot != LinkSlot::Input(input));
        if op.links.len() != before {
            op.changed = true;
        }
        Ok(())
    }

    /// Mark an op changed; the next connect propagates the mark to its consumers.
    pub fn mark_changed(&mut self, id: OpId) -> OpforgeResult<()> {
        let op = self.op_entry(id)?;
        op.changed = true;
        op.cache = None;
        Ok(())
    }

    /// First op with store name `name`, searching pages in order.
    pub fn find_op(&self, name: &str) -> Option<OpId> {
        self.pages.iter().find_map(|p| p.find_op(&self.ops, name))
    }

    /// Page holding `id`.
    pub fn find_page(&self, id: OpId) -> Option<PageId> {
        self.op(id).map(|op| op.page)
    }

    /// Rename every store called `old` and every link naming it. Returns the ops touched.
    pub fn rename_ops(&mut self, old: &str, new: &str) -> usize {
        if old.is_empty() || old == new {
            return 0;
        }
        let mut touched = 0;
        for op in self.ops.iter_mut().flatten() {
            let mut hit = false;
            if op.store_name == old {
                op.store_name = new.to_owned();
                hit = true;
            }
            for link in op.links.iter_mut().filter(|l| l.name == old) {
                link.name = new.to_owned();
                hit = true;
            }
            for v in &mut op.values {
                if let ValueData::Link(name) = &mut v.data
                    && name == old
                {
                    *name = new.to_owned();
                    hit = true;
                }
            }
            if hit {
                op.changed = true;
                touched += 1;
            }
        }
        touched
    }

    /// Drop every cached output and compiled node.
    pub fn flush_cache(&mut self) {
        for op in self.ops.iter_mut().flatten() {
            op.flush_cache();
        }
        self.arena.reset();
    }

    /// Remove all pages and ops. The registry and configuration stay.
    pub fn clear(&mut self) {
        self.pages.clear();
        self.ops.clear();
        self.arena.reset();
    }

    /// Describe the parameters of `id` to an editor.
    pub fn populate_editor(&self, id: OpId, editor: &mut dyn ParamEditor) -> OpforgeResult<()> {
        let op = self.op_ref(id)?;
        let class = self.registry.find_class(op.class).ok_or_else(|| {
            OpforgeError::validation(format!("op {id} has unknown class {}", op.class))
        })?;
        op.populate_editor(class, editor);
        Ok(())
    }

    /// Node behind a handle of the latest compile.
    pub fn node(&self, id: NodeId) -> OpforgeResult<&Node> {
        self.arena.get(id)
    }

    /// Parameter block of a node of the latest compile.
    pub fn node_params(&self, id: NodeId) -> OpforgeResult<&[u32]> {
        self.arena.params(id)
    }

    /// Compile one root. See [`Document::make_node_trees`].
    pub fn make_node_tree(
        &mut self,
        root: OpId,
        variant: VariantId,
        extent: Extent,
    ) -> OpforgeResult<CompiledForest> {
        self.make_node_trees(&[(root, variant)], extent)
    }

    /// Connect, reset the arena and compile every root into one optimized forest.
    ///
    /// Per-op problems are flagged on the ops and reported per root; only arena exhaustion and
    /// invalid arguments fail the call.
    #[tracing::instrument(level = "debug", skip(self, roots), fields(roots = roots.len()))]
    pub fn make_node_trees(
        &mut self,
        roots: &[(OpId, VariantId)],
        extent: Extent,
    ) -> OpforgeResult<CompiledForest> {
        if roots.is_empty() {
            return Err(OpforgeError::validation("no roots to compile"));
        }
        for (id, _) in roots {
            self.op_ref(*id)?;
        }
        self.connect();
        self.prepare_compile();
        let forest = Compiler::new(&self.registry, &mut self.ops, &mut self.arena, extent)
            .compile_forest(roots)?;
        // the connect above already flushed every consumer of a changed op, including ops
        // this compile never reached
        for op in self.ops.iter_mut().flatten() {
            op.changed = false;
        }
        Ok(forest)
    }

    /// Arena reset plus per-compile bookkeeping. Load-time schema flags survive.
    fn prepare_compile(&mut self) {
        self.arena.reset();
        for op in self.ops.iter_mut().flatten() {
            op.nodes.clear();
            if op
                .error
                .as_ref()
                .is_some_and(|e| e.kind != OpErrorKind::SchemaMismatch)
            {
                op.error = None;
            }
        }
    }

    /// Serialize a forest of the latest compile.
    pub fn write_node(&self, forest: &CompiledForest) -> OpforgeResult<Vec<u32>> {
        if forest.epoch != self.arena.epoch() {
            return Err(OpforgeError::StaleNode {
                handle_epoch: forest.epoch,
                arena_epoch: self.arena.epoch(),
            });
        }
        let mut w = WordWriter::new();
        write_records(&self.arena, &forest.order, &mut w)?;
        Ok(w.into_words())
    }

    /// Compile `id` and serialize the result. Reuses the op's cached export while neither it
    /// nor anything it depends on changed.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn export(&mut self, id: OpId, variant: VariantId, extent: Extent) -> OpforgeResult<Vec<u32>> {
        self.op_ref(id)?;
        self.connect();
        let op = self.op_ref(id)?;
        if let Some(c) = &op.cache
            && !op.changed
            && c.variant == variant
            && c.extent == extent
        {
            tracing::debug!(op = id.0, "export served from cache");
            return Ok(c.words.clone());
        }

        for op in self.ops.iter_mut().flatten() {
            op.export_root = false;
        }
        self.op_entry(id)?.export_root = true;

        let forest = self.make_node_tree(id, variant, extent)?;
        let words = self.write_node(&forest)?;
        self.op_entry(id)?.cache = Some(CachedOutput {
            variant,
            extent,
            words: words.clone(),
        });
        Ok(words)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/document.rs"]
mod tests;
