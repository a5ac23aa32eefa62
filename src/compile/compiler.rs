use std::collections::{HashMap, HashSet};

use smallvec::SmallVec;

use crate::compile::arena::{NodeArena, NodeId};
use crate::compile::fingerprint::{Fingerprint, fingerprint_forest};
use crate::compile::node::{Extent, Node, NodeKind};
use crate::compile::optimize::{Sharing, assign_indices, splice_passthrough};
use crate::foundation::error::{OpErrorKind, OpforgeError, OpforgeResult};
use crate::foundation::ids::{OpId, TypeId, VariantId};
use crate::graph::op::{LinkSlot, Op};
use crate::schema::class::{ClassDesc, ClassKind, InputFlags};
use crate::schema::param::{ParamFlags, ParamKind};
use crate::schema::registry::Registry;
use crate::value::Value;

/// Per-op problem found while compiling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileDiagnostic {
    /// Offending op.
    pub op: OpId,
    /// Category.
    pub kind: OpErrorKind,
    /// Human-readable detail.
    pub detail: String,
}

/// One requested root of a compile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledRoot {
    /// Root op.
    pub op: OpId,
    /// Requested variant.
    pub variant: VariantId,
    /// Final node after all passes.
    pub node: NodeId,
    /// Problems raised while this root was compiled. An op shared with an earlier root reports
    /// under that root only.
    pub diagnostics: Vec<CompileDiagnostic>,
}

impl CompiledRoot {
    /// `true` if nothing under this root was flagged.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Result of one compile call: the optimized DAG of every requested root.
#[derive(Clone, Debug)]
pub struct CompiledForest {
    pub(crate) roots: Vec<CompiledRoot>,
    pub(crate) order: Vec<NodeId>,
    pub(crate) fingerprint: Fingerprint,
    pub(crate) epoch: u32,
}

impl CompiledForest {
    /// Roots in request order.
    pub fn roots(&self) -> &[CompiledRoot] {
        &self.roots
    }

    /// Node of the first root.
    pub fn root(&self) -> NodeId {
        self.roots[0].node
    }

    /// Distinct reachable nodes in index order, children before parents.
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// Number of distinct nodes.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// `true` if no node was produced.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Every diagnostic, root by root.
    pub fn diagnostics(&self) -> impl Iterator<Item = &CompileDiagnostic> {
        self.roots.iter().flat_map(|r| r.diagnostics.iter())
    }

    /// Structural hash of the whole forest.
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Arena epoch the handles belong to.
    pub fn epoch(&self) -> u32 {
        self.epoch
    }
}

/// Class kinds that produce a node; comments never get this far.
#[derive(Clone, Copy, PartialEq, Eq)]
enum PassKind {
    Regular,
    Load,
    Store,
    Nop,
}

#[derive(Clone, Copy)]
struct EdgeSnapshot {
    slot: LinkSlot,
    target: Option<OpId>,
    named: bool,
}

pub(crate) struct Compiler<'a> {
    pub(crate) registry: &'a Registry,
    pub(crate) ops: &'a mut [Option<Op>],
    pub(crate) arena: &'a mut NodeArena,
    pub(crate) extent: Extent,
    pub(crate) diagnostics: Vec<CompileDiagnostic>,
    pub(crate) loading: Vec<OpId>,
    pub(crate) resolved: HashMap<NodeId, NodeId>,
    pub(crate) visiting: HashSet<NodeId>,
    active: HashSet<(OpId, VariantId)>,
}

impl<'a> Compiler<'a> {
    pub(crate) fn new(
        registry: &'a Registry,
        ops: &'a mut [Option<Op>],
        arena: &'a mut NodeArena,
        extent: Extent,
    ) -> Self {
        Self {
            registry,
            ops,
            arena,
            extent,
            diagnostics: Vec::new(),
            loading: Vec::new(),
            resolved: HashMap::new(),
            visiting: HashSet::new(),
            active: HashSet::new(),
        }
    }

    fn op(&self, id: OpId) -> OpforgeResult<&Op> {
        self.ops
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or_else(|| OpforgeError::validation(format!("unknown op {id}")))
    }

    fn output_type(&self, id: OpId) -> Option<TypeId> {
        let op = self.ops.get(id.index())?.as_ref()?;
        self.registry.find_class(op.class).map(|c| c.output)
    }

    pub(crate) fn report(&mut self, id: OpId, kind: OpErrorKind, detail: String) {
        tracing::warn!(op = id.0, %kind, "{detail}");
        if let Some(op) = self.ops.get_mut(id.index()).and_then(Option::as_mut) {
            op.flag(kind, detail.clone());
        }
        self.diagnostics.push(CompileDiagnostic {
            op: id,
            kind,
            detail,
        });
    }

    pub(crate) fn placeholder(&mut self, op: Option<OpId>, variant: VariantId) -> OpforgeResult<NodeId> {
        self.arena
            .alloc(Node::placeholder(op, variant, self.extent))
    }

    /// Compile every root, then run the four passes over the whole forest.
    pub(crate) fn compile_forest(
        &mut self,
        roots: &[(OpId, VariantId)],
    ) -> OpforgeResult<CompiledForest> {
        let mut slots = Vec::with_capacity(roots.len());
        let mut compiled = Vec::with_capacity(roots.len());
        for &(op, variant) in roots {
            let before = self.diagnostics.len();
            let node = self.make_node_r(op, variant)?;
            let node = self.resolve_loads(node)?;
            slots.push(node);
            compiled.push((op, variant, self.diagnostics.split_off(before)));
        }
        let built = self.arena.len();

        let mut spliced = HashMap::new();
        for slot in &mut slots {
            *slot = splice_passthrough(self.arena, *slot, &mut spliced)?;
        }

        let mut sharing = Sharing::default();
        for slot in &mut slots {
            *slot = sharing.canonical(self.arena, *slot)?;
        }

        let mut order = Vec::new();
        for slot in &slots {
            assign_indices(self.arena, *slot, &mut order)?;
        }
        tracing::debug!(
            built,
            after_loads = self.arena.len(),
            distinct = order.len(),
            shared = sharing.collapsed(),
            "optimized node forest"
        );

        let fingerprint = fingerprint_forest(self.arena, &order)?;
        let roots = compiled
            .into_iter()
            .zip(slots)
            .map(|((op, variant, diagnostics), node)| CompiledRoot {
                op,
                variant,
                node,
                diagnostics,
            })
            .collect();
        Ok(CompiledForest {
            roots,
            order,
            fingerprint,
            epoch: self.arena.epoch(),
        })
    }

    /// Compile `id` for `requested`, at most once per (op, variant) and compile call.
    pub(crate) fn make_node_r(&mut self, id: OpId, requested: VariantId) -> OpforgeResult<NodeId> {
        let op = self.op(id)?;
        let variant = self
            .registry
            .find_class(op.class)
            .and_then(|c| self.registry.variant_for(c.output, requested))
            .unwrap_or(requested);
        if let Some(node) = op.node(variant) {
            return Ok(node);
        }
        if !self.active.insert((id, variant)) {
            self.report(
                id,
                OpErrorKind::CyclicInput,
                "op is reachable from its own inputs".to_owned(),
            );
            return self.placeholder(Some(id), variant);
        }

        let built = self.build(id, variant);
        self.active.remove(&(id, variant));
        let node = built?;

        if let Some(op) = self.ops.get_mut(id.index()).and_then(Option::as_mut) {
            op.nodes.push((variant, node));
            op.calc_count += 1;
        }
        Ok(node)
    }

    fn build(&mut self, id: OpId, variant: VariantId) -> OpforgeResult<NodeId> {
        let registry = self.registry;
        let op = self.op(id)?;
        let (class_id, bypass, orphan) = (op.class, op.bypass, op.orphan.is_some());
        let edges: SmallVec<[EdgeSnapshot; 4]> = op
            .links
            .iter()
            .map(|l| EdgeSnapshot {
                slot: l.slot,
                target: l.target,
                named: !l.name.is_empty(),
            })
            .collect();

        let class = match registry.find_class(class_id) {
            Some(c) if !orphan => c,
            _ => {
                self.report(
                    id,
                    OpErrorKind::SchemaMismatch,
                    format!("class {class_id} is not registered"),
                );
                return self.placeholder(Some(id), variant);
            }
        };

        let kind = match class.kind() {
            ClassKind::Comment => return self.placeholder(Some(id), variant),
            _ if bypass => PassKind::Nop,
            ClassKind::Load => PassKind::Load,
            ClassKind::Regular => PassKind::Regular,
            ClassKind::Store => PassKind::Store,
            ClassKind::Nop => PassKind::Nop,
        };

        if let Err((err, detail)) = self.check_edges(class, &edges) {
            self.report(id, err, detail);
            return self.placeholder(Some(id), variant);
        }

        match kind {
            PassKind::Load => {
                let target = edges
                    .iter()
                    .find(|e| matches!(e.slot, LinkSlot::Param(_)))
                    .and_then(|e| e.target);
                let Some(target) = target else {
                    self.report(
                        id,
                        OpErrorKind::LinkUnresolved,
                        "load has no store to alias".to_owned(),
                    );
                    return self.placeholder(Some(id), variant);
                };
                let mut node = Node::new(NodeKind::Load, Some(id), variant, self.extent);
                node.load_target = Some(target);
                self.arena.alloc(node)
            }
            PassKind::Regular => {
                let Some(handler) = class.handler(variant) else {
                    self.report(
                        id,
                        OpErrorKind::VariantMismatch,
                        format!("class '{}' has no handler for {variant}", class.name),
                    );
                    return self.placeholder(Some(id), variant);
                };
                let children = self.compile_children(class, &edges, variant, id)?;
                let mut block = Vec::new();
                if let Some(op) = self.ops.get(id.index()).and_then(Option::as_ref) {
                    store_params(op, class, &mut block);
                }
                let mut node = Node::new(NodeKind::Regular, Some(id), variant, self.extent);
                node.handler = handler;
                node.params = self.arena.alloc_words(&block)?;
                node.children = children;
                self.arena.alloc(node)
            }
            PassKind::Store | PassKind::Nop => {
                let mut children = self.compile_children(class, &edges, variant, id)?;
                if children.is_empty() {
                    return self.placeholder(Some(id), variant);
                }
                children.truncate(1);
                let kind = if kind == PassKind::Store {
                    NodeKind::Store
                } else {
                    NodeKind::Nop
                };
                let mut node = Node::new(kind, Some(id), variant, self.extent);
                node.children = children;
                self.arena.alloc(node)
            }
        }
    }

    /// Fail on missing required edges and mistyped targets.
    fn check_edges(
        &self,
        class: &ClassDesc,
        edges: &[EdgeSnapshot],
    ) -> Result<(), (OpErrorKind, String)> {
        let resolved = |slot: LinkSlot| edges.iter().any(|e| e.slot == slot && e.target.is_some());

        for input in &class.inputs {
            if input.flags.contains(InputFlags::REQUIRED) && !resolved(LinkSlot::Input(input.id)) {
                return Err((
                    OpErrorKind::LinkUnresolved,
                    format!("required input '{}' is not connected", input.name),
                ));
            }
        }
        for p in class.value_params() {
            if p.kind == ParamKind::Link
                && p.flags.contains(ParamFlags::LINK_REQUIRED)
                && !resolved(LinkSlot::Param(p.id))
            {
                return Err((
                    OpErrorKind::LinkUnresolved,
                    format!("required link '{}' does not resolve", p.name),
                ));
            }
        }

        for e in edges {
            let Some(target) = e.target else { continue };
            let (expected, what) = match e.slot {
                LinkSlot::Input(p) => match class.input(p) {
                    Some(d) => (Some(d.ty), d.name.as_str()),
                    None => continue,
                },
                LinkSlot::Param(p) => match class.param(p) {
                    Some(d) => (d.link_type, d.name.as_str()),
                    None => continue,
                },
            };
            // orphan targets have no known type and compile to placeholders on their own
            let Some(actual) = self.output_type(target) else {
                continue;
            };
            if expected.is_some_and(|t| t != actual) {
                return Err((
                    OpErrorKind::VariantMismatch,
                    format!("'{what}' is connected to an op producing {actual}"),
                ));
            }
        }
        Ok(())
    }

    fn compile_children(
        &mut self,
        class: &ClassDesc,
        edges: &[EdgeSnapshot],
        variant: VariantId,
        id: OpId,
    ) -> OpforgeResult<SmallVec<[NodeId; 4]>> {
        let mut children = SmallVec::new();
        for e in edges {
            let follow = match e.slot {
                LinkSlot::Input(p) => match class.input(p) {
                    Some(d) => !d.flags.contains(InputFlags::DONT_FOLLOW),
                    None => false,
                },
                LinkSlot::Param(p) => class.param(p).is_some(),
            };
            match e.target {
                Some(target) if follow => children.push(self.make_node_r(target, variant)?),
                Some(_) => {}
                None if e.named => self.report(
                    id,
                    OpErrorKind::LinkUnresolved,
                    "optional link does not resolve".to_owned(),
                ),
                None => {}
            }
        }
        Ok(children)
    }
}

/// Build the compiled parameter block of `op` in class parameter order.
pub(crate) fn store_params(op: &Op, class: &ClassDesc, dest: &mut Vec<u32>) {
    for desc in class.value_params() {
        match op.find_value(desc.id) {
            Some(v) => v.store_into(desc, dest),
            None => {
                if let Some(v) = Value::default_from(desc) {
                    v.store_into(desc, dest);
                }
            }
        }
    }
}
