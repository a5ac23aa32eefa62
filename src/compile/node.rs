use smallvec::SmallVec;

use crate::compile::arena::NodeId;
use crate::foundation::ids::{OpId, VariantId};
use crate::schema::class::HandlerRef;

/// Target size requested for a compile, in pixels or mesh units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Extent {
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

impl Extent {
    /// Build an extent.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Node role in the DAG. Only `Regular` and `Placeholder` survive optimization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Backed by a handler.
    Regular,
    /// Alias for the subtree of a named store; replaced by pass 1.
    Load,
    /// Named pass-through; spliced out by pass 2.
    Store,
    /// Pass-through; spliced out by pass 2.
    Nop,
    /// Stand-in for an op that could not be compiled.
    Placeholder,
}

/// Words of a node's parameter block inside the arena's word region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ParamRange {
    pub(crate) start: u32,
    pub(crate) len: u32,
}

impl ParamRange {
    /// Number of words.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// `true` for an empty block.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Compiled IR unit.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) op: Option<OpId>,
    pub(crate) handler: HandlerRef,
    pub(crate) variant: VariantId,
    pub(crate) extent: Extent,
    pub(crate) params: ParamRange,
    pub(crate) children: SmallVec<[NodeId; 4]>,
    pub(crate) load_target: Option<OpId>,
    pub(crate) index: Option<u32>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, op: Option<OpId>, variant: VariantId, extent: Extent) -> Self {
        Self {
            kind,
            op,
            handler: HandlerRef::NONE,
            variant,
            extent,
            params: ParamRange::default(),
            children: SmallVec::new(),
            load_target: None,
            index: None,
        }
    }

    pub(crate) fn placeholder(op: Option<OpId>, variant: VariantId, extent: Extent) -> Self {
        Self::new(NodeKind::Placeholder, op, variant, extent)
    }

    /// Node role.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Op the node was compiled from. Shared nodes report the first op that produced them.
    pub fn op(&self) -> Option<OpId> {
        self.op
    }

    /// Handler emitted as the record opcode.
    pub fn handler(&self) -> HandlerRef {
        self.handler
    }

    /// Output variant.
    pub fn variant(&self) -> VariantId {
        self.variant
    }

    /// Requested extent.
    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// Location of the parameter block.
    pub fn params(&self) -> ParamRange {
        self.params
    }

    /// Child handles in input order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Store op a load node refers to.
    pub fn load_target(&self) -> Option<OpId> {
        self.load_target
    }

    /// Post-order index assigned by the final pass.
    pub fn index(&self) -> Option<u32> {
        self.index
    }
}
