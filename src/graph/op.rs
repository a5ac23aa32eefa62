use smallvec::SmallVec;

use crate::compile::arena::NodeId;
use crate::compile::node::Extent;
use crate::foundation::error::{OpError, OpErrorKind};
use crate::foundation::ids::{ClassId, OpId, PageId, ParaId, VariantId};
use crate::schema::class::ClassDesc;
use crate::schema::param::{ParamFlags, ParamKind};
use crate::value::editor::{EditorControl, ParamEditor};
use crate::value::{Value, ValueData};

/// Which part of the op a link belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LinkSlot {
    /// Input edge, by input id.
    Input(ParaId),
    /// Link-typed parameter, by parameter id.
    Param(ParaId),
}

/// Named edge to another op.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
    /// Owning input or parameter.
    pub slot: LinkSlot,
    /// Store name of the target.
    pub name: String,
    pub(crate) target: Option<OpId>,
}

impl Link {
    pub(crate) fn input(id: ParaId, name: &str) -> Self {
        Self {
            slot: LinkSlot::Input(id),
            name: name.to_owned(),
            target: None,
        }
    }

    /// Op the name resolved to during the last connect.
    pub fn target(&self) -> Option<OpId> {
        self.target
    }
}

/// Result a host engine computed for an op, kept until the op or its inputs change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedOutput {
    /// Variant the output was produced for.
    pub variant: VariantId,
    /// Extent the output was produced for.
    pub extent: Extent,
    /// Output words.
    pub words: Vec<u32>,
}

/// Class-specific record remainder of an op whose class is unknown, kept for lossless saving.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct OrphanPayload {
    pub(crate) version: u32,
    /// `false` if `raw` came from a layout without per-value word counts.
    pub(crate) sized: bool,
    pub(crate) raw: Vec<u32>,
}

/// One placed instance of a class.
#[derive(Clone, Debug)]
pub struct Op {
    pub(crate) class: ClassId,
    pub(crate) page: PageId,
    pub(crate) pos_x: i32,
    pub(crate) pos_y: i32,
    pub(crate) width: i32,
    pub(crate) height: i32,
    pub(crate) selected: bool,
    pub(crate) bypass: bool,
    pub(crate) hide: bool,
    pub(crate) export_root: bool,
    pub(crate) store_name: String,
    pub(crate) links: SmallVec<[Link; 2]>,
    pub(crate) values: Vec<Value>,
    pub(crate) nodes: SmallVec<[(VariantId, NodeId); 1]>,
    pub(crate) cache: Option<CachedOutput>,
    pub(crate) changed: bool,
    pub(crate) error: Option<OpError>,
    pub(crate) calc_count: u32,
    pub(crate) orphan: Option<OrphanPayload>,
}

impl Op {
    pub(crate) fn blank(class: ClassId, page: PageId) -> Self {
        Self {
            class,
            page,
            pos_x: 0,
            pos_y: 0,
            width: 3,
            height: 1,
            selected: false,
            bypass: false,
            hide: false,
            export_root: false,
            store_name: String::new(),
            links: SmallVec::new(),
            values: Vec::new(),
            nodes: SmallVec::new(),
            cache: None,
            changed: true,
            error: None,
            calc_count: 0,
            orphan: None,
        }
    }

    /// New op with every value at its default.
    pub(crate) fn create(class: &ClassDesc, page: PageId) -> Self {
        let mut op = Self::blank(class.id, page);
        op.values = class.value_params().filter_map(Value::default_from).collect();
        op
    }

    /// Class id.
    pub fn class(&self) -> ClassId {
        self.class
    }

    /// Owning page.
    pub fn page(&self) -> PageId {
        self.page
    }

    /// Grid position.
    pub fn position(&self) -> (i32, i32) {
        (self.pos_x, self.pos_y)
    }

    /// Grid size.
    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    /// Move the op on its page.
    pub fn set_position(&mut self, x: i32, y: i32) {
        self.pos_x = x;
        self.pos_y = y;
    }

    /// Resize the op.
    pub fn set_size(&mut self, width: i32, height: i32) {
        self.width = width;
        self.height = height;
    }

    /// Selection state in the editor.
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Change selection.
    pub fn set_selected(&mut self, on: bool) {
        self.selected = on;
    }

    /// Hidden in the editor.
    pub fn is_hidden(&self) -> bool {
        self.hide
    }

    /// Change visibility.
    pub fn set_hidden(&mut self, on: bool) {
        self.hide = on;
    }

    /// Compiled as a pass-through of its first input.
    pub fn is_bypassed(&self) -> bool {
        self.bypass
    }

    /// Toggle bypass. Marks the op changed.
    pub fn set_bypass(&mut self, on: bool) {
        if self.bypass != on {
            self.bypass = on;
            self.changed = true;
        }
    }

    /// Root of the most recent export.
    pub fn is_export_root(&self) -> bool {
        self.export_root
    }

    /// Name other ops link to; empty for anonymous ops.
    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    /// Edges in compile order: inputs by declaration, then link parameters.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Values in class parameter order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Value of parameter `para`.
    pub fn find_value(&self, para: ParaId) -> Option<&Value> {
        self.values.iter().find(|v| v.para == para)
    }

    pub(crate) fn find_value_mut(&mut self, para: ParaId) -> Option<&mut Value> {
        self.values.iter_mut().find(|v| v.para == para)
    }

    /// Compiled node for `variant` in the current compile epoch.
    pub fn node(&self, variant: VariantId) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(v, _)| *v == variant)
            .map(|(_, n)| *n)
    }

    /// Host cache slot.
    pub fn cached_output(&self) -> Option<&CachedOutput> {
        self.cache.as_ref()
    }

    /// `true` if the op or something it depends on changed since it was last compiled.
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Current error flag.
    pub fn error(&self) -> Option<&OpError> {
        self.error.as_ref()
    }

    /// Nodes constructed for this op over its lifetime.
    pub fn calc_count(&self) -> u32 {
        self.calc_count
    }

    /// `true` if the class is unknown to the registry the op was loaded with.
    pub fn is_orphan(&self) -> bool {
        self.orphan.is_some()
    }

    /// Drop cached results.
    pub fn flush_cache(&mut self) {
        self.cache = None;
        self.nodes.clear();
    }

    /// Keep the first error; later ones only show up in diagnostics.
    pub(crate) fn flag(&mut self, kind: OpErrorKind, detail: impl Into<String>) {
        if self.error.is_none() {
            self.error = Some(OpError::new(kind, detail));
        }
    }

    /// Describe every visible parameter to `editor`, in class order.
    pub fn populate_editor(&self, class: &ClassDesc, editor: &mut dyn ParamEditor) {
        for desc in &class.params {
            if desc.flags.contains(ParamFlags::INVISIBLE) {
                continue;
            }
            if desc.kind == ParamKind::Label {
                editor.add_control(desc.flags, EditorControl::Label { name: &desc.name });
                continue;
            }
            if let Some(v) = self.find_value(desc.id) {
                v.populate_editor(desc, editor);
            }
        }
    }

    /// Link names carried by link-typed values, with their parameter ids.
    pub(crate) fn link_values(&self) -> impl Iterator<Item = (ParaId, &str)> {
        self.values.iter().filter_map(|v| match &v.data {
            ValueData::Link(name) => Some((v.para, name.as_str())),
            _ => None,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/op.rs"]
mod tests;
