use std::collections::BTreeMap;

use crate::foundation::error::{OpforgeError, OpforgeResult};
use crate::foundation::ids::{ClassId, ParaId, TypeId, VariantId};
use crate::schema::param::{ParamDesc, ParamKind};

/// Class flag bits marking the structural pseudo-classes.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ClassFlags(pub u32);

impl ClassFlags {
    /// Ordinary operator.
    pub const NONE: Self = Self(0);
    /// Passes its input through; removed by the optimizer.
    pub const NOP: Self = Self(0x0001);
    /// Aliases a stored subtree by name; removed by the optimizer.
    pub const LOAD: Self = Self(0x0002);
    /// Names a subtree for loads; removed by the optimizer.
    pub const STORE: Self = Self(0x0004);
    /// Free-standing annotation, never compiled.
    pub const COMMENT: Self = Self(0x0008);

    /// `true` if every bit of `other` is set.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }
}

/// Node-construction behavior, derived from [`ClassFlags`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClassKind {
    /// Real operator backed by a handler.
    Regular,
    /// See [`ClassFlags::LOAD`].
    Load,
    /// See [`ClassFlags::STORE`].
    Store,
    /// See [`ClassFlags::NOP`].
    Nop,
    /// See [`ClassFlags::COMMENT`].
    Comment,
}

/// Op palette column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Column {
    /// No inputs.
    #[default]
    Generator,
    /// One input, one output.
    Filter,
    /// Merges several inputs.
    Combiner,
    /// Load, store, nop and friends.
    Special,
    /// Not listed.
    Invisible,
}

/// Input flag bits.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct InputFlags(pub u32);

impl InputFlags {
    /// Optional input.
    pub const NONE: Self = Self(0);
    /// Compilation fails for the op when unconnected.
    pub const REQUIRED: Self = Self(0x0001);
    /// May be repeated; only valid on the last input.
    pub const MULTIPLE: Self = Self(0x0002);
    /// Resolved but not followed during compilation.
    pub const DONT_FOLLOW: Self = Self(0x0004);

    /// `true` if every bit of `other` is set.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }
}

impl std::ops::BitOr for InputFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Schema of one input edge.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InputDesc {
    /// Id, shared with the class's parameter id space.
    pub id: ParaId,
    /// Display name.
    pub name: String,
    /// Required output type of the connected op.
    pub ty: TypeId,
    /// Input flags.
    pub flags: InputFlags,
}

impl InputDesc {
    /// Build an input descriptor.
    pub fn new(id: u32, name: &str, ty: TypeId, flags: InputFlags) -> Self {
        Self {
            id: ParaId(id),
            name: name.to_owned(),
            ty,
            flags,
        }
    }
}

/// Opaque reference to the generation routine of one (class, variant) pair.
///
/// Emitted as the opcode of compiled records; the code behind it lives in the downstream engine.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize,
    serde::Deserialize,
)]
pub struct HandlerRef(pub u32);

impl HandlerRef {
    /// No handler; used by placeholders and pseudo-classes.
    pub const NONE: Self = Self(0);
}

/// Schema of one op class. Immutable once built.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClassDesc {
    /// Stable id.
    pub id: ClassId,
    /// Display name.
    pub name: String,
    /// Schema version, bumped when parameters change.
    pub version: u32,
    /// Pseudo-class flags.
    pub flags: ClassFlags,
    /// Palette column.
    pub column: Column,
    /// Palette shortcut key.
    pub shortcut: Option<char>,
    /// Output type.
    pub output: TypeId,
    /// Parameters in display order.
    pub params: Vec<ParamDesc>,
    /// Inputs in connection order.
    pub inputs: Vec<InputDesc>,
    /// Handler per supported output variant.
    pub handlers: BTreeMap<VariantId, HandlerRef>,
    /// Id the next added parameter will receive.
    pub next_para_id: ParaId,
}

impl ClassDesc {
    /// Start building a class.
    pub fn builder(id: u32, name: &str, output: TypeId) -> ClassBuilder {
        ClassBuilder {
            class: ClassDesc {
                id: ClassId(id),
                name: name.to_owned(),
                version: 1,
                flags: ClassFlags::NONE,
                column: Column::Generator,
                shortcut: None,
                output,
                params: Vec::new(),
                inputs: Vec::new(),
                handlers: BTreeMap::new(),
                next_para_id: ParaId(1),
            },
        }
    }

    /// Node-construction behavior.
    pub fn kind(&self) -> ClassKind {
        if self.flags.contains(ClassFlags::COMMENT) {
            ClassKind::Comment
        } else if self.flags.contains(ClassFlags::LOAD) {
            ClassKind::Load
        } else if self.flags.contains(ClassFlags::STORE) {
            ClassKind::Store
        } else if self.flags.contains(ClassFlags::NOP) {
            ClassKind::Nop
        } else {
            ClassKind::Regular
        }
    }

    /// Look up a parameter. Labels are never returned.
    pub fn param(&self, id: ParaId) -> Option<&ParamDesc> {
        self.params
            .iter()
            .find(|p| p.id == id && p.kind != ParamKind::Label)
    }

    /// Look up an input.
    pub fn input(&self, id: ParaId) -> Option<&InputDesc> {
        self.inputs.iter().find(|i| i.id == id)
    }

    /// Handler for `variant`.
    pub fn handler(&self, variant: VariantId) -> Option<HandlerRef> {
        self.handlers.get(&variant).copied()
    }

    /// Parameters that carry a value (labels excluded).
    pub fn value_params(&self) -> impl Iterator<Item = &ParamDesc> {
        self.params.iter().filter(|p| p.kind != ParamKind::Label)
    }
}

/// Builder returned by [`ClassDesc::builder`].
#[derive(Clone, Debug)]
pub struct ClassBuilder {
    class: ClassDesc,
}

impl ClassBuilder {
    /// Set the schema version.
    pub fn version(mut self, version: u32) -> Self {
        self.class.version = version;
        self
    }

    /// Set the pseudo-class flags.
    pub fn flags(mut self, flags: ClassFlags) -> Self {
        self.class.flags = flags;
        self
    }

    /// Set the palette column.
    pub fn column(mut self, column: Column) -> Self {
        self.class.column = column;
        self
    }

    /// Set the palette shortcut.
    pub fn shortcut(mut self, key: char) -> Self {
        self.class.shortcut = Some(key);
        self
    }

    /// Append a parameter.
    pub fn param(mut self, param: ParamDesc) -> Self {
        self.class.params.push(param);
        self
    }

    /// Append an input.
    pub fn input(mut self, input: InputDesc) -> Self {
        self.class.inputs.push(input);
        self
    }

    /// Register the handler for `variant`.
    pub fn handler(mut self, variant: u32, handler: HandlerRef) -> Self {
        self.class.handlers.insert(VariantId(variant), handler);
        self
    }

    /// Validate and finish the class.
    pub fn build(self) -> OpforgeResult<ClassDesc> {
        let mut c = self.class;
        let fail = |msg: String| Err(OpforgeError::validation(format!("class {}: {msg}", c.id)));

        if c.id.0 == 0 {
            return fail("id 0 is reserved".to_owned());
        }
        let pseudo = [
            ClassFlags::NOP,
            ClassFlags::LOAD,
            ClassFlags::STORE,
            ClassFlags::COMMENT,
        ];
        if pseudo.iter().filter(|f| c.flags.contains(**f)).count() > 1 {
            return fail("pseudo-class flags are mutually exclusive".to_owned());
        }

        let mut ids: Vec<ParaId> = Vec::new();
        for p in c.params.iter().filter(|p| p.kind != ParamKind::Label) {
            p.validate()?;
            ids.push(p.id);
        }
        ids.extend(c.inputs.iter().map(|i| i.id));
        for (i, id) in ids.iter().enumerate() {
            if id.0 == 0 {
                return fail("parameter id 0 is reserved for labels".to_owned());
            }
            if ids[..i].contains(id) {
                return fail(format!("duplicate parameter id {id}"));
            }
        }

        let last = c.inputs.len().saturating_sub(1);
        if c
            .inputs
            .iter()
            .enumerate()
            .any(|(i, inp)| inp.flags.contains(InputFlags::MULTIPLE) && i != last)
        {
            return fail("only the last input may repeat".to_owned());
        }
        if matches!(c.kind(), ClassKind::Store | ClassKind::Nop) && c.inputs.is_empty() {
            return fail("store and nop classes need an input".to_owned());
        }
        if c.kind() == ClassKind::Load
            && !c.value_params().any(|p| p.kind == ParamKind::Link)
        {
            return fail("load classes need a link parameter".to_owned());
        }

        let max_id = ids.iter().map(|id| id.0).max().unwrap_or(0);
        c.next_para_id = ParaId(max_id + 1);
        Ok(c)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schema/class.rs"]
mod tests;
