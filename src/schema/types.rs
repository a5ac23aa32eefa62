use crate::foundation::error::{OpforgeError, OpforgeResult};
use crate::foundation::ids::{TypeId, VariantId};

/// Concrete sub-format of a [`TypeDesc`], like 8-bit RGBA.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VariantDesc {
    /// Stable id, unique within the owning type.
    pub id: VariantId,
    /// Display name.
    pub name: String,
    /// Owning type.
    pub ty: TypeId,
}

/// Content category, like bitmap or mesh.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TypeDesc {
    /// Stable id. `0` is reserved for "unknown".
    pub id: TypeId,
    /// Display name.
    pub name: String,
    /// Editor color, `0xAARRGGBB`.
    pub color: u32,
    /// Owned variants; the first one is the default.
    pub variants: Vec<VariantDesc>,
}

impl TypeDesc {
    /// Type without variants.
    pub fn new(id: u32, name: &str, color: u32) -> Self {
        Self {
            id: TypeId(id),
            name: name.to_owned(),
            color,
            variants: Vec::new(),
        }
    }

    /// Append a variant. Duplicate ids are reported by [`TypeDesc::validate`].
    pub fn with_variant(mut self, id: u32, name: &str) -> Self {
        self.variants.push(VariantDesc {
            id: VariantId(id),
            name: name.to_owned(),
            ty: self.id,
        });
        self
    }

    /// Look up an owned variant.
    pub fn variant(&self, id: VariantId) -> Option<&VariantDesc> {
        self.variants.iter().find(|v| v.id == id)
    }

    /// `true` if this type owns `id`.
    pub fn owns(&self, id: VariantId) -> bool {
        self.variant(id).is_some()
    }

    /// First registered variant.
    pub fn default_variant(&self) -> Option<VariantId> {
        self.variants.first().map(|v| v.id)
    }

    pub(crate) fn validate(&self) -> OpforgeResult<()> {
        if self.id.0 == 0 {
            return Err(OpforgeError::validation(format!(
                "type '{}': id 0 is reserved",
                self.name
            )));
        }
        if self.variants.is_empty() {
            return Err(OpforgeError::validation(format!(
                "type '{}' has no variants",
                self.name
            )));
        }
        for (i, v) in self.variants.iter().enumerate() {
            if self.variants[..i].iter().any(|o| o.id == v.id) {
                return Err(OpforgeError::validation(format!(
                    "type '{}': duplicate variant {}",
                    self.name, v.id
                )));
            }
        }
        Ok(())
    }
}
