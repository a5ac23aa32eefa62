use std::collections::HashMap;

use crate::foundation::error::{OpforgeError, OpforgeResult};
use crate::foundation::ids::{ClassId, TypeId, VariantId};
use crate::schema::class::ClassDesc;
use crate::schema::param::ParamKind;
use crate::schema::types::TypeDesc;

/// Fixed vocabulary of types and classes.
///
/// Built once through [`RegistryBuilder`] and read-only afterwards. Registration order is the
/// iteration order; identity is always the explicit id.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    types: Vec<TypeDesc>,
    classes: Vec<ClassDesc>,
    type_index: HashMap<TypeId, usize>,
    class_index: HashMap<ClassId, usize>,
}

impl Registry {
    /// Start an empty registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Stock vocabulary. See [`crate::standard`].
    pub fn standard() -> OpforgeResult<Self> {
        crate::schema::standard::standard_registry()
    }

    /// Types in registration order.
    pub fn types(&self) -> &[TypeDesc] {
        &self.types
    }

    /// Classes in registration order.
    pub fn classes(&self) -> &[ClassDesc] {
        &self.classes
    }

    /// Look up a type.
    pub fn find_type(&self, id: TypeId) -> Option<&TypeDesc> {
        self.type_index.get(&id).map(|&i| &self.types[i])
    }

    /// Look up a class.
    pub fn find_class(&self, id: ClassId) -> Option<&ClassDesc> {
        self.class_index.get(&id).map(|&i| &self.classes[i])
    }

    /// Variant to compile an op of type `ty` with when its consumer asked for `requested`.
    ///
    /// The requested variant is kept when `ty` owns it, otherwise the type's default applies.
    pub fn variant_for(&self, ty: TypeId, requested: VariantId) -> Option<VariantId> {
        let t = self.find_type(ty)?;
        if t.owns(requested) {
            Some(requested)
        } else {
            t.default_variant()
        }
    }
}

/// Accumulates types and classes, validating cross references on [`RegistryBuilder::build`].
#[derive(Clone, Debug, Default)]
pub struct RegistryBuilder {
    types: Vec<TypeDesc>,
    classes: Vec<ClassDesc>,
}

impl RegistryBuilder {
    /// Register a type.
    pub fn add_type(mut self, ty: TypeDesc) -> Self {
        self.types.push(ty);
        self
    }

    /// Register a class.
    pub fn add_class(mut self, class: ClassDesc) -> Self {
        self.classes.push(class);
        self
    }

    /// Validate and freeze.
    pub fn build(self) -> OpforgeResult<Registry> {
        let mut type_index = HashMap::with_capacity(self.types.len());
        for (i, t) in self.types.iter().enumerate() {
            t.validate()?;
            if type_index.insert(t.id, i).is_some() {
                return Err(OpforgeError::validation(format!("duplicate type {}", t.id)));
            }
        }

        let mut class_index = HashMap::with_capacity(self.classes.len());
        for (i, c) in self.classes.iter().enumerate() {
            if class_index.insert(c.id, i).is_some() {
                return Err(OpforgeError::validation(format!("duplicate class {}", c.id)));
            }
            let Some(&ti) = type_index.get(&c.output) else {
                return Err(OpforgeError::validation(format!(
                    "class '{}': unknown output type {}",
                    c.name, c.output
                )));
            };
            for input in &c.inputs {
                if !type_index.contains_key(&input.ty) {
                    return Err(OpforgeError::validation(format!(
                        "class '{}': input '{}' has unknown type {}",
                        c.name, input.name, input.ty
                    )));
                }
            }
            for p in c.params.iter().filter(|p| p.kind == ParamKind::Link) {
                let known = p.link_type.is_some_and(|t| type_index.contains_key(&t));
                if !known {
                    return Err(OpforgeError::validation(format!(
                        "class '{}': link '{}' has unknown type",
                        c.name, p.name
                    )));
                }
            }
            let out = &self.types[ti];
            if let Some(v) = c.handlers.keys().find(|v| !out.owns(**v)) {
                return Err(OpforgeError::validation(format!(
                    "class '{}': handler for {v} which type '{}' does not own",
                    c.name, out.name
                )));
            }
        }

        Ok(Registry {
            types: self.types,
            classes: self.classes,
            type_index,
            class_index,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schema/registry.rs"]
mod tests;
