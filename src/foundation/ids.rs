//! Stable integer identifiers.
//!
//! Type, variant, class and parameter ids are persisted and must never be renumbered. Op and
//! page ids are document-local slots.

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize,
            serde::Deserialize,
        )]
        pub struct $name(pub u32);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({:#06x})", stringify!($name), self.0)
            }
        }
    };
}

id_type!(
    /// Content category (bitmap, mesh, ...).
    TypeId
);
id_type!(
    /// Concrete sub-format of a type.
    VariantId
);
id_type!(
    /// Op class.
    ClassId
);
id_type!(
    /// Parameter or input id, unique within one class.
    ParaId
);
id_type!(
    /// Op slot inside a document.
    OpId
);
id_type!(
    /// Page slot inside a document.
    PageId
);

impl OpId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl PageId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}
