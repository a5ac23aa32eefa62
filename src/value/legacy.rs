use std::collections::HashMap;

use crate::foundation::config::LegacyWidthEntry;
use crate::foundation::ids::{ClassId, ParaId};

/// Persisted widths of retired parameters, used to skip values whose descriptor is gone.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LegacyWidths {
    words: HashMap<(ClassId, ParaId), usize>,
}

impl LegacyWidths {
    /// Build the lookup table from configuration entries. Later entries win.
    pub fn from_entries(entries: &[LegacyWidthEntry]) -> Self {
        Self {
            words: entries
                .iter()
                .map(|e| ((e.class, e.para), e.words as usize))
                .collect(),
        }
    }

    /// Stored word count of `para` on `class`, if known.
    pub fn width(&self, class: ClassId, para: ParaId) -> Option<usize> {
        self.words.get(&(class, para)).copied()
    }

    /// Number of known entries.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// `true` if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
