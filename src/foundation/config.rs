use crate::foundation::error::{OpforgeError, OpforgeResult};
use crate::foundation::ids::{ClassId, ParaId};

/// Document-level knobs.
///
/// Loaded from JSON by hosts; every field has a default so partial configs are accepted.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentConfig {
    /// Node capacity reserved when the arena is created.
    pub arena_initial_nodes: usize,
    /// Maximum number of nodes a single compilation may allocate.
    pub max_nodes: usize,
    /// Maximum number of parameter words a single compilation may allocate.
    pub max_words: usize,
    /// Resolve link names on other pages when the page-local lookup fails.
    pub cross_page_links: bool,
    /// Stored widths of parameters that no longer exist in the registry.
    pub legacy_widths: Vec<LegacyWidthEntry>,
}

/// Stored word count of one retired parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LegacyWidthEntry {
    /// Class the parameter belonged to.
    pub class: ClassId,
    /// Retired parameter id.
    pub para: ParaId,
    /// Persisted width in words.
    pub words: u32,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            arena_initial_nodes: 256,
            max_nodes: 1 << 20,
            max_words: 1 << 24,
            cross_page_links: false,
            legacy_widths: Vec::new(),
        }
    }
}

impl DocumentConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(s: &str) -> OpforgeResult<Self> {
        let cfg: Self =
            serde_json::from_str(s).map_err(|e| OpforgeError::config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check limits for consistency.
    pub fn validate(&self) -> OpforgeResult<()> {
        if self.max_nodes == 0 {
            return Err(OpforgeError::config("max_nodes must be > 0"));
        }
        if self.max_words == 0 {
            return Err(OpforgeError::config("max_words must be > 0"));
        }
        if self.arena_initial_nodes > self.max_nodes {
            return Err(OpforgeError::config(
                "arena_initial_nodes must not exceed max_nodes",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
