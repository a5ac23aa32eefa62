/// Convenience result type used across opforge.
pub type OpforgeResult<T> = Result<T, OpforgeError>;

/// Call-level error taxonomy.
///
/// Errors scoped to a single op (missing links, cyclic loads, schema drift) never surface here;
/// they are attached to the op and reported through compile diagnostics instead. Everything in
/// this enum is fatal to the call that returned it.
#[derive(thiserror::Error, Debug)]
pub enum OpforgeError {
    /// Invalid descriptor, registry or API input.
    #[error("validation error: {0}")]
    Validation(String),

    /// The node arena hit its configured limit during a compile.
    #[error("arena exhausted: requested {requested} {unit}, limit is {limit}")]
    ArenaExhausted {
        /// What was being allocated (`"nodes"` or `"words"`).
        unit: &'static str,
        /// Size the arena would have reached.
        requested: usize,
        /// Configured limit.
        limit: usize,
    },

    /// Malformed or truncated persisted data.
    #[error("corrupt stream at word {offset}: {reason}")]
    CorruptStream {
        /// Word offset where decoding failed.
        offset: usize,
        /// Human-readable failure description.
        reason: String,
    },

    /// A node handle from an earlier compilation was used after the arena was reset.
    #[error("stale node handle (epoch {handle_epoch}, arena epoch {arena_epoch})")]
    StaleNode {
        /// Epoch stored in the handle.
        handle_epoch: u32,
        /// Current arena epoch.
        arena_epoch: u32,
    },

    /// Invalid document configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Wrapped lower-level error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OpforgeError {
    /// Build a [`OpforgeError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`OpforgeError::CorruptStream`] value.
    pub fn corrupt(offset: usize, reason: impl Into<String>) -> Self {
        Self::CorruptStream {
            offset,
            reason: reason.into(),
        }
    }

    /// Build a [`OpforgeError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Error categories scoped to a single op.
///
/// These never abort a call; they are attached to the op and listed in compile diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpErrorKind {
    /// Stored class or parameter is unknown or altered.
    SchemaMismatch,
    /// A required input or link has no resolvable target.
    LinkUnresolved,
    /// A load alias chain leads back to itself.
    CyclicLoad,
    /// The op feeds itself through its inputs.
    CyclicInput,
    /// Input type or requested variant does not fit the class.
    VariantMismatch,
}

impl std::fmt::Display for OpErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::SchemaMismatch => "schema mismatch",
            Self::LinkUnresolved => "unresolved link",
            Self::CyclicLoad => "cyclic load",
            Self::CyclicInput => "cyclic input",
            Self::VariantMismatch => "variant mismatch",
        };
        f.write_str(s)
    }
}

/// Error flag attached to an op.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpError {
    /// Category.
    pub kind: OpErrorKind,
    /// Human-readable detail.
    pub detail: String,
}

impl OpError {
    /// Build an op error.
    pub fn new(kind: OpErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for OpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
