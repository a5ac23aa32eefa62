pub(crate) mod arena;
pub(crate) mod compiler;
pub(crate) mod export;
pub(crate) mod fingerprint;
pub(crate) mod node;
pub(crate) mod optimize;
