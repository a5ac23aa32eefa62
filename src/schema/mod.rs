pub(crate) mod class;
pub(crate) mod param;
pub(crate) mod registry;
pub mod standard;
pub(crate) mod types;
