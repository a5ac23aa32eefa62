pub(crate) mod connect;
pub(crate) mod document;
pub(crate) mod op;
pub(crate) mod page;
pub(crate) mod persist;
