//! Document model and compiler for procedural content op graphs.
//!
//! A [`Document`] holds pages of ops, each an instance of a class from an immutable
//! [`Registry`]. Ops name each other through store names; [`Document::connect`] resolves those
//! names and propagates change marks. [`Document::make_node_tree`] compiles an op into a shared
//! node DAG, runs the four optimizer passes and hands back a [`CompiledForest`] that
//! [`Document::write_node`] flattens into an index-based word stream for a generation engine.
//! [`Document::write`] and [`Document::read`] persist the editable graph itself.
//!
//! ```
//! use opforge::{Document, Extent, ParaId, standard};
//!
//! let mut doc = Document::with_standard_registry()?;
//! let page = doc.add_page("main");
//! let flat = doc.add_op(page, standard::BITMAP_FLAT, 0, 0)?;
//! doc.set_store_name(flat, "base")?;
//! let blur = doc.add_op(page, standard::BITMAP_BLUR, 0, 1)?;
//! doc.link_input(blur, ParaId(1), "base")?;
//!
//! let words = doc.export(blur, standard::BITMAP_RGBA8, Extent::new(256, 256))?;
//! let records = opforge::read_export(&words)?;
//! assert_eq!(records.len(), 2);
//! assert_eq!(records[1].children, vec![0]);
//! # Ok::<(), opforge::OpforgeError>(())
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod compile;
mod foundation;
mod graph;
mod schema;
mod value;

pub use compile::arena::{NodeArena, NodeId};
pub use compile::compiler::{CompileDiagnostic, CompiledForest, CompiledRoot};
pub use compile::export::{EXPORT_MAGIC, EXPORT_VERSION, ExportRecord, read_export};
pub use compile::fingerprint::Fingerprint;
pub use compile::node::{Extent, Node, NodeKind, ParamRange};
pub use foundation::config::{DocumentConfig, LegacyWidthEntry};
pub use foundation::error::{OpError, OpErrorKind, OpforgeError, OpforgeResult};
pub use foundation::ids::{ClassId, OpId, PageId, ParaId, TypeId, VariantId};
pub use foundation::words::{WordReader, WordWriter, string_payload_words, string_words};
pub use graph::document::Document;
pub use graph::op::{CachedOutput, Link, LinkSlot, Op};
pub use graph::page::Page;
pub use graph::persist::{DOC_END, DOC_MAGIC, DOC_VERSION, DOC_VERSION_UNSIZED, LoadReport};
pub use schema::class::{
    ClassBuilder, ClassDesc, ClassFlags, ClassKind, Column, HandlerRef, InputDesc, InputFlags,
};
pub use schema::param::{ParamDesc, ParamFlags, ParamKind};
pub use schema::registry::{Registry, RegistryBuilder};
pub use schema::standard;
pub use schema::types::{TypeDesc, VariantDesc};
pub use value::editor::{EditorControl, ParamEditor};
pub use value::legacy::LegacyWidths;
pub use value::{Components, Value, ValueData, round_to_i32};
