//! Flat export stream of an optimized forest.
//!
//! Layout: `[EXPORT_MAGIC, EXPORT_VERSION, record_count]`, then one record per node in index
//! order: `[opcode, variant, width, height, param_count, params.., child_count, child_index..]`.
//! Children always precede their parents, so a consumer can build nodes in a single sweep.

use crate::compile::arena::{NodeArena, NodeId};
use crate::compile::node::Extent;
use crate::foundation::error::{OpforgeError, OpforgeResult};
use crate::foundation::ids::VariantId;
use crate::foundation::words::{WordReader, WordWriter};
use crate::schema::class::HandlerRef;

/// `"OFXP"` little-endian.
pub const EXPORT_MAGIC: u32 = u32::from_le_bytes(*b"OFXP");
/// Export layout version.
pub const EXPORT_VERSION: u32 = 1;

/// Decoded export record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportRecord {
    /// Handler code; [`HandlerRef::NONE`] for placeholders.
    pub opcode: HandlerRef,
    /// Output variant.
    pub variant: VariantId,
    /// Requested extent.
    pub extent: Extent,
    /// Compiled parameter block.
    pub params: Vec<u32>,
    /// Indices of earlier records.
    pub children: Vec<u32>,
}

pub(crate) fn write_records(
    arena: &NodeArena,
    order: &[NodeId],
    out: &mut WordWriter,
) -> OpforgeResult<()> {
    out.write_u32(EXPORT_MAGIC);
    out.write_u32(EXPORT_VERSION);
    out.write_u32(order.len() as u32);
    for &id in order {
        let node = arena.get(id)?;
        out.write_u32(node.handler.0);
        out.write_u32(node.variant.0);
        out.write_u32(node.extent.width);
        out.write_u32(node.extent.height);
        let params = arena.words(node.params);
        out.write_u32(params.len() as u32);
        out.write_words(params);
        out.write_u32(node.children.len() as u32);
        for &c in &node.children {
            let index = arena
                .get(c)?
                .index
                .ok_or_else(|| OpforgeError::validation("child node was never indexed"))?;
            out.write_u32(index);
        }
    }
    Ok(())
}

/// Decode an export stream, checking that every child index refers to an earlier record.
pub fn read_export(words: &[u32]) -> OpforgeResult<Vec<ExportRecord>> {
    let mut r = WordReader::new(words);
    r.expect_u32(EXPORT_MAGIC, "export magic")?;
    r.expect_u32(EXPORT_VERSION, "export version")?;
    let count = r.read_u32()? as usize;
    let mut records = Vec::with_capacity(count.min(r.remaining()));
    for i in 0..count {
        let opcode = HandlerRef(r.read_u32()?);
        let variant = VariantId(r.read_u32()?);
        let extent = Extent::new(r.read_u32()?, r.read_u32()?);
        let n = r.read_u32()? as usize;
        let params = r.take(n)?.to_vec();
        let n = r.read_u32()? as usize;
        let at = r.position();
        let children = r.take(n)?.to_vec();
        if let Some(bad) = children.iter().find(|&&c| c as usize >= i) {
            return Err(OpforgeError::corrupt(
                at,
                format!("record {i} refers to record {bad}, which does not precede it"),
            ));
        }
        records.push(ExportRecord {
            opcode,
            variant,
            extent,
            params,
            children,
        });
    }
    if !r.is_at_end() {
        return Err(OpforgeError::corrupt(r.position(), "trailing words after last record"));
    }
    Ok(records)
}

#[cfg(test)]
#[path = "../../tests/unit/compile/export.rs"]
mod tests;
