//! Persisted form of the editable graph.
//!
//! Stream: `[DOC_MAGIC, DOC_VERSION, page_count]`, then per page `[name, op_count, op..]`, then
//! `DOC_END`. Each op record is `[record_len]` followed by
//! `[class_id, class_version, pos_x, pos_y, width, height, flag_bits, store_name,
//! link_count, (input_id, name)*, value_count, (para_id, word_count, value)*]`.
//! Strings are a byte length followed by little-endian packed UTF-8.
//!
//! Version 1 streams store values as `(para_id, value)*` with no word count. They are still
//! read; a value whose parameter is gone is then skipped through the legacy width table.

use smallvec::SmallVec;

use crate::foundation::error::{OpErrorKind, OpforgeError, OpforgeResult};
use crate::foundation::ids::{ClassId, OpId, PageId, ParaId};
use crate::foundation::words::{WordReader, WordWriter};
use crate::graph::document::Document;
use crate::graph::op::{Link, LinkSlot, Op, OrphanPayload};
use crate::graph::page::Page;
use crate::schema::param::ParamDesc;
use crate::value::Value;

/// `"OFDC"` little-endian.
pub const DOC_MAGIC: u32 = u32::from_le_bytes(*b"OFDC");
/// Document layout version written by [`Document::write`].
pub const DOC_VERSION: u32 = 2;
/// Oldest accepted layout. Its values carry no word count.
pub const DOC_VERSION_UNSIZED: u32 = 1;
/// `"OFEN"` little-endian; closes the stream.
pub const DOC_END: u32 = u32::from_le_bytes(*b"OFEN");

const FLAG_SELECTED: u32 = 0x0001;
const FLAG_BYPASS: u32 = 0x0002;
const FLAG_HIDE: u32 = 0x0004;
// orphan kept from a version 1 stream; its raw value section has no word counts
const FLAG_UNSIZED_VALUES: u32 = 0x0008;

/// What [`Document::read`] had to recover from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Ops loaded, orphans included.
    pub ops_loaded: usize,
    /// Ops whose class is unknown; kept verbatim and flagged.
    pub orphan_ops: usize,
    /// Stored values dropped because their parameter no longer exists.
    pub discarded_values: usize,
    /// Stored input links dropped because their input no longer exists.
    pub discarded_links: usize,
    /// Parameters missing from the stream that were set to their default.
    pub defaulted_values: usize,
}

impl LoadReport {
    /// `true` if the stream matched the registry exactly.
    pub fn is_clean(&self) -> bool {
        self.orphan_ops == 0
            && self.discarded_values == 0
            && self.discarded_links == 0
            && self.defaulted_values == 0
    }
}

/// Decode `payload` as one value of `desc`. `None` unless the decode uses every word.
fn decode_exact(desc: &ParamDesc, payload: &[u32]) -> Option<Value> {
    let mut r = WordReader::new(payload);
    match Value::deserialize(desc, &mut r) {
        Ok(v) if r.is_at_end() => Some(v),
        _ => None,
    }
}

fn rebase(err: OpforgeError, base: usize) -> OpforgeError {
    match err {
        OpforgeError::CorruptStream { offset, reason } => OpforgeError::CorruptStream {
            offset: offset + base,
            reason,
        },
        other => other,
    }
}

impl Document {
    /// Serialize every page and op.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn write(&self) -> Vec<u32> {
        let mut w = WordWriter::new();
        w.write_u32(DOC_MAGIC);
        w.write_u32(DOC_VERSION);
        w.write_u32(self.pages.len() as u32);
        for page in &self.pages {
            w.write_string(&page.name);
            let ops: Vec<&Op> = page.ops.iter().filter_map(|id| self.op(*id)).collect();
            w.write_u32(ops.len() as u32);
            for op in ops {
                self.write_op(op, &mut w);
            }
        }
        w.write_u32(DOC_END);
        tracing::debug!(words = w.len(), "document written");
        w.into_words()
    }

    fn write_op(&self, op: &Op, w: &mut WordWriter) {
        let len_at = w.reserve();
        let start = w.len();

        let version = match &op.orphan {
            Some(o) => o.version,
            None => self.registry.find_class(op.class).map_or(0, |c| c.version),
        };
        let mut flags = 0;
        if op.selected {
            flags |= FLAG_SELECTED;
        }
        if op.bypass {
            flags |= FLAG_BYPASS;
        }
        if op.hide {
            flags |= FLAG_HIDE;
        }
        if op.orphan.as_ref().is_some_and(|o| !o.sized) {
            flags |= FLAG_UNSIZED_VALUES;
        }

        w.write_u32(op.class.0);
        w.write_u32(version);
        w.write_i32(op.pos_x);
        w.write_i32(op.pos_y);
        w.write_i32(op.width);
        w.write_i32(op.height);
        w.write_u32(flags);
        w.write_string(&op.store_name);

        let inputs: SmallVec<[(ParaId, &str); 4]> = op
            .links
            .iter()
            .filter_map(|l| match l.slot {
                LinkSlot::Input(p) => Some((p, l.name.as_str())),
                LinkSlot::Param(_) => None,
            })
            .collect();
        w.write_u32(inputs.len() as u32);
        for (p, name) in inputs {
            w.write_u32(p.0);
            w.write_string(name);
        }

        match &op.orphan {
            Some(o) => w.write_words(&o.raw),
            None => {
                w.write_u32(op.values.len() as u32);
                for v in &op.values {
                    w.write_u32(v.para.0);
                    let len_at = w.reserve();
                    let start = w.len();
                    v.serialize(w);
                    w.patch(len_at, (w.len() - start) as u32);
                }
            }
        }
        w.patch(len_at, (w.len() - start) as u32);
    }

    /// Replace the document content with a persisted stream, then connect.
    ///
    /// All-or-nothing: on error the document is left exactly as it was. Unknown classes and
    /// parameters are recovered from and counted in the returned report.
    #[tracing::instrument(level = "debug", skip(self, words), fields(words = words.len()))]
    pub fn read(&mut self, words: &[u32]) -> OpforgeResult<LoadReport> {
        let mut r = WordReader::new(words);
        let mut report = LoadReport::default();
        r.expect_u32(DOC_MAGIC, "document magic")?;
        let version_at = r.position();
        let version = r.read_u32()?;
        if !(DOC_VERSION_UNSIZED..=DOC_VERSION).contains(&version) {
            return Err(OpforgeError::corrupt(
                version_at,
                format!("unsupported document version {version}"),
            ));
        }
        let sized = version >= 2;
        let page_count = r.read_u32()?;

        let mut pages = Vec::new();
        let mut ops = Vec::new();
        for p in 0..page_count {
            let mut page = Page::new(&r.read_string()?);
            let op_count = r.read_u32()?;
            for _ in 0..op_count {
                let len = r.read_u32()? as usize;
                let base = r.position();
                let body = r.take(len)?;
                let op = self
                    .read_op(body, PageId(p), sized, &mut report)
                    .map_err(|e| rebase(e, base))?;
                page.ops.push(OpId(ops.len() as u32));
                ops.push(Some(op));
            }
            pages.push(page);
        }
        r.expect_u32(DOC_END, "document end marker")?;
        if !r.is_at_end() {
            return Err(OpforgeError::corrupt(
                r.position(),
                "trailing words after document end",
            ));
        }

        self.pages = pages;
        self.ops = ops;
        self.arena.reset();
        self.connect();

        if report.is_clean() {
            tracing::debug!(ops = report.ops_loaded, "document loaded");
        } else {
            tracing::warn!(?report, "document loaded with schema recovery");
        }
        Ok(report)
    }

    fn read_op(
        &self,
        body: &[u32],
        page: PageId,
        sized: bool,
        report: &mut LoadReport,
    ) -> OpforgeResult<Op> {
        let mut r = WordReader::new(body);
        let class_id = ClassId(r.read_u32()?);
        let version = r.read_u32()?;
        let mut op = Op::blank(class_id, page);
        op.pos_x = r.read_i32()?;
        op.pos_y = r.read_i32()?;
        op.width = r.read_i32()?;
        op.height = r.read_i32()?;
        let flags = r.read_u32()?;
        op.selected = flags & FLAG_SELECTED != 0;
        op.bypass = flags & FLAG_BYPASS != 0;
        op.hide = flags & FLAG_HIDE != 0;
        let sized = sized && flags & FLAG_UNSIZED_VALUES == 0;
        op.store_name = r.read_string()?;

        let link_count = r.read_u32()?;
        let mut links: SmallVec<[Link; 2]> = SmallVec::new();
        for _ in 0..link_count {
            let input = ParaId(r.read_u32()?);
            links.push(Link::input(input, &r.read_string()?));
        }
        report.ops_loaded += 1;

        let Some(class) = self.registry.find_class(class_id) else {
            tracing::warn!(
                class = class_id.0,
                store = %op.store_name,
                "unknown class, keeping op as orphan"
            );
            op.links = links;
            op.orphan = Some(OrphanPayload {
                version,
                sized,
                raw: r.take(r.remaining())?.to_vec(),
            });
            op.flag(
                OpErrorKind::SchemaMismatch,
                format!("class {class_id} is not registered"),
            );
            report.orphan_ops += 1;
            return Ok(op);
        };
        if version != class.version {
            tracing::debug!(
                class = %class.name,
                stored = version,
                current = class.version,
                "class version differs, matching values by id"
            );
        }

        let mut lossy = false;
        for link in links {
            match link.slot {
                LinkSlot::Input(p) if class.input(p).is_some() => op.links.push(link),
                _ => {
                    report.discarded_links += 1;
                    lossy = true;
                }
            }
        }

        let value_count = r.read_u32()? as usize;
        let mut values: Vec<Value> = Vec::with_capacity(value_count.min(r.remaining()));
        let mut truncated = false;
        for i in 0..value_count {
            let para = ParaId(r.read_u32()?);
            if sized {
                let len = r.read_u32()? as usize;
                let payload = r.take(len)?;
                let decoded = class.param(para).and_then(|desc| decode_exact(desc, payload));
                match decoded {
                    Some(v) if !values.iter().any(|x| x.para == para) => values.push(v),
                    _ => {
                        tracing::warn!(
                            class = %class.name,
                            para = para.0,
                            words = len,
                            "stored value does not match its parameter, discarding"
                        );
                        report.discarded_values += 1;
                        lossy = true;
                    }
                }
                continue;
            }
            if let Some(desc) = class.param(para) {
                let v = Value::deserialize(desc, &mut r)?;
                if values.iter().any(|x| x.para == para) {
                    report.discarded_values += 1;
                    lossy = true;
                } else {
                    values.push(v);
                }
                continue;
            }
            lossy = true;
            match self.legacy.width(class_id, para) {
                Some(n) => {
                    r.skip(n)?;
                    report.discarded_values += 1;
                }
                None => {
                    let rest = value_count - i;
                    tracing::warn!(
                        class = %class.name,
                        para = para.0,
                        dropped = rest,
                        "unknown parameter without legacy width, dropping remaining values"
                    );
                    report.discarded_values += rest;
                    truncated = true;
                    break;
                }
            }
        }
        if !truncated && !r.is_at_end() {
            return Err(OpforgeError::corrupt(
                r.position(),
                "op record longer than its contents",
            ));
        }

        for desc in class.value_params() {
            match values.iter().position(|v| v.para == desc.id) {
                Some(i) => op.values.push(values.swap_remove(i)),
                None => {
                    if let Some(v) = Value::default_from(desc) {
                        op.values.push(v);
                        report.defaulted_values += 1;
                    }
                }
            }
        }
        if lossy {
            op.flag(
                OpErrorKind::SchemaMismatch,
                "stored data did not match the class and was partly discarded",
            );
        }
        Ok(op)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/persist.rs"]
mod tests;
