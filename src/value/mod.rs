//! Live parameter values.
//!
//! One [`Value`] per non-label parameter of an op. Values refer to their descriptor by
//! [`ParaId`] only; the descriptor is looked up in the op's class when needed and may be missing
//! after a schema change.

pub(crate) mod editor;
pub(crate) mod legacy;

use smallvec::SmallVec;

use crate::foundation::error::{OpforgeError, OpforgeResult};
use crate::foundation::ids::ParaId;
use crate::foundation::words::{WordReader, WordWriter, push_string, string_words};
use crate::schema::param::{ParamDesc, ParamKind};
use crate::value::editor::{EditorControl, ParamEditor};

/// Component storage for vector values; never longer than 4.
pub type Components<T> = SmallVec<[T; 4]>;

/// Variant-specific value data.
#[derive(Clone, Debug, PartialEq)]
pub enum ValueData {
    /// Choice index or flag bits.
    Int(i32),
    /// Integer vector.
    IntV(Components<i32>),
    /// Float vector.
    FloatV(Components<f32>),
    /// Packed `0xAARRGGBB`.
    Color(u32),
    /// Short string.
    String(String),
    /// Multi-line text.
    Text(String),
    /// File path.
    Filename(String),
    /// Store name of the linked op.
    Link(String),
    /// Contrast/brightness components.
    Contrast(Components<f32>),
}

impl ValueData {
    /// `true` if this data can back a parameter of `desc`.
    pub fn fits(&self, desc: &ParamDesc) -> bool {
        let w = usize::from(desc.width);
        match (self, desc.kind) {
            (Self::Int(_), ParamKind::Choice | ParamKind::Flags) => true,
            (Self::IntV(v), ParamKind::Int) => v.len() == w,
            (Self::FloatV(v), ParamKind::Float) | (Self::Contrast(v), ParamKind::Contrast) => {
                v.len() == w
            }
            (Self::Color(_), ParamKind::Color) => true,
            (Self::String(s), ParamKind::String) => desc.max_len == 0 || s.len() <= desc.max_len,
            (Self::Text(_), ParamKind::Text)
            | (Self::Filename(_), ParamKind::Filename)
            | (Self::Link(_), ParamKind::Link) => true,
            _ => false,
        }
    }
}

/// One parameter instance on one op.
#[derive(Clone, Debug, PartialEq)]
pub struct Value {
    /// Parameter id in the op's class.
    pub para: ParaId,
    /// Current edit value.
    pub data: ValueData,
}

/// Round an affine-transformed value into an integer slot.
///
/// Rounds half away from zero and saturates at the `i32` range; NaN becomes 0.
pub fn round_to_i32(x: f64) -> i32 {
    if x.is_nan() { 0 } else { x.round() as i32 }
}

fn components<T: Copy>(src: &[T; 4], width: u8) -> Components<T> {
    src[..usize::from(width)].iter().copied().collect()
}

impl Value {
    /// Fresh value initialized from the descriptor default. Labels have no value.
    pub fn default_from(desc: &ParamDesc) -> Option<Self> {
        let data = match desc.kind {
            ParamKind::Label => return None,
            ParamKind::Choice | ParamKind::Flags => ValueData::Int(round_to_i32(desc.default[0].into())),
            ParamKind::Int => {
                let ints = desc.default.map(|d| round_to_i32(d.into()));
                ValueData::IntV(components(&ints, desc.width))
            }
            ParamKind::Float => ValueData::FloatV(components(&desc.default, desc.width)),
            ParamKind::Contrast => ValueData::Contrast(components(&desc.default, desc.width)),
            ParamKind::Color => ValueData::Color(desc.default_color),
            ParamKind::String => ValueData::String(desc.default_text.clone()),
            ParamKind::Text => ValueData::Text(desc.default_text.clone()),
            ParamKind::Filename => ValueData::Filename(desc.default_text.clone()),
            ParamKind::Link => ValueData::Link(desc.default_text.clone()),
        };
        Some(Self {
            para: desc.id,
            data,
        })
    }

    /// Read a value laid out as described by `desc`, advancing the cursor.
    pub fn deserialize(desc: &ParamDesc, r: &mut WordReader<'_>) -> OpforgeResult<Self> {
        let w = usize::from(desc.width);
        let data = match desc.kind {
            ParamKind::Label => {
                return Err(OpforgeError::corrupt(
                    r.position(),
                    format!("label '{}' has no stored value", desc.name),
                ));
            }
            ParamKind::Choice | ParamKind::Flags => ValueData::Int(r.read_i32()?),
            ParamKind::Int => ValueData::IntV(
                (0..w).map(|_| r.read_i32()).collect::<OpforgeResult<_>>()?,
            ),
            ParamKind::Float => ValueData::FloatV(
                (0..w).map(|_| r.read_f32()).collect::<OpforgeResult<_>>()?,
            ),
            ParamKind::Contrast => ValueData::Contrast(
                (0..w).map(|_| r.read_f32()).collect::<OpforgeResult<_>>()?,
            ),
            ParamKind::Color => ValueData::Color(r.read_u32()?),
            ParamKind::String => ValueData::String(r.read_string()?),
            ParamKind::Text => ValueData::Text(r.read_string()?),
            ParamKind::Filename => ValueData::Filename(r.read_string()?),
            ParamKind::Link => ValueData::Link(r.read_string()?),
        };
        Ok(Self {
            para: desc.id,
            data,
        })
    }

    /// Write the persisted form. Exact inverse of [`Value::deserialize`].
    pub fn serialize(&self, w: &mut WordWriter) {
        match &self.data {
            ValueData::Int(v) => w.write_i32(*v),
            ValueData::IntV(vs) => vs.iter().for_each(|v| w.write_i32(*v)),
            ValueData::FloatV(vs) | ValueData::Contrast(vs) => {
                vs.iter().for_each(|v| w.write_f32(*v))
            }
            ValueData::Color(c) => w.write_u32(*c),
            ValueData::String(s)
            | ValueData::Text(s)
            | ValueData::Filename(s)
            | ValueData::Link(s) => w.write_string(s),
        }
    }

    /// Words this value occupies in a compiled parameter block.
    pub fn compiled_word_count(&self) -> usize {
        match &self.data {
            ValueData::Link(_) => 0,
            ValueData::Int(_) | ValueData::Color(_) => 1,
            ValueData::IntV(vs) => vs.len(),
            ValueData::FloatV(vs) | ValueData::Contrast(vs) => vs.len(),
            ValueData::String(s) | ValueData::Text(s) | ValueData::Filename(s) => string_words(s),
        }
    }

    /// Append the runtime form to a compiled parameter block.
    ///
    /// Numeric vectors go through `edit * scale + offset`; integer results follow
    /// [`round_to_i32`]. Choice and flag values are stored untransformed.
    pub fn store_into(&self, desc: &ParamDesc, dest: &mut Vec<u32>) {
        let (offset, scale) = (desc.offset, desc.scale);
        match &self.data {
            ValueData::Int(v) => dest.push(*v as u32),
            ValueData::IntV(vs) => dest.extend(vs.iter().map(|&v| {
                round_to_i32(f64::from(v) * f64::from(scale) + f64::from(offset)) as u32
            })),
            ValueData::FloatV(vs) | ValueData::Contrast(vs) => {
                dest.extend(vs.iter().map(|&v| (v * scale + offset).to_bits()))
            }
            ValueData::Color(c) => dest.push(*c),
            ValueData::String(s) | ValueData::Text(s) | ValueData::Filename(s) => {
                push_string(dest, s)
            }
            ValueData::Link(_) => {}
        }
    }

    /// Describe the edit control for this value to an external editor.
    pub fn populate_editor(&self, desc: &ParamDesc, editor: &mut dyn ParamEditor) {
        let name = desc.name.as_str();
        let w = usize::from(desc.width);
        let control = match &self.data {
            ValueData::Int(v) if desc.kind == ParamKind::Flags => EditorControl::Flags {
                name,
                options: desc.choice_names().collect(),
                bits: *v as u32,
            },
            ValueData::Int(v) => EditorControl::Choice {
                name,
                options: desc.choice_names().collect(),
                selected: *v,
            },
            ValueData::IntV(vs) => EditorControl::IntVector {
                name,
                values: vs,
                min: &desc.min[..w],
                max: &desc.max[..w],
                step: desc.step,
            },
            ValueData::FloatV(vs) => EditorControl::FloatVector {
                name,
                values: vs,
                min: &desc.min[..w],
                max: &desc.max[..w],
                step: desc.step,
            },
            ValueData::Contrast(vs) => EditorControl::Contrast { name, values: vs },
            ValueData::Color(c) => EditorControl::Color { name, argb: *c },
            ValueData::String(s) => EditorControl::Text {
                name,
                text: s,
                multiline: false,
                max_len: desc.max_len,
            },
            ValueData::Text(s) => EditorControl::Text {
                name,
                text: s,
                multiline: true,
                max_len: 0,
            },
            ValueData::Filename(s) => EditorControl::Filename { name, path: s },
            ValueData::Link(s) => EditorControl::Link {
                name,
                target: s,
                ty: desc.link_type,
            },
        };
        editor.add_control(desc.flags, control);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/value/value.rs"]
mod tests;
