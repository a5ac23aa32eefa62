use crate::foundation::error::{OpforgeError, OpforgeResult};
use crate::foundation::ids::{ParaId, TypeId};

/// Closed set of parameter kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ParamKind {
    /// Editor-only caption, carries no value.
    Label,
    /// One of several named options.
    Choice,
    /// Bit set over named options.
    Flags,
    /// Integer vector.
    Int,
    /// Float vector.
    Float,
    /// Packed `0xAARRGGBB` color.
    Color,
    /// Short string.
    String,
    /// Name of another op (store name).
    Link,
    /// Contrast/brightness pair.
    Contrast,
    /// File path.
    Filename,
    /// Multi-line text.
    Text,
}

impl ParamKind {
    /// Kinds whose components are range checked and affine transformed.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Float | Self::Contrast)
    }

    /// Kinds stored as length-prefixed strings.
    pub fn is_string_like(self) -> bool {
        matches!(
            self,
            Self::String | Self::Link | Self::Filename | Self::Text
        )
    }
}

/// Parameter flag bits (layout hints plus `LINK_REQUIRED`).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ParamFlags(pub u32);

impl ParamFlags {
    /// No flags.
    pub const NONE: Self = Self(0);
    /// Control one slot wider.
    pub const WIDER1: Self = Self(0x0001);
    /// Control two slots wider.
    pub const WIDER2: Self = Self(0x0002);
    /// Control three slots wider.
    pub const WIDER3: Self = Self(0x0003);
    /// Control spans the full row.
    pub const FULL_WIDTH: Self = Self(0x0004);
    /// Start a new row and print the label.
    pub const LABEL: Self = Self(0x0008);
    /// Link parameter must resolve for the op to compile.
    pub const LINK_REQUIRED: Self = Self(0x0010);
    /// Hidden legacy or internal parameter.
    pub const INVISIBLE: Self = Self(0x0020);
    /// Layout used when nothing else is requested.
    pub const DEFAULT: Self = Self(0x0004 | 0x0008);

    /// `true` if every bit of `other` is set.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Extra width in slots (0-3).
    pub fn extra_width(self) -> u32 {
        self.0 & 0x0003
    }
}

impl std::ops::BitOr for ParamFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Schema of one editable value on a class.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ParamDesc {
    /// Stable id within the class.
    pub id: ParaId,
    /// User-facing name.
    pub name: String,
    /// Value kind.
    pub kind: ParamKind,
    /// Layout and behavior flags.
    pub flags: ParamFlags,
    /// Vector width (1-4).
    pub width: u8,
    /// Output type a link must point at.
    pub link_type: Option<TypeId>,
    /// `|`-separated option names for choice and flags parameters.
    pub choices: Option<String>,
    /// Per-component minimum.
    pub min: [f32; 4],
    /// Per-component maximum.
    pub max: [f32; 4],
    /// Per-component default.
    pub default: [f32; 4],
    /// Editor drag step.
    pub step: f32,
    /// Runtime value is `edit * scale + offset`.
    pub offset: f32,
    /// See [`ParamDesc::offset`].
    pub scale: f32,
    /// Default color for color parameters.
    pub default_color: u32,
    /// Default text for string-like parameters.
    pub default_text: String,
    /// Maximum byte length for string parameters (0 = unbounded).
    pub max_len: usize,
}

impl ParamDesc {
    fn base(id: ParaId, name: &str, kind: ParamKind) -> Self {
        Self {
            id,
            name: name.to_owned(),
            kind,
            flags: ParamFlags::DEFAULT,
            width: 1,
            link_type: None,
            choices: None,
            min: [0.0; 4],
            max: [0.0; 4],
            default: [0.0; 4],
            step: 0.0,
            offset: 0.0,
            scale: 1.0,
            default_color: 0,
            default_text: String::new(),
            max_len: 0,
        }
    }

    /// Editor caption. Labels share id 0 and never produce a value.
    pub fn label(name: &str) -> Self {
        Self {
            flags: ParamFlags::LABEL,
            ..Self::base(ParaId(0), name, ParamKind::Label)
        }
    }

    /// Choice among `|`-separated `choices`, defaulting to option `default`.
    pub fn choice(id: u32, name: &str, choices: &str, default: u32) -> OpforgeResult<Self> {
        let d = Self {
            choices: Some(choices.to_owned()),
            default: [default as f32, 0.0, 0.0, 0.0],
            ..Self::base(ParaId(id), name, ParamKind::Choice)
        };
        d.validate()?;
        Ok(d)
    }

    /// Bit set over `|`-separated `choices`.
    pub fn flags(id: u32, name: &str, choices: &str, default: u32) -> OpforgeResult<Self> {
        let d = Self {
            choices: Some(choices.to_owned()),
            default: [default as f32, 0.0, 0.0, 0.0],
            ..Self::base(ParaId(id), name, ParamKind::Flags)
        };
        d.validate()?;
        Ok(d)
    }

    /// Integer vector of `width` components sharing one range and default.
    pub fn int(
        id: u32,
        name: &str,
        width: u8,
        min: i32,
        max: i32,
        default: i32,
        step: f32,
    ) -> OpforgeResult<Self> {
        let d = Self {
            width,
            min: [min as f32; 4],
            max: [max as f32; 4],
            default: [default as f32; 4],
            step,
            ..Self::base(ParaId(id), name, ParamKind::Int)
        };
        d.validate()?;
        Ok(d)
    }

    /// Float vector of `width` components sharing one range and default.
    pub fn float(
        id: u32,
        name: &str,
        width: u8,
        min: f32,
        max: f32,
        default: f32,
        step: f32,
    ) -> OpforgeResult<Self> {
        let d = Self {
            width,
            min: [min; 4],
            max: [max; 4],
            default: [default; 4],
            step,
            ..Self::base(ParaId(id), name, ParamKind::Float)
        };
        d.validate()?;
        Ok(d)
    }

    /// Packed `0xAARRGGBB` color.
    pub fn color(id: u32, name: &str, default: u32) -> Self {
        Self {
            default_color: default,
            ..Self::base(ParaId(id), name, ParamKind::Color)
        }
    }

    /// String limited to `max_len` bytes.
    pub fn string(id: u32, name: &str, max_len: usize, default: &str) -> OpforgeResult<Self> {
        let d = Self {
            max_len,
            default_text: default.to_owned(),
            ..Self::base(ParaId(id), name, ParamKind::String)
        };
        d.validate()?;
        Ok(d)
    }

    /// Unbounded multi-line text.
    pub fn text(id: u32, name: &str, default: &str) -> Self {
        Self {
            default_text: default.to_owned(),
            ..Self::base(ParaId(id), name, ParamKind::Text)
        }
    }

    /// File path.
    pub fn filename(id: u32, name: &str, default: &str) -> Self {
        Self {
            default_text: default.to_owned(),
            ..Self::base(ParaId(id), name, ParamKind::Filename)
        }
    }

    /// Named reference to an op producing `ty`.
    pub fn link(id: u32, name: &str, ty: TypeId) -> OpforgeResult<Self> {
        let d = Self {
            link_type: Some(ty),
            ..Self::base(ParaId(id), name, ParamKind::Link)
        };
        d.validate()?;
        Ok(d)
    }

    /// Contrast/brightness pair in `[0, 1]`, both defaulting to `0.5`.
    pub fn contrast(id: u32, name: &str) -> OpforgeResult<Self> {
        let d = Self {
            width: 2,
            min: [0.0; 4],
            max: [1.0; 4],
            default: [0.5, 0.5, 0.0, 0.0],
            step: 0.01,
            ..Self::base(ParaId(id), name, ParamKind::Contrast)
        };
        d.validate()?;
        Ok(d)
    }

    /// Replace the flags.
    pub fn with_flags(self, flags: ParamFlags) -> Self {
        Self { flags, ..self }
    }

    /// Set the edit-to-runtime transform.
    pub fn with_transform(self, offset: f32, scale: f32) -> Self {
        Self {
            offset,
            scale,
            ..self
        }
    }

    /// Replace per-component defaults.
    pub fn with_defaults(self, default: [f32; 4]) -> OpforgeResult<Self> {
        let d = Self { default, ..self };
        d.validate()?;
        Ok(d)
    }

    /// Replace per-component ranges.
    pub fn with_ranges(self, min: [f32; 4], max: [f32; 4]) -> OpforgeResult<Self> {
        let d = Self { min, max, ..self };
        d.validate()?;
        Ok(d)
    }

    /// Option names of a choice or flags parameter.
    pub fn choice_names(&self) -> impl Iterator<Item = &str> {
        self.choices.as_deref().unwrap_or("").split('|')
    }

    fn choice_count(&self) -> usize {
        self.choice_names().count()
    }

    /// Check the structural invariants of this descriptor.
    pub fn validate(&self) -> OpforgeResult<()> {
        let fail = |msg: String| Err(OpforgeError::validation(format!("param '{}': {msg}", self.name)));

        if !(1..=4).contains(&self.width) {
            return fail(format!("width {} outside 1..=4", self.width));
        }
        if self.kind.is_string_like() && self.width != 1 {
            return fail(format!("string-like parameters have width 1, got {}", self.width));
        }
        if self.kind.is_numeric() {
            if !(self.step > 0.0) {
                return fail(format!("step must be > 0, got {}", self.step));
            }
            for i in 0..usize::from(self.width) {
                let (lo, hi, d) = (self.min[i], self.max[i], self.default[i]);
                if !(lo <= d && d <= hi) {
                    return fail(format!(
                        "component {i}: expected min <= default <= max, got {lo} <= {d} <= {hi}"
                    ));
                }
            }
        }
        match self.kind {
            ParamKind::Link => match self.link_type {
                Some(TypeId(0)) | None => return fail("link must reference a type".to_owned()),
                Some(_) => {}
            },
            ParamKind::Choice => {
                if self.default[0] as usize >= self.choice_count() {
                    return fail(format!("default option {} out of range", self.default[0]));
                }
            }
            ParamKind::Flags => {
                let n = self.choice_count().min(31);
                if (self.default[0] as u32) >> n != 0 {
                    return fail(format!("default bits {} exceed {n} flags", self.default[0]));
                }
            }
            ParamKind::String => {
                if self.max_len > 0 && self.default_text.len() > self.max_len {
                    return fail(format!("default longer than {} bytes", self.max_len));
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schema/param.rs"]
mod tests;
