use crate::foundation::ids::TypeId;
use crate::schema::param::ParamFlags;

/// Description of one edit control, handed to the host UI.
#[derive(Clone, Debug, PartialEq)]
pub enum EditorControl<'a> {
    /// Caption row.
    Label {
        /// Caption text.
        name: &'a str,
    },
    /// Cycle or dropdown over named options.
    Choice {
        /// Parameter name.
        name: &'a str,
        /// Option names.
        options: Vec<&'a str>,
        /// Selected option.
        selected: i32,
    },
    /// One toggle per named option.
    Flags {
        /// Parameter name.
        name: &'a str,
        /// Option names.
        options: Vec<&'a str>,
        /// Current bits.
        bits: u32,
    },
    /// Integer spin boxes.
    IntVector {
        /// Parameter name.
        name: &'a str,
        /// Current components.
        values: &'a [i32],
        /// Per-component minimum.
        min: &'a [f32],
        /// Per-component maximum.
        max: &'a [f32],
        /// Drag step.
        step: f32,
    },
    /// Float spin boxes.
    FloatVector {
        /// Parameter name.
        name: &'a str,
        /// Current components.
        values: &'a [f32],
        /// Per-component minimum.
        min: &'a [f32],
        /// Per-component maximum.
        max: &'a [f32],
        /// Drag step.
        step: f32,
    },
    /// Contrast curve editor.
    Contrast {
        /// Parameter name.
        name: &'a str,
        /// Current components.
        values: &'a [f32],
    },
    /// Color picker.
    Color {
        /// Parameter name.
        name: &'a str,
        /// Current color, `0xAARRGGBB`.
        argb: u32,
    },
    /// Single or multi-line text field.
    Text {
        /// Parameter name.
        name: &'a str,
        /// Current text.
        text: &'a str,
        /// Multi-line editor.
        multiline: bool,
        /// Byte limit, 0 for none.
        max_len: usize,
    },
    /// File chooser.
    Filename {
        /// Parameter name.
        name: &'a str,
        /// Current path.
        path: &'a str,
    },
    /// Op picker restricted to one output type.
    Link {
        /// Parameter name.
        name: &'a str,
        /// Current store name.
        target: &'a str,
        /// Required output type.
        ty: Option<TypeId>,
    },
}

/// Host-side sink for edit controls. The core never renders anything itself.
pub trait ParamEditor {
    /// Called once per visible parameter, in display order.
    fn add_control(&mut self, flags: ParamFlags, control: EditorControl<'_>);
}
