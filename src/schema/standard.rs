//! Stock vocabulary with the stable ids existing documents were saved with.
//!
//! Ids must never be renumbered; new classes take fresh ids.

use crate::foundation::error::OpforgeResult;
use crate::foundation::ids::{ClassId, TypeId, VariantId};
use crate::schema::class::{
    ClassBuilder, ClassDesc, ClassFlags, Column, HandlerRef, InputDesc, InputFlags,
};
use crate::schema::param::{ParamDesc, ParamFlags};
use crate::schema::registry::Registry;
use crate::schema::types::TypeDesc;

/// Bitmap type.
pub const BITMAP: TypeId = TypeId(1);
/// Mesh type.
pub const MESH: TypeId = TypeId(2);
/// Miscellaneous type (comments).
pub const MISC: TypeId = TypeId(3);

/// 8-bit RGBA bitmaps.
pub const BITMAP_RGBA8: VariantId = VariantId(1);
/// 16-bit RGBA bitmaps.
pub const BITMAP_RGBA16: VariantId = VariantId(2);
/// Mobile mesh format.
pub const MESH_MOBILE: VariantId = VariantId(1);
/// Only variant of [`MISC`].
pub const MISC_ANY: VariantId = VariantId(1);

/// Comment op.
pub const MISC_COMMENT: ClassId = ClassId(0x0003);
/// Solid color bitmap.
pub const BITMAP_FLAT: ClassId = ClassId(0x0101);
/// Color correction.
pub const BITMAP_COLOR: ClassId = ClassId(0x0103);
/// Multi-input blend.
pub const BITMAP_ADD: ClassId = ClassId(0x0104);
/// Glowing rectangle overlay.
pub const BITMAP_GLOWRECT: ClassId = ClassId(0x0105);
/// Rotate and zoom.
pub const BITMAP_ROTATE: ClassId = ClassId(0x0106);
/// Box blur.
pub const BITMAP_BLUR: ClassId = ClassId(0x0107);
/// Bitmap load alias.
pub const BITMAP_LOAD: ClassId = ClassId(0x0108);
/// Bitmap store.
pub const BITMAP_STORE: ClassId = ClassId(0x0109);
/// Bitmap pass-through.
pub const BITMAP_NOP: ClassId = ClassId(0x010a);
/// Perlin noise generator.
pub const BITMAP_PERLIN: ClassId = ClassId(0x0111);
/// Gradient generator.
pub const BITMAP_GRADIENT: ClassId = ClassId(0x0112);
/// Text overlay.
pub const BITMAP_TEXT: ClassId = ClassId(0x011e);
/// Image file import.
pub const BITMAP_IMPORT: ClassId = ClassId(0x0120);
/// Cube generator.
pub const MESH_CUBE: ClassId = ClassId(0x0201);
/// Grid generator.
pub const MESH_GRID: ClassId = ClassId(0x0202);
/// Torus generator.
pub const MESH_TORUS: ClassId = ClassId(0x0204);
/// Mesh load alias.
pub const MESH_LOAD: ClassId = ClassId(0x0208);
/// Mesh store.
pub const MESH_STORE: ClassId = ClassId(0x0209);
/// Mesh pass-through.
pub const MESH_NOP: ClassId = ClassId(0x020a);
/// Material assignment with a bitmap link.
pub const MESH_MATERIAL: ClassId = ClassId(0x0211);
/// Mesh merge.
pub const MESH_ADD: ClassId = ClassId(0x0212);
/// Scale/rotate/translate.
pub const MESH_TRANSFORM: ClassId = ClassId(0x0227);

/// Opcode the downstream engine registers for a (class, variant) pair.
pub fn handler_for(class: ClassId, variant: VariantId) -> HandlerRef {
    HandlerRef((class.0 << 8) | (variant.0 & 0xff))
}

fn generator(id: ClassId, name: &str, ty: TypeId) -> ClassBuilder {
    let b = ClassDesc::builder(id.0, name, ty).column(Column::Generator);
    with_handlers(b, id, ty)
}

fn filter(id: ClassId, name: &str, ty: TypeId) -> ClassBuilder {
    let b = ClassDesc::builder(id.0, name, ty)
        .column(Column::Filter)
        .input(InputDesc::new(1, "In", ty, InputFlags::REQUIRED));
    with_handlers(b, id, ty)
}

fn with_handlers(b: ClassBuilder, id: ClassId, ty: TypeId) -> ClassBuilder {
    match ty {
        BITMAP => b
            .handler(BITMAP_RGBA8.0, handler_for(id, BITMAP_RGBA8))
            .handler(BITMAP_RGBA16.0, handler_for(id, BITMAP_RGBA16)),
        MESH => b.handler(MESH_MOBILE.0, handler_for(id, MESH_MOBILE)),
        _ => b,
    }
}

fn pseudo(id: ClassId, name: &str, ty: TypeId, flags: ClassFlags) -> OpforgeResult<ClassDesc> {
    let b = ClassDesc::builder(id.0, name, ty)
        .column(Column::Special)
        .flags(flags);
    if flags == ClassFlags::LOAD {
        let store = ParamDesc::link(1, "Store", ty)?
            .with_flags(ParamFlags::DEFAULT | ParamFlags::LINK_REQUIRED);
        b.param(store).build()
    } else {
        b.input(InputDesc::new(1, "In", ty, InputFlags::REQUIRED)).build()
    }
}

fn transform_params(b: ClassBuilder, first: u32) -> OpforgeResult<ClassBuilder> {
    Ok(b
        .param(ParamDesc::float(first, "Scale", 3, -1024.0, 1024.0, 1.0, 0.01)?)
        .param(ParamDesc::float(first + 1, "Rotate", 3, -16.0, 16.0, 0.0, 0.001)?)
        .param(ParamDesc::float(first + 2, "Translate", 3, -1024.0, 1024.0, 0.0, 0.01)?))
}

/// Build the stock registry.
pub fn standard_registry() -> OpforgeResult<Registry> {
    let types = [
        TypeDesc::new(BITMAP.0, "Bitmap", 0xff40_80c0)
            .with_variant(BITMAP_RGBA8.0, "RGBA 8 bit")
            .with_variant(BITMAP_RGBA16.0, "RGBA 16 bit"),
        TypeDesc::new(MESH.0, "Mesh", 0xffc0_8040).with_variant(MESH_MOBILE.0, "Mobile mesh"),
        TypeDesc::new(MISC.0, "Misc", 0xff80_8080).with_variant(MISC_ANY.0, "Any"),
    ];

    let classes = vec![
        ClassDesc::builder(MISC_COMMENT.0, "Comment", MISC)
            .column(Column::Special)
            .flags(ClassFlags::COMMENT)
            .param(ParamDesc::text(1, "Text", ""))
            .build()?,
        // bitmaps
        generator(BITMAP_FLAT, "Flat", BITMAP)
            .shortcut('f')
            .param(ParamDesc::color(1, "Color", 0xff00_0000))
            .build()?,
        filter(BITMAP_COLOR, "Color", BITMAP)
            .param(ParamDesc::choice(2, "Mode", "mul|add|sub|gray|invert", 0)?)
            .param(ParamDesc::color(3, "Color", 0xffff_ffff))
            .build()?,
        with_handlers(
            ClassDesc::builder(BITMAP_ADD.0, "Add", BITMAP)
                .column(Column::Combiner)
                .shortcut('a')
                .input(InputDesc::new(
                    1,
                    "In",
                    BITMAP,
                    InputFlags::REQUIRED | InputFlags::MULTIPLE,
                )),
            BITMAP_ADD,
            BITMAP,
        )
        .param(ParamDesc::choice(2, "Mode", "add|sub|mul|diff|alpha", 0)?)
        .build()?,
        filter(BITMAP_GLOWRECT, "GlowRect", BITMAP)
            .param(ParamDesc::float(2, "Center", 2, -4.0, 4.0, 0.5, 0.001)?)
            .param(ParamDesc::float(3, "Radius", 2, 0.0, 4.0, 0.25, 0.001)?)
            .param(ParamDesc::float(4, "Size", 2, 0.0, 4.0, 0.0, 0.001)?)
            .param(ParamDesc::color(5, "Color", 0xffff_ffff))
            .param(ParamDesc::float(6, "Blend", 1, 0.0, 1.0, 1.0, 0.01)?)
            .param(ParamDesc::float(7, "Power", 1, 0.0, 16.0, 0.5, 0.01)?)
            .build()?,
        filter(BITMAP_ROTATE, "Rotate", BITMAP)
            .param(ParamDesc::float(2, "Angle", 1, -16.0, 16.0, 0.0, 0.001)?)
            .param(ParamDesc::float(3, "Zoom", 2, -16.0, 16.0, 1.0, 0.01)?)
            .param(ParamDesc::float(4, "Scroll", 2, -16.0, 16.0, 0.5, 0.001)?)
            .param(ParamDesc::flags(5, "Border", "clamp x|clamp y", 0)?)
            .build()?,
        filter(BITMAP_BLUR, "Blur", BITMAP)
            .shortcut('b')
            .param(ParamDesc::int(2, "Order", 1, 1, 4, 2, 0.1)?)
            .param(ParamDesc::float(3, "Size", 2, 0.0, 1.0, 0.01, 0.001)?)
            // 16.16 fixed point at runtime
            .param(ParamDesc::int(4, "Amplify", 1, 0, 16, 1, 0.1)?.with_transform(0.0, 65536.0))
            .build()?,
        pseudo(BITMAP_LOAD, "Load", BITMAP, ClassFlags::LOAD)?,
        pseudo(BITMAP_STORE, "Store", BITMAP, ClassFlags::STORE)?,
        pseudo(BITMAP_NOP, "Nop", BITMAP, ClassFlags::NOP)?,
        generator(BITMAP_PERLIN, "Perlin", BITMAP)
            .shortcut('p')
            .param(ParamDesc::int(1, "Frequency", 1, 0, 8, 1, 0.25)?)
            .param(ParamDesc::int(2, "Octaves", 1, 0, 8, 2, 0.25)?)
            .param(ParamDesc::float(3, "Persistence", 1, 0.0, 2.0, 0.5, 0.01)?)
            .param(ParamDesc::int(4, "Seed", 1, 0, 255, 0, 0.25)?)
            .param(ParamDesc::color(5, "Color 0", 0xff00_0000))
            .param(ParamDesc::color(6, "Color 1", 0xffff_ffff))
            .param(ParamDesc::contrast(7, "Contrast")?)
            .build()?,
        generator(BITMAP_GRADIENT, "Gradient", BITMAP)
            .param(ParamDesc::color(1, "Color 0", 0xff00_0000))
            .param(ParamDesc::color(2, "Color 1", 0xffff_ffff))
            .param(ParamDesc::float(3, "Position", 2, -4.0, 4.0, 0.0, 0.001)?)
            .param(ParamDesc::float(4, "Angle", 1, -4.0, 4.0, 0.0, 0.001)?)
            .param(ParamDesc::float(5, "Length", 1, -4.0, 4.0, 1.0, 0.001)?)
            .param(ParamDesc::choice(6, "Mode", "linear|gaussian|sine", 0)?)
            .build()?,
        filter(BITMAP_TEXT, "Text", BITMAP)
            .param(ParamDesc::text(2, "Text", "opforge"))
            .param(ParamDesc::float(3, "Position", 2, -4.0, 4.0, 0.5, 0.001)?)
            .param(ParamDesc::float(4, "Height", 1, 0.0, 1.0, 0.125, 0.001)?)
            .param(ParamDesc::color(5, "Color", 0xffff_ffff))
            .param(ParamDesc::string(6, "Font", 32, "Arial")?)
            .build()?,
        generator(BITMAP_IMPORT, "Import", BITMAP)
            .param(ParamDesc::filename(1, "File", ""))
            .build()?,
        // meshes
        transform_params(
            generator(MESH_CUBE, "Cube", MESH)
                .shortcut('c')
                .param(ParamDesc::int(1, "Tesselate", 3, 1, 64, 1, 0.25)?),
            2,
        )?
        .build()?,
        generator(MESH_GRID, "Grid", MESH)
            .param(ParamDesc::int(1, "Tesselate", 2, 1, 255, 1, 0.25)?)
            .param(ParamDesc::choice(2, "Sides", "one|two", 0)?)
            .build()?,
        generator(MESH_TORUS, "Torus", MESH)
            .param(ParamDesc::int(1, "Slices", 1, 3, 255, 8, 0.25)?)
            .param(ParamDesc::int(2, "Segments", 1, 3, 255, 8, 0.25)?)
            .param(
                ParamDesc::float(3, "Radius", 2, 0.0, 1024.0, 1.0, 0.01)?
                    .with_defaults([1.0, 0.25, 0.0, 0.0])?,
            )
            .build()?,
        pseudo(MESH_LOAD, "Load", MESH, ClassFlags::LOAD)?,
        pseudo(MESH_STORE, "Store", MESH, ClassFlags::STORE)?,
        pseudo(MESH_NOP, "Nop", MESH, ClassFlags::NOP)?,
        filter(MESH_MATERIAL, "Material", MESH)
            .param(ParamDesc::link(2, "Texture", BITMAP)?)
            .param(ParamDesc::flags(3, "Flags", "double sided|additive", 0)?)
            .param(ParamDesc::color(4, "Tint", 0xffff_ffff))
            .build()?,
        with_handlers(
            ClassDesc::builder(MESH_ADD.0, "Add", MESH)
                .column(Column::Combiner)
                .input(InputDesc::new(
                    1,
                    "In",
                    MESH,
                    InputFlags::REQUIRED | InputFlags::MULTIPLE,
                )),
            MESH_ADD,
            MESH,
        )
        .build()?,
        transform_params(filter(MESH_TRANSFORM, "Transform", MESH).shortcut('t'), 2)?.build()?,
    ];

    let mut b = Registry::builder();
    for t in types {
        b = b.add_type(t);
    }
    for c in classes {
        b = b.add_class(c);
    }
    b.build()
}

#[cfg(test)]
#[path = "../../tests/unit/schema/standard.rs"]
mod tests;
