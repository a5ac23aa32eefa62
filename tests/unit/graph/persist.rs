use super::*;
use crate::foundation::config::{DocumentConfig, LegacyWidthEntry};
use crate::schema::class::ClassDesc;
use crate::schema::param::ParamDesc;
use crate::schema::registry::Registry;
use crate::schema::standard::{self, handler_for, standard_registry};
use crate::foundation::words::WordWriter;
use crate::value::ValueData;

/// Stock registry with `class` replacing the class of the same id, or appended.
fn registry_with(class: ClassDesc) -> Registry {
    let base = standard_registry().unwrap();
    let mut b = Registry::builder();
    for t in base.types() {
        b = b.add_type(t.clone());
    }
    let mut replaced = false;
    for c in base.classes() {
        if c.id == class.id {
            b = b.add_class(class.clone());
            replaced = true;
        } else {
            b = b.add_class(c.clone());
        }
    }
    if !replaced {
        b = b.add_class(class);
    }
    b.build().unwrap()
}

/// Flat with an extra parameter 9 placed before the color.
fn wide_flat() -> ClassDesc {
    ClassDesc::builder(standard::BITMAP_FLAT.0, "Flat", standard::BITMAP)
        .version(2)
        .param(ParamDesc::color(9, "Glow", 0xff00_ff00))
        .param(ParamDesc::color(1, "Color", 0xff00_0000))
        .handler(
            standard::BITMAP_RGBA8.0,
            handler_for(standard::BITMAP_FLAT, standard::BITMAP_RGBA8),
        )
        .build()
        .unwrap()
}

fn sample() -> Document {
    let mut d = Document::with_standard_registry().unwrap();
    let p = d.add_page("main");
    let flat = d.add_op(p, standard::BITMAP_FLAT, 1, 2).unwrap();
    d.set_store_name(flat, "base").unwrap();
    d.set_value(flat, ParaId(1), ValueData::Color(0xff80_4020))
        .unwrap();
    let text = d.add_op(p, standard::BITMAP_TEXT, 1, 3).unwrap();
    d.link_input(text, ParaId(1), "base").unwrap();
    d.set_value(text, ParaId(2), ValueData::Text("héllo\nworld".to_owned()))
        .unwrap();
    d.op_mut(text).unwrap().set_bypass(true);
    d.op_mut(text).unwrap().set_selected(true);
    let q = d.add_page("second");
    d.add_op(q, standard::MESH_TORUS, -4, 9).unwrap();
    d
}

#[test]
fn write_read_write_is_identical() {
    let d = sample();
    let words = d.write();
    assert_eq!(words[0], DOC_MAGIC);
    assert_eq!(*words.last().unwrap(), DOC_END);

    let mut e = Document::with_standard_registry().unwrap();
    let report = e.read(&words).unwrap();
    assert!(report.is_clean());
    assert_eq!(report.ops_loaded, 3);
    assert_eq!(e.write(), words);

    let text = e.page(PageId(0)).unwrap().ops()[1];
    let op = e.op(text).unwrap();
    assert!(op.is_bypassed() && op.is_selected() && !op.is_hidden());
    assert_eq!(op.position(), (1, 3));
    assert_eq!(op.links()[0].target(), e.find_op("base"));
    assert_eq!(e.pages()[1].name(), "second");
}

#[test]
fn unknown_class_becomes_orphan_and_survives_saving() {
    let extra = ClassDesc::builder(0x0150, "Sparkle", standard::BITMAP)
        .param(ParamDesc::float(1, "Amount", 2, 0.0, 1.0, 0.5, 0.01).unwrap())
        .input(crate::schema::class::InputDesc::new(
            2,
            "In",
            standard::BITMAP,
            crate::schema::class::InputFlags::NONE,
        ))
        .handler(1, handler_for(crate::foundation::ids::ClassId(0x0150), standard::BITMAP_RGBA8))
        .build()
        .unwrap();
    let mut src = Document::new(registry_with(extra), DocumentConfig::default()).unwrap();
    let p = src.add_page("p");
    let flat = src.add_op(p, standard::BITMAP_FLAT, 0, 0).unwrap();
    src.set_store_name(flat, "f").unwrap();
    let sparkle = src.add_op(p, ClassId(0x0150), 0, 1).unwrap();
    src.set_store_name(sparkle, "s").unwrap();
    src.link_input(sparkle, ParaId(2), "f").unwrap();
    let words = src.write();

    let mut d = Document::with_standard_registry().unwrap();
    let report = d.read(&words).unwrap();
    assert_eq!(report.ops_loaded, 2);
    assert_eq!(report.orphan_ops, 1);
    let orphan = d.op(d.find_op("s").unwrap()).unwrap();
    assert!(orphan.is_orphan());
    assert_eq!(orphan.error().unwrap().kind, OpErrorKind::SchemaMismatch);
    assert_eq!(orphan.links()[0].target(), d.find_op("f"));
    let normal = d.op(d.find_op("f").unwrap()).unwrap();
    assert!(normal.error().is_none());

    assert_eq!(d.write(), words);
}

/// Version 1 stream: one page holding one op whose values carry no word counts.
fn unsized_stream(class: ClassId, version: u32, values: &[(u32, &[u32])]) -> Vec<u32> {
    let mut w = WordWriter::new();
    w.write_u32(DOC_MAGIC);
    w.write_u32(DOC_VERSION_UNSIZED);
    w.write_u32(1);
    w.write_string("p");
    w.write_u32(1);
    let len_at = w.reserve();
    let start = w.len();
    for word in [class.0, version, 0, 0, 3, 1, 0] {
        w.write_u32(word);
    }
    w.write_string("");
    w.write_u32(0);
    w.write_u32(values.len() as u32);
    for (para, payload) in values {
        w.write_u32(*para);
        w.write_words(payload);
    }
    w.patch(len_at, (w.len() - start) as u32);
    w.write_u32(DOC_END);
    w.into_words()
}

#[test]
fn retired_parameter_with_legacy_width_is_skipped() {
    let words = unsized_stream(
        standard::BITMAP_FLAT,
        2,
        &[(9, &[0xff00_ff00]), (1, &[0xff11_2233])],
    );
    let cfg = DocumentConfig::from_json(
        &serde_json::json!({
            "legacy_widths": [{ "class": 0x0101, "para": 9, "words": 1 }]
        })
        .to_string(),
    )
    .unwrap();
    let mut d = Document::new(standard_registry().unwrap(), cfg).unwrap();
    let report = d.read(&words).unwrap();
    assert_eq!(report.discarded_values, 1);
    assert_eq!(report.defaulted_values, 0);
    let op = d.op(OpId(0)).unwrap();
    assert_eq!(
        op.find_value(ParaId(1)).unwrap().data,
        ValueData::Color(0xff11_2233)
    );
    assert_eq!(op.error().unwrap().kind, OpErrorKind::SchemaMismatch);
}

#[test]
fn unknown_parameter_without_width_drops_the_rest() {
    let words = unsized_stream(
        standard::BITMAP_FLAT,
        2,
        &[(9, &[0xff00_ff00]), (1, &[0xff11_2233])],
    );
    let mut d = Document::with_standard_registry().unwrap();
    let report = d.read(&words).unwrap();
    assert_eq!(report.discarded_values, 2);
    assert_eq!(report.defaulted_values, 1);
    assert_eq!(
        d.op(OpId(0)).unwrap().find_value(ParaId(1)).unwrap().data,
        ValueData::Color(0xff00_0000)
    );
}

#[test]
fn sized_values_skip_unknown_parameters_without_a_table() {
    let mut src = Document::new(registry_with(wide_flat()), DocumentConfig::default()).unwrap();
    let p = src.add_page("p");
    let flat = src.add_op(p, standard::BITMAP_FLAT, 0, 0).unwrap();
    src.set_value(flat, ParaId(1), ValueData::Color(0xff11_2233))
        .unwrap();
    let words = src.write();
    assert_eq!(words[1], DOC_VERSION);

    let mut d = Document::with_standard_registry().unwrap();
    let report = d.read(&words).unwrap();
    assert_eq!(report.discarded_values, 1);
    assert_eq!(report.defaulted_values, 0);
    let op = d.op(OpId(0)).unwrap();
    assert_eq!(
        op.find_value(ParaId(1)).unwrap().data,
        ValueData::Color(0xff11_2233)
    );
    assert_eq!(op.error().unwrap().kind, OpErrorKind::SchemaMismatch);
}

fn tinted(amount_width: u8) -> ClassDesc {
    ClassDesc::builder(0x0191, "Tinted", standard::BITMAP)
        .param(ParamDesc::float(2, "Amount", amount_width, 0.0, 8.0, 0.5, 0.01).unwrap())
        .param(ParamDesc::color(3, "Tint", 0xff00_0000))
        .handler(1, handler_for(ClassId(0x0191), standard::BITMAP_RGBA8))
        .build()
        .unwrap()
}

#[test]
fn widened_parameter_is_defaulted_and_neighbours_survive() {
    let mut src = Document::new(registry_with(tinted(1)), DocumentConfig::default()).unwrap();
    let p = src.add_page("p");
    let op = src.add_op(p, ClassId(0x0191), 0, 0).unwrap();
    src.set_value(op, ParaId(2), ValueData::FloatV(smallvec::smallvec![1.0]))
        .unwrap();
    src.set_value(op, ParaId(3), ValueData::Color(0xff12_3456))
        .unwrap();
    let words = src.write();

    let mut d = Document::new(registry_with(tinted(2)), DocumentConfig::default()).unwrap();
    let report = d.read(&words).unwrap();
    assert_eq!(report.discarded_values, 1);
    assert_eq!(report.defaulted_values, 1);
    let op = d.op(OpId(0)).unwrap();
    assert_eq!(
        op.find_value(ParaId(2)).unwrap().data,
        ValueData::FloatV(smallvec::smallvec![0.5, 0.5])
    );
    assert_eq!(
        op.find_value(ParaId(3)).unwrap().data,
        ValueData::Color(0xff12_3456)
    );
    assert_eq!(op.error().unwrap().kind, OpErrorKind::SchemaMismatch);
}

#[test]
fn orphan_from_an_unsized_stream_keeps_its_layout() {
    let amount = 0.25f32.to_bits();
    let words = unsized_stream(ClassId(0x0191), 1, &[(2, &[amount]), (3, &[0xff12_3456])]);
    let mut d = Document::with_standard_registry().unwrap();
    assert_eq!(d.read(&words).unwrap().orphan_ops, 1);
    let resaved = d.write();
    assert_eq!(resaved[1], DOC_VERSION);

    let mut e = Document::new(registry_with(tinted(1)), DocumentConfig::default()).unwrap();
    let report = e.read(&resaved).unwrap();
    assert!(report.is_clean());
    let op = e.op(OpId(0)).unwrap();
    assert_eq!(
        op.find_value(ParaId(2)).unwrap().data,
        ValueData::FloatV(smallvec::smallvec![0.25])
    );
    assert_eq!(
        op.find_value(ParaId(3)).unwrap().data,
        ValueData::Color(0xff12_3456)
    );
}

#[test]
fn unsupported_version_is_corrupt() {
    let mut words = sample().write();
    words[1] = DOC_VERSION + 1;
    assert!(matches!(
        Document::with_standard_registry().unwrap().read(&words),
        Err(OpforgeError::CorruptStream { offset: 1, .. })
    ));
}

#[test]
fn new_parameters_are_defaulted() {
    let src = sample();
    let words = src.write();
    let mut d = Document::new(registry_with(wide_flat()), DocumentConfig::default()).unwrap();
    let report = d.read(&words).unwrap();
    assert_eq!(report.defaulted_values, 1);
    assert_eq!(report.discarded_values, 0);
    let flat = d.op(d.find_op("base").unwrap()).unwrap();
    assert_eq!(flat.values()[0].data, ValueData::Color(0xff00_ff00));
    assert_eq!(flat.values()[1].data, ValueData::Color(0xff80_4020));
    assert!(flat.error().is_none());
}

#[test]
fn corrupt_streams_leave_the_document_untouched() {
    let words = sample().write();
    let mut d = sample();
    let flat = d.find_op("base").unwrap();
    d.set_store_name(flat, "kept").unwrap();
    let before = d.write();

    for cut in [1, 3, words.len() / 2, words.len() - 1] {
        assert!(d.read(&words[..cut]).is_err(), "prefix of {cut} words");
        assert_eq!(d.write(), before);
    }

    let mut trailing = words.clone();
    trailing.push(0);
    assert!(matches!(
        d.read(&trailing),
        Err(OpforgeError::CorruptStream { .. })
    ));

    let mut bad_magic = words.clone();
    bad_magic[0] ^= 1;
    assert!(d.read(&bad_magic).is_err());
    assert_eq!(d.write(), before);
}

#[test]
fn corrupt_offsets_are_absolute() {
    let mut words = sample().write();
    // inflate the first op record so it swallows the rest of the stream
    let first_record = 3 + string_words_of("main") + 1;
    words[first_record] = 10_000;
    match Document::with_standard_registry().unwrap().read(&words) {
        Err(OpforgeError::CorruptStream { offset, .. }) => assert_eq!(offset, first_record + 1),
        other => panic!("expected CorruptStream, got {other:?}"),
    }
}

fn string_words_of(s: &str) -> usize {
    crate::foundation::words::string_words(s)
}
