use super::*;
use crate::foundation::config::LegacyWidthEntry;
use crate::foundation::ids::{ClassId, TypeId};
use crate::value::legacy::LegacyWidths;
use smallvec::smallvec;

fn descriptors() -> Vec<ParamDesc> {
    vec![
        ParamDesc::choice(1, "Mode", "a|b|c", 2).unwrap(),
        ParamDesc::flags(2, "Bits", "x|y|z", 0b101).unwrap(),
        ParamDesc::int(3, "Tess", 3, -8, 64, 4, 0.25).unwrap(),
        ParamDesc::float(4, "Pos", 2, -4.0, 4.0, 0.1, 0.001).unwrap(),
        ParamDesc::color(5, "Tint", 0x80ff_2010),
        ParamDesc::string(6, "Font", 32, "Arial").unwrap(),
        ParamDesc::text(7, "Body", "line one\nline two"),
        ParamDesc::filename(8, "File", "tex/brick.png"),
        ParamDesc::link(9, "Src", TypeId(1)).unwrap(),
        ParamDesc::contrast(10, "Contrast").unwrap(),
    ]
}

fn edited(desc: &ParamDesc) -> Value {
    let data = match desc.kind {
        ParamKind::Choice => ValueData::Int(1),
        ParamKind::Flags => ValueData::Int(0b011),
        ParamKind::Int => ValueData::IntV(smallvec![-3, 0, 64]),
        ParamKind::Float => ValueData::FloatV(smallvec![-0.0, f32::MIN_POSITIVE]),
        ParamKind::Color => ValueData::Color(0x1234_5678),
        ParamKind::String => ValueData::String("Tahoma".to_owned()),
        ParamKind::Text => ValueData::Text("héllo\u{1F600}".to_owned()),
        ParamKind::Filename => ValueData::Filename(String::new()),
        ParamKind::Link => ValueData::Link("rock".to_owned()),
        ParamKind::Contrast => ValueData::Contrast(smallvec![0.25, 0.75]),
        ParamKind::Label => unreachable!(),
    };
    Value {
        para: desc.id,
        data,
    }
}

fn bits(v: &Value) -> Vec<u32> {
    let mut w = WordWriter::new();
    v.serialize(&mut w);
    w.into_words()
}

#[test]
fn every_kind_round_trips_bit_for_bit() {
    for desc in descriptors() {
        for v in [Value::default_from(&desc).unwrap(), edited(&desc)] {
            assert!(v.data.fits(&desc), "{:?} should fit {}", v.data, desc.name);
            let words = bits(&v);
            let mut r = WordReader::new(&words);
            let back = Value::deserialize(&desc, &mut r).unwrap();
            assert!(r.is_at_end(), "{} left words unread", desc.name);
            assert_eq!(bits(&back), words, "{} changed on round trip", desc.name);
            assert_eq!(back.para, desc.id);
        }
    }
}

#[test]
fn defaults_follow_the_descriptor() {
    let d = descriptors();
    assert_eq!(Value::default_from(&d[0]).unwrap().data, ValueData::Int(2));
    assert_eq!(
        Value::default_from(&d[2]).unwrap().data,
        ValueData::IntV(smallvec![4, 4, 4])
    );
    assert_eq!(
        Value::default_from(&d[4]).unwrap().data,
        ValueData::Color(0x80ff_2010)
    );
    assert_eq!(
        Value::default_from(&d[5]).unwrap().data,
        ValueData::String("Arial".to_owned())
    );
    assert!(Value::default_from(&ParamDesc::label("Caption")).is_none());
}

#[test]
fn compiled_word_counts_per_kind() {
    let d = descriptors();
    let count = |i: usize| Value::default_from(&d[i]).unwrap().compiled_word_count();
    assert_eq!(count(0), 1);
    assert_eq!(count(2), 3);
    assert_eq!(count(3), 2);
    assert_eq!(count(4), 1);
    // "Arial": length word + 2 payload words
    assert_eq!(count(5), 3);
    assert_eq!(count(8), 0);
    assert_eq!(count(9), 2);

    for desc in &d {
        let v = edited(desc);
        let mut block = Vec::new();
        v.store_into(desc, &mut block);
        assert_eq!(block.len(), v.compiled_word_count(), "{}", desc.name);
    }
}

#[test]
fn store_into_applies_affine_transform() {
    let desc = ParamDesc::float(1, "Angle", 2, -16.0, 16.0, 0.0, 0.01)
        .unwrap()
        .with_transform(1.0, 0.5);
    let v = Value {
        para: desc.id,
        data: ValueData::FloatV(smallvec![2.0, -4.0]),
    };
    let mut block = Vec::new();
    v.store_into(&desc, &mut block);
    assert_eq!(block, vec![2.0f32.to_bits(), (-1.0f32).to_bits()]);
}

#[test]
fn choices_are_stored_untransformed() {
    let desc = ParamDesc::choice(1, "Mode", "a|b|c", 0)
        .unwrap()
        .with_transform(10.0, 3.0);
    let v = Value {
        para: desc.id,
        data: ValueData::Int(2),
    };
    let mut block = Vec::new();
    v.store_into(&desc, &mut block);
    assert_eq!(block, vec![2]);
}

#[test]
fn integer_slots_round_half_away_from_zero() {
    let desc = ParamDesc::int(1, "N", 4, -100, 100, 0, 1.0)
        .unwrap()
        .with_transform(0.0, 0.5);
    let v = Value {
        para: desc.id,
        data: ValueData::IntV(smallvec![1, -1, 3, -5]),
    };
    let mut block = Vec::new();
    v.store_into(&desc, &mut block);
    let got: Vec<i32> = block.iter().map(|w| *w as i32).collect();
    assert_eq!(got, vec![1, -1, 2, -3]);

    assert_eq!(round_to_i32(2.5), 3);
    assert_eq!(round_to_i32(-2.5), -3);
    assert_eq!(round_to_i32(2.4999), 2);
    assert_eq!(round_to_i32(1e12), i32::MAX);
    assert_eq!(round_to_i32(-1e12), i32::MIN);
    assert_eq!(round_to_i32(f64::NAN), 0);
}

#[test]
fn fixed_point_transform_uses_full_precision() {
    let desc = ParamDesc::int(4, "Amplify", 1, 0, 16, 1, 0.1)
        .unwrap()
        .with_transform(0.0, 65536.0);
    let v = Value {
        para: desc.id,
        data: ValueData::IntV(smallvec![16]),
    };
    let mut block = Vec::new();
    v.store_into(&desc, &mut block);
    assert_eq!(block, vec![16 << 16]);
}

#[test]
fn label_descriptor_cannot_be_deserialized() {
    let words = [0u32];
    let mut r = WordReader::new(&words);
    assert!(Value::deserialize(&ParamDesc::label("x"), &mut r).is_err());
}

#[test]
fn fits_rejects_width_and_kind_mismatch() {
    let d = descriptors();
    assert!(!ValueData::IntV(smallvec![1, 2]).fits(&d[2]));
    assert!(!ValueData::Color(0).fits(&d[0]));
    assert!(!ValueData::String("much too long for the font field!!".to_owned()).fits(&d[5]));
}

#[test]
fn legacy_widths_lookup() {
    let t = LegacyWidths::from_entries(&[
        LegacyWidthEntry {
            class: ClassId(0x101),
            para: ParaId(9),
            words: 2,
        },
        LegacyWidthEntry {
            class: ClassId(0x101),
            para: ParaId(9),
            words: 4,
        },
    ]);
    assert_eq!(t.len(), 1);
    assert_eq!(t.width(ClassId(0x101), ParaId(9)), Some(4));
    assert_eq!(t.width(ClassId(0x102), ParaId(9)), None);
}

#[derive(Default)]
struct Recorder {
    rows: Vec<String>,
}

impl ParamEditor for Recorder {
    fn add_control(&mut self, _flags: crate::schema::param::ParamFlags, control: EditorControl<'_>) {
        let row = match control {
            EditorControl::Choice { name, options, selected } => {
                format!("{name}:choice:{}:{selected}", options.join(","))
            }
            EditorControl::IntVector { name, values, .. } => format!("{name}:int:{values:?}"),
            EditorControl::Link { name, target, ty } => format!("{name}:link:{target}:{ty:?}"),
            other => format!("{other:?}"),
        };
        self.rows.push(row);
    }
}

#[test]
fn populate_editor_describes_controls() {
    let d = descriptors();
    let mut rec = Recorder::default();
    edited(&d[0]).populate_editor(&d[0], &mut rec);
    edited(&d[2]).populate_editor(&d[2], &mut rec);
    edited(&d[8]).populate_editor(&d[8], &mut rec);
    assert_eq!(
        rec.rows,
        vec![
            "Mode:choice:a,b,c:1".to_owned(),
            "Tess:int:[-3, 0, 64]".to_owned(),
            "Src:link:rock:Some(TypeId(1))".to_owned(),
        ]
    );
}
