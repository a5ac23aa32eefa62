use super::*;

fn bitmap() -> TypeId {
    TypeId(1)
}

#[test]
fn next_para_id_follows_the_largest_id() {
    let c = ClassDesc::builder(0x0101, "Flat", bitmap())
        .param(ParamDesc::label("Look"))
        .param(ParamDesc::color(3, "Color", 0xff00_0000))
        .param(ParamDesc::float(7, "Gain", 1, 0.0, 1.0, 0.0, 0.1).unwrap())
        .input(InputDesc::new(2, "In", bitmap(), InputFlags::NONE))
        .build()
        .unwrap();
    assert_eq!(c.next_para_id, ParaId(8));
    assert_eq!(c.value_params().count(), 2);
    assert!(c.param(ParaId(0)).is_none());
    assert_eq!(c.kind(), ClassKind::Regular);
}

#[test]
fn duplicate_ids_across_params_and_inputs_are_rejected() {
    let err = ClassDesc::builder(0x0104, "Add", bitmap())
        .param(ParamDesc::color(1, "Color", 0))
        .input(InputDesc::new(1, "In", bitmap(), InputFlags::REQUIRED))
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("duplicate parameter id"));
}

#[test]
fn only_last_input_may_repeat() {
    let err = ClassDesc::builder(0x0104, "Add", bitmap())
        .input(InputDesc::new(1, "A", bitmap(), InputFlags::MULTIPLE))
        .input(InputDesc::new(2, "B", bitmap(), InputFlags::NONE))
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("only the last input"));

    ClassDesc::builder(0x0104, "Add", bitmap())
        .input(InputDesc::new(1, "A", bitmap(), InputFlags::REQUIRED))
        .input(InputDesc::new(
            2,
            "B",
            bitmap(),
            InputFlags::REQUIRED | InputFlags::MULTIPLE,
        ))
        .build()
        .unwrap();
}

#[test]
fn pseudo_classes_are_checked() {
    assert!(
        ClassDesc::builder(0x010a, "Nop", bitmap())
            .flags(ClassFlags::NOP)
            .build()
            .is_err()
    );
    assert!(
        ClassDesc::builder(0x0108, "Load", bitmap())
            .flags(ClassFlags::LOAD)
            .build()
            .is_err()
    );
    assert!(
        ClassDesc::builder(0x0108, "Both", bitmap())
            .flags(ClassFlags(ClassFlags::LOAD.0 | ClassFlags::NOP.0))
            .param(ParamDesc::link(1, "Store", bitmap()).unwrap())
            .build()
            .is_err()
    );

    let load = ClassDesc::builder(0x0108, "Load", bitmap())
        .flags(ClassFlags::LOAD)
        .param(ParamDesc::link(1, "Store", bitmap()).unwrap())
        .build()
        .unwrap();
    assert_eq!(load.kind(), ClassKind::Load);
}

#[test]
fn handlers_are_keyed_by_variant() {
    let c = ClassDesc::builder(0x0201, "Cube", TypeId(2))
        .handler(1, HandlerRef(0x0201_01))
        .build()
        .unwrap();
    assert_eq!(c.handler(VariantId(1)), Some(HandlerRef(0x0201_01)));
    assert_eq!(c.handler(VariantId(2)), None);
}

#[test]
fn invalid_param_descriptor_fails_the_class() {
    let mut bad = ParamDesc::float(1, "f", 1, 0.0, 1.0, 0.5, 0.1).unwrap();
    bad.default = [3.0; 4];
    assert!(
        ClassDesc::builder(0x0101, "Flat", bitmap())
            .param(bad)
            .build()
            .is_err()
    );
}
