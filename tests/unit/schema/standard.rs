use super::*;
use crate::schema::class::ClassKind;

#[test]
fn standard_registry_builds_with_stable_ids() {
    let r = Registry::standard().unwrap();
    assert_eq!(r.types().len(), 3);
    assert_eq!(r.find_class(BITMAP_FLAT).unwrap().name, "Flat");
    assert_eq!(r.find_class(MESH_CUBE).unwrap().output, MESH);
    assert_eq!(
        r.find_class(MESH_CUBE).unwrap().handler(MESH_MOBILE),
        Some(HandlerRef(0x0201_01))
    );
}

#[test]
fn pseudo_classes_have_expected_kinds() {
    let r = standard_registry().unwrap();
    let kind = |id| r.find_class(id).unwrap().kind();
    assert_eq!(kind(BITMAP_LOAD), ClassKind::Load);
    assert_eq!(kind(MESH_STORE), ClassKind::Store);
    assert_eq!(kind(BITMAP_NOP), ClassKind::Nop);
    assert_eq!(kind(MISC_COMMENT), ClassKind::Comment);
    assert_eq!(kind(BITMAP_BLUR), ClassKind::Regular);
    assert!(r.find_class(BITMAP_LOAD).unwrap().handlers.is_empty());
}

#[test]
fn mesh_material_links_a_bitmap() {
    let r = standard_registry().unwrap();
    let m = r.find_class(MESH_MATERIAL).unwrap();
    let link = m
        .value_params()
        .find(|p| p.name == "Texture")
        .expect("texture link");
    assert_eq!(link.link_type, Some(BITMAP));
    assert_eq!(m.next_para_id.0, 5);
}
