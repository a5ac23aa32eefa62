use super::*;

#[test]
fn string_packing_is_little_endian_and_zero_padded() {
    let mut w = WordWriter::new();
    w.write_string("abcde");
    assert_eq!(
        w.as_slice(),
        &[5, u32::from_le_bytes(*b"abcd"), u32::from_le_bytes([b'e', 0, 0, 0])]
    );
    assert_eq!(string_words("abcde"), 3);
    assert_eq!(string_words(""), 1);
}

#[test]
fn reader_reports_offset_on_truncation() {
    let words = [3u32, 0x41];
    let mut r = WordReader::new(&words);
    let err = r.read_string().unwrap_err();
    match err {
        OpforgeError::CorruptStream { offset, .. } => assert_eq!(offset, 1),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn reader_rejects_invalid_utf8() {
    let words = [2u32, u32::from_le_bytes([0xff, 0xfe, 0, 0])];
    let mut r = WordReader::new(&words);
    assert!(matches!(
        r.read_string(),
        Err(OpforgeError::CorruptStream { offset: 0, .. })
    ));
}

#[test]
fn expect_u32_checks_magic() {
    let words = [0xdead_beef_u32];
    let mut r = WordReader::new(&words);
    assert!(r.expect_u32(0x1234, "magic").is_err());

    let mut r = WordReader::new(&words);
    r.expect_u32(0xdead_beef, "magic").unwrap();
    assert!(r.is_at_end());
}

#[test]
fn reserve_and_patch_backfill_lengths() {
    let mut w = WordWriter::new();
    let at = w.reserve();
    w.write_u32(9);
    w.write_i32(-1);
    w.patch(at, 2);
    assert_eq!(w.into_words(), vec![2, 9, u32::MAX]);
}

#[test]
fn signed_and_float_words_survive_a_cycle() {
    let mut w = WordWriter::new();
    w.write_i32(-42);
    w.write_f32(0.1);
    let words = w.into_words();
    let mut r = WordReader::new(&words);
    assert_eq!(r.read_i32().unwrap(), -42);
    assert_eq!(r.read_f32().unwrap().to_bits(), 0.1f32.to_bits());
    assert!(r.is_at_end());
}
