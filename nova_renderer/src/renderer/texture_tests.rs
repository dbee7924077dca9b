use crate::renderer::format::Format;
use crate::renderer::texture::{TextureDesc, MAX_TEXTURE_SIZE};

#[test]
fn test_builder_accumulates() {
    let desc = TextureDesc::new()
        .width(256)
        .height(128)
        .format(Format::RGBA8)
        .num_mips(2)
        .mip_level_data(0, vec![0u8; 256 * 128 * 4])
        .mip_level_data(1, vec![0u8; 128 * 64 * 4])
        .name("albedo");

    assert_eq!(desc.get_width(), 256);
    assert_eq!(desc.get_height(), 128);
    assert_eq!(desc.get_format(), Format::RGBA8);
    assert_eq!(desc.get_num_mips(), 2);
    assert_eq!(desc.get_mip_data(0).len(), 256 * 128 * 4);
    assert_eq!(desc.get_mip_data(1).len(), 128 * 64 * 4);
    assert_eq!(desc.get_name(), "albedo");
    desc.validate();
}

#[test]
#[should_panic(expected = "width")]
fn test_zero_width_rejected() {
    TextureDesc::new().width(0);
}

#[test]
#[should_panic(expected = "out of range")]
fn test_oversized_height_rejected() {
    TextureDesc::new().height(MAX_TEXTURE_SIZE + 1);
}

#[test]
#[should_panic(expected = "mip level")]
fn test_mip_data_beyond_count_rejected() {
    TextureDesc::new().num_mips(2).mip_level_data(2, vec![1]);
}

#[test]
#[should_panic(expected = "mip count")]
fn test_zero_mips_rejected() {
    TextureDesc::new().num_mips(0);
}

#[test]
#[should_panic(expected = "format not set")]
fn test_validate_incomplete_desc() {
    TextureDesc::new().width(4).height(4).validate();
}

#[test]
fn test_descs_are_plain_copyable_values() {
    let a = TextureDesc::new().width(16).height(16).format(Format::R8);
    let b = a.clone();
    assert_eq!(b.get_width(), a.get_width());
}
