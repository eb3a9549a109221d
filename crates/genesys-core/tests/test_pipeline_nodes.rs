mod common;

use common::array_stack;
use genesys_core::image::{ColorOrder, PixelFormat};
use genesys_core::pipeline::{
    compute_pixel_shift_extra_width, Calibrate, ComponentShiftLines, DeinterleaveLines, Desegment,
    Extract, FormatConvert, Invert, MergeMonoLines, PixelShiftColumns, PixelShiftLines, ScaleRows,
    SplitMonoLines, Swap16BitEndian,
};

fn u16_bytes(values: &[u16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn bytes_u16(data: &[u8]) -> Vec<u16> {
    data.chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect()
}

// ---------------------------------------------------------------------------
// Format nodes
// ---------------------------------------------------------------------------

#[test]
fn test_format_convert() {
    let mut stack = array_stack(
        3,
        1,
        PixelFormat::Rgb888,
        vec![0x12, 0x34, 0x56, 0x78, 0x98, 0xab, 0xcd, 0xef, 0x21],
    );
    stack
        .push_node(|src| FormatConvert::new(src, PixelFormat::Bgr161616))
        .unwrap();

    assert_eq!(stack.output_width().unwrap(), 3);
    assert_eq!(stack.output_height().unwrap(), 1);
    assert_eq!(stack.output_format().unwrap(), PixelFormat::Bgr161616);
    assert_eq!(stack.output_row_bytes().unwrap(), 18);

    assert_eq!(
        stack.get_all_data().unwrap(),
        vec![
            0x56, 0x56, 0x34, 0x34, 0x12, 0x12, 0xab, 0xab, 0x98, 0x98, 0x78, 0x78, 0x21, 0x21,
            0xef, 0xef, 0xcd, 0xcd,
        ]
    );
}

#[test]
fn test_swap_16bit_endian() {
    let mut stack = array_stack(
        4,
        1,
        PixelFormat::Rgb161616,
        vec![
            0x10, 0x20, 0x30, 0x11, 0x21, 0x31, 0x12, 0x22, 0x32, 0x13, 0x23, 0x33, 0x14, 0x24,
            0x34, 0x15, 0x25, 0x35, 0x16, 0x26, 0x36, 0x17, 0x27, 0x37,
        ],
    );
    stack.push_node(|src| Ok(Swap16BitEndian::new(src))).unwrap();

    assert_eq!(stack.output_format().unwrap(), PixelFormat::Rgb161616);
    assert_eq!(
        stack.get_all_data().unwrap(),
        vec![
            0x20, 0x10, 0x11, 0x30, 0x31, 0x21, 0x22, 0x12, 0x13, 0x32, 0x33, 0x23, 0x24, 0x14,
            0x15, 0x34, 0x35, 0x25, 0x26, 0x16, 0x17, 0x36, 0x37, 0x27,
        ]
    );
}

#[test]
fn test_swap_16bit_endian_leaves_8bit_rows() {
    let mut stack = array_stack(3, 1, PixelFormat::I8, vec![1, 2, 3]);
    stack.push_node(|src| Ok(Swap16BitEndian::new(src))).unwrap();
    assert_eq!(stack.get_all_data().unwrap(), vec![1, 2, 3]);
}

#[test]
fn test_invert_16_bits() {
    let input = u16_bytes(&[
        0x1020, 0x3011, 0x2131, 0x1222, 0x3213, 0x2333, 0x1424, 0x3415, 0x2525, 0x1626, 0x3617,
        0x2737,
    ]);
    let mut stack = array_stack(4, 1, PixelFormat::Rgb161616, input);
    stack.push_node(Invert::new).unwrap();

    let out = bytes_u16(&stack.get_all_data().unwrap());
    assert_eq!(
        out,
        vec![
            0xefdf, 0xcfee, 0xdece, 0xeddd, 0xcdec, 0xdccc, 0xebdb, 0xcbea, 0xdada, 0xe9d9,
            0xc9e8, 0xd8c8,
        ]
    );
}

#[test]
fn test_invert_8_bits() {
    let mut stack = array_stack(
        8,
        1,
        PixelFormat::Rgb888,
        vec![
            0x10, 0x20, 0x30, 0x11, 0x21, 0x31, 0x12, 0x22, 0x32, 0x13, 0x23, 0x33, 0x14, 0x24,
            0x34, 0x15, 0x25, 0x35, 0x16, 0x26, 0x36, 0x17, 0x27, 0x37,
        ],
    );
    stack.push_node(Invert::new).unwrap();

    assert_eq!(
        stack.get_all_data().unwrap(),
        vec![
            0xef, 0xdf, 0xcf, 0xee, 0xde, 0xce, 0xed, 0xdd, 0xcd, 0xec, 0xdc, 0xcc, 0xeb, 0xdb,
            0xcb, 0xea, 0xda, 0xca, 0xe9, 0xd9, 0xc9, 0xe8, 0xd8, 0xc8,
        ]
    );
}

#[test]
fn test_invert_1_bit() {
    let mut stack = array_stack(
        32,
        1,
        PixelFormat::Rgb111,
        vec![0x10, 0x20, 0x30, 0x11, 0x21, 0x31, 0x16, 0x26, 0x36, 0x17, 0x27, 0x37],
    );
    stack.push_node(Invert::new).unwrap();

    assert_eq!(
        stack.get_all_data().unwrap(),
        vec![0xef, 0xdf, 0xcf, 0xee, 0xde, 0xce, 0xe9, 0xd9, 0xc9, 0xe8, 0xd8, 0xc8]
    );
}

// ---------------------------------------------------------------------------
// Segment reordering
// ---------------------------------------------------------------------------

#[test]
fn test_desegment_one_line() {
    #[rustfmt::skip]
    let input = vec![
         1,  5,  9, 13, 17,
         3,  7, 11, 15, 19,
         2,  6, 10, 14, 18,
         4,  8, 12, 16, 20,
        21, 25, 29, 33, 37,
        23, 27, 31, 35, 39,
        22, 26, 30, 34, 38,
        24, 28, 32, 36, 40,
    ];
    let mut stack = array_stack(20, 2, PixelFormat::I8, input);
    stack
        .push_node(|src| Desegment::new(src, 20, vec![0, 2, 1, 3], 5, 1, 1))
        .unwrap();

    assert_eq!(stack.output_width().unwrap(), 20);
    assert_eq!(stack.output_height().unwrap(), 2);
    assert_eq!(stack.get_all_data().unwrap(), (1..=40).collect::<Vec<u8>>());
}

#[test]
fn test_desegment_natural_order() {
    let mut stack = array_stack(4, 1, PixelFormat::I8, vec![1, 3, 2, 4]);
    stack
        .push_node(|src| Desegment::with_segment_count(src, 4, 2, 2, 1, 1))
        .unwrap();
    assert_eq!(stack.get_all_data().unwrap(), vec![1, 2, 3, 4]);
}

#[test]
fn test_desegment_three_segments_two_interleaved_lines() {
    // Each raw line pair carries three 10-pixel segments in its first row; the
    // second row of every pair is filler that must not leak into the output.
    let mut input = Vec::new();
    for out_row in 0..3u8 {
        let base = out_row * 40;
        let first: Vec<u8> = (0..30u8)
            .map(|pos| {
                let (segment, i) = (pos / 10, pos % 10);
                base + i * 3 + segment
            })
            .collect();
        input.extend_from_slice(&first);
        input.extend_from_slice(&[0xee; 30]);
    }
    let mut stack = array_stack(30, 6, PixelFormat::I8, input);
    stack
        .push_node(|src| Desegment::new(src, 30, vec![0, 1, 2], 10, 2, 1))
        .unwrap();

    assert_eq!(stack.output_width().unwrap(), 30);
    assert_eq!(stack.output_height().unwrap(), 3);
    let expected: Vec<u8> = (0..3u8)
        .flat_map(|row| (0..30u8).map(move |x| row * 40 + x))
        .collect();
    assert_eq!(stack.get_all_data().unwrap(), expected);
}

#[test]
fn test_desegment_rejects_partial_interleave() {
    let mut stack = array_stack(4, 3, PixelFormat::I8, vec![0; 12]);
    assert!(stack
        .push_node(|src| Desegment::new(src, 8, vec![0, 1], 4, 2, 1))
        .is_err());
}

#[test]
fn test_deinterleave_lines_i8() {
    #[rustfmt::skip]
    let input = vec![
        1, 3, 5, 7,  9, 11, 13, 15, 17, 19,
        2, 4, 6, 8, 10, 12, 14, 16, 18, 20,
    ];
    let mut stack = array_stack(10, 2, PixelFormat::I8, input);
    stack.push_node(|src| DeinterleaveLines::new(src, 2, 1)).unwrap();

    assert_eq!(stack.output_width().unwrap(), 20);
    assert_eq!(stack.output_height().unwrap(), 1);
    assert_eq!(stack.get_all_data().unwrap(), (1..=20).collect::<Vec<u8>>());
}

#[test]
fn test_deinterleave_lines_rgb888() {
    #[rustfmt::skip]
    let input = vec![
        1, 2, 3,  7,  8,  9, 13, 14, 15, 19, 20, 21,
        4, 5, 6, 10, 11, 12, 16, 17, 18, 22, 23, 24,
    ];
    let mut stack = array_stack(4, 2, PixelFormat::Rgb888, input);
    stack.push_node(|src| DeinterleaveLines::new(src, 2, 1)).unwrap();

    assert_eq!(stack.output_width().unwrap(), 8);
    assert_eq!(stack.output_height().unwrap(), 1);
    assert_eq!(stack.get_all_data().unwrap(), (1..=24).collect::<Vec<u8>>());
}

// ---------------------------------------------------------------------------
// Colour line handling
// ---------------------------------------------------------------------------

#[test]
fn test_merge_mono_lines() {
    #[rustfmt::skip]
    let input = vec![
        0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17,
        0x20, 0x21, 0x22, 0x23, 0x24, 0x25, 0x26, 0x27,
        0x30, 0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x37,
    ];
    let mut stack = array_stack(8, 3, PixelFormat::I8, input);
    stack
        .push_node(|src| MergeMonoLines::new(src, ColorOrder::Rgb))
        .unwrap();

    assert_eq!(stack.output_width().unwrap(), 8);
    assert_eq!(stack.output_height().unwrap(), 1);
    assert_eq!(stack.output_format().unwrap(), PixelFormat::Rgb888);
    assert_eq!(
        stack.get_all_data().unwrap(),
        vec![
            0x10, 0x20, 0x30, 0x11, 0x21, 0x31, 0x12, 0x22, 0x32, 0x13, 0x23, 0x33, 0x14, 0x24,
            0x34, 0x15, 0x25, 0x35, 0x16, 0x26, 0x36, 0x17, 0x27, 0x37,
        ]
    );
}

#[test]
fn test_merge_mono_lines_rejects_gbr() {
    let mut stack = array_stack(2, 3, PixelFormat::I8, vec![0; 6]);
    assert!(stack
        .push_node(|src| MergeMonoLines::new(src, ColorOrder::Gbr))
        .is_err());
    // A failed build leaves nothing behind.
    assert!(stack.is_empty());
}

#[test]
fn test_split_mono_lines() {
    let input = vec![
        0x10, 0x20, 0x30, 0x11, 0x21, 0x31, 0x12, 0x22, 0x32, 0x13, 0x23, 0x33, 0x14, 0x24, 0x34,
        0x15, 0x25, 0x35, 0x16, 0x26, 0x36, 0x17, 0x27, 0x37,
    ];
    let mut stack = array_stack(8, 1, PixelFormat::Rgb888, input);
    stack.push_node(SplitMonoLines::new).unwrap();

    assert_eq!(stack.output_width().unwrap(), 8);
    assert_eq!(stack.output_height().unwrap(), 3);
    assert_eq!(stack.output_format().unwrap(), PixelFormat::I8);
    #[rustfmt::skip]
    let expected = vec![
        0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17,
        0x20, 0x21, 0x22, 0x23, 0x24, 0x25, 0x26, 0x27,
        0x30, 0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x37,
    ];
    assert_eq!(stack.get_all_data().unwrap(), expected);
}

#[test]
fn test_merge_then_split_restores_mono_lines() {
    let input: Vec<u8> = (0..24u8).map(|v| v * 7 + 3).collect();
    let mut stack = array_stack(8, 3, PixelFormat::I8, input.clone());
    stack
        .push_node(|src| MergeMonoLines::new(src, ColorOrder::Rgb))
        .unwrap();
    stack.push_node(SplitMonoLines::new).unwrap();

    assert_eq!(stack.output_format().unwrap(), PixelFormat::I8);
    assert_eq!(stack.output_height().unwrap(), 3);
    assert_eq!(stack.get_all_data().unwrap(), input);

    let input = u16_bytes(&(0..12u16).map(|v| v * 0x1111 + 0x0102).collect::<Vec<_>>());
    let mut stack = array_stack(4, 3, PixelFormat::I16, input.clone());
    stack
        .push_node(|src| MergeMonoLines::new(src, ColorOrder::Bgr))
        .unwrap();
    assert_eq!(stack.output_format().unwrap(), PixelFormat::Bgr161616);
    stack.push_node(SplitMonoLines::new).unwrap();

    assert_eq!(stack.output_format().unwrap(), PixelFormat::I16);
    assert_eq!(stack.get_all_data().unwrap(), input);
}

#[rustfmt::skip]
fn four_rgb_rows() -> Vec<u8> {
    vec![
        0x10, 0x20, 0x30, 0x11, 0x21, 0x31, 0x12, 0x22, 0x32, 0x13, 0x23, 0x33,
        0x14, 0x24, 0x34, 0x15, 0x25, 0x35, 0x16, 0x26, 0x36, 0x17, 0x27, 0x37,
        0x18, 0x28, 0x38, 0x19, 0x29, 0x39, 0x1a, 0x2a, 0x3a, 0x1b, 0x2b, 0x3b,
        0x1c, 0x2c, 0x3c, 0x1d, 0x2d, 0x3d, 0x1e, 0x2e, 0x3e, 0x1f, 0x2f, 0x3f,
    ]
}

#[test]
fn test_component_shift_lines() {
    let mut stack = array_stack(4, 4, PixelFormat::Rgb888, four_rgb_rows());
    stack
        .push_node(|src| ComponentShiftLines::new(src, 0, 1, 2))
        .unwrap();

    assert_eq!(stack.output_width().unwrap(), 4);
    assert_eq!(stack.output_height().unwrap(), 2);
    #[rustfmt::skip]
    let expected = vec![
        0x10, 0x24, 0x38, 0x11, 0x25, 0x39, 0x12, 0x26, 0x3a, 0x13, 0x27, 0x3b,
        0x14, 0x28, 0x3c, 0x15, 0x29, 0x3d, 0x16, 0x2a, 0x3e, 0x17, 0x2b, 0x3f,
    ];
    assert_eq!(stack.get_all_data().unwrap(), expected);
}

#[test]
fn test_component_shift_lines_height_drops_largest_shift() {
    let mut stack = array_stack(4, 4, PixelFormat::Rgb888, four_rgb_rows());
    stack
        .push_node(|src| ComponentShiftLines::new(src, 0, 2, 4))
        .unwrap();
    assert_eq!(stack.output_height().unwrap(), 0);
    assert!(stack.get_all_data().unwrap().is_empty());

    let input: Vec<u8> = (0..10u8)
        .flat_map(|row| (0..2u8).flat_map(move |x| [row, 0x40 + row, 0x80 + row + x]))
        .collect();
    let mut stack = array_stack(2, 10, PixelFormat::Rgb888, input);
    stack
        .push_node(|src| ComponentShiftLines::new(src, 0, 2, 4))
        .unwrap();
    assert_eq!(stack.output_height().unwrap(), 6);

    let out = stack.get_all_data().unwrap();
    for y in 0..6u8 {
        let row = &out[y as usize * 6..(y as usize + 1) * 6];
        for x in 0..2u8 {
            let px = &row[x as usize * 3..x as usize * 3 + 3];
            assert_eq!(px, &[y, 0x40 + y + 2, 0x80 + y + 4 + x], "row {y}, pixel {x}");
        }
    }
}

#[test]
fn test_component_shift_lines_rejects_mono() {
    let mut stack = array_stack(4, 4, PixelFormat::I8, vec![0; 16]);
    assert!(stack
        .push_node(|src| ComponentShiftLines::new(src, 0, 1, 2))
        .is_err());
}

// ---------------------------------------------------------------------------
// Pixel shifts
// ---------------------------------------------------------------------------

#[test]
fn test_pixel_shift_lines_two_lines() {
    let mut stack = array_stack(4, 4, PixelFormat::Rgb888, four_rgb_rows());
    stack
        .push_node(|src| PixelShiftLines::new(src, vec![0, 2]))
        .unwrap();

    assert_eq!(stack.output_height().unwrap(), 2);
    #[rustfmt::skip]
    let expected = vec![
        0x10, 0x20, 0x30, 0x19, 0x29, 0x39, 0x12, 0x22, 0x32, 0x1b, 0x2b, 0x3b,
        0x14, 0x24, 0x34, 0x1d, 0x2d, 0x3d, 0x16, 0x26, 0x36, 0x1f, 0x2f, 0x3f,
    ];
    assert_eq!(stack.get_all_data().unwrap(), expected);
}

#[test]
fn test_pixel_shift_lines_four_lines() {
    let input: Vec<u8> = (0..9u8)
        .flat_map(|row| (0..12u8).map(move |col| row * 0x10 + col))
        .collect();
    let mut stack = array_stack(12, 9, PixelFormat::I8, input);
    stack
        .push_node(|src| PixelShiftLines::new(src, vec![0, 2, 1, 3]))
        .unwrap();

    assert_eq!(stack.output_width().unwrap(), 12);
    assert_eq!(stack.output_height().unwrap(), 6);
    #[rustfmt::skip]
    let expected = vec![
        0x00, 0x21, 0x12, 0x33, 0x04, 0x25, 0x16, 0x37, 0x08, 0x29, 0x1a, 0x3b,
        0x10, 0x31, 0x22, 0x43, 0x14, 0x35, 0x26, 0x47, 0x18, 0x39, 0x2a, 0x4b,
        0x20, 0x41, 0x32, 0x53, 0x24, 0x45, 0x36, 0x57, 0x28, 0x49, 0x3a, 0x5b,
        0x30, 0x51, 0x42, 0x63, 0x34, 0x55, 0x46, 0x67, 0x38, 0x59, 0x4a, 0x6b,
        0x40, 0x61, 0x52, 0x73, 0x44, 0x65, 0x56, 0x77, 0x48, 0x69, 0x5a, 0x7b,
        0x50, 0x71, 0x62, 0x83, 0x54, 0x75, 0x66, 0x87, 0x58, 0x79, 0x6a, 0x8b,
    ];
    assert_eq!(stack.get_all_data().unwrap(), expected);
}

#[test]
fn test_pixel_shift_extra_width() {
    let cases: [([usize; 4], [usize; 8]); 9] = [
        ([0, 1, 2, 3], [0, 0, 0, 0, 0, 0, 0, 0]),
        ([1, 1, 2, 3], [0, 1, 0, 0, 0, 1, 0, 0]),
        ([2, 1, 2, 3], [0, 1, 2, 0, 0, 1, 2, 0]),
        ([3, 1, 2, 3], [0, 1, 2, 3, 0, 1, 2, 3]),
        ([7, 1, 2, 3], [4, 5, 6, 7, 4, 5, 6, 7]),
        ([0, 1, 3, 3], [0, 0, 0, 1, 0, 0, 0, 1]),
        ([0, 1, 4, 3], [2, 0, 0, 1, 2, 0, 0, 1]),
        ([0, 1, 5, 3], [2, 3, 0, 1, 2, 3, 0, 1]),
        ([0, 1, 9, 3], [6, 7, 4, 5, 6, 7, 4, 5]),
    ];
    for (shifts, expected) in cases {
        for (i, &extra) in expected.iter().enumerate() {
            let width = 12 + i;
            assert_eq!(
                compute_pixel_shift_extra_width(width, &shifts),
                extra,
                "width {width}, shifts {shifts:?}"
            );
        }
    }
}

fn two_rows(width: u8) -> Vec<u8> {
    (0..2u8)
        .flat_map(|row| (0..width).map(move |col| row * 0x10 + col))
        .collect()
}

#[test]
fn test_pixel_shift_columns_no_switch() {
    let input = two_rows(12);
    let mut stack = array_stack(12, 2, PixelFormat::I8, input.clone());
    stack
        .push_node(|src| PixelShiftColumns::new(src, vec![0, 1, 2, 3]))
        .unwrap();

    assert_eq!(stack.output_width().unwrap(), 12);
    assert_eq!(stack.get_all_data().unwrap(), input);
}

#[test]
fn test_pixel_shift_columns_group_switch() {
    #[rustfmt::skip]
    let expected = vec![
        0x03, 0x01, 0x02, 0x00, 0x07, 0x05, 0x06, 0x04, 0x0b, 0x09, 0x0a, 0x08,
        0x13, 0x11, 0x12, 0x10, 0x17, 0x15, 0x16, 0x14, 0x1b, 0x19, 0x1a, 0x18,
    ];
    for width in [12usize, 13] {
        let mut stack = array_stack(width, 2, PixelFormat::I8, two_rows(width as u8));
        stack
            .push_node(|src| PixelShiftColumns::new(src, vec![3, 1, 2, 0]))
            .unwrap();

        assert_eq!(stack.output_width().unwrap(), 12, "source width {width}");
        assert_eq!(stack.get_all_data().unwrap(), expected, "source width {width}");
    }
}

#[test]
fn test_pixel_shift_columns_large_offsets() {
    #[rustfmt::skip]
    let expected = vec![
        0x07, 0x01, 0x05, 0x00, 0x0b, 0x05, 0x09, 0x04,
        0x17, 0x11, 0x15, 0x10, 0x1b, 0x15, 0x19, 0x14,
    ];
    for width in [12usize, 13] {
        let mut stack = array_stack(width, 2, PixelFormat::I8, two_rows(width as u8));
        stack
            .push_node(|src| PixelShiftColumns::new(src, vec![7, 1, 5, 0]))
            .unwrap();

        assert_eq!(stack.output_width().unwrap(), 8, "source width {width}");
        assert_eq!(stack.get_all_data().unwrap(), expected, "source width {width}");
    }
}

#[test]
fn test_pixel_shift_rejects_empty_shifts() {
    let mut stack = array_stack(4, 2, PixelFormat::I8, vec![0; 8]);
    assert!(stack
        .push_node(|src| PixelShiftLines::new(src, Vec::new()))
        .is_err());

    let mut stack = array_stack(4, 2, PixelFormat::I8, vec![0; 8]);
    assert!(stack
        .push_node(|src| PixelShiftColumns::new(src, Vec::new()))
        .is_err());
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

#[test]
fn test_extract_pads_outside_source() {
    let mut stack = array_stack(4, 3, PixelFormat::I8, (0..12).collect());
    stack.push_node(|src| Extract::new(src, 1, 1, 4, 3)).unwrap();

    assert_eq!(stack.output_width().unwrap(), 4);
    assert_eq!(stack.output_height().unwrap(), 3);
    assert_eq!(
        stack.get_all_data().unwrap(),
        vec![5, 6, 7, 0, 9, 10, 11, 0, 0, 0, 0, 0]
    );
}

#[test]
fn test_extract_window_hanging_past_right_edge() {
    let input: Vec<u8> = (0..200u32).map(|i| (i % 100) as u8 + 1).collect();
    let mut stack = array_stack(100, 2, PixelFormat::I8, input);
    stack.push_node(|src| Extract::new(src, 90, 0, 20, 2)).unwrap();

    assert_eq!(stack.output_width().unwrap(), 20);
    let mut row: Vec<u8> = (91..=100).collect();
    row.extend_from_slice(&[0; 10]);
    assert_eq!(stack.get_all_data().unwrap(), [row.clone(), row].concat());
}

#[test]
fn test_extract_window_entirely_right_of_source() {
    let mut stack = array_stack(10, 2, PixelFormat::I8, vec![7; 20]);
    stack.push_node(|src| Extract::new(src, 20, 0, 5, 2)).unwrap();
    assert_eq!(stack.get_all_data().unwrap(), vec![0; 10]);

    let mut stack = array_stack(4, 1, PixelFormat::Rgb161616, vec![0x55; 24]);
    stack.push_node(|src| Extract::new(src, 4, 0, 2, 1)).unwrap();
    assert_eq!(stack.get_all_data().unwrap(), vec![0; 12]);
}

#[test]
fn test_extract_one_bit_rows() {
    // 16 pixels, every other one set.
    let mut stack = array_stack(16, 1, PixelFormat::I1, vec![0xaa, 0xaa]);
    stack.push_node(|src| Extract::new(src, 1, 0, 8, 1)).unwrap();

    assert_eq!(stack.output_row_bytes().unwrap(), 1);
    assert_eq!(stack.get_all_data().unwrap(), vec![0x55]);
}

#[test]
fn test_scale_rows_same_width_is_identity() {
    let mut stack = array_stack(3, 2, PixelFormat::Rgb888, (0..18).collect());
    stack.push_node(|src| ScaleRows::new(src, 3)).unwrap();
    assert_eq!(stack.get_all_data().unwrap(), (0..18).collect::<Vec<u8>>());
}

#[test]
fn test_scale_rows_down_and_up() {
    let mut stack = array_stack(4, 1, PixelFormat::I8, vec![10, 20, 30, 40]);
    stack.push_node(|src| ScaleRows::new(src, 2)).unwrap();
    assert_eq!(stack.output_width().unwrap(), 2);
    // Source pixels are distributed over the output with a half-pixel phase.
    assert_eq!(stack.get_all_data().unwrap(), vec![10, 25]);

    let mut stack = array_stack(2, 1, PixelFormat::I8, vec![10, 20]);
    stack.push_node(|src| ScaleRows::new(src, 4)).unwrap();
    assert_eq!(stack.get_all_data().unwrap(), vec![10, 20, 20, 20]);
}

#[test]
fn test_scale_rows_16bit() {
    let mut stack = array_stack(2, 1, PixelFormat::I16, u16_bytes(&[1000, 3000]));
    stack.push_node(|src| ScaleRows::new(src, 1)).unwrap();
    assert_eq!(bytes_u16(&stack.get_all_data().unwrap()), vec![1000]);
}

// ---------------------------------------------------------------------------
// Calibration
// ---------------------------------------------------------------------------

#[test]
fn test_calibrate_8bit() {
    let bottom = [0x1000, 0x2000, 0x3000];
    let top = [0x3000, 0x4000, 0x5000];
    let mut stack = array_stack(1, 1, PixelFormat::Rgb888, vec![0x20, 0x38, 0x38]);
    stack
        .push_node(|src| Calibrate::new(src, &bottom, &top, 0))
        .unwrap();

    assert_eq!(stack.get_all_data().unwrap(), vec![0x80, 0xc1, 0x41]);
}

#[test]
fn test_calibrate_16bit() {
    let bottom = [0x1000, 0x2000, 0x3000];
    let top = [0x3000, 0x4000, 0x5000];
    let mut stack = array_stack(
        1,
        1,
        PixelFormat::Rgb161616,
        vec![0x00, 0x20, 0x00, 0x38, 0x00, 0x38],
    );
    stack
        .push_node(|src| Calibrate::new(src, &bottom, &top, 0))
        .unwrap();

    assert_eq!(
        stack.get_all_data().unwrap(),
        vec![0x00, 0x80, 0xff, 0xbf, 0x00, 0x40]
    );
}

#[test]
fn test_calibrate_own_white_reference_saturates() {
    let values: Vec<u8> = (1..=255).collect();
    let top: Vec<u16> = values.iter().map(|&v| u16::from(v) * 257).collect();
    let bottom = vec![0u16; top.len()];
    let mut stack = array_stack(values.len(), 1, PixelFormat::I8, values);
    stack
        .push_node(|src| Calibrate::new(src, &bottom, &top, 0))
        .unwrap();
    for (x, v) in stack.get_all_data().unwrap().into_iter().enumerate() {
        assert!(v >= 254, "pixel {x} came out as {v}");
    }

    let samples: Vec<u16> = (1..=60u16).map(|v| v * 1091).collect();
    let bottom = vec![0u16; samples.len()];
    let mut stack = array_stack(20, 1, PixelFormat::Rgb161616, u16_bytes(&samples));
    stack
        .push_node(|src| Calibrate::new(src, &bottom, &samples, 0))
        .unwrap();
    for (i, v) in bytes_u16(&stack.get_all_data().unwrap()).into_iter().enumerate() {
        assert!(v >= 65534, "sample {i} came out as {v}");
    }
}

#[test]
fn test_calibrate_without_reference_passes_through() {
    let mut stack = array_stack(3, 1, PixelFormat::I8, vec![1, 128, 255]);
    stack.push_node(|src| Calibrate::new(src, &[], &[], 0)).unwrap();
    assert_eq!(stack.get_all_data().unwrap(), vec![1, 128, 255]);
}

#[test]
fn test_calibrate_rejects_1bit() {
    let mut stack = array_stack(8, 1, PixelFormat::I1, vec![0]);
    assert!(stack.push_node(|src| Calibrate::new(src, &[], &[], 0)).is_err());
}
