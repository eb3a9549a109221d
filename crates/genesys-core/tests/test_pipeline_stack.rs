mod common;

use std::cell::Cell;
use std::rc::Rc;

use common::array_stack;
use genesys_core::error::GenesysError;
use genesys_core::image::buffer::ProducerCallback;
use genesys_core::image::tiff::{save_image, write_tiff_image};
use genesys_core::image::{Image, Pixel, PixelFormat};
use genesys_core::pipeline::{
    ArraySource, CallableSource, DebugDump, FormatConvert, ImagePipelineStack, ImageSource, Invert,
    MergeMonoLines,
};

// ---------------------------------------------------------------------------
// Stack bookkeeping
// ---------------------------------------------------------------------------

#[test]
fn test_empty_stack_reports_order_errors() {
    let mut stack = ImagePipelineStack::new();
    assert!(stack.is_empty());
    assert_eq!(stack.node_count(), 0);
    assert!(stack.eof());

    assert!(matches!(stack.output_width(), Err(GenesysError::PipelineOrder(_))));
    assert!(matches!(stack.input_format(), Err(GenesysError::PipelineOrder(_))));
    assert!(matches!(
        stack.push_node(Invert::new),
        Err(GenesysError::PipelineOrder(_))
    ));
    let mut row = [0u8; 4];
    assert!(stack.get_next_row_data(&mut row).is_err());
}

#[test]
fn test_second_first_node_is_rejected() {
    let mut stack = array_stack(2, 1, PixelFormat::I8, vec![1, 2]);
    let again = ArraySource::new(2, 1, PixelFormat::I8, vec![3, 4]).unwrap();
    assert!(matches!(
        stack.push_first_node(again),
        Err(GenesysError::PipelineOrder(_))
    ));
    // The original chain is untouched.
    assert_eq!(stack.get_all_data().unwrap(), vec![1, 2]);
}

#[test]
fn test_input_and_output_geometry() {
    let mut stack = array_stack(4, 3, PixelFormat::I8, vec![0; 12]);
    stack
        .push_node(|src| MergeMonoLines::new(src, Default::default()))
        .unwrap();
    stack
        .push_node(|src| FormatConvert::new(src, PixelFormat::Rgb161616))
        .unwrap();

    assert_eq!(stack.node_count(), 3);
    assert_eq!(stack.input_width().unwrap(), 4);
    assert_eq!(stack.input_height().unwrap(), 3);
    assert_eq!(stack.input_format().unwrap(), PixelFormat::I8);
    assert_eq!(stack.input_row_bytes().unwrap(), 4);
    assert_eq!(stack.output_width().unwrap(), 4);
    assert_eq!(stack.output_height().unwrap(), 1);
    assert_eq!(stack.output_format().unwrap(), PixelFormat::Rgb161616);
    assert_eq!(stack.output_row_bytes().unwrap(), 24);
    assert_eq!(stack.output_node().map(|n| n.name()), Some("FormatConvert"));

    stack.clear();
    assert!(stack.is_empty());
    assert!(stack.input_width().is_err());
}

#[test]
fn test_short_output_buffer_is_rejected() {
    let mut stack = array_stack(4, 1, PixelFormat::I8, vec![0; 4]);
    let mut row = [0u8; 3];
    assert!(matches!(
        stack.get_next_row_data(&mut row),
        Err(GenesysError::InvalidArgument(_))
    ));
}

#[test]
fn test_array_source_too_small() {
    assert!(ArraySource::new(4, 2, PixelFormat::Rgb888, vec![0; 23]).is_err());
}

#[test]
fn test_array_source_eof_after_last_row() {
    let mut stack = array_stack(2, 1, PixelFormat::I8, vec![7, 8]);
    let mut row = [0u8; 2];
    assert!(stack.get_next_row_data(&mut row).unwrap());
    assert!(!stack.eof());
    assert!(!stack.get_next_row_data(&mut row).unwrap());
    assert!(stack.eof());
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

#[test]
fn test_callable_source_one_row_per_call() {
    let calls = Rc::new(Cell::new(0u8));
    let counter = Rc::clone(&calls);
    let producer: ProducerCallback = Box::new(move |row: &mut [u8]| {
        let n = counter.get();
        row.fill(n);
        counter.set(n + 1);
        Ok(n < 2)
    });

    let mut stack = ImagePipelineStack::new();
    stack
        .push_first_node(CallableSource::new(3, 2, PixelFormat::I8, producer))
        .unwrap();

    assert_eq!(stack.get_all_data().unwrap(), vec![0, 0, 0, 1, 1, 1]);
    assert_eq!(calls.get(), 2);
    assert!(!stack.eof());

    let mut row = [0u8; 3];
    assert!(!stack.get_next_row_data(&mut row).unwrap());
    assert!(stack.eof());
}

#[test]
fn test_image_source_round_trip() {
    let mut image = Image::new(2, 2, PixelFormat::Rgb888);
    image.set_pixel(0, 0, Pixel::new(0xff00, 0, 0));
    image.set_pixel(1, 1, Pixel::new(0, 0, 0xff00));

    let mut stack = ImagePipelineStack::new();
    stack.push_first_node(ImageSource::new(image.clone())).unwrap();
    let out = stack.get_image().unwrap();

    assert_eq!(out.width(), 2);
    assert_eq!(out.height(), 2);
    assert_eq!(out.data(), image.data());
    assert!(stack.eof());
}

#[test]
fn test_get_image_applies_chain() {
    let mut stack = array_stack(2, 2, PixelFormat::I8, vec![0, 10, 20, 255]);
    stack.push_node(Invert::new).unwrap();

    let image = stack.get_image().unwrap();
    assert_eq!(image.format(), PixelFormat::I8);
    assert_eq!(image.get_row(0), &[255, 245]);
    assert_eq!(image.get_row(1), &[235, 0]);
}

// ---------------------------------------------------------------------------
// Debug dumps and image files
// ---------------------------------------------------------------------------

#[test]
fn test_debug_dump_writes_tiff_on_drop() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stage.tiff");

    let mut stack = array_stack(4, 2, PixelFormat::I8, (10..18).collect());
    let dump_path = path.clone();
    stack
        .push_node(|src| Ok(DebugDump::new(src, dump_path)))
        .unwrap();

    // Rows pass through unchanged.
    assert_eq!(stack.get_all_data().unwrap(), (10..18).collect::<Vec<u8>>());
    assert!(!path.exists());

    stack.clear();
    assert!(path.exists());

    let written = image::open(&path).unwrap().to_luma8();
    assert_eq!(written.dimensions(), (4, 2));
    assert_eq!(written.into_raw(), (10..18).collect::<Vec<u8>>());
}

#[test]
fn test_debug_dump_without_rows_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("unused.tiff");

    let mut stack = array_stack(4, 2, PixelFormat::I8, vec![0; 8]);
    let dump_path = path.clone();
    stack
        .push_node(|src| Ok(DebugDump::new(src, dump_path)))
        .unwrap();
    drop(stack);

    assert!(!path.exists());
}

#[test]
fn test_write_tiff_image_reorders_bgr() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bgr.tiff");

    let image = Image::from_data(1, 1, PixelFormat::Bgr888, vec![0x30, 0x20, 0x10]).unwrap();
    write_tiff_image(&path, &image).unwrap();

    let written = image::open(&path).unwrap().to_rgb8();
    assert_eq!(written.into_raw(), vec![0x10, 0x20, 0x30]);
}

#[test]
fn test_save_image_png_16bit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gray16.png");

    let image = Image::from_data(2, 1, PixelFormat::I16, vec![0x34, 0x12, 0xff, 0xff]).unwrap();
    save_image(&path, &image).unwrap();

    let written = image::open(&path).unwrap().to_luma16();
    assert_eq!(written.into_raw(), vec![0x1234, 0xffff]);
}
