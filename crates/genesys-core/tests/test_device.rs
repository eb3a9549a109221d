mod common;

use common::{color_settings, gray_settings, open_builtin};
use genesys_core::device::{FrameFormat, ScanHeadId};
use genesys_core::error::{GenesysError, SaneStatus};
use genesys_core::image::PixelFormat;
use genesys_core::progress::ScanStage;

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[test]
fn test_init_parks_head_at_zero() {
    let (dev, _iface) = open_builtin("canon-lide-90");
    assert_eq!(dev.head_pos(ScanHeadId::Primary).unwrap(), 0);
    assert!(!dev.read_active);
}

#[test]
fn test_lide_90_gray_scan_passes_data_through() {
    let (mut dev, iface) = open_builtin("canon-lide-90");
    let data = pattern(1000);
    iface.borrow_mut().set_bulk_data(data.clone());

    let mut stages = Vec::new();
    let image = dev
        .scan_image(gray_settings(300, 100, 10), |stage, _| {
            if stages.last() != Some(&stage) {
                stages.push(stage);
            }
        })
        .unwrap();

    assert_eq!(image.width(), 100);
    assert_eq!(image.height(), 10);
    assert_eq!(image.format(), PixelFormat::I8);
    assert_eq!(image.data(), &data[..]);
    assert_eq!(
        stages,
        vec![ScanStage::Programming, ScanStage::Reading, ScanStage::Finishing]
    );

    assert!(!dev.read_active);
    assert_eq!(dev.total_bytes_read, 1000);
    assert_eq!(dev.head_pos(ScanHeadId::Primary).unwrap(), 465);

    let iface = iface.borrow();
    assert_eq!(iface.bulk_bytes_read(), 1000);
    assert_eq!(iface.cached_regs().get(0x6c).unwrap(), 0x38);
    let tables = iface.recorded_slope_tables();
    for table_nr in 0..5 {
        assert!(tables.contains_key(&table_nr), "slope table {table_nr} not sent");
    }
}

#[test]
fn test_lide_90_color_scan_merges_lines() {
    let (mut dev, iface) = open_builtin("canon-lide-90");
    let data = pattern(3000);
    iface.borrow_mut().set_bulk_data(data.clone());

    dev.start_scan(color_settings(300, 100, 10)).unwrap();
    let output = dev.pipeline_output().unwrap();
    assert_eq!(output.format, PixelFormat::Rgb888);
    assert_eq!(output.width, 100);
    assert_eq!(output.height, 10);
    assert_eq!(output.row_bytes, 300);
    assert_eq!(dev.total_bytes_to_read, 3000);

    let mut row = vec![0u8; 300];
    let mut filled = 0;
    while filled < row.len() {
        filled += dev.read(&mut row[filled..]).unwrap();
    }
    // Row 0 is built from raw lines 0 (red), 1 (green) and 2 (blue).
    for x in 0..100 {
        assert_eq!(row[x * 3], data[x]);
        assert_eq!(row[x * 3 + 1], data[100 + x]);
        assert_eq!(row[x * 3 + 2], data[200 + x]);
    }
    dev.end_scan().unwrap();
}

#[test]
fn test_parameters_follow_settings() {
    let (mut dev, iface) = open_builtin("canon-lide-90");
    iface.borrow_mut().set_bulk_data(pattern(1000));
    dev.start_scan(gray_settings(300, 100, 10)).unwrap();

    let params = dev.parameters();
    assert_eq!(params.format, FrameFormat::Gray);
    assert!(params.last_frame);
    assert_eq!(params.bytes_per_line, 100);
    assert_eq!(params.pixels_per_line, 100);
    assert_eq!(params.lines, 10);
    assert_eq!(params.depth, 8);

    dev.end_scan().unwrap();
}

#[test]
fn test_read_in_chunks_until_done() {
    let (mut dev, iface) = open_builtin("canon-lide-90");
    let data = pattern(1000);
    iface.borrow_mut().set_bulk_data(data.clone());
    dev.start_scan(gray_settings(300, 100, 10)).unwrap();

    let mut collected = Vec::new();
    let mut chunk = [0u8; 256];
    loop {
        let n = dev.read(&mut chunk).unwrap();
        if n == 0 {
            break;
        }
        collected.extend_from_slice(&chunk[..n]);
    }
    assert_eq!(collected, data);
    assert_eq!(dev.read(&mut chunk).unwrap(), 0);

    dev.end_scan().unwrap();
    assert!(dev.pipeline_output().is_none());
}

#[test]
fn test_read_past_pipeline_end_is_io_error() {
    let (mut dev, iface) = open_builtin("canon-lide-90");
    let data = pattern(1000);
    iface.borrow_mut().set_bulk_data(data.clone());
    dev.start_scan(gray_settings(300, 100, 10)).unwrap();
    // Expect more than the pipeline's 10 rows can deliver.
    dev.total_bytes_to_read = 1500;

    let mut row = [0xaau8; 100];
    for y in 0..10 {
        assert_eq!(dev.read(&mut row).unwrap(), 100);
        assert_eq!(&row[..], &data[y * 100..(y + 1) * 100]);
    }
    assert_eq!(dev.total_bytes_read, 1000);

    match dev.read(&mut row) {
        Err(GenesysError::Status { status, .. }) => assert_eq!(status, SaneStatus::IoError),
        other => panic!("expected IoError, got {other:?}"),
    }
    // Nothing was delivered, so nothing is counted.
    assert_eq!(dev.total_bytes_read, 1000);
    dev.end_scan().unwrap();
}

#[test]
fn test_second_start_is_busy() {
    let (mut dev, iface) = open_builtin("canon-lide-90");
    iface.borrow_mut().set_bulk_data(pattern(1000));
    dev.start_scan(gray_settings(300, 100, 10)).unwrap();

    match dev.start_scan(gray_settings(300, 100, 10)) {
        Err(GenesysError::Status { status, .. }) => assert_eq!(status, SaneStatus::DeviceBusy),
        other => panic!("expected DeviceBusy, got {other:?}"),
    }
    assert!(dev.read_active);
    dev.end_scan().unwrap();
}

#[test]
fn test_read_without_scan_is_invalid() {
    let (mut dev, _iface) = open_builtin("canon-lide-90");
    let mut out = [0u8; 16];
    match dev.read(&mut out) {
        Err(GenesysError::Status { status, .. }) => assert_eq!(status, SaneStatus::Inval),
        other => panic!("expected Inval, got {other:?}"),
    }
}

#[test]
fn test_unsupported_resolution_has_no_sensor() {
    let (mut dev, _iface) = open_builtin("canon-lide-90");
    assert!(dev.start_scan(gray_settings(450, 100, 10)).is_err());
    assert!(!dev.read_active);
}
