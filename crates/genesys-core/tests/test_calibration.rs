mod common;

use common::{color_settings, gray_settings, open_builtin};
use genesys_core::command_set::CommandSet;
use genesys_core::error::{GenesysError, SaneStatus};
use genesys_core::model::ModelFlag;
use genesys_core::settings::{ScanFlag, ScanMethod};

/// Calibration strip width of the LiDE 90 at 300 dpi.
fn lide_90_calib_pixels() -> usize {
    (221.5f32 * 300.0 / 25.4) as usize
}

#[test]
fn test_lide_90_white_reference_from_uniform_strip() {
    let (mut dev, iface) = open_builtin("canon-lide-90");
    iface.borrow_mut().set_bulk_data(vec![0xc0u8; 1 << 20]);

    dev.calibrate(gray_settings(300, 100, 10)).unwrap();

    assert!(!dev.read_active);
    assert!(dev.pipeline_output().is_none());
    assert!(dev.calib_session.computed);
    assert_eq!(dev.calib_session.params.depth, 16);
    assert_eq!(dev.calib_session.params.channels, 1);
    assert!(dev.calib_session.params.flags.has(ScanFlag::DISABLE_SHADING));

    let pixels = lide_90_calib_pixels();
    assert_eq!(dev.white_average_data.len(), pixels);
    assert!(dev.white_average_data.iter().all(|&v| v == 0xc0c0));
    // The LiDE 90 black level is a constant.
    assert_eq!(dev.dark_average_data, vec![0x0101; pixels]);
}

#[test]
fn test_lide_90_calibrated_gray_scan_is_normalised() {
    let (mut dev, iface) = open_builtin("canon-lide-90");
    iface.borrow_mut().set_bulk_data(vec![0xc0u8; 1 << 20]);
    dev.calibrate(gray_settings(300, 100, 10)).unwrap();

    // Input at the white level saturates.
    iface.borrow_mut().set_bulk_data(vec![0xc0u8; 1000]);
    let image = dev.scan_image(gray_settings(300, 100, 10), |_, _| {}).unwrap();
    assert!(image.data().iter().all(|&v| v == 255));

    // Half the white level: (96 - 1) * 255 / (192 - 1) = 126.8
    iface.borrow_mut().set_bulk_data(vec![0x60u8; 1000]);
    let image = dev.scan_image(gray_settings(300, 100, 10), |_, _| {}).unwrap();
    assert!(image.data().iter().all(|&v| v == 127), "{:?}", &image.data()[..8]);
}

#[test]
fn test_lide_90_color_calibration_interleaves_channels() {
    let (mut dev, iface) = open_builtin("canon-lide-90");
    iface.borrow_mut().set_bulk_data(vec![0xc0u8; 1 << 20]);
    dev.calibrate(color_settings(300, 100, 10)).unwrap();

    assert_eq!(dev.calib_session.params.channels, 3);
    assert_eq!(dev.white_average_data.len(), 3 * lide_90_calib_pixels());
    assert!(dev.white_average_data.iter().all(|&v| v == 0xc0c0));

    iface.borrow_mut().set_bulk_data(vec![0xc0u8; 3000]);
    let image = dev.scan_image(color_settings(300, 100, 10), |_, _| {}).unwrap();
    assert_eq!(image.data().len(), 3000);
    assert!(image.data().iter().all(|&v| v == 255));
}

#[test]
fn test_dark_reference_is_scanned_when_model_asks_for_it() {
    let (mut dev, iface) = open_builtin("canon-lide-90");
    iface.borrow_mut().set_bulk_data(vec![0x20u8; 1 << 20]);
    dev.calibrate(gray_settings(300, 100, 10)).unwrap();
    let slept_constant = iface.borrow().slept_us();

    let (mut dev, iface) = open_builtin("canon-lide-90");
    dev.model.flags = ModelFlag::DARK_CALIBRATION | ModelFlag::DISABLE_FAST_FEEDING;
    iface.borrow_mut().set_bulk_data(vec![0x20u8; 1 << 20]);
    dev.calibrate(gray_settings(300, 100, 10)).unwrap();

    let pixels = lide_90_calib_pixels();
    assert_eq!(dev.dark_average_data, vec![0x2020; pixels]);
    assert_eq!(dev.white_average_data, vec![0x2020; pixels]);
    // The dark scan runs too, with settle time before both references.
    assert!(iface.borrow().slept_us() >= slept_constant + 700_000);
}

#[test]
fn test_dark_shading_session_turns_the_lamp_off() {
    let (mut dev, _iface) = open_builtin("canon-lide-90");
    dev.settings = gray_settings(300, 100, 10);
    let sensor = dev.find_sensor(300, 1, ScanMethod::Flatbed).unwrap().clone();
    let cmd = dev.cmd_set();

    let (_, dark) = cmd.calculate_shading_session(&dev, &sensor, true).unwrap();
    let (_, white) = cmd.calculate_shading_session(&dev, &sensor, false).unwrap();
    assert!(dark.params.flags.has(ScanFlag::DISABLE_LAMP));
    assert!(!white.params.flags.has(ScanFlag::DISABLE_LAMP));
    assert_eq!(white.params.lines, 23);
    assert_eq!(white.params.startx, 0);

    // A sheetfed scanner has no strip to park on, so its lamp stays lit.
    dev.model.is_sheetfed = true;
    let (_, dark) = cmd.calculate_shading_session(&dev, &sensor, true).unwrap();
    assert!(!dark.params.flags.has(ScanFlag::DISABLE_LAMP));
}

#[test]
fn test_lide_200_shading_session_uses_shading_resolution() {
    let (mut dev, _iface) = open_builtin("canon-lide-200");
    dev.settings = gray_settings(300, 100, 10);
    let sensor = dev.find_sensor(300, 1, ScanMethod::Flatbed).unwrap().clone();

    let (calib_sensor, session) = dev
        .cmd_set()
        .calculate_shading_session(&dev, &sensor, false)
        .unwrap();
    assert!(session.computed);
    assert_eq!(session.params.xres, 600);
    assert_eq!(session.params.depth, 16);
    assert_eq!(session.params.lines, 70);
    assert!((19..=20).contains(&session.params.starty));
    assert!(session.params.flags.has(ScanFlag::DISABLE_GAMMA));
    assert!(calib_sensor.resolutions.matches(&600));
}

#[test]
fn test_lide_200_host_calibration_is_unsupported() {
    let (mut dev, _iface) = open_builtin("canon-lide-200");
    match dev.calibrate(gray_settings(300, 100, 10)) {
        Err(GenesysError::Status { status, .. }) => assert_eq!(status, SaneStatus::Unsupported),
        other => panic!("expected Unsupported, got {other:?}"),
    }
    assert!(dev.white_average_data.is_empty());
    assert!(!dev.read_active);
}

#[test]
fn test_calibrate_while_scanning_is_busy() {
    let (mut dev, iface) = open_builtin("canon-lide-90");
    iface.borrow_mut().set_bulk_data(vec![0u8; 1000]);
    dev.start_scan(gray_settings(300, 100, 10)).unwrap();
    match dev.calibrate(gray_settings(300, 100, 10)) {
        Err(GenesysError::Status { status, .. }) => assert_eq!(status, SaneStatus::DeviceBusy),
        other => panic!("expected DeviceBusy, got {other:?}"),
    }
    dev.end_scan().unwrap();
}

#[test]
fn test_disabled_shading_calibration_is_skipped() {
    let (mut dev, iface) = open_builtin("canon-lide-90");
    dev.model.flags = ModelFlag::DISABLE_SHADING_CALIBRATION;
    dev.calibrate(gray_settings(300, 100, 10)).unwrap();
    assert!(dev.white_average_data.is_empty());
    assert_eq!(iface.borrow().bulk_bytes_read(), 0);
}
