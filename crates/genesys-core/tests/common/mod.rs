#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use genesys_core::device::Device;
use genesys_core::image::PixelFormat;
use genesys_core::interface::{SharedInterface, TestScannerInterface};
use genesys_core::pipeline::{ArraySource, ImagePipelineStack};
use genesys_core::registry::DeviceRegistry;
use genesys_core::settings::{ColorFilter, ScanColorMode, ScanMethod, Settings};

/// Build a stack whose first node serves `data` as a `width x height` image.
pub fn array_stack(width: usize, height: usize, format: PixelFormat, data: Vec<u8>) -> ImagePipelineStack {
    let mut stack = ImagePipelineStack::new();
    stack
        .push_first_node(ArraySource::new(width, height, format, data).unwrap())
        .unwrap();
    stack
}

/// Open a built-in model against an in-memory scanner and run cold init.
pub fn open_builtin(name: &str) -> (Device, Rc<RefCell<TestScannerInterface>>) {
    let registry = DeviceRegistry::builtin();
    let config = registry.find(name).unwrap();
    let iface = Rc::new(RefCell::new(TestScannerInterface::new(config.model.asic_type)));
    let shared: SharedInterface = iface.clone();

    let mut dev = Device::new(config, shared).unwrap();
    dev.init(true).unwrap();
    (dev, iface)
}

/// Flatbed gray request at the table origin.
pub fn gray_settings(xres: u32, pixels: u32, lines: u32) -> Settings {
    Settings {
        scan_method: ScanMethod::Flatbed,
        scan_mode: ScanColorMode::Gray,
        xres,
        yres: xres,
        tl_x: 0.0,
        tl_y: 0.0,
        lines,
        pixels,
        requested_pixels: pixels,
        depth: 8,
        color_filter: ColorFilter::Green,
        true_gray: false,
    }
}

/// Flatbed colour request at the table origin.
pub fn color_settings(xres: u32, pixels: u32, lines: u32) -> Settings {
    Settings {
        scan_mode: ScanColorMode::ColorSinglePass,
        color_filter: ColorFilter::None,
        ..gray_settings(xres, pixels, lines)
    }
}
