//! A scanner model bound to an interface: register state, current session and
//! the image pipeline that delivers the scanned rows.

use std::fmt;
use std::mem;
use std::path::PathBuf;
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::calibration::run_shading_calibration;
use crate::command_set::{create_command_set, CommandSet, FrontendSet, PipelineOutput};
use crate::error::{GenesysError, Result, SaneStatus};
use crate::frontend::Frontend;
use crate::image::{Image, ImageBuffer, PixelFormat};
use crate::interface::SharedInterface;
use crate::model::Model;
use crate::motor::Motor;
use crate::progress::ScanStage;
use crate::register::{RegisterSet, RegisterSettingSet};
use crate::registry::ModelConfig;
use crate::sensor::Sensor;
use crate::session::ScanSession;
use crate::settings::{ScanColorMode, ScanFlag, ScanMethod, Settings};

/// Scan head carriages a device may have.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanHeadId {
    Primary,
    /// Transparency adapter carriage.
    Secondary,
}

/// Frame layout reported to the frontend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameFormat {
    Gray,
    Rgb,
}

impl fmt::Display for FrameFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gray => write!(f, "Gray"),
            Self::Rgb => write!(f, "RGB"),
        }
    }
}

/// What the frontend receives for the current settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanParameters {
    pub format: FrameFormat,
    pub last_frame: bool,
    pub bytes_per_line: usize,
    pub pixels_per_line: usize,
    pub lines: usize,
    pub depth: u32,
}

pub struct Device {
    pub model: Model,
    pub sensors: Vec<Sensor>,
    pub motor: Motor,
    pub frontend: Frontend,
    pub frontend_initial: Frontend,
    pub gpo_regs: RegisterSettingSet<u8>,
    pub initial_regs: RegisterSettingSet<u8>,
    pub reg: RegisterSet,

    pub settings: Settings,
    pub session: ScanSession,
    /// Session of the last shading reference scan; the averages are laid out like it.
    pub calib_session: ScanSession,
    /// Segment readout order of the sensor in use.
    pub segment_order: Vec<usize>,
    pub dark_average_data: Vec<u16>,
    pub white_average_data: Vec<u16>,
    /// Skip the model's scan area offsets when positioning the head.
    pub ignore_offsets: bool,

    pub interface: SharedInterface,
    /// When set, every pipeline stage is dumped as a TIFF into this directory.
    pub debug_dump_dir: Option<PathBuf>,
    pub(crate) pipeline_index: u32,

    pub read_active: bool,
    pub total_bytes_read: u64,
    pub total_bytes_to_read: u64,

    cmd_set: Rc<dyn CommandSet>,
    pipeline_buffer: Option<ImageBuffer>,
    pipeline_output: Option<PipelineOutput>,
    head_pos_primary: Option<u32>,
    head_pos_secondary: Option<u32>,
}

impl Device {
    pub fn new(config: &ModelConfig, interface: SharedInterface) -> Result<Self> {
        let cmd_set = create_command_set(config.model.asic_type)?;
        Ok(Self {
            model: config.model.clone(),
            sensors: config.sensors.clone(),
            motor: config.motor.clone(),
            frontend: config.frontend.clone(),
            frontend_initial: config.frontend.clone(),
            gpo_regs: config.gpo_regs.clone(),
            initial_regs: config.initial_regs.clone(),
            reg: RegisterSet::new(),
            settings: Settings::default(),
            session: ScanSession::default(),
            calib_session: ScanSession::default(),
            segment_order: Vec::new(),
            dark_average_data: Vec::new(),
            white_average_data: Vec::new(),
            ignore_offsets: false,
            interface,
            debug_dump_dir: None,
            pipeline_index: 0,
            read_active: false,
            total_bytes_read: 0,
            total_bytes_to_read: 0,
            cmd_set,
            pipeline_buffer: None,
            pipeline_output: None,
            head_pos_primary: None,
            head_pos_secondary: None,
        })
    }

    pub fn cmd_set(&self) -> Rc<dyn CommandSet> {
        Rc::clone(&self.cmd_set)
    }

    /// Boot the ASIC, load the frontend and assume the heads are parked.
    pub fn init(&mut self, cold: bool) -> Result<()> {
        info!(model = %self.model.name, asic = %self.model.asic_type, cold, "Initializing device");
        let cmd = Rc::clone(&self.cmd_set);
        cmd.asic_boot(self, cold)?;

        let sensor = self.find_sensor_any()?.clone();
        cmd.set_fe(self, &sensor, FrontendSet::Init)?;

        self.set_head_pos_zero(ScanHeadId::Primary);
        self.set_head_pos_zero(ScanHeadId::Secondary);
        Ok(())
    }

    /// First sensor configuration matching the resolution, channel count and method.
    pub fn find_sensor(&self, xres: u32, channels: u32, method: ScanMethod) -> Result<&Sensor> {
        self.sensors
            .iter()
            .find(|s| s.matches(xres, channels, method))
            .ok_or_else(|| {
                GenesysError::invalid(format!(
                    "no sensor for {xres} dpi, {channels} channels, method {method} on {}",
                    self.model.name
                ))
            })
    }

    pub fn find_sensor_any(&self) -> Result<&Sensor> {
        self.sensors
            .first()
            .ok_or_else(|| GenesysError::Config(format!("{} has no sensors", self.model.name)))
    }

    /// Dark and white shading references applied by the host-side calibration node.
    pub fn set_calibration(&mut self, dark: Vec<u16>, white: Vec<u16>) {
        self.dark_average_data = dark;
        self.white_average_data = white;
    }

    /// Scan the shading references for `settings` so that the scans that
    /// follow with the same resolution and mode come out flat.
    pub fn calibrate(&mut self, settings: Settings) -> Result<()> {
        if self.read_active {
            return Err(GenesysError::status(SaneStatus::DeviceBusy, "a scan is already running"));
        }
        let sensor = self
            .find_sensor(settings.xres, settings.channels(), settings.scan_method)?
            .clone();
        self.settings = settings;
        info!(model = %self.model.name, xres = self.settings.xres, "Calibrating shading");
        run_shading_calibration(self, &sensor)
    }

    // -----------------------------------------------------------------------
    // Head position tracking
    // -----------------------------------------------------------------------

    pub fn is_head_pos_known(&self, head: ScanHeadId) -> bool {
        match head {
            ScanHeadId::Primary => self.head_pos_primary.is_some(),
            ScanHeadId::Secondary => self.head_pos_secondary.is_some(),
        }
    }

    pub fn head_pos(&self, head: ScanHeadId) -> Result<u32> {
        let pos = match head {
            ScanHeadId::Primary => self.head_pos_primary,
            ScanHeadId::Secondary => self.head_pos_secondary,
        };
        pos.ok_or_else(|| GenesysError::invalid(format!("position of {head:?} head is not known")))
    }

    pub fn set_head_pos_unknown(&mut self, head: ScanHeadId) {
        match head {
            ScanHeadId::Primary => self.head_pos_primary = None,
            ScanHeadId::Secondary => self.head_pos_secondary = None,
        }
    }

    pub fn set_head_pos_zero(&mut self, head: ScanHeadId) {
        match head {
            ScanHeadId::Primary => self.head_pos_primary = Some(0),
            ScanHeadId::Secondary => self.head_pos_secondary = Some(0),
        }
    }

    /// Move the tracked head position by the distance the current session travels.
    pub fn advance_head_pos_by_session(&mut self, head: ScanHeadId) -> Result<()> {
        let params = &self.session.params;
        if params.yres == 0 {
            return Err(GenesysError::invalid("session has no vertical resolution"));
        }
        let steps = u64::from(params.starty)
            + u64::from(params.lines) * u64::from(self.motor.base_ydpi) / u64::from(params.yres);
        let backward = params.flags.has(ScanFlag::REVERSE);
        self.advance_head_pos_by_steps(head, backward, steps as u32)
    }

    pub fn advance_head_pos_by_steps(&mut self, head: ScanHeadId, backward: bool, steps: u32) -> Result<()> {
        let pos = match head {
            ScanHeadId::Primary => &mut self.head_pos_primary,
            ScanHeadId::Secondary => &mut self.head_pos_secondary,
        };
        let current = pos.ok_or_else(|| {
            GenesysError::invalid(format!("trying to advance {head:?} head while its position is unknown"))
        })?;
        let next = if backward {
            current.checked_sub(steps).ok_or_else(|| {
                GenesysError::invalid(format!(
                    "trying to move {head:?} head {steps} steps back from position {current}"
                ))
            })?
        } else {
            current + steps
        };
        *pos = Some(next);
        debug!(?head, from = current, to = next, "Head position");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Scanning
    // -----------------------------------------------------------------------

    pub(crate) fn clear_pipeline(&mut self) {
        self.pipeline_buffer = None;
        self.pipeline_output = None;
    }

    pub(crate) fn set_pipeline(&mut self, buffer: ImageBuffer, output: PipelineOutput) {
        self.pipeline_buffer = Some(buffer);
        self.pipeline_output = Some(output);
    }

    /// Geometry of the rows the active pipeline produces.
    pub fn pipeline_output(&self) -> Option<PipelineOutput> {
        self.pipeline_output
    }

    /// Compute the session for `settings`, program the scanner and start the scan.
    pub fn start_scan(&mut self, settings: Settings) -> Result<()> {
        if self.read_active {
            return Err(GenesysError::status(SaneStatus::DeviceBusy, "a scan is already running"));
        }
        let sensor = self
            .find_sensor(settings.xres, settings.channels(), settings.scan_method)?
            .clone();
        self.settings = settings;

        let cmd = Rc::clone(&self.cmd_set);
        let session = cmd.calculate_scan_session(self, &sensor, &self.settings)?;
        info!(
            xres = session.params.xres,
            yres = session.params.yres,
            pixels = session.output_pixels,
            lines = session.params.lines,
            "Starting scan"
        );
        debug!("{session}");

        let mut regs = mem::take(&mut self.reg);
        let result = self.program_and_begin(cmd.as_ref(), &sensor, &mut regs, &session);
        self.reg = regs;
        if result.is_err() {
            self.read_active = false;
            self.clear_pipeline();
        }
        result
    }

    fn program_and_begin(
        &mut self,
        cmd: &dyn CommandSet,
        sensor: &Sensor,
        regs: &mut RegisterSet,
        session: &ScanSession,
    ) -> Result<()> {
        cmd.init_regs_for_scan_session(self, sensor, regs, session)?;
        self.interface.borrow_mut().write_registers(regs)?;
        cmd.begin_scan(self, sensor, regs, true)
    }

    /// Copy up to `out.len()` bytes of the scanned image into `out`.
    ///
    /// Returns the number of bytes written; 0 once the whole image was read.
    pub fn read(&mut self, out: &mut [u8]) -> Result<usize> {
        if !self.read_active {
            return Err(GenesysError::status(SaneStatus::Inval, "no scan in progress"));
        }
        let remaining = self.total_bytes_to_read.saturating_sub(self.total_bytes_read);
        if remaining == 0 {
            return Ok(0);
        }
        let len = out.len().min(remaining as usize);
        let buffer = self
            .pipeline_buffer
            .as_mut()
            .ok_or(GenesysError::PipelineOrder("the image pipeline was not set up"))?;
        if !buffer.get_data(&mut out[..len])? {
            warn!(
                read = self.total_bytes_read,
                expected = self.total_bytes_to_read,
                "Pipeline ran out of data"
            );
            return Err(GenesysError::status(SaneStatus::IoError, "pipeline ran out of data"));
        }
        self.total_bytes_read += len as u64;
        Ok(len)
    }

    /// Stop the scan and drop the pipeline.
    pub fn end_scan(&mut self) -> Result<()> {
        let cmd = Rc::clone(&self.cmd_set);
        let mut regs = mem::take(&mut self.reg);
        let result = cmd.end_scan(self, &mut regs, true);
        self.reg = regs;
        self.clear_pipeline();
        self.read_active = false;
        info!(bytes = self.total_bytes_read, "Scan finished");
        result
    }

    /// Frame parameters for the current settings.
    pub fn parameters(&self) -> ScanParameters {
        let settings = &self.settings;
        let channels = settings.channels() as usize;
        let depth = settings.depth;
        let pixels = if settings.requested_pixels != 0 {
            settings.requested_pixels
        } else {
            settings.pixels
        } as usize;

        let bytes_per_line = if depth == 1 {
            pixels.div_ceil(8) * channels
        } else {
            pixels * channels * (depth as usize / 8)
        };
        let format = if settings.scan_mode == ScanColorMode::ColorSinglePass {
            FrameFormat::Rgb
        } else {
            FrameFormat::Gray
        };

        ScanParameters {
            format,
            last_frame: true,
            bytes_per_line,
            pixels_per_line: pixels,
            lines: settings.lines as usize,
            depth,
        }
    }

    /// Run a complete scan and collect the rows into an image.
    ///
    /// `progress` is called with the current stage and the fraction done.
    pub fn scan_image(
        &mut self,
        settings: Settings,
        mut progress: impl FnMut(ScanStage, f32),
    ) -> Result<Image> {
        progress(ScanStage::Programming, 0.0);
        self.start_scan(settings)?;

        let params = self.parameters();
        let format = match (params.format, params.depth) {
            (FrameFormat::Gray, 8) => PixelFormat::I8,
            (FrameFormat::Gray, 16) => PixelFormat::I16,
            (FrameFormat::Rgb, 8) => PixelFormat::Rgb888,
            (FrameFormat::Rgb, 16) => PixelFormat::Rgb161616,
            (_, depth) => {
                self.end_scan()?;
                return Err(GenesysError::invalid(format!("cannot collect {depth}-bit frames")));
            }
        };

        let mut image = Image::new(params.pixels_per_line, params.lines, format);
        let read_result = (0..params.lines).try_for_each(|y| {
            let row = image.get_row_mut(y);
            let mut filled = 0;
            while filled < row.len() {
                let n = self.read(&mut row[filled..])?;
                if n == 0 {
                    return Err(GenesysError::status(SaneStatus::Eof, "scan ended early"));
                }
                filled += n;
            }
            progress(ScanStage::Reading, (y + 1) as f32 / params.lines as f32);
            Ok(())
        });

        progress(ScanStage::Finishing, 1.0);
        let end_result = self.end_scan();
        read_result?;
        end_result?;
        Ok(image)
    }
}
