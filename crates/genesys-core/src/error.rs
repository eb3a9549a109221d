use std::fmt;

use thiserror::Error;

use crate::image::PixelFormat;

/// Status codes reported back to a SANE frontend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaneStatus {
    Good,
    Unsupported,
    Cancelled,
    DeviceBusy,
    Inval,
    Eof,
    Jammed,
    NoDocs,
    CoverOpen,
    IoError,
    NoMem,
    AccessDenied,
}

impl SaneStatus {
    /// Numeric value as defined by the SANE API.
    pub fn code(self) -> u32 {
        match self {
            Self::Good => 0,
            Self::Unsupported => 1,
            Self::Cancelled => 2,
            Self::DeviceBusy => 3,
            Self::Inval => 4,
            Self::Eof => 5,
            Self::Jammed => 6,
            Self::NoDocs => 7,
            Self::CoverOpen => 8,
            Self::IoError => 9,
            Self::NoMem => 10,
            Self::AccessDenied => 11,
        }
    }
}

impl fmt::Display for SaneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Good => "Success",
            Self::Unsupported => "Operation not supported",
            Self::Cancelled => "Operation was cancelled",
            Self::DeviceBusy => "Device busy",
            Self::Inval => "Invalid argument",
            Self::Eof => "End of file reached",
            Self::Jammed => "Document feeder jammed",
            Self::NoDocs => "Document feeder out of documents",
            Self::CoverOpen => "Scanner cover is open",
            Self::IoError => "Error during device I/O",
            Self::NoMem => "Out of memory",
            Self::AccessDenied => "Access to resource has been denied",
        };
        f.write_str(text)
    }
}

#[derive(Error, Debug)]
pub enum GenesysError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid registry: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Cannot serialize registry: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("{status}: {message}")]
    Status { status: SaneStatus, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unsupported pixel format: {0}")]
    UnsupportedFormat(PixelFormat),

    #[error("Scan session has not been computed")]
    SessionNotComputed,

    #[error("Pipeline construction error: {0}")]
    PipelineOrder(&'static str),

    #[error("Row index {index} out of range (height: {height})")]
    RowIndexOutOfRange { index: usize, height: usize },

    #[error("Row buffer is empty")]
    EmptyRowBuffer,

    #[error("Register {0:#06x} not found")]
    RegisterNotFound(u16),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GenesysError {
    /// Shorthand for a device-level failure carrying an explicit status.
    pub fn status(status: SaneStatus, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Shorthand for a generic invalid-argument failure.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// SANE status reported to the caller for this error.
    pub fn sane_status(&self) -> SaneStatus {
        match self {
            Self::Io(_) => SaneStatus::IoError,
            Self::Image(_) => SaneStatus::IoError,
            Self::Toml(_) | Self::TomlSerialize(_) | Self::Config(_) => SaneStatus::Inval,
            Self::Status { status, .. } => *status,
            Self::InvalidArgument(_)
            | Self::UnsupportedFormat(_)
            | Self::SessionNotComputed
            | Self::PipelineOrder(_)
            | Self::RowIndexOutOfRange { .. }
            | Self::EmptyRowBuffer
            | Self::RegisterNotFound(_) => SaneStatus::Inval,
        }
    }
}

pub type Result<T> = std::result::Result<T, GenesysError>;
