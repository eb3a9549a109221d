use std::fmt;

/// Stage of a scan, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanStage {
    Booting,
    Programming,
    Reading,
    Finishing,
}

impl fmt::Display for ScanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Booting => write!(f, "Booting scanner"),
            Self::Programming => write!(f, "Programming registers"),
            Self::Reading => write!(f, "Reading lines"),
            Self::Finishing => write!(f, "Stopping scan"),
        }
    }
}
