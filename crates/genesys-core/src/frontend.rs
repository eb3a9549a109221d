//! Analog frontend (AFE) description: register values and where offset and
//! gain live for each colour channel.

use serde::{Deserialize, Serialize};

use crate::register::RegisterSettingSet;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrontendType {
    #[default]
    Unknown,
    Wolfson,
    AnalogDevices,
    CanonLide80,
    WolfsonGl841,
    WolfsonGl846,
    AnalogDevicesGl847,
    WolfsonGl124,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontendLayout {
    #[serde(rename = "type")]
    pub frontend_type: FrontendType,
    pub offset_addr: [u16; 3],
    pub gain_addr: [u16; 3],
}

impl FrontendLayout {
    pub fn wolfson() -> Self {
        Self {
            frontend_type: FrontendType::Wolfson,
            offset_addr: [0x20, 0x21, 0x22],
            gain_addr: [0x28, 0x29, 0x2a],
        }
    }

    pub fn analog_devices() -> Self {
        Self {
            frontend_type: FrontendType::AnalogDevices,
            offset_addr: [0x05, 0x06, 0x07],
            gain_addr: [0x02, 0x03, 0x04],
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frontend {
    pub id: String,
    #[serde(default)]
    pub regs: RegisterSettingSet<u16>,
    #[serde(default)]
    pub reg2: [u16; 3],
    #[serde(default)]
    pub layout: FrontendLayout,
}

impl Frontend {
    pub fn set_offset(&mut self, which: usize, value: u16) {
        self.regs.set_value(self.layout.offset_addr[which], value);
    }

    pub fn set_gain(&mut self, which: usize, value: u16) {
        self.regs.set_value(self.layout.gain_addr[which], value);
    }

    /// Offset of channel `which`, 0 when the frontend does not carry it.
    pub fn get_offset(&self, which: usize) -> u16 {
        self.regs.get_value(self.layout.offset_addr[which]).unwrap_or(0)
    }

    pub fn get_gain(&self, which: usize) -> u16 {
        self.regs.get_value(self.layout.gain_addr[which]).unwrap_or(0)
    }
}
