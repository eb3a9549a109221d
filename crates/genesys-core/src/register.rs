//! Register files of the scanner ASIC and per-model register overrides.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GenesysError, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Register<T> {
    pub address: u16,
    pub value: T,
}

impl<T: fmt::LowerHex> fmt::Display for Register<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x} = {:#04x}", self.address, self.value)
    }
}

/// Registers keyed by address.
///
/// Kept sorted by address so that lookups are a binary search. In sequential
/// mode the insertion order is preserved instead, which is what some register
/// write sequences need.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "Vec<Register<T>>",
    into = "Vec<Register<T>>",
    bound(serialize = "T: Clone + Serialize", deserialize = "T: Deserialize<'de>")
)]
pub struct RegisterContainer<T> {
    sorted: bool,
    registers: Vec<Register<T>>,
}

impl<T> From<Vec<Register<T>>> for RegisterContainer<T> {
    fn from(mut registers: Vec<Register<T>>) -> Self {
        registers.sort_by_key(|r| r.address);
        Self {
            sorted: true,
            registers,
        }
    }
}

impl<T> From<RegisterContainer<T>> for Vec<Register<T>> {
    fn from(container: RegisterContainer<T>) -> Self {
        container.registers
    }
}

impl<T: Copy> RegisterContainer<T> {
    pub fn new() -> Self {
        Self {
            sorted: true,
            registers: Vec::new(),
        }
    }

    pub fn sequential() -> Self {
        Self {
            sorted: false,
            registers: Vec::new(),
        }
    }

    /// Set `address` to `value`, adding the register if it does not exist yet.
    pub fn init_reg(&mut self, address: u16, value: T) {
        if let Some(i) = self.find_reg_index(address) {
            self.registers[i].value = value;
            return;
        }
        let reg = Register { address, value };
        if self.sorted {
            let pos = self.registers.partition_point(|r| r.address < address);
            self.registers.insert(pos, reg);
        } else {
            self.registers.push(reg);
        }
    }

    pub fn has_reg(&self, address: u16) -> bool {
        self.find_reg_index(address).is_some()
    }

    pub fn remove_reg(&mut self, address: u16) -> Result<()> {
        let i = self
            .find_reg_index(address)
            .ok_or(GenesysError::RegisterNotFound(address))?;
        self.registers.remove(i);
        Ok(())
    }

    pub fn find_reg(&self, address: u16) -> Result<&Register<T>> {
        self.find_reg_index(address)
            .map(|i| &self.registers[i])
            .ok_or(GenesysError::RegisterNotFound(address))
    }

    pub fn find_reg_mut(&mut self, address: u16) -> Result<&mut Register<T>> {
        let i = self
            .find_reg_index(address)
            .ok_or(GenesysError::RegisterNotFound(address))?;
        Ok(&mut self.registers[i])
    }

    /// Update an existing register.
    pub fn set(&mut self, address: u16, value: T) -> Result<()> {
        self.find_reg_mut(address)?.value = value;
        Ok(())
    }

    pub fn get(&self, address: u16) -> Result<T> {
        Ok(self.find_reg(address)?.value)
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    pub fn clear(&mut self) {
        self.registers.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Register<T>> {
        self.registers.iter()
    }

    fn find_reg_index(&self, address: u16) -> Option<usize> {
        if self.sorted {
            self.registers.binary_search_by_key(&address, |r| r.address).ok()
        } else {
            self.registers.iter().position(|r| r.address == address)
        }
    }
}

impl<'a, T> IntoIterator for &'a RegisterContainer<T> {
    type Item = &'a Register<T>;
    type IntoIter = std::slice::Iter<'a, Register<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.registers.iter()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorMode {
    #[default]
    Primary,
    PrimaryAndSecondary,
    Secondary,
}

/// Side effects of the last register programming that later stages need to know about.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegisterState {
    pub is_lamp_on: bool,
    pub is_xpa_on: bool,
    pub is_motor_on: bool,
    pub motor_mode: MotorMode,
}

/// The 8-bit register file of the ASIC plus the derived state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterSet {
    registers: RegisterContainer<u8>,
    pub state: RegisterState,
}

impl RegisterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_container(registers: RegisterContainer<u8>) -> Self {
        Self {
            registers,
            state: RegisterState::default(),
        }
    }

    pub fn init_reg(&mut self, address: u16, value: u8) {
        self.registers.init_reg(address, value);
    }

    pub fn has_reg(&self, address: u16) -> bool {
        self.registers.has_reg(address)
    }

    pub fn remove_reg(&mut self, address: u16) -> Result<()> {
        self.registers.remove_reg(address)
    }

    pub fn find_reg(&self, address: u16) -> Result<&Register<u8>> {
        self.registers.find_reg(address)
    }

    pub fn find_reg_mut(&mut self, address: u16) -> Result<&mut Register<u8>> {
        self.registers.find_reg_mut(address)
    }

    pub fn get8(&self, address: u16) -> Result<u8> {
        self.registers.get(address)
    }

    pub fn set8(&mut self, address: u16, value: u8) -> Result<()> {
        self.registers.set(address, value)
    }

    /// Replace only the bits selected by `mask`.
    pub fn set8_mask(&mut self, address: u16, value: u8, mask: u8) -> Result<()> {
        let reg = self.registers.find_reg_mut(address)?;
        reg.value = (reg.value & !mask) | value;
        Ok(())
    }

    /// Store `value` big-endian in `address` and `address + 1`.
    pub fn set16(&mut self, address: u16, value: u16) -> Result<()> {
        let [hi, lo] = value.to_be_bytes();
        self.set8(address, hi)?;
        self.set8(address + 1, lo)
    }

    /// Store the low 24 bits of `value` big-endian in three consecutive registers.
    pub fn set24(&mut self, address: u16, value: u32) -> Result<()> {
        let [_, b2, b1, b0] = value.to_be_bytes();
        self.set8(address, b2)?;
        self.set8(address + 1, b1)?;
        self.set8(address + 2, b0)
    }

    pub fn get16(&self, address: u16) -> Result<u16> {
        Ok(u16::from_be_bytes([self.get8(address)?, self.get8(address + 1)?]))
    }

    pub fn get24(&self, address: u16) -> Result<u32> {
        Ok(u32::from_be_bytes([
            0,
            self.get8(address)?,
            self.get8(address + 1)?,
            self.get8(address + 2)?,
        ]))
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Register<u8>> {
        self.registers.iter()
    }

    pub fn registers(&self) -> &RegisterContainer<u8> {
        &self.registers
    }
}

impl fmt::Display for RegisterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "RegisterSet {{")?;
        for reg in self.iter() {
            writeln!(f, "    {reg}")?;
        }
        write!(f, "}}")
    }
}

fn default_mask() -> u16 {
    0xff
}

/// A value to write into a register, limited to the bits in `mask`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterSetting<T> {
    pub address: u16,
    pub value: T,
    #[serde(default = "default_mask")]
    pub mask: u16,
}

impl<T> RegisterSetting<T> {
    pub fn new(address: u16, value: T) -> Self {
        Self {
            address,
            value,
            mask: 0xff,
        }
    }

    pub fn with_mask(address: u16, value: T, mask: u16) -> Self {
        Self {
            address,
            value,
            mask,
        }
    }
}

/// Ordered list of register settings, applied in the order they appear.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegisterSettingSet<T> {
    regs: Vec<RegisterSetting<T>>,
}

impl<T: Copy> RegisterSettingSet<T> {
    pub fn new() -> Self {
        Self { regs: Vec::new() }
    }

    pub fn push(&mut self, setting: RegisterSetting<T>) {
        self.regs.push(setting);
    }

    pub fn has_reg(&self, address: u16) -> bool {
        self.find_reg_index(address).is_some()
    }

    pub fn find_reg(&self, address: u16) -> Result<&RegisterSetting<T>> {
        self.find_reg_index(address)
            .map(|i| &self.regs[i])
            .ok_or(GenesysError::RegisterNotFound(address))
    }

    pub fn get_value(&self, address: u16) -> Result<T> {
        Ok(self.find_reg(address)?.value)
    }

    /// Update the value of an existing setting or append a new one.
    pub fn set_value(&mut self, address: u16, value: T) {
        match self.find_reg_index(address) {
            Some(i) => self.regs[i].value = value,
            None => self.regs.push(RegisterSetting::new(address, value)),
        }
    }

    /// Apply every setting of `other` on top of this set.
    pub fn merge(&mut self, other: &RegisterSettingSet<T>) {
        for reg in &other.regs {
            self.set_value(reg.address, reg.value);
        }
    }

    pub fn len(&self) -> usize {
        self.regs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RegisterSetting<T>> {
        self.regs.iter()
    }

    fn find_reg_index(&self, address: u16) -> Option<usize> {
        self.regs.iter().position(|r| r.address == address)
    }
}

impl<T> FromIterator<(u16, T)> for RegisterSettingSet<T> {
    fn from_iter<I: IntoIterator<Item = (u16, T)>>(iter: I) -> Self {
        Self {
            regs: iter
                .into_iter()
                .map(|(address, value)| RegisterSetting::new(address, value))
                .collect(),
        }
    }
}

impl<'a, T> IntoIterator for &'a RegisterSettingSet<T> {
    type Item = &'a RegisterSetting<T>;
    type IntoIter = std::slice::Iter<'a, RegisterSetting<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.regs.iter()
    }
}

/// Write the masked settings into a register set. Registers missing from `regs`
/// are an error.
pub fn apply_reg_settings_to_device(regs: &mut RegisterSet, settings: &RegisterSettingSet<u8>) -> Result<()> {
    for setting in settings {
        let mask = setting.mask as u8;
        regs.set8_mask(setting.address, setting.value & mask, mask)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_stays_sorted() {
        let mut c = RegisterContainer::new();
        c.init_reg(0x10, 1u8);
        c.init_reg(0x02, 2);
        c.init_reg(0x05, 3);
        let addrs: Vec<u16> = c.iter().map(|r| r.address).collect();
        assert_eq!(addrs, vec![0x02, 0x05, 0x10]);
    }

    #[test]
    fn sequential_keeps_insert_order() {
        let mut c = RegisterContainer::sequential();
        c.init_reg(0x10, 1u8);
        c.init_reg(0x02, 2);
        assert_eq!(c.get(0x02).unwrap(), 2);
        let addrs: Vec<u16> = c.iter().map(|r| r.address).collect();
        assert_eq!(addrs, vec![0x10, 0x02]);
    }

    #[test]
    fn masked_write() {
        let mut regs = RegisterSet::new();
        regs.init_reg(0x05, 0xff);
        regs.set8_mask(0x05, 0x40, 0xc0).unwrap();
        assert_eq!(regs.get8(0x05).unwrap(), 0x7f);
    }
}
