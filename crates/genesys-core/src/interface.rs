//! Transport to the scanner ASIC.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::error::Result;
use crate::model::AsicType;
use crate::register::{RegisterContainer, RegisterSet};

/// Low-level operations on the scanner.
///
/// Everything the command sets and the image source do to the hardware goes
/// through this trait, so the whole scan path can run against an in-memory
/// mock.
pub trait ScannerInterface {
    fn is_mock(&self) -> bool;

    fn read_register(&mut self, address: u16) -> Result<u8>;

    fn write_register(&mut self, address: u16, value: u8) -> Result<()>;

    fn write_registers(&mut self, regs: &RegisterSet) -> Result<()> {
        for reg in regs.iter() {
            self.write_register(reg.address, reg.value)?;
        }
        Ok(())
    }

    /// Read image data from bulk endpoint `addr`, filling `data` completely.
    fn bulk_read_data(&mut self, addr: u8, data: &mut [u8]) -> Result<()>;

    fn bulk_write_data(&mut self, addr: u8, data: &[u8]) -> Result<()>;

    /// Write to ASIC memory at `addr`; `kind` selects the memory target.
    fn write_buffer(&mut self, kind: u8, addr: u32, data: &[u8]) -> Result<()>;

    fn write_gamma(&mut self, kind: u8, addr: u32, data: &[u8]) -> Result<()>;

    /// Write through the AHB bus, used by GL845/GL846/GL847 for slope tables.
    fn write_ahb(&mut self, addr: u32, data: &[u8]) -> Result<()>;

    fn read_fe_register(&mut self, address: u8) -> Result<u16>;

    fn write_fe_register(&mut self, address: u8, value: u16) -> Result<()>;

    fn sleep_us(&mut self, microseconds: u32);

    fn sleep_ms(&mut self, milliseconds: u32) {
        self.sleep_us(milliseconds * 1000);
    }

    /// Hook for mocks to record slope tables as they are sent.
    fn record_slope_table(&mut self, _table_nr: u32, _steps: &[u16]) {}

    fn record_key_value(&mut self, _key: &str, _value: &str) {}
}

/// Shared handle to the interface: the device and the pipeline source both
/// talk to the scanner.
pub type SharedInterface = Rc<RefCell<dyn ScannerInterface>>;

/// Which memory a [`BufferWrite`] went to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferTarget {
    Buffer(u8),
    Gamma(u8),
    Ahb,
    Bulk(u8),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferWrite {
    pub target: BufferTarget,
    pub addr: u32,
    pub data: Vec<u8>,
}

/// In-memory scanner.
///
/// Registers read back what was last written to them; reading a register that
/// was never written is an error. Bulk reads are served from a scripted data
/// stream and padded with zeros once it runs out.
pub struct TestScannerInterface {
    cached_regs: RegisterContainer<u8>,
    cached_fe_regs: RegisterContainer<u16>,
    register_writes: Vec<(u16, u8)>,
    buffer_writes: Vec<BufferWrite>,
    slope_tables: BTreeMap<u32, Vec<u16>>,
    key_values: BTreeMap<String, String>,
    bulk_data: Box<dyn AsRef<[u8]>>,
    bulk_offset: usize,
    bulk_bytes_read: u64,
    slept_us: u64,
}

impl TestScannerInterface {
    pub fn new(asic_type: AsicType) -> Self {
        let mut iface = Self {
            cached_regs: RegisterContainer::new(),
            cached_fe_regs: RegisterContainer::new(),
            register_writes: Vec::new(),
            buffer_writes: Vec::new(),
            slope_tables: BTreeMap::new(),
            key_values: BTreeMap::new(),
            bulk_data: Box::new(Vec::<u8>::new()),
            bulk_offset: 0,
            bulk_bytes_read: 0,
            slept_us: 0,
        };

        // Status registers polled during setup.
        if asic_type == AsicType::Gl124 {
            iface.cached_regs.init_reg(0x101, 0x00);
        } else {
            iface.cached_regs.init_reg(0x41, 0x00);
        }
        if matches!(
            asic_type,
            AsicType::Gl841
                | AsicType::Gl842
                | AsicType::Gl843
                | AsicType::Gl845
                | AsicType::Gl846
                | AsicType::Gl847
        ) {
            iface.cached_regs.init_reg(0x40, 0x00);
        }
        if asic_type == AsicType::Gl124 {
            for address in [0x33, 0xbd, 0xbe, 0x100] {
                iface.cached_regs.init_reg(address, 0x00);
            }
        }
        if matches!(asic_type, AsicType::Gl845 | AsicType::Gl846 | AsicType::Gl847) {
            iface.cached_regs.init_reg(0xbd, 0x00);
            iface.cached_regs.init_reg(0xbe, 0x00);
            for i in 0..10u8 {
                iface.cached_regs.init_reg(0xd0 + u16::from(i), i);
            }
        }
        iface
    }

    /// Serve bulk reads from `data`, starting at its first byte.
    pub fn set_bulk_data(&mut self, data: impl AsRef<[u8]> + 'static) {
        self.bulk_data = Box::new(data);
        self.bulk_offset = 0;
    }

    pub fn cached_regs(&self) -> &RegisterContainer<u8> {
        &self.cached_regs
    }

    pub fn cached_fe_regs(&self) -> &RegisterContainer<u16> {
        &self.cached_fe_regs
    }

    /// Every single-register write in order.
    pub fn register_writes(&self) -> &[(u16, u8)] {
        &self.register_writes
    }

    pub fn buffer_writes(&self) -> &[BufferWrite] {
        &self.buffer_writes
    }

    pub fn recorded_slope_tables(&self) -> &BTreeMap<u32, Vec<u16>> {
        &self.slope_tables
    }

    pub fn recorded_key_values(&self) -> &BTreeMap<String, String> {
        &self.key_values
    }

    pub fn bulk_bytes_read(&self) -> u64 {
        self.bulk_bytes_read
    }

    pub fn slept_us(&self) -> u64 {
        self.slept_us
    }
}

impl ScannerInterface for TestScannerInterface {
    fn is_mock(&self) -> bool {
        true
    }

    fn read_register(&mut self, address: u16) -> Result<u8> {
        self.cached_regs.get(address)
    }

    fn write_register(&mut self, address: u16, value: u8) -> Result<()> {
        trace!(address, value, "write_register");
        self.cached_regs.init_reg(address, value);
        self.register_writes.push((address, value));
        Ok(())
    }

    fn write_registers(&mut self, regs: &RegisterSet) -> Result<()> {
        for reg in regs.iter() {
            self.cached_regs.init_reg(reg.address, reg.value);
        }
        debug!(count = regs.len(), "write_registers");
        Ok(())
    }

    fn bulk_read_data(&mut self, _addr: u8, data: &mut [u8]) -> Result<()> {
        let source = (*self.bulk_data).as_ref();
        let start = self.bulk_offset.min(source.len());
        let count = data.len().min(source.len() - start);
        data[..count].copy_from_slice(&source[start..start + count]);
        data[count..].fill(0);
        self.bulk_offset = start + count;
        self.bulk_bytes_read += data.len() as u64;
        Ok(())
    }

    fn bulk_write_data(&mut self, addr: u8, data: &[u8]) -> Result<()> {
        self.buffer_writes.push(BufferWrite {
            target: BufferTarget::Bulk(addr),
            addr: 0,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn write_buffer(&mut self, kind: u8, addr: u32, data: &[u8]) -> Result<()> {
        self.buffer_writes.push(BufferWrite {
            target: BufferTarget::Buffer(kind),
            addr,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn write_gamma(&mut self, kind: u8, addr: u32, data: &[u8]) -> Result<()> {
        self.buffer_writes.push(BufferWrite {
            target: BufferTarget::Gamma(kind),
            addr,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn write_ahb(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        self.buffer_writes.push(BufferWrite {
            target: BufferTarget::Ahb,
            addr,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn read_fe_register(&mut self, address: u8) -> Result<u16> {
        self.cached_fe_regs.get(u16::from(address))
    }

    fn write_fe_register(&mut self, address: u8, value: u16) -> Result<()> {
        self.cached_fe_regs.init_reg(u16::from(address), value);
        Ok(())
    }

    fn sleep_us(&mut self, microseconds: u32) {
        self.slept_us += u64::from(microseconds);
    }

    fn record_slope_table(&mut self, table_nr: u32, steps: &[u16]) {
        self.slope_tables.insert(table_nr, steps.to_vec());
    }

    fn record_key_value(&mut self, key: &str, value: &str) {
        self.key_values.insert(key.to_string(), value.to_string());
    }
}
