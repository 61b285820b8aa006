use crate::{
    Ds2482, Ds2482Error, Ds2482Result, Ds2482Warning,
    traits::{Addressing, Interact},
};
use bitfield_struct::bitfield;
use embedded_hal::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};
use embedded_onewire::OneWireStatus;

pub(crate) const DEVICE_RST_CMD: u8 = 0xf0; // Reset the device
pub(crate) const READ_PTR_CMD: u8 = 0xe1; // Set the read pointer
pub(crate) const WRITE_CONFIG_CMD: u8 = 0xd2; // Write the device configuration
pub(crate) const DEVICE_STATUS_PTR: u8 = 0xf0; // Device status register
pub(crate) const READ_DATA_PTR: u8 = 0xe1; // Read data register
pub(crate) const DEVICE_CONFIG_PTR: u8 = 0xc3; // Device configuration register

impl<I: I2c<SevenBitAddress>, D: DelayNs> Ds2482<I, D> {
    /// Select the register returned by the next [`read_register_byte`](Ds2482::read_register_byte).
    pub fn set_read_pointer(&mut self, ptr: u8) -> Ds2482Result<(), I::Error> {
        self.i2c.write(self.addr, &[READ_PTR_CMD, ptr])?;
        Ok(())
    }

    /// Read one byte from the register the read pointer is positioned at.
    pub fn read_register_byte(&mut self) -> Ds2482Result<u8, I::Error> {
        let mut val = [0; 1];
        self.i2c.read(self.addr, &mut val)?;
        Ok(val[0])
    }

    /// Reset the device.
    ///
    /// Performs a global reset of device state machine logic. Terminates any ongoing 1-Wire
    /// communication. The read pointer is left at the status register, which is polled until
    /// the RST bit is reported.
    pub fn device_reset(&mut self) -> Ds2482Result<DeviceStatus, I::Error> {
        self.i2c.write(self.addr, &[DEVICE_RST_CMD])?;
        for _ in 0..self.retries {
            let status = DeviceStatus::from_register(self.read_register_byte()?);
            if status.device_reset() {
                return Ok(status);
            }
            self.delay.delay_us(self.poll_interval_us);
        }
        Err(Ds2482Error::RetriesExceeded)
    }

    /// Get the status of the device.
    pub fn get_status(&mut self) -> Ds2482Result<DeviceStatus, I::Error> {
        DeviceStatus::read(self)
    }

    /// Read the data register, which holds the result of the last 1-Wire Read Byte.
    pub fn read_data(&mut self) -> Ds2482Result<u8, I::Error> {
        self.set_read_pointer(READ_DATA_PTR)?;
        self.read_register_byte()
    }

    /// Read the device configuration register.
    pub fn read_config(&mut self) -> Ds2482Result<DeviceConfiguration, I::Error> {
        DeviceConfiguration::read(self)
    }

    /// Poll the status register until the 1-Wire busy flag clears.
    ///
    /// Polls at most `retries` times, sleeping the poll interval after every busy snapshot.
    /// If the line is still busy afterwards, [`Ds2482Warning::Timeout`] is recorded and the
    /// last snapshot is returned anyway.
    pub fn wait_on_busy(&mut self) -> Ds2482Result<DeviceStatus, I::Error> {
        let mut status = DeviceStatus::new();
        for _ in 0..self.retries {
            status = DeviceStatus::read(self)?;
            if !status.busy() {
                return Ok(status);
            }
            self.delay.delay_us(self.poll_interval_us);
        }
        self.warn(Ds2482Warning::Timeout);
        Ok(status)
    }

    /// Write the device configuration register.
    ///
    /// Waits for the 1-Wire line, writes the register and reads it back. A read-back that
    /// differs from `config` records [`Ds2482Warning::ConfigWriteFailed`].
    ///
    /// # Returns
    /// The configuration read back from the device.
    pub fn write_config(
        &mut self,
        config: DeviceConfiguration,
    ) -> Ds2482Result<DeviceConfiguration, I::Error> {
        self.wait_on_busy()?;
        self.i2c
            .write(self.addr, &[WRITE_CONFIG_CMD, config.encoded()])?;
        // The read pointer now sits at the configuration register.
        let readback = DeviceConfiguration::from_register(self.read_register_byte()?);
        if readback.low_nibble() != config.low_nibble() {
            self.warn(Ds2482Warning::ConfigWriteFailed);
        }
        Ok(readback)
    }

    /// Enable the strong pullup for the next 1-Wire Write Byte or Single Bit command.
    pub fn set_strong_pullup(&mut self) -> Ds2482Result<DeviceConfiguration, I::Error> {
        let config = self.read_config()?;
        self.write_config(config.with_strong_pullup(true))
    }

    /// Disable the strong pullup, leaving the other configuration bits untouched.
    pub fn clear_strong_pullup(&mut self) -> Ds2482Result<DeviceConfiguration, I::Error> {
        let config = self.read_config()?;
        self.write_config(config.with_strong_pullup(false))
    }
}

/// Status register for DS2482
///
/// The read-only Status register reports bit-type data from the 1-Wire side,
/// the 1-Wire busy status and the bridge's own reset status. All 1-Wire
/// commands and the Device Reset command leave the read pointer at this
/// register. Every snapshot describes the bus at the moment it was read and
/// must not be reused for a later decision.
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct DeviceStatus {
    /// 1WB: set while a 1-Wire command is being executed.
    pub busy: bool,
    /// PPD: a presence pulse was seen during the last 1-Wire Reset.
    pub presence_pulse_detect: bool,
    /// SD: the line was low when the presence pulse was sampled, i.e. shorted.
    /// PPD is set as well in that case.
    pub short_detect: bool,
    /// LL: logic level of the 1-Wire line, sampled when the status register is read.
    pub logic_level: bool,
    /// RST: the bridge went through a power-on reset or executed Device Reset.
    /// Cleared by the next configuration write.
    pub device_reset: bool,
    /// SBR: line level sampled during the last 1-Wire Single Bit command
    /// (or the first bit of a triplet).
    pub single_bit_result: bool,
    /// TSB: second bit of the last 1-Wire Triplet command.
    pub triplet_second_bit: bool,
    /// DIR: search direction taken by the last 1-Wire Triplet command.
    pub branch_dir_taken: bool,
}

impl Addressing for DeviceStatus {
    const READ_PTR: u8 = DEVICE_STATUS_PTR;
}

impl Interact for DeviceStatus {
    fn from_register(value: u8) -> Self {
        Self::from_bits(value)
    }
}

impl OneWireStatus for DeviceStatus {
    fn presence(&self) -> bool {
        self.presence_pulse_detect()
    }

    fn shortcircuit(&self) -> bool {
        self.short_detect()
    }

    fn logic_level(&self) -> Option<bool> {
        Some(self.logic_level())
    }
}

#[bitfield(u8)]
#[derive(PartialEq, Eq)]
/// # Device configuration register
///
/// Four 1-Wire features are selected in the low nibble. On writes the bridge
/// expects the one's complement of the low nibble in the high nibble; reads
/// return the low nibble with the high nibble cleared. After a device reset
/// the register reads 00h.
pub struct DeviceConfiguration {
    /// APU: drive rising edges with the active pullup instead of the resistor.
    pub active_pullup: bool,
    /// PPM: presence pulse masking.
    pub presence_pulse_masking: bool,
    /// SPU: strong pullup after the next Write Byte or Single Bit command.
    /// The bridge clears it by itself when the strong pullup ends.
    pub strong_pullup: bool,
    /// 1WS: overdrive speed.
    pub onewire_speed: bool,
    #[bits(4)]
    __: u8,
}

impl DeviceConfiguration {
    /// Value sent with the Write Device Configuration command.
    pub fn encoded(&self) -> u8 {
        let cfg = self.low_nibble();
        cfg | ((!cfg & 0x0f) << 4)
    }

    fn low_nibble(&self) -> u8 {
        self.into_bits() & 0x0f
    }
}

impl Addressing for DeviceConfiguration {
    const READ_PTR: u8 = DEVICE_CONFIG_PTR;
}

impl Interact for DeviceConfiguration {
    fn from_register(value: u8) -> Self {
        Self::from_bits(value)
    }
}
