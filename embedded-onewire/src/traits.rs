use crate::{ONEWIRE_MATCH_ROM_CMD, ONEWIRE_SKIP_ROM_CMD, OneWireResult, RomCode};

/// Status reported by the bus master after a 1-Wire reset.
pub trait OneWireStatus {
    /// Whether at least one device answered the reset with a presence pulse.
    fn presence(&self) -> bool;
    /// Whether the bus master detected a short circuit during the reset.
    fn shortcircuit(&self) -> bool;
    /// Logic level of the 1-Wire line, if the bus master can sample it.
    fn logic_level(&self) -> Option<bool> {
        None
    }
}

/// Trait for 1-Wire communication.
/// This trait defines the basic operations required for 1-Wire communication, such as resetting the bus,
/// writing and reading bytes, and writing and reading bits.
///
/// Every operation blocks until the bus master has finished the time slots it generates.
/// Implementations must not retry failed transactions on their own: a silent retry would
/// desynchronize the bit-position bookkeeping of a [search](crate::search_pass).
pub trait OneWire {
    /// The status type returned by the reset operation.
    /// This type must implement the [OneWireStatus] trait.
    type Status: OneWireStatus;
    /// The error type returned by the operations of this trait.
    /// This type is used to indicate errors in the underlying hardware or communication.
    type BusError;

    /// Resets the 1-Wire bus and returns the status of the bus.
    ///
    /// # Arguments
    /// * `required` - Fail if no device answers with a presence pulse.
    ///
    /// # Errors
    /// [`OneWireError::NoDevicePresent`](crate::OneWireError::NoDevicePresent) if `required`
    /// is set and nobody answered, or the bus error of the underlying hardware.
    fn reset(&mut self, required: bool) -> OneWireResult<Self::Status, Self::BusError>;

    /// Writes a byte to the 1-Wire bus.
    /// # Arguments
    /// * `byte` - The byte to write to the bus.
    ///
    /// # Errors
    /// This method returns an error if the write operation fails.
    fn write_byte(&mut self, byte: u8) -> OneWireResult<(), Self::BusError>;

    /// Reads a byte from the 1-Wire bus.
    /// # Returns
    /// Byte read from the bus.
    ///
    /// # Errors
    /// This method returns an error if the read operation fails.
    fn read_byte(&mut self) -> OneWireResult<u8, Self::BusError>;

    /// Writes a single bit to the 1-Wire bus.
    /// # Arguments
    ///
    /// * `bit` - The bit to write.
    ///
    /// # Errors
    /// This method returns an error if the write operation fails.
    fn write_bit(&mut self, bit: bool) -> OneWireResult<(), Self::BusError>;

    /// Reads a single bit from the 1-Wire bus.
    /// # Returns
    /// The bit read from the bus.
    /// # Errors
    /// This method returns an error if the read operation fails.
    fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError>;

    /// Writes a buffer to the bus, one byte transaction at a time.
    fn write(&mut self, bytes: &[u8]) -> OneWireResult<(), Self::BusError> {
        for &b in bytes.iter() {
            self.write_byte(b)?;
        }
        Ok(())
    }

    /// Fills a buffer from the bus, one byte transaction at a time.
    fn read_into(&mut self, buf: &mut [u8]) -> OneWireResult<(), Self::BusError> {
        for b in buf.iter_mut() {
            *b = self.read_byte()?;
        }
        Ok(())
    }

    /// Addresses devices on the 1-Wire bus.
    /// The first [`OneWire::read_byte`], [`OneWire::read_bit`], [`OneWire::write_byte`], [`OneWire::write_bit`] operation should be preceded by this method to address devices on the bus.
    /// Note: A [`OneWire::read_byte`] or [`OneWire::read_bit`] call will return garbage data if this method is called without specifying a ROM address on a bus with multiple devices.
    /// # Arguments
    /// * `rom` - The ROM address of the device to address. Pass [`None`] to skip ROM addressing and address all devices on the bus.
    ///
    /// # Returns
    /// A result indicating the success or failure of the operation.
    /// If the device is successfully addressed, the method returns `Ok(())`.
    fn address(&mut self, rom: Option<RomCode>) -> OneWireResult<(), Self::BusError> {
        self.reset(true)?; // Reset the bus before addressing
        match rom {
            Some(rom) => {
                self.write_byte(ONEWIRE_MATCH_ROM_CMD)?;
                self.write(rom.as_bytes())
            }
            None => self.write_byte(ONEWIRE_SKIP_ROM_CMD),
        }
    }
}
