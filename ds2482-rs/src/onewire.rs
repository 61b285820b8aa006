use crate::{Ds2482, Ds2482Error, Ds2482Warning, registers::DeviceStatus};
use embedded_hal::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};
use embedded_onewire::{OneWire, OneWireError, OneWireResult};

pub(crate) const ONEWIRE_RESET_CMD: u8 = 0xb4;
pub(crate) const ONEWIRE_WRITE_BYTE: u8 = 0xa5;
pub(crate) const ONEWIRE_READ_BYTE: u8 = 0x96;
pub(crate) const ONEWIRE_SINGLE_BIT: u8 = 0x87;

impl<I2C: I2c<SevenBitAddress>, D: DelayNs> OneWire for Ds2482<I2C, D> {
    type Status = DeviceStatus;

    type BusError = Ds2482Error<I2C::Error>;

    fn reset(&mut self, required: bool) -> OneWireResult<Self::Status, Self::BusError> {
        self.wait_on_busy()?;
        // A strong pullup left armed would hold the line high through the reset pulse.
        self.clear_strong_pullup()?;
        self.wait_on_busy()?;
        self.i2c
            .write(self.addr, &[ONEWIRE_RESET_CMD])
            .map_err(Ds2482Error::from)?;
        let status = self.wait_on_busy()?;
        log::trace!("1-Wire reset: {status:?}");
        if status.short_detect() {
            self.warn(Ds2482Warning::ShortCircuit);
        }
        if required && !status.presence_pulse_detect() {
            return Err(OneWireError::NoDevicePresent);
        }
        Ok(status)
    }

    fn write_byte(&mut self, byte: u8) -> OneWireResult<(), Self::BusError> {
        log::trace!("1-Wire write {byte:#04x}");
        self.wait_on_busy()?;
        self.i2c
            .write(self.addr, &[ONEWIRE_WRITE_BYTE, byte])
            .map_err(Ds2482Error::from)?;
        self.wait_on_busy()?;
        Ok(())
    }

    fn read_byte(&mut self) -> OneWireResult<u8, Self::BusError> {
        self.wait_on_busy()?;
        self.i2c
            .write(self.addr, &[ONEWIRE_READ_BYTE])
            .map_err(Ds2482Error::from)?;
        self.wait_on_busy()?;
        let byte = self.read_data()?;
        log::trace!("1-Wire read {byte:#04x}");
        Ok(byte)
    }

    fn write_bit(&mut self, bit: bool) -> OneWireResult<(), Self::BusError> {
        self.wait_on_busy()?;
        self.i2c
            .write(
                self.addr,
                &[ONEWIRE_SINGLE_BIT, { if bit { 0x80 } else { 0x0 } }],
            )
            .map_err(Ds2482Error::from)?;
        Ok(())
    }

    fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError> {
        // A read slot is a write-one slot the devices may pull low.
        self.write_bit(true)?;
        Ok(self.wait_on_busy()?.single_bit_result())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        registers::{DEVICE_CONFIG_PTR, READ_DATA_PTR, READ_PTR_CMD, WRITE_CONFIG_CMD},
        tests::{TestDelay, poll},
    };
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
    use embedded_onewire::{OneWireSearch, OneWireSearchKind, OneWireStatus, RomCode};

    const ADDR: u8 = 0x18;

    /// Bus traffic of a reset with the configuration register at `cfg` and the final status `status`.
    fn reset_sequence(cfg: u8, status: u8) -> Vec<I2cTransaction> {
        let mut exp = poll(0x00);
        exp.push(I2cTransaction::write(ADDR, vec![READ_PTR_CMD, DEVICE_CONFIG_PTR]));
        exp.push(I2cTransaction::read(ADDR, vec![cfg]));
        exp.extend(poll(0x00));
        let cleared = cfg & !0x04;
        exp.push(I2cTransaction::write(
            ADDR,
            vec![WRITE_CONFIG_CMD, cleared | ((!cleared & 0x0f) << 4)],
        ));
        exp.push(I2cTransaction::read(ADDR, vec![cleared]));
        exp.extend(poll(0x00));
        exp.push(I2cTransaction::write(ADDR, vec![ONEWIRE_RESET_CMD]));
        exp.extend(poll(0x01));
        exp.extend(poll(status));
        exp
    }

    #[test]
    fn reset_with_presence() {
        let i2c = I2cMock::new(&reset_sequence(0x05, 0x0a));
        let mut dev = Ds2482::new(i2c, TestDelay::default());
        let status = dev.reset(true).unwrap();
        assert!(status.presence());
        assert!(!status.shortcircuit());
        assert_eq!(dev.last_warning(), None);
        dev.release().0.done();
    }

    #[test]
    fn reset_without_presence() {
        let mut exp = reset_sequence(0x00, 0x08);
        exp.extend(reset_sequence(0x00, 0x08));
        let i2c = I2cMock::new(&exp);
        let mut dev = Ds2482::new(i2c, TestDelay::default());
        assert_eq!(dev.reset(true), Err(OneWireError::NoDevicePresent));
        let status = dev.reset(false).unwrap();
        assert!(!status.presence());
        dev.release().0.done();
    }

    #[test]
    fn reset_short_circuit_is_a_warning() {
        let i2c = I2cMock::new(&reset_sequence(0x00, 0x06));
        let mut dev = Ds2482::new(i2c, TestDelay::default());
        let status = dev.reset(true).unwrap();
        assert!(status.short_detect());
        assert_eq!(dev.last_warning(), Some(Ds2482Warning::ShortCircuit));
        dev.release().0.done();
    }

    #[test]
    fn write_bits() {
        let mut exp = poll(0x00);
        exp.push(I2cTransaction::write(ADDR, vec![ONEWIRE_SINGLE_BIT, 0x80]));
        exp.extend(poll(0x00));
        exp.push(I2cTransaction::write(ADDR, vec![ONEWIRE_SINGLE_BIT, 0x00]));
        let i2c = I2cMock::new(&exp);
        let mut dev = Ds2482::new(i2c, TestDelay::default());
        dev.write_bit(true).unwrap();
        dev.write_bit(false).unwrap();
        dev.release().0.done();
    }

    #[test]
    fn read_bit_samples_sbr() {
        let mut exp = Vec::new();
        for status in [0x20, 0x00] {
            exp.extend(poll(0x00));
            exp.push(I2cTransaction::write(ADDR, vec![ONEWIRE_SINGLE_BIT, 0x80]));
            exp.extend(poll(0x01));
            exp.extend(poll(status));
        }
        let i2c = I2cMock::new(&exp);
        let mut dev = Ds2482::new(i2c, TestDelay::default());
        assert!(dev.read_bit().unwrap());
        assert!(!dev.read_bit().unwrap());
        dev.release().0.done();
    }

    #[test]
    fn write_byte_waits_for_completion() {
        let mut exp = poll(0x00);
        exp.push(I2cTransaction::write(ADDR, vec![ONEWIRE_WRITE_BYTE, 0x44]));
        exp.extend(poll(0x01));
        exp.extend(poll(0x00));
        let i2c = I2cMock::new(&exp);
        let mut dev = Ds2482::new(i2c, TestDelay::default());
        dev.write_byte(0x44).unwrap();
        let (mut i2c, delay) = dev.release();
        assert_eq!(delay.total_ns, 20_000);
        i2c.done();
    }

    #[test]
    fn read_byte_from_data_register() {
        let mut exp = poll(0x00);
        exp.push(I2cTransaction::write(ADDR, vec![ONEWIRE_READ_BYTE]));
        exp.extend(poll(0x00));
        exp.push(I2cTransaction::write(ADDR, vec![READ_PTR_CMD, READ_DATA_PTR]));
        exp.push(I2cTransaction::read(ADDR, vec![0xbe]));
        let i2c = I2cMock::new(&exp);
        let mut dev = Ds2482::new(i2c, TestDelay::default());
        assert_eq!(dev.read_byte().unwrap(), 0xbe);
        dev.release().0.done();
    }

    #[test]
    fn i2c_error_during_transaction() {
        let mut exp = poll(0x00);
        exp.push(
            I2cTransaction::write(ADDR, vec![ONEWIRE_WRITE_BYTE, 0xcc]).with_error(ErrorKind::Other),
        );
        let i2c = I2cMock::new(&exp);
        let mut dev = Ds2482::new(i2c, TestDelay::default());
        assert_eq!(
            dev.write_byte(0xcc),
            Err(OneWireError::Other(Ds2482Error::I2c(ErrorKind::Other)))
        );
        dev.release().0.done();
    }

    #[test]
    fn address_matches_rom_through_bridge() {
        let rom = RomCode::with_crc(0x28, [0x1c, 0xb8, 0x01, 0, 0, 0]);
        let mut exp = reset_sequence(0x00, 0x02);
        for byte in [0x55].iter().chain(rom.as_bytes()) {
            exp.extend(poll(0x00));
            exp.push(I2cTransaction::write(ADDR, vec![ONEWIRE_WRITE_BYTE, *byte]));
            exp.extend(poll(0x00));
        }
        let i2c = I2cMock::new(&exp);
        let mut dev = Ds2482::new(i2c, TestDelay::default());
        dev.address(Some(rom)).unwrap();
        assert_eq!(dev.i2c_address(), ADDR);
        dev.release().0.done();
    }

    /// Bus traffic of one bit slot reading `bit`.
    fn read_bit_sequence(bit: bool) -> Vec<I2cTransaction> {
        let mut exp = poll(0x00);
        exp.push(I2cTransaction::write(ADDR, vec![ONEWIRE_SINGLE_BIT, 0x80]));
        exp.extend(poll(if bit { 0x20 } else { 0x00 }));
        exp
    }

    fn write_bit_sequence(bit: bool) -> Vec<I2cTransaction> {
        let mut exp = poll(0x00);
        exp.push(I2cTransaction::write(
            ADDR,
            vec![ONEWIRE_SINGLE_BIT, if bit { 0x80 } else { 0x00 }],
        ));
        exp
    }

    #[test]
    fn search_single_device_through_bridge() {
        let rom = RomCode::with_crc(0x28, [0x01, 0, 0, 0, 0, 0]);
        let mut exp = reset_sequence(0x00, 0x02);
        exp.extend(poll(0x00));
        exp.push(I2cTransaction::write(ADDR, vec![ONEWIRE_WRITE_BYTE, 0xf0]));
        exp.extend(poll(0x00));
        for byte in rom.as_bytes() {
            for i in 0..8 {
                let bit = (byte >> i) & 1 == 1;
                exp.extend(read_bit_sequence(bit));
                exp.extend(read_bit_sequence(!bit));
                exp.extend(write_bit_sequence(bit));
            }
        }
        let i2c = I2cMock::new(&exp);
        let mut dev = Ds2482::new(i2c, TestDelay::default());
        let mut search = OneWireSearch::new(&mut dev, OneWireSearchKind::Normal);
        assert_eq!(search.next().unwrap(), Some(rom));
        assert!(search.cursor().is_exhausted());
        assert_eq!(search.next().unwrap(), None);
        drop(search);
        dev.release().0.done();
    }
}
