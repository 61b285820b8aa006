use core::fmt;

use crate::{OneWireCrc, OneWireError, OneWireResult};

/// 64-bit registration number of a 1-Wire device, in bus (transmission) order.
///
/// | Byte | Description |
/// |------|-------------|
/// | 0 | Family code (e.g., 0x28 for DS18B20) |
/// | 1-6 | Serial number, least significant byte first |
/// | 7 | CRC-8 of bytes 0-6 |
///
/// Converting to a `u64` uses little-endian order, so the family code ends up in
/// the least significant byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct RomCode([u8; 8]);

impl RomCode {
    /// Wraps eight raw bytes as read off the bus.
    pub const fn new(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    /// Builds a ROM code from a family code and serial number, appending the CRC.
    pub fn with_crc(family: u8, serial: [u8; 6]) -> Self {
        let mut bytes = [family, 0, 0, 0, 0, 0, 0, 0];
        bytes[1..7].copy_from_slice(&serial);
        bytes[7] = OneWireCrc::checksum(&bytes[..7]);
        Self(bytes)
    }

    /// Family code of the device.
    pub const fn family(&self) -> u8 {
        self.0[0]
    }

    /// Serial number of the device.
    pub fn serial(&self) -> [u8; 6] {
        let mut serial = [0; 6];
        serial.copy_from_slice(&self.0[1..7]);
        serial
    }

    /// The CRC byte as stored in the ROM.
    pub const fn crc(&self) -> u8 {
        self.0[7]
    }

    /// Raw bytes in transmission order.
    pub const fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// Little-endian `u64` representation.
    pub const fn to_u64(&self) -> u64 {
        u64::from_le_bytes(self.0)
    }

    /// Whether the trailing CRC byte matches the first seven bytes.
    pub fn is_valid(&self) -> bool {
        OneWireCrc::validate(&self.0)
    }

    /// Checks the trailing CRC byte.
    ///
    /// # Errors
    /// [`OneWireError::InvalidRomCrc`] if the checksum does not match.
    pub fn validate<E>(&self) -> OneWireResult<(), E> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(OneWireError::InvalidRomCrc)
        }
    }
}

impl From<[u8; 8]> for RomCode {
    fn from(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }
}

impl From<u64> for RomCode {
    fn from(rom: u64) -> Self {
        Self(rom.to_le_bytes())
    }
}

impl From<RomCode> for u64 {
    fn from(rom: RomCode) -> Self {
        rom.to_u64()
    }
}

impl fmt::Display for RomCode {
    /// Formats as `ff-ssssssssssss` (family, then the serial most significant byte first),
    /// the same layout the Linux w1 subsystem uses for device names.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}-", self.family())?;
        for b in self.0[1..7].iter().rev() {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields() {
        let rom = RomCode::new([0x02, 0x1c, 0xb8, 0x01, 0x00, 0x00, 0x00, 0xa2]);
        assert_eq!(rom.family(), 0x02);
        assert_eq!(rom.serial(), [0x1c, 0xb8, 0x01, 0, 0, 0]);
        assert_eq!(rom.crc(), 0xa2);
        assert!(rom.is_valid());
        assert_eq!(rom.to_u64(), 0xa200_0000_01b8_1c02);
        assert_eq!(RomCode::from(0xa200_0000_01b8_1c02), rom);
        assert_eq!(RomCode::with_crc(0x02, [0x1c, 0xb8, 0x01, 0, 0, 0]), rom);
    }

    #[test]
    fn display() {
        let rom = RomCode::with_crc(0x28, [0x1c, 0xb8, 0x01, 0, 0, 0]);
        assert_eq!(std::format!("{rom}"), "28-00000001b81c");
    }

    #[test]
    fn validate_reports_mismatch() {
        let mut bytes = *RomCode::with_crc(0x28, [1, 2, 3, 4, 5, 6]).as_bytes();
        assert_eq!(RomCode::new(bytes).validate::<()>(), Ok(()));
        bytes[7] ^= 0x80;
        assert_eq!(
            RomCode::new(bytes).validate::<()>(),
            Err(OneWireError::InvalidRomCrc)
        );
    }
}
