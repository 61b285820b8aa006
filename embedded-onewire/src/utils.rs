#[derive(Debug, Default)]
/// Calculate CRC-8 used in 1-Wire communications.
///
/// Polynomial `x^8 + x^5 + x^4 + 1`, shifted out LSB first (`0x8c` reflected form).
pub struct OneWireCrc(u8);

#[cfg(feature = "crc-table")]
const CRC_TABLE: [u8; 256] = {
    let mut table = [0; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = crc_shift(i as u8);
        i += 1;
    }
    table
};

/// Runs the eight shift steps of the CRC over an already XORed byte.
const fn crc_shift(mut crc: u8) -> u8 {
    let mut bit = 0;
    while bit < 8 {
        if crc & 0x1 == 0x1 {
            crc = (crc >> 1) ^ 0x8c;
        } else {
            crc >>= 1;
        }
        bit += 1;
    }
    crc
}

impl OneWireCrc {
    /// Get the current CRC value
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Update the CRC with the incoming byte.
    pub fn update(&mut self, byte: u8) {
        let idx = self.0 ^ byte;
        #[cfg(feature = "crc-table")]
        {
            self.0 = CRC_TABLE[idx as usize];
        }
        #[cfg(not(feature = "crc-table"))]
        {
            self.0 = crc_shift(idx);
        }
    }

    /// Compute the CRC of a sequence of bytes.
    pub fn checksum(sequence: &[u8]) -> u8 {
        let mut crc = OneWireCrc::default();
        for &byte in sequence.iter() {
            crc.update(byte);
        }
        crc.value()
    }

    /// Validate a sequence of bytes where the last byte is the 1-Wire CRC of
    /// the previous bytes.
    pub fn validate(sequence: &[u8]) -> bool {
        // Running the CRC over its own checksum byte leaves a zero remainder.
        Self::checksum(sequence) == 0x0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn known_rom_checksum() {
        // Worked example from the Maxim 1-Wire CRC application note.
        let rom = [0x02, 0x1c, 0xb8, 0x01, 0x00, 0x00, 0x00, 0xa2];
        assert_eq!(OneWireCrc::checksum(&rom[..7]), 0xa2);
        assert!(OneWireCrc::validate(&rom));
    }

    #[test]
    fn empty_sequence_is_zero() {
        assert_eq!(OneWireCrc::checksum(&[]), 0);
    }

    #[cfg(feature = "crc-table")]
    #[test]
    fn table_matches_bitwise() {
        for i in 0..=255u8 {
            assert_eq!(CRC_TABLE[i as usize], crc_shift(i));
        }
    }

    #[test]
    fn single_bit_flips_are_detected() {
        let mut rng = rand::rng();
        for _ in 0..64 {
            let mut rom = [0u8; 8];
            rng.fill(&mut rom[..7]);
            rom[7] = OneWireCrc::checksum(&rom[..7]);
            assert!(OneWireCrc::validate(&rom));
            for bit in 0..64 {
                let mut corrupt = rom;
                corrupt[bit / 8] ^= 1 << (bit % 8);
                assert!(!OneWireCrc::validate(&corrupt), "flip {bit} of {rom:02x?}");
            }
        }
    }
}
