use crate::{Ds2482, Ds2482Result};
use embedded_hal::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};

/// Addresses of registers in the DS2482.
pub trait Addressing {
    /// Pointer code selecting this register with the Set Read Pointer command.
    const READ_PTR: u8;
}

/// Trait for interacting with the registers of the DS2482 I2C 1-Wire master.
pub trait Interact: Addressing + Sized {
    /// Decode the raw register value.
    fn from_register(value: u8) -> Self;

    /// Point the bridge at this register and read it.
    fn read<I: I2c<SevenBitAddress>, D: DelayNs>(
        dev: &mut Ds2482<I, D>,
    ) -> Ds2482Result<Self, I::Error> {
        dev.set_read_pointer(Self::READ_PTR)?;
        dev.read_register_byte().map(Self::from_register)
    }
}
