use core::fmt;

#[allow(unused_imports)]
use crate::OneWireSearch;

/// One wire communication error type.
#[derive(Debug, PartialEq, Eq)]
pub enum OneWireError<E> {
    /// Encapsulates the error type from the underlying hardware.
    Other(E),
    /// Indicates that no device answered a reset that required a presence pulse.
    NoDevicePresent,
    /// Both the id bit and its complement read as 1 during a search pass.
    ///
    /// Nobody is left driving the bus on the current branch. [`OneWireSearch::next`]
    /// returns this after advancing its cursor, so the search may be resumed.
    BusCollision,
    /// Computed CRC of the ROM is invalid.
    InvalidRomCrc,
}

impl<E> From<E> for OneWireError<E> {
    fn from(other: E) -> Self {
        Self::Other(other)
    }
}

impl<E: fmt::Debug> fmt::Display for OneWireError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(e) => write!(f, "bus error: {e:?}"),
            Self::NoDevicePresent => f.write_str("no device responded to the reset pulse"),
            Self::BusCollision => f.write_str("no device responding on the search branch"),
            Self::InvalidRomCrc => f.write_str("ROM code failed CRC validation"),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for OneWireError<E> {}
