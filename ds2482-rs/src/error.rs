use core::fmt;

#[derive(Debug, PartialEq, Eq)]
/// DS2482 Hardware Errors
pub enum Ds2482Error<E> {
    /// I2C bus errors.
    I2c(E),
    /// Busy wait retries exceeded while waiting for the device to come out of reset.
    RetriesExceeded,
}

impl<E> From<E> for Ds2482Error<E> {
    fn from(value: E) -> Self {
        Self::I2c(value)
    }
}

impl<E: fmt::Debug> fmt::Display for Ds2482Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I2c(e) => write!(f, "I2C error: {e:?}"),
            Self::RetriesExceeded => f.write_str("DS2482 did not complete its reset"),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for Ds2482Error<E> {}

/// Non-fatal conditions recorded on the [`Ds2482`](crate::Ds2482) handle.
///
/// These never abort the operation that observed them. The most recent one is kept in
/// [`Ds2482::last_warning`](crate::Ds2482::last_warning) for callers that need strict checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ds2482Warning {
    /// The 1-Wire busy flag was still set when the poll bound ran out.
    Timeout,
    /// A short on the 1-Wire line was detected during a reset.
    ShortCircuit,
    /// The configuration register did not read back the value written.
    ConfigWriteFailed,
}

impl fmt::Display for Ds2482Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Timeout => "1-Wire busy wait timed out",
            Self::ShortCircuit => "1-Wire short circuit detected",
            Self::ConfigWriteFailed => "configuration register read-back mismatch",
        })
    }
}
