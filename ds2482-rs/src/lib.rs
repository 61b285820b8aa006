#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

/*! # DS2482
 *
 * A no-std driver for the Analog Devices DS2482-100 I2C to 1-Wire bridge.
 *
 * [`Ds2482`] implements the [`OneWire`] trait: every 1-Wire reset, bit and byte
 * transaction is translated into the bridge's command set, and every command waits for the
 * bridge's 1-Wire busy flag to clear before it is issued.
 *
 * Conditions the bridge tolerates (busy-wait exhaustion, a short on the line, a configuration
 * read-back mismatch) do not fail the operation. They are logged and recorded in
 * [`Ds2482::last_warning`]. Only I2C failures and a required reset without presence pulse
 * are returned as errors.
 *
 * ```ignore
 * let mut bridge = Ds2482Builder::default().with_board_select(1).build(i2c, delay)?;
 * for entry in OneWireSearch::new(&mut bridge, OneWireSearchKind::Normal).scan::<16>()? {
 *     log::info!("{}", entry.rom());
 * }
 * ```
 */

pub use embedded_onewire::{
    OneWire, OneWireError, OneWireResult, OneWireSearch, OneWireSearchKind, RomCode, ScanEntry,
};
mod error;
mod onewire;
mod registers;
mod traits;

pub use error::{Ds2482Error, Ds2482Warning};
pub use registers::{DeviceConfiguration, DeviceStatus};
pub use traits::{Addressing, Interact};

/// Results of DS2482-specific function calls.
pub type Ds2482Result<T, E> = Result<T, Ds2482Error<E>>;

/// Base I2C address of the DS2482; the AD0/AD1 (and AD2 where present) pins select the low bits.
pub const DS2482_BASE_ADDR: u8 = 0x18;

/// Default bound on the number of busy-flag polls.
pub const DEFAULT_RETRIES: u16 = 1000;

/// Default delay between two busy-flag polls, in microseconds.
pub const DEFAULT_POLL_INTERVAL_US: u32 = 20;

/// A DS2482 I2C to 1-Wire bridge device.
///
/// Takes ownership of an I2C bus (implementing [`I2c`](embedded_hal::i2c::I2c) trait)
/// and a timer object implementing the [`DelayNs`](embedded_hal::delay::DelayNs) trait.
///
/// The handle does not synchronize anything itself; share it between threads behind a lock.
pub struct Ds2482<I, D> {
    pub(crate) i2c: I,
    pub(crate) addr: u8,
    pub(crate) delay: D,
    pub(crate) retries: u16,
    pub(crate) poll_interval_us: u32,
    pub(crate) warning: Option<Ds2482Warning>,
}

impl<I, D> Ds2482<I, D> {
    /// Creates a new instance of `Ds2482` with the given I2C interface.
    ///
    /// No I2C traffic is generated; use [`Ds2482Builder`] to reset and configure the bridge.
    pub fn new(i2c: I, delay: D) -> Self {
        Ds2482 {
            i2c,
            addr: DS2482_BASE_ADDR,
            delay,
            retries: DEFAULT_RETRIES,
            poll_interval_us: DEFAULT_POLL_INTERVAL_US,
            warning: None,
        }
    }

    /// Set the retry count.
    ///
    /// The retry count bounds how many times the status register is
    /// polled while the 1-Wire line is busy.
    pub fn with_retries(mut self, retries: u16) -> Self {
        self.retries = retries.max(1);
        self
    }

    /// Set the delay between two polls of the status register, in microseconds.
    pub fn with_poll_interval_us(mut self, poll_interval_us: u32) -> Self {
        self.poll_interval_us = poll_interval_us;
        self
    }

    /// Select the address pins of the bridge (0-7, added to the base address `0x18`).
    pub fn with_board_select(mut self, select: u8) -> Self {
        self.addr = DS2482_BASE_ADDR | (select & 0x07);
        self
    }

    /// 7-bit I2C address of the bridge.
    pub fn i2c_address(&self) -> u8 {
        self.addr
    }

    /// The most recent non-fatal condition observed, if any.
    pub fn last_warning(&self) -> Option<Ds2482Warning> {
        self.warning
    }

    /// Returns and clears the most recent non-fatal condition.
    pub fn take_warning(&mut self) -> Option<Ds2482Warning> {
        self.warning.take()
    }

    pub(crate) fn warn(&mut self, warning: Ds2482Warning) {
        log::warn!("DS2482@{:#04x}: {}", self.addr, warning);
        self.warning = Some(warning);
    }

    /// Give back the I2C bus and the timer.
    pub fn release(self) -> (I, D) {
        (self.i2c, self.delay)
    }
}

/// Builder for creating a [`Ds2482`] instance with custom configuration.
#[derive(Debug)]
pub struct Ds2482Builder {
    pub(crate) retries: u16,
    pub(crate) poll_interval_us: u32,
    pub(crate) select: u8,
    pub(crate) config: DeviceConfiguration,
}

impl Default for Ds2482Builder {
    fn default() -> Self {
        Ds2482Builder {
            retries: DEFAULT_RETRIES,
            poll_interval_us: DEFAULT_POLL_INTERVAL_US,
            select: 0,
            config: DeviceConfiguration::new(),
        }
    }
}

impl Ds2482Builder {
    /// Sets the retry count for the device.
    ///
    /// The retry count bounds how many times the status register is
    /// polled while the 1-Wire line is busy.
    pub fn with_retries(mut self, retries: u16) -> Self {
        self.retries = retries;
        self
    }

    /// Sets the delay between two polls of the status register, in microseconds.
    pub fn with_poll_interval_us(mut self, poll_interval_us: u32) -> Self {
        self.poll_interval_us = poll_interval_us;
        self
    }

    /// Sets the address pins of the bridge (0-7).
    pub fn with_board_select(mut self, select: u8) -> Self {
        self.select = select;
        self
    }

    /// Sets the device configuration.
    pub fn with_config(mut self, config: DeviceConfiguration) -> Self {
        self.config = config;
        self
    }

    /// Builds a new `Ds2482` instance with the specified configuration.
    ///
    /// Resets the bridge and writes the configuration register.
    pub fn build<I: embedded_hal::i2c::I2c, D: embedded_hal::delay::DelayNs>(
        self,
        i2c: I,
        delay: D,
    ) -> Ds2482Result<Ds2482<I, D>, I::Error> {
        let mut dev = Ds2482::new(i2c, delay)
            .with_retries(self.retries)
            .with_poll_interval_us(self.poll_interval_us)
            .with_board_select(self.select);
        dev.device_reset()?;
        dev.write_config(self.config)?;
        Ok(dev)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use embedded_hal::delay::DelayNs;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    /// Timer that only counts how long it was asked to sleep.
    #[derive(Debug, Default)]
    pub(crate) struct TestDelay {
        pub(crate) total_ns: u64,
    }

    impl DelayNs for TestDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += u64::from(ns);
        }
    }

    /// One read of the status register at the default address.
    pub(crate) fn poll(status: u8) -> Vec<I2cTransaction> {
        vec![
            I2cTransaction::write(DS2482_BASE_ADDR, vec![0xe1, 0xf0]),
            I2cTransaction::read(DS2482_BASE_ADDR, vec![status]),
        ]
    }

    #[test]
    fn board_select_sets_address() {
        let dev = Ds2482::new(I2cMock::new(&[]), TestDelay::default()).with_board_select(3);
        assert_eq!(dev.i2c_address(), 0x1b);
        let dev = dev.with_board_select(0x0f);
        assert_eq!(dev.i2c_address(), 0x1f);
        dev.release().0.done();
    }

    #[test]
    fn zero_retries_still_polls_once() {
        let i2c = I2cMock::new(&poll(0x01));
        let mut dev = Ds2482::new(i2c, TestDelay::default()).with_retries(0);
        assert!(dev.wait_on_busy().unwrap().busy());
        assert_eq!(dev.last_warning(), Some(Ds2482Warning::Timeout));
        dev.release().0.done();
    }

    #[test]
    fn builder_resets_and_configures() {
        let addr = DS2482_BASE_ADDR | 2;
        let exp = [
            I2cTransaction::write(addr, vec![0xf0]),
            I2cTransaction::read(addr, vec![0x18]),
            I2cTransaction::write(addr, vec![0xe1, 0xf0]),
            I2cTransaction::read(addr, vec![0x18]),
            I2cTransaction::write(addr, vec![0xd2, 0xe1]),
            I2cTransaction::read(addr, vec![0x01]),
        ];
        let dev = Ds2482Builder::default()
            .with_board_select(2)
            .with_config(DeviceConfiguration::new().with_active_pullup(true))
            .build(I2cMock::new(&exp), TestDelay::default())
            .unwrap();
        assert_eq!(dev.i2c_address(), addr);
        assert_eq!(dev.last_warning(), None);
        dev.release().0.done();
    }
}
