//! Command constants for 1-Wire communication.

/// Command to match a specific ROM address in 1-Wire communication.
///
/// Followed by the 64-bit ROM code; only the device with that exact
/// code responds to the subsequent function command.
pub const ONEWIRE_MATCH_ROM_CMD: u8 = 0x55;

/// Command to skip ROM address in 1-Wire communication.
///
/// Addresses every device on the bus at once. Reads after this command
/// return garbage on a bus with more than one device.
pub const ONEWIRE_SKIP_ROM_CMD: u8 = 0xcc;

/// Command to search for devices on the 1-Wire bus
pub const ONEWIRE_SEARCH_CMD: u8 = 0xf0;

/// Command to search for devices in alarm state on the 1-Wire bus
pub const ONEWIRE_CONDITIONAL_SEARCH_CMD: u8 = 0xec;
