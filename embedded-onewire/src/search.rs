use crate::{
    ONEWIRE_CONDITIONAL_SEARCH_CMD, ONEWIRE_SEARCH_CMD, OneWire, OneWireResult, RomCode,
    error::OneWireError,
};
use heapless::Vec;

/// Safety stop for [`OneWireSearch`]: the maximum number of passes run before giving up
/// on a bus that never reports the search space as exhausted.
pub const DEFAULT_MAX_PASSES: u8 = 0xff;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Type of search performed using [`OneWireSearch`] or [`search_pass`].
pub enum OneWireSearchKind {
    /// Normal search
    #[default]
    Normal = ONEWIRE_SEARCH_CMD,
    /// Search only for devices with alarm
    Alarmed = ONEWIRE_CONDITIONAL_SEARCH_CMD,
}

/// State carried from one search pass to the next.
///
/// Bits are numbered from 1 (LSB of the family code) to 64 (MSB of the CRC byte).
/// A fresh cursor has no recorded discrepancy, so the first pass takes the 1 branch at every
/// collision. After each pass the cursor records every collision where the 1 branch was taken;
/// the next pass repeats the previous path up to the deepest of them and takes the 0 branch there.
/// A discrepancy of 0 after a pass means the search space is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchCursor {
    last_discrepancy: u8,
    /// Collisions on the current path where the 1 branch was taken, bit `n - 1` for bit `n`.
    branches: u64,
    rom: [u8; 8],
    passes: u8,
    exhausted: bool,
}

impl SearchCursor {
    /// Cursor for a search that has not run any pass yet.
    pub const fn new() -> Self {
        Self {
            last_discrepancy: 0,
            branches: 0,
            rom: [0; 8],
            passes: 0,
            exhausted: false,
        }
    }

    /// Bit number of the collision the next pass will branch at, 0 if none is recorded.
    pub const fn last_discrepancy(&self) -> u8 {
        self.last_discrepancy
    }

    /// Number of passes run with this cursor.
    pub const fn passes(&self) -> u8 {
        self.passes
    }

    /// Whether every branch of the search tree has been visited.
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Branch to take at a collision on bit `id_bit_num`.
    fn direction(&self, id_bit_num: u8) -> bool {
        if id_bit_num < self.last_discrepancy {
            let (idx, mask) = bit_position(id_bit_num);
            self.rom[idx] & mask > 0
        } else {
            id_bit_num != self.last_discrepancy
        }
    }

    fn advance(&self, rom: [u8; 8], branches: u64) -> Self {
        let discrepancy = (u64::BITS - branches.leading_zeros()) as u8;
        Self {
            last_discrepancy: discrepancy,
            branches,
            rom,
            passes: self.passes.saturating_add(1),
            exhausted: discrepancy == 0,
        }
    }
}

/// Byte index and mask of a 1-based ROM bit number.
fn bit_position(id_bit_num: u8) -> (usize, u8) {
    let bit = id_bit_num - 1;
    ((bit / 8) as usize, 1 << (bit % 8))
}

/// Runs a single pass of the [1-Wire search algorithm](https://www.analog.com/en/resources/app-notes/1wire-search-algorithm.html).
///
/// Issues a reset that requires a presence pulse, the search command, and then for every one of
/// the 64 ROM bits reads the id bit and its complement and writes back the chosen branch.
///
/// | id bit | complement | meaning |
/// |---|---|---|
/// | 0 | 0 | collision, decided by the cursor |
/// | 0 | 1 | every remaining device has a 0 |
/// | 1 | 0 | every remaining device has a 1 |
/// | 1 | 1 | nobody is responding, the pass is aborted |
///
/// # Returns
/// The ROM found by this pass (`None` if the pass was aborted or the cursor was already
/// exhausted) together with the cursor for the next pass. The CRC of the returned ROM is not
/// checked here.
///
/// # Errors
/// [`OneWireError::NoDevicePresent`] if nobody answered the reset, or any bus error.
pub fn search_pass<T: OneWire>(
    onewire: &mut T,
    kind: OneWireSearchKind,
    cursor: SearchCursor,
) -> OneWireResult<(Option<RomCode>, SearchCursor), T::BusError> {
    if cursor.exhausted {
        return Ok((None, cursor));
    }
    onewire.reset(true)?;
    onewire.write_byte(kind as u8)?; // Search ROM command
    let mut rom = [0u8; 8];
    let mut branches = 0u64;
    for id_bit_num in 1..=64 {
        let id_bit = onewire.read_bit()?;
        let complement_bit = onewire.read_bit()?;
        let set = match (id_bit, complement_bit) {
            (true, true) => {
                let (rom, branches) = resume_after_abort(&cursor, rom, branches, id_bit_num);
                let next = cursor.advance(rom, branches);
                log::debug!(
                    "search pass {} aborted at bit {id_bit_num}, resuming from bit {}",
                    cursor.passes.saturating_add(1),
                    next.last_discrepancy
                );
                return Ok((None, next));
            }
            (false, false) => {
                let dir = cursor.direction(id_bit_num);
                if dir {
                    branches |= 1 << (id_bit_num - 1);
                }
                dir
            }
            (id_bit, _) => id_bit,
        };
        if set {
            let (idx, mask) = bit_position(id_bit_num);
            rom[idx] |= mask;
        }
        onewire.write_bit(set)?;
    }
    let rom = RomCode::new(rom);
    let next = cursor.advance(*rom.as_bytes(), branches);
    log::debug!(
        "search pass {} found {rom}, next discrepancy at bit {}",
        cursor.passes.saturating_add(1),
        next.last_discrepancy
    );
    Ok((Some(rom), next))
}

/// Path template and open branches after a pass was aborted at bit `abort_at`.
///
/// Bits read before the abort come from this pass. From the abort bit on, the previous path
/// still holds the collisions whose 0 branch has not been visited. Only the branch this pass
/// was sent down (0 at the previous discrepancy) is given up.
fn resume_after_abort(
    cursor: &SearchCursor,
    rom: [u8; 8],
    branches: u64,
    abort_at: u8,
) -> ([u8; 8], u64) {
    let before = (1u64 << (abort_at - 1)) - 1;
    let mut pending = cursor.branches & !before;
    if cursor.last_discrepancy > 0 {
        pending &= !(1 << (cursor.last_discrepancy - 1));
    }
    let template =
        (u64::from_le_bytes(rom) & before) | (u64::from_le_bytes(cursor.rom) & !before);
    (template.to_le_bytes(), (branches & before) | pending)
}

/// One ROM reported by [`OneWireSearch::scan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanEntry {
    /// The CRC byte matches.
    Valid(RomCode),
    /// The CRC byte does not match; the caller decides whether to keep it.
    ChecksumMismatch(RomCode),
}

impl ScanEntry {
    fn new(rom: RomCode) -> Self {
        if rom.is_valid() {
            Self::Valid(rom)
        } else {
            Self::ChecksumMismatch(rom)
        }
    }

    /// The ROM as read off the bus.
    pub fn rom(&self) -> RomCode {
        match *self {
            Self::Valid(rom) | Self::ChecksumMismatch(rom) => rom,
        }
    }

    /// Whether the CRC byte matched.
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

/// A structure for searching devices on a 1-Wire bus.
/// It holds the bus and the [`SearchCursor`] between passes.
pub struct OneWireSearch<'a, T> {
    onewire: &'a mut T,
    kind: OneWireSearchKind,
    cursor: SearchCursor,
    max_passes: u8,
}

impl<T> core::fmt::Debug for OneWireSearch<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OneWireSearch")
            .field("kind", &self.kind)
            .field("cursor", &self.cursor)
            .field("max_passes", &self.max_passes)
            .finish()
    }
}

impl<'a, T> OneWireSearch<'a, T> {
    /// Creates a new [`OneWireSearch`] instance.
    ///
    /// # Arguments
    /// * `onewire` - A mutable reference to a type that implements the `OneWire` trait.
    /// * `kind` - Normal search, or search for devices in alarm state.
    pub fn new(onewire: &'a mut T, kind: OneWireSearchKind) -> Self {
        Self {
            onewire,
            kind,
            cursor: SearchCursor::new(),
            max_passes: DEFAULT_MAX_PASSES,
        }
    }

    /// Set the maximum number of passes before the search gives up.
    pub fn with_max_passes(mut self, max_passes: u8) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Current search state.
    pub fn cursor(&self) -> SearchCursor {
        self.cursor
    }

    /// Forgets every pass run so far; the next call starts a new search.
    pub fn restart(&mut self) {
        self.cursor = SearchCursor::new();
    }

    fn finished(&self) -> bool {
        self.cursor.is_exhausted() || self.cursor.passes() >= self.max_passes
    }
}

impl<T: OneWire> OneWireSearch<'_, T> {
    /// Runs the next search pass.
    ///
    /// Returns `None` once the search space is exhausted or the pass limit is reached.
    ///
    /// # Errors
    /// - [`OneWireError::BusCollision`] if the pass was aborted. The cursor has moved on, so
    ///   calling this method again continues with the next branch.
    /// - [`OneWireError::InvalidRomCrc`] if the ROM found fails CRC validation. The cursor has
    ///   moved on as well.
    /// - [`OneWireError::NoDevicePresent`] if nobody answered the reset.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Option<RomCode>, OneWireError<T::BusError>> {
        if self.finished() {
            return Ok(None);
        }
        let (rom, cursor) = search_pass(&mut *self.onewire, self.kind, self.cursor)?;
        self.cursor = cursor;
        let Some(rom) = rom else {
            return Err(OneWireError::BusCollision);
        };
        rom.validate::<T::BusError>()?;
        Ok(Some(rom))
    }

    /// Discovers every device on the bus.
    ///
    /// Runs passes until the search space is exhausted, `N` ROMs have been collected, or the pass
    /// limit is reached. Aborted passes contribute nothing and the scan moves on to the next
    /// branch. ROMs with a bad CRC are kept and flagged. A bus without presence pulse yields
    /// whatever was collected so far.
    ///
    /// # Errors
    /// Bus errors of the underlying hardware.
    pub fn scan<const N: usize>(&mut self) -> Result<Vec<ScanEntry, N>, OneWireError<T::BusError>> {
        let mut found = Vec::new();
        while !found.is_full() && !self.finished() {
            let rom = match search_pass(&mut *self.onewire, self.kind, self.cursor) {
                Ok((rom, cursor)) => {
                    self.cursor = cursor;
                    rom
                }
                Err(OneWireError::NoDevicePresent) => {
                    log::debug!("no presence pulse, scan stops after {} ROMs", found.len());
                    break;
                }
                Err(e) => return Err(e),
            };
            if let Some(rom) = rom {
                let entry = ScanEntry::new(rom);
                if !entry.is_valid() {
                    log::warn!("ROM {rom} failed CRC validation");
                }
                if found.push(entry).is_err() {
                    break;
                }
            }
        }
        Ok(found)
    }
}
