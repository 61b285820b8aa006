#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]
//! # embedded-onewire
//! A no-std implementation of the 1-Wire protocol.
//!
//! This crate provides a trait-based interface for 1-Wire communication, allowing you to implement the protocol on various platforms.
//! [OneWire] trait defines the basic operations required for 1-Wire communication, such as resetting the bus, writing and reading bytes, and writing and reading bits.
//!
//! The crate also provides a search algorithm for discovering devices on the 1-Wire bus, implemented in [OneWireSearch] on top of
//! single [search passes](search_pass) that thread a [SearchCursor] from one pass to the next.
//! Discovered addresses are returned as [RomCode]s, validated with [OneWireCrc].

mod consts;
mod error;
mod rom;
mod search;
mod traits;
mod utils;
pub use consts::*;
pub use error::OneWireError;
pub use rom::RomCode;
pub use search::{
    DEFAULT_MAX_PASSES, OneWireSearch, OneWireSearchKind, ScanEntry, SearchCursor, search_pass,
};
pub use traits::{OneWire, OneWireStatus};
pub use utils::OneWireCrc;

/// Error type for 1-Wire operations.
pub type OneWireResult<T, E> = Result<T, OneWireError<E>>;
