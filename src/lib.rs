#![no_std]

//! Platform-agnostic driver for the MCP23017 16-bit I2C I/O expander.
//!
//! The chip splits its sixteen GPIO lines into two eight-pin banks (A for
//! pins 0-7, B for pins 8-15) and packs each per-pin setting into
//! bank-paired eight-bit registers. This driver exposes pin-level operations
//! (direction, pull-up, read, write) and the interrupt subsystem (per-pin
//! enable, trigger selection, INT output configuration, flag and capture
//! inspection) on top of single-register transactions over any
//! [`embedded_hal::i2c::I2c`] bus.
//!
//! The driver holds no register state of its own: every modifying operation
//! reads the affected registers back from the chip and writes the changed
//! bytes out again. Enable the `async` feature to drive the same API through
//! [`embedded_hal_async`](https://docs.rs/embedded-hal-async).

// Imports
use core::fmt::Display;

mod expander;
mod interface;
mod registers;

pub use crate::expander::Mcp23017;
pub use crate::interface::RegReadWrite;
pub use crate::registers::{
    Bank, IntEvent, InterruptOutput, PinLevel, PinMode, Register, TriggerMode, PIN_COUNT,
};

/// Enum used for mcp23017 addressing based on pin connection
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlaveAddressing {
    Low,
    High,
}

impl Display for SlaveAddressing {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SlaveAddressing::High => write!(f, "High"),
            SlaveAddressing::Low => write!(f, "Low"),
        }
    }
}

///Valid error codes
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The device could not be opened or did not answer its address probe.
    /// The handle is never handed out, so no traffic can follow.
    OpenFailure,
    /// A single register read or write did not complete.
    CommunicationErr,
    /// Pin argument outside 0..=15, rejected before any bus traffic.
    InvalidPin,
    /// Argument outside its defined range (e.g. a chip address the part
    /// cannot decode).
    InvalidParameter,
}

impl Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::OpenFailure => write!(f, "Device open failed"),
            Error::CommunicationErr => write!(f, "Not found on address"),
            Error::InvalidPin => write!(f, "Valid pin numbers are 0-15"),
            Error::InvalidParameter => write!(f, "Invalid Parameter"),
        }
    }
}

/**
 * Returns communication error
 */
pub(crate) fn i2c_comm_error<E>(_: E) -> Error {
    Error::CommunicationErr
}

/**
 * Function that converts physical pin address connection to respective hexadecimal value
 */
pub fn convert_slave_address(a0: SlaveAddressing, a1: SlaveAddressing, a2: SlaveAddressing) -> u8 {
    match (a0, a1, a2) {
        (SlaveAddressing::Low, SlaveAddressing::Low, SlaveAddressing::Low) => 0x20,
        (SlaveAddressing::Low, SlaveAddressing::Low, SlaveAddressing::High) => 0x21,
        (SlaveAddressing::Low, SlaveAddressing::High, SlaveAddressing::Low) => 0x22,
        (SlaveAddressing::Low, SlaveAddressing::High, SlaveAddressing::High) => 0x23,
        (SlaveAddressing::High, SlaveAddressing::Low, SlaveAddressing::Low) => 0x24,
        (SlaveAddressing::High, SlaveAddressing::Low, SlaveAddressing::High) => 0x25,
        (SlaveAddressing::High, SlaveAddressing::High, SlaveAddressing::Low) => 0x26,
        (SlaveAddressing::High, SlaveAddressing::High, SlaveAddressing::High) => 0x27,
    }
}
