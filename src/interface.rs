use crate::registers::{Bank, Register};
use crate::Error;

/// Single-register transport contract between the driver core and the bus.
///
/// Each call is one atomic bus transaction; sequences built on top of it
/// (read-modify-write, paired-bank reads) are not atomic with respect to each
/// other.
#[maybe_async_cfg::maybe(
    sync(cfg(not(feature = "async")), keep_self,),
    async(feature = "async", keep_self)
)]
pub trait RegReadWrite {
    /// Reads one eight-bit register from the given bank.
    async fn read_config(&mut self, register: Register, bank: Bank) -> Result<u8, Error>;

    /// Writes one eight-bit register in the given bank.
    async fn write_config(&mut self, register: Register, bank: Bank, value: u8)
        -> Result<(), Error>;
}
