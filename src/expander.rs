//! The expander driver: pin-level GPIO and the interrupt subsystem.

use byteorder::{ByteOrder, LittleEndian};
#[cfg(not(feature = "async"))]
use embedded_hal::i2c::I2c;
#[cfg(feature = "async")]
use embedded_hal_async::i2c::I2c;

use crate::interface::RegReadWrite;
use crate::registers::{
    bit_clear, bit_read, bit_set, split_pin, Bank, IntEvent, InterruptOutput, PinLevel, PinMode,
    Register, TriggerMode, IOCON_DISSLW, IOCON_INTPOL, IOCON_MIRROR, IOCON_ODR, IOCON_SEQOP,
    PIN_COUNT,
};
use crate::{i2c_comm_error, Error};

/// Chip addresses the MCP23017 can decode (A2/A1/A0 strap pins).
const ADDRESS_RANGE: core::ops::RangeInclusive<u8> = 0x20..=0x27;

/// Assembles two bank bytes into the 16-bit pin view, bank A in the low byte.
///
/// Getting this backwards would shift every pin above 7 into the wrong bank,
/// so the rule lives in exactly one place.
#[inline]
fn assemble_banks(a: u8, b: u8) -> u16 {
    LittleEndian::read_u16(&[a, b])
}

/// MCP23017 driver bound to one chip on one bus.
///
/// Holds nothing but the bus handle and the chip address: direction,
/// pull-up, output latch and interrupt configuration all live in the chip's
/// registers and are read back before every modifying operation. Nothing is
/// cached, so no cached value can go stale behind the chip's back.
///
/// The driver takes no internal lock. Read-modify-write sequences span two
/// or more bus transactions, so concurrent calls against pins of the same
/// bank can lose updates unless the caller serializes access to the
/// instance.
#[derive(Debug, Clone)]
pub struct Mcp23017<I2C> {
    i2c: I2C,
    address: u8,
}

#[maybe_async_cfg::maybe(
    sync(cfg(not(feature = "async")), self = "Mcp23017",),
    async(feature = "async", keep_self)
)]
impl<I2C, E> RegReadWrite for Mcp23017<I2C>
where
    I2C: I2c<Error = E>,
{
    #[inline]
    async fn read_config(&mut self, register: Register, bank: Bank) -> Result<u8, Error> {
        let mut rx_buffer: [u8; 1] = [0; 1];
        self.i2c
            .write_read(self.address, &[register.in_bank(bank)], &mut rx_buffer)
            .await
            .map_err(i2c_comm_error)?;
        Ok(rx_buffer[0])
    }

    #[inline]
    async fn write_config(
        &mut self,
        register: Register,
        bank: Bank,
        value: u8,
    ) -> Result<(), Error> {
        self.i2c
            .write(self.address, &[register.in_bank(bank), value])
            .await
            .map_err(i2c_comm_error)?;
        Ok(())
    }
}

#[maybe_async_cfg::maybe(
    sync(cfg(not(feature = "async")), self = "Mcp23017",),
    async(feature = "async", keep_self)
)]
impl<I2C, E> Mcp23017<I2C>
where
    I2C: I2c<Error = E>,
{
    /// Opens the expander at `address` and resets both banks to all-inputs.
    ///
    /// The all-inputs direction is the chip's power-on default, written out
    /// explicitly so a warm restart starts from the same known state. Any
    /// bus failure during this probe is reported as [`Error::OpenFailure`]
    /// and no handle is returned, so a half-opened device can never see
    /// further traffic.
    pub async fn new(i2c: I2C, address: u8) -> Result<Self, Error> {
        if !ADDRESS_RANGE.contains(&address) {
            return Err(Error::InvalidParameter);
        }

        let mut mcp = Mcp23017 { i2c, address };
        mcp.write_config(Register::Iodir, Bank::A, 0xFF)
            .await
            .map_err(|_| Error::OpenFailure)?;
        mcp.write_config(Register::Iodir, Bank::B, 0xFF)
            .await
            .map_err(|_| Error::OpenFailure)?;
        Ok(mcp)
    }

    /// Releases the bus handle. Dropping the driver works just as well;
    /// nothing is written to the chip on teardown.
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Sets direction and pull-up for one pin.
    pub async fn set_pin_mode(&mut self, pin: u8, mode: PinMode) -> Result<(), Error> {
        let (bank, bit) = split_pin(pin)?;

        let mut direction = self.read_config(Register::Iodir, bank).await?;
        let mut pullup = self.read_config(Register::Gppu, bank).await?;

        direction = match mode {
            PinMode::Output => bit_clear(direction, bit),
            PinMode::Input | PinMode::InputPullup => bit_set(direction, bit),
        };
        pullup = match mode {
            PinMode::InputPullup => bit_set(pullup, bit),
            PinMode::Input | PinMode::Output => bit_clear(pullup, bit),
        };

        self.write_config(Register::Iodir, bank, direction).await?;
        self.write_config(Register::Gppu, bank, pullup).await
    }

    /// Drives an output pin high or low through the bank's output latch.
    ///
    /// The latch is what gets read back (not the live input register), so
    /// the other seven pins of the byte keep the value last driven onto
    /// them.
    pub async fn write_pin(&mut self, pin: u8, level: PinLevel) -> Result<(), Error> {
        let (bank, bit) = split_pin(pin)?;

        let mut latch = self.read_config(Register::Olat, bank).await?;
        latch = match level {
            PinLevel::High => bit_set(latch, bit),
            PinLevel::Low => bit_clear(latch, bit),
        };
        self.write_config(Register::Olat, bank, latch).await
    }

    /// Reads the live electrical level of one pin.
    pub async fn read_pin(&mut self, pin: u8) -> Result<PinLevel, Error> {
        let (bank, bit) = split_pin(pin)?;

        let gpio = self.read_config(Register::Gpio, bank).await?;
        Ok(match bit_read(gpio, bit) {
            0 => PinLevel::Low,
            _ => PinLevel::High,
        })
    }

    /// Reads all sixteen live pin levels, bank A in the low byte.
    pub async fn read_all(&mut self) -> Result<u16, Error> {
        let a = self.read_config(Register::Gpio, Bank::A).await?;
        let b = self.read_config(Register::Gpio, Bank::B).await?;
        Ok(assemble_banks(a, b))
    }

    /// Writes all sixteen output latches, bank A from the low byte.
    pub async fn write_all(&mut self, value: u16) -> Result<(), Error> {
        let mut bytes = [0; 2];
        LittleEndian::write_u16(&mut bytes, value);

        self.write_config(Register::Olat, Bank::A, bytes[0]).await?;
        self.write_config(Register::Olat, Bank::B, bytes[1]).await
    }

    /// Enables or disables interrupt-on-change detection for one pin.
    pub async fn set_interrupt_enabled(&mut self, pin: u8, enabled: bool) -> Result<(), Error> {
        let (bank, bit) = split_pin(pin)?;

        let mut enable = self.read_config(Register::Gpinten, bank).await?;
        enable = if enabled {
            bit_set(enable, bit)
        } else {
            bit_clear(enable, bit)
        };
        self.write_config(Register::Gpinten, bank, enable).await
    }

    /// Configures the INTA/INTB output drivers.
    ///
    /// An open-drain output has no drive polarity, so in open-drain mode the
    /// polarity bit is forced inactive whatever the caller asked for.
    pub async fn configure_interrupt_output(
        &mut self,
        config: InterruptOutput,
    ) -> Result<(), Error> {
        let mut iocon = self.read_config(Register::Iocon, Bank::A).await?;

        iocon = if config.open_drain {
            iocon | IOCON_ODR
        } else {
            iocon & !IOCON_ODR
        };
        iocon = match (config.open_drain, config.polarity) {
            (false, PinLevel::High) => iocon | IOCON_INTPOL,
            _ => iocon & !IOCON_INTPOL,
        };
        iocon = if config.mirrored {
            iocon | IOCON_MIRROR
        } else {
            iocon & !IOCON_MIRROR
        };

        self.write_config(Register::Iocon, Bank::A, iocon).await
    }

    /// Selects what makes an enabled pin raise its interrupt flag.
    ///
    /// Edge triggers compare against the DEFVAL reference bit (set for
    /// rising, cleared for falling); `Change` compares against the previous
    /// level and leaves the reference bit as it was.
    pub async fn set_interrupt_trigger_mode(
        &mut self,
        pin: u8,
        mode: TriggerMode,
    ) -> Result<(), Error> {
        let (bank, bit) = split_pin(pin)?;

        let mut control = self.read_config(Register::Intcon, bank).await?;
        let mut compare = self.read_config(Register::Defval, bank).await?;

        match mode {
            TriggerMode::Change => control = bit_clear(control, bit),
            TriggerMode::RisingEdge => {
                control = bit_set(control, bit);
                compare = bit_set(compare, bit);
            }
            TriggerMode::FallingEdge => {
                control = bit_set(control, bit);
                compare = bit_clear(compare, bit);
            }
        }

        self.write_config(Register::Intcon, bank, control).await?;
        self.write_config(Register::Defval, bank, compare).await
    }

    /// Returns the 16-bit interrupt flag field, bank B in the high byte.
    ///
    /// With `clear`, both flag registers are explicitly zeroed after the
    /// read. On this chip family reading status registers can already clear
    /// flags as a side effect; the explicit zeroing is additive, not the
    /// sole mechanism.
    pub async fn interrupt_flags(&mut self, clear: bool) -> Result<u16, Error> {
        let a = self.read_config(Register::Intf, Bank::A).await?;
        let b = self.read_config(Register::Intf, Bank::B).await?;
        let flags = assemble_banks(a, b);

        if clear {
            self.write_config(Register::Intf, Bank::A, 0x00).await?;
            self.write_config(Register::Intf, Bank::B, 0x00).await?;
        }
        Ok(flags)
    }

    /// Decodes the interrupt flag field into pin indices, ascending.
    pub async fn interrupt_pins(&mut self, clear: bool) -> Result<heapless::Vec<u8, 16>, Error> {
        let flags = self.interrupt_flags(clear).await?;

        let mut pins = heapless::Vec::new();
        for pin in 0..PIN_COUNT {
            if flags & (1 << pin) != 0 {
                pins.push(pin).ok();
            }
        }
        Ok(pins)
    }

    /// Tells whether the given pin has a pending interrupt flag.
    ///
    /// A boolean predicate: out-of-range pins answer `false` without any
    /// bus traffic.
    pub async fn is_interrupt_on_pin(&mut self, pin: u8, clear: bool) -> Result<bool, Error> {
        if pin >= PIN_COUNT {
            return Ok(false);
        }

        let flags = self.interrupt_flags(clear).await?;
        Ok(flags & (1 << pin) != 0)
    }

    /// Reports every flagged pin with the level captured when it triggered.
    ///
    /// Flags and capture registers are read in the same call: the capture
    /// bytes only mean something against the flags taken at the same
    /// instant. With `clear`, the pin's bank GPIO register is read once per
    /// reported pin as the hardware acknowledge that releases its latch
    /// (independent of the flag-register zeroing in
    /// [`interrupt_flags`](Self::interrupt_flags)).
    pub async fn interrupt_capture(
        &mut self,
        clear: bool,
    ) -> Result<heapless::Vec<IntEvent, 16>, Error> {
        let flag_a = self.read_config(Register::Intf, Bank::A).await?;
        let flag_b = self.read_config(Register::Intf, Bank::B).await?;
        let flags = assemble_banks(flag_a, flag_b);

        let cap_a = self.read_config(Register::Intcap, Bank::A).await?;
        let cap_b = self.read_config(Register::Intcap, Bank::B).await?;
        let captured = assemble_banks(cap_a, cap_b);

        let mut events = heapless::Vec::new();
        for pin in 0..PIN_COUNT {
            if flags & (1 << pin) == 0 {
                continue;
            }

            let level = if captured & (1 << pin) != 0 {
                PinLevel::High
            } else {
                PinLevel::Low
            };
            events.push(IntEvent { pin, level }).ok();

            if clear {
                let (bank, _) = split_pin(pin)?;
                self.read_config(Register::Gpio, bank).await?;
            }
        }
        Ok(events)
    }

    /// Acknowledges every latched interrupt: reads both live input
    /// registers, then zeroes both flag registers.
    pub async fn clear_all_interrupts(&mut self) -> Result<(), Error> {
        self.read_config(Register::Gpio, Bank::A).await?;
        self.read_config(Register::Gpio, Bank::B).await?;
        self.write_config(Register::Intf, Bank::A, 0x00).await?;
        self.write_config(Register::Intf, Bank::B, 0x00).await
    }

    /// Sets or clears the SDA slew-rate disable bit (IOCON bit 4),
    /// preserving the rest of the register.
    pub async fn set_slew_rate_disabled(&mut self, disabled: bool) -> Result<(), Error> {
        let mut iocon = self.read_config(Register::Iocon, Bank::A).await?;
        iocon = if disabled {
            iocon | IOCON_DISSLW
        } else {
            iocon & !IOCON_DISSLW
        };
        self.write_config(Register::Iocon, Bank::A, iocon).await
    }

    /// Enables or disables sequential register addressing (IOCON bit 5;
    /// the bit is a disable flag, 0 = sequential enabled), preserving the
    /// rest of the register.
    pub async fn set_sequential_operation(&mut self, enabled: bool) -> Result<(), Error> {
        let mut iocon = self.read_config(Register::Iocon, Bank::A).await?;
        iocon = if enabled {
            iocon & !IOCON_SEQOP
        } else {
            iocon | IOCON_SEQOP
        };
        self.write_config(Register::Iocon, Bank::A, iocon).await
    }
}
