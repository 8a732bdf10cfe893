//! # Register Access
//!
//! Every DSIM register access goes through [`RegisterBus`], keyed by
//! [`Reg`] so no caller ever does offset arithmetic on the base address.
//! [`Mmio`] is the hardware implementation: one volatile load or store per
//! call, no caching, no buffering.

use core::ptr::{read_volatile, write_volatile};

use crate::regs::Reg;

/// 32-bit register access for one DSIM instance
pub trait RegisterBus {
    /// Read a register (exactly one bus access)
    fn read(&mut self, reg: Reg) -> u32;

    /// Write a register (exactly one bus access)
    fn write(&mut self, reg: Reg, value: u32);

    /// Platform hook reporting an unrecoverable bus fault
    ///
    /// Polling loops check this so a dead bus is reported as
    /// [`DsimError::FatalBusFault`](crate::DsimError::FatalBusFault)
    /// instead of a timeout.
    fn bus_fault(&self) -> bool {
        false
    }

    /// Clear the bits in `clear`, then set the bits in `set`
    #[inline]
    fn modify(&mut self, reg: Reg, clear: u32, set: u32) -> u32 {
        let value = (self.read(reg) & !clear) | set;
        self.write(reg, value);
        value
    }

    /// Set bits in a register
    #[inline]
    fn set_bits(&mut self, reg: Reg, bits: u32) {
        self.modify(reg, 0, bits);
    }

    /// Clear bits in a register
    #[inline]
    fn clear_bits(&mut self, reg: Reg, bits: u32) {
        self.modify(reg, bits, 0);
    }
}

/// Memory-mapped DSIM register window
pub struct Mmio {
    base: usize,
}

impl Mmio {
    /// Create a register window at `base`
    ///
    /// # Safety
    /// `base` must be the virtual address of a mapped DSIM register block
    /// at least [`Reg::WINDOW`] bytes long, and no other `Mmio` may exist
    /// for the same block.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    /// Base address of the register window
    pub const fn base(&self) -> usize {
        self.base
    }
}

impl RegisterBus for Mmio {
    #[inline]
    fn read(&mut self, reg: Reg) -> u32 {
        unsafe { read_volatile((self.base + reg.offset()) as *const u32) }
    }

    #[inline]
    fn write(&mut self, reg: Reg, value: u32) {
        unsafe { write_volatile((self.base + reg.offset()) as *mut u32, value) }
    }
}

/// Millisecond delay supplied by the platform
pub trait Delay {
    fn delay_ms(&mut self, ms: u32);
}

impl<F: FnMut(u32)> Delay for F {
    fn delay_ms(&mut self, ms: u32) {
        self(ms)
    }
}

// ============================================================================
// MOCK BUS
// ============================================================================


// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::mock::MockBus;
    use super::*;

    #[test]
    fn test_modify_clears_then_sets() {
        let mut bus = MockBus::new().with(Reg::EscMode, 0xFF00_00F0);
        let v = bus.modify(Reg::EscMode, 0x0000_00F0, 0x0000_0003);
        assert_eq!(v, 0xFF00_0003);
        assert_eq!(bus.writes, vec![(Reg::EscMode, 0xFF00_0003)]);
    }

    #[test]
    fn test_set_and_clear_bits() {
        let mut bus = MockBus::new().with(Reg::SwRst, 0x10);
        bus.set_bits(Reg::SwRst, 0x1);
        bus.clear_bits(Reg::SwRst, 0x10);
        assert_eq!(bus.writes_to(Reg::SwRst), vec![0x11, 0x01]);
    }

    #[test]
    fn test_scripted_reads_drain_then_fall_back() {
        let mut bus = MockBus::new().with(Reg::Status, 0x8000_0000);
        bus.script(Reg::Status, &[0, 1]);
        assert_eq!(bus.read(Reg::Status), 0);
        assert_eq!(bus.read(Reg::Status), 1);
        assert_eq!(bus.read(Reg::Status), 0x8000_0000);
        assert_eq!(bus.read_count(Reg::Status), 3);
    }

    #[test]
    fn test_mmio_volatile_access() {
        let mut window = [0u32; Reg::WINDOW / 4];
        let mut mmio = unsafe { Mmio::new(window.as_mut_ptr() as usize) };

        mmio.write(Reg::PllTmr, 0x1234);
        assert_eq!(mmio.read(Reg::PllTmr), 0x1234);
        mmio.set_bits(Reg::Config, 1 << 25);

        assert_eq!(window[Reg::PllTmr.offset() / 4], 0x1234);
        assert_eq!(window[Reg::Config.offset() / 4], 1 << 25);
    }

    #[test]
    fn test_closure_delay() {
        let mut total = 0;
        let mut delay = |ms: u32| total += ms;
        delay.delay_ms(10);
        delay.delay_ms(5);
        assert_eq!(total, 15);
    }
}
