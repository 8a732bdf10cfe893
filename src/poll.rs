//! Bounded hardware polling.
//!
//! None of the DSIM status bits come with a hardware timeout, so every wait
//! is a spin over a register read with an upper bound on the number of
//! reads. Exceeding the bound is a [`DsimError::LinkTimeout`]; a bus fault
//! reported by the platform ends the wait with [`DsimError::FatalBusFault`].

use serde::{Deserialize, Serialize};

use crate::bus::RegisterBus;
use crate::{DsimError, DsimResult};

/// Upper bound for one polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollBound {
    /// Maximum number of predicate evaluations (register reads)
    pub max_reads: u32,
    /// `spin_loop` hints issued between two reads
    #[serde(default)]
    pub spin_per_read: u32,
}

impl PollBound {
    pub const fn new(max_reads: u32) -> Self {
        Self {
            max_reads,
            spin_per_read: 0,
        }
    }

    pub const fn with_spin(mut self, spin_per_read: u32) -> Self {
        self.spin_per_read = spin_per_read;
        self
    }
}

/// Poll bounds used by a controller handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// PLL lock (STATUS.PLL_STABLE)
    pub pll_stable: PollBound,
    /// Clock and data lanes reaching stop state
    pub stop_state: PollBound,
    /// RX FIFO becoming non-empty after a read request
    pub rx_fifo: PollBound,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            pll_stable: PollBound::new(100_000).with_spin(16),
            stop_state: PollBound::new(100_000).with_spin(16),
            rx_fifo: PollBound::new(1_000_000),
        }
    }
}

/// Evaluate `ready` until it returns true or the bound is exhausted
///
/// Returns the number of evaluations it took.
pub fn poll_until<B, F>(
    bus: &mut B,
    bound: PollBound,
    condition: &'static str,
    mut ready: F,
) -> DsimResult<u32>
where
    B: RegisterBus,
    F: FnMut(&mut B) -> bool,
{
    for attempt in 1..=bound.max_reads {
        if bus.bus_fault() {
            return Err(DsimError::FatalBusFault);
        }
        if ready(bus) {
            return Ok(attempt);
        }
        for _ in 0..bound.spin_per_read {
            core::hint::spin_loop();
        }
    }

    if bus.bus_fault() {
        return Err(DsimError::FatalBusFault);
    }
    Err(DsimError::LinkTimeout {
        condition,
        reads: bound.max_reads,
    })
}

// ============================================================================
// TESTS
// ============================================================================
