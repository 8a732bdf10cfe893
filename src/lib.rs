//! # MIPI-DSI Host Link Control
//!
//! Register-level control of a MIPI-DSI master controller (Samsung
//! S5P/Exynos "DSIM" register layout). This crate sequences the register
//! transactions that bring the link from reset to a clocked, lane-ready
//! state, encodes every bitfield bit-exactly, drives the escape / ULPS
//! state machine and frames DSI packets into the TX FIFOs.
//!
//! ## Architecture
//!
//! ```text
//!   Device lifecycle / frame pipeline (caller)
//!          │                      │
//!          ▼                      ▼
//!   ┌──────────────┐      ┌──────────────┐
//!   │ Link state   │      │   Packet     │
//!   │ machine      │      │   transfer   │
//!   └──────┬───────┘      └──────┬───────┘
//!          ▼                     │
//!   ┌──────────────┐             │
//!   │  Sequencer   │             │
//!   │  (Dsim ops)  │             │
//!   └──────┬───────┘             │
//!          └─────────┬───────────┘
//!                    ▼
//!   ┌─────────────────────────────────┐
//!   │ Bitfield codec  +  RegisterBus  │
//!   └────────────────┬────────────────┘
//!                    ▼
//!                DSIM HW
//! ```
//!
//! ## Ownership
//!
//! A [`Dsim`] owns its [`RegisterBus`]. It is not `Clone` and every
//! operation that touches hardware takes `&mut self`, so one controller has
//! exactly one driver at a time. Callers that share a controller between an
//! interrupt context and a thread must wrap the handle in their own lock.
//!
//! ## Polling
//!
//! The hardware offers no completion timeout for PLL lock, lane stop state
//! or RX FIFO data. Every wait is bounded by a [`PollBound`] taken from the
//! handle's [`PollConfig`] and fails with [`DsimError::LinkTimeout`].

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod bus;
pub mod config;
pub mod dsim;
pub mod field;
pub mod link;
pub mod packet;
pub mod poll;
pub mod regs;
pub mod trace;

// Re-export main types
pub use bus::{Delay, Mmio, RegisterBus};
pub use config::{
    BurstEncoding, BurstMode, ByteClockSource, DisplayTiming, InterfaceMode, LinkConfig,
    LinkTimeouts, PixelFormat, PllParams, Resolution, TimingParams, VirtualChannel,
};
pub use dsim::Dsim;
pub use field::{Field, FieldPolicy, LaneCount};
pub use link::{LinkState, TransferMode, UlpsRequest};
pub use packet::{DataType, PacketHeader};
pub use poll::{PollBound, PollConfig};
pub use regs::{FifoSelect, FifoStatus, Interrupts, Lanes, LinkStatus, Reg};
pub use trace::Tracer;

// ============================================================================
// ERRORS
// ============================================================================

/// Errors returned by DSIM operations
///
/// The core never retries. Whether a `LinkTimeout` is worth another attempt
/// (for example re-locking the PLL) is the caller's decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DsimError {
    /// Input that cannot be programmed into the controller
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),

    /// A value does not fit its register field and the rejecting policy is active
    #[error("{field}: value {value:#x} does not fit in {width} bits")]
    FieldOverflow {
        field: &'static str,
        value: u32,
        width: u8,
    },

    /// A bounded poll did not observe the expected hardware state
    #[error("timed out waiting for {condition} after {reads} reads")]
    LinkTimeout {
        condition: &'static str,
        reads: u32,
    },

    /// The platform reported an unrecoverable register bus fault
    #[error("fatal register bus fault")]
    FatalBusFault,
}

impl DsimError {
    /// True for every error caused by bad caller input
    pub const fn is_invalid_configuration(&self) -> bool {
        matches!(
            self,
            DsimError::InvalidConfiguration(_) | DsimError::FieldOverflow { .. }
        )
    }

    /// True if a bounded poll expired
    pub const fn is_timeout(&self) -> bool {
        matches!(self, DsimError::LinkTimeout { .. })
    }
}

/// Result type for DSIM operations
pub type DsimResult<T> = Result<T, DsimError>;

// ============================================================================
// TESTS
// ============================================================================
