//! # Link Configuration and Timing Parameters
//!
//! Plain values describing how the link should be set up. They are
//! supplied by the board/panel layer once per configuration epoch and only
//! ever read by the controller. All of them deserialize, so a panel can be
//! described in a TOML file:
//!
//! ```toml
//! [link]
//! interface = "video"
//! burst_mode = "burst"
//! pixel_format = "rgb888"
//! lanes = 4
//!
//! [timing.display]
//! resolution = { width = 1080, height = 1920 }
//! hfp = 60
//! ...
//! ```
//!
//! Numeric timing values are kept as `u32`: whether an out-of-range value
//! is truncated or rejected is decided by the handle's
//! [`FieldPolicy`](crate::FieldPolicy) when it is written.

use serde::{Deserialize, Serialize};

use crate::field::LaneCount;
use crate::regs::{fields, Lanes};

// ============================================================================
// LINK CONFIGURATION
// ============================================================================

/// Interface mode requested by the panel
///
/// Only video and command mode exist on a DSI link. Panel descriptions may
/// still name other display interfaces; those decode as `Unsupported` and
/// are refused by [`Dsim::display_config`](crate::Dsim::display_config).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceMode {
    Command,
    Video,
    Unsupported(u8),
}

impl From<u8> for InterfaceMode {
    fn from(raw: u8) -> Self {
        match raw {
            0 => InterfaceMode::Command,
            1 => InterfaceMode::Video,
            other => InterfaceMode::Unsupported(other),
        }
    }
}

/// Video burst / sync mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum BurstMode {
    NonBurstSyncEvent = 0,
    NonBurstSyncPulse = 2,
    Burst = 3,
    NonVideo = 4,
}

impl BurstMode {
    /// Raw mode value; CONFIG keeps only its low two bits
    pub const fn raw(self) -> u32 {
        self as u32
    }
}

/// How CONFIG[27:26] encodes [`BurstMode::Burst`]
///
/// Boards in the field set CONFIG bit 27 (sync inform) together with the
/// burst bit, although the bit is documented as invalid in that
/// combination. Which encoding a given silicon revision needs is a
/// hardware validation result, so both are selectable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BurstEncoding {
    /// Burst bit only (bit 26)
    Legacy,
    /// Burst bit plus sync inform bit (bits 26 and 27)
    #[default]
    SyncInform,
}

/// Pixel stream format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum PixelFormat {
    Cmd3Bpp = 0,
    Cmd8Bpp = 1,
    Cmd12Bpp = 2,
    Cmd16Bpp = 3,
    Rgb565 = 4,
    Rgb666Packed = 5,
    Rgb666Loose = 6,
    Rgb888 = 7,
}

impl PixelFormat {
    pub const fn raw(self) -> u32 {
        self as u32
    }
}

/// DSI virtual channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum VirtualChannel {
    #[default]
    Vc0 = 0,
    Vc1 = 1,
    Vc2 = 2,
    Vc3 = 3,
}

impl VirtualChannel {
    pub const fn raw(self) -> u32 {
        self as u32
    }
}

/// Link-level configuration of one controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkConfig {
    pub interface: InterfaceMode,
    pub burst_mode: BurstMode,
    #[serde(default)]
    pub burst_encoding: BurstEncoding,
    pub pixel_format: PixelFormat,
    #[serde(default)]
    pub virtual_channel: VirtualChannel,
    pub lanes: LaneCount,
    /// Flush the main display FIFO automatically at VSYNC
    #[serde(default)]
    pub auto_flush: bool,
    /// Do not send EoT packets
    #[serde(default)]
    pub eot_disable: bool,
    /// Automatically count vertical lines
    #[serde(default)]
    pub auto_vertical_count: bool,
    /// Send HSE packets
    #[serde(default)]
    pub hse: bool,
    /// Disable HFP in video mode
    #[serde(default)]
    pub hfp_disable: bool,
    /// Disable HBP in video mode
    #[serde(default)]
    pub hbp_disable: bool,
    /// Disable HSA in video mode
    #[serde(default)]
    pub hsa_disable: bool,
    /// DP/DN polarity swap: bit 0 data lanes, bit 1 clock lane
    #[serde(default)]
    pub dp_dn_swap: u8,
}

impl LinkConfig {
    /// Video-mode link with everything else at reset defaults
    pub const fn video(lanes: LaneCount, burst_mode: BurstMode, pixel_format: PixelFormat) -> Self {
        Self::base(InterfaceMode::Video, lanes, burst_mode, pixel_format)
    }

    /// Command-mode link with everything else at reset defaults
    pub const fn command(lanes: LaneCount, pixel_format: PixelFormat) -> Self {
        Self::base(InterfaceMode::Command, lanes, BurstMode::NonVideo, pixel_format)
    }

    const fn base(
        interface: InterfaceMode,
        lanes: LaneCount,
        burst_mode: BurstMode,
        pixel_format: PixelFormat,
    ) -> Self {
        Self {
            interface,
            burst_mode,
            burst_encoding: BurstEncoding::SyncInform,
            pixel_format,
            virtual_channel: VirtualChannel::Vc0,
            lanes,
            auto_flush: false,
            eot_disable: false,
            auto_vertical_count: false,
            hse: false,
            hfp_disable: false,
            hbp_disable: false,
            hsa_disable: false,
            dp_dn_swap: 0,
        }
    }

    /// CONFIG[27:26] value for the burst mode, in register position
    ///
    /// Burst mode follows [`BurstEncoding`]; every other mode is written
    /// as its raw value truncated to two bits.
    pub const fn burst_bits(&self) -> u32 {
        let raw = match (self.burst_mode, self.burst_encoding) {
            (BurstMode::Burst, BurstEncoding::Legacy) => 0b01,
            (BurstMode::Burst, BurstEncoding::SyncInform) => 0b11,
            (mode, _) => mode.raw(),
        };
        fields::BURST_MODE.pack(raw)
    }

    /// Clock lane plus every configured data lane
    pub const fn enabled_lanes(&self) -> Lanes {
        Lanes::for_data_lanes(self.lanes)
    }
}

// ============================================================================
// TIMING PARAMETERS
// ============================================================================

/// Active area in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// Main display timing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayTiming {
    pub resolution: Resolution,
    pub hfp: u32,
    pub hbp: u32,
    /// Horizontal sync width
    pub hsa: u32,
    pub vfp: u32,
    pub vbp: u32,
    /// Vertical sync width
    pub vsa: u32,
    /// Lines in VFP during which command transfers are allowed
    #[serde(default)]
    pub cmd_allow: u32,
}

/// D-PHY PLL setup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PllParams {
    /// Pre-divider (P)
    pub p: u32,
    /// Multiplier (M)
    pub m: u32,
    /// Post scaler (S)
    pub s: u32,
    pub freq_band: u32,
    /// PLL lock timer, written to PLLTMR as-is
    pub lock_time: u32,
}

/// Link timeouts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTimeouts {
    /// Bus turn-around timeout
    pub bta: u32,
    /// Low-power data receive timeout
    pub lpdr: u32,
    /// Stop-state counter
    pub stop_state_count: u32,
}

/// Byte clock source (CLKCTRL.BYTE_CLK_SRC)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ByteClockSource {
    /// D-PHY PLL output / 8
    #[default]
    PllOut = 0,
    /// External clock / 8
    External = 1,
    /// External clock, PLL bypassed
    ExternalBypass = 2,
}

impl ByteClockSource {
    pub const fn raw(self) -> u32 {
        self as u32
    }
}

/// Every timing value programmed during bring-up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingParams {
    pub display: DisplayTiming,
    #[serde(default)]
    pub sub_display: Option<Resolution>,
    pub pll: PllParams,
    pub timeouts: LinkTimeouts,
    /// Escape clock prescaler
    pub esc_prescaler: u32,
    #[serde(default)]
    pub byte_clock_source: ByteClockSource,
}

// ============================================================================
// TESTS
// ============================================================================
