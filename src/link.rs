//! # Link Readiness and Low-Power State Machine
//!
//! ```text
//!   Reset ──init──► Configured ──PLL lock──► ClockStable ──lanes stop──► StopState
//!                                                                          │   ▲
//!                                           HS clock / LP transfer flags   ▼   │
//!                                                              HsActive | LpActive
//!                                                                    ▲   │
//!                                                         exit_ulps  │   ▼ enter_ulps
//!                                                                    Ulps
//! ```
//!
//! `Reset → Configured` has no confirmation bit and is assumed once the
//! configuration writes are issued. Both clock-related transitions are
//! bounded polls. ULPS readiness is a one-shot comparison the caller may
//! poll.
//!
//! No state is cached on the handle: [`Dsim::observe_state`] derives the
//! current state from live register reads.

use serde::{Deserialize, Serialize};

use crate::bus::RegisterBus;
use crate::config::{LinkConfig, TimingParams};
use crate::dsim::{video_interface, Dsim};
use crate::poll::poll_until;
use crate::regs::{clkctrl, escmode, LinkStatus, Reg};
use crate::trace::{dsim_trace, dsim_warn};
use crate::{DsimError, DsimResult};

/// Link state derived from controller registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Reset,
    Configured,
    ClockStable,
    StopState,
    HsActive,
    LpActive,
    Ulps,
}

/// Transfer mode of the command (CPU) or video (LCDC) path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferMode {
    #[default]
    Hs,
    Lp,
}

/// Direction of a ULPS transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UlpsRequest {
    Enter,
    Exit,
}

impl UlpsRequest {
    /// ESCMODE request bits for this transition
    ///
    /// | Request | CLK_EXIT | CLK | DAT_EXIT | DAT |
    /// |---------|----------|-----|----------|-----|
    /// | Enter   | 0        | 1   | 0        | 1   |
    /// | Exit    | 1        | 0   | 1        | 0   |
    pub const fn escmode_bits(self) -> u32 {
        match self {
            UlpsRequest::Enter => escmode::TX_ULPS_CLK | escmode::TX_ULPS_DAT,
            UlpsRequest::Exit => escmode::TX_ULPS_CLK_EXIT | escmode::TX_ULPS_DAT_EXIT,
        }
    }
}

impl<B: RegisterBus> Dsim<B> {
    /// Live STATUS bits
    pub fn link_status(&mut self) -> LinkStatus {
        LinkStatus::from_bits_retain(self.bus.read(Reg::Status))
    }

    // ========================================================================
    // CLOCK AND STOP STATE
    // ========================================================================

    pub fn is_pll_stable(&mut self) -> bool {
        self.link_status().contains(LinkStatus::PLL_STABLE)
    }

    /// Poll until the PLL reports lock
    ///
    /// Returns the number of STATUS reads it took.
    pub fn wait_pll_stable(&mut self) -> DsimResult<u32> {
        let bound = self.poll.pll_stable;
        let result = poll_until(&mut self.bus, bound, "pll stable", |bus| {
            bus.read(Reg::Status) & LinkStatus::PLL_STABLE.bits() != 0
        });
        if let Err(err) = &result {
            dsim_warn!(self.tracer, "wait_pll_stable: {}", err);
        }
        result
    }

    /// Clock and data lanes ready for traffic
    ///
    /// Every configured data lane must be in stop state, and the clock lane
    /// either in stop state (cold start) or HS-ready (left running by the
    /// bootloader).
    pub fn is_lane_stop_state(&mut self) -> bool {
        let status = self.link_status();
        Self::lanes_stopped(status, self.lanes.data_mask())
    }

    fn lanes_stopped(status: LinkStatus, data_mask: u32) -> bool {
        let data = LinkStatus::stop_state_data(data_mask);
        status.contains(data)
            && status.intersects(LinkStatus::STOP_STATE_CLK | LinkStatus::TX_READY_HS_CLK)
    }

    /// Poll until [`is_lane_stop_state`](Self::is_lane_stop_state) holds
    pub fn wait_stop_state(&mut self) -> DsimResult<u32> {
        let bound = self.poll.stop_state;
        let data_mask = self.lanes.data_mask();
        let result = poll_until(&mut self.bus, bound, "lane stop state", |bus| {
            Self::lanes_stopped(LinkStatus::from_bits_retain(bus.read(Reg::Status)), data_mask)
        });
        if let Err(err) = &result {
            dsim_warn!(self.tracer, "wait_stop_state: {}", err);
        }
        result
    }

    /// Force the D-PHY into stop state
    pub fn force_dphy_stop_state(&mut self, enable: bool) {
        dsim_trace!(self.tracer, "force_dphy_stop_state {}", enable);
        self.bus.modify(
            Reg::EscMode,
            escmode::FORCE_STOP_STATE,
            if enable { escmode::FORCE_STOP_STATE } else { 0 },
        );
    }

    // ========================================================================
    // ACTIVE MODES
    // ========================================================================

    /// Request or release the HS clock
    ///
    /// Requesting the HS clock while ULPS entry is asserted fails with
    /// [`DsimError::InvalidConfiguration`] and writes nothing.
    pub fn enable_hs_clock(&mut self, enable: bool) -> DsimResult<()> {
        if enable
            && self.bus.read(Reg::EscMode) & UlpsRequest::Enter.escmode_bits() != 0
        {
            return Err(DsimError::InvalidConfiguration(
                "HS clock requested while ULPS entry is asserted",
            ));
        }
        dsim_trace!(self.tracer, "enable_hs_clock {}", enable);
        self.bus.modify(
            Reg::ClkCtrl,
            clkctrl::TX_REQUEST_HSCLK,
            (enable as u32) << clkctrl::TX_REQUEST_HSCLK_SHIFT,
        );
        Ok(())
    }

    /// Command path transfer mode
    pub fn set_cpu_transfer_mode(&mut self, mode: TransferMode) {
        dsim_trace!(self.tracer, "set_cpu_transfer_mode {:?}", mode);
        self.set_lp_flag(escmode::CMD_LPDT_LP, mode);
    }

    /// Video (LCDC) path transfer mode
    pub fn set_lcdc_transfer_mode(&mut self, mode: TransferMode) {
        dsim_trace!(self.tracer, "set_lcdc_transfer_mode {:?}", mode);
        self.set_lp_flag(escmode::TX_LPDT_LP, mode);
    }

    fn set_lp_flag(&mut self, bit: u32, mode: TransferMode) {
        let set = match mode {
            TransferMode::Lp => bit,
            TransferMode::Hs => 0,
        };
        self.bus.modify(Reg::EscMode, bit, set);
    }

    // ========================================================================
    // ULPS
    // ========================================================================

    /// Issue a ULPS request in a single ESCMODE write
    ///
    /// All four request bits are cleared and the pattern for `req` is set,
    /// so entry and exit are never asserted together. Entry is refused with
    /// [`DsimError::InvalidConfiguration`] while the HS clock is requested;
    /// [`enter_ulps`](Self::enter_ulps) releases it first.
    pub fn set_ulps(&mut self, req: UlpsRequest) -> DsimResult<()> {
        if req == UlpsRequest::Enter
            && self.bus.read(Reg::ClkCtrl) & clkctrl::TX_REQUEST_HSCLK != 0
        {
            return Err(DsimError::InvalidConfiguration(
                "ULPS entry requested while the HS clock is requested",
            ));
        }
        self.write_ulps_request(req);
        Ok(())
    }

    fn write_ulps_request(&mut self, req: UlpsRequest) {
        dsim_trace!(self.tracer, "set_ulps {:?}", req);
        self.bus
            .modify(Reg::EscMode, escmode::ULPS_MASK, req.escmode_bits());
    }

    /// Drop the HS clock request, then request ULPS entry
    pub fn enter_ulps(&mut self) -> DsimResult<()> {
        self.enable_hs_clock(false)?;
        self.write_ulps_request(UlpsRequest::Enter);
        Ok(())
    }

    /// Request ULPS exit
    pub fn exit_ulps(&mut self) {
        self.write_ulps_request(UlpsRequest::Exit);
    }

    /// One-shot check that the lanes reached the state `req` asks for
    ///
    /// Only the clock lane and the configured data lanes are compared:
    /// for `Enter` their ULPS bits must all be set, for `Exit` all clear.
    pub fn ulps_ready(&mut self, req: UlpsRequest) -> bool {
        let desired = LinkStatus::ULPS_CLK | LinkStatus::ulps_data(self.lanes.data_mask());
        let observed = self.link_status() & desired;
        match req {
            UlpsRequest::Enter => observed == desired,
            UlpsRequest::Exit => observed.is_empty(),
        }
    }

    // ========================================================================
    // STATE OBSERVATION
    // ========================================================================

    /// Derive the current link state from STATUS, ESCMODE, CLKCTRL and CONFIG
    ///
    /// `Ulps` is reported only once STATUS shows the clock lane in ULPS; a
    /// pending entry request alone does not count.
    pub fn observe_state(&mut self) -> LinkState {
        let status = self.link_status();
        if status.contains(LinkStatus::ULPS_CLK) {
            return LinkState::Ulps;
        }

        let esc = self.bus.read(Reg::EscMode);
        if !status.contains(LinkStatus::PLL_STABLE) {
            return if self.bus.read(Reg::Config) == 0 {
                LinkState::Reset
            } else {
                LinkState::Configured
            };
        }
        if self.bus.read(Reg::ClkCtrl) & clkctrl::TX_REQUEST_HSCLK != 0 {
            return LinkState::HsActive;
        }
        if !Self::lanes_stopped(status, self.lanes.data_mask()) {
            return LinkState::ClockStable;
        }
        if esc & (escmode::CMD_LPDT_LP | escmode::TX_LPDT_LP) != 0 {
            LinkState::LpActive
        } else {
            LinkState::StopState
        }
    }

    // ========================================================================
    // BRING-UP
    // ========================================================================

    /// Take the controller from reset to lane stop state
    ///
    /// Runs the configuration steps in hardware order, waiting for PLL lock
    /// before touching the byte clock and for lane stop state at the end.
    /// Stops at the first error; registers written before it keep their
    /// new values.
    pub fn bring_up(&mut self, cfg: &LinkConfig, timing: &TimingParams) -> DsimResult<()> {
        video_interface(cfg.interface)?;
        dsim_trace!(self.tracer, "bring_up");

        // 1. reset
        self.func_reset();
        self.sw_reset();

        // 2. interface and lanes
        self.init_config(cfg);
        self.display_config(cfg)?;
        self.enable_lanes(cfg.enabled_lanes(), true);
        if cfg.dp_dn_swap != 0 {
            self.dp_dn_swap(cfg.dp_dn_swap as u32)?;
        }

        // 3. PLL
        let pll = &timing.pll;
        self.pll_freq(pll.p, pll.m, pll.s)?;
        self.pll_freq_band(pll.freq_band)?;
        self.pll_stable_time(pll.lock_time);
        self.enable_pll(true);
        self.wait_pll_stable()?;

        // 4. clocks
        self.set_byte_clock_src(timing.byte_clock_source);
        self.enable_byte_clock(true);
        self.set_esc_clk_prs(true, timing.esc_prescaler)?;
        self.enable_esc_clk_on_lane(cfg.enabled_lanes(), true);

        // 5. display timing
        let d = &timing.display;
        self.set_main_disp_resol(d.resolution.width, d.resolution.height)?;
        self.set_main_disp_vporch(d.cmd_allow, d.vfp, d.vbp)?;
        self.set_main_disp_hporch(d.hfp, d.hbp)?;
        self.set_main_disp_sync_area(d.vsa, d.hsa)?;
        if let Some(sub) = timing.sub_display {
            self.set_sub_disp_resol(sub.width, sub.height)?;
        }

        // 6. timeouts
        self.set_bta_timeout(timing.timeouts.bta)?;
        self.set_lpdr_timeout(timing.timeouts.lpdr)?;
        self.set_stop_state_counter(timing.timeouts.stop_state_count)?;

        self.wait_stop_state()?;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
