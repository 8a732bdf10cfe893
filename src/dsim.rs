//! # DSIM Controller Handle and Configuration Sequencer
//!
//! [`Dsim`] owns the register bus of one controller and implements every
//! configuration write. Link state handling lives in [`crate::link`],
//! packet I/O in [`crate::packet`]; both extend `Dsim` with further `impl`
//! blocks.
//!
//! ## Bring-up order
//!
//! ```text
//! 1. func_reset, sw_reset             (two separate writes)
//! 2. init_config / display_config     interface, burst, VC, format, lanes
//! 3. pll_freq, pll_freq_band,         then wait for STATUS.PLL_STABLE
//!    pll_stable_time, enable_pll
//! 4. byte clock source + enable, escape clock + prescaler, per-lane escape clock
//! 5. display timing                   only with standby cleared
//! 6. timeouts, stop-state counter     before the link goes active
//! ```
//!
//! Running these out of order leaves the controller in an undefined state.
//! [`Dsim::bring_up`] runs them in order.
//!
//! ## Write semantics
//!
//! Most operations are read-modify-write and leave bits outside their field
//! alone. The exceptions replace the whole register and say so in their
//! documentation: `init_config`, `set_data_lane_number`, `set_phy_tuning`,
//! `pll_stable_time`.

use crate::bus::{Delay, RegisterBus};
use crate::config::{BurstMode, ByteClockSource, InterfaceMode, LinkConfig};
use crate::field::{Field, FieldPolicy, LaneCount};
use crate::poll::PollConfig;
use crate::regs::{self, clkctrl, fields, swrst, FifoSelect, Interrupts, Lanes, Reg};
use crate::trace::{dsim_trace, Tracer};
use crate::{DsimError, DsimResult};

/// Delay between clearing and re-setting FIFO pointer bits
const FIFO_INIT_DELAY_MS: u32 = 10;

/// True for video mode, false for command mode
///
/// Any other interface is an [`DsimError::InvalidConfiguration`].
pub(crate) fn video_interface(interface: InterfaceMode) -> DsimResult<bool> {
    match interface {
        InterfaceMode::Video => Ok(true),
        InterfaceMode::Command => Ok(false),
        InterfaceMode::Unsupported(_) => Err(DsimError::InvalidConfiguration(
            "interface is not a MIPI-DSI interface",
        )),
    }
}

/// One DSIM controller
///
/// The handle owns its register bus. It is deliberately not `Clone`: a
/// second handle on the same registers would let two owners interleave
/// read-modify-write sequences.
pub struct Dsim<B: RegisterBus> {
    pub(crate) bus: B,
    /// Clock lane plus the active data lanes
    pub(crate) lanes: Lanes,
    pub(crate) policy: FieldPolicy,
    pub(crate) poll: PollConfig,
    pub(crate) tracer: Tracer,
}

impl<B: RegisterBus> Dsim<B> {
    /// Create a handle for a controller driving `data_lanes` data lanes
    pub fn new(bus: B, data_lanes: LaneCount) -> Self {
        Self {
            bus,
            lanes: Lanes::for_data_lanes(data_lanes),
            policy: FieldPolicy::default(),
            poll: PollConfig::default(),
            tracer: Tracer::disabled(),
        }
    }

    /// Install an operation tracer
    pub fn with_tracer(mut self, tracer: Tracer) -> Self {
        self.tracer = tracer;
        self
    }

    /// Select truncating or rejecting field encoding
    pub fn with_field_policy(mut self, policy: FieldPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the poll bounds
    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Give the register bus back
    pub fn release(self) -> B {
        self.bus
    }

    pub fn field_policy(&self) -> FieldPolicy {
        self.policy
    }

    pub fn poll_config(&self) -> &PollConfig {
        &self.poll
    }

    /// Clock lane plus the configured data lanes
    pub fn lanes(&self) -> Lanes {
        self.lanes
    }

    /// Number of configured data lanes
    pub fn data_lane_count(&self) -> u8 {
        self.lanes.data_mask().count_ones() as u8
    }

    /// Encode `value` into `field` under the handle's policy
    #[inline]
    pub(crate) fn encode(&self, field: Field, value: u32) -> DsimResult<u32> {
        field.encode(value, self.policy)
    }

    fn set_data_lanes(&mut self, count: LaneCount) {
        self.lanes = Lanes::for_data_lanes(count);
    }

    // ========================================================================
    // RESETS AND INTERRUPTS
    // ========================================================================

    /// Assert function reset
    pub fn func_reset(&mut self) {
        dsim_trace!(self.tracer, "func_reset");
        self.bus.set_bits(Reg::SwRst, swrst::FUNCRST);
    }

    /// Assert software reset
    pub fn sw_reset(&mut self) {
        dsim_trace!(self.tracer, "sw_reset");
        self.bus.set_bits(Reg::SwRst, swrst::SWRST);
    }

    /// Mask (`masked = true`) or unmask interrupt sources
    pub fn set_interrupt_mask(&mut self, irqs: Interrupts, masked: bool) {
        dsim_trace!(self.tracer, "set_interrupt_mask {:?} masked={}", irqs, masked);
        if masked {
            self.bus.set_bits(Reg::IntMsk, irqs.bits());
        } else {
            self.bus.clear_bits(Reg::IntMsk, irqs.bits());
        }
    }

    /// Pending interrupt sources
    pub fn interrupt_status(&mut self) -> Interrupts {
        Interrupts::from_bits_retain(self.bus.read(Reg::IntSrc))
    }

    /// Acknowledge the PLL-stable interrupt
    ///
    /// INTSRC is write-1-to-clear and this writes back everything that was
    /// pending, so any other pending source is acknowledged as well.
    pub fn clear_interrupt(&mut self) {
        dsim_trace!(self.tracer, "clear_interrupt");
        self.bus.set_bits(Reg::IntSrc, Interrupts::PLL_STABLE.bits());
    }

    /// Acknowledge every interrupt source
    pub fn clear_all_interrupts(&mut self) {
        dsim_trace!(self.tracer, "clear_all_interrupts");
        self.bus.set_bits(Reg::IntSrc, u32::MAX);
    }

    /// Re-initialise FIFO pointers
    ///
    /// Clears the selected pointer bits, waits 10 ms, then sets them again.
    pub fn init_fifo_pointer(&mut self, fifos: FifoSelect, delay: &mut impl Delay) {
        dsim_trace!(self.tracer, "init_fifo_pointer {:?}", fifos);
        let reg = self.bus.read(Reg::FifoCtrl);
        self.bus.write(Reg::FifoCtrl, reg & !fifos.bits());
        delay.delay_ms(FIFO_INIT_DELAY_MS);
        self.bus.write(Reg::FifoCtrl, reg | fifos.bits());
    }

    // ========================================================================
    // INTERFACE AND LANES
    // ========================================================================

    /// Program CONFIG from scratch
    ///
    /// Full-replace write: lane enables, pixel formats and virtual channels
    /// previously in CONFIG are cleared. Also records the lane count in the
    /// handle.
    pub fn init_config(&mut self, cfg: &LinkConfig) {
        dsim_trace!(self.tracer, "init_config {:?}", cfg);

        let mut value = fields::NUM_OF_DATA_LANE.pack(cfg.lanes.field_value());
        if cfg.auto_flush {
            value |= regs::config::AUTO_FLUSH;
        }
        if cfg.eot_disable {
            value |= regs::config::EOT_DISABLE;
        }
        if cfg.auto_vertical_count {
            value |= regs::config::AUTO_MODE;
        }
        if cfg.hse {
            value |= regs::config::HSE_MODE;
        }
        if cfg.hfp_disable {
            value |= regs::config::HFP_DISABLE;
        }
        if cfg.hbp_disable {
            value |= regs::config::HBP_DISABLE;
        }
        if cfg.hsa_disable {
            value |= regs::config::HSA_DISABLE;
        }
        if cfg.burst_mode == BurstMode::Burst {
            value |= cfg.burst_bits();
        }

        self.bus.write(Reg::Config, value);
        self.set_data_lanes(cfg.lanes);
    }

    /// Program interface mode, burst mode, virtual channel and pixel format
    ///
    /// Fails without touching any register if the interface is neither
    /// video nor command.
    pub fn display_config(&mut self, cfg: &LinkConfig) -> DsimResult<()> {
        let video = video_interface(cfg.interface)?;
        dsim_trace!(self.tracer, "display_config {:?}", cfg.interface);

        let clear = fields::BURST_MODE.mask()
            | regs::config::VIDEO_MODE
            | fields::MAIN_VC.mask()
            | fields::MAIN_PIX_FORMAT.mask()
            | fields::SUB_VC.mask()
            | fields::SUB_PIX_FORMAT.mask();
        let mut set = cfg.burst_bits()
            | fields::MAIN_VC.pack(cfg.virtual_channel.raw())
            | fields::MAIN_PIX_FORMAT.pack(cfg.pixel_format.raw());
        if video {
            set |= regs::config::VIDEO_MODE;
        }

        self.bus.modify(Reg::Config, clear, set);
        Ok(())
    }

    /// Enable or disable lanes in CONFIG
    pub fn enable_lanes(&mut self, lanes: Lanes, enable: bool) {
        dsim_trace!(self.tracer, "enable_lanes {:?} enable={}", lanes, enable);
        let bits = fields::LANE_ENABLE.pack(lanes.bits());
        if enable {
            self.bus.set_bits(Reg::Config, bits);
        } else {
            self.bus.clear_bits(Reg::Config, bits);
        }
    }

    /// Write the data lane count
    ///
    /// Full-replace write: every other CONFIG bit is cleared.
    pub fn set_data_lane_number(&mut self, count: LaneCount) {
        dsim_trace!(self.tracer, "set_data_lane_number {}", count.get());
        self.bus
            .write(Reg::Config, fields::NUM_OF_DATA_LANE.pack(count.field_value()));
        self.set_data_lanes(count);
    }

    // ========================================================================
    // D-PHY
    // ========================================================================

    /// Write the AFC code
    ///
    /// Full-replace write of PHYACCHR (AFC enable is cleared).
    pub fn set_phy_tuning(&mut self, afc_code: u32) -> DsimResult<()> {
        let value = self.encode(fields::AFC_CODE, afc_code)?;
        dsim_trace!(self.tracer, "set_phy_tuning afc={}", afc_code);
        self.bus.write(Reg::PhyAccHr, value);
        Ok(())
    }

    /// Enable AFC with `afc_code`, or disable it (code left unchanged)
    pub fn enable_afc(&mut self, enable: bool, afc_code: u32) -> DsimResult<()> {
        if enable {
            let code = self.encode(fields::AFC_CODE, afc_code)?;
            dsim_trace!(self.tracer, "enable_afc code={}", afc_code);
            self.bus.modify(
                Reg::PhyAccHr,
                fields::AFC_CODE.mask(),
                regs::AFC_ENABLE | code,
            );
        } else {
            dsim_trace!(self.tracer, "disable_afc");
            self.bus.clear_bits(Reg::PhyAccHr, regs::AFC_ENABLE);
        }
        Ok(())
    }

    /// DP/DN polarity swap (bit 0 data, bit 1 clock)
    pub fn dp_dn_swap(&mut self, swap: u32) -> DsimResult<()> {
        let value = self.encode(fields::DP_DN_SWAP, swap)?;
        dsim_trace!(self.tracer, "dp_dn_swap {:#x}", swap);
        self.bus
            .modify(Reg::PhyAccHr1, fields::DP_DN_SWAP.mask(), value);
        Ok(())
    }

    /// D-PHY HS-zero timing
    pub fn hs_zero_ctrl(&mut self, hs_zero: u32) -> DsimResult<()> {
        let value = self.encode(fields::HS_ZERO, hs_zero)?;
        dsim_trace!(self.tracer, "hs_zero_ctrl {}", hs_zero);
        self.bus.modify(Reg::PllCtrl, fields::HS_ZERO.mask(), value);
        Ok(())
    }

    /// D-PHY HS-prepare timing
    pub fn prep_ctrl(&mut self, prep: u32) -> DsimResult<()> {
        let value = self.encode(fields::PLL_PREP, prep)?;
        dsim_trace!(self.tracer, "prep_ctrl {}", prep);
        self.bus.modify(Reg::PllCtrl, fields::PLL_PREP.mask(), value);
        Ok(())
    }

    // ========================================================================
    // PLL
    // ========================================================================

    /// Program the PLL pre-divider, multiplier and scaler
    pub fn pll_freq(&mut self, p: u32, m: u32, s: u32) -> DsimResult<()> {
        let value = self.encode(fields::PLL_P, p)?
            | self.encode(fields::PLL_M, m)?
            | self.encode(fields::PLL_S, s)?;
        dsim_trace!(self.tracer, "pll_freq p={} m={} s={}", p, m, s);
        self.bus.modify(Reg::PllCtrl, fields::PLL_PMS.mask(), value);
        Ok(())
    }

    /// Program the PLL frequency band
    pub fn pll_freq_band(&mut self, band: u32) -> DsimResult<()> {
        let value = self.encode(fields::FREQ_BAND, band)?;
        dsim_trace!(self.tracer, "pll_freq_band {}", band);
        self.bus.modify(Reg::PllCtrl, fields::FREQ_BAND.mask(), value);
        Ok(())
    }

    /// Program the PLL lock timer (full-replace write of PLLTMR)
    pub fn pll_stable_time(&mut self, lock_time: u32) {
        dsim_trace!(self.tracer, "pll_stable_time {}", lock_time);
        self.bus.write(Reg::PllTmr, lock_time);
    }

    /// Start or stop the PLL
    pub fn enable_pll(&mut self, enable: bool) {
        dsim_trace!(self.tracer, "enable_pll {}", enable);
        self.bus
            .modify(Reg::PllCtrl, regs::PLL_ENABLE, fields::PLL_EN.pack(enable as u32));
    }

    /// Route the external clock around the PLL
    pub fn enable_pll_bypass(&mut self, enable: bool) {
        dsim_trace!(self.tracer, "enable_pll_bypass {}", enable);
        self.bus.modify(
            Reg::ClkCtrl,
            clkctrl::PLL_BYPASS_EXTERNAL,
            (enable as u32) << clkctrl::PLL_BYPASS_SHIFT,
        );
    }

    // ========================================================================
    // CLOCKS
    // ========================================================================

    /// Select the byte clock source
    pub fn set_byte_clock_src(&mut self, src: ByteClockSource) {
        dsim_trace!(self.tracer, "set_byte_clock_src {:?}", src);
        self.bus.modify(
            Reg::ClkCtrl,
            fields::BYTE_CLK_SRC.mask(),
            fields::BYTE_CLK_SRC.pack(src.raw()),
        );
    }

    /// Byte clock enable
    ///
    /// The bit is written as `!enable`, unlike every other enable in
    /// CLKCTRL. Keep it that way until the polarity is confirmed against
    /// the datasheet for each supported SoC.
    pub fn enable_byte_clock(&mut self, enable: bool) {
        dsim_trace!(self.tracer, "enable_byte_clock {}", enable);
        self.bus.modify(
            Reg::ClkCtrl,
            clkctrl::BYTE_CLKEN,
            ((!enable) as u32) << clkctrl::BYTE_CLKEN_SHIFT,
        );
    }

    /// Escape clock enable and prescaler
    ///
    /// The prescaler field is cleared in both cases and only written when
    /// enabling.
    pub fn set_esc_clk_prs(&mut self, enable: bool, prescaler: u32) -> DsimResult<()> {
        let prs = if enable {
            self.encode(fields::ESC_PRESCALER, prescaler)?
        } else {
            0
        };
        dsim_trace!(self.tracer, "set_esc_clk_prs enable={} prs={}", enable, prescaler);
        self.bus.modify(
            Reg::ClkCtrl,
            clkctrl::ESC_CLKEN | fields::ESC_PRESCALER.mask(),
            ((enable as u32) << clkctrl::ESC_CLKEN_SHIFT) | prs,
        );
        Ok(())
    }

    /// Gate the escape clock per lane
    pub fn enable_esc_clk_on_lane(&mut self, lanes: Lanes, enable: bool) {
        dsim_trace!(self.tracer, "enable_esc_clk_on_lane {:?} enable={}", lanes, enable);
        let bits = fields::LANE_ESC_CLKEN.pack(lanes.bits());
        if enable {
            self.bus.set_bits(Reg::ClkCtrl, bits);
        } else {
            self.bus.clear_bits(Reg::ClkCtrl, bits);
        }
    }

    // ========================================================================
    // DISPLAY TIMING
    // ========================================================================

    /// Main display resolution
    ///
    /// Timing registers are latched on the standby transition, so this
    /// writes MDRESOL three times: standby cleared, then the new fields
    /// with standby set, then that value once more.
    pub fn set_main_disp_resol(&mut self, width: u32, height: u32) -> DsimResult<()> {
        let fields_value =
            self.encode(fields::MAIN_HRESOL, width)? | self.encode(fields::MAIN_VRESOL, height)?;
        dsim_trace!(self.tracer, "set_main_disp_resol {}x{}", width, height);

        let reg = self.bus.read(Reg::MdResol) & !regs::STAND_BY;
        self.bus.write(Reg::MdResol, reg);

        let reg = (reg & !(fields::MAIN_HRESOL.mask() | fields::MAIN_VRESOL.mask()))
            | fields_value
            | regs::STAND_BY;
        self.bus.write(Reg::MdResol, reg);
        self.bus.write(Reg::MdResol, reg);
        Ok(())
    }

    /// Main display vertical porch and command-allow window
    pub fn set_main_disp_vporch(&mut self, cmd_allow: u32, vfront: u32, vback: u32) -> DsimResult<()> {
        let value = self.encode(fields::CMD_ALLOW, cmd_allow)?
            | self.encode(fields::STABLE_VFP, vfront)?
            | self.encode(fields::MAIN_VBP, vback)?;
        dsim_trace!(
            self.tracer,
            "set_main_disp_vporch cmd_allow={:#x} vfp={:#x} vbp={:#x}",
            cmd_allow,
            vfront,
            vback
        );
        self.bus.modify(
            Reg::MvPorch,
            fields::CMD_ALLOW.mask() | fields::STABLE_VFP.mask() | fields::MAIN_VBP.mask(),
            value,
        );
        Ok(())
    }

    /// Main display horizontal porch
    pub fn set_main_disp_hporch(&mut self, front: u32, back: u32) -> DsimResult<()> {
        let value =
            self.encode(fields::MAIN_HFP, front)? | self.encode(fields::MAIN_HBP, back)?;
        dsim_trace!(self.tracer, "set_main_disp_hporch hfp={} hbp={}", front, back);
        self.bus.modify(
            Reg::MhPorch,
            fields::MAIN_HFP.mask() | fields::MAIN_HBP.mask(),
            value,
        );
        Ok(())
    }

    /// Main display sync widths
    pub fn set_main_disp_sync_area(&mut self, vert: u32, hori: u32) -> DsimResult<()> {
        let value = self.encode(fields::MAIN_VSA, vert)? | self.encode(fields::MAIN_HSA, hori)?;
        dsim_trace!(self.tracer, "set_main_disp_sync_area vsa={} hsa={}", vert, hori);
        self.bus.modify(
            Reg::MSync,
            fields::MAIN_VSA.mask() | fields::MAIN_HSA.mask(),
            value,
        );
        Ok(())
    }

    /// Sub display resolution
    ///
    /// SDRESOL is rebuilt from zero: cleared, written with the resolution,
    /// and written once more with standby set if both dimensions are
    /// non-zero.
    pub fn set_sub_disp_resol(&mut self, width: u32, height: u32) -> DsimResult<()> {
        let mut reg =
            self.encode(fields::SUB_HRESOL, width)? | self.encode(fields::SUB_VRESOL, height)?;
        dsim_trace!(self.tracer, "set_sub_disp_resol {}x{}", width, height);

        self.bus.write(Reg::SdResol, 0);
        self.bus.write(Reg::SdResol, reg);
        if width != 0 && height != 0 {
            reg |= regs::STAND_BY;
        }
        self.bus.write(Reg::SdResol, reg);
        Ok(())
    }

    // ========================================================================
    // TIMEOUTS
    // ========================================================================

    /// Bus turn-around timeout
    pub fn set_bta_timeout(&mut self, timeout: u32) -> DsimResult<()> {
        let value = self.encode(fields::BTA_TOUT, timeout)?;
        dsim_trace!(self.tracer, "set_bta_timeout {:#x}", timeout);
        self.bus.modify(Reg::Timeout, fields::BTA_TOUT.mask(), value);
        Ok(())
    }

    /// Low-power data receive timeout
    pub fn set_lpdr_timeout(&mut self, timeout: u32) -> DsimResult<()> {
        let value = self.encode(fields::LPDR_TOUT, timeout)?;
        dsim_trace!(self.tracer, "set_lpdr_timeout {:#x}", timeout);
        self.bus.modify(Reg::Timeout, fields::LPDR_TOUT.mask(), value);
        Ok(())
    }

    /// Stop-state counter
    pub fn set_stop_state_counter(&mut self, count: u32) -> DsimResult<()> {
        let value = self.encode(fields::STOP_STATE_CNT, count)?;
        dsim_trace!(self.tracer, "set_stop_state_counter {:#x}", count);
        self.bus
            .modify(Reg::EscMode, fields::STOP_STATE_CNT.mask(), value);
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::mock::MockBus;
    use crate::config::{BurstEncoding, PixelFormat};
    use crate::regs::STAND_BY;
    use crate::trace::tests::CaptureLog;

    fn dsim(bus: MockBus) -> Dsim<MockBus> {
        Dsim::new(bus, LaneCount::new(4).unwrap())
    }

    fn video_cfg() -> LinkConfig {
        LinkConfig::video(LaneCount::new(4).unwrap(), BurstMode::Burst, PixelFormat::Rgb888)
    }

    #[test]
    fn test_resets_are_separate_writes() {
        let mut d = dsim(MockBus::new());
        d.func_reset();
        d.sw_reset();
        let bus = d.release();
        assert_eq!(bus.writes_to(Reg::SwRst), vec![1 << 16, (1 << 16) | 1]);
    }

    #[test]
    fn test_display_config_video_sets_interface_bit() {
        let mut d = dsim(MockBus::new().with(Reg::Config, 0x1F));
        d.display_config(&video_cfg()).unwrap();
        let cfg = d.release().value(Reg::Config);

        assert_ne!(cfg & (1 << 25), 0);
        assert_eq!(fields::BURST_MODE.unpack(cfg), 3);
        assert_eq!(fields::MAIN_PIX_FORMAT.unpack(cfg), 7);
        assert_eq!(fields::MAIN_VC.unpack(cfg), 0);
        // lane enables survive the read-modify-write
        assert_eq!(cfg & 0x1F, 0x1F);
    }

    #[test]
    fn test_display_config_command_clears_interface_bit() {
        let mut cfg = video_cfg();
        cfg.interface = InterfaceMode::Command;
        cfg.burst_mode = BurstMode::NonVideo;
        cfg.virtual_channel = crate::config::VirtualChannel::Vc2;

        let mut d = dsim(MockBus::new().with(Reg::Config, (1 << 25) | (3 << 26)));
        d.display_config(&cfg).unwrap();
        let value = d.release().value(Reg::Config);

        assert_eq!(value & (1 << 25), 0);
        // NonVideo (4) keeps only its low two bits
        assert_eq!(fields::BURST_MODE.unpack(value), 0);
        assert_eq!(fields::MAIN_VC.unpack(value), 2);
    }

    #[test]
    fn test_display_config_rejects_unsupported_interface() {
        let mut cfg = video_cfg();
        cfg.interface = InterfaceMode::Unsupported(2);

        let mut d = dsim(MockBus::new().with(Reg::Config, 0xABCD));
        let err = d.display_config(&cfg).unwrap_err();
        assert!(matches!(err, DsimError::InvalidConfiguration(_)));

        let bus = d.release();
        assert!(bus.writes.is_empty());
        assert!(bus.reads.is_empty());
        assert_eq!(bus.value(Reg::Config), 0xABCD);
    }

    #[test]
    fn test_display_config_honours_burst_encoding() {
        let mut cfg = video_cfg();
        cfg.burst_encoding = BurstEncoding::Legacy;

        let mut d = dsim(MockBus::new().with(Reg::Config, 3 << 26));
        d.init_config(&cfg);
        d.display_config(&cfg).unwrap();
        assert_eq!(fields::BURST_MODE.unpack(d.bus.value(Reg::Config)), 0b01);

        cfg.burst_encoding = BurstEncoding::SyncInform;
        d.display_config(&cfg).unwrap();
        assert_eq!(fields::BURST_MODE.unpack(d.bus.value(Reg::Config)), 0b11);
    }

    #[test]
    fn test_init_config_full_replace() {
        let mut cfg = video_cfg();
        cfg.auto_flush = true;
        cfg.eot_disable = true;
        cfg.hse = true;
        cfg.hsa_disable = true;
        cfg.lanes = LaneCount::new(2).unwrap();

        let mut d = dsim(MockBus::new().with(Reg::Config, 0xFFFF_FFFF));
        d.init_config(&cfg);
        assert_eq!(d.data_lane_count(), 2);

        let value = d.release().value(Reg::Config);
        let expected = (1 << 29) | (1 << 28) | (1 << 23) | (1 << 20) | (1 << 5) | (1 << 26) | (1 << 27);
        assert_eq!(value, expected);
    }

    #[test]
    fn test_init_config_burst_encodings() {
        let mut cfg = video_cfg();
        cfg.burst_encoding = BurstEncoding::Legacy;
        let mut d = dsim(MockBus::new());
        d.init_config(&cfg);
        let legacy = d.release().value(Reg::Config);
        assert_eq!(legacy & (3 << 26), 1 << 26);

        cfg.burst_encoding = BurstEncoding::SyncInform;
        let mut d = dsim(MockBus::new());
        d.init_config(&cfg);
        let sync = d.release().value(Reg::Config);
        assert_eq!(sync & (3 << 26), 3 << 26);

        cfg.burst_mode = BurstMode::NonBurstSyncPulse;
        let mut d = dsim(MockBus::new());
        d.init_config(&cfg);
        assert_eq!(d.release().value(Reg::Config) & (3 << 26), 0);
    }

    #[test]
    fn test_lane_enable_and_number() {
        let mut d = dsim(MockBus::new().with(Reg::Config, 1 << 25));
        d.enable_lanes(Lanes::CLOCK | Lanes::DATA0 | Lanes::DATA1, true);
        assert_eq!(d.bus.value(Reg::Config), (1 << 25) | 0b00111);
        d.enable_lanes(Lanes::DATA1, false);
        assert_eq!(d.bus.value(Reg::Config), (1 << 25) | 0b00011);

        d.set_data_lane_number(LaneCount::new(3).unwrap());
        assert_eq!(d.bus.value(Reg::Config), 2 << 5);
        assert_eq!(d.lanes(), Lanes::CLOCK | Lanes::DATA0 | Lanes::DATA1 | Lanes::DATA2);
    }

    #[test]
    fn test_main_resolution_standby_sequence() {
        let mut d = dsim(MockBus::new().with(Reg::MdResol, STAND_BY));
        d.set_main_disp_resol(1080, 1920).unwrap();

        let bus = d.release();
        let writes = bus.writes_to(Reg::MdResol);
        assert_eq!(writes.len(), 3);
        // standby cleared, nothing else changed yet
        assert_eq!(writes[0], 0);

        // fields and standby in one write
        assert_ne!(writes[1] & STAND_BY, 0);
        assert_eq!(fields::MAIN_HRESOL.unpack(writes[1]), 1080);
        assert_eq!(fields::MAIN_VRESOL.unpack(writes[1]), 1920);

        let last = writes[2];
        assert_eq!(last, writes[1]);
        assert_ne!(last & STAND_BY, 0);
        assert_eq!(fields::MAIN_HRESOL.unpack(last), 1080);
        assert_eq!(fields::MAIN_VRESOL.unpack(last), 1920);
        assert_eq!(last, (1920 << 16) | 1080 | STAND_BY);
    }

    #[test]
    fn test_main_resolution_reject_policy_writes_nothing() {
        let mut d =
            dsim(MockBus::new().with(Reg::MdResol, STAND_BY)).with_field_policy(FieldPolicy::Reject);
        let err = d.set_main_disp_resol(2048, 1920).unwrap_err();
        assert_eq!(
            err,
            DsimError::FieldOverflow {
                field: "main_hresol",
                value: 2048,
                width: 11
            }
        );
        assert!(d.release().writes.is_empty());
    }

    #[test]
    fn test_main_resolution_truncates_by_default() {
        let mut d = dsim(MockBus::new());
        d.set_main_disp_resol(2048 + 5, 1920).unwrap();
        let last = d.release().value(Reg::MdResol);
        assert_eq!(fields::MAIN_HRESOL.unpack(last), 5);
    }

    #[test]
    fn test_sub_resolution_sequence() {
        let mut d = dsim(MockBus::new().with(Reg::SdResol, 0xFFFF_FFFF));
        d.set_sub_disp_resol(320, 240).unwrap();
        let writes = d.release().writes_to(Reg::SdResol);
        assert_eq!(writes, vec![0, (240 << 16) | 320, (240 << 16) | 320 | STAND_BY]);

        let mut d = dsim(MockBus::new());
        d.set_sub_disp_resol(0, 240).unwrap();
        let writes = d.release().writes_to(Reg::SdResol);
        assert_eq!(writes, vec![0, 240 << 16, 240 << 16]);
    }

    #[test]
    fn test_porches_and_sync_preserve_other_bits() {
        let mut d = dsim(MockBus::new().with(Reg::MvPorch, 0x0800_F800));
        d.set_main_disp_vporch(0x1, 14, 10).unwrap();
        assert_eq!(d.bus.value(Reg::MvPorch), (1 << 28) | (14 << 16) | 10 | 0x0800_F800);

        d.set_main_disp_hporch(60, 80).unwrap();
        assert_eq!(d.bus.value(Reg::MhPorch), (60 << 16) | 80);

        d.bus.write(Reg::MSync, 0x0020_0000);
        d.set_main_disp_sync_area(2, 20).unwrap();
        assert_eq!(d.bus.value(Reg::MSync), (2 << 22) | 0x0020_0000 | 20);
    }

    #[test]
    fn test_pll_programming() {
        // bits outside P/M/S (enable, band) must survive
        let initial = (1 << 23) | (0xF << 24) | 1;
        let mut d = dsim(MockBus::new().with(Reg::PllCtrl, initial | (0x7FFFF << 1)));
        d.pll_freq(3, 115, 1).unwrap();
        let value = d.bus.value(Reg::PllCtrl);
        assert_eq!(value, initial | (3 << 13) | (115 << 4) | (1 << 1));
        assert_eq!(fields::PLL_P.unpack(value), 3);
        assert_eq!(fields::PLL_M.unpack(value), 115);
        assert_eq!(fields::PLL_S.unpack(value), 1);

        d.pll_freq_band(0x1F).unwrap();
        assert_eq!(fields::FREQ_BAND.unpack(d.bus.value(Reg::PllCtrl)), 0x1F);

        d.enable_pll(false);
        assert_eq!(d.bus.value(Reg::PllCtrl) & (1 << 23), 0);
        d.enable_pll(true);
        assert_ne!(d.bus.value(Reg::PllCtrl) & (1 << 23), 0);

        d.bus.write(Reg::PllTmr, 0xFFFF_FFFF);
        d.pll_stable_time(500);
        assert_eq!(d.bus.value(Reg::PllTmr), 500);
    }

    #[test]
    fn test_pll_reject_policy() {
        let mut d = dsim(MockBus::new()).with_field_policy(FieldPolicy::Reject);
        assert!(d.pll_freq(64, 1, 1).unwrap_err().is_invalid_configuration());
        assert!(d.pll_freq(1, 512, 1).is_err());
        assert!(d.pll_freq(1, 1, 8).is_err());
        assert!(d.release().writes.is_empty());
    }

    #[test]
    fn test_byte_clock_enable_is_inverted() {
        let mut d = dsim(MockBus::new().with(Reg::ClkCtrl, 0));
        d.enable_byte_clock(true);
        assert_eq!(d.bus.value(Reg::ClkCtrl) & clkctrl::BYTE_CLKEN, 0);
        d.enable_byte_clock(false);
        assert_eq!(d.bus.value(Reg::ClkCtrl) & clkctrl::BYTE_CLKEN, clkctrl::BYTE_CLKEN);
    }

    #[test]
    fn test_clock_control_fields() {
        let mut d = dsim(MockBus::new().with(Reg::ClkCtrl, 0xFFFF));
        d.set_byte_clock_src(ByteClockSource::ExternalBypass);
        assert_eq!(fields::BYTE_CLK_SRC.unpack(d.bus.value(Reg::ClkCtrl)), 2);

        d.set_esc_clk_prs(true, 7).unwrap();
        let v = d.bus.value(Reg::ClkCtrl);
        assert_ne!(v & clkctrl::ESC_CLKEN, 0);
        assert_eq!(v & 0xFFFF, 7);

        d.set_esc_clk_prs(false, 7).unwrap();
        let v = d.bus.value(Reg::ClkCtrl);
        assert_eq!(v & clkctrl::ESC_CLKEN, 0);
        assert_eq!(v & 0xFFFF, 0);

        d.enable_esc_clk_on_lane(Lanes::CLOCK | Lanes::DATA_ALL, true);
        assert_eq!(fields::LANE_ESC_CLKEN.unpack(d.bus.value(Reg::ClkCtrl)), 0x1F);
        d.enable_esc_clk_on_lane(Lanes::DATA3, false);
        assert_eq!(fields::LANE_ESC_CLKEN.unpack(d.bus.value(Reg::ClkCtrl)), 0x0F);

        d.enable_pll_bypass(true);
        assert_ne!(d.bus.value(Reg::ClkCtrl) & clkctrl::PLL_BYPASS_EXTERNAL, 0);
    }

    #[test]
    fn test_dphy_controls() {
        let mut d = dsim(MockBus::new().with(Reg::PhyAccHr, 0xFF));
        d.set_phy_tuning(0x3).unwrap();
        assert_eq!(d.bus.value(Reg::PhyAccHr), 0x3 << 5);

        d.enable_afc(true, 0x5).unwrap();
        assert_eq!(d.bus.value(Reg::PhyAccHr), (1 << 14) | (0x5 << 5));
        d.enable_afc(false, 0).unwrap();
        assert_eq!(d.bus.value(Reg::PhyAccHr), 0x5 << 5);

        d.dp_dn_swap(0x2).unwrap();
        assert_eq!(d.bus.value(Reg::PhyAccHr1), 0x2);

        d.hs_zero_ctrl(0xA).unwrap();
        d.prep_ctrl(0x5).unwrap();
        let pll = d.bus.value(Reg::PllCtrl);
        assert_eq!(fields::HS_ZERO.unpack(pll), 0xA);
        assert_eq!(fields::PLL_PREP.unpack(pll), 0x5);
    }

    #[test]
    fn test_timeouts_share_register() {
        let mut d = dsim(MockBus::new());
        d.set_bta_timeout(0xFF).unwrap();
        d.set_lpdr_timeout(0xFFFF).unwrap();
        assert_eq!(d.bus.value(Reg::Timeout), 0x00FF_FFFF);

        d.set_bta_timeout(0x1FF).unwrap();
        assert_eq!(d.bus.value(Reg::Timeout), 0x00FF_FFFF);

        d.bus.write(Reg::EscMode, 0x3);
        d.set_stop_state_counter(0xF).unwrap();
        assert_eq!(d.bus.value(Reg::EscMode), (0xF << 21) | 0x3);
    }

    #[test]
    fn test_interrupts() {
        let mut d = dsim(MockBus::new());
        d.set_interrupt_mask(Interrupts::FRAME_DONE | Interrupts::RX_ACK, true);
        assert_eq!(d.bus.value(Reg::IntMsk), (1 << 24) | (1 << 16));
        d.set_interrupt_mask(Interrupts::RX_ACK, false);
        assert_eq!(d.bus.value(Reg::IntMsk), 1 << 24);

        d.bus.write(Reg::IntSrc, 1 << 24);
        assert_eq!(d.interrupt_status(), Interrupts::FRAME_DONE);
        d.clear_interrupt();
        assert_eq!(d.bus.value(Reg::IntSrc), (1 << 31) | (1 << 24));
        d.clear_all_interrupts();
        assert_eq!(d.bus.value(Reg::IntSrc), u32::MAX);
    }

    #[test]
    fn test_fifo_pointer_init_waits_between_writes() {
        let mut d = dsim(MockBus::new().with(Reg::FifoCtrl, 0x1F));
        let mut waited = Vec::new();
        d.init_fifo_pointer(FifoSelect::SFR | FifoSelect::RX, &mut |ms: u32| waited.push(ms));

        assert_eq!(waited, vec![10]);
        assert_eq!(d.release().writes_to(Reg::FifoCtrl), vec![0x07, 0x1F]);
    }

    #[test]
    fn test_tracer_sees_operations() {
        let sink = CaptureLog::leak(log::Level::Debug);
        let mut d = dsim(MockBus::new()).with_tracer(Tracer::new(sink));
        d.func_reset();
        d.pll_freq(3, 115, 1).unwrap();

        let lines = sink.messages();
        assert_eq!(lines[0], "func_reset");
        assert_eq!(lines[1], "pll_freq p=3 m=115 s=1");
    }
}
