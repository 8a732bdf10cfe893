//! # DSIM Register Map
//!
//! Base-relative register offsets, single-bit controls and the field table
//! for the DSIM controller. Every shift and width here must match silicon;
//! a wrong value corrupts controller state instead of failing.
//!
//! ## Register Layout
//!
//! | Offset | Register  | Purpose                              |
//! |--------|-----------|--------------------------------------|
//! | 0x00   | STATUS    | Lane, ULPS and PLL status            |
//! | 0x04   | SWRST     | Software / function reset            |
//! | 0x08   | CLKCTRL   | Byte, escape and HS clock control    |
//! | 0x0C   | TIMEOUT   | BTA and LPDR timeouts                |
//! | 0x10   | CONFIG    | Interface, lanes, burst, pixel format|
//! | 0x14   | ESCMODE   | Escape mode, ULPS, stop state        |
//! | 0x18   | MDRESOL   | Main display resolution + standby    |
//! | 0x1C   | MVPORCH   | Main display vertical porch          |
//! | 0x20   | MHPORCH   | Main display horizontal porch        |
//! | 0x24   | MSYNC     | Main display sync area               |
//! | 0x28   | SDRESOL   | Sub display resolution + standby     |
//! | 0x2C   | INTSRC    | Interrupt source (write 1 to clear)  |
//! | 0x30   | INTMSK    | Interrupt mask                       |
//! | 0x34   | PKTHDR    | Packet header FIFO                   |
//! | 0x38   | PAYLOAD   | Payload FIFO                         |
//! | 0x3C   | RXFIFO    | Read FIFO                            |
//! | 0x40   | FIFOTHLD  | FIFO threshold                       |
//! | 0x44   | FIFOCTRL  | FIFO status and pointer init         |
//! | 0x48   | MEMACCHR  | FIFO memory AC characteristic        |
//! | 0x4C   | PLLCTRL   | PLL P/M/S, band, enable, D-PHY timing|
//! | 0x50   | PLLTMR    | PLL lock timer                       |
//! | 0x54   | PHYACCHR  | D-PHY AC characteristic (AFC)        |
//! | 0x58   | PHYACCHR1 | D-PHY AC characteristic 1 (DP/DN)    |

use bitflags::bitflags;

/// DSIM registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg {
    Status,
    SwRst,
    ClkCtrl,
    Timeout,
    Config,
    EscMode,
    MdResol,
    MvPorch,
    MhPorch,
    MSync,
    SdResol,
    IntSrc,
    IntMsk,
    PktHdr,
    Payload,
    RxFifo,
    FifoThld,
    FifoCtrl,
    MemAccHr,
    PllCtrl,
    PllTmr,
    PhyAccHr,
    PhyAccHr1,
}

impl Reg {
    /// Offset from the controller base address
    pub const fn offset(self) -> usize {
        match self {
            Reg::Status => 0x00,
            Reg::SwRst => 0x04,
            Reg::ClkCtrl => 0x08,
            Reg::Timeout => 0x0C,
            Reg::Config => 0x10,
            Reg::EscMode => 0x14,
            Reg::MdResol => 0x18,
            Reg::MvPorch => 0x1C,
            Reg::MhPorch => 0x20,
            Reg::MSync => 0x24,
            Reg::SdResol => 0x28,
            Reg::IntSrc => 0x2C,
            Reg::IntMsk => 0x30,
            Reg::PktHdr => 0x34,
            Reg::Payload => 0x38,
            Reg::RxFifo => 0x3C,
            Reg::FifoThld => 0x40,
            Reg::FifoCtrl => 0x44,
            Reg::MemAccHr => 0x48,
            Reg::PllCtrl => 0x4C,
            Reg::PllTmr => 0x50,
            Reg::PhyAccHr => 0x54,
            Reg::PhyAccHr1 => 0x58,
        }
    }

    /// Size of the register window covered by [`Reg`]
    pub const WINDOW: usize = 0x5C;
}

// ============================================================================
// SINGLE-BIT CONTROLS
// ============================================================================

/// SWRST register bits
pub mod swrst {
    /// Function reset
    pub const FUNCRST: u32 = 1 << 16;
    /// Software reset
    pub const SWRST: u32 = 1 << 0;
}

/// CLKCTRL register bits
pub mod clkctrl {
    pub const BYTE_CLKEN_SHIFT: u32 = 24;
    pub const PLL_BYPASS_SHIFT: u32 = 27;
    pub const ESC_CLKEN_SHIFT: u32 = 28;
    pub const TX_REQUEST_HSCLK_SHIFT: u32 = 31;

    pub const BYTE_CLKEN: u32 = 1 << BYTE_CLKEN_SHIFT;
    pub const PLL_BYPASS_EXTERNAL: u32 = 1 << PLL_BYPASS_SHIFT;
    pub const ESC_CLKEN: u32 = 1 << ESC_CLKEN_SHIFT;
    pub const TX_REQUEST_HSCLK: u32 = 1 << TX_REQUEST_HSCLK_SHIFT;
}

/// CONFIG register bits
pub mod config {
    pub const HSA_DISABLE: u32 = 1 << 20;
    pub const HBP_DISABLE: u32 = 1 << 21;
    pub const HFP_DISABLE: u32 = 1 << 22;
    pub const HSE_MODE: u32 = 1 << 23;
    pub const AUTO_MODE: u32 = 1 << 24;
    pub const VIDEO_MODE: u32 = 1 << 25;
    pub const BURST_MODE: u32 = 1 << 26;
    pub const SYNC_INFORM: u32 = 1 << 27;
    pub const EOT_DISABLE: u32 = 1 << 28;
    pub const AUTO_FLUSH: u32 = 1 << 29;
}

/// ESCMODE register bits
pub mod escmode {
    pub const TX_ULPS_CLK_EXIT: u32 = 1 << 0;
    pub const TX_ULPS_CLK: u32 = 1 << 1;
    pub const TX_ULPS_DAT_EXIT: u32 = 1 << 2;
    pub const TX_ULPS_DAT: u32 = 1 << 3;
    pub const TX_TRIGGER_RST: u32 = 1 << 4;
    pub const TX_LPDT_LP: u32 = 1 << 6;
    pub const CMD_LPDT_LP: u32 = 1 << 7;
    pub const FORCE_STOP_STATE: u32 = 1 << 20;

    /// All four ULPS request bits
    pub const ULPS_MASK: u32 = TX_ULPS_CLK_EXIT | TX_ULPS_CLK | TX_ULPS_DAT_EXIT | TX_ULPS_DAT;
}

/// MDRESOL / SDRESOL standby bit
pub const STAND_BY: u32 = 1 << 31;

/// PHYACCHR AFC enable
pub const AFC_ENABLE: u32 = 1 << 14;

/// PLLCTRL PLL enable
pub const PLL_ENABLE: u32 = 1 << 23;

// ============================================================================
// BIT SETS
// ============================================================================

bitflags! {
    /// Clock and data lanes, laid out as in CONFIG[4:0] and CLKCTRL[23:19]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Lanes: u32 {
        const CLOCK = 1 << 0;
        const DATA0 = 1 << 1;
        const DATA1 = 1 << 2;
        const DATA2 = 1 << 3;
        const DATA3 = 1 << 4;
        const DATA_ALL = Self::DATA0.bits() | Self::DATA1.bits()
            | Self::DATA2.bits() | Self::DATA3.bits();
    }
}

impl Lanes {
    /// Clock lane plus the first `count` data lanes
    pub const fn for_data_lanes(count: crate::LaneCount) -> Self {
        let data = ((1u32 << count.get() as u32) - 1) << 1;
        Self::from_bits_retain(Self::CLOCK.bits() | data)
    }

    /// Data lanes as a 4-bit mask (DATA0 = bit 0), the layout STATUS uses
    pub const fn data_mask(self) -> u32 {
        (self.bits() >> 1) & 0xF
    }
}

bitflags! {
    /// INTSRC / INTMSK bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Interrupts: u32 {
        const PLL_STABLE = 1 << 31;
        const SW_RST_RELEASE = 1 << 30;
        const SFR_FIFO_EMPTY = 1 << 29;
        const BUS_TURN_OVER = 1 << 25;
        const FRAME_DONE = 1 << 24;
        const LPDR_TIMEOUT = 1 << 21;
        const TA_TIMEOUT = 1 << 20;
        const RX_DATA_DONE = 1 << 18;
        const RX_TE = 1 << 17;
        const RX_ACK = 1 << 16;
        const RX_ECC_ERR = 1 << 15;
        const RX_CRC_ERR = 1 << 14;
    }
}

bitflags! {
    /// FIFOCTRL pointer initialisation bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FifoSelect: u32 {
        const MAIN_DISPLAY = 1 << 0;
        const SUB_DISPLAY = 1 << 1;
        const I80 = 1 << 2;
        const SFR = 1 << 3;
        const RX = 1 << 4;
    }
}

bitflags! {
    /// FIFOCTRL status bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FifoStatus: u32 {
        const RX_DATA_FULL = 1 << 25;
        const RX_DATA_EMPTY = 1 << 24;
        const SFR_HEADER_FULL = 1 << 23;
        const SFR_HEADER_EMPTY = 1 << 22;
        const SFR_PAYLOAD_FULL = 1 << 21;
        const SFR_PAYLOAD_EMPTY = 1 << 20;
        const I80_HEADER_FULL = 1 << 19;
        const I80_HEADER_EMPTY = 1 << 18;
        const I80_PAYLOAD_FULL = 1 << 17;
        const I80_PAYLOAD_EMPTY = 1 << 16;
        const SD_HEADER_FULL = 1 << 15;
        const SD_HEADER_EMPTY = 1 << 14;
        const SD_PAYLOAD_FULL = 1 << 13;
        const SD_PAYLOAD_EMPTY = 1 << 12;
        const MD_HEADER_FULL = 1 << 11;
        const MD_HEADER_EMPTY = 1 << 10;
        const MD_PAYLOAD_FULL = 1 << 9;
        const MD_PAYLOAD_EMPTY = 1 << 8;
    }
}

bitflags! {
    /// STATUS register bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LinkStatus: u32 {
        const STOP_STATE_DAT0 = 1 << 0;
        const STOP_STATE_DAT1 = 1 << 1;
        const STOP_STATE_DAT2 = 1 << 2;
        const STOP_STATE_DAT3 = 1 << 3;
        const ULPS_DAT0 = 1 << 4;
        const ULPS_DAT1 = 1 << 5;
        const ULPS_DAT2 = 1 << 6;
        const ULPS_DAT3 = 1 << 7;
        const STOP_STATE_CLK = 1 << 8;
        const ULPS_CLK = 1 << 9;
        const TX_READY_HS_CLK = 1 << 10;
        const PLL_STABLE = 1 << 31;
    }
}

impl LinkStatus {
    /// Stop-state bits for a 4-bit data lane mask
    pub const fn stop_state_data(mask: u32) -> Self {
        Self::from_bits_retain(mask & 0xF)
    }

    /// ULPS bits for a 4-bit data lane mask
    pub const fn ulps_data(mask: u32) -> Self {
        Self::from_bits_retain((mask & 0xF) << 4)
    }
}

// ============================================================================
// FIELD TABLE
// ============================================================================

/// Multi-bit fields, named after the register they live in
pub mod fields {
    use crate::field::Field;

    // CONFIG
    pub const LANE_ENABLE: Field = Field::new("lane_enable", 0, 5);
    pub const NUM_OF_DATA_LANE: Field = Field::new("num_of_data_lane", 5, 3);
    pub const SUB_PIX_FORMAT: Field = Field::new("sub_pix_format", 8, 3);
    pub const MAIN_PIX_FORMAT: Field = Field::new("main_pix_format", 12, 3);
    pub const SUB_VC: Field = Field::new("sub_vc", 16, 2);
    pub const MAIN_VC: Field = Field::new("main_vc", 18, 2);
    pub const BURST_MODE: Field = Field::new("burst_mode", 26, 2);

    // PLLCTRL
    pub const PLL_S: Field = Field::new("pll_s", 1, 3);
    pub const PLL_M: Field = Field::new("pll_m", 4, 9);
    pub const PLL_P: Field = Field::new("pll_p", 13, 6);
    pub const PLL_PMS: Field = Field::new("pll_pms", 1, 19);
    pub const PLL_EN: Field = Field::new("pll_en", 23, 1);
    pub const PLL_PREP: Field = Field::new("pll_prep", 20, 3);
    pub const FREQ_BAND: Field = Field::new("freq_band", 24, 5);
    pub const HS_ZERO: Field = Field::new("hs_zero", 28, 4);

    // MDRESOL / SDRESOL
    pub const MAIN_HRESOL: Field = Field::new("main_hresol", 0, 11);
    pub const MAIN_VRESOL: Field = Field::new("main_vresol", 16, 11);
    pub const SUB_HRESOL: Field = Field::new("sub_hresol", 0, 11);
    pub const SUB_VRESOL: Field = Field::new("sub_vresol", 16, 11);

    // MVPORCH
    pub const MAIN_VBP: Field = Field::new("main_vbp", 0, 11);
    pub const STABLE_VFP: Field = Field::new("stable_vfp", 16, 11);
    pub const CMD_ALLOW: Field = Field::new("cmd_allow", 28, 4);

    // MHPORCH
    pub const MAIN_HBP: Field = Field::new("main_hbp", 0, 16);
    pub const MAIN_HFP: Field = Field::new("main_hfp", 16, 16);

    // MSYNC
    pub const MAIN_HSA: Field = Field::new("main_hsa", 0, 16);
    pub const MAIN_VSA: Field = Field::new("main_vsa", 22, 10);

    // TIMEOUT
    pub const LPDR_TOUT: Field = Field::new("lpdr_timeout", 0, 16);
    pub const BTA_TOUT: Field = Field::new("bta_timeout", 16, 8);

    // ESCMODE
    pub const STOP_STATE_CNT: Field = Field::new("stop_state_cnt", 21, 11);

    // CLKCTRL
    pub const ESC_PRESCALER: Field = Field::new("esc_prescaler", 0, 16);
    pub const LANE_ESC_CLKEN: Field = Field::new("lane_esc_clken", 19, 5);
    pub const BYTE_CLK_SRC: Field = Field::new("byte_clk_src", 25, 2);

    // PHYACCHR / PHYACCHR1
    pub const AFC_CODE: Field = Field::new("afc_code", 5, 3);
    pub const DP_DN_SWAP: Field = Field::new("dp_dn_swap", 0, 2);

    // PKTHDR
    pub const PKT_DATA_ID: Field = Field::new("data_id", 0, 6);
    pub const PKT_DATA0: Field = Field::new("data0", 8, 8);
    pub const PKT_DATA1: Field = Field::new("data1", 16, 8);
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LaneCount;

    #[test]
    fn test_register_offsets() {
        assert_eq!(Reg::Status.offset(), 0x00);
        assert_eq!(Reg::Config.offset(), 0x10);
        assert_eq!(Reg::MdResol.offset(), 0x18);
        assert_eq!(Reg::IntSrc.offset(), 0x2C);
        assert_eq!(Reg::PktHdr.offset(), 0x34);
        assert_eq!(Reg::FifoCtrl.offset(), 0x44);
        assert_eq!(Reg::PllCtrl.offset(), 0x4C);
        assert_eq!(Reg::PhyAccHr1.offset(), 0x58);
        assert!(Reg::PhyAccHr1.offset() + 4 <= Reg::WINDOW);
    }

    #[test]
    fn test_lanes_for_count() {
        let one = Lanes::for_data_lanes(LaneCount::new(1).unwrap());
        assert_eq!(one, Lanes::CLOCK | Lanes::DATA0);
        assert_eq!(one.data_mask(), 0b0001);

        let four = Lanes::for_data_lanes(LaneCount::new(4).unwrap());
        assert_eq!(four, Lanes::CLOCK | Lanes::DATA_ALL);
        assert_eq!(four.bits(), 0x1F);
        assert_eq!(four.data_mask(), 0b1111);
    }

    #[test]
    fn test_status_lane_helpers() {
        assert_eq!(LinkStatus::stop_state_data(0b0011).bits(), 0x03);
        assert_eq!(LinkStatus::ulps_data(0b0011).bits(), 0x30);
        assert_eq!(LinkStatus::ulps_data(0xFF).bits(), 0xF0);
    }

    #[test]
    fn test_fields_do_not_overlap_within_config() {
        let config_fields = [
            fields::LANE_ENABLE,
            fields::NUM_OF_DATA_LANE,
            fields::SUB_PIX_FORMAT,
            fields::MAIN_PIX_FORMAT,
            fields::SUB_VC,
            fields::MAIN_VC,
            fields::BURST_MODE,
        ];
        let mut seen = 0u32;
        for f in config_fields {
            assert_eq!(seen & f.mask(), 0, "{} overlaps", f.name());
            seen |= f.mask();
        }
    }
}
