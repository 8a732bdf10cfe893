//! # DSI Packet Transfer
//!
//! Header and payload words go to the SFR FIFOs. A short packet is a single
//! header word. A long packet is its payload (little-endian words, the last
//! one zero padded) followed by a header carrying the byte count, because
//! writing the header is what starts transmission.
//!
//! ## Header word (PKTHDR)
//!
//! | Bits  | Field   |
//! |-------|---------|
//! | 5:0   | data id |
//! | 15:8  | data0   |
//! | 23:16 | data1   |

use crate::bus::RegisterBus;
use crate::dsim::Dsim;
use crate::poll::poll_until;
use crate::regs::{fields, FifoStatus, Interrupts, Reg};
use crate::trace::{dsim_trace, dsim_warn};
use crate::{DsimError, DsimResult};

/// FIFOCTRL pointer-init bits, not part of the status word
const FIFO_INIT_BITS: u32 = 0x1F;

/// DSI data type identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataType(pub u8);

impl DataType {
    pub const VSYNC_START: Self = Self(0x01);
    pub const COLOR_MODE_OFF: Self = Self(0x02);
    pub const GENERIC_SHORT_WRITE_0: Self = Self(0x03);
    pub const GENERIC_READ_0: Self = Self(0x04);
    pub const DCS_SHORT_WRITE: Self = Self(0x05);
    pub const DCS_READ: Self = Self(0x06);
    pub const EOT: Self = Self(0x08);
    pub const NULL: Self = Self(0x09);
    pub const COLOR_MODE_ON: Self = Self(0x12);
    pub const GENERIC_SHORT_WRITE_1: Self = Self(0x13);
    pub const GENERIC_READ_1: Self = Self(0x14);
    pub const DCS_SHORT_WRITE_PARAM: Self = Self(0x15);
    pub const BLANKING: Self = Self(0x19);
    pub const HSYNC_START: Self = Self(0x21);
    pub const SHUTDOWN: Self = Self(0x22);
    pub const GENERIC_SHORT_WRITE_2: Self = Self(0x23);
    pub const GENERIC_READ_2: Self = Self(0x24);
    pub const GENERIC_LONG_WRITE: Self = Self(0x29);
    pub const TURN_ON: Self = Self(0x32);
    pub const SET_MAX_RETURN_SIZE: Self = Self(0x37);
    pub const DCS_LONG_WRITE: Self = Self(0x39);

    pub const fn id(self) -> u8 {
        self.0
    }

    /// Long packets carry a payload and a 16-bit word count
    pub const fn is_long(self) -> bool {
        matches!(
            self.0 & 0x3F,
            // null, blanking, generic long, DCS long
            0x09 | 0x19 | 0x29 | 0x39
            // packed pixel streams
            | 0x0C | 0x1C | 0x2C | 0x0D | 0x1D | 0x3D
            | 0x0E | 0x1E | 0x2E | 0x3E
        )
    }
}

impl From<DataType> for u8 {
    fn from(dt: DataType) -> u8 {
        dt.0
    }
}

/// A packet header as written to PKTHDR
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub data_id: u8,
    pub data0: u8,
    pub data1: u8,
}

impl PacketHeader {
    pub const fn new(data_id: u8, data0: u8, data1: u8) -> Self {
        Self {
            data_id,
            data0,
            data1,
        }
    }

    /// Header of a long packet with `len` payload bytes
    pub const fn long(data_id: u8, len: u16) -> Self {
        let [lo, hi] = len.to_le_bytes();
        Self::new(data_id, lo, hi)
    }

    /// PKTHDR word; the data id keeps only its low six bits
    pub const fn encode(&self) -> u32 {
        fields::PKT_DATA1.pack(self.data1 as u32)
            | fields::PKT_DATA0.pack(self.data0 as u32)
            | fields::PKT_DATA_ID.pack(self.data_id as u32)
    }
}

/// Pack payload bytes into little-endian FIFO words
pub fn payload_words(bytes: &[u8]) -> impl Iterator<Item = u32> + '_ {
    bytes.chunks(4).map(|chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        u32::from_le_bytes(word)
    })
}

impl<B: RegisterBus> Dsim<B> {
    // ========================================================================
    // TX
    // ========================================================================

    /// Write one header word; transmission starts on this write
    pub fn wr_tx_header(&mut self, header: PacketHeader) {
        dsim_trace!(self.tracer, "wr_tx_header {:?}", header);
        self.bus.write(Reg::PktHdr, header.encode());
    }

    /// Write one payload word
    pub fn wr_tx_data(&mut self, word: u32) {
        dsim_trace!(self.tracer, "wr_tx_data {:#010x}", word);
        self.bus.write(Reg::Payload, word);
    }

    /// Send a short packet
    pub fn write_short_packet(&mut self, data_id: u8, data0: u8, data1: u8) {
        self.wr_tx_header(PacketHeader::new(data_id, data0, data1));
    }

    /// Send a long packet: payload words, then the header with the byte count
    ///
    /// Payloads longer than 65535 bytes fail before any register write.
    pub fn write_long_packet(&mut self, data_id: u8, payload: &[u8]) -> DsimResult<()> {
        let len = u16::try_from(payload.len()).map_err(|_| {
            DsimError::InvalidConfiguration("long packet payload exceeds 65535 bytes")
        })?;
        for word in payload_words(payload) {
            self.wr_tx_data(word);
        }
        self.wr_tx_header(PacketHeader::long(data_id, len));
        Ok(())
    }

    // ========================================================================
    // FIFO STATUS
    // ========================================================================

    /// FIFOCTRL status bits, pointer-init bits masked off
    pub fn fifo_state(&mut self) -> FifoStatus {
        FifoStatus::from_bits_retain(self.bus.read(Reg::FifoCtrl) & !FIFO_INIT_BITS)
    }

    pub fn is_header_fifo_empty(&mut self) -> bool {
        self.fifo_state().contains(FifoStatus::SFR_HEADER_EMPTY)
    }

    pub fn is_payload_fifo_empty(&mut self) -> bool {
        self.fifo_state().contains(FifoStatus::SFR_PAYLOAD_EMPTY)
    }

    pub fn is_rx_fifo_empty(&mut self) -> bool {
        self.fifo_state().contains(FifoStatus::RX_DATA_EMPTY)
    }

    // ========================================================================
    // FRAME DONE
    // ========================================================================

    pub fn frame_done(&mut self) -> bool {
        self.interrupt_status().contains(Interrupts::FRAME_DONE)
    }

    /// Acknowledge frame-done (INTSRC is write-1-to-clear)
    pub fn clear_frame_done(&mut self) {
        dsim_trace!(self.tracer, "clear_frame_done");
        self.bus.set_bits(Reg::IntSrc, Interrupts::FRAME_DONE.bits());
    }

    // ========================================================================
    // RX
    // ========================================================================

    /// Poll until the RX FIFO holds data
    pub fn wait_for_rx_fifo(&mut self) -> DsimResult<u32> {
        let bound = self.poll.rx_fifo;
        let result = poll_until(&mut self.bus, bound, "rx fifo data", |bus| {
            bus.read(Reg::FifoCtrl) & FifoStatus::RX_DATA_EMPTY.bits() == 0
        });
        if let Err(err) = &result {
            dsim_warn!(self.tracer, "wait_for_rx_fifo: {}", err);
        }
        result
    }

    /// Pop one word from the RX FIFO
    pub fn read_rx_word(&mut self) -> u32 {
        self.bus.read(Reg::RxFifo)
    }
}

// ============================================================================
// TESTS
// ============================================================================
