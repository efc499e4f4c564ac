//! Per-edge signal snapshots for the AXI4-Lite slave port.
//!
//! [`SigIn`] carries every signal the bus master drives and [`SigOut`] every
//! signal the slave drives back. Both are `#[repr(C)]` plain-old-data so the
//! same layout crosses the C boundary in `axsync_ffi` unchanged.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Width of the AXI4-Lite address buses in bits.
pub const ADDR_WIDTH: u32 = 32;
/// Width of the read and write data buses in bits.
pub const DATA_WIDTH: u32 = 64;
/// Width of the write strobe, one bit per byte lane of the data bus.
pub const STRB_WIDTH: u32 = DATA_WIDTH / 8;
/// Width of the `arprot`/`awprot` protection codes.
pub const PROT_WIDTH: u32 = 3;
/// Width of the `rresp`/`bresp` response codes.
pub const RESP_WIDTH: u32 = 2;

/// Protection code for an unprivileged, non-secure data access.
pub const PROT_NONSECURE_DATA: u8 = 0b010;

/// Signals driven into the slave for one evaluation.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SigIn {
    /// Bus clock level.
    pub aclk: bool,
    /// Active-low synchronous reset.
    pub rstn: bool,

    /// Read address valid.
    pub arvalid: bool,
    /// Read address.
    pub araddr: u32,
    /// Read protection code (3 bits).
    pub arprot: u8,

    /// Read data ready.
    pub rready: bool,

    /// Write address valid.
    pub awvalid: bool,
    /// Write address.
    pub awaddr: u32,
    /// Write protection code (3 bits).
    pub awprot: u8,

    /// Write data valid.
    pub wvalid: bool,
    /// Write data.
    pub wdata: u64,
    /// Write byte-lane strobes.
    pub wstrb: u8,

    /// Write response ready.
    pub bready: bool,
}

/// Signals driven by the slave after one evaluation.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SigOut {
    /// Read address ready.
    pub arready: bool,

    /// Read data valid.
    pub rvalid: bool,
    /// Read data.
    pub rdata: u64,
    /// Read response code (2 bits).
    pub rresp: u8,

    /// Write address ready.
    pub awready: bool,

    /// Write data ready.
    pub wready: bool,

    /// Write response valid.
    pub bvalid: bool,
    /// Write response code (2 bits).
    pub bresp: u8,
}

/// AXI4-Lite response code carried on `rresp` and `bresp`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AxiResp {
    /// Normal access success.
    #[default]
    Okay = 0b00,
    /// Exclusive access success. Never produced by an AXI4-Lite slave.
    ExOkay = 0b01,
    /// Slave error.
    SlvErr = 0b10,
    /// Decode error: no slave at the address.
    DecErr = 0b11,
}

impl AxiResp {
    /// Decodes a raw response code; bits above the low two are ignored.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => AxiResp::Okay,
            0b01 => AxiResp::ExOkay,
            0b10 => AxiResp::SlvErr,
            _ => AxiResp::DecErr,
        }
    }

    /// Returns the raw 2-bit code.
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Whether the response reports success.
    pub fn is_ok(self) -> bool {
        matches!(self, AxiResp::Okay | AxiResp::ExOkay)
    }
}

impl fmt::Display for AxiResp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AxiResp::Okay => "OKAY",
            AxiResp::ExOkay => "EXOKAY",
            AxiResp::SlvErr => "SLVERR",
            AxiResp::DecErr => "DECERR",
        };
        f.write_str(name)
    }
}

impl SigIn {
    /// Port names, widths and values in trace order.
    pub fn trace_values(&self) -> [(&'static str, u32, u64); 13] {
        [
            ("aclk", 1, self.aclk as u64),
            ("rstn", 1, self.rstn as u64),
            ("arvalid", 1, self.arvalid as u64),
            ("araddr", ADDR_WIDTH, self.araddr as u64),
            ("arprot", PROT_WIDTH, self.arprot as u64),
            ("rready", 1, self.rready as u64),
            ("awvalid", 1, self.awvalid as u64),
            ("awaddr", ADDR_WIDTH, self.awaddr as u64),
            ("awprot", PROT_WIDTH, self.awprot as u64),
            ("wvalid", 1, self.wvalid as u64),
            ("wdata", DATA_WIDTH, self.wdata),
            ("wstrb", STRB_WIDTH, self.wstrb as u64),
            ("bready", 1, self.bready as u64),
        ]
    }
}

impl SigOut {
    /// Port names, widths and values in trace order.
    pub fn trace_values(&self) -> [(&'static str, u32, u64); 8] {
        [
            ("arready", 1, self.arready as u64),
            ("rvalid", 1, self.rvalid as u64),
            ("rdata", DATA_WIDTH, self.rdata),
            ("rresp", RESP_WIDTH, self.rresp as u64),
            ("awready", 1, self.awready as u64),
            ("wready", 1, self.wready as u64),
            ("bvalid", 1, self.bvalid as u64),
            ("bresp", RESP_WIDTH, self.bresp as u64),
        ]
    }

    /// Decoded read response.
    pub fn read_resp(&self) -> AxiResp {
        AxiResp::from_bits(self.rresp)
    }

    /// Decoded write response.
    pub fn write_resp(&self) -> AxiResp {
        AxiResp::from_bits(self.bresp)
    }
}
