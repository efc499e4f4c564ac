//! Two-phase AXI4-Lite slave model.
//!
//! [`BusModel::step`] mirrors a verilated top level driven through pseudo
//! flip-flops: each call first evaluates the slave against the inputs latched
//! by the *previous* call, then latches the new inputs. Outputs of call `n`
//! therefore never depend on the input of call `n`.
//!
//! Behind the port sits a small reference slave: a bank of 64-bit registers.
//! All of its state changes happen on a rising `aclk` edge.

use log::{trace, warn};
use serde::Serialize;

use crate::signals::{AxiResp, SigIn, SigOut, ADDR_WIDTH, DATA_WIDTH, PROT_WIDTH, STRB_WIDTH};

/// Default number of 64-bit registers in the bank.
pub const DEFAULT_REGISTER_COUNT: usize = 1024;

/// Largest supported register bank: 512 KiB of storage.
pub const MAX_REGISTER_COUNT: usize = 1 << 16;

/// Shape of the reference slave's register bank.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelConfig {
    /// Byte address of register 0.
    pub base_address: u32,
    /// Number of 64-bit registers mapped from `base_address`. Values above
    /// [`MAX_REGISTER_COUNT`] are clamped when the model is built.
    pub register_count: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_address: 0,
            register_count: DEFAULT_REGISTER_COUNT,
        }
    }
}

/// Registered state of the slave, updated only on rising clock edges.
///
/// The all-zero default is also the reset state: no ready or valid asserted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CoreRegs {
    /// Registered `arready`.
    pub arready: bool,
    /// Registered `rvalid`.
    pub rvalid: bool,
    /// Registered `rdata`.
    pub rdata: u64,
    /// Registered `rresp`.
    pub rresp: u8,
    /// Registered `awready`.
    pub awready: bool,
    /// Registered `wready`.
    pub wready: bool,
    /// Registered `bvalid`.
    pub bvalid: bool,
    /// Registered `bresp`.
    pub bresp: u8,

    /// A read address has been accepted and awaits its data beat.
    pub ar_held: bool,
    /// Accepted read address.
    pub ar_addr: u32,
    /// Accepted read protection code.
    pub ar_prot: u8,
    /// A write address has been accepted.
    pub aw_held: bool,
    /// Accepted write address.
    pub aw_addr: u32,
    /// Accepted write protection code.
    pub aw_prot: u8,
    /// Write data has been accepted.
    pub w_held: bool,
    /// Accepted write data.
    pub w_data: u64,
    /// Accepted write strobes.
    pub w_strb: u8,
}

impl CoreRegs {
    /// Projects the registered outputs onto the port.
    pub fn outputs(&self) -> SigOut {
        SigOut {
            arready: self.arready,
            rvalid: self.rvalid,
            rdata: self.rdata,
            rresp: self.rresp,
            awready: self.awready,
            wready: self.wready,
            bvalid: self.bvalid,
            bresp: self.bresp,
        }
    }

    /// Internal request registers in trace order.
    pub fn trace_values(&self) -> [(&'static str, u32, u64); 9] {
        [
            ("ar_held", 1, self.ar_held as u64),
            ("ar_addr", ADDR_WIDTH, self.ar_addr as u64),
            ("ar_prot", PROT_WIDTH, self.ar_prot as u64),
            ("aw_held", 1, self.aw_held as u64),
            ("aw_addr", ADDR_WIDTH, self.aw_addr as u64),
            ("aw_prot", PROT_WIDTH, self.aw_prot as u64),
            ("w_held", 1, self.w_held as u64),
            ("w_data", DATA_WIDTH, self.w_data),
            ("w_strb", STRB_WIDTH, self.w_strb as u64),
        ]
    }
}

/// One AXI4-Lite slave port plus its register bank.
#[derive(Clone, Debug)]
pub struct BusModel {
    config: ModelConfig,
    core: CoreRegs,
    bank: Vec<u64>,
    latched: SigIn,
    last_aclk: bool,
    steps: u64,
    edges: u64,
}

impl Default for BusModel {
    fn default() -> Self {
        Self::new(ModelConfig::default())
    }
}

impl BusModel {
    /// Creates a model whose state equals the reset state.
    pub fn new(mut config: ModelConfig) -> Self {
        if config.register_count > MAX_REGISTER_COUNT {
            warn!(
                "register_count {} exceeds {MAX_REGISTER_COUNT}; clamping",
                config.register_count
            );
            config.register_count = MAX_REGISTER_COUNT;
        }
        let bank = vec![0; config.register_count];
        Self {
            config,
            core: CoreRegs::default(),
            bank,
            latched: SigIn::default(),
            last_aclk: false,
            steps: 0,
            edges: 0,
        }
    }

    /// Evaluates the slave against the previously latched inputs, then
    /// latches `input` for the next call.
    pub fn step(&mut self, input: &SigIn) -> SigOut {
        let sampled = self.latched;
        if sampled.aclk && !self.last_aclk {
            self.rising_edge(&sampled);
        }
        self.last_aclk = sampled.aclk;

        let out = self.core.outputs();
        self.latched = *input;
        self.steps += 1;
        trace!("step {}: in={:?} out={:?}", self.steps - 1, input, out);
        out
    }

    /// Number of `step` calls so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Number of rising clock edges evaluated so far.
    pub fn edges(&self) -> u64 {
        self.edges
    }

    /// Current registered state.
    pub fn core(&self) -> &CoreRegs {
        &self.core
    }

    /// Current register bank contents.
    pub fn bank(&self) -> &[u64] {
        &self.bank
    }

    /// Register bank shape.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn rising_edge(&mut self, input: &SigIn) {
        self.edges += 1;
        if !input.rstn {
            self.core = CoreRegs::default();
            self.bank.fill(0);
            return;
        }

        let cur = self.core;
        let mut next = cur;

        // Read address and read data channels.
        if cur.arready && input.arvalid {
            next.ar_held = true;
            next.ar_addr = input.araddr;
            next.ar_prot = input.arprot;
        }
        if cur.rvalid && input.rready {
            next.rvalid = false;
        }
        if cur.ar_held && (!cur.rvalid || input.rready) {
            let (data, resp) = self.read(cur.ar_addr);
            next.rvalid = true;
            next.rdata = data;
            next.rresp = resp.bits();
            next.ar_held = false;
        }
        next.arready = !next.ar_held;

        // Write address, write data and write response channels.
        if cur.awready && input.awvalid {
            next.aw_held = true;
            next.aw_addr = input.awaddr;
            next.aw_prot = input.awprot;
        }
        if cur.wready && input.wvalid {
            next.w_held = true;
            next.w_data = input.wdata;
            next.w_strb = input.wstrb;
        }
        if cur.bvalid && input.bready {
            next.bvalid = false;
        }
        if cur.aw_held && cur.w_held && (!cur.bvalid || input.bready) {
            let resp = self.write(cur.aw_addr, cur.w_data, cur.w_strb);
            next.bvalid = true;
            next.bresp = resp.bits();
            next.aw_held = false;
            next.w_held = false;
        }
        next.awready = !next.aw_held;
        next.wready = !next.w_held;

        self.core = next;
    }

    fn decode(&self, addr: u32) -> Option<usize> {
        let offset = addr.checked_sub(self.config.base_address)?;
        let index = (offset >> 3) as usize;
        (index < self.bank.len()).then_some(index)
    }

    fn read(&self, addr: u32) -> (u64, AxiResp) {
        match self.decode(addr) {
            Some(index) => (self.bank[index], AxiResp::Okay),
            None => (0, AxiResp::DecErr),
        }
    }

    fn write(&mut self, addr: u32, data: u64, strb: u8) -> AxiResp {
        let Some(index) = self.decode(addr) else {
            return AxiResp::DecErr;
        };
        let mask = strobe_mask(strb);
        let reg = &mut self.bank[index];
        *reg = (*reg & !mask) | (data & mask);
        AxiResp::Okay
    }
}

/// Expands byte-lane strobes into a 64-bit bit mask.
pub fn strobe_mask(strb: u8) -> u64 {
    (0..8)
        .filter(|lane| strb & (1 << lane) != 0)
        .fold(0, |mask, lane| mask | (0xff << (lane * 8)))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drives one full clock cycle (low then high) with `input`.
    fn cycle(model: &mut BusModel, input: SigIn) -> SigOut {
        model.step(&SigIn {
            aclk: false,
            ..input
        });
        model.step(&SigIn {
            aclk: true,
            ..input
        })
    }

    fn active() -> SigIn {
        SigIn {
            rstn: true,
            ..Default::default()
        }
    }

    /// Holds reset for two edges and releases it. The first released edge
    /// is evaluated by the next call.
    fn reset(model: &mut BusModel) {
        cycle(model, SigIn::default());
        cycle(model, SigIn::default());
        cycle(model, active());
    }

    #[test]
    fn default_outputs_are_low() {
        let mut m = BusModel::default();
        assert_eq!(m.step(&SigIn::default()), SigOut::default());
        assert_eq!(m.step(&SigIn::default()), SigOut::default());
        assert_eq!(m.steps(), 2);
    }

    #[test]
    fn outputs_ignore_current_input() {
        let mut a = BusModel::default();
        let mut b = BusModel::default();
        reset(&mut a);
        reset(&mut b);
        let quiet = a.step(&active());
        let busy = b.step(&SigIn {
            arvalid: true,
            awvalid: true,
            wvalid: true,
            ..active()
        });
        assert_eq!(quiet, busy);
    }

    #[test]
    fn rising_edge_is_evaluated_one_call_late() {
        let mut m = BusModel::default();
        m.step(&SigIn {
            aclk: true,
            ..Default::default()
        });
        assert_eq!(m.edges(), 0);
        m.step(&SigIn::default());
        assert_eq!(m.edges(), 1);
        // A held-high clock is a single edge.
        m.step(&SigIn {
            aclk: true,
            ..Default::default()
        });
        m.step(&SigIn {
            aclk: true,
            ..Default::default()
        });
        m.step(&SigIn {
            aclk: true,
            ..Default::default()
        });
        assert_eq!(m.edges(), 2);
    }

    #[test]
    fn ready_rises_one_cycle_after_reset_release() {
        let mut m = BusModel::default();
        reset(&mut m);
        let out = cycle(&mut m, active());
        assert!(out.arready && out.awready && out.wready);
        assert!(!out.rvalid && !out.bvalid);
    }

    #[test]
    fn read_handshake_timing() {
        let mut m = BusModel::new(ModelConfig {
            base_address: 0,
            register_count: 4,
        });
        reset(&mut m);
        cycle(&mut m, active());

        let req = SigIn {
            arvalid: true,
            araddr: 0x8,
            rready: true,
            ..active()
        };
        // arready is already visible, so the address is accepted at this edge.
        assert!(cycle(&mut m, req).arready);
        let out = cycle(
            &mut m,
            SigIn {
                rready: true,
                ..active()
            },
        );
        assert!(!out.arready);
        assert!(!out.rvalid);
        let out = cycle(
            &mut m,
            SigIn {
                rready: true,
                ..active()
            },
        );
        assert!(out.rvalid);
        assert!(out.arready);
        assert_eq!(out.read_resp(), AxiResp::Okay);
        // rready was high at that edge, so the beat is consumed.
        let out = cycle(&mut m, active());
        assert!(!out.rvalid);
    }

    #[test]
    fn rvalid_holds_until_rready() {
        let mut m = BusModel::default();
        reset(&mut m);
        cycle(&mut m, active());
        cycle(
            &mut m,
            SigIn {
                arvalid: true,
                ..active()
            },
        );
        cycle(&mut m, active());
        for _ in 0..5 {
            assert!(cycle(&mut m, active()).rvalid);
        }
        cycle(
            &mut m,
            SigIn {
                rready: true,
                ..active()
            },
        );
        assert!(!cycle(&mut m, active()).rvalid);
    }

    #[test]
    fn write_commits_with_strobes() {
        let mut m = BusModel::default();
        reset(&mut m);
        cycle(&mut m, active());
        let req = SigIn {
            awvalid: true,
            awaddr: 0x10,
            wvalid: true,
            wdata: 0x1122_3344_5566_7788,
            wstrb: 0b0000_1111,
            bready: true,
            ..active()
        };
        cycle(&mut m, req);
        let bready = SigIn {
            bready: true,
            ..active()
        };
        cycle(&mut m, bready);
        let out = cycle(&mut m, bready);
        assert!(out.bvalid);
        assert_eq!(out.write_resp(), AxiResp::Okay);
        assert_eq!(m.bank()[2], 0x0000_0000_5566_7788);
    }

    #[test]
    fn address_and_data_may_arrive_separately() {
        let mut m = BusModel::default();
        reset(&mut m);
        cycle(&mut m, active());
        cycle(
            &mut m,
            SigIn {
                wvalid: true,
                wdata: 7,
                wstrb: 0xff,
                ..active()
            },
        );
        for _ in 0..3 {
            let out = cycle(&mut m, active());
            assert!(!out.bvalid);
            assert!(!out.wready);
            assert!(out.awready);
        }
        cycle(
            &mut m,
            SigIn {
                awvalid: true,
                awaddr: 0,
                ..active()
            },
        );
        cycle(&mut m, active());
        assert!(cycle(&mut m, active()).bvalid);
        assert_eq!(m.bank()[0], 7);
    }

    #[test]
    fn out_of_range_is_decode_error() {
        let mut m = BusModel::new(ModelConfig {
            base_address: 0x100,
            register_count: 2,
        });
        reset(&mut m);
        cycle(&mut m, active());
        cycle(
            &mut m,
            SigIn {
                arvalid: true,
                araddr: 0x10,
                ..active()
            },
        );
        cycle(&mut m, active());
        let out = cycle(&mut m, active());
        assert!(out.rvalid);
        assert_eq!(out.read_resp(), AxiResp::DecErr);
        assert_eq!(out.rdata, 0);
    }

    #[test]
    fn reset_clears_bank_and_handshakes() {
        let mut m = BusModel::default();
        reset(&mut m);
        cycle(&mut m, active());
        cycle(
            &mut m,
            SigIn {
                awvalid: true,
                wvalid: true,
                wdata: 0xdead,
                wstrb: 0xff,
                ..active()
            },
        );
        cycle(&mut m, active());
        cycle(&mut m, active());
        assert_eq!(m.bank()[0], 0xdead);
        reset(&mut m);
        assert_eq!(m.bank()[0], 0);
        assert_eq!(*m.core(), CoreRegs::default());
    }

    #[test]
    fn oversized_bank_is_clamped() {
        let m = BusModel::new(ModelConfig {
            base_address: 0,
            register_count: usize::MAX,
        });
        assert_eq!(m.bank().len(), MAX_REGISTER_COUNT);
        assert_eq!(m.config().register_count, MAX_REGISTER_COUNT);
    }

    #[test]
    fn strobe_mask_lanes() {
        assert_eq!(strobe_mask(0), 0);
        assert_eq!(strobe_mask(0xff), u64::MAX);
        assert_eq!(strobe_mask(0b1000_0001), 0xff00_0000_0000_00ff);
    }
}
