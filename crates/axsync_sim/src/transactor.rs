//! Master-side driver for the AXI4-Lite port.
//!
//! [`Transactor`] owns a [`SyncSession`], toggles the clock, and turns
//! single reads and writes into the valid/ready sequences the slave expects.
//! Inputs are changed only between rising edges, so a handshake completes at
//! the edge where the driven `valid` meets the `ready` observed just before
//! it.

use log::debug;

use crate::error::{AxiError, SimError};
use crate::session::SyncSession;
use crate::signals::{AxiResp, SigIn, SigOut, PROT_NONSECURE_DATA};

/// Default cycle budget for one transaction.
pub const DEFAULT_TIMEOUT_CYCLES: u32 = 10_000;

/// Transaction-level settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactorConfig {
    /// Rising edges a transaction may wait before reporting a timeout.
    pub timeout_cycles: u32,
    /// Protection code driven on `arprot` and `awprot`.
    pub prot: u8,
}

impl Default for TransactorConfig {
    fn default() -> Self {
        Self {
            timeout_cycles: DEFAULT_TIMEOUT_CYCLES,
            prot: PROT_NONSECURE_DATA,
        }
    }
}

/// Drives a session one clock edge at a time.
pub struct Transactor {
    session: SyncSession,
    config: TransactorConfig,
    /// Signals driven on the next evaluation.
    pub input: SigIn,
    /// Signals returned by the last evaluation.
    pub output: SigOut,
    cycles: u64,
}

impl Default for Transactor {
    fn default() -> Self {
        Self::new(SyncSession::new(), TransactorConfig::default())
    }
}

impl Transactor {
    /// Wraps `session`. Reset starts deasserted; call [`reset`](Self::reset)
    /// to bring the slave to a known state.
    pub fn new(session: SyncSession, config: TransactorConfig) -> Self {
        Self {
            session,
            config,
            input: SigIn {
                rstn: true,
                ..Default::default()
            },
            output: SigOut::default(),
            cycles: 0,
        }
    }

    /// Evaluates the model into `self.output`, then latches `self.input`.
    /// Typically [`next_cycle_high`](Self::next_cycle_high) is used instead.
    pub fn eval(&mut self) {
        self.output = self.session.eval(&self.input);
    }

    /// Toggles `aclk` until there have been `n_cycles` rising edges.
    pub fn next_cycle_high(&mut self, n_cycles: u32) {
        for _ in 0..n_cycles {
            loop {
                self.input.aclk = !self.input.aclk;
                self.eval();
                if self.input.aclk {
                    break;
                }
            }
            self.cycles += 1;
        }
    }

    /// Rising edges driven so far.
    pub fn total_cycles(&self) -> u64 {
        self.cycles
    }

    /// Holds reset for `cycles` rising edges, then releases it for one more.
    pub fn reset(&mut self, cycles: u32) {
        debug!("reset for {cycles} cycles");
        self.input = SigIn {
            aclk: self.input.aclk,
            rstn: false,
            ..Default::default()
        };
        self.next_cycle_high(cycles);
        self.input.rstn = true;
        self.next_cycle_high(1);
    }

    /// Reads the 64-bit word at `addr`.
    pub fn axi_read(&mut self, addr: u32) -> Result<u64, AxiError> {
        self.input.arvalid = true;
        self.input.araddr = addr;
        self.input.arprot = self.config.prot;
        self.input.rready = true;

        let result = self.finish_read();
        self.input.arvalid = false;
        self.input.rready = false;

        let data = result?;
        debug!("read {addr:#010x} -> {data:#018x}");
        Ok(data)
    }

    fn finish_read(&mut self) -> Result<u64, AxiError> {
        let mut budget = self.config.timeout_cycles;
        loop {
            self.tick(&mut budget)?;
            if self.output.arready {
                self.input.arvalid = false;
                break;
            }
        }
        while !self.output.rvalid {
            self.tick(&mut budget)?;
        }
        resp_result(self.output.read_resp())?;
        Ok(self.output.rdata)
    }

    /// Writes all eight byte lanes of `data` to `addr`.
    pub fn axi_write(&mut self, addr: u32, data: u64) -> Result<(), AxiError> {
        self.axi_write_strobed(addr, data, 0xff)
    }

    /// Writes the byte lanes of `data` selected by `strb` to `addr`.
    pub fn axi_write_strobed(&mut self, addr: u32, data: u64, strb: u8) -> Result<(), AxiError> {
        self.input.awvalid = true;
        self.input.awaddr = addr;
        self.input.awprot = self.config.prot;
        self.input.wvalid = true;
        self.input.wdata = data;
        self.input.wstrb = strb;
        self.input.bready = true;

        let result = self.finish_write();
        self.input.awvalid = false;
        self.input.wvalid = false;
        self.input.bready = false;

        result?;
        debug!("write {addr:#010x} <- {data:#018x} (strb {strb:#04x})");
        Ok(())
    }

    fn finish_write(&mut self) -> Result<(), AxiError> {
        let mut budget = self.config.timeout_cycles;
        while self.input.awvalid || self.input.wvalid {
            self.tick(&mut budget)?;
            if self.input.awvalid && self.output.awready {
                self.input.awvalid = false;
            }
            if self.input.wvalid && self.output.wready {
                self.input.wvalid = false;
            }
        }
        while !self.output.bvalid {
            self.tick(&mut budget)?;
        }
        resp_result(self.output.write_resp())
    }

    /// Advances one cycle, charging it against `budget`.
    fn tick(&mut self, budget: &mut u32) -> Result<(), AxiError> {
        if *budget == 0 {
            return Err(AxiError::Timeout {
                cycles: self.config.timeout_cycles,
            });
        }
        *budget -= 1;
        self.next_cycle_high(1);
        Ok(())
    }

    /// The wrapped session.
    pub fn session(&self) -> &SyncSession {
        &self.session
    }

    /// Mutable access to the wrapped session, e.g. to start tracing.
    pub fn session_mut(&mut self) -> &mut SyncSession {
        &mut self.session
    }

    /// Finalizes tracing and releases the model.
    pub fn close(self) -> Result<(), SimError> {
        let mut session = self.session;
        let result = session.stop_tracing();
        session.close();
        result
    }
}

fn resp_result(resp: AxiResp) -> Result<(), AxiError> {
    match resp {
        AxiResp::SlvErr => Err(AxiError::SlvErr),
        AxiResp::DecErr => Err(AxiError::DecErr),
        AxiResp::Okay | AxiResp::ExOkay => Ok(()),
    }
}
