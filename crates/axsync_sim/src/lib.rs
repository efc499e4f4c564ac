//! Cycle-accurate AXI4-Lite transactor for the fpga-sync block.
//!
//! This crate models one AXI4-Lite slave port the way a verilated top level
//! is driven: a flat snapshot of input wires goes in on every clock level
//! change, a flat snapshot of output wires comes back, and the model follows
//! an evaluate-then-latch ordering so outputs always reflect the previous
//! latched inputs.
//!
//! # Architecture
//!
//! [`BusModel`] owns the slave's registered state and a reference register
//! bank. [`SyncSession`] owns a model plus an optional [`TraceSink`] and
//! guarantees the trace is finalized on every exit path. [`Transactor`]
//! drives a session from the master side, turning reads and writes into
//! valid/ready sequences.
//!
//! # Usage
//!
//! ```
//! use axsync_sim::Transactor;
//!
//! let mut t = Transactor::default();
//! t.reset(4);
//! t.axi_write(0x10, 0xdead_beef).unwrap();
//! assert_eq!(t.axi_read(0x10).unwrap(), 0xdead_beef);
//! ```
//!
//! # Modules
//!
//! - `error`: Trace and transaction error types
//! - `signals`: Port snapshots and response codes
//! - `model`: Two-phase slave model
//! - `waveform`: Trace recorders (VCD, JSON lines)
//! - `trace`: Attachable trace destinations
//! - `session`: Lifecycle shim over model and trace
//! - `transactor`: Master-side read/write driver

#![warn(missing_docs)]

pub mod error;
pub mod model;
pub mod session;
pub mod signals;
pub mod trace;
pub mod transactor;
pub mod waveform;

pub use error::{AxiError, SimError};
pub use model::{BusModel, CoreRegs, ModelConfig};
pub use session::SyncSession;
pub use signals::{AxiResp, SigIn, SigOut};
pub use trace::{TraceFormat, TraceSink};
pub use transactor::{Transactor, TransactorConfig};
pub use waveform::{JsonLinesRecorder, TraceRecorder, VcdRecorder};
