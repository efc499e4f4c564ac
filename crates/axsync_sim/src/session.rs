//! Owning handle over one bus model and its optional trace.
//!
//! [`SyncSession`] is the lifecycle shim: it creates the model, forwards
//! every evaluation to the attached [`TraceSink`], and guarantees the trace
//! is finalized when the session is closed or dropped.

use std::path::Path;

use log::warn;

use crate::error::SimError;
use crate::model::{BusModel, ModelConfig};
use crate::signals::{SigIn, SigOut};
use crate::trace::{TraceFormat, TraceSink};
use crate::waveform::TraceEntry;

/// A bus model plus zero or one trace destination.
pub struct SyncSession {
    model: BusModel,
    trace: Option<TraceSink>,
    trace_format: Option<TraceFormat>,
}

impl Default for SyncSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncSession {
    /// Creates a session around a default-configured model. Never fails.
    pub fn new() -> Self {
        Self::with_config(ModelConfig::default())
    }

    /// Creates a session around a model with the given register bank.
    pub fn with_config(config: ModelConfig) -> Self {
        Self {
            model: BusModel::new(config),
            trace: None,
            trace_format: None,
        }
    }

    /// Forces the format of traces attached from now on. `None` infers it
    /// from the destination's extension.
    pub fn set_trace_format(&mut self, format: Option<TraceFormat>) {
        self.trace_format = format;
    }

    /// Starts tracing to `path` with hierarchy depth `depth`, or stops
    /// tracing when `path` is `None`.
    ///
    /// Any previously attached trace is finalized first; a failure there is
    /// logged and does not prevent the new attach. If the new destination
    /// cannot be opened the error is returned and the session keeps running
    /// untraced.
    pub fn set_trace(&mut self, path: Option<&Path>, depth: u32) -> Result<(), SimError> {
        self.release();
        if let Some(path) = path {
            let sink = TraceSink::attach(
                path,
                depth,
                self.trace_format,
                self.model.config().register_count,
            )?;
            self.trace = Some(sink);
        }
        Ok(())
    }

    /// Starts tracing to `path`. See [`set_trace`](Self::set_trace).
    pub fn start_tracing(&mut self, path: impl AsRef<Path>, depth: u32) -> Result<(), SimError> {
        self.set_trace(Some(path.as_ref()), depth)
    }

    /// Finalizes the current trace, if any. Calling it twice is a no-op.
    pub fn stop_tracing(&mut self) -> Result<(), SimError> {
        match self.trace.take() {
            Some(sink) => sink.detach(),
            None => Ok(()),
        }
    }

    /// Whether a trace is attached.
    pub fn is_tracing(&self) -> bool {
        self.trace.is_some()
    }

    /// The attached trace, if any.
    pub fn trace(&self) -> Option<&TraceSink> {
        self.trace.as_ref()
    }

    /// Steps the model once and records the step if tracing.
    ///
    /// Trace write failures never reach the caller: they are logged and the
    /// trace is dropped, leaving the bus unaffected.
    pub fn eval(&mut self, input: &SigIn) -> SigOut {
        let index = self.model.steps();
        let output = self.model.step(input);

        if let Some(sink) = &mut self.trace {
            let entry = TraceEntry {
                index,
                input,
                output: &output,
                core: self.model.core(),
                bank: self.model.bank(),
            };
            if let Err(e) = sink.record(&entry) {
                warn!(
                    "trace {} failed at step {index}: {e}; tracing disabled",
                    sink.path().display()
                );
                if let Some(sink) = self.trace.take() {
                    let path = sink.path().to_path_buf();
                    if let Err(e) = sink.detach() {
                        warn!("failed to finalize trace {}: {e}", path.display());
                    }
                }
            }
        }
        output
    }

    /// The underlying model.
    pub fn model(&self) -> &BusModel {
        &self.model
    }

    /// Finalizes any trace and releases the model.
    ///
    /// Finalization errors are logged rather than returned; the recorded
    /// trace may be incomplete when that happens.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(sink) = self.trace.take() {
            let path = sink.path().to_path_buf();
            if let Err(e) = sink.detach() {
                warn!("failed to finalize trace {}: {e}", path.display());
            }
        }
    }
}

impl Drop for SyncSession {
    fn drop(&mut self) {
        self.release();
    }
}
