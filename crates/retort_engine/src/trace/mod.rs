//! Event tracing for the network.
//!
//! The network tags every event with the step (public mutation) that caused
//! it. Records land in a bounded ring buffer and can be echoed to stderr in
//! human-readable or JSON form.

pub mod buffer;
pub mod format;
pub mod record;

pub use buffer::{TraceBuffer, TraceBufferStats};
pub use format::{HumanFormatter, JsonFormatter, TraceFormatter};
pub use record::{TraceEvent, TraceRecord};

use std::io::{self, Write};
use std::time::Instant;

/// Where records go besides the ring buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TraceOutput {
    /// Only the buffer.
    #[default]
    Buffer,
    /// The buffer, and one line per record on stderr.
    Stderr,
}

/// How records are rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TraceFormat {
    /// [`HumanFormatter`].
    #[default]
    Human,
    /// [`JsonFormatter`].
    Json,
}

/// Tracer settings, usually set through [`NetworkConfig`](crate::NetworkConfig).
#[derive(Clone, Debug)]
pub struct TracerConfig {
    /// Record anything at all.
    pub enabled: bool,
    /// Ring buffer capacity.
    pub buffer_size: usize,
    /// Echo destination.
    pub output: TraceOutput,
    /// Rendering for echoed and formatted records.
    pub format: TraceFormat,
    /// Event type names to keep, such as `"wme-added"`. Empty keeps all.
    pub event_filter: Vec<String>,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            buffer_size: 10_000,
            output: TraceOutput::Buffer,
            format: TraceFormat::Human,
            event_filter: Vec::new(),
        }
    }
}

impl TracerConfig {
    /// Creates a disabled configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Turns recording on.
    #[must_use]
    pub fn enabled(mut self) -> Self {
        self.enabled = true;
        self
    }

    /// Sets the ring buffer capacity.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Echoes every record to stderr.
    #[must_use]
    pub fn to_stderr(mut self) -> Self {
        self.output = TraceOutput::Stderr;
        self
    }

    /// Renders records as JSON.
    #[must_use]
    pub fn json(mut self) -> Self {
        self.format = TraceFormat::Json;
        self
    }

    /// Keeps only the named event types.
    #[must_use]
    pub fn filter_events<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.event_filter = types.into_iter().map(Into::into).collect();
        self
    }
}

/// Records what the network does.
///
/// Each public network mutation opens a step with [`Tracer::next_step`];
/// every event recorded until the next one carries that step number.
/// Recording is a single branch when the tracer is disabled.
#[derive(Clone, Debug)]
pub struct Tracer {
    config: TracerConfig,
    buffer: TraceBuffer,
    step: u64,
    started: Instant,
    human: HumanFormatter,
    json: JsonFormatter,
}

impl Tracer {
    /// Creates a tracer.
    #[must_use]
    pub fn new(config: TracerConfig) -> Self {
        Self {
            buffer: TraceBuffer::new(config.buffer_size),
            config,
            step: 0,
            started: Instant::now(),
            human: HumanFormatter::new(),
            json: JsonFormatter::new(),
        }
    }

    /// Creates a tracer that records nothing until enabled.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(TracerConfig::default())
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &TracerConfig {
        &self.config
    }

    /// Returns whether events are being recorded.
    #[must_use]
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Starts recording.
    pub fn enable(&mut self) {
        self.config.enabled = true;
    }

    /// Stops recording. The buffer is kept.
    pub fn disable(&mut self) {
        self.config.enabled = false;
    }

    /// Switches the rendering used by [`Tracer::format_records`].
    pub fn set_format(&mut self, format: TraceFormat) {
        self.config.format = format;
    }

    /// Opens a new step and returns its number.
    pub fn next_step(&mut self) -> u64 {
        self.step += 1;
        self.step
    }

    /// Returns the number of the open step, 0 before the first mutation.
    #[must_use]
    pub fn current_step(&self) -> u64 {
        self.step
    }

    /// Records an event under the open step.
    #[inline]
    pub fn record(&mut self, event: TraceEvent) {
        if self.config.enabled && self.admits(&event) {
            self.push(event);
        }
    }

    fn admits(&self, event: &TraceEvent) -> bool {
        let filter = &self.config.event_filter;
        filter.is_empty() || filter.iter().any(|t| t == event.event_type())
    }

    fn push(&mut self, event: TraceEvent) {
        let elapsed = u64::try_from(self.started.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.buffer.push(self.step, elapsed, event);
        if self.config.output == TraceOutput::Stderr {
            if let Some(record) = self.buffer.last() {
                let line = self.formatter().format(record);
                let _ = writeln!(io::stderr().lock(), "{line}");
            }
        }
    }

    fn formatter(&self) -> &dyn TraceFormatter {
        match self.config.format {
            TraceFormat::Human => &self.human,
            TraceFormat::Json => &self.json,
        }
    }

    /// Renders one record in the configured format.
    #[must_use]
    pub fn format_record(&self, record: &TraceRecord) -> String {
        self.formatter().format(record)
    }

    /// Renders several records in the configured format.
    #[must_use]
    pub fn format_records(&self, records: &[&TraceRecord]) -> String {
        self.formatter().format_many(records)
    }

    /// Returns the recorded events.
    #[must_use]
    pub fn buffer(&self) -> &TraceBuffer {
        &self.buffer
    }

    /// Drops every recorded event.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::disabled()
    }
}
