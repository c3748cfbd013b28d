use std::time::Instant;

use log::debug;

/// Where phase durations go. The metrics backend is external; this is the
/// hook it plugs into.
pub trait TelemetrySink: Send + Sync {
    fn measure_since(&self, label: &'static str, start: Instant);
}

#[derive(Clone, Copy, Default)]
pub struct NoopTelemetrySink;

impl TelemetrySink for NoopTelemetrySink {
    fn measure_since(&self, _label: &'static str, _start: Instant) {}
}

/// Reports durations to the log, which is all a single node needs.
#[derive(Clone, Copy, Default)]
pub struct LogTelemetrySink;

impl TelemetrySink for LogTelemetrySink {
    fn measure_since(&self, label: &'static str, start: Instant) {
        debug!("{label} took {:?}", start.elapsed());
    }
}
