/*!
 * Structured Tracing
 * Subscriber setup and operation spans for enumeration and termination runs
 */

use std::time::Instant;
use tracing::{debug, span, Level};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Filter used when `RUST_LOG` is unset; the menu owns stdout, logs stay quiet
const DEFAULT_FILTER: &str = "warn";

/// Initialize structured tracing on stderr
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: warn)
/// - PROCMAN_TRACE_JSON: Enable JSON output (read through `Config`)
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing(json: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
    };

    if result.is_ok() {
        debug!(json, "Structured tracing initialized");
    }
}

/// Generate a unique trace ID for correlating one operation's log lines
pub fn generate_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span covering one enumeration pass or one termination run
pub struct OperationSpan {
    span: tracing::Span,
    start: Instant,
    operation: &'static str,
    trace_id: String,
}

impl OperationSpan {
    pub fn new(operation: &'static str) -> Self {
        let trace_id = generate_trace_id();

        let span = span!(
            Level::DEBUG,
            "operation",
            trace_id = %trace_id,
            operation = operation,
            pid = tracing::field::Empty,
            items_processed = tracing::field::Empty,
            items_skipped = tracing::field::Empty,
            result = tracing::field::Empty,
            duration_us = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            operation,
            trace_id,
        }
    }

    /// Attach the target process id
    pub fn with_pid(self, pid: u32) -> Self {
        self.span.record("pid", pid);
        self
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn record_items(&self, processed: usize, skipped: usize) {
        self.span.record("items_processed", processed);
        self.span.record("items_skipped", skipped);
    }

    pub fn record_result(&self, result: &str) {
        self.span.record("result", result);
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for OperationSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.span.record("duration_us", duration.as_micros() as u64);
        let _entered = self.span.enter();
        debug!(
            trace_id = %self.trace_id,
            operation = self.operation,
            duration_us = duration.as_micros() as u64,
            "operation completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_trace_ids_unique() {
        let a = generate_trace_id();
        let b = generate_trace_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }

    #[test]
    fn test_operation_span_lifecycle() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        // Scoped to this test; the global dispatcher stays untouched
        let trace_id = tracing::subscriber::with_default(subscriber, || {
            let span = OperationSpan::new("enumerate_processes").with_pid(1);
            {
                let _entered = span.enter();
                span.record_items(3, 1);
                span.record_result("success");
            }
            span.trace_id().to_string()
        });

        tracing::warn!("outside the scoped subscriber");

        assert_eq!(trace_id.len(), 36);
        let output = captured.text();
        assert!(output.contains("operation completed"));
        assert!(output.contains("enumerate_processes"));
        assert!(output.contains(&trace_id));
        assert!(!output.contains("outside the scoped subscriber"));
    }

    /// In-memory sink for a scoped subscriber
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
