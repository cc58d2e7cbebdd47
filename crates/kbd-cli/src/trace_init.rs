#[cfg(feature = "trace")]
use std::path::Path;
#[cfg(feature = "trace")]
use std::sync::Once;

#[cfg(feature = "trace")]
static INIT: Once = Once::new();

#[cfg(feature = "trace")]
const DEFAULT_FILTER: &str = "kbd_session=debug,kbd_core=debug,kbd_cli=debug";

/// Keeps the file writer alive; dropping it flushes buffered events.
#[cfg(feature = "trace")]
pub struct TraceGuard(Option<tracing_appender::non_blocking::WorkerGuard>);

#[cfg(not(feature = "trace"))]
pub struct TraceGuard;

/// Install the global subscriber: JSON lines into `log_dir`, or plain text
/// on stderr without one. Filtered by `RUST_LOG` when set.
#[cfg(feature = "trace")]
pub fn init_tracing(log_dir: Option<&Path>) -> TraceGuard {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let mut guard = None;
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        match log_dir {
            Some(dir) => {
                let file_appender = tracing_appender::rolling::never(dir, "kbd-trace.jsonl");
                let (non_blocking, worker) = tracing_appender::non_blocking(file_appender);
                guard = Some(worker);
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(non_blocking)
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_env_filter(filter)
                    .init();
            }
            None => {
                tracing_subscriber::fmt()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_env_filter(filter)
                    .init();
            }
        }
    });
    TraceGuard(guard)
}

#[cfg(not(feature = "trace"))]
pub fn init_tracing(_log_dir: Option<&std::path::Path>) -> TraceGuard {
    TraceGuard
}
