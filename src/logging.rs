use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE: &str = "subdim.log";

/// Initialise logging to stderr and to `subdim.log` in `dir`.
///
/// Without `debug` the level is pinned to `info` and `RUST_LOG` is ignored.
/// With it, `RUST_LOG` may override the `debug` default. Keep the returned
/// guard alive for the life of the process or buffered lines are lost.
pub fn init(debug: bool, dir: &Path) -> Option<WorkerGuard> {
    let level = if debug { "debug" } else { "info" };
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    if let Err(err) = std::fs::create_dir_all(dir) {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
        tracing::warn!(dir = %dir.display(), error = %err, "log directory unavailable, logging to stderr only");
        return None;
    }

    let (file, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, LOG_FILE));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(std::io::stderr.and(file))
        .try_init();
    Some(guard)
}
