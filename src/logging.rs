//! Logging setup.
//!
//! The board owns stdout, so log lines never go to the terminal. Set
//! `CHESSBOARD_LOG_FILE` to capture them; `CHESSBOARD_LOG` takes an
//! `EnvFilter` directive and defaults to `info`.

use std::fs::File;
use std::io;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_FILTER_ENV: &str = "CHESSBOARD_LOG";
/// Environment variable naming the log file.
pub const LOG_FILE_ENV: &str = "CHESSBOARD_LOG_FILE";

/// Install the global subscriber. Calling it again is a no-op.
///
/// # Errors
///
/// Returns an error if the log file cannot be created.
pub fn init_logging() -> io::Result<()> {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .with_ansi(false);

    // An already-installed subscriber is fine (tests, embedding).
    match std::env::var_os(LOG_FILE_ENV) {
        Some(path) => {
            let file = File::create(path)?;
            let _ = builder.with_writer(Mutex::new(file)).try_init();
        }
        None => {
            let _ = builder.with_writer(io::sink).try_init();
        }
    }
    Ok(())
}
