//! Tracing setup for the monodash binary.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{config::DEFAULT_LOG_LEVEL, utils::LOG_FILE_PREFIX, MonodashError, MonodashResult};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Installs the global tracing subscriber.
///
/// The filter is `debug` when `verbose` is set, otherwise `RUST_LOG`, otherwise `level`, otherwise
/// `info`. Events go to stderr, and additionally to a daily rolling file in `log_dir` if given.
/// The returned guard flushes the file writer on drop and must be held until exit.
pub fn init_tracing(
    verbose: bool,
    level: Option<&str>,
    log_dir: Option<&Path>,
) -> MonodashResult<Option<WorkerGuard>> {
    let filter = build_filter(verbose, level)?;

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_level(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(MonodashError::custom)?;

    Ok(guard)
}

fn build_filter(verbose: bool, level: Option<&str>) -> MonodashResult<EnvFilter> {
    if verbose {
        return Ok(EnvFilter::new("debug"));
    }

    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let directive = level.unwrap_or(DEFAULT_LOG_LEVEL);
    EnvFilter::try_new(directive).map_err(|e| {
        MonodashError::InvalidConfig(format!("invalid log level '{}': {}", directive, e))
    })
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_overrides_level() -> MonodashResult<()> {
        let filter = build_filter(true, Some("error"))?;
        assert_eq!(filter.to_string(), "debug");
        Ok(())
    }

    #[test]
    fn test_bad_level_is_rejected() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        assert!(matches!(
            build_filter(false, Some("monodash=loud")),
            Err(MonodashError::InvalidConfig(_))
        ));
    }
}
