//! Minimal stderr logger.
//!
//! Prints `[elapsed LEVEL target] message`, the elapsed time counted from
//! installation. Records from the `sudoku_lens*` crates pass at the chosen
//! level; everything else (image decoders, user crates) is capped at `warn`.
//! Install it once at startup with [`init_with_level`]; with the `tracing`
//! feature, [`init_tracing`] installs a `tracing-subscriber` formatter with
//! the same scoping instead.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

const PIPELINE_TARGET: &str = "sudoku_lens";
const FOREIGN_LEVEL: LevelFilter = LevelFilter::Warn;

struct StageLogger {
    level: LevelFilter,
    started: Instant,
}

impl StageLogger {
    fn level_for(&self, target: &str) -> LevelFilter {
        if target.starts_with(PIPELINE_TARGET) {
            self.level
        } else {
            self.level.min(FOREIGN_LEVEL)
        }
    }
}

impl Log for StageLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level_for(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let elapsed = self.started.elapsed().as_secs_f64();
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(
            stderr,
            "[{:8.3}s {:>5} {}] {}",
            elapsed,
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StageLogger> = OnceLock::new();

/// Install the stderr logger with the given level filter.
///
/// Repeated calls after the first successful one are no-ops. Fails only when
/// another `log` implementation is already installed.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| StageLogger {
            level,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(level);
    }
    Ok(())
}

/// Install a `tracing` formatter honouring `RUST_LOG`; without it, pipeline
/// spans log at `info` and other targets at `warn`. Span close events carry
/// stage timings.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,{PIPELINE_TARGET}=info")));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE);
    if json {
        let _ = builder.json().flatten_event(true).finish().try_init();
    } else {
        let _ = builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logger(level: LevelFilter) -> StageLogger {
        StageLogger {
            level,
            started: Instant::now(),
        }
    }

    fn enabled(logger: &StageLogger, level: log::Level, target: &str) -> bool {
        logger.enabled(&Metadata::builder().level(level).target(target).build())
    }

    #[test]
    fn pipeline_targets_follow_the_chosen_level() {
        let l = logger(LevelFilter::Trace);
        assert!(enabled(&l, log::Level::Trace, "sudoku_lens_board::locate"));
        assert!(enabled(&l, log::Level::Debug, "sudoku_lens::pipeline"));
        assert!(!enabled(&l, log::Level::Debug, "image::codecs::png"));
        assert!(enabled(&l, log::Level::Warn, "image::codecs::png"));
    }

    #[test]
    fn quiet_level_also_quiets_foreign_targets() {
        let l = logger(LevelFilter::Error);
        assert!(!enabled(&l, log::Level::Warn, "sudoku_lens_overlay"));
        assert!(!enabled(&l, log::Level::Warn, "imageproc"));
        assert!(enabled(&l, log::Level::Error, "imageproc"));
    }

    #[test]
    fn second_install_is_a_no_op() {
        assert!(init_with_level(LevelFilter::Debug).is_ok());
        assert!(init_with_level(LevelFilter::Trace).is_ok());
        log::debug!("logger installed");
    }
}
