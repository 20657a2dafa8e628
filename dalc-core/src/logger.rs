use std::time::{Duration, Instant};

use log::LevelFilter;

/// Settings controlling per-statement logging.
#[derive(Debug, Clone)]
pub struct LogSettings {
    pub statements_level: LevelFilter,
    pub slow_statements_level: LevelFilter,
    pub slow_statements_duration: Duration,
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            statements_level: LevelFilter::Debug,
            slow_statements_level: LevelFilter::Warn,
            slow_statements_duration: Duration::from_secs(1),
        }
    }
}

impl LogSettings {
    pub fn log_statements(&mut self, level: LevelFilter) {
        self.statements_level = level;
    }

    pub fn log_slow_statements(&mut self, level: LevelFilter, duration: Duration) {
        self.slow_statements_level = level;
        self.slow_statements_duration = duration;
    }
}

/// Logs one executed statement when dropped, upgrading to the slow-statement
/// level once the configured threshold is exceeded.
pub(crate) struct StatementLogger<'q> {
    text: &'q str,
    settings: LogSettings,
    start: Instant,
}

impl<'q> StatementLogger<'q> {
    pub(crate) fn new(text: &'q str, settings: LogSettings) -> Self {
        StatementLogger {
            text,
            settings,
            start: Instant::now(),
        }
    }
}

impl Drop for StatementLogger<'_> {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let was_slow = elapsed >= self.settings.slow_statements_duration;

        let filter = if was_slow {
            self.settings.slow_statements_level
        } else {
            self.settings.statements_level
        };

        if let Some(level) = filter.to_level() {
            if was_slow {
                log::log!(
                    target: "dalc::statement",
                    level,
                    "slow statement: took {elapsed:.3?}; {}",
                    self.text,
                );
            } else {
                log::log!(
                    target: "dalc::statement",
                    level,
                    "executed in {elapsed:.3?}; {}",
                    self.text,
                );
            }
        }
    }
}
