//! `log` backend that forwards records over a channel.
//!
//! Dispatch diagnostics are emitted from handler threads, so the logger hands each record to a
//! crossbeam channel and leaves formatting and output to whoever owns the receiver.

use crossbeam::channel::{Receiver, Sender, unbounded};
use log::{Level, LevelFilter, Metadata, Record};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    pub level: Level,
    pub target: String,
    pub message: String,
}

pub struct ChannelLogger {
    sender: Sender<LogMessage>,
    level: LevelFilter,
}

impl log::Log for ChannelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let _ = self.sender.try_send(LogMessage {
                level: record.level(),
                target: record.target().to_owned(),
                message: format!("{}", record.args()),
            });
        }
    }

    fn flush(&self) {}
}

impl ChannelLogger {
    /// Forwards records at `Info` and above.
    pub fn new(sender: Sender<LogMessage>) -> Self {
        Self {
            sender,
            level: LevelFilter::Info,
        }
    }

    pub fn with_receiver() -> (Self, Receiver<LogMessage>) {
        let (sender, receiver) = unbounded();
        (Self::new(sender), receiver)
    }

    /// Forward records up to and including `level`.
    pub fn level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// Installs this logger as the global `log` backend.
    pub fn install(self) -> Result<(), log::SetLoggerError> {
        let level = self.level;
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(level);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Log;

    fn emit(logger: &ChannelLogger, level: Level, message: &str) {
        logger.log(
            &Record::builder()
                .level(level)
                .target("rusty_events::dispatcher")
                .args(format_args!("{message}"))
                .build(),
        );
    }

    #[test]
    fn forwards_enabled_records() {
        // Given
        let (logger, receiver) = ChannelLogger::with_receiver();

        // When
        emit(&logger, Level::Error, "handler failed");

        // Then
        assert_eq!(
            receiver.try_recv().unwrap(),
            LogMessage {
                level: Level::Error,
                target: "rusty_events::dispatcher".to_owned(),
                message: "handler failed".to_owned(),
            }
        );
    }

    #[test]
    fn drops_records_above_level() {
        let (logger, receiver) = ChannelLogger::with_receiver();

        emit(&logger, Level::Debug, "registered");

        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn level_widens_filter() {
        let (logger, receiver) = ChannelLogger::with_receiver();
        let logger = logger.level(LevelFilter::Trace);

        emit(&logger, Level::Trace, "no handlers");

        assert_eq!(receiver.try_recv().unwrap().message, "no handlers");
    }
}
