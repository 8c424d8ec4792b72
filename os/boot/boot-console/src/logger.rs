use crate::{ConsoleSink, console_trace, install_sink};
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

pub struct ConsoleLogger {
    max_level: LevelFilter,
}

impl ConsoleLogger {
    #[must_use]
    pub const fn new(max_level: LevelFilter) -> Self {
        Self { max_level }
    }

    /// Installs `sink` and registers this logger. Call once during early init.
    #[allow(static_mut_refs, clippy::missing_errors_doc)]
    pub fn init(self, sink: &'static dyn ConsoleSink) -> Result<(), SetLoggerError> {
        // log::set_logger wants a &'static dyn Log and there is no allocator.
        static mut LOGGER: Option<ConsoleLogger> = None;

        install_sink(sink);
        let max_level = self.max_level;

        // SAFETY: written once, before the logger is registered.
        unsafe {
            LOGGER = Some(self);
            if let Some(logger) = LOGGER.as_ref() {
                log::set_logger(logger as &'static dyn Log)?;
            }
        }
        log::set_max_level(max_level);
        Ok(())
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        console_trace!(
            "[{}] {}: {}\n",
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {}
}
