//! # Boot Console
//!
//! Diagnostic output for the boot stage. The boot stage runs before any
//! console driver of the next stage exists, so output goes through whatever
//! byte sink the platform offers: the ROM's UART routine on hardware, a
//! capture buffer in tests.
//!
//! ## Output Path
//! ```text
//! log::info!(..)          console_trace!(..)
//!     ↓                       ↓
//! ConsoleLogger ──────→ console_fmt::console_write
//!                             ↓
//!                       ConsoleSink (installed once)
//!                             ↓
//!                       UART / capture buffer
//! ```
//!
//! ## Components
//!
//! * [`ConsoleSink`]: the platform's byte sink, installed once with
//!   [`install_sink`]
//! * [`ConsoleLogger`]: a level-filtered `log::Log` writing
//!   `"[LEVEL] target: message"` lines to the sink
//! * [`console_trace!`]: raw formatted output that bypasses the log facade
//!
//! ## Feature System
//!
//! With the `enabled` feature (default) output reaches the sink. Without it
//! [`console_trace!`] and the logger compile to no-ops.
//!
//! ## Usage
//! ```rust,no_run
//! use boot_console::{ConsoleLogger, ConsoleSink};
//! use log::{LevelFilter, info};
//!
//! struct Uart;
//!
//! impl ConsoleSink for Uart {
//!     fn write_str(&self, s: &str) {
//!         // hand bytes to the ROM routine
//!         # let _ = s;
//!     }
//! }
//!
//! static UART: Uart = Uart;
//!
//! ConsoleLogger::new(LevelFilter::Debug)
//!     .init(&UART)
//!     .expect("logger initialization");
//! info!("mapping partitions");
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod logger;
mod sink;

pub use logger::ConsoleLogger;
pub use sink::{ConsoleSink, install_sink};

#[cfg(feature = "enabled")]
#[doc(hidden)]
pub mod console_fmt {
    use crate::ConsoleSink;
    use core::fmt::{self, Write};

    struct SinkWriter(&'static dyn ConsoleSink);

    impl Write for SinkWriter {
        #[inline]
        fn write_str(&mut self, s: &str) -> fmt::Result {
            self.0.write_str(s);
            Ok(())
        }
    }

    #[doc(hidden)]
    #[inline]
    pub fn console_write(args: fmt::Arguments) {
        let Some(sink) = crate::sink::installed() else {
            return;
        };
        // Best-effort output.
        let _ = fmt::write(&mut SinkWriter(sink), args);
    }
}

#[cfg(not(feature = "enabled"))]
#[doc(hidden)]
pub mod console_fmt {
    use core::fmt;

    #[doc(hidden)]
    #[inline(always)]
    #[allow(clippy::inline_always)]
    pub fn console_write(_: fmt::Arguments) {}
}

/// Formats directly into the installed [`ConsoleSink`] without allocating.
#[macro_export]
macro_rules! console_trace {
    ($($arg:tt)*) => {{
        $crate::console_fmt::console_write(core::format_args!($($arg)*));
    }};
}
