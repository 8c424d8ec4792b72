/// Byte sink provided by the platform.
///
/// Implementations must accept output from any context; the boot stage may
/// log from its fatal error path right before a restart.
pub trait ConsoleSink: Sync {
    fn write_str(&self, s: &str);
}

static mut SINK: Option<&'static dyn ConsoleSink> = None;

/// Routes [`console_trace!`](crate::console_trace) and the logger to `sink`.
///
/// Call during early init, before anything else logs. A later call replaces
/// the previous sink.
#[allow(static_mut_refs)]
pub fn install_sink(sink: &'static dyn ConsoleSink) {
    // SAFETY: the boot stage runs on a single thread of control and installs
    // the sink before emitting any output.
    unsafe {
        SINK = Some(sink);
    }
}

#[allow(static_mut_refs, dead_code)]
pub(crate) fn installed() -> Option<&'static dyn ConsoleSink> {
    // SAFETY: see `install_sink`; the value is only written during early init.
    unsafe { SINK }
}
