use std::fmt;

/// Sink for one-line bridge diagnostics.
///
/// The calculation host owns the sink and hands it to the bridge through
/// [`crate::QueryContext`]; there is no ambient logger state. A successful
/// invocation writes the statements it executed; a failed one writes a
/// single line carrying the query text plus the engine's error code and
/// message.
pub trait DebugLog {
    fn write_debug_log(&self, line: fmt::Arguments<'_>);
}

/// Adapter that forwards diagnostics to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct FacadeLog;

impl DebugLog for FacadeLog {
    fn write_debug_log(&self, line: fmt::Arguments<'_>) {
        log::debug!("{line}");
    }
}
