//! Routing `tracing` output to a line-oriented console.
//!
//! The crate itself only emits events. A page that loads the crate from JS has
//! no way to install a subscriber, so the browser entry point installs one
//! built here, with a sink that forwards each formatted line to
//! `console.debug` / `console.log` / `console.warn` / `console.error`.

use std::io;

use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;

/// Console method a formatted line is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    /// `console.debug`
    Debug,
    /// `console.log`
    Log,
    /// `console.warn`
    Warn,
    /// `console.error`
    Error,
}

impl ConsoleLevel {
    /// Console method for a `tracing` level.
    #[must_use]
    pub fn from_level(level: &Level) -> Self {
        match *level {
            Level::ERROR => Self::Error,
            Level::WARN => Self::Warn,
            Level::INFO => Self::Log,
            Level::DEBUG | Level::TRACE => Self::Debug,
        }
    }
}

/// Buffers one formatted event and hands it to the sink as a single line.
pub struct LineWriter<'a, S>
where
    S: Fn(ConsoleLevel, &str),
{
    sink: &'a S,
    level: ConsoleLevel,
    buf: Vec<u8>,
}

impl<'a, S> LineWriter<'a, S>
where
    S: Fn(ConsoleLevel, &str),
{
    fn new(sink: &'a S, level: ConsoleLevel) -> Self {
        Self {
            sink,
            level,
            buf: Vec::new(),
        }
    }

    fn emit(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let line = String::from_utf8_lossy(&self.buf);
        (self.sink)(self.level, line.trim_end());
        self.buf.clear();
    }
}

impl<S> io::Write for LineWriter<'_, S>
where
    S: Fn(ConsoleLevel, &str),
{
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.emit();
        Ok(())
    }
}

impl<S> Drop for LineWriter<'_, S>
where
    S: Fn(ConsoleLevel, &str),
{
    fn drop(&mut self) {
        self.emit();
    }
}

/// `MakeWriter` that picks the console method from each event's level.
#[derive(Debug, Clone)]
pub struct ConsoleMakeWriter<S> {
    sink: S,
}

impl<S> ConsoleMakeWriter<S> {
    /// Wrap a line sink.
    pub const fn new(sink: S) -> Self {
        Self { sink }
    }
}

impl<'a, S> MakeWriter<'a> for ConsoleMakeWriter<S>
where
    S: Fn(ConsoleLevel, &str) + 'a,
{
    type Writer = LineWriter<'a, S>;

    fn make_writer(&'a self) -> Self::Writer {
        LineWriter::new(&self.sink, ConsoleLevel::Log)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        LineWriter::new(&self.sink, ConsoleLevel::from_level(meta.level()))
    }
}

/// Subscriber that formats events without timestamps or ANSI colours and
/// forwards them to `sink`.
pub fn console_subscriber<S>(sink: S, max_level: Level) -> impl tracing::Subscriber + Send + Sync + 'static
where
    S: Fn(ConsoleLevel, &str) + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_writer(ConsoleMakeWriter::new(sink))
        .with_ansi(false)
        .without_time()
        .with_max_level(max_level)
        .finish()
}

/// Install a console subscriber as the global default.
///
/// Returns false when the host already installed one; the existing subscriber is kept.
pub fn try_init_console<S>(sink: S, max_level: Level) -> bool
where
    S: Fn(ConsoleLevel, &str) + Send + Sync + 'static,
{
    tracing::subscriber::set_global_default(console_subscriber(sink, max_level)).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;
    use std::rc::Rc;
    use std::sync::{Arc, Mutex};

    use tracing::{debug, warn};

    use crate::interceptor::LogoutInterceptor;
    use crate::storage::InMemoryKeyValueStore;
    use crate::sweep::CacheCapability;

    type Lines = Arc<Mutex<Vec<(ConsoleLevel, String)>>>;

    fn collecting_sink(lines: &Lines) -> impl Fn(ConsoleLevel, &str) + Send + Sync + 'static {
        let lines = Arc::clone(lines);
        move |level, line| lines.lock().unwrap().push((level, line.to_string()))
    }

    #[test]
    fn levels_map_to_console_methods() {
        assert_eq!(ConsoleLevel::from_level(&Level::ERROR), ConsoleLevel::Error);
        assert_eq!(ConsoleLevel::from_level(&Level::WARN), ConsoleLevel::Warn);
        assert_eq!(ConsoleLevel::from_level(&Level::INFO), ConsoleLevel::Log);
        assert_eq!(ConsoleLevel::from_level(&Level::DEBUG), ConsoleLevel::Debug);
        assert_eq!(ConsoleLevel::from_level(&Level::TRACE), ConsoleLevel::Debug);
    }

    #[test]
    fn line_writer_emits_once_per_event_without_trailing_newline() {
        let lines: Lines = Arc::default();
        let sink = collecting_sink(&lines);
        {
            let mut writer = LineWriter::new(&sink, ConsoleLevel::Warn);
            writer.write_all(b"part one, ").unwrap();
            writer.write_all(b"part two\n").unwrap();
        }
        {
            // Nothing written: nothing emitted.
            let _writer = LineWriter::new(&sink, ConsoleLevel::Log);
        }

        let lines = lines.lock().unwrap();
        assert_eq!(*lines, vec![(ConsoleLevel::Warn, "part one, part two".to_string())]);
    }

    #[test]
    fn clear_pass_reaches_the_console_as_one_log_line() {
        let lines: Lines = Arc::default();
        let subscriber = console_subscriber(collecting_sink(&lines), Level::INFO);

        tracing::subscriber::with_default(subscriber, || {
            let interceptor = LogoutInterceptor::with_defaults(
                Rc::new(InMemoryKeyValueStore::new()),
                Rc::new(InMemoryKeyValueStore::new()),
                CacheCapability::Absent,
            );
            interceptor.clear_client_storage();
            warn!("storage quota nearly exhausted");
            debug!("below the configured level");
        });

        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 2, "unexpected console output: {lines:?}");
        assert_eq!(lines[0].0, ConsoleLevel::Log);
        assert!(lines[0].1.contains("Client storage cleared during logout"));
        assert!(!lines[0].1.ends_with('\n'));
        assert_eq!(lines[1].0, ConsoleLevel::Warn);
        assert!(lines[1].1.contains("storage quota nearly exhausted"));
    }
}
