//! Driver manager log sink
//!
//! Registry operations always emit `tracing` events. In addition, a caller
//! holding [`SqlPermission::SetLog`](crate::security::SqlPermission) can
//! install a [`LogSink`] that receives the same lines as plain text. There is
//! a single slot, so a character writer and a byte stream can never be
//! active at the same time.

use parking_lot::Mutex;
use std::fmt::{self, Write as _};
use std::io::{self, Write as _};

/// Destination for driver manager log lines
pub enum LogSink {
    /// Character sink
    Writer(Box<dyn fmt::Write + Send>),
    /// Byte sink, flushed after every line
    Stream(Box<dyn io::Write + Send>),
}

impl LogSink {
    /// Wrap a character sink
    pub fn writer(writer: impl fmt::Write + Send + 'static) -> Self {
        Self::Writer(Box::new(writer))
    }

    /// Wrap a byte sink
    pub fn stream(stream: impl io::Write + Send + 'static) -> Self {
        Self::Stream(Box::new(stream))
    }

    fn println(&mut self, line: &str) {
        // Sink failures never reach the registry operation that logged.
        match self {
            Self::Writer(w) => {
                let _ = writeln!(&mut **w, "{line}");
            }
            Self::Stream(s) => {
                let s = &mut **s;
                let _ = writeln!(s, "{line}").and_then(|_| s.flush());
            }
        }
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Writer(_) => f.write_str("LogSink::Writer"),
            Self::Stream(_) => f.write_str("LogSink::Stream"),
        }
    }
}

/// The single log slot of a driver manager
#[derive(Debug, Default)]
pub(crate) struct LogWriter {
    sink: Mutex<Option<LogSink>>,
}

impl LogWriter {
    /// Replace the sink, returning the previous one
    pub(crate) fn replace(&self, sink: Option<LogSink>) -> Option<LogSink> {
        std::mem::replace(&mut *self.sink.lock(), sink)
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.sink.lock().is_some()
    }

    /// Write one line to the sink, if any
    pub(crate) fn println(&self, line: &str) {
        tracing::debug!(target: "rdbc_core::manager", "{}", line);
        if let Some(sink) = self.sink.lock().as_mut() {
            sink.println(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedText(Arc<Mutex<String>>);

    impl fmt::Write for SharedText {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            self.0.lock().push_str(s);
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct SharedBytes {
        data: Arc<Mutex<Vec<u8>>>,
        flushes: Arc<Mutex<usize>>,
    }

    impl io::Write for SharedBytes {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.data.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            *self.flushes.lock() += 1;
            Ok(())
        }
    }

    struct BrokenPipe;

    impl io::Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_no_sink_is_silent() {
        let log = LogWriter::default();
        assert!(!log.is_enabled());
        log.println("dropped");
    }

    #[test]
    fn test_writer_sink() {
        let text = SharedText::default();
        let log = LogWriter::default();
        log.replace(Some(LogSink::writer(text.clone())));

        log.println("first");
        log.println("second");

        assert_eq!(*text.0.lock(), "first\nsecond\n");
    }

    #[test]
    fn test_stream_sink_flushes_each_line() {
        let bytes = SharedBytes::default();
        let log = LogWriter::default();
        log.replace(Some(LogSink::stream(bytes.clone())));

        log.println("one");
        log.println("two");

        assert_eq!(bytes.data.lock().as_slice(), b"one\ntwo\n");
        assert_eq!(*bytes.flushes.lock(), 2);
    }

    #[test]
    fn test_replacing_stream_with_writer() {
        let bytes = SharedBytes::default();
        let text = SharedText::default();
        let log = LogWriter::default();

        log.replace(Some(LogSink::stream(bytes.clone())));
        let previous = log.replace(Some(LogSink::writer(text.clone())));
        assert!(matches!(previous, Some(LogSink::Stream(_))));

        log.println("only text");
        assert!(bytes.data.lock().is_empty());
        assert_eq!(*text.0.lock(), "only text\n");

        assert!(log.replace(None).is_some());
        assert!(!log.is_enabled());
    }

    #[test]
    fn test_failing_stream_is_ignored() {
        let log = LogWriter::default();
        log.replace(Some(LogSink::stream(BrokenPipe)));
        log.println("lost");
        assert!(log.is_enabled());
    }
}
