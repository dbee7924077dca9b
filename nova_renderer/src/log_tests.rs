use crate::log::{set_logger, LogEntry, LogSeverity, Logger};
use crate::Error;
use serial_test::serial;
use std::sync::{Arc, Mutex};

/// Captures entries so tests can inspect what was logged.
struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn install_capture() -> Arc<Mutex<Vec<LogEntry>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    set_logger(Box::new(CaptureLogger {
        entries: entries.clone(),
    }));
    entries
}

#[test]
#[serial]
fn test_macros_route_through_global_logger() {
    let entries = install_capture();

    render_info!("nova::test", "hello {}", 42);
    render_warn!("nova::test", "careful");

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].severity, LogSeverity::Info);
    assert_eq!(entries[0].source, "nova::test");
    assert_eq!(entries[0].message, "hello 42");
    assert_eq!(entries[1].severity, LogSeverity::Warn);
}

#[test]
#[serial]
fn test_error_macro_records_file_and_line() {
    let entries = install_capture();

    render_error!("nova::test", "bad thing");

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, LogSeverity::Error);
    assert!(entries[0].file.is_some());
    assert!(entries[0].line.is_some());
}

#[test]
#[serial]
fn test_render_err_logs_and_builds_error() {
    let entries = install_capture();

    let err: Error = render_err!("nova::test", "upload failed: {}", "oom");
    match err {
        Error::BackendError(msg) => assert_eq!(msg, "upload failed: oom"),
        other => panic!("unexpected error variant: {:?}", other),
    }
    assert_eq!(entries.lock().unwrap().len(), 1);
}

#[test]
#[serial]
fn test_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}
