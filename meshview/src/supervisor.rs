//! Fatal fault handling.
//!
//! A panic anywhere in the process, including the ingestion tasks, is
//! treated as unrecoverable: the hook writes the message, location and a
//! backtrace to the log and exits with [`FATAL_EXIT_CODE`]. Call
//! [`install_fatal_hook`] after logging is initialized so the report reaches
//! the durable log file.

use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::{self, PanicHookInfo};
use std::process;

use tracing::error;

/// Exit status after a fatal fault.
pub const FATAL_EXIT_CODE: i32 = 1;

/// Replace the panic hook with one that logs and terminates the process.
pub fn install_fatal_hook() {
    panic::set_hook(Box::new(|info| {
        let report = FatalReport::from_panic(info);
        error!(
            thread = %report.thread,
            location = %report.location,
            "Fatal fault: {}\n{}",
            report.message,
            report.backtrace
        );
        process::exit(FATAL_EXIT_CODE);
    }));
}

/// Everything logged for one fatal fault.
#[derive(Debug, Clone)]
pub struct FatalReport {
    pub message: String,
    pub location: String,
    pub thread: String,
    pub backtrace: String,
}

impl FatalReport {
    fn from_panic(info: &PanicHookInfo<'_>) -> Self {
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());
        let thread = std::thread::current()
            .name()
            .unwrap_or("unnamed")
            .to_string();

        Self {
            message: panic_message(info.payload()),
            location,
            thread,
            backtrace: Backtrace::force_capture().to_string(),
        }
    }
}

/// Text of a panic payload; `panic!` produces either `&str` or `String`.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_from_str() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
    }

    #[test]
    fn test_panic_message_from_string() {
        let payload: Box<dyn Any + Send> = Box::new(format!("index {} out of range", 7));
        assert_eq!(panic_message(payload.as_ref()), "index 7 out of range");
    }

    #[test]
    fn test_panic_message_unknown_payload() {
        let payload: Box<dyn Any + Send> = Box::new(42u32);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic payload");
    }

    #[test]
    fn test_caught_panic_payload_is_described() {
        let result = std::panic::catch_unwind(|| {
            panic!("decoder exploded");
        });
        let payload = result.unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "decoder exploded");
    }
}
