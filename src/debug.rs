//! Leveled debug logging for the linking engine.
//!
//! Output goes to stderr (or the browser console when built with the `wasm`
//! feature). Enabled via `debug: true` in the configuration or the
//! `WELLBEING_DEBUG=1` environment variable.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Environment variable that switches debug output on.
pub const DEBUG_ENV: &str = "WELLBEING_DEBUG";

/// Global debug mode flag.
static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

/// Start time stored as millis since UNIX epoch (atomic-safe).
static START_TIME_MS: AtomicU64 = AtomicU64::new(0);

/// Wall clock in milliseconds.
#[cfg(not(feature = "wasm"))]
fn now_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// Wall clock in milliseconds.
#[cfg(feature = "wasm")]
fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Enables debug mode globally.
pub fn enable() {
    START_TIME_MS.store(now_ms() as u64, Ordering::SeqCst);
    DEBUG_ENABLED.store(true, Ordering::SeqCst);
}

/// Disables debug mode globally.
pub fn disable() {
    DEBUG_ENABLED.store(false, Ordering::SeqCst);
}

/// Returns true if debug mode is enabled.
#[inline]
pub fn is_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::Relaxed)
}

/// Returns true if the environment asks for debug output.
pub fn env_requested() -> bool {
    std::env::var(DEBUG_ENV).is_ok_and(|v| matches!(v.as_str(), "1" | "true" | "yes"))
}

/// Gets elapsed time since debug was enabled.
fn elapsed_ms() -> u64 {
    let start = START_TIME_MS.load(Ordering::Relaxed);
    if start == 0 {
        return 0;
    }
    (now_ms() as u64).saturating_sub(start)
}

/// Debug log levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Tracing entry/exit of functions
    Trace,
    /// Debug information
    Debug,
    /// Informational messages
    Info,
    /// Warnings
    Warn,
    /// Errors
    Error,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }

    #[cfg_attr(feature = "wasm", allow(dead_code))]
    fn color_code(self) -> &'static str {
        match self {
            Level::Trace => "\x1b[90m", // Gray
            Level::Debug => "\x1b[36m", // Cyan
            Level::Info => "\x1b[32m",  // Green
            Level::Warn => "\x1b[33m",  // Yellow
            Level::Error => "\x1b[31m", // Red
        }
    }
}

/// Logs a debug message if debug mode is enabled.
pub fn log(level: Level, component: &str, message: &str) {
    if !is_enabled() {
        return;
    }
    emit(level, component, message);
}

#[cfg(not(feature = "wasm"))]
fn emit(level: Level, component: &str, message: &str) {
    use std::io::{self, Write};

    let reset = "\x1b[0m";

    // Format: [+0000ms] [LEVEL] [component] message
    let _ = writeln!(
        io::stderr(),
        "[+{:04}ms] {}[{:5}]{} [{}] {}",
        elapsed_ms(),
        level.color_code(),
        level.as_str(),
        reset,
        component,
        message
    );
}

#[cfg(feature = "wasm")]
fn emit(level: Level, component: &str, message: &str) {
    let line = format!(
        "[+{:04}ms] [{:5}] [{}] {}",
        elapsed_ms(),
        level.as_str(),
        component,
        message
    );
    let line = wasm_bindgen::JsValue::from_str(&line);
    match level {
        Level::Warn => web_sys::console::warn_1(&line),
        Level::Error => web_sys::console::error_1(&line),
        _ => web_sys::console::log_1(&line),
    }
}

/// Logs with format arguments.
#[macro_export]
macro_rules! debug_log {
    ($level:expr, $component:expr, $($arg:tt)*) => {
        if $crate::debug::is_enabled() {
            $crate::debug::log($level, $component, &format!($($arg)*));
        }
    };
}

/// Convenience macro for trace level.
#[macro_export]
macro_rules! trace {
    ($component:expr, $($arg:tt)*) => {
        $crate::debug_log!($crate::debug::Level::Trace, $component, $($arg)*)
    };
}

/// Convenience macro for debug level.
#[macro_export]
macro_rules! debug {
    ($component:expr, $($arg:tt)*) => {
        $crate::debug_log!($crate::debug::Level::Debug, $component, $($arg)*)
    };
}

/// Convenience macro for info level.
#[macro_export]
macro_rules! info {
    ($component:expr, $($arg:tt)*) => {
        $crate::debug_log!($crate::debug::Level::Info, $component, $($arg)*)
    };
}

/// Convenience macro for warn level.
#[macro_export]
macro_rules! warn {
    ($component:expr, $($arg:tt)*) => {
        $crate::debug_log!($crate::debug::Level::Warn, $component, $($arg)*)
    };
}

/// Convenience macro for error level.
#[macro_export]
macro_rules! error {
    ($component:expr, $($arg:tt)*) => {
        $crate::debug_log!($crate::debug::Level::Error, $component, $($arg)*)
    };
}

/// RAII guard for timing a scope.
pub struct TimingGuard {
    component: &'static str,
    operation: String,
    start_ms: f64,
}

impl TimingGuard {
    /// Creates a new timing guard.
    pub fn new(component: &'static str, operation: impl Into<String>) -> Self {
        let operation = operation.into();
        if is_enabled() {
            log(Level::Trace, component, &format!("-> {operation}"));
        }
        Self {
            component,
            operation,
            start_ms: now_ms(),
        }
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        if is_enabled() {
            let elapsed = (now_ms() - self.start_ms).max(0.0);
            log(
                Level::Trace,
                self.component,
                &format!("<- {} ({elapsed:.2}ms)", self.operation),
            );
        }
    }
}

/// Creates a timing guard for a scope.
#[macro_export]
macro_rules! time_scope {
    ($component:expr, $operation:expr) => {
        let _guard = $crate::debug::TimingGuard::new($component, $operation);
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enable_disable() {
        disable();
        assert!(!is_enabled());

        enable();
        assert!(is_enabled());

        disable();
        assert!(!is_enabled());
    }

    #[test]
    fn test_level_as_str() {
        assert_eq!(Level::Trace.as_str(), "TRACE");
        assert_eq!(Level::Debug.as_str(), "DEBUG");
        assert_eq!(Level::Info.as_str(), "INFO");
        assert_eq!(Level::Warn.as_str(), "WARN");
        assert_eq!(Level::Error.as_str(), "ERROR");
    }

    #[test]
    fn test_level_has_color() {
        for level in [Level::Trace, Level::Debug, Level::Info, Level::Warn, Level::Error] {
            assert!(!level.color_code().is_empty());
        }
    }

    #[test]
    fn test_log_when_disabled_does_nothing() {
        disable();
        log(Level::Debug, "test", "message");
    }

    #[test]
    fn test_macros_expand() {
        crate::trace!("test", "trace {}", 1);
        crate::debug!("test", "debug {}", 2);
        crate::info!("test", "info");
        crate::warn!("test", "warn {:?}", Some(3));
        crate::error!("test", "error");
    }

    #[test]
    fn test_timing_guard_records_operation() {
        let guard = TimingGuard::new("pipeline", "filter");
        assert_eq!(guard.component, "pipeline");
        assert_eq!(guard.operation, "filter");
        drop(guard);
    }
}
