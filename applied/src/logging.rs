// Logging for the applied executors and collections
//
// Built on the `tracing` ecosystem. Workers run on named runtime threads, so
// thread names in the output identify which worker ran a callback.
//
// # Usage Examples
//
// ## Basic Initialization
//
// ```rust
// use applied::logging;
//
// // INFO level, console output
// logging::init_default();
//
// // Or with custom settings
// let config = logging::LogConfig {
//     level: tracing::Level::DEBUG,
//     json_format: false,
//     ..Default::default()
// };
// logging::init(config);
// ```
//
// ## File Logging
//
// ```rust
// use applied::logging;
//
// let config = logging::LogConfig::default();
// logging::init_with_file(config, "/var/log/applied/app.log").unwrap();
// ```
//
// ## Using Log Macros
//
// ```rust
// use applied::{log_drain, pool_span};
//
// let span = pool_span!("shutdown", workers = 4);
// let _guard = span.enter();
// log_drain!("orders", 3);
// ```

use std::io;
use std::str::FromStr;
use std::sync::Once;

use tracing::{Level, Subscriber};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Configuration for the logging system
///
/// # Examples
///
/// ```rust
/// use applied::logging::LogConfig;
/// use tracing::Level;
///
/// let custom_config = LogConfig {
///     level: Level::DEBUG,
///     json_format: true,
///     show_file_line: false,
///     show_thread_info: true,
///     show_time: true,
///     target_filters: Some("applied=debug,applied::scheduler=trace".to_string()),
/// };
/// ```
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: Level,
    /// Whether to use JSON format for logs
    pub json_format: bool,
    /// Whether to include file and line information
    pub show_file_line: bool,
    /// Whether to include thread name/id
    pub show_thread_info: bool,
    /// Whether to include timestamps
    pub show_time: bool,
    /// Target filter expressions (format: "target=level,target2=level2,...")
    pub target_filters: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            show_file_line: true,
            show_thread_info: true,
            show_time: true,
            target_filters: None,
        }
    }
}

impl LogConfig {
    /// Default configuration at the level named by `name` ("warn", "DEBUG", ...).
    ///
    /// Returns `None` if the name is not a level.
    pub fn from_level_name(name: &str) -> Option<Self> {
        let level = Level::from_str(name.trim()).ok()?;
        Some(Self {
            level,
            ..Default::default()
        })
    }

    /// DEBUG level with scheduler tracing and source locations.
    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            target_filters: Some("applied=debug,applied::scheduler=trace".to_string()),
            ..Default::default()
        }
    }

    /// JSON output at INFO level without source locations.
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            json_format: true,
            show_file_line: false,
            show_thread_info: true,
            show_time: true,
            target_filters: None,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        let mut env_filter = EnvFilter::from_default_env().add_directive(self.level.into());
        if let Some(filters) = &self.target_filters {
            for filter in filters.split(',') {
                if let Ok(directive) = filter.parse() {
                    env_filter = env_filter.add_directive(directive);
                }
            }
        }
        env_filter
    }
}

// Initialization guard to ensure we only initialize once
static INIT: Once = Once::new();

/// Initialize the logging system with the given configuration
///
/// Safe to call multiple times; only the first call takes effect.
pub fn init(config: LogConfig) {
    INIT.call_once(|| {
        let registry = tracing_subscriber::registry().with(config.env_filter());

        let subscriber: Box<dyn Subscriber + Send + Sync> = if config.json_format {
            Box::new(registry.with(fmt::layer().json().flatten_event(true)))
        } else {
            let fmt_layer = fmt::layer()
                .with_ansi(atty::is(atty::Stream::Stdout))
                .with_file(config.show_file_line)
                .with_line_number(config.show_file_line)
                .with_thread_names(config.show_thread_info)
                .with_thread_ids(config.show_thread_info);
            if config.show_time {
                Box::new(registry.with(fmt_layer))
            } else {
                Box::new(registry.with(fmt_layer.without_time()))
            }
        };

        set_global_subscriber(subscriber);
    });
}

fn set_global_subscriber<S>(subscriber: S)
where
    S: Subscriber + Send + Sync + 'static,
{
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Error setting global tracing subscriber: {}", err);
    }
}

/// Opens `path` for appending, creating it if needed.
pub fn file_writer(path: &str) -> io::Result<Box<dyn io::Write + Send + Sync + 'static>> {
    use std::fs::OpenOptions;

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(Box::new(file))
}

/// Initialize logging with both console and file output
///
/// Console output respects the terminal's color support; file output is always
/// plain. Fails if the file cannot be opened, in which case nothing is installed.
pub fn init_with_file(config: LogConfig, log_file: &str) -> Result<(), io::Error> {
    // Surface a bad path before taking the one-time guard
    file_writer(log_file)?;

    INIT.call_once(|| {
        let console_layer = fmt::layer()
            .with_ansi(atty::is(atty::Stream::Stdout))
            .with_file(config.show_file_line)
            .with_line_number(config.show_file_line)
            .with_thread_names(config.show_thread_info)
            .with_thread_ids(config.show_thread_info);

        let log_file_path = log_file.to_string();
        let file_layer = fmt::layer()
            .with_ansi(false)
            .with_writer(move || match file_writer(&log_file_path) {
                Ok(writer) => writer,
                Err(_) => Box::new(io::stderr()),
            })
            .with_file(true)
            .with_line_number(true)
            .with_thread_names(true)
            .with_thread_ids(true);

        let subscriber = tracing_subscriber::registry()
            .with(config.env_filter())
            .with(console_layer)
            .with(file_layer);

        set_global_subscriber(subscriber);
    });

    Ok(())
}

/// INFO level, human-readable console output.
pub fn init_default() {
    init(LogConfig::default());
}

/// Initialize logging for testing
///
/// Warnings and errors only, no thread info, no timestamps.
///
/// ```rust
/// #[test]
/// fn my_test() {
///     applied::logging::init_test();
///     // ...
/// }
/// ```
pub fn init_test() {
    init(LogConfig {
        level: Level::WARN,
        json_format: false,
        show_file_line: true,
        show_thread_info: false,
        show_time: false,
        target_filters: None,
    });
}

/// Create a span for worker pool operations
///
/// ```rust
/// use applied::pool_span;
///
/// let span = pool_span!("shutdown");
/// let _guard = span.enter();
///
/// let span = pool_span!("submit", workers = 4);
/// ```
#[macro_export]
macro_rules! pool_span {
    ($operation:expr) => {
        tracing::info_span!("pool", operation = $operation)
    };
    ($operation:expr, $($fields:tt)*) => {
        tracing::info_span!("pool", operation = $operation, $($fields)*)
    };
}

/// Log the outcome of a single unit of work
///
/// ```rust
/// use applied::log_task;
///
/// log_task!(7u64, "completed");
/// log_task!(8u64, "completed", worker = 2);
/// ```
#[macro_export]
macro_rules! log_task {
    ($task_id:expr, $status:expr) => {
        tracing::trace!(task = $task_id, status = $status);
    };
    ($task_id:expr, $status:expr, $($fields:tt)*) => {
        tracing::trace!(task = $task_id, status = $status, $($fields)*);
    };
}

/// Log a drain pass: a key drained by the keyed executor or a ledger waited on
///
/// ```rust
/// use applied::log_drain;
///
/// log_drain!("order-17", 2);
/// log_drain!("ledger", 5, failed = 1);
/// ```
#[macro_export]
macro_rules! log_drain {
    ($source:expr, $count:expr) => {
        tracing::debug!(source = $source, count = $count, "drained");
    };
    ($source:expr, $count:expr, $($fields:tt)*) => {
        tracing::debug!(source = $source, count = $count, $($fields)*, "drained");
    };
}

/// Log a failure reported at a worker or container boundary
///
/// ```rust
/// use applied::log_error;
///
/// log_error!("task", "callback panicked");
/// log_error!("task", "callback panicked", task = 3u64);
/// ```
#[macro_export]
macro_rules! log_error {
    ($context:expr, $error:expr) => {
        tracing::error!(context = $context, error = %$error);
    };
    ($context:expr, $error:expr, $($fields:tt)*) => {
        tracing::error!(context = $context, error = %$error, $($fields)*);
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_names() {
        assert_eq!(LogConfig::from_level_name("debug").map(|c| c.level), Some(Level::DEBUG));
        assert_eq!(LogConfig::from_level_name(" WARN ").map(|c| c.level), Some(Level::WARN));
        assert!(LogConfig::from_level_name("loud").is_none());
    }

    #[test]
    fn test_presets() {
        let development = LogConfig::development();
        assert_eq!(development.level, Level::DEBUG);
        assert!(!development.json_format);
        assert!(development.target_filters.unwrap().contains("applied::scheduler=trace"));

        let production = LogConfig::production();
        assert_eq!(production.level, Level::INFO);
        assert!(production.json_format);
        assert!(!production.show_file_line);
    }

    #[test]
    fn test_init_is_idempotent() {
        init_test();
        init_test();
        init_default();
    }

    #[test]
    fn test_macros_expand() {
        init_test();
        let _guard = crate::pool_span!("test", workers = 1).entered();
        crate::log_task!(1u64, "completed");
        crate::log_drain!("key", 2usize, failed = 0usize);
        crate::log_error!("task", "boom", task = 3u64);
    }
}
