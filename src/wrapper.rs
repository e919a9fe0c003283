use crate::record::Record;

/// Destination of request records.
///
/// `emit` is called synchronously from the task serving the request, once per logged request,
/// and may be called concurrently from several workers. Delivery is best effort: a sink
/// swallows its own failures, they never reach the response.
pub trait Sink: Send + Sync {
    fn emit(&self, record: &Record);
}

impl<F> Sink for F
where
    F: Fn(&Record) + Send + Sync,
{
    fn emit(&self, record: &Record) {
        self(record)
    }
}

#[cfg(feature = "log")]
pub mod rust_log {
    use std::{borrow::Cow, panic::Location};

    use super::Sink;
    use crate::record::{Level, Record, Value};

    pub const DEFAULT_TARGET: &str = "actix_web_request_slog::logger";

    /// [`Sink`] that forwards records to the `log` facade.
    ///
    /// Groups are flattened into dotted keys (`request.method`, `response.status`, ...) and
    /// passed as structured key-values; the record message becomes the log message.
    #[derive(Debug, Clone)]
    pub struct LogSink {
        target: Cow<'static, str>,
    }

    impl LogSink {
        pub fn new() -> Self {
            LogSink {
                target: Cow::Borrowed(DEFAULT_TARGET),
            }
        }

        /// Sets the logging target to `target`.
        ///
        /// By default, the log target is `actix_web_request_slog::logger`.
        ///
        /// # Examples
        /// Using `.target("http_slog")` would have this effect on request logs:
        /// ```diff
        /// - [2015-10-21T07:28:00Z INFO  actix_web_request_slog::logger] REQUEST
        /// + [2015-10-21T07:28:00Z INFO  http_slog] REQUEST
        ///                               ^^^^^^^^^
        /// ```
        pub fn target(mut self, target: impl Into<Cow<'static, str>>) -> Self {
            self.target = target.into();
            self
        }
    }

    impl Default for LogSink {
        fn default() -> Self {
            LogSink::new()
        }
    }

    impl Sink for LogSink {
        fn emit(&self, record: &Record) {
            log(
                record.level.into(),
                self.target.as_ref(),
                module_path!(),
                Location::caller(),
                record,
            );
        }
    }

    impl From<Level> for log::Level {
        fn from(level: Level) -> Self {
            match level {
                Level::Info => log::Level::Info,
                Level::Error => log::Level::Error,
            }
        }
    }

    fn kv_value(value: &Value) -> log::kv::Value<'_> {
        match value {
            Value::Str(s) => log::kv::Value::from(s.as_str()),
            Value::Int(i) => log::kv::Value::from(*i),
            Value::Uint(u) => log::kv::Value::from(*u),
            Value::Float(f) => log::kv::Value::from(*f),
            Value::Bool(b) => log::kv::Value::from(*b),
            Value::Group(_) => log::kv::Value::from_display(value),
        }
    }

    pub fn log(
        level: log::Level,
        target: &str,
        module_path: &'static str,
        loc: &'static Location,
        record: &Record,
    ) {
        if level > log::max_level() {
            return;
        }

        let flat = record.flatten();
        let kvs: Vec<(&str, log::kv::Value)> = flat
            .iter()
            .map(|(k, v)| (k.as_str(), kv_value(v)))
            .collect();
        let kvs = kvs.as_slice();

        log::logger().log(
            &log::Record::builder()
                .args(format_args!("{}", record.message))
                .level(level)
                .target(target)
                .module_path_static(Some(module_path))
                .file_static(Some(loc.file()))
                .line(Some(loc.line()))
                .key_values(&kvs)
                .build(),
        );
    }

}
