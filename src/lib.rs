//! Actix-web middleware for grouped structured request logs.
//! One record per request, with the request and response summaries nested in `request` and
//! `response` groups.
//!
//! # Examples:
//! ## By default middleware uses the standard `log` crate for logging.
//! ```bash
//! cargo add actix-web-request-slog
//! ```
//! Example usage with standard `log` crate and `structured_logger` crate:
//! ```rust
//! use actix_web::{web, App, HttpServer, main};
//! use actix_web_request_slog::{SLogger, ignore_path};
//! use tokio;
//! use structured_logger::{Builder, async_json::new_writer, unix_ms};
//!
//! #[actix_web::main] // or #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     Builder::new()
//!         .with_target_writer("*", new_writer(tokio::io::stdout()))
//!         .init();
//!
//!     let logger = SLogger::default().with_filter(ignore_path("/healthcheck"));
//!
//!     HttpServer::new(move || {
//!         App::new()
//!             .wrap(logger.build())
//!             .route("/", web::get().to(|| async { "Hello world!" }))
//!     })
//!     .bind("127.0.0.1:8080")?;
//!     Ok(())
//! }
//! ```
//! A request produces:
//! ```text
//! level=INFO msg=REQUEST request.method=GET request.uri=/ response.status=200
//! ```
//! Handler errors add `response.error` after the status. Records with an error, or with a
//! status of 500 and above, are logged at error level.
//!
//! ## `tracing-request-id` feature allows to log Request ID that set by `TracingLogger`.
//! ```bash
//! cargo add actix-web-request-slog --features tracing-request-id
//! ```
//! The ID is read when `log_request_id` is enabled and no `X-Request-ID` header is present.
//!
//! # Features
//! - Grouped structured records (`request.*`, `response.*`) with fixed attribute order
//! - Severity escalation on errors and 5xx statuses
//! - Request filters, exact path and regex based exclusion out of the box
//! - Extra attributes computed per request
//! - Config modifiers selecting what is captured (latency, route, request ID, headers, etc.)
//! - Pluggable [`Sink`], with a `log` crate sink by default
//!
//! # Configuration
//!
//! ## Extra attributes
//!
//! ```rust
//! use actix_web_request_slog::{Attr, SLogger};
//!
//! let logger = SLogger::default()
//!     .with_config_modifier(|config| config.log_latency = true)
//!     .with_extra_attr_fn(|ctx| match ctx.values.latency {
//!         Some(latency) => vec![Attr::new("latency_ms", latency.as_seconds_f64() * 1000.0)],
//!         None => vec![],
//!     });
//! ```
//! ## Path Exclusions
//!
//! Exclude specific paths from logging:
//!
//! ```rust
//! use actix_web_request_slog::{SLogger, ignore_path};
//!
//! let logger = SLogger::default()
//!     .with_filter(ignore_path("/health"))
//!     .with_filter(ignore_path("/metrics"));
//! ```
//!
//! use regex patterns:
//!
//! ```rust
//! use actix_web_request_slog::{SLogger, ignore_path_regex};
//!
//! let logger = SLogger::default()
//!     .with_filter(ignore_path_regex(r"^/assets/.*").expect("valid regex"));
//! ```
//!
//! # Feature Flags
//!
//! - `log` (default) - Enable integration with the standard `log` crate
//! - `tracing-request-id` - Enable integration with `tracing-actix-web`'s request ID

mod config;
mod filter;
mod logger;
mod record;
mod wrapper;

pub use crate::config::{ConfigModifier, RequestLoggerConfig, RequestLoggerValues};
pub use crate::filter::{Filter, IgnorePath, IgnorePathRegex, ignore_path, ignore_path_regex};
pub use crate::logger::{
    AttrProducer, RequestContext, RequestLogger, RequestLoggerResponse, RequestLoggerService,
    SLogger,
};
pub use crate::record::{Attr, Level, Record, Value};
pub use crate::wrapper::Sink;
#[cfg(feature = "log")]
pub use crate::wrapper::rust_log;
