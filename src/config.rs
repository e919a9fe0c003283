use std::{fmt, sync::Arc};

use time::OffsetDateTime;

#[cfg(feature = "tracing-request-id")]
use actix_web::HttpMessage;
use actix_web::{
    Error, HttpRequest,
    http::{
        StatusCode,
        header::{self, HeaderMap, HeaderName},
    },
};

fn x_request_id() -> HeaderName {
    HeaderName::from_static("x-request-id")
}

/// Settings of the request logger service, i.e. which values are captured per request.
///
/// The [`Default`] configuration captures method, URI, status and error, and maps errors
/// returned by inner services to their response status. Adjust it through
/// [`SLogger::with_config_modifier`](crate::SLogger::with_config_modifier).
#[derive(Clone)]
pub struct RequestLoggerConfig {
    /// Bypass the middleware entirely when this returns `true`.
    pub skipper: Option<Arc<dyn Fn(&HttpRequest) -> bool + Send + Sync>>,
    /// When the inner service fails, record the status of the response the host's error handling
    /// renders (`ResponseError::error_response`). Otherwise record the error's own
    /// `ResponseError::status_code`. The error itself always travels upward unchanged.
    pub handle_error: bool,
    pub log_latency: bool,
    pub log_protocol: bool,
    pub log_remote_ip: bool,
    pub log_host: bool,
    pub log_method: bool,
    pub log_uri: bool,
    pub log_uri_path: bool,
    pub log_route_path: bool,
    /// `X-Request-ID` from the request, falling back to the response header.
    pub log_request_id: bool,
    pub log_referer: bool,
    pub log_user_agent: bool,
    pub log_status: bool,
    pub log_error: bool,
    /// Request `Content-Length` header.
    pub log_content_length: bool,
    /// Size of the response body when it is known up front.
    pub log_response_size: bool,
}

impl Default for RequestLoggerConfig {
    fn default() -> Self {
        RequestLoggerConfig {
            skipper: None,
            handle_error: true,
            log_latency: false,
            log_protocol: false,
            log_remote_ip: false,
            log_host: false,
            log_method: true,
            log_uri: true,
            log_uri_path: false,
            log_route_path: false,
            log_request_id: false,
            log_referer: false,
            log_user_agent: false,
            log_status: true,
            log_error: true,
            log_content_length: false,
            log_response_size: false,
        }
    }
}

impl fmt::Debug for RequestLoggerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestLoggerConfig")
            .field("skipper", &self.skipper.is_some())
            .field("handle_error", &self.handle_error)
            .field("log_latency", &self.log_latency)
            .field("log_protocol", &self.log_protocol)
            .field("log_remote_ip", &self.log_remote_ip)
            .field("log_host", &self.log_host)
            .field("log_method", &self.log_method)
            .field("log_uri", &self.log_uri)
            .field("log_uri_path", &self.log_uri_path)
            .field("log_route_path", &self.log_route_path)
            .field("log_request_id", &self.log_request_id)
            .field("log_referer", &self.log_referer)
            .field("log_user_agent", &self.log_user_agent)
            .field("log_status", &self.log_status)
            .field("log_error", &self.log_error)
            .field("log_content_length", &self.log_content_length)
            .field("log_response_size", &self.log_response_size)
            .finish()
    }
}

/// Adjusts the [`RequestLoggerConfig`] before the middleware is built.
///
/// Implemented for every `Fn(&mut RequestLoggerConfig)`.
pub trait ConfigModifier: Send + Sync {
    fn modify(&self, config: &mut RequestLoggerConfig);
}

impl<F> ConfigModifier for F
where
    F: Fn(&mut RequestLoggerConfig) + Send + Sync,
{
    fn modify(&self, config: &mut RequestLoggerConfig) {
        self(config)
    }
}

/// Values captured for one completed request.
///
/// Fields that are switched off in [`RequestLoggerConfig`] stay empty: `""` for method and URI,
/// `0` for status, `None` for the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestLoggerValues {
    pub start_time: OffsetDateTime,
    pub latency: Option<time::Duration>,
    pub protocol: Option<String>,
    pub remote_ip: Option<String>,
    pub host: Option<String>,
    pub method: String,
    pub uri: String,
    pub uri_path: Option<String>,
    pub route_path: Option<String>,
    pub request_id: Option<String>,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    pub status: u16,
    pub error: Option<String>,
    pub content_length: Option<String>,
    pub response_size: Option<u64>,
}

/// What the inner service produced, as seen by the capture step.
pub(crate) struct Completion<'a> {
    pub status: StatusCode,
    pub error: Option<&'a Error>,
    pub headers: Option<&'a HeaderMap>,
    pub size: Option<u64>,
}

impl RequestLoggerConfig {
    pub(crate) fn skip(&self, req: &HttpRequest) -> bool {
        self.skipper.as_ref().is_some_and(|skipper| skipper(req))
    }

    /// Captures everything that can be read from the inbound request.
    ///
    /// Runs before the inner service is called; response fields stay empty.
    pub(crate) fn capture_request(
        &self,
        req: &HttpRequest,
        start_time: OffsetDateTime,
    ) -> RequestLoggerValues {
        let request_id = if self.log_request_id {
            header_str(req.headers(), &x_request_id()).or_else(|| tracing_request_id(req))
        } else {
            None
        };

        RequestLoggerValues {
            start_time,
            latency: None,
            protocol: self.log_protocol.then(|| protocol(req)),
            remote_ip: if self.log_remote_ip {
                req.connection_info()
                    .realip_remote_addr()
                    .map(|addr| addr.to_string())
            } else {
                None
            },
            host: self
                .log_host
                .then(|| req.connection_info().host().to_string()),
            method: if self.log_method {
                req.method().to_string()
            } else {
                String::new()
            },
            uri: if self.log_uri {
                req.uri().to_string()
            } else {
                String::new()
            },
            uri_path: self.log_uri_path.then(|| req.path().to_string()),
            route_path: None,
            request_id,
            referer: if self.log_referer {
                header_str(req.headers(), &header::REFERER)
            } else {
                None
            },
            user_agent: if self.log_user_agent {
                header_str(req.headers(), &header::USER_AGENT)
            } else {
                None
            },
            status: 0,
            error: None,
            content_length: if self.log_content_length {
                header_str(req.headers(), &header::CONTENT_LENGTH)
            } else {
                None
            },
            response_size: None,
        }
    }

    /// Completes `values` once the inner service is done.
    ///
    /// `req` is the routed request carried by the response, absent when the inner service
    /// returned an error.
    pub(crate) fn capture_response(
        &self,
        values: &mut RequestLoggerValues,
        req: Option<&HttpRequest>,
        done: &Completion<'_>,
    ) {
        if self.log_latency {
            values.latency = Some(OffsetDateTime::now_utc() - values.start_time);
        }
        if self.log_route_path {
            values.route_path = req.and_then(|req| req.match_pattern());
        }
        if self.log_request_id && values.request_id.is_none() {
            values.request_id = done.headers.and_then(|h| header_str(h, &x_request_id()));
        }
        if self.log_status {
            values.status = done.status.as_u16();
        }
        if self.log_error {
            values.error = done.error.map(|err| err.to_string());
        }
        if self.log_response_size {
            values.response_size = done.size;
        }
    }
}

fn header_str(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

fn protocol(req: &HttpRequest) -> String {
    let version = match req.version() {
        actix_http::Version::HTTP_09 => "HTTP/0.9",
        actix_http::Version::HTTP_10 => "HTTP/1.0",
        actix_http::Version::HTTP_11 => "HTTP/1.1",
        actix_http::Version::HTTP_2 => "HTTP/2.0",
        actix_http::Version::HTTP_3 => "HTTP/3.0",
        _ => "unknown",
    };
    version.to_string()
}

#[cfg(feature = "tracing-request-id")]
fn tracing_request_id(req: &HttpRequest) -> Option<String> {
    req.extensions()
        .get::<tracing_actix_web::RequestId>()
        .map(|id| id.to_string())
}

#[cfg(not(feature = "tracing-request-id"))]
fn tracing_request_id(_req: &HttpRequest) -> Option<String> {
    None
}
