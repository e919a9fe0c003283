use std::{
    fmt,
    future::Future,
    marker::PhantomData,
    pin::Pin,
    rc::Rc,
    sync::Arc,
    task::{Context, Poll},
};

use futures_core::ready;
use pin_project_lite::pin_project;
use time::OffsetDateTime;

use actix_service::{Service, Transform};
use actix_utils::future::{Ready, ready};
use actix_web::body::{BodySize, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::{Error, HttpRequest, HttpResponse, Result};

use crate::config::{Completion, ConfigModifier, RequestLoggerConfig, RequestLoggerValues};
use crate::filter::{self, Filter};
use crate::record::{Attr, Level, Record};
use crate::wrapper::Sink;

const MESSAGE: &str = "REQUEST";

/// What extra-attribute producers get to look at.
pub struct RequestContext<'a> {
    /// The routed request. `None` when the inner service failed instead of responding.
    pub request: Option<&'a HttpRequest>,
    pub values: &'a RequestLoggerValues,
}

/// Contributes additional top-level attributes to every logged request.
///
/// Implemented for every `Fn(&RequestContext<'_>) -> Vec<Attr>`.
pub trait AttrProducer: Send + Sync {
    fn attrs(&self, ctx: &RequestContext<'_>) -> Vec<Attr>;
}

impl<F> AttrProducer for F
where
    F: Fn(&RequestContext<'_>) -> Vec<Attr> + Send + Sync,
{
    fn attrs(&self, ctx: &RequestContext<'_>) -> Vec<Attr> {
        self(ctx)
    }
}

/// Builder of the request logging middleware.
///
/// Every `with_*` call returns a new configuration. Clone first to branch off a shared base:
/// the clone keeps its own lists.
///
/// # Examples
/// ```rust
/// use actix_web::App;
/// use actix_web_request_slog::{Attr, SLogger, ignore_path};
///
/// let logger = SLogger::default()
///     .with_filter(ignore_path("/healthcheck"))
///     .with_extra_attr_fn(|_ctx| vec![Attr::string("service", "billing")])
///     .with_config_modifier(|config| config.log_latency = true);
///
/// let app = App::new().wrap(logger.build());
/// ```
#[derive(Clone)]
pub struct SLogger {
    sink: Arc<dyn Sink>,
    extra_attr_fns: Vec<Arc<dyn AttrProducer>>,
    config_modifiers: Vec<Arc<dyn ConfigModifier>>,
    filters: Vec<Arc<dyn Filter>>,
}

impl SLogger {
    /// Create `SLogger` emitting to `sink`, with no filters, producers or modifiers.
    pub fn new(sink: impl Sink + 'static) -> SLogger {
        SLogger {
            sink: Arc::new(sink),
            extra_attr_fns: Vec::new(),
            config_modifiers: Vec::new(),
            filters: Vec::new(),
        }
    }

    /// Add attributes computed from the request to every record, after `request` and
    /// `response`.
    pub fn with_extra_attr_fn<F>(self, f: F) -> Self
    where
        F: Fn(&RequestContext<'_>) -> Vec<Attr> + Send + Sync + 'static,
    {
        self.with_extra_attrs(f)
    }

    pub fn with_extra_attrs(mut self, producer: impl AttrProducer + 'static) -> Self {
        self.extra_attr_fns.push(Arc::new(producer));
        self
    }

    /// Adjust the request logger configuration before the middleware is built.
    pub fn with_config_modifier<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut RequestLoggerConfig) + Send + Sync + 'static,
    {
        self.config_modifiers.push(Arc::new(f));
        self
    }

    pub fn with_config_modifiers<I>(mut self, modifiers: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn ConfigModifier>>,
    {
        self.config_modifiers.extend(modifiers);
        self
    }

    /// Only log requests accepted by `filter`.
    pub fn with_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    pub fn with_filters<I>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Filter>>,
    {
        self.filters.extend(filters);
        self
    }

    /// The default [`RequestLoggerConfig`] with every modifier applied in registration order.
    pub fn config(&self) -> RequestLoggerConfig {
        let mut config = RequestLoggerConfig::default();
        for modifier in &self.config_modifiers {
            modifier.modify(&mut config);
        }
        config
    }

    /// Freeze the configuration into a middleware ready for `App::wrap`.
    pub fn build(&self) -> RequestLogger {
        RequestLogger(Rc::new(Inner {
            config: self.config(),
            logger: self.clone(),
        }))
    }

    /// Whether the registered filters let `req` through.
    pub fn should_log(&self, req: &HttpRequest) -> bool {
        filter::should_log(&self.filters, req)
    }

    /// Assemble the record for a completed request.
    pub fn record(&self, ctx: &RequestContext<'_>) -> Record {
        let values = ctx.values;
        let mut level = Level::Info;

        let request_attrs = vec![
            Attr::string("method", values.method.as_str()),
            Attr::string("uri", values.uri.as_str()),
        ];

        let mut response_attrs = vec![Attr::int("status", i64::from(values.status))];
        if let Some(error) = &values.error {
            response_attrs.push(Attr::string("error", error.as_str()));
        }

        // 5xx without an error value escalates as well
        if values.error.is_some() || values.status >= 500 {
            level = Level::Error;
        }

        let mut attrs = vec![
            Attr::group("request", request_attrs),
            Attr::group("response", response_attrs),
        ];
        for producer in &self.extra_attr_fns {
            attrs.extend(producer.attrs(ctx));
        }

        Record {
            level,
            message: MESSAGE,
            attrs,
        }
    }

    /// Assemble the record for a completed request and hand it to the sink.
    pub fn log_values(&self, ctx: &RequestContext<'_>) {
        self.sink.emit(&self.record(ctx));
    }
}

#[cfg(feature = "log")]
impl Default for SLogger {
    /// Create `SLogger` emitting through the `log` crate.
    fn default() -> Self {
        SLogger::new(crate::wrapper::rust_log::LogSink::default())
    }
}

impl fmt::Debug for SLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SLogger")
            .field("extra_attr_fns", &self.extra_attr_fns.len())
            .field("config_modifiers", &self.config_modifiers.len())
            .field("filters", &self.filters.len())
            .finish_non_exhaustive()
    }
}

/// Middleware for logging request summaries as grouped structured records.
///
/// Built by [`SLogger::build`].
///
/// # Examples
/// ```rust
/// use actix_web::App;
/// use actix_web_request_slog::SLogger;
///
/// let app = App::new()
///     .wrap(SLogger::default().build());
/// ```
pub struct RequestLogger(Rc<Inner>);

struct Inner {
    config: RequestLoggerConfig,
    logger: SLogger,
}

impl RequestLogger {
    pub fn config(&self) -> &RequestLoggerConfig {
        &self.0.config
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequestLoggerService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggerService {
            service,
            inner: Rc::clone(&self.0),
        }))
    }
}

/// Request logger middleware service.
pub struct RequestLoggerService<S> {
    inner: Rc<Inner>,
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = RequestLoggerResponse<S, B>;

    actix_service::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let inner = &self.inner;

        // The request may not be cloned past this point: routing needs it uniquely owned.
        let pending = if inner.config.skip(req.request()) {
            None
        } else {
            Some(Pending {
                values: inner
                    .config
                    .capture_request(req.request(), OffsetDateTime::now_utc()),
                inbound_should_log: inner.logger.should_log(req.request()),
            })
        };

        RequestLoggerResponse {
            fut: self.service.call(req),
            pending,
            inner: Rc::clone(inner),
            _phantom: PhantomData,
        }
    }
}

/// Request-side state carried until the inner service completes.
struct Pending {
    values: RequestLoggerValues,
    /// Filter verdict on the inbound request, used when no routed request comes back.
    inbound_should_log: bool,
}

pin_project! {
    pub struct RequestLoggerResponse<S, B>
    where
        B: MessageBody,
        S: Service<ServiceRequest>,
    {
        #[pin]
        fut: S::Future,
        pending: Option<Pending>,
        inner: Rc<Inner>,
        _phantom: PhantomData<B>,
    }
}

impl<S, B> Future for RequestLoggerResponse<S, B>
where
    B: MessageBody,
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
{
    type Output = Result<ServiceResponse<B>, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        let outcome = ready!(this.fut.poll(cx));

        let Some(Pending {
            mut values,
            inbound_should_log,
        }) = this.pending.take()
        else {
            return Poll::Ready(outcome);
        };
        let inner = this.inner;

        match outcome {
            Ok(res) => {
                if !inner.logger.should_log(res.request()) {
                    return Poll::Ready(Ok(res));
                }

                let response = res.response();

                #[cfg(feature = "log")]
                if let Some(error) = response.error() {
                    log::debug!("Error in response: {:?}", error);
                }

                inner.config.capture_response(
                    &mut values,
                    Some(res.request()),
                    &completion(response),
                );
                inner.logger.log_values(&RequestContext {
                    request: Some(res.request()),
                    values: &values,
                });

                Poll::Ready(Ok(res))
            }
            Err(err) => {
                #[cfg(feature = "log")]
                log::debug!("Error from inner service: {:?}", err);

                if !inbound_should_log {
                    return Poll::Ready(Err(err));
                }

                let status = if inner.config.handle_error {
                    err.error_response().status()
                } else {
                    err.as_response_error().status_code()
                };
                let done = Completion {
                    status,
                    error: Some(&err),
                    headers: None,
                    size: None,
                };

                inner.config.capture_response(&mut values, None, &done);
                inner.logger.log_values(&RequestContext {
                    request: None,
                    values: &values,
                });

                Poll::Ready(Err(err))
            }
        }
    }
}

fn completion<B: MessageBody>(res: &HttpResponse<B>) -> Completion<'_> {
    Completion {
        status: res.status(),
        error: res.error(),
        headers: Some(res.headers()),
        size: match res.body().size() {
            BodySize::Sized(size) => Some(size),
            _ => None,
        },
    }
}
