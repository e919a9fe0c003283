use std::sync::Arc;

use actix_web::HttpRequest;
use regex::Regex;

/// Decides whether a request gets a log record at all.
///
/// Returning `false` suppresses the record. Any `Fn(&HttpRequest) -> bool` is a filter.
///
/// # Examples
/// ```rust
/// use actix_web::HttpRequest;
/// use actix_web_request_slog::SLogger;
///
/// let logger = SLogger::default()
///     .with_filter(|req: &HttpRequest| req.method() != "OPTIONS");
/// ```
pub trait Filter: Send + Sync {
    fn should_log(&self, req: &HttpRequest) -> bool;
}

impl<F> Filter for F
where
    F: Fn(&HttpRequest) -> bool + Send + Sync,
{
    fn should_log(&self, req: &HttpRequest) -> bool {
        self(req)
    }
}

/// Suppresses requests whose path is exactly the given one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnorePath(String);

impl Filter for IgnorePath {
    fn should_log(&self, req: &HttpRequest) -> bool {
        req.path() != self.0
    }
}

/// Ignore and do not log requests for the exact `path`.
pub fn ignore_path(path: impl Into<String>) -> IgnorePath {
    IgnorePath(path.into())
}

/// Suppresses requests whose path matches a regex.
#[derive(Debug, Clone)]
pub struct IgnorePathRegex(Regex);

impl Filter for IgnorePathRegex {
    fn should_log(&self, req: &HttpRequest) -> bool {
        !self.0.is_match(req.path())
    }
}

/// Ignore and do not log requests for paths that match `pattern`.
pub fn ignore_path_regex(pattern: &str) -> Result<IgnorePathRegex, regex::Error> {
    Regex::new(pattern).map(IgnorePathRegex)
}

/// Runs filters in order, stopping at the first one that rejects.
pub(crate) fn should_log(filters: &[Arc<dyn Filter>], req: &HttpRequest) -> bool {
    filters.iter().all(|filter| filter.should_log(req))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_ignore_path_exact_match() {
        let filter = ignore_path("/healthcheck");

        let req = TestRequest::with_uri("https://example.com/healthcheck").to_http_request();
        assert!(!filter.should_log(&req));

        let req = TestRequest::with_uri("/healthcheck/deep").to_http_request();
        assert!(filter.should_log(&req));

        let req = TestRequest::with_uri("/other").to_http_request();
        assert!(filter.should_log(&req));
    }

    #[test]
    fn test_ignore_path_regex() {
        let filter = ignore_path_regex(r"^/assets/.*").unwrap();

        let req = TestRequest::with_uri("/assets/app.js").to_http_request();
        assert!(!filter.should_log(&req));

        let req = TestRequest::with_uri("/api/assets").to_http_request();
        assert!(filter.should_log(&req));

        assert!(ignore_path_regex("(unclosed").is_err());
    }

    #[test]
    fn test_chain_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counting = {
            let calls = Arc::clone(&calls);
            Arc::new(move |_: &HttpRequest| {
                calls.fetch_add(1, Ordering::SeqCst);
                true
            }) as Arc<dyn Filter>
        };
        let reject = Arc::new(|_: &HttpRequest| false) as Arc<dyn Filter>;
        let req = TestRequest::default().to_http_request();

        assert!(!should_log(&[Arc::clone(&reject), Arc::clone(&counting)], &req));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert!(should_log(&[Arc::clone(&counting), Arc::clone(&counting)], &req));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        assert!(!should_log(&[Arc::clone(&counting), reject], &req));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_empty_chain_logs() {
        let req = TestRequest::default().to_http_request();
        assert!(should_log(&[], &req));
    }
}
