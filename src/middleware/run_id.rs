use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// Callers may pin a campaign's run id through this header; the id in use is
/// always sent back under the same name
pub const RUN_ID_HEADER: &str = "x-request-id";

/// Identifier of one campaign run, shared by the HTTP request and the pipeline span
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The caller's run id, when the header holds a UUID
    fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let raw = headers.get(RUN_ID_HEADER)?.to_str().ok()?;
        Uuid::parse_str(raw.trim()).ok().map(RunId)
    }

    fn header_value(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.0.hyphenated().to_string()).ok()
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// Assigns the run id before any handler sees the request.
///
/// Retrying a campaign with the same header value keeps its report and logs
/// under one id.
pub async fn run_id_middleware(mut request: Request, next: Next) -> Response {
    let run_id = RunId::from_headers(request.headers()).unwrap_or_default();
    request.extensions_mut().insert(run_id);

    let mut response = next.run(request).await;
    if let Some(value) = run_id.header_value() {
        response.headers_mut().insert(RUN_ID_HEADER, value);
    }
    response
}

/// `TraceLayer` span; the run id field stays empty for requests the middleware never saw
pub fn make_span_with_run_id(request: &Request<Body>) -> tracing::Span {
    let span = tracing::info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        run_id = tracing::field::Empty,
    );
    if let Some(run_id) = request.extensions().get::<RunId>() {
        span.record("run_id", tracing::field::display(run_id));
    }
    span
}
