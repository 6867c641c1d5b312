//! W3C trace-context propagation over HTTP headers.
//!
//! Both the inbound extraction (server side) and the outbound injection
//! (client side) go through the same `HeaderMap` carrier, so the services do
//! not depend on how a particular HTTP library stores its headers.

use http::{HeaderMap, HeaderName, HeaderValue};
use opentelemetry::{
    Context,
    propagation::{Extractor, Injector, TextMapPropagator},
};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use std::{fmt, sync::Arc};
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// W3C Trace Context header name.
pub const TRACEPARENT: &str = "traceparent";

/// Read-only view of a header map for the propagator.
struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

/// Writable view of a header map for the propagator.
struct HeaderInjector<'a>(&'a mut HeaderMap);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        if let (Ok(name), Ok(val)) =
            (HeaderName::from_bytes(key.as_bytes()), HeaderValue::from_str(&value))
        {
            self.0.insert(name, val);
        }
    }
}

/// Explicit trace-context propagation handle, cloned into each service's
/// router state instead of relying on a process-global propagator.
#[derive(Clone)]
pub struct TracePropagation {
    propagator: Arc<TraceContextPropagator>,
}

impl TracePropagation {
    pub fn new() -> Self {
        Self { propagator: Arc::new(TraceContextPropagator::new()) }
    }

    /// Extract the remote parent context carried by `headers`.
    pub fn extract(&self, headers: &HeaderMap) -> Context {
        self.propagator.extract(&HeaderExtractor(headers))
    }

    /// Write `cx` into `headers` (`traceparent`, `tracestate`).
    pub fn inject_context(&self, cx: &Context, headers: &mut HeaderMap) {
        self.propagator.inject_context(cx, &mut HeaderInjector(headers));
    }

    /// Parent `span` on whatever trace context arrived with the request.
    pub fn set_parent_from_headers(&self, span: &Span, headers: &HeaderMap) {
        if !headers.contains_key(TRACEPARENT) {
            return;
        }
        if let Err(e) = span.set_parent(self.extract(headers)) {
            tracing::debug!(error = ?e, "failed to parent span on inbound trace context");
        }
    }

    /// Headers carrying the context of the current `tracing` span, ready to
    /// attach to an outbound request.
    pub fn outbound_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        self.inject_context(&Span::current().context(), &mut headers);
        headers
    }
}

impl Default for TracePropagation {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TracePropagation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracePropagation").field("format", &"w3c-tracecontext").finish()
    }
}
