use opentelemetry::trace::{SpanContext, SpanId, TraceContextExt, TraceFlags, TraceId, TraceState};
use std::collections::BTreeMap;
use tracing_opentelemetry::OpenTelemetrySpanExt;

// Message headers carrying trace context across the asynchronous hop.
// This is the only cross-hop propagation channel.
pub const TRACE_ID: &str = "trace-id";
pub const SPAN_ID: &str = "span-id";
pub const TRACE_FLAGS: &str = "trace-flags";
pub const TRACE_STATE: &str = "trace-state";

/// Render the calling span's trace context as message headers.
pub fn current_trace_headers() -> BTreeMap<String, String> {
    let context = tracing::Span::current().context();
    let span = context.span();
    let span_context = span.span_context();

    BTreeMap::from([
        (TRACE_ID.to_string(), span_context.trace_id().to_string()),
        (SPAN_ID.to_string(), span_context.span_id().to_string()),
        (
            TRACE_FLAGS.to_string(),
            format!("{:02x}", span_context.trace_flags().to_u8()),
        ),
        (TRACE_STATE.to_string(), span_context.trace_state().header()),
    ])
}

/// Rebuild the publisher's span context from message headers.
/// Returns None when headers are absent or do not form a valid context.
pub fn remote_span_from_headers(headers: &BTreeMap<String, String>) -> Option<SpanContext> {
    let trace_id = TraceId::from_hex(headers.get(TRACE_ID)?).ok()?;
    let span_id = SpanId::from_hex(headers.get(SPAN_ID)?).ok()?;

    let flags = headers
        .get(TRACE_FLAGS)
        .and_then(|raw| u8::from_str_radix(raw, 16).ok())
        .map(TraceFlags::new)
        .unwrap_or(TraceFlags::SAMPLED);

    let state = headers
        .get(TRACE_STATE)
        .and_then(|raw| raw.parse::<TraceState>().ok())
        .unwrap_or_default();

    let span_context = SpanContext::new(trace_id, span_id, flags | TraceFlags::SAMPLED, true, state);
    span_context.is_valid().then_some(span_context)
}

#[cfg(test)]
mod test {
    use super::*;

    fn headers(trace_id: &str, span_id: &str) -> BTreeMap<String, String> {
        BTreeMap::from([
            (TRACE_ID.to_string(), trace_id.to_string()),
            (SPAN_ID.to_string(), span_id.to_string()),
            (TRACE_FLAGS.to_string(), "01".to_string()),
            (TRACE_STATE.to_string(), String::new()),
        ])
    }

    #[test]
    fn test_remote_span_round_trip() {
        let headers = headers("0123456789abcdef0123456789abcdef", "0123456789abcdef");
        let span_context = remote_span_from_headers(&headers).unwrap();

        assert_eq!(
            span_context.trace_id().to_string(),
            "0123456789abcdef0123456789abcdef"
        );
        assert_eq!(span_context.span_id().to_string(), "0123456789abcdef");
        assert!(span_context.is_remote());
        assert!(span_context.is_sampled());
    }

    #[test]
    fn test_invalid_headers_yield_none() {
        // All-zero ids are not a valid context.
        let zeros = headers("00000000000000000000000000000000", "0000000000000000");
        assert!(remote_span_from_headers(&zeros).is_none());

        // Garbage is not hex.
        let garbage = headers("not-hex", "not-hex");
        assert!(remote_span_from_headers(&garbage).is_none());

        // Missing headers entirely.
        assert!(remote_span_from_headers(&BTreeMap::new()).is_none());
    }

    #[test]
    fn test_headers_outside_any_span_are_invalid() {
        // Without a tracing subscriber there is no current span, so the
        // rendered headers must not round-trip into a usable context.
        let headers = current_trace_headers();
        assert!(remote_span_from_headers(&headers).is_none());
    }
}
