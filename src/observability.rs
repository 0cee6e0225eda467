use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("climino.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("climino.client.request_errors");
pub(crate) static CLIENT_MISSING_LOCATION: Counter =
    Counter::new("climino.client.missing_location");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("climino.client.request_duration_seconds");

pub(crate) static STREAM_EVENTS: Counter = Counter::new("climino.stream.events");
pub(crate) static STREAM_FALLBACK_EVENTS: Counter = Counter::new("climino.stream.fallback_events");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("climino.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("climino.stream.bytes");
pub(crate) static STREAM_TTFB: Moments = Moments::new("climino.stream.ttfb_seconds");
pub(crate) static STREAM_DURATION: Moments = Moments::new("climino.stream.duration_seconds");

pub(crate) static EXCHANGES_SUBMITTED: Counter = Counter::new("climino.exchange.submitted");
pub(crate) static EXCHANGES_REJECTED: Counter = Counter::new("climino.exchange.rejected");
pub(crate) static EXCHANGES_COMPLETED: Counter = Counter::new("climino.exchange.completed");
pub(crate) static EXCHANGES_FAILED: Counter = Counter::new("climino.exchange.failed");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_counter(&CLIENT_MISSING_LOCATION);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_EVENTS);
    collector.register_counter(&STREAM_FALLBACK_EVENTS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);
    collector.register_moments(&STREAM_TTFB);
    collector.register_moments(&STREAM_DURATION);

    collector.register_counter(&EXCHANGES_SUBMITTED);
    collector.register_counter(&EXCHANGES_REJECTED);
    collector.register_counter(&EXCHANGES_COMPLETED);
    collector.register_counter(&EXCHANGES_FAILED);
}
