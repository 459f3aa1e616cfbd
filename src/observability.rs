use biometrics::{Collector, Counter};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("ragchat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("ragchat.client.request_errors");

pub(crate) static STREAM_CHUNKS: Counter = Counter::new("ragchat.stream.chunks");
pub(crate) static STREAM_EVENTS: Counter = Counter::new("ragchat.stream.events");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("ragchat.stream.errors");

pub(crate) static USAGE_MARKERS: Counter = Counter::new("ragchat.stream.usage_markers");
pub(crate) static USAGE_MARKER_ERRORS: Counter = Counter::new("ragchat.stream.usage_marker_errors");

pub(crate) static UPLOADS: Counter = Counter::new("ragchat.files.uploads");
pub(crate) static UPLOAD_ERRORS: Counter = Counter::new("ragchat.files.upload_errors");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);

    collector.register_counter(&STREAM_CHUNKS);
    collector.register_counter(&STREAM_EVENTS);
    collector.register_counter(&STREAM_ERRORS);

    collector.register_counter(&USAGE_MARKERS);
    collector.register_counter(&USAGE_MARKER_ERRORS);

    collector.register_counter(&UPLOADS);
    collector.register_counter(&UPLOAD_ERRORS);
}
