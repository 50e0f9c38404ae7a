use biometrics::{Collector, Counter, Moments};

pub(crate) static SESSION_CREATES: Counter = Counter::new("kodeks.session.creates");
pub(crate) static SESSION_CREATE_ERRORS: Counter = Counter::new("kodeks.session.create_errors");
pub(crate) static SESSION_CLEARS: Counter = Counter::new("kodeks.session.clears");
pub(crate) static SESSION_CLEAR_ERRORS: Counter = Counter::new("kodeks.session.clear_errors");

pub(crate) static QUERY_REQUESTS: Counter = Counter::new("kodeks.query.requests");
pub(crate) static QUERY_REQUEST_ERRORS: Counter = Counter::new("kodeks.query.request_errors");
pub(crate) static QUERY_DURATION: Moments = Moments::new("kodeks.query.duration_seconds");

pub(crate) static STREAM_CHUNKS: Counter = Counter::new("kodeks.stream.chunks");
pub(crate) static STREAM_BYTES: Counter = Counter::new("kodeks.stream.bytes");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("kodeks.stream.errors");
pub(crate) static DECODER_TAIL_BYTES_DROPPED: Counter =
    Counter::new("kodeks.decoder.tail_bytes_dropped");

pub(crate) static STALE_APPENDS: Counter = Counter::new("kodeks.conversation.stale_appends");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&SESSION_CREATES);
    collector.register_counter(&SESSION_CREATE_ERRORS);
    collector.register_counter(&SESSION_CLEARS);
    collector.register_counter(&SESSION_CLEAR_ERRORS);

    collector.register_counter(&QUERY_REQUESTS);
    collector.register_counter(&QUERY_REQUEST_ERRORS);
    collector.register_moments(&QUERY_DURATION);

    collector.register_counter(&STREAM_CHUNKS);
    collector.register_counter(&STREAM_BYTES);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&DECODER_TAIL_BYTES_DROPPED);

    collector.register_counter(&STALE_APPENDS);
}
