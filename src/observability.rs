use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("ragchat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("ragchat.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("ragchat.client.request_duration_seconds");

pub(crate) static BOOTSTRAP_ATTEMPTS: Counter = Counter::new("ragchat.session.bootstrap_attempts");
pub(crate) static BOOTSTRAP_RETRIES: Counter = Counter::new("ragchat.session.bootstrap_retries");
pub(crate) static BOOTSTRAP_FAILURES: Counter = Counter::new("ragchat.session.bootstrap_failures");
pub(crate) static SESSIONS_CREATED: Counter = Counter::new("ragchat.session.created");
pub(crate) static HISTORY_LOAD_FAILURES: Counter =
    Counter::new("ragchat.session.history_load_failures");

pub(crate) static HEALTH_POLLS: Counter = Counter::new("ragchat.monitor.health_polls");
pub(crate) static HEALTH_POLL_FAILURES: Counter =
    Counter::new("ragchat.monitor.health_poll_failures");

pub(crate) static DISPATCHES: Counter = Counter::new("ragchat.dispatch.sends");
pub(crate) static DISPATCH_ERRORS: Counter = Counter::new("ragchat.dispatch.errors");
pub(crate) static DISPATCH_TIMEOUTS: Counter = Counter::new("ragchat.dispatch.timeouts");
pub(crate) static DISPATCH_DURATION: Moments =
    Moments::new("ragchat.dispatch.duration_seconds");

pub(crate) static REVEAL_TICKS: Counter = Counter::new("ragchat.reveal.ticks");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&BOOTSTRAP_ATTEMPTS);
    collector.register_counter(&BOOTSTRAP_RETRIES);
    collector.register_counter(&BOOTSTRAP_FAILURES);
    collector.register_counter(&SESSIONS_CREATED);
    collector.register_counter(&HISTORY_LOAD_FAILURES);

    collector.register_counter(&HEALTH_POLLS);
    collector.register_counter(&HEALTH_POLL_FAILURES);

    collector.register_counter(&DISPATCHES);
    collector.register_counter(&DISPATCH_ERRORS);
    collector.register_counter(&DISPATCH_TIMEOUTS);
    collector.register_moments(&DISPATCH_DURATION);

    collector.register_counter(&REVEAL_TICKS);
}
