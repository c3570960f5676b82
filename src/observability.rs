use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("aurum.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("aurum.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("aurum.client.request_duration_seconds");

pub(crate) static CHAT_TURNS: Counter = Counter::new("aurum.chat.turns");
pub(crate) static CHAT_EMPTY_INPUT: Counter = Counter::new("aurum.chat.empty_input");
pub(crate) static CHAT_FALLBACK_REPLIES: Counter = Counter::new("aurum.chat.fallback_replies");
pub(crate) static CHAT_STALE_REPLIES: Counter = Counter::new("aurum.chat.stale_replies");
pub(crate) static CHAT_SUGGESTION_DECODE_ERRORS: Counter =
    Counter::new("aurum.chat.suggestion_decode_errors");

pub(crate) static SESSION_LOGINS: Counter = Counter::new("aurum.session.logins");
pub(crate) static SESSION_AUTH_FAILURES: Counter = Counter::new("aurum.session.auth_failures");
pub(crate) static SESSION_LOGOUTS: Counter = Counter::new("aurum.session.logouts");

pub(crate) static LEDGER_ACTIONS: Counter = Counter::new("aurum.ledger.actions");
pub(crate) static LEDGER_REJECTED_AMOUNTS: Counter = Counter::new("aurum.ledger.rejected_amounts");
pub(crate) static LEDGER_FAILURES: Counter = Counter::new("aurum.ledger.failures");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&CHAT_TURNS);
    collector.register_counter(&CHAT_EMPTY_INPUT);
    collector.register_counter(&CHAT_FALLBACK_REPLIES);
    collector.register_counter(&CHAT_STALE_REPLIES);
    collector.register_counter(&CHAT_SUGGESTION_DECODE_ERRORS);

    collector.register_counter(&SESSION_LOGINS);
    collector.register_counter(&SESSION_AUTH_FAILURES);
    collector.register_counter(&SESSION_LOGOUTS);

    collector.register_counter(&LEDGER_ACTIONS);
    collector.register_counter(&LEDGER_REJECTED_AMOUNTS);
    collector.register_counter(&LEDGER_FAILURES);
}
