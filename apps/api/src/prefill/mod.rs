// Prefill intent lifecycle: issuance, authorized reads, result reporting and expiry.
// The local agent talks to these endpoints with the bearer token it was handed once.

pub mod expiry;
pub mod handlers;
pub mod intents;
pub mod reporter;
