// Prefill authorization: single-purpose bearer tokens bound to one intent.
// Only the SHA-256 of a token is ever persisted.

pub mod service;
pub mod token;

pub use service::{IntentDraft, IssuedIntent, TokenService};
pub use token::PlaintextToken;
