//! GovAssist - turn-by-turn dialogue engine for a multi-service
//! government assistant.
//!
//! Each inbound turn is handled by a stateless invocation: the session
//! document is loaded, the message or upload is resolved against the
//! intent rules and per-service state machines, and every state change
//! is persisted before the reply is returned.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
