//! Adapters - concrete implementations of the ports.

pub mod ai;
pub mod extraction;
pub mod http;
pub mod memory;
pub mod postgres;
