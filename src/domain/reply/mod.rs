//! Reply module - deterministic templates and generative prompt
//! assembly.

mod composer;
pub mod templates;

pub use composer::{build_prompt, normalize_reply};
