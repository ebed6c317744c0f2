//! AI adapters - completion service implementations.

mod gateway_provider;
mod mock_provider;

pub use gateway_provider::{GatewayConfig, GatewayProvider};
pub use mock_provider::MockCompletionProvider;
