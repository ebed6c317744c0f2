//! Application layer - turn orchestration over the domain and ports.

mod classifier;
mod lifecycle;
mod orchestrator;
mod turn;

pub use classifier::{ClassifySnapshot, IntentClassifier, RULE_ORDER};
pub use lifecycle::{SessionHandle, SessionLifecycle};
pub use orchestrator::{ConversationOrchestrator, EngineSettings};
pub use turn::{TurnData, TurnError, TurnRequest, TurnResponse, TurnStatus};
