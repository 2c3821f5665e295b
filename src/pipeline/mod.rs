pub mod discovery;
pub mod events;
pub mod orchestrator;
pub mod response_composer;

pub use discovery::ProductDiscovery;
pub use events::{ChatEvent, ChatEvents};
pub use orchestrator::{ChatTurnOrchestrator, TurnError, TurnState};
pub use response_composer::compose_response;
