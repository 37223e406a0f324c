pub mod batch;
pub mod directory;
pub mod engine;
pub mod events;
pub mod filename;
pub mod format;
pub mod orchestrator;
pub mod progress;
pub mod registry;
