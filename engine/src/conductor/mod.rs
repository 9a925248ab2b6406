//! Conductor
//!
//! Everything that stands between a directive and the generation backend:
//! the run-wide system context, the rolling answer memory and the
//! orchestrator that composes prompts from both.

pub mod context;
pub mod memory;
pub mod orchestrator;

pub use context::{ContextAssembler, SystemContext};
pub use memory::{sentinel, Memory, MemoryEntry, MAX_MEMORY_WINDOW, SENTINEL_PREFIX};
pub use orchestrator::AiOrchestrator;
