//! grove-app - Tree instances and orchestration for Grove
//!
//! This crate implements the TEA (The Elm Architecture) pattern for driving
//! tree instances, the Engine abstraction that owns them, the drag-and-drop
//! controller shared by every instance, asynchronous child loading, options
//! files and persisted open/selected state.

pub mod actions;
pub mod callbacks;
pub mod config;
pub mod drag;
pub mod engine;
pub mod handler;
pub mod input_key;
pub mod instance;
pub mod loader;
pub mod message;
pub mod persistence;
pub mod process;
pub mod registry;
pub mod state;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export primary types
pub use callbacks::{LoggingCallbacks, NoopCallbacks, TreeCallbacks};
pub use config::TreeOptions;
pub use drag::{ContainerLayout, DragSessionController, DropCue, DropOutcome, ForeignItem};
pub use engine::Engine;
pub use handler::{UpdateAction, UpdateResult};
pub use input_key::{InputKey, Modifiers};
pub use instance::{Direction, NewNode, TreeInstance};
pub use loader::{Fetcher, FileFetcher, SharedFetcher, StaticFetcher, TreeFetcher};
pub use message::{Message, TreeCommand};
pub use persistence::{FileStore, KeyValueStore, MemoryStore};
pub use registry::InstanceId;
pub use state::AppState;
