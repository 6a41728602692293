//! Collaborator traits for panelsmith.
//!
//! The reliability layer talks to the outside world only through these seams:
//! model invocation, structural contracts, persistence and prompt lookup.
//! With the `testing` feature, scripted implementations are available for tests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod contract;
mod driver;
mod prompts;
mod storage;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use contract::Contract;
pub use driver::ModelDriver;
pub use prompts::PromptSource;
pub use storage::{
    ArtifactKind, ArtifactStore, ArtifactWrite, EpisodeOperation, EpisodeRecord, EpisodeStore,
    OperationResult, SceneFilter, SceneStore, ShotPromptRow,
};
