//! Error types for panelsmith.
//!
//! Every failure in the reliability layer is a typed value, never a silent default.
//!
//! # Error Hierarchy
//!
//! - `*ErrorKind` enums name the specific condition
//! - `*Error` structs wrap the kind with the source location that raised it
//! - [`PanelsmithError`] aggregates them for `?` propagation across crates
//!
//! # Examples
//!
//! ```
//! use panelsmith_error::{ExtractionError, ExtractionErrorKind, PanelsmithResult};
//!
//! fn parse() -> PanelsmithResult<()> {
//!     Err(ExtractionError::new(ExtractionErrorKind::Empty))?
//! }
//!
//! let err = parse().unwrap_err();
//! assert!(err.is_fixable());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod agent;
mod config;
#[cfg(feature = "database")]
mod database;
mod error;
mod extraction;
mod json;
mod storage;
mod tool;
mod upstream;
mod validation;

pub use agent::{AgentError, AgentErrorKind};
pub use config::ConfigError;
#[cfg(feature = "database")]
pub use database::{DatabaseError, DatabaseErrorKind};
pub use error::{PanelsmithError, PanelsmithErrorKind, PanelsmithResult};
pub use extraction::{ExtractionError, ExtractionErrorKind};
pub use json::JsonError;
pub use storage::{StorageError, StorageErrorKind};
pub use tool::ToolError;
pub use upstream::{UpstreamError, UpstreamErrorKind};
pub use validation::ValidationError;
