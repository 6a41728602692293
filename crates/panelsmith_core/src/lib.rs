//! Core data types for panelsmith.
//!
//! Conversation messages, chat requests and responses, token accounting and
//! the shared timestamp format used by traces.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod kind;
mod message;
mod request;
mod role;
mod telemetry;
pub mod timestamp;
mod usage;

pub use kind::JsonKind;
pub use message::Message;
pub use request::{ChatRequest, ChatRequestBuilder, ChatRequestBuilderError, ChatResponse, ResponseFormat};
pub use role::Role;
pub use telemetry::{LogFormat, init_tracing};
pub use usage::TokenUsage;
