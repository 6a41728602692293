//! Budgeted JSON tool-calling loop.
//!
//! A model is asked, step by step, to reply with either a tool call or a final
//! answer. The loop enforces a step budget, a per-step time limit and a total
//! time limit, feeds tool results back into the conversation and records a
//! trace of every step. When the budget runs out or the model misbehaves, an
//! optional legacy path produces the answer instead.
//!
//! # Example
//!
//! ```rust,ignore
//! use panelsmith_agent::{AgentLoopConfig, EchoTool, ToolLoop, ToolRegistry};
//! use std::sync::Arc;
//!
//! let mut registry = ToolRegistry::new();
//! registry.register(Arc::new(EchoTool));
//!
//! let outcome = ToolLoop::<serde_json::Value>::new(&driver, &registry, AgentLoopConfig::default())
//!     .run(messages)
//!     .await?;
//! println!("{}", serde_json::to_string_pretty(&outcome.trace)?);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod action;
mod config;
mod echo;
mod fallback;
mod tool;
mod tool_loop;
mod trace;

pub use action::{AgentAction, parse_action};
pub use config::{AgentLoopConfig, AgentLoopConfigBuilder, AgentLoopConfigBuilderError};
pub use echo::EchoTool;
pub use fallback::{FallbackOutcome, LegacyFallback};
pub use tool::{AgentTool, ToolRegistry};
pub use tool_loop::{ToolLoop, ToolLoopOutcome};
pub use trace::{AgentTrace, ExecutionMode, StepKind, ToolCallRecord, ToolStatus, TraceStep};
