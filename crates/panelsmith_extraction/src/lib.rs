//! JSON extraction and repair for language-model output.
//!
//! Models wrap JSON in prose, code fences, trailing commas and raw newlines.
//! This crate recovers the first JSON value from such text:
//!
//! - [`extract_first_json`] finds the minimal balanced span
//! - [`repair`] applies idempotent textual fixes
//! - [`parse_json_from_text`] combines both and reports typed, actionable failures
//!
//! # Examples
//!
//! ```
//! use panelsmith_extraction::parse_json_from_text;
//! use panelsmith_core::JsonKind;
//!
//! let parsed = parse_json_from_text(
//!     "Sure! ```json\n{\"episodes\": [1, 2,],}\n``` Enjoy.",
//!     Some(JsonKind::Object),
//! ).unwrap();
//! assert_eq!(parsed.json["episodes"][1], 2);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod extract;
mod parse;
mod repair;

pub use extract::{ExtractFailure, ExtractedJson, extract_first_json};
pub use parse::{ParsedJson, parse_json_from_text, parse_typed_from_text};
pub use repair::repair;
