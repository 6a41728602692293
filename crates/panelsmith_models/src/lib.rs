//! Model provider drivers for panelsmith.
//!
//! One driver covers every provider that speaks the OpenAI chat completions
//! protocol (OpenAI, DeepSeek, Moonshot/Kimi, self-hosted gateways).
//!
//! # Example
//!
//! ```no_run
//! use panelsmith_models::{OpenAiCompatibleConfig, OpenAiCompatibleDriver};
//! use panelsmith_interface::ModelDriver;
//! use panelsmith_core::{ChatRequest, Message};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = OpenAiCompatibleConfig::builder()
//!     .provider("deepseek")
//!     .base_url("https://api.deepseek.com/v1")
//!     .api_key(std::env::var("DEEPSEEK_API_KEY")?)
//!     .model("deepseek-chat")
//!     .build()?;
//! let driver = OpenAiCompatibleDriver::new(config)?;
//! let reply = driver.invoke(&ChatRequest::from_messages(vec![Message::user("ping")])).await?;
//! println!("{}", reply.content);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod openai;

pub use openai::{
    GenerationParams, GenerationParamsBuilder, OpenAiCompatibleConfig,
    OpenAiCompatibleConfigBuilder, OpenAiCompatibleDriver, chat_completions_url,
    map_usage, normalize_base_url,
};
