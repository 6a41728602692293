//! OpenAI-compatible chat completions.

mod driver;
mod dto;

pub use driver::{
    GenerationParams, GenerationParamsBuilder, OpenAiCompatibleConfig,
    OpenAiCompatibleConfigBuilder, OpenAiCompatibleDriver, chat_completions_url,
    normalize_base_url,
};
pub use dto::map_usage;
